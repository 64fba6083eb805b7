//! Integration test for orientation detection
//!
//! Scanning the same symbol rotated by each quarter turn must produce all
//! four orientation values.

mod common;

use common::{code128, render, HELLO};
use image::imageops;
use std::collections::HashSet;
use zedscan::{Image, ImageScanner, Orientation, SymbolType};

#[test]
fn test_orientation_all_variants() {
    let img = render(&code128(&HELLO, 2), 8);

    let cases = [
        (img.clone(), Orientation::Up),
        (imageops::rotate90(&img), Orientation::Right),
        (imageops::rotate180(&img), Orientation::Down),
        (imageops::rotate270(&img), Orientation::Left),
    ];

    let mut orientations_found = HashSet::new();
    for (rotated, expected) in cases {
        let mut scanner = ImageScanner::new();
        let mut image = Image::from(&rotated);
        assert_eq!(scanner.scan_image(&mut image).unwrap(), 1);

        let results = scanner.results().unwrap();
        let symbol = results.first().unwrap();
        assert_eq!(symbol.symbol_type(), SymbolType::Code128);
        assert_eq!(symbol.data(), b"HELLO");
        assert_eq!(symbol.orientation(), expected, "rotation to {expected:?}");
        orientations_found.insert(symbol.orientation());
    }
    assert_eq!(orientations_found.len(), 4);
}

#[test]
fn test_vertical_symbol_located_by_columns() {
    let img = imageops::rotate90(&render(&code128(&HELLO, 2), 8));
    let mut scanner = ImageScanner::new();
    let mut image = Image::from(&img);
    scanner.scan_image(&mut image).unwrap();

    let results = scanner.results().unwrap();
    let symbol = results.first().unwrap();
    assert_eq!(symbol.quality(), 8);
    for p in symbol.loc() {
        assert!((0..8).contains(&p.x));
        assert!(p.y == 44 || p.y == 214, "unexpected edge at {p:?}");
    }
}
