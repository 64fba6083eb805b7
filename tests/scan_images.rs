//! Integration tests for scanning synthetic barcode images

mod common;

use common::{code128, code39, ean13, render, HELLO};
use zedscan::{Image, ImageScanner, Orientation, SymbolType};

/// Scan a grayscale image and return (type, data, quality) for each result
fn scan(img: &image::GrayImage) -> Vec<(SymbolType, String, i32)> {
    let mut scanner = ImageScanner::new();
    let mut image = Image::from(img);
    scanner.scan_image(&mut image).expect("scan failed");
    scanner
        .results()
        .into_iter()
        .flatten()
        .map(|s| {
            let data = s.data_string().unwrap_or_default().to_string();
            (s.symbol_type(), data, s.quality())
        })
        .collect()
}

#[test]
fn test_code128_image() {
    let img = render(&code128(&HELLO, 2), 8);
    assert_eq!(img.width(), 260);

    let mut scanner = ImageScanner::new();
    let mut image = Image::from(&img);
    assert_eq!(scanner.scan_image(&mut image).unwrap(), 1);

    let results = scanner.results().unwrap();
    let symbol = results.first().unwrap();
    assert_eq!(symbol.symbol_type(), SymbolType::Code128);
    assert_eq!(symbol.data(), b"HELLO");
    // one hit per row
    assert_eq!(symbol.quality(), 8);
    assert_eq!(symbol.orientation(), Orientation::Up);
    assert_eq!(symbol.count(), 0);

    let pts = symbol.loc();
    assert_eq!(pts.len(), 8);
    for p in pts {
        assert!(p.x == 44 || p.x == 214, "unexpected edge at {p:?}");
        assert!((0..8).contains(&p.y));
    }
}

#[test]
fn test_code39_image() {
    let img = render(&code39("HELLO-39", 2, 5), 8);
    assert_eq!(
        scan(&img),
        vec![(SymbolType::Code39, "HELLO-39".to_string(), 8)]
    );
}

#[test]
fn test_ean13_image() {
    let img = render(&ean13("5901234123457", 2, 12), 8);
    assert_eq!(
        scan(&img),
        vec![(SymbolType::Ean13, "5901234123457".to_string(), 15)]
    );
}

#[test]
fn test_single_row() {
    let img = render(&code128(&HELLO, 2), 1);
    assert_eq!(
        scan(&img),
        vec![(SymbolType::Code128, "HELLO".to_string(), 1)]
    );

    // a single hit is below the EAN uncertainty
    let img = render(&ean13("5901234123457", 2, 12), 1);
    assert!(scan(&img).is_empty());
}

#[test]
fn test_scan_density() {
    let img = render(&code128(&HELLO, 2), 8);
    let mut scanner = ImageScanner::new();
    scanner.parse_config("x-density=0").unwrap();
    scanner.parse_config("y-density=3").unwrap();

    let mut image = Image::from(&img);
    assert_eq!(scanner.scan_image(&mut image).unwrap(), 1);
    let results = scanner.results().unwrap();
    let symbol = results.first().unwrap();
    // rows 1, 4 and 7
    assert_eq!(symbol.quality(), 3);
    assert!(symbol.loc().iter().all(|p| [1, 4, 7].contains(&p.y)));

    // no horizontal lines, and vertical lines cross no edges
    scanner.parse_config("y-density=0").unwrap();
    let mut image = Image::from(&img);
    assert_eq!(scanner.scan_image(&mut image).unwrap(), 0);
}

#[test]
fn test_position_tracking_off() {
    let img = render(&code128(&HELLO, 2), 4);
    let mut scanner = ImageScanner::new();
    scanner.parse_config("no-position").unwrap();

    let mut image = Image::from(&img);
    assert_eq!(scanner.scan_image(&mut image).unwrap(), 1);
    let results = scanner.results().unwrap();
    assert!(results.first().unwrap().loc().is_empty());
}

#[test]
fn test_repeated_scans_with_one_scanner() {
    let img = render(&code128(&HELLO, 2), 8);
    let mut scanner = ImageScanner::new();
    for _ in 0..3 {
        let mut image = Image::from(&img);
        assert_eq!(scanner.scan_image(&mut image).unwrap(), 1);
    }
}

#[test]
fn test_disabled_symbology_is_ignored() {
    let img = render(&code128(&HELLO, 2), 8);
    let mut scanner = ImageScanner::new();
    scanner.parse_config("code128.disable").unwrap();

    let mut image = Image::from(&img);
    assert_eq!(scanner.scan_image(&mut image).unwrap(), 0);
}

#[test]
fn test_xml_output() {
    let img = render(&code128(&HELLO, 2), 2);
    let mut scanner = ImageScanner::new();
    let mut image = Image::from(&img);
    scanner.scan_image(&mut image).unwrap();

    let results = scanner.results().unwrap();
    let xml = results.first().unwrap().xml();
    assert!(xml.starts_with("<symbol type='CODE-128' quality='2' orientation='UP'>"));
    assert!(xml.contains("<data><![CDATA[HELLO]]></data>"));
    assert!(xml.contains("<polygon points='"));
    assert!(xml.ends_with("</symbol>"));
}
