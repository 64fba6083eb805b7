//! Pixel samples through the line scanner and decoder

mod common;

use common::{code128, code39, render, HELLO};
use zedscan::{Color, Decoder, LineScanner, SymbolType};

/// Feed one pixel row and return every completed symbol
fn scan_row(scn: &mut LineScanner, row: &[u8]) -> Vec<(SymbolType, Vec<u8>)> {
    let mut out = Vec::new();
    let mut push = |scn: &LineScanner, sym: SymbolType| {
        if sym > SymbolType::Partial {
            let data = scn.decoder().map(|d| d.data().to_vec()).unwrap_or_default();
            out.push((sym, data));
        }
    };
    for &y in row {
        let sym = scn.scan_y(i32::from(y));
        push(scn, sym);
    }
    let sym = scn.flush();
    push(scn, sym);
    let sym = scn.flush();
    push(scn, sym);
    let sym = scn.new_scan();
    push(scn, sym);
    out
}

#[test]
fn test_rows_decode_in_both_directions() {
    let img = render(&code128(&HELLO, 2), 1);
    let row = img.as_raw().clone();
    let mut scn = LineScanner::new(Some(Decoder::new()));

    assert_eq!(
        scan_row(&mut scn, &row),
        vec![(SymbolType::Code128, b"HELLO".to_vec())]
    );
    assert_eq!(scn.decoder().unwrap().direction(), 1);

    let reversed: Vec<u8> = row.iter().rev().copied().collect();
    assert_eq!(
        scan_row(&mut scn, &reversed),
        vec![(SymbolType::Code128, b"HELLO".to_vec())]
    );
    assert_eq!(scn.decoder().unwrap().direction(), -1);
}

#[test]
fn test_rgb_samples() {
    let img = render(&code39("ZED", 2, 5), 1);
    let mut scn = LineScanner::new(Some(Decoder::new()));
    let mut found = Vec::new();
    for &y in img.as_raw() {
        if scn.scan_rgb24([y, y, y]) > SymbolType::Partial {
            found.push(scn.decoder().unwrap().data().to_vec());
        }
    }
    for _ in 0..2 {
        if scn.flush() > SymbolType::Partial {
            found.push(scn.decoder().unwrap().data().to_vec());
        }
    }
    assert_eq!(found, vec![b"ZED".to_vec()]);
}

#[test]
fn test_scanner_without_decoder_reports_edges() {
    let img = render(&[20, 10, 10, 30, 10, 20], 1);
    let mut scn = LineScanner::new(None);
    let mut edges = 0;
    for &y in img.as_raw() {
        if scn.scan_y(i32::from(y)) != SymbolType::None {
            edges += 1;
        }
    }
    assert!(edges >= 4);
    assert!(scn.decoder().is_none());
}

#[test]
fn test_colored_widths() {
    let mut dcode = Decoder::new();
    assert_eq!(dcode.color(), Color::Space);
    let mut color = Color::Space;
    let mut last = SymbolType::None;
    for w in code39("OK", 2, 5) {
        last = dcode.decode_width_colored(w, color).unwrap().max(last);
        color = color.opposite();
    }
    assert_eq!(last, SymbolType::Code39);
    assert_eq!(dcode.data(), b"OK");
}
