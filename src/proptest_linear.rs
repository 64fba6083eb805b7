//! Property-based tests for linear symbol decoding
//!
//! Random payloads are encoded to element widths (or pixels) and fed back
//! through the decoder, the line scanner and the image scanner.

use crate::testutil::{code128, code39, decode_all, decoder_for, i25, render_row, reversed};
use crate::{Image, ImageScanner, LineScanner, SymbolType};
use proptest::prelude::*;

/// Code 128 character values for printable ASCII in code set B
fn set_b(text: &str) -> Vec<u8> {
    std::iter::once(104)
        .chain(text.bytes().map(|c| c - b' '))
        .collect()
}

/// Run pixel samples through a line scanner and collect decoded data
fn scan_samples(samples: &[u8]) -> Vec<(SymbolType, Vec<u8>)> {
    let mut scn = LineScanner::new(Some(decoder_for(&[SymbolType::Code128])));
    let mut out = Vec::new();
    let mut record = |scn: &LineScanner, sym: SymbolType| {
        if sym > SymbolType::Partial {
            if let Some(dcode) = scn.decoder() {
                out.push((sym, dcode.data().to_vec()));
            }
        }
    };
    for &y in samples {
        let sym = scn.scan_y(y as i32);
        record(&scn, sym);
    }
    for _ in 0..2 {
        let sym = scn.flush();
        record(&scn, sym);
    }
    out
}

proptest! {
    /// Printable Code 128 text decodes in both scan directions at any scale
    #[test]
    fn prop_code128_roundtrip(text in "[ -~]{1,20}", u in 1u32..=4) {
        let ws = code128(&set_b(&text), u);

        let mut dcode = decoder_for(&[SymbolType::Code128]);
        prop_assert_eq!(
            decode_all(&mut dcode, &ws),
            vec![(SymbolType::Code128, text.as_bytes().to_vec(), 1)]
        );

        let mut dcode = decoder_for(&[SymbolType::Code128]);
        prop_assert_eq!(
            decode_all(&mut dcode, &reversed(&ws)),
            vec![(SymbolType::Code128, text.as_bytes().to_vec(), -1)]
        );
    }

    /// Code 39 text decodes with any uniform element scale
    #[test]
    fn prop_code39_roundtrip(text in "[-0-9A-Z. $/+%]{1,20}", k in 1u32..=3) {
        let ws = code39(&text, 2 * k, 5 * k);

        let mut dcode = decoder_for(&[SymbolType::Code39]);
        prop_assert_eq!(
            decode_all(&mut dcode, &ws),
            vec![(SymbolType::Code39, text.as_bytes().to_vec(), 1)]
        );

        let mut dcode = decoder_for(&[SymbolType::Code39]);
        prop_assert_eq!(
            decode_all(&mut dcode, &reversed(&ws)),
            vec![(SymbolType::Code39, text.as_bytes().to_vec(), -1)]
        );
    }

    /// Interleaved 2 of 5 digit pairs decode in both directions
    #[test]
    fn prop_i25_roundtrip(digits in "([0-9]{2}){3,10}", k in 1u32..=3) {
        let ws = i25(&digits, 3 * k, 8 * k);

        let mut dcode = decoder_for(&[SymbolType::I25]);
        prop_assert_eq!(
            decode_all(&mut dcode, &ws),
            vec![(SymbolType::I25, digits.as_bytes().to_vec(), 1)]
        );

        let mut dcode = decoder_for(&[SymbolType::I25]);
        prop_assert_eq!(
            decode_all(&mut dcode, &reversed(&ws)),
            vec![(SymbolType::I25, digits.as_bytes().to_vec(), -1)]
        );
    }

    /// Edges found in rendered pixels reproduce the encoded widths
    #[test]
    fn prop_line_scanner_roundtrip(text in "[ -~]{1,12}", scale in 2u32..=4) {
        let samples = render_row(&code128(&set_b(&text), 1), scale);
        prop_assert_eq!(
            scan_samples(&samples),
            vec![(SymbolType::Code128, text.as_bytes().to_vec())]
        );
    }

    /// A rendered Code 128 image yields exactly one symbol
    #[test]
    fn prop_image_scanner_roundtrip(text in "[ -~]{1,10}") {
        let row = render_row(&code128(&set_b(&text), 2), 1);
        let width = row.len() as u32;
        let height = 6;
        let data = row.repeat(height as usize);
        let mut image = Image::from_gray(&data, width, height).unwrap();

        let mut scanner = ImageScanner::new();
        prop_assert_eq!(scanner.scan_image(&mut image).unwrap(), 1);
        let results = scanner.results().unwrap();
        let symbol = results.first().unwrap();
        prop_assert_eq!(symbol.symbol_type(), SymbolType::Code128);
        prop_assert_eq!(symbol.data(), text.as_bytes());
        prop_assert!(symbol.quality() > 0);
    }
}
