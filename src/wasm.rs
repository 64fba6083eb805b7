//! WebAssembly bindings for the zedscan barcode scanner.

use wasm_bindgen::prelude::*;

use crate::image::Image;
use crate::img_scanner::ImageScanner;

/// A decoded barcode result.
#[wasm_bindgen]
pub struct DecodeResult {
    symbol_type: String,
    data: Vec<u8>,
    quality: i32,
    points: Vec<i32>,
}

#[wasm_bindgen]
impl DecodeResult {
    /// The barcode format name, add-on included (e.g. "EAN-13+5").
    #[wasm_bindgen(getter)]
    pub fn symbol_type(&self) -> String {
        self.symbol_type.clone()
    }

    /// Raw decoded bytes.
    #[wasm_bindgen(getter)]
    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Decoded data as UTF-8 text, or null if not valid UTF-8.
    #[wasm_bindgen(getter)]
    pub fn text(&self) -> Option<String> {
        std::str::from_utf8(&self.data).ok().map(|s| s.to_string())
    }

    /// Number of scan lines that agreed on this result.
    #[wasm_bindgen(getter)]
    pub fn quality(&self) -> i32 {
        self.quality
    }

    /// Location polygon as flattened `x, y` pairs.
    #[wasm_bindgen(getter)]
    pub fn points(&self) -> Vec<i32> {
        self.points.clone()
    }
}

/// Scan grayscale image data for linear barcodes.
///
/// `data` must be an array of 8-bit grayscale pixel values,
/// row-major, with dimensions `width` x `height`. `config` holds
/// optional `[symbology.]config[=value]` strings applied before scanning.
///
/// Returns an array of `DecodeResult` objects.
#[wasm_bindgen]
pub fn scan_grayscale(
    data: &[u8],
    width: u32,
    height: u32,
    config: Vec<String>,
) -> Result<Vec<DecodeResult>, JsValue> {
    let to_js = |e: crate::Error| JsValue::from_str(&e.to_string());
    let mut image = Image::from_gray(data, width, height).map_err(to_js)?;

    let mut scanner = ImageScanner::new();
    for setting in &config {
        scanner.parse_config(setting).map_err(to_js)?;
    }
    scanner.scan_image(&mut image).map_err(to_js)?;

    Ok(scanner
        .results()
        .into_iter()
        .flatten()
        .map(|s| DecodeResult {
            symbol_type: format!("{}{}", s.symbol_type(), s.addon().name()),
            data: s.data().to_vec(),
            quality: s.quality(),
            points: s.loc().iter().flat_map(|p| [p.x, p.y]).collect(),
        })
        .collect())
}
