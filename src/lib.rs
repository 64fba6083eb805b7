//! Linear barcode scanning engine
//!
//! The pipeline has three stages:
//!
//! * [`LineScanner`] finds bar/space edges in a stream of intensity samples
//! * [`Decoder`] turns the resulting widths into symbols, running one state
//!   machine per symbology (EAN/UPC, Code 39, Code 93, Code 128, Codabar
//!   and Interleaved 2 of 5)
//! * [`ImageScanner`] applies both over the rows and columns of a grayscale
//!   [`Image`] and collects reference-counted results in a [`SymbolArena`]
//!
//! # Example
//! ```
//! use zedscan::{Image, ImageScanner};
//!
//! let mut scanner = ImageScanner::new();
//! scanner.parse_config("*.uncertainty=0").unwrap();
//!
//! let data = vec![255u8; 32 * 32];
//! let mut image = Image::from_gray(&data, 32, 32).unwrap();
//! let n = scanner.scan_image(&mut image).unwrap();
//! for symbol in scanner.results().into_iter().flatten() {
//!     println!("{}: {:?}", symbol.symbol_type(), symbol.data_string());
//! }
//! # assert_eq!(n, 0);
//! ```

pub mod color;
pub mod config;
pub mod decoder;
mod decoders;
pub mod error;
pub mod image;
pub mod img_scanner;
mod img_scanner_config;
pub mod line_scanner;
pub mod symbol;
pub mod symbol_set;

#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(test)]
mod proptest_linear;
#[cfg(test)]
mod testutil;

// Re-export main types
pub use color::Color;
pub use config::{parse_config, Config, DecoderConfig, ParseConfigError};
pub use decoder::{Decoder, DecoderHandler};
pub use error::{
    increase_verbosity, set_verbosity, verbosity, version, Error, ErrorInfo, Result, Severity,
};
pub use image::Image;
pub use img_scanner::{DataHandler, ImageScanner};
pub use line_scanner::LineScanner;
pub use symbol::{
    addon_name, symbol_name, Addon, Modifier, Orientation, Point, Symbol, SymbolType,
};
pub use symbol_set::{SymbolArena, SymbolId, SymbolIterator, SymbolSetId, SymbolSetView};
