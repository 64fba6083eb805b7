//! Image scanner configuration
//!
//! Scanner-level settings kept next to the decoder's per-symbology ones:
//! scan densities, position tracking, inverted retry, composite merging and
//! the per-symbology uncertainty table.

use crate::config::default_uncertainty;
use crate::SymbolType;

/// Configuration options for the image scanner
#[derive(Debug, Clone)]
pub(crate) struct ImageScannerConfig {
    /// Record edge positions of decoded symbols
    pub(crate) position_tracking: bool,

    /// Retry an inverted copy when nothing is found
    pub(crate) test_inverted: bool,

    /// Column spacing of vertical scan lines (0 disables them)
    pub(crate) x_density: u32,

    /// Row spacing of horizontal scan lines (0 disables them)
    pub(crate) y_density: u32,

    /// Merge EAN/UPC and add-on results
    pub(crate) ean_composite: bool,

    /// Per-symbology uncertainty, indexed by [`SymbolType::hash`]
    uncertainty: [i32; SymbolType::NUM_HASHES],
}

impl Default for ImageScannerConfig {
    fn default() -> Self {
        let mut uncertainty = [0; SymbolType::NUM_HASHES];
        for sym in SymbolType::ALL {
            if let Some(h) = sym.hash() {
                uncertainty[h] = default_uncertainty(sym) as i32;
            }
        }
        Self {
            position_tracking: true,
            test_inverted: false,
            x_density: 1,
            y_density: 1,
            ean_composite: false,
            uncertainty,
        }
    }
}

impl ImageScannerConfig {
    /// Scan lines that must agree before `sym` is reported
    pub(crate) fn uncertainty(&self, sym: SymbolType) -> i32 {
        sym.hash().map_or(0, |h| self.uncertainty[h])
    }

    /// Set the uncertainty of one symbology, or of all of them for
    /// `None`/`Partial`
    pub(crate) fn set_uncertainty(&mut self, sym: SymbolType, val: i32) {
        if sym > SymbolType::Partial {
            if let Some(h) = sym.hash() {
                self.uncertainty[h] = val;
            }
        } else {
            self.uncertainty = [val; SymbolType::NUM_HASHES];
        }
    }
}
