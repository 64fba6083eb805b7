//! Per-symbology state machines
//!
//! Every machine sees every width. The order of [`SymbologyDecoder::registry`]
//! is the tie-break order: when two machines finish on the same width the
//! earlier one wins.

pub(crate) mod codabar;
pub(crate) mod code128;
pub(crate) mod code39;
pub(crate) mod code93;
pub(crate) mod ean;
pub(crate) mod i25;

use crate::config::Config;
use crate::decoder::{DecoderState, SymbologyConfig};
use crate::SymbolType;

use codabar::CodabarDecoder;
use code128::Code128Decoder;
use code39::Code39Decoder;
use code93::Code93Decoder;
use ean::EanDecoder;
use i25::I25Decoder;

/// One symbology state machine
#[derive(Debug, Clone)]
pub(crate) enum SymbologyDecoder {
    Ean(EanDecoder),
    Code39(Code39Decoder),
    Code93(Code93Decoder),
    Code128(Code128Decoder),
    Codabar(CodabarDecoder),
    I25(I25Decoder),
}

impl SymbologyDecoder {
    /// All machines in registration order
    pub(crate) fn registry() -> Vec<Self> {
        vec![
            Self::Ean(EanDecoder::default()),
            Self::Code39(Code39Decoder::default()),
            Self::Code93(Code93Decoder::default()),
            Self::Code128(Code128Decoder::default()),
            Self::Codabar(CodabarDecoder::default()),
            Self::I25(I25Decoder::default()),
        ]
    }

    pub(crate) fn is_enabled(&self) -> bool {
        match self {
            Self::Ean(d) => d.is_enabled(),
            Self::Code39(d) => d.config.test(Config::Enable),
            Self::Code93(d) => d.config.test(Config::Enable),
            Self::Code128(d) => d.config.test(Config::Enable),
            Self::Codabar(d) => d.config.test(Config::Enable),
            Self::I25(d) => d.config.test(Config::Enable),
        }
    }

    /// Feed the newest width (already stored in `st`)
    pub(crate) fn decode(&mut self, st: &mut DecoderState) -> SymbolType {
        match self {
            Self::Ean(d) => d.decode(st),
            Self::Code39(d) => d.decode(st),
            Self::Code93(d) => d.decode(st),
            Self::Code128(d) => d.decode(st),
            Self::Codabar(d) => d.decode(st),
            Self::I25(d) => d.decode(st),
        }
    }

    /// Start a new pass
    pub(crate) fn new_scan(&mut self) {
        match self {
            Self::Ean(d) => d.new_scan(),
            Self::Code39(d) => d.reset(),
            Self::Code93(d) => d.reset(),
            Self::Code128(d) => d.reset(),
            Self::Codabar(d) => d.reset(),
            Self::I25(d) => d.reset(),
        }
    }

    /// Drop all progress, keeping configuration
    pub(crate) fn reset(&mut self) {
        match self {
            Self::Ean(d) => d.reset(),
            Self::Code39(d) => d.reset(),
            Self::Code93(d) => d.reset(),
            Self::Code128(d) => d.reset(),
            Self::Codabar(d) => d.reset(),
            Self::I25(d) => d.reset(),
        }
    }

    pub(crate) fn config(&self, sym: SymbolType) -> Option<&SymbologyConfig> {
        match (self, sym) {
            (Self::Ean(d), _) => d.config(sym),
            (Self::Code39(d), SymbolType::Code39) => Some(&d.config),
            (Self::Code93(d), SymbolType::Code93) => Some(&d.config),
            (Self::Code128(d), SymbolType::Code128) => Some(&d.config),
            (Self::Codabar(d), SymbolType::Codabar) => Some(&d.config),
            (Self::I25(d), SymbolType::I25) => Some(&d.config),
            _ => None,
        }
    }

    pub(crate) fn config_mut(&mut self, sym: SymbolType) -> Option<&mut SymbologyConfig> {
        match (self, sym) {
            (Self::Ean(d), _) => d.config_mut(sym),
            (Self::Code39(d), SymbolType::Code39) => Some(&mut d.config),
            (Self::Code93(d), SymbolType::Code93) => Some(&mut d.config),
            (Self::Code128(d), SymbolType::Code128) => Some(&mut d.config),
            (Self::Codabar(d), SymbolType::Codabar) => Some(&mut d.config),
            (Self::I25(d), SymbolType::I25) => Some(&mut d.config),
            _ => None,
        }
    }
}
