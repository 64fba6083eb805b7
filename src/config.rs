//! Decoder configuration
//!
//! Two ways to configure a scanner are provided:
//!
//! * configuration strings of the form `[symbology.]config[=value]`, parsed
//!   by [`parse_config`] into a `(symbology, config, value)` triple that can
//!   be applied with [`ImageScanner::set_config`](crate::ImageScanner::set_config)
//! * a compile-time checked [`DecoderConfig`] builder that only accepts
//!   settings a symbology actually supports
//!
//! # Examples
//!
//! ```
//! use zedscan::config::*;
//! use zedscan::SymbolType;
//!
//! let (sym, cfg, val) = parse_config("code39.min-len=4").unwrap();
//! assert_eq!(sym, SymbolType::Code39);
//! assert_eq!(cfg, Config::MinLen);
//! assert_eq!(val, 4);
//!
//! let config = DecoderConfig::new()
//!     .enable(Ean13)
//!     .enable(Code39)
//!     .set_length_limits(Code39, 4, 20)   // Code39 supports variable length
//!     .set_ascii(Code39, true)            // and full ASCII
//!     .position_tracking(true);
//! # let _ = config;
//! ```
//!
//! The following configurations will NOT compile:
//!
//! ```compile_fail
//! # use zedscan::config::*;
//! # let config = DecoderConfig::new();
//! // EAN-13 has fixed length, doesn't support length limits
//! config.set_length_limits(Ean13, 1, 20);
//! ```
//!
//! ```compile_fail
//! # use zedscan::config::*;
//! # let config = DecoderConfig::new();
//! // only Code 39 has a full ASCII mode
//! config.set_ascii(Code128, true);
//! ```

use crate::SymbolType;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub mod symbologies;

// Re-export symbology types for convenience
pub use symbologies::*;

// ============================================================================
// Configuration Identifiers
// ============================================================================

/// A single configurable setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Config {
    /// Enable the symbology
    Enable = 0x00,
    /// Validate an optional check digit
    AddCheck = 0x01,
    /// Keep the check digit in the decoded data
    EmitCheck = 0x02,
    /// Full ASCII character set
    Ascii = 0x03,
    /// Minimum data length
    MinLen = 0x20,
    /// Maximum data length (0 for no limit)
    MaxLen = 0x21,
    /// Required number of matching scan lines
    Uncertainty = 0x40,
    /// Record symbol locations
    Position = 0x80,
    /// Retry inverted images when nothing is found
    TestInverted = 0x81,
    /// Column scan density
    XDensity = 0x100,
    /// Row scan density
    YDensity = 0x101,
}

impl Config {
    /// Numeric configuration identifier
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Whether the setting only accepts 0 or 1
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            Self::Enable
                | Self::AddCheck
                | Self::EmitCheck
                | Self::Ascii
                | Self::Position
                | Self::TestInverted
        )
    }

    /// Settings stored by the width-stream decoder
    pub(crate) fn is_decoder_setting(self) -> bool {
        (self as i32) < Self::Uncertainty as i32
    }
}

// ============================================================================
// Configuration Strings
// ============================================================================

/// Reasons a configuration string is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseConfigError {
    #[error("empty configuration")]
    Empty,
    #[error("unknown symbology '{0}'")]
    UnknownSymbology(String),
    #[error("unknown configuration '{0}'")]
    UnknownConfig(String),
    #[error("invalid value '{0}'")]
    InvalidValue(String),
}

/// Symbology names with the shortest prefix each one accepts
///
/// Entries are tried in order; a prefix shorter than an entry's minimum
/// stops the search.
const SYMBOLOGY_NAMES: &[(usize, &str, SymbolType)] = &[
    (2, "qrcode", SymbolType::QrCode),
    (3, "upca", SymbolType::Upca),
    (3, "upce", SymbolType::Upce),
    (3, "ean13", SymbolType::Ean13),
    (3, "ean8", SymbolType::Ean8),
    (3, "ean5", SymbolType::Ean5),
    (3, "ean2", SymbolType::Ean2),
    (3, "composite", SymbolType::Composite),
    (3, "i25", SymbolType::I25),
    (4, "scanner", SymbolType::Partial),
    (4, "isbn13", SymbolType::Isbn13),
    (4, "isbn10", SymbolType::Isbn10),
    (4, "codabar", SymbolType::Codabar),
    (6, "code93", SymbolType::Code93),
    (6, "code39", SymbolType::Code39),
    (6, "pdf417", SymbolType::Pdf417),
    (7, "code128", SymbolType::Code128),
];

/// Configuration names; the flag marks `disable`, which negates the value
const CONFIG_NAMES: &[(usize, &str, Config, bool)] = &[
    (1, "y-density", Config::YDensity, false),
    (1, "x-density", Config::XDensity, false),
    (2, "enable", Config::Enable, false),
    (3, "disable", Config::Enable, true),
    (3, "min-length", Config::MinLen, false),
    (3, "max-length", Config::MaxLen, false),
    (3, "ascii", Config::Ascii, false),
    (3, "add-check", Config::AddCheck, false),
    (3, "emit-check", Config::EmitCheck, false),
    (3, "uncertainty", Config::Uncertainty, false),
    (3, "test-inverted", Config::TestInverted, false),
    (5, "position", Config::Position, false),
];

fn lookup_prefix<'a, T: Copy>(
    prefix: &str,
    table: &'a [(usize, &'static str, T)],
) -> Option<T> {
    for &(min, name, value) in table {
        if prefix.len() < min {
            return None;
        }
        if name.starts_with(prefix) {
            return Some(value);
        }
    }
    None
}

fn lookup_config(prefix: &str) -> Option<(Config, bool)> {
    for &(min, name, cfg, negate) in CONFIG_NAMES {
        if prefix.len() < min {
            return None;
        }
        if name.starts_with(prefix) {
            return Some((cfg, negate));
        }
    }
    None
}

/// Parse an integer the way C's `strtol` with base 0 does
fn parse_value(text: &str) -> Option<i32> {
    let text = text.trim();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}

/// Parse a configuration string
///
/// The string has the form `[symbology.]config[=value]`. Names may be
/// abbreviated to any unambiguous prefix, `*` (or an empty symbology)
/// selects every symbology, a `no-` prefix negates the value and a
/// missing value means 1. Values are decimal, `0x` hexadecimal or
/// `0`-prefixed octal.
///
/// Returns the symbology (`SymbolType::None` for all), the setting and
/// its value.
pub fn parse_config(cfgstr: &str) -> Result<(SymbolType, Config, i32), ParseConfigError> {
    if cfgstr.is_empty() {
        return Err(ParseConfigError::Empty);
    }

    let (sym, rest) = match cfgstr.split_once('.') {
        Some((name, rest)) => {
            let sym = if name.is_empty() || name == "*" {
                SymbolType::None
            } else {
                lookup_prefix(name, SYMBOLOGY_NAMES)
                    .ok_or_else(|| ParseConfigError::UnknownSymbology(name.to_string()))?
            };
            (sym, rest)
        }
        None => (SymbolType::None, cfgstr),
    };

    let (name, value) = match rest.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    };

    let (name, mut negate) = match name.strip_prefix("no-") {
        Some(stripped) if !stripped.is_empty() => (stripped, true),
        _ => (name, false),
    };

    if name.is_empty() {
        return Err(ParseConfigError::UnknownConfig(name.to_string()));
    }
    let (cfg, disable) =
        lookup_config(name).ok_or_else(|| ParseConfigError::UnknownConfig(name.to_string()))?;
    negate ^= disable;

    let mut val = match value {
        Some(text) => {
            parse_value(text).ok_or_else(|| ParseConfigError::InvalidValue(text.to_string()))?
        }
        None => 1,
    };
    if negate {
        val = (val == 0) as i32;
    }
    Ok((sym, cfg, val))
}

// ============================================================================
// Capability Traits
// ============================================================================

/// Marker trait for symbologies that can be enabled/disabled
pub trait SupportsEnable: Symbology {}

/// Marker trait for symbologies that support checksum configuration
pub trait SupportsChecksum: Symbology {}

/// Marker trait for symbologies that support variable length limits
pub trait SupportsLengthLimits: Symbology {}

/// Marker trait for symbologies with a full ASCII mode
pub trait SupportsAscii: Symbology {}

/// Marker trait for symbologies that support uncertainty configuration
pub trait SupportsUncertainty: Symbology {}

/// Base trait that all symbology types must implement
pub trait Symbology: Sized {
    /// The corresponding SymbolType enum value
    const TYPE: SymbolType;

    /// Human-readable name
    const NAME: &'static str;
}

// ============================================================================
// User-Facing Configuration Builder
// ============================================================================

/// Type-safe configuration builder
///
/// The builder starts from the scanner defaults and only accepts settings
/// that the chosen symbology supports. Apply it with
/// [`ImageScanner::with_config`](crate::ImageScanner::with_config).
///
/// # Example
/// ```
/// use zedscan::config::*;
/// use zedscan::ImageScanner;
///
/// let config = DecoderConfig::new()
///     .enable(Ean13)
///     .enable(Code39)
///     .set_checksum(Code39, true, false)
///     .set_length_limits(Code39, 4, 20)
///     .position_tracking(true);
/// let scanner = ImageScanner::with_config(&config).unwrap();
/// # let _ = scanner;
/// ```
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Which symbologies are enabled
    pub(crate) enabled: HashSet<SymbolType>,

    /// Checksum configuration: (add_check, emit_check)
    pub(crate) checksum_flags: HashMap<SymbolType, (bool, bool)>,

    /// Length limits: (min, max)
    pub(crate) length_limits: HashMap<SymbolType, (u32, u32)>,

    /// Full ASCII mode
    pub(crate) ascii_mode: HashSet<SymbolType>,

    /// Uncertainty threshold per symbology
    pub(crate) uncertainty: HashMap<SymbolType, u32>,

    /// Global scanner configuration
    pub(crate) position_tracking: bool,
    pub(crate) test_inverted: bool,
    pub(crate) x_density: u32,
    pub(crate) y_density: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderConfig {
    /// Create a new configuration with the scanner defaults
    ///
    /// By default:
    /// - EAN-13, EAN-8, I25, Codabar, Code39, Code93, Code128 are enabled
    /// - UPC-A, UPC-E, ISBN-10, ISBN-13 emit check digits when enabled
    /// - EAN-2/EAN-5 add-ons and composite merging are disabled
    /// - Position tracking is enabled
    /// - Scan density is 1x1
    /// - Inverted image testing is disabled
    pub fn new() -> Self {
        let mut config = Self {
            enabled: HashSet::new(),
            checksum_flags: HashMap::new(),
            length_limits: HashMap::new(),
            ascii_mode: HashSet::new(),
            uncertainty: HashMap::new(),
            position_tracking: true,
            test_inverted: false,
            x_density: 1,
            y_density: 1,
        };

        for sym in [
            SymbolType::Ean13,
            SymbolType::Ean8,
            SymbolType::I25,
            SymbolType::Codabar,
            SymbolType::Code39,
            SymbolType::Code93,
            SymbolType::Code128,
        ] {
            config.enabled.insert(sym);
        }

        // EAN/UPC variants emit their check digit
        for sym in [
            SymbolType::Ean13,
            SymbolType::Ean8,
            SymbolType::Upca,
            SymbolType::Upce,
            SymbolType::Isbn10,
            SymbolType::Isbn13,
        ] {
            config.checksum_flags.insert(sym, (false, true));
        }

        config.length_limits.insert(SymbolType::I25, (6, 0));
        config.length_limits.insert(SymbolType::Codabar, (4, 0));
        config.length_limits.insert(SymbolType::Code39, (1, 0));
        config.length_limits.insert(SymbolType::Code93, (0, 0));
        config.length_limits.insert(SymbolType::Code128, (0, 0));

        for sym in SymbolType::ALL {
            config.uncertainty.insert(sym, default_uncertainty(sym));
        }
        config.uncertainty.insert(SymbolType::Composite, 0);

        config
    }

    // ========================================================================
    // Per-Symbology Configuration
    // ========================================================================

    /// Enable a symbology
    pub fn enable<S: Symbology + SupportsEnable>(mut self, _: S) -> Self {
        self.enabled.insert(S::TYPE);
        self
    }

    /// Disable a symbology
    pub fn disable<S: Symbology + SupportsEnable>(mut self, _: S) -> Self {
        self.enabled.remove(&S::TYPE);
        self
    }

    /// Disable all symbologies
    ///
    /// Useful when you want to start with a clean slate and only enable
    /// specific symbologies.
    ///
    /// # Example
    /// ```
    /// use zedscan::config::*;
    ///
    /// let config = DecoderConfig::new()
    ///     .disable_all()
    ///     .enable(Code128)
    ///     .enable(Code39);
    /// # let _ = config;
    /// ```
    pub fn disable_all(mut self) -> Self {
        self.enabled.clear();
        self
    }

    /// Check if a symbology is enabled
    pub fn is_enabled(&self, sym: SymbolType) -> bool {
        self.enabled.contains(&sym)
    }

    /// Configure checksum behavior for a symbology
    ///
    /// # Arguments
    /// * `add_check` - Validate checksum during decoding
    /// * `emit_check` - Include checksum digit in decoded data
    pub fn set_checksum<S: Symbology + SupportsChecksum>(
        mut self,
        _: S,
        add_check: bool,
        emit_check: bool,
    ) -> Self {
        self.checksum_flags.insert(S::TYPE, (add_check, emit_check));
        self
    }

    /// Set minimum and maximum length limits (`max` of 0 means unlimited)
    ///
    /// Only valid for variable-length symbologies like Code39, Code128, etc.
    ///
    /// # Panics
    /// Panics if a nonzero `max` is below `min`.
    pub fn set_length_limits<S: Symbology + SupportsLengthLimits>(
        mut self,
        _: S,
        min: u32,
        max: u32,
    ) -> Self {
        assert!(max == 0 || min <= max, "min length must be <= max length");
        self.length_limits.insert(S::TYPE, (min, max));
        self
    }

    /// Enable or disable full ASCII decoding
    pub fn set_ascii<S: Symbology + SupportsAscii>(mut self, _: S, enabled: bool) -> Self {
        if enabled {
            self.ascii_mode.insert(S::TYPE);
        } else {
            self.ascii_mode.remove(&S::TYPE);
        }
        self
    }

    /// Set the number of scan lines that must agree before a symbol is
    /// reported
    ///
    /// Higher values are more tolerant of poor quality images but may
    /// drop small symbols.
    pub fn set_uncertainty<S: Symbology + SupportsUncertainty>(
        mut self,
        _: S,
        threshold: u32,
    ) -> Self {
        self.uncertainty.insert(S::TYPE, threshold);
        self
    }

    // ========================================================================
    // Global Scanner Configuration
    // ========================================================================

    /// Enable or disable position tracking
    ///
    /// When enabled, the scanner records the pixel coordinates of each
    /// detected symbol.
    pub fn position_tracking(mut self, enabled: bool) -> Self {
        self.position_tracking = enabled;
        self
    }

    /// Enable or disable inverted image testing
    ///
    /// When enabled, if no symbols are found in the normal image, the
    /// scanner will try again with an inverted (negative) image.
    pub fn test_inverted(mut self, enabled: bool) -> Self {
        self.test_inverted = enabled;
        self
    }

    /// Set scan density for both axes
    ///
    /// A value of 1 scans every line; 0 disables scanning in that
    /// direction.
    pub fn scan_density(mut self, x: u32, y: u32) -> Self {
        self.x_density = x;
        self.y_density = y;
        self
    }

    /// Set horizontal scan density
    pub fn x_density(mut self, density: u32) -> Self {
        self.x_density = density;
        self
    }

    /// Set vertical scan density
    pub fn y_density(mut self, density: u32) -> Self {
        self.y_density = density;
        self
    }

    /// Flatten the builder into `(symbology, config, value)` settings
    pub(crate) fn settings(&self) -> Vec<(SymbolType, Config, i32)> {
        let flag = |b: bool| b as i32;
        let mut out = Vec::new();

        for sym in SymbolType::ALL {
            if matches!(sym, SymbolType::QrCode | SymbolType::Pdf417) {
                continue;
            }
            out.push((sym, Config::Enable, flag(self.enabled.contains(&sym))));
            if let Some(&(add, emit)) = self.checksum_flags.get(&sym) {
                out.push((sym, Config::AddCheck, flag(add)));
                out.push((sym, Config::EmitCheck, flag(emit)));
            }
            if let Some(&(min, max)) = self.length_limits.get(&sym) {
                out.push((sym, Config::MinLen, min as i32));
                out.push((sym, Config::MaxLen, max as i32));
            }
            if sym == SymbolType::Code39 {
                out.push((sym, Config::Ascii, flag(self.ascii_mode.contains(&sym))));
            }
            if let Some(&u) = self.uncertainty.get(&sym) {
                out.push((sym, Config::Uncertainty, u as i32));
            }
        }

        let composite = SymbolType::Composite;
        out.push((
            composite,
            Config::Enable,
            flag(self.enabled.contains(&composite)),
        ));
        if let Some(&u) = self.uncertainty.get(&composite) {
            out.push((composite, Config::Uncertainty, u as i32));
        }

        let scanner = SymbolType::Partial;
        out.push((scanner, Config::Position, flag(self.position_tracking)));
        out.push((scanner, Config::TestInverted, flag(self.test_inverted)));
        out.push((scanner, Config::XDensity, self.x_density as i32));
        out.push((scanner, Config::YDensity, self.y_density as i32));
        out
    }
}

/// Scan lines that must agree before a symbology is reported
pub(crate) fn default_uncertainty(sym: SymbolType) -> u32 {
    if sym.is_ean_family() || sym == SymbolType::I25 {
        2
    } else if sym == SymbolType::Codabar {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbology_and_default_value() {
        assert_eq!(
            parse_config("qrcode.enable"),
            Ok((SymbolType::QrCode, Config::Enable, 1))
        );
        assert_eq!(
            parse_config("min-len=4"),
            Ok((SymbolType::None, Config::MinLen, 4))
        );
        assert_eq!(
            parse_config("*.disable"),
            Ok((SymbolType::None, Config::Enable, 0))
        );
    }

    #[test]
    fn test_parse_prefixes_and_negation() {
        assert_eq!(
            parse_config("ean.en"),
            Ok((SymbolType::Ean13, Config::Enable, 1))
        );
        assert_eq!(
            parse_config("code128.no-emit-check"),
            Ok((SymbolType::Code128, Config::EmitCheck, 0))
        );
        assert_eq!(
            parse_config("scanner.x-density=0x3"),
            Ok((SymbolType::Partial, Config::XDensity, 3))
        );
        assert_eq!(
            parse_config("composite.enable=1"),
            Ok((SymbolType::Composite, Config::Enable, 1))
        );
        assert_eq!(
            parse_config("no-disable"),
            Ok((SymbolType::None, Config::Enable, 1))
        );
        assert_eq!(
            parse_config("i25.max-length=010"),
            Ok((SymbolType::I25, Config::MaxLen, 8))
        );
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(parse_config(""), Err(ParseConfigError::Empty));
        assert_eq!(
            parse_config("code39.frobnicate"),
            Err(ParseConfigError::UnknownConfig("frobnicate".into()))
        );
        assert!(matches!(
            parse_config("code.enable"),
            Err(ParseConfigError::UnknownSymbology(_))
        ));
        assert!(matches!(
            parse_config("e"),
            Err(ParseConfigError::UnknownConfig(_))
        ));
        assert!(matches!(
            parse_config("min-length=four"),
            Err(ParseConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            parse_config("qr.enable"),
            Ok((SymbolType::QrCode, Config::Enable, 1))
        ));
        assert!(parse_config("q.enable").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::new();
        assert!(config.is_enabled(SymbolType::Ean13));
        assert!(config.is_enabled(SymbolType::Code39));
        assert!(!config.is_enabled(SymbolType::Ean5));
        assert!(config.position_tracking);
        assert!(!config.test_inverted);
        assert_eq!(config.x_density, 1);
        assert_eq!(config.y_density, 1);
        assert_eq!(config.uncertainty.get(&SymbolType::Codabar), Some(&1));
        assert_eq!(config.uncertainty.get(&SymbolType::Ean13), Some(&2));
        assert_eq!(config.uncertainty.get(&SymbolType::Composite), Some(&0));
    }

    #[test]
    fn test_builder_pattern() {
        let config = DecoderConfig::new()
            .enable(Ean13)
            .disable(Code39)
            .set_checksum(Code39, true, false)
            .position_tracking(false)
            .scan_density(2, 2);

        assert!(config.is_enabled(SymbolType::Ean13));
        assert!(!config.is_enabled(SymbolType::Code39));
        assert!(!config.position_tracking);
        assert_eq!(config.x_density, 2);
        assert_eq!(config.y_density, 2);
    }

    #[test]
    fn test_type_safe_length_limits() {
        let config = DecoderConfig::new()
            .set_length_limits(Code39, 5, 20)
            .set_length_limits(Code128, 1, 50)
            .set_length_limits(I25, 6, 30);

        assert_eq!(
            config.length_limits.get(&SymbolType::Code39),
            Some(&(5, 20))
        );
        assert_eq!(
            config.length_limits.get(&SymbolType::Code128),
            Some(&(1, 50))
        );
        assert_eq!(config.length_limits.get(&SymbolType::I25), Some(&(6, 30)));
    }

    #[test]
    fn test_settings_flatten() {
        let config = DecoderConfig::new()
            .disable_all()
            .enable(Code39)
            .set_ascii(Code39, true)
            .enable(Composite);
        let settings = config.settings();

        assert!(settings.contains(&(SymbolType::Code39, Config::Enable, 1)));
        assert!(settings.contains(&(SymbolType::Code39, Config::Ascii, 1)));
        assert!(settings.contains(&(SymbolType::Ean13, Config::Enable, 0)));
        assert!(settings.contains(&(SymbolType::Composite, Config::Enable, 1)));
        assert!(settings.contains(&(SymbolType::Partial, Config::YDensity, 1)));
        assert!(!settings.iter().any(|s| s.0 == SymbolType::QrCode));
    }
}
