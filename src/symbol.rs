//! Symbol types and decoded symbol records
//!
//! A [`Symbol`] is a read-only view of one decoded result held in a
//! [`SymbolArena`](crate::SymbolArena).

use std::fmt::{self, Display, Write as _};

use crate::symbol_set::{SymbolArena, SymbolId, SymbolSetView};

// ============================================================================
// Symbol types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum SymbolType {
    #[default]
    None = 0,
    Partial = 1,
    Ean2 = 2,
    Ean5 = 5,
    Ean8 = 8,
    Upce = 9,
    Isbn10 = 10,
    Upca = 12,
    Ean13 = 13,
    Isbn13 = 14,
    Composite = 15,
    I25 = 25,
    Codabar = 38,
    Code39 = 39,
    Pdf417 = 57,
    QrCode = 64,
    Code93 = 93,
    Code128 = 128,
}

impl SymbolType {
    /// Every symbology that carries its own configuration
    pub(crate) const ALL: [Self; 15] = [
        SymbolType::Ean13,
        SymbolType::Ean2,
        SymbolType::Ean5,
        SymbolType::Ean8,
        SymbolType::Upca,
        SymbolType::Upce,
        SymbolType::Isbn10,
        SymbolType::Isbn13,
        SymbolType::I25,
        SymbolType::Codabar,
        SymbolType::Code39,
        SymbolType::Code93,
        SymbolType::Code128,
        SymbolType::QrCode,
        SymbolType::Pdf417,
    ];

    /// Number of slots in per-symbology tables indexed by [`SymbolType::hash`]
    pub(crate) const NUM_HASHES: usize = 17;

    /// Dense index for per-symbology tables
    pub(crate) fn hash(self) -> Option<usize> {
        let h = match self {
            Self::Code128 => 0,
            Self::Ean13 => 1,
            Self::Upca => 2,
            Self::Ean8 => 3,
            Self::Upce => 4,
            Self::Isbn13 => 5,
            Self::Isbn10 => 6,
            Self::Code39 => 7,
            Self::I25 => 8,
            Self::QrCode => 9,
            Self::Pdf417 => 10,
            Self::Code93 => 11,
            Self::Ean2 => 12,
            Self::Ean5 => 13,
            Self::Composite => 14,
            Self::Codabar => 15,
            Self::Partial => 16,
            Self::None => return None,
        };
        Some(h)
    }

    /// Whether this is a member of the EAN/UPC family
    pub fn is_ean_family(self) -> bool {
        matches!(
            self,
            Self::Ean2
                | Self::Ean5
                | Self::Ean8
                | Self::Upce
                | Self::Isbn10
                | Self::Upca
                | Self::Ean13
                | Self::Isbn13
        )
    }

    /// Whether this is an EAN/UPC add-on
    pub fn is_addon(self) -> bool {
        matches!(self, Self::Ean2 | Self::Ean5)
    }

    /// Human-readable symbology name
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Partial => "Partial",
            Self::Ean2 => "EAN-2",
            Self::Ean5 => "EAN-5",
            Self::Ean8 => "EAN-8",
            Self::Upce => "UPC-E",
            Self::Isbn10 => "ISBN-10",
            Self::Upca => "UPC-A",
            Self::Ean13 => "EAN-13",
            Self::Isbn13 => "ISBN-13",
            Self::Composite => "COMPOSITE",
            Self::I25 => "I2/5",
            Self::Codabar => "Codabar",
            Self::Code39 => "CODE-39",
            Self::Pdf417 => "PDF417",
            Self::QrCode => "QR-Code",
            Self::Code93 => "CODE-93",
            Self::Code128 => "CODE-128",
        }
    }
}

impl Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<SymbolType> for i32 {
    fn from(value: SymbolType) -> Self {
        value as i32
    }
}

impl From<i32> for SymbolType {
    fn from(value: i32) -> Self {
        match value & SYMBOL_MASK {
            1 => Self::Partial,
            2 => Self::Ean2,
            5 => Self::Ean5,
            8 => Self::Ean8,
            9 => Self::Upce,
            10 => Self::Isbn10,
            12 => Self::Upca,
            13 => Self::Ean13,
            14 => Self::Isbn13,
            15 => Self::Composite,
            25 => Self::I25,
            38 => Self::Codabar,
            39 => Self::Code39,
            57 => Self::Pdf417,
            64 => Self::QrCode,
            93 => Self::Code93,
            128 => Self::Code128,
            _ => Self::None,
        }
    }
}

/// Mask selecting the base symbology from a combined type code
pub const SYMBOL_MASK: i32 = 0x00ff;
/// Mask selecting the add-on flags from a combined type code
pub const ADDON_MASK: i32 = 0x0700;

// ============================================================================
// Add-ons, modifiers and orientation
// ============================================================================

/// Add-on digits merged into a composite EAN/UPC symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Addon {
    #[default]
    None = 0,
    Addon2 = 0x200,
    Addon5 = 0x500,
}

impl Addon {
    pub(crate) fn for_type(sym: SymbolType) -> Self {
        match sym {
            SymbolType::Ean2 => Self::Addon2,
            SymbolType::Ean5 => Self::Addon5,
            _ => Self::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Addon2 => "+2",
            Self::Addon5 => "+5",
        }
    }
}

/// Name of the base symbology of a combined type code
pub fn symbol_name(code: i32) -> &'static str {
    SymbolType::from(code).name()
}

/// Name of the add-on of a combined type code ("" when there is none)
pub fn addon_name(code: i32) -> &'static str {
    match code & ADDON_MASK {
        0x200 => Addon::Addon2.name(),
        0x500 => Addon::Addon5.name(),
        _ => Addon::None.name(),
    }
}

/// Decode modifiers reported alongside the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Data starts with FNC1 in first position (GS1)
    Gs1 = 0,
    /// Data starts with FNC1 in second position (AIM)
    Aim = 1,
}

/// Coarse symbol orientation relative to the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Unknown = -1,
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Orientation {
    pub(crate) fn from_index(i: i32) -> Self {
        match i {
            0 => Self::Up,
            1 => Self::Right,
            2 => Self::Down,
            3 => Self::Left,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Up => "UP",
            Self::Right => "RIGHT",
            Self::Down => "DOWN",
            Self::Left => "LEFT",
        }
    }
}

/// Image coordinate of one location polygon vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

// ============================================================================
// Symbol records
// ============================================================================

/// Stored state of one decoded symbol
#[derive(Debug, Clone, Default)]
pub(crate) struct SymbolData {
    pub(crate) symbol_type: SymbolType,
    pub(crate) addon: Addon,
    pub(crate) modifiers: u32,
    pub(crate) data: Vec<u8>,
    pub(crate) pts: Vec<Point>,
    pub(crate) orient: Orientation,
    pub(crate) components: Option<crate::symbol_set::SymbolSetId>,
    pub(crate) quality: i32,
    pub(crate) cache_count: i32,
    pub(crate) time: u64,
}

impl SymbolData {
    pub(crate) fn new(symbol_type: SymbolType, data: Vec<u8>) -> Self {
        Self {
            symbol_type,
            data,
            quality: 1,
            ..Default::default()
        }
    }

    pub(crate) fn add_point(&mut self, x: i32, y: i32) {
        self.pts.push(Point { x, y });
    }
}

/// A reference to a decoded barcode symbol
#[derive(Clone, Copy)]
pub struct Symbol<'a> {
    arena: &'a SymbolArena,
    id: SymbolId,
    inner: &'a SymbolData,
}

impl<'a> Symbol<'a> {
    pub(crate) fn from_ref(arena: &'a SymbolArena, id: SymbolId, inner: &'a SymbolData) -> Self {
        Symbol { arena, id, inner }
    }

    /// Handle used to retain or release this symbol
    pub fn id(&self) -> SymbolId {
        self.id
    }

    /// Get the base symbol type
    pub fn symbol_type(&self) -> SymbolType {
        self.inner.symbol_type
    }

    /// Get the add-on merged into this symbol, if any
    pub fn addon(&self) -> Addon {
        self.inner.addon
    }

    /// Combined type code: base type plus add-on flags
    pub fn type_code(&self) -> i32 {
        self.inner.symbol_type as i32 | self.inner.addon as i32
    }

    /// Get the decoded data as bytes
    pub fn data(&self) -> &'a [u8] {
        &self.inner.data
    }

    /// Get the decoded data as a string (if valid UTF-8)
    pub fn data_string(&self) -> Option<&'a str> {
        std::str::from_utf8(&self.inner.data).ok()
    }

    /// Relative confidence; only meaningful for ordering
    pub fn quality(&self) -> i32 {
        self.inner.quality
    }

    /// Inter-frame cache count
    pub fn count(&self) -> i32 {
        self.inner.cache_count
    }

    /// Location polygon
    pub fn loc(&self) -> &'a [Point] {
        &self.inner.pts
    }

    pub fn orientation(&self) -> Orientation {
        self.inner.orient
    }

    /// Raw modifier bit mask
    pub fn modifiers(&self) -> u32 {
        self.inner.modifiers
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.inner.modifiers & (1 << modifier as u32) != 0
    }

    /// Get the component symbols (for composite EAN/UPC + add-on symbols)
    pub fn components(&self) -> Option<SymbolSetView<'a>> {
        self.inner.components.and_then(|set| self.arena.set(set))
    }

    /// Current reference count
    pub fn refcount(&self) -> u32 {
        self.arena.symbol_refcount(self.id).unwrap_or(0)
    }

    /// Serialize the symbol as an XML element
    pub fn xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        let sym = self.inner;
        let _ = write!(
            out,
            "<symbol type='{}{}' quality='{}' orientation='{}'",
            sym.symbol_type.name(),
            sym.addon.name(),
            sym.quality,
            sym.orient.name()
        );
        if sym.modifiers != 0 {
            let mut names = Vec::new();
            if self.has_modifier(Modifier::Gs1) {
                names.push("GS1");
            }
            if self.has_modifier(Modifier::Aim) {
                names.push("AIM");
            }
            let _ = write!(out, " modifiers='{}'", names.join(" "));
        }
        if sym.cache_count != 0 {
            let _ = write!(out, " count='{}'", sym.cache_count);
        }
        out.push('>');

        if needs_hex(&sym.data) {
            let _ = write!(out, "<data format='hex' length='{}'>", sym.data.len());
            for b in &sym.data {
                let _ = write!(out, "{b:02x}");
            }
            out.push_str("</data>");
        } else {
            out.push_str("<data><![CDATA[");
            out.push_str(&String::from_utf8_lossy(&sym.data));
            out.push_str("]]></data>");
        }

        if !sym.pts.is_empty() {
            out.push_str("<polygon points='");
            for (i, p) in sym.pts.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{},{}", p.x, p.y);
            }
            out.push_str("'/>");
        }

        if let Some(components) = self.components() {
            let _ = write!(out, "<symbols nsyms='{}'>", components.len());
            for child in components.iter() {
                child.write_xml(out);
            }
            out.push_str("</symbols>");
        }
        out.push_str("</symbol>");
    }
}

impl fmt::Debug for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("type", &self.inner.symbol_type)
            .field("addon", &self.inner.addon)
            .field("data", &String::from_utf8_lossy(&self.inner.data))
            .field("quality", &self.inner.quality)
            .field("count", &self.inner.cache_count)
            .finish()
    }
}

/// Data that cannot be carried verbatim inside a CDATA section
fn needs_hex(data: &[u8]) -> bool {
    data.windows(3).any(|w| w == b"]]>")
        || data
            .iter()
            .any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r'))
        || std::str::from_utf8(data).is_err()
}
