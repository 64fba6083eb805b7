//! EAN/UPC barcode decoder
//!
//! Decodes EAN-13, EAN-8, UPC-A, UPC-E, ISBN-10, ISBN-13 and the EAN-2 and
//! EAN-5 add-ons. Up to four passes run in parallel, one per width phase,
//! and each reports a half symbol (or a whole UPC-E or add-on). Halves are
//! collected across passes and scans until a matching pair with a valid
//! check digit has been seen.

use crate::color::Color;
use crate::config::Config;
use crate::decoder::{decode_e, DecoderState, SymbologyConfig};
use crate::error::zassert;
use crate::SymbolType;

// Pass state bits
const STATE_REV: i8 = i8::MIN;
const STATE_ADDON: i8 = 0x40;
const STATE_IDX: i8 = 0x3f;

/// Size of the digit collection buffer
const EAN_BUF: usize = 18;

/// Symbologies handled here, in configuration slot order
const EAN_TYPES: [SymbolType; 8] = [
    SymbolType::Ean2,
    SymbolType::Ean5,
    SymbolType::Ean8,
    SymbolType::Upce,
    SymbolType::Isbn10,
    SymbolType::Upca,
    SymbolType::Ean13,
    SymbolType::Isbn13,
];

// ============================================================================
// Lookup tables
// ============================================================================

/// Convert compact encoded D2E1E2 to character (bit4 is parity)
static DIGITS: [u8; 20] = [
    // E1   E2
    0x06, 0x10, 0x04, 0x13, //  2  2-5
    0x19, 0x08, 0x11, 0x05, //  3  2-5 (d2 <= thr)
    0x09, 0x12, 0x07, 0x15, //  4  2-5 (d2 <= thr)
    0x16, 0x00, 0x14, 0x03, //  5  2-5
    0x18, 0x01, 0x02, 0x17, // E1E2=43,44,33,34 (d2 > thr)
];

/// Parity decoding for UPC-E check digit and EAN-13 leading digit
static PARITY_DECODE: [u8; 0x20] = [
    0xf0, // [00] [xx] BBBBBB = RIGHT half EAN-13
    // UPC-E check digit encoding
    0xff, 0xff, 0x0f, // [01-03] [07] BBBAAA = 0
    0xff, 0x1f, // [04-05] [0b] BBABAA = 1
    0x2f, // [06] [0d] BBAABA = 2
    0xf3, // [07] [0e] BBAAAB = 3
    0xff, 0x4f, // [08-09] [13] BABBAA = 4
    0x7f, // [0a] [15] BABABA = 7
    0xf8, // [0b] [16] BABAAB = 8
    0x5f, // [0c] [19] BAABBA = 5
    0xf9, // [0d] [1a] BAABAB = 9
    0xf6, // [0e] [1c] BAAABB = 6
    0xff, // [0f]
    // LEFT half EAN-13 leading digit
    0xff, 0x6f, // [10-11] [23] ABBBAA = 6
    0x9f, // [12] [25] ABBABA = 9
    0xf5, // [13] [26] ABBAAB = 5
    0x8f, // [14] [29] ABABBA = 8
    0xf7, // [15] [2a] ABABAB = 7
    0xf4, // [16] [2c] ABAABB = 4
    0xff, 0x3f, // [17-18] [31] AABBBA = 3
    0xf2, // [19] [32] AABBAB = 2
    0xf1, // [1a] [34] AABABB = 1
    0xff, 0xff, 0xff, 0xff, 0x0f, // [1b-1f] [3f] AAAAAA = 0
];

/// Look up a 6-bit parity pattern
#[inline]
fn parity_decode(par: u8) -> u8 {
    let mut v = PARITY_DECODE[(par >> 1) as usize];
    if (par & 1) != 0 {
        v >>= 4;
    }
    v & 0xf
}

// ============================================================================
// Partial results
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Left,
    Right,
}

/// What a single pass recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    /// One half of an EAN-13 or EAN-8
    Half(SymbolType, Half),
    /// A complete UPC-E
    Upce,
    /// A complete EAN-2 or EAN-5 add-on
    Addon(SymbolType),
}

impl Part {
    fn symbol_type(self) -> SymbolType {
        match self {
            Self::Half(sym, _) | Self::Addon(sym) => sym,
            Self::Upce => SymbolType::Upce,
        }
    }
}

/// State of one of the 4 interleaved passes
#[derive(Debug, Clone, Copy)]
struct EanPass {
    /// -1 idle; otherwise element index plus STATE_* flags
    state: i8,
    width: u32,
    raw: [u8; 7],
}

impl Default for EanPass {
    fn default() -> Self {
        Self {
            state: -1,
            width: 0,
            raw: [0; 7],
        }
    }
}

// ============================================================================
// Width measurements
// ============================================================================

/// Total width of `n` elements starting at `offset`
#[inline]
fn calc_s(st: &DecoderState, offset: u8, n: u8) -> u32 {
    (offset..offset + n).map(|i| st.get_width(i)).sum()
}

/// Whether `w1` is within 1/8 of `w0`
#[inline]
fn check_width(w0: u32, w1: u32) -> bool {
    let dw0 = w0 as u64;
    let w0 = dw0 * 8;
    let w1 = w1 as u64 * 8;
    w0 - dw0 <= w1 && w1 <= w0 + dw0
}

/// Evaluate previous N (>= 2) widths as auxiliary pattern,
/// using preceding 4 as character width
fn aux_end(st: &DecoderState, fwd: u8) -> i32 {
    // reference width from previous character
    let s = calc_s(st, 4 + fwd, 4);

    // check quiet zone
    let qz = st.get_width(0);
    if fwd == 0 && qz != 0 && qz <= s * 3 / 4 {
        return -1;
    }

    let mut code = 0;
    for i in (1 - fwd)..(3 + fwd) {
        let e = st.pair_width(i);
        let e = decode_e(e, s, 7);
        if e < 0 {
            return -1;
        }
        code = (code << 2) | e;
    }
    code
}

/// Check addon delimiter using current 4 as character
#[inline]
fn aux_mid(st: &DecoderState, s4: u32) -> i32 {
    decode_e(st.pair_width(4), s4, 7)
}

/// Determine possible auxiliary pattern using current 4 as possible character
fn aux_start(st: &DecoderState, s4: u32) -> i8 {
    if s4 < 6 {
        return -1;
    }
    if decode_e(st.pair_width(5), s4, 7) != 0 {
        return -1;
    }
    let e1 = decode_e(st.pair_width(4), s4, 7);

    if st.color() == Color::Bar {
        // check for quiet-zone
        let qz = st.get_width(7);
        if qz == 0 || qz > s4 * 3 / 4 {
            if e1 == 0 {
                // normal symbol start
                return 0;
            } else if e1 == 1 {
                // add-on symbol start
                return STATE_ADDON;
            }
        }
        return -1;
    }

    if e1 == 0 {
        // attempting decode from SPACE => validate center guard
        if decode_e(st.pair_width(6), s4, 7) == 0 && decode_e(st.pair_width(7), s4, 7) == 0 {
            // start after center guard
            return 0;
        }
    }
    -1
}

/// Attempt to decode previous 4 widths (2 bars and 2 spaces) as a character
fn decode4(st: &DecoderState, s4: u32) -> i32 {
    let bar = st.color() == Color::Bar;

    // calculate similar edge measurements
    let e1 = if bar { st.pair_width(0) } else { st.pair_width(2) };
    let e2 = st.pair_width(1);
    if s4 < 6 {
        return -1;
    }

    // create compacted encoding for direct lookup
    let e1 = decode_e(e1, s4, 7);
    let e2 = decode_e(e2, s4, 7);
    if e1 < 0 || e2 < 0 {
        return -1;
    }
    let mut code = (e1 << 2) | e2;

    // 4 combinations require additional determinant (D2)
    // E1E2 == 34 (0110)
    // E1E2 == 43 (1001)
    // E1E2 == 33 (0101)
    // E1E2 == 44 (1010)
    if ((1 << code) & 0x0660) != 0 {
        // use sum of bar widths
        let bars = if bar {
            st.get_width(0) + st.get_width(2)
        } else {
            st.get_width(1) + st.get_width(3)
        };
        let d2 = bars as u64 * 7;
        let mid: u64 = if ((1 << code) & 0x0420) != 0 { 3 } else { 4 };
        if d2 > mid * s4 as u64 {
            // compress code space
            code = ((code >> 1) & 3) | 0x10;
        }
    }
    code
}

// ============================================================================
// Half symbol completion
// ============================================================================

/// EAN-8 half
fn part_end4(pass: &mut EanPass, fwd: bool) -> Option<Part> {
    let par = ((pass.raw[1] & 0x10) >> 1)
        | ((pass.raw[2] & 0x10) >> 2)
        | ((pass.raw[3] & 0x10) >> 3)
        | ((pass.raw[4] & 0x10) >> 4);
    if par != 0 && par != 0xf {
        // invalid parity combination
        return None;
    }

    if (par == 0) == fwd {
        // reverse sampled digits
        pass.state |= STATE_REV;
        pass.raw.swap(1, 4);
        pass.raw.swap(2, 3);
    }

    let half = if par == 0 { Half::Right } else { Half::Left };
    Some(Part::Half(SymbolType::Ean8, half))
}

/// EAN-2 add-on
fn part_end2(pass: &EanPass) -> Option<Part> {
    let par = ((pass.raw[1] & 0x10) >> 3) | ((pass.raw[2] & 0x10) >> 4);
    // calculate "checksum"
    let chk = !((pass.raw[1] & 0xf) * 10 + (pass.raw[2] & 0xf)) & 0x3;
    (par == chk).then_some(Part::Addon(SymbolType::Ean2))
}

/// EAN-5 add-on
fn part_end5(pass: &EanPass) -> Option<Part> {
    let raw = &pass.raw;
    let par = (raw[1] & 0x10)
        | ((raw[2] & 0x10) >> 1)
        | ((raw[3] & 0x10) >> 2)
        | ((raw[4] & 0x10) >> 3)
        | ((raw[5] & 0x10) >> 4);

    let chk = (((raw[1] & 0x0f) as u32
        + (raw[2] & 0x0f) as u32 * 3
        + (raw[3] & 0x0f) as u32
        + (raw[4] & 0x0f) as u32 * 3
        + (raw[5] & 0x0f) as u32)
        * 3
        % 10) as u8;

    (parity_decode(par) == chk).then_some(Part::Addon(SymbolType::Ean5))
}

// ============================================================================
// EAN Decoder
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct EanDecoder {
    pass: [EanPass; 4],
    /// Collected left half (or add-on) type
    left: SymbolType,
    /// Collected right half type
    right: SymbolType,
    /// Whether the last half was read in reverse
    direction: bool,
    /// Running width of the last 4 elements
    s4: u32,
    /// Character width of the collected halves
    width: u32,
    /// Collected digits; -1 marks an unused slot
    buf: [i8; EAN_BUF],
    configs: [SymbologyConfig; 8],
}

impl Default for EanDecoder {
    fn default() -> Self {
        let mut configs = [SymbologyConfig::default(); 8];
        for (config, sym) in configs.iter_mut().zip(EAN_TYPES) {
            let mut c = SymbologyConfig::default();
            if sym != SymbolType::Ean2 && sym != SymbolType::Ean5 {
                c = c.with(Config::EmitCheck);
            }
            if sym == SymbolType::Ean13 || sym == SymbolType::Ean8 {
                c = c.with(Config::Enable);
            }
            *config = c;
        }
        Self {
            pass: [EanPass::default(); 4],
            left: SymbolType::None,
            right: SymbolType::None,
            direction: false,
            s4: 0,
            width: 0,
            buf: [-1; EAN_BUF],
            configs,
        }
    }
}

impl EanDecoder {
    fn slot(sym: SymbolType) -> Option<usize> {
        EAN_TYPES.iter().position(|&t| t == sym)
    }

    pub(crate) fn config(&self, sym: SymbolType) -> Option<&SymbologyConfig> {
        Self::slot(sym).map(|i| &self.configs[i])
    }

    pub(crate) fn config_mut(&mut self, sym: SymbolType) -> Option<&mut SymbologyConfig> {
        Self::slot(sym).map(move |i| &mut self.configs[i])
    }

    fn enabled(&self, sym: SymbolType) -> bool {
        self.config(sym).is_some_and(|c| c.test(Config::Enable))
    }

    /// Whether any EAN/UPC variant is enabled
    pub(crate) fn is_enabled(&self) -> bool {
        self.configs.iter().any(|c| c.test(Config::Enable))
    }

    /// Drop all passes in progress; collected halves are kept
    pub(crate) fn new_scan(&mut self) {
        for pass in &mut self.pass {
            pass.state = -1;
        }
        self.s4 = 0;
    }

    pub(crate) fn reset(&mut self) {
        self.new_scan();
        self.left = SymbolType::None;
        self.right = SymbolType::None;
        self.buf = [-1; EAN_BUF];
    }

    /// EAN-13 half or UPC-E
    fn part_end7(&self, pass: &mut EanPass, fwd: bool) -> Option<Part> {
        let raw = &pass.raw;
        // calculate parity index
        let par = if fwd {
            ((raw[1] & 0x10) << 1)
                | (raw[2] & 0x10)
                | ((raw[3] & 0x10) >> 1)
                | ((raw[4] & 0x10) >> 2)
                | ((raw[5] & 0x10) >> 3)
                | ((raw[6] & 0x10) >> 4)
        } else {
            ((raw[1] & 0x10) >> 4)
                | ((raw[2] & 0x10) >> 3)
                | ((raw[3] & 0x10) >> 2)
                | ((raw[4] & 0x10) >> 1)
                | (raw[5] & 0x10)
                | ((raw[6] & 0x10) << 1)
        };

        // lookup parity combination
        pass.raw[0] = parity_decode(par);
        if pass.raw[0] == 0xf {
            // invalid parity combination
            return None;
        }

        if (par == 0) == fwd {
            // reverse sampled digits
            pass.state |= STATE_REV;
            for i in 1..4 {
                pass.raw.swap(i, 7 - i);
            }
        }

        if self.enabled(SymbolType::Ean13) {
            if par == 0 {
                return Some(Part::Half(SymbolType::Ean13, Half::Right));
            }
            if (par & 0x20) != 0 {
                return Some(Part::Half(SymbolType::Ean13, Half::Left));
            }
        }
        if par != 0 && (par & 0x20) == 0 {
            return Some(Part::Upce);
        }
        None
    }

    /// Update state for one of 4 parallel passes
    fn decode_pass(&mut self, st: &DecoderState, pass: &mut EanPass) -> Option<Part> {
        pass.state = pass.state.wrapping_add(1);
        let mut idx = pass.state & STATE_IDX;
        let fwd = (pass.state & 1) as u8;

        if st.color() == Color::Space {
            if (pass.state & STATE_ADDON) != 0 {
                if idx == 0x09 || idx == 0x21 {
                    let qz = st.get_width(0);
                    let s = calc_s(st, 1, 4);
                    let part = if qz == 0 || qz >= s * 3 / 4 {
                        if idx == 0x09 {
                            part_end2(pass).filter(|_| self.enabled(SymbolType::Ean2))
                        } else {
                            part_end5(pass).filter(|_| self.enabled(SymbolType::Ean5))
                        }
                    } else {
                        None
                    };

                    if part.is_some() || idx == 0x21 {
                        self.direction = false;
                        pass.state = -1;
                        return part;
                    }
                }
                if (idx & 7) == 1 {
                    pass.state += 2;
                    idx += 2;
                }
            } else if (idx == 0x10 || idx == 0x11)
                && self.enabled(SymbolType::Ean8)
                && aux_end(st, fwd) == 0
            {
                let part = part_end4(pass, fwd != 0);
                if part.is_some() {
                    self.direction = (pass.state & STATE_REV) != 0;
                }
                pass.state = -1;
                return part;
            } else if idx == 0x18 || idx == 0x19 {
                let mut part = None;
                if aux_end(st, fwd) == 0 && pass.raw[5] != 0xff {
                    part = self.part_end7(pass, fwd != 0);
                }
                if part.is_some() {
                    self.direction = (pass.state & STATE_REV) != 0;
                }
                pass.state = -1;
                return part;
            }
        }

        if (pass.state & STATE_ADDON) != 0 {
            idx >>= 1;
        }

        if (idx & 0x03) == 0 && idx <= 0x14 {
            let mut code = -1;
            let mut w_ok = true;

            if self.s4 == 0 {
                return None;
            }

            // validate guard bars before decoding first char of symbol
            if pass.state == 0 {
                pass.state = aux_start(st, self.s4);
                pass.width = self.s4;
                if pass.state < 0 {
                    return None;
                }
                idx = pass.state & STATE_IDX;
            } else {
                w_ok = check_width(pass.width, self.s4);
                if w_ok {
                    pass.width = (pass.width + self.s4 * 3) / 4;
                }
            }

            if w_ok {
                code = decode4(st, self.s4);
            }

            if (code < 0 && idx != 0x10)
                || (idx > 0 && (pass.state & STATE_ADDON) != 0 && aux_mid(st, self.s4) != 0)
            {
                pass.state = -1;
            } else if code < 0 {
                pass.raw[5] = 0xff;
            } else {
                pass.raw[((idx >> 2) + 1) as usize] = DIGITS[code as usize];
            }
        }
        None
    }

    /// Verify the check digit following `n` collected digits
    fn verify_checksum(&self, n: usize) -> bool {
        let mut chk: u8 = 0;
        for i in 0..n {
            let d = self.buf[i] as u8;
            zassert!(d < 10, false, "i={:x} d={:x} chk={:x}", i, d, chk);
            chk += d;
            if (i ^ n) & 1 != 0 {
                chk += d << 1;
                if chk >= 20 {
                    chk -= 20;
                }
            }
            if chk >= 10 {
                chk -= 10;
            }
        }
        if chk != 0 {
            chk = 10 - chk;
        }
        let d = self.buf[n] as u8;
        zassert!(d < 10, false, "n={:x} d={:x} chk={:x}", n, d, chk);
        chk == d
    }

    fn isbn10_checksum(&self) -> u8 {
        let mut chk: u32 = 0;
        for w in (2..=10u32).rev() {
            let d = self.buf[13 - w as usize] as u8;
            zassert!(d < 10, b'?', "w={:x} d={:x} chk={:x}", w, d, chk);
            chk += d as u32 * w;
        }
        chk %= 11;
        if chk == 0 {
            return b'0';
        }
        chk = 11 - chk;
        if chk < 10 {
            b'0' + chk as u8
        } else {
            b'X'
        }
    }

    /// Expand UPC-E to UPC-A
    fn expand_upce(&mut self, pass: &EanPass) {
        let mut raw = pass.raw.iter().map(|&r| (r & 0xf) as i8);
        // parity encoded digit is checksum
        self.buf[12] = pass.raw[0] as i8;
        raw.next();
        let mut next = || raw.next().unwrap_or(0);

        let decode = (pass.raw[6] & 0xf) as i8;
        self.buf[0] = 0;
        self.buf[1] = 0;
        self.buf[2] = next();
        self.buf[3] = next();
        self.buf[4] = if decode < 3 { decode } else { next() };
        self.buf[5] = if decode < 4 { 0 } else { next() };
        self.buf[6] = if decode < 5 { 0 } else { next() };
        self.buf[7] = 0;
        self.buf[8] = 0;
        self.buf[9] = if decode < 3 { next() } else { 0 };
        self.buf[10] = if decode < 4 { next() } else { 0 };
        self.buf[11] = if decode < 5 { next() } else { decode };
    }

    fn clear_halves(&mut self) {
        self.left = SymbolType::None;
        self.right = SymbolType::None;
    }

    /// Merge a partial decode into the collected digits
    fn integrate_partial(&mut self, pass: &EanPass, part: Part) -> SymbolType {
        let ty = part.symbol_type();

        // if same partial is not consistent, reset others
        if (self.left != SymbolType::None && ty != self.left)
            || (self.right != SymbolType::None && ty != self.right)
        {
            self.clear_halves();
        }

        if (self.left != SymbolType::None || self.right != SymbolType::None)
            && !check_width(self.width, pass.width)
        {
            self.clear_halves();
        }

        let n = ty as usize;
        let mut sym = match part {
            Part::Half(_, Half::Right) => {
                for (k, i) in (1..=n >> 1).rev().enumerate() {
                    let j = n - 1 - k;
                    let digit = (pass.raw[i] & 0xf) as i8;
                    if self.right != SymbolType::None && self.buf[j] != digit {
                        self.clear_halves();
                    }
                    self.buf[j] = digit;
                }
                self.right = ty;
                if self.left == ty {
                    ty
                } else {
                    SymbolType::None
                }
            }
            Part::Half(_, Half::Left) => {
                let top = (n - 1) >> 1;
                for j in (0..=top).rev() {
                    let i = (n >> 1) - (top - j);
                    let digit = (pass.raw[i] & 0xf) as i8;
                    if self.left != SymbolType::None && self.buf[j] != digit {
                        self.clear_halves();
                    }
                    self.buf[j] = digit;
                }
                self.left = ty;
                if self.right == ty {
                    ty
                } else {
                    SymbolType::None
                }
            }
            Part::Addon(_) => {
                for i in (1..=n).rev() {
                    self.buf[i - 1] = (pass.raw[i] & 0xf) as i8;
                }
                self.left = ty;
                ty
            }
            Part::Upce => {
                self.expand_upce(pass);
                ty
            }
        };

        self.width = pass.width;

        if sym == SymbolType::None {
            sym = SymbolType::Partial;
        }

        let valid = match sym {
            SymbolType::Ean13 | SymbolType::Upce => self.verify_checksum(12),
            SymbolType::Ean8 => self.verify_checksum(7),
            _ => true,
        };
        if !valid {
            if self.right != SymbolType::None {
                self.left = SymbolType::None;
            } else {
                self.right = SymbolType::None;
            }
            sym = SymbolType::None;
        }

        if sym == SymbolType::Ean13 {
            // special case EAN-13 subsets
            if self.buf[0] == 0 && self.enabled(SymbolType::Upca) {
                sym = SymbolType::Upca;
            } else if self.buf[0] == 9 && self.buf[1] == 7 {
                if self.buf[2] == 8 && self.enabled(SymbolType::Isbn10) {
                    sym = SymbolType::Isbn10;
                } else if (self.buf[2] == 8 || self.buf[2] == 9)
                    && self.enabled(SymbolType::Isbn13)
                {
                    sym = SymbolType::Isbn13;
                }
            }
        } else if sym == SymbolType::Upce {
            if self.enabled(SymbolType::Upce) {
                // report the compressed form
                self.buf[0] = 0;
                self.buf[1] = 0;
                for i in 2..8 {
                    self.buf[i] = (pass.raw[i - 1] & 0xf) as i8;
                }
                self.buf[8] = (pass.raw[0] & 0xf) as i8;
            } else if self.enabled(SymbolType::Upca) {
                sym = SymbolType::Upca;
            } else if self.enabled(SymbolType::Ean13) {
                sym = SymbolType::Ean13;
            } else {
                sym = SymbolType::None;
            }
        }
        sym
    }

    /// Copy the result for `sym` to the shared data buffer
    fn postprocess(&self, st: &mut DecoderState, sym: SymbolType) -> bool {
        let mut start = 0;
        let mut base = sym as usize;
        match sym {
            SymbolType::Upca => start = 1,
            SymbolType::Upce => {
                start = 1;
                base -= 1;
            }
            SymbolType::Isbn13 => base = SymbolType::Ean13 as usize,
            SymbolType::Isbn10 => start = 3,
            _ => {}
        }

        let emit_check = self
            .config(sym)
            .is_some_and(|c| c.test(Config::EmitCheck));
        if sym == SymbolType::Isbn10 || (base > SymbolType::Ean5 as usize && !emit_check) {
            base -= 1;
        }

        let mut data: Vec<u8> = self.buf[start..]
            .iter()
            .take(base)
            .take_while(|&&d| d >= 0)
            .map(|&d| d as u8 + b'0')
            .collect();

        if sym == SymbolType::Isbn10 && data.len() == 9 && emit_check {
            // recalculate ISBN-10 check digit
            data.push(self.isbn10_checksum());
        }

        st.direction = 1 - 2 * self.direction as i32;
        st.modifiers = 0;
        st.write_data(&data)
    }

    pub(crate) fn decode(&mut self, st: &mut DecoderState) -> SymbolType {
        let mut sym = SymbolType::None;
        let pass_idx = (st.idx & 3) as usize;

        // update latest character width
        self.s4 = self
            .s4
            .wrapping_sub(st.get_width(4))
            .wrapping_add(st.get_width(0));

        for i in 0..4 {
            if self.pass[i].state < 0 && i != pass_idx {
                continue;
            }
            let mut pass = self.pass[i];
            let part = self.decode_pass(st, &mut pass);
            self.pass[i] = pass;

            let Some(part) = part else {
                continue;
            };
            // update accumulated data from new partial decode
            sym = self.integrate_partial(&pass, part);
            if sym == SymbolType::None {
                continue;
            }

            // this pass valid => reset all passes
            for p in &mut self.pass {
                p.state = -1;
            }
            if sym > SymbolType::Partial {
                if !st.acquire_lock(sym) {
                    sym = SymbolType::Partial;
                } else if !self.postprocess(st, sym) {
                    st.release_lock(sym);
                    sym = SymbolType::None;
                }
            }
        }
        sym
    }
}
