//! Code 39 barcode decoder
//!
//! This module implements decoding for Code 39 barcodes, with optional
//! mod 43 check character validation and full ASCII expansion.

use crate::color::Color;
use crate::config::Config;
use crate::decoder::{decode_e, DecoderState, SymbologyConfig};
use crate::error::zassert;
use crate::SymbolType;

// Number of characters in Code 39
const NUM_CHARS: usize = 0x2c;

/// Index of the start/stop character `*`
const STOP: u8 = 0x2b;

// ============================================================================
// Code 39 lookup tables
// ============================================================================

/// Coarse decode of the first 5 encoded widths
static CODE39_HI: [u8; 32] = [
    0x80,        // 2 next
    0x40 | 0x02, // 4
    0x80 | 0x06, // 2 next
    0xc0 | 0x08, // 2 skip
    0x40 | 0x0a, // 4
    0x80 | 0x0e, // 2 next
    0xc0 | 0x10, // 2 skip
    0x12,        // direct
    0x80 | 0x13, // 2 next
    0xc0 | 0x15, // 2 skip
    0x80 | 0x17, // 2 next
    0xff,
    0xc0 | 0x19, // 2 skip
    0x1b,        // direct
    0xff,
    0xff,
    0x40 | 0x1c, // 4
    0x80 | 0x20, // 2 next
    0xc0 | 0x22, // 2 skip
    0x24,        // direct
    0x80 | 0x25, // 2 next
    0xff,
    0x27, // direct
    0xff,
    0xc0 | 0x28, // 2 skip
    0x2a,        // direct
    0xff,
    0xff,
    0x2b, // direct
    0xff,
    0xff,
    0xff,
];

/// (full encoding, character read in reverse, character read forward)
static CODE39_ENCODINGS: [(u8, u8, u8); NUM_CHARS] = [
    (0x07, 0x1a, 0x20), (0x0d, 0x10, 0x03), (0x13, 0x17, 0x22), (0x16, 0x1d, 0x23), // 00-03
    (0x19, 0x0d, 0x05), (0x1c, 0x13, 0x06), (0x25, 0x07, 0x0c), (0x2a, 0x2a, 0x27), // 04-07
    (0x31, 0x04, 0x0e), (0x34, 0x00, 0x0f), (0x43, 0x15, 0x25), (0x46, 0x1c, 0x26), // 08-0b
    (0x49, 0x0b, 0x08), (0x4c, 0x12, 0x09), (0x52, 0x19, 0x2b), (0x58, 0x0f, 0x00), // 0c-0f
    (0x61, 0x02, 0x11), (0x64, 0x09, 0x12), (0x70, 0x06, 0x13), (0x85, 0x24, 0x16), // 10-13
    (0x8a, 0x29, 0x28), (0x91, 0x21, 0x18), (0x94, 0x2b, 0x19), (0xa2, 0x28, 0x29), // 14-17
    (0xa8, 0x27, 0x2a), (0xc1, 0x1f, 0x1b), (0xc4, 0x26, 0x1c), (0xd0, 0x23, 0x1d), // 18-1b
    (0x03, 0x14, 0x1e), (0x06, 0x1b, 0x1f), (0x09, 0x0a, 0x01), (0x0c, 0x11, 0x02), // 1c-1f
    (0x12, 0x18, 0x21), (0x18, 0x0e, 0x04), (0x21, 0x01, 0x0a), (0x24, 0x08, 0x0b), // 20-23
    (0x30, 0x05, 0x0d), (0x42, 0x16, 0x24), (0x48, 0x0c, 0x07), (0x60, 0x03, 0x10), // 24-27
    (0x81, 0x1e, 0x14), (0x84, 0x25, 0x15), (0x90, 0x22, 0x17), (0xc0, 0x20, 0x1a), // 28-2b
];

static CODE39_CHARACTERS: &[u8; NUM_CHARS] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%*";

/// Expand a full ASCII shift pair
fn full_ascii(shift: u8, c: u8) -> Option<u8> {
    match (shift, c) {
        (b'$', b'A'..=b'Z') => Some(c - b'A' + 0x01),
        (b'%', b'A'..=b'E') => Some(c - b'A' + 0x1b),
        (b'%', b'F'..=b'J') => Some(c - b'F' + b';'),
        (b'%', b'K'..=b'O') => Some(c - b'K' + b'['),
        (b'%', b'P'..=b'T') => Some(c - b'P' + b'{'),
        (b'%', b'U') => Some(0),
        (b'%', b'V') => Some(b'@'),
        (b'%', b'W') => Some(b'`'),
        (b'%', b'X'..=b'Z') => Some(0x7f),
        (b'/', b'A'..=b'O') => Some(c - b'A' + b'!'),
        (b'/', b'Z') => Some(b':'),
        (b'+', b'A'..=b'Z') => Some(c - b'A' + b'a'),
        _ => None,
    }
}

// ============================================================================
// Code 39 Decoder
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct Code39Decoder {
    direction: bool,
    element: u8,
    /// Characters collected so far; negative when idle
    character: i32,
    s9: u32,
    width: u32,
    pub(crate) config: SymbologyConfig,
}

impl Default for Code39Decoder {
    fn default() -> Self {
        Self {
            direction: false,
            element: 0,
            character: -1,
            s9: 0,
            width: 0,
            config: SymbologyConfig::default()
                .with(Config::Enable)
                .with_lengths(1, 0),
        }
    }
}

/// Decode a single element
fn decode1(enc: u8, e: u32, s: u32) -> u8 {
    let e_val = decode_e(e, s, 72);
    if !(0..=18).contains(&e_val) {
        return 0xff;
    }
    let mut enc = enc << 1;
    if e_val > 6 {
        enc |= 1;
    }
    enc
}

/// Check width against reference
fn check_width(ref_width: u32, w: u32) -> bool {
    let dref = ref_width;
    let ref_4 = ref_width.wrapping_mul(4);
    let w_4 = w.wrapping_mul(4);
    ref_4.wrapping_sub(dref) <= w_4 && w_4 <= ref_4.wrapping_add(dref)
}

impl Code39Decoder {
    pub(crate) fn reset(&mut self) {
        self.direction = false;
        self.element = 0;
        self.character = -1;
        self.s9 = 0;
    }

    /// Decode 9 elements into a character (5 bars + 4 spaces)
    fn decode9(&mut self, st: &DecoderState) -> i32 {
        let s9 = self.s9;
        if s9 < 9 {
            return -1;
        }

        // threshold bar width ratios
        let mut enc: u8 = 0;
        for i in 0..5 {
            enc = decode1(enc, st.get_width(i), s9);
            if enc == 0xff {
                return -1;
            }
        }
        zassert!((enc as usize) < 0x20, -1, " enc={:x} s9={:x}", enc, s9);

        // lookup first 5 encoded widths for coarse decode
        let mut idx = CODE39_HI[enc as usize];
        if idx == 0xff {
            return -1;
        }

        // encode remaining widths (NB first encoded width is lost)
        for i in 5..9 {
            enc = decode1(enc, st.get_width(i), s9);
            if enc == 0xff {
                return -1;
            }
        }

        if (idx & 0xc0) == 0x80 {
            idx = (idx & 0x3f) + ((enc >> 3) & 1);
        } else if (idx & 0xc0) == 0xc0 {
            idx = (idx & 0x3f) + ((enc >> 2) & 1);
        } else if (idx & 0xc0) != 0 {
            idx = (idx & 0x3f) + ((enc >> 2) & 3);
        }
        zassert!(
            (idx as usize) < NUM_CHARS,
            -1,
            " idx={:x} enc={:x} s9={:x}",
            idx,
            enc,
            s9
        );

        let (chk, rev, fwd) = CODE39_ENCODINGS[idx as usize];
        if enc != chk {
            return -1;
        }

        self.width = s9;
        if self.direction {
            rev as i32
        } else {
            fwd as i32
        }
    }

    fn decode_start(&mut self, st: &DecoderState) -> SymbolType {
        let c = self.decode9(st);
        if c != 0x19 && c != STOP as i32 {
            return SymbolType::None;
        }
        self.direction ^= c == 0x19;

        // check leading quiet zone - the standard asks for 10x
        let quiet = st.get_width(9);
        if quiet != 0 && quiet < self.s9 / 2 {
            return SymbolType::None;
        }

        self.element = 9;
        self.character = 0;
        SymbolType::Partial
    }

    /// Convert collected character indices into the final data
    fn postprocess(&self, st: &mut DecoderState) -> bool {
        let n = self.character as usize;
        st.direction = 1 - 2 * self.direction as i32;

        let mut idx: Vec<u8> = st.buf_mut()[..n].to_vec();
        if self.direction {
            idx.reverse();
        }

        if self.config.test(Config::AddCheck) {
            let Some((&check, body)) = idx.split_last() else {
                return false;
            };
            let sum: u32 = body.iter().map(|&c| c as u32).sum();
            if body.is_empty() || sum % 43 != check as u32 {
                return false;
            }
            if !self.config.test(Config::EmitCheck) {
                idx.pop();
            }
        }

        let mut data: Vec<u8> = idx
            .iter()
            .map(|&c| CODE39_CHARACTERS.get(c as usize).copied().unwrap_or(b'?'))
            .collect();

        if self.config.test(Config::Ascii) {
            let mut out = Vec::with_capacity(data.len());
            let mut chars = data.iter().copied();
            while let Some(c) = chars.next() {
                if matches!(c, b'$' | b'%' | b'/' | b'+') {
                    let Some(full) = chars.next().and_then(|next| full_ascii(c, next)) else {
                        return false;
                    };
                    out.push(full);
                } else {
                    out.push(c);
                }
            }
            data = out;
        }

        st.modifiers = 0;
        st.write_data(&data)
    }

    pub(crate) fn decode(&mut self, st: &mut DecoderState) -> SymbolType {
        // update latest character width
        self.s9 = self
            .s9
            .wrapping_sub(st.get_width(9))
            .wrapping_add(st.get_width(0));

        if self.character < 0 {
            if st.color() != Color::Bar {
                return SymbolType::None;
            }
            return self.decode_start(st);
        }

        self.element += 1;
        if self.element < 9 {
            return SymbolType::None;
        }

        if self.element == 10 {
            let space = st.get_width(0);
            if self.character > 0 && st.buf_mut()[self.character as usize - 1] == STOP {
                // trim STOP character
                self.character -= 1;
                let mut sym = SymbolType::None;

                // trailing quiet zone check
                if space != 0 && space < self.width / 2 {
                    // not a symbol boundary
                } else if !self.config.length_ok(self.character) {
                    // length out of range
                } else if self.postprocess(st) {
                    sym = SymbolType::Code39;
                }

                self.character = -1;
                if sym == SymbolType::None {
                    st.release_lock(SymbolType::Code39);
                }
                return sym;
            }
            if space > self.width / 2 {
                // inter-character space check failure
                if self.character > 0 {
                    st.release_lock(SymbolType::Code39);
                }
                self.character = -1;
            }
            self.element = 0;
            return SymbolType::None;
        }

        if !check_width(self.width, self.s9) {
            if self.character > 0 {
                st.release_lock(SymbolType::Code39);
            }
            self.character = -1;
            return SymbolType::None;
        }

        let c = self.decode9(st);

        // lock shared resources
        if self.character == 0 && !st.acquire_lock(SymbolType::Code39) {
            self.character = -1;
            return SymbolType::Partial;
        }

        if c < 0 || !st.size_buf(self.character as usize + 1) {
            st.release_lock(SymbolType::Code39);
            self.character = -1;
            return SymbolType::None;
        }
        zassert!(c < NUM_CHARS as i32, SymbolType::None, "c={:02x} s9={:x}", c, self.s9);

        st.buf_mut()[self.character as usize] = c as u8;
        self.character += 1;
        SymbolType::None
    }
}
