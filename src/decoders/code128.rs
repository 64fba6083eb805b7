//! Code 128 barcode decoder
//!
//! Handles code sets A, B and C, SHIFT, FNC1 (GS1 and AIM modifiers or the
//! GS separator) and FNC4 extended characters.

use crate::color::Color;
use crate::config::Config;
use crate::decoder::{decode_e, DecoderState, SymbologyConfig};
use crate::error::zassert;
use crate::symbol::Modifier;
use crate::SymbolType;

// Character count
const NUM_CHARS: usize = 108;

// Code 128 character codes
const SHIFT: u8 = 0x62;
const CODE_C: u8 = 0x63;
const CODE_A: u8 = 0x65;
const FNC1: u8 = 0x66;
const START_A: u8 = 0x67;
const START_C: u8 = 0x69;
const STOP_FWD: u8 = 0x6a;
const STOP_REV: u8 = 0x6b;

/// ASCII group separator emitted for a mid-symbol FNC1
const GS: u8 = 0x1d;

// ============================================================================
// Code 128 lookup tables
// ============================================================================

static CHARACTERS: [u8; NUM_CHARS] = [
    0x5c, 0xbf, 0xa1, // [00] 00
    0x2a, 0xc5, 0x0c, 0xa4, // [03] 01
    0x2d, 0xe3, 0x0f, // [07] 02
    0x5f, 0xe4, // [0a] 03
    0x6b, 0xe8, 0x69, 0xa7, 0xe7, // [0c] 10
    0xc1, 0x51, 0x1e, 0x83, 0xd9, 0x00, 0x84, 0x1f, // [11] 11
    0xc7, 0x0d, 0x33, 0x86, 0xb5, 0x0e, 0x15, 0x87, // [19] 12
    0x10, 0xda, 0x11, // [21] 13
    0x36, 0xe5, 0x18, 0x37, // [24] 20
    0xcc, 0x13, 0x39, 0x89, 0x97, 0x14, 0x1b, 0x8a, 0x3a, 0xbd, // [28] 21
    0xa2, 0x5e, 0x01, 0x85, 0xb0, 0x02, 0xa3, // [32] 22
    0xa5, 0x2c, 0x16, 0x88, 0xbc, 0x12, 0xa6, // [39] 23
    0x61, 0xe6, 0x56, 0x62, // [40] 30
    0x19, 0xdb, 0x1a, // [44] 31
    0xa8, 0x32, 0x1c, 0x8b, 0xcd, 0x1d, 0xa9, // [47] 32
    0xc3, 0x20, 0xc4, // [4e] 33
    0x50, 0x5d, 0xc0, // [51] 0014 0025 0034
    0x2b, 0xc6, // [54] 0134 0143
    0x2e, // [56] 0243
    0x53, 0x60, // [57] 0341 0352
    0x31, // [59] 1024
    0x52, 0xc2, // [5a] 1114 1134
    0x34, 0xc8, // [5c] 1242 1243
    0x55, // [5e] 1441
    0x57, 0x3e, 0xce, // [5f] 4100 5200 4300
    0x3b, 0xc9, // [62] 4310 3410
    0x6a, // [64] 3420
    0x54, 0x4f, // [65] 1430 2530
    0x38, // [67] 4201
    0x58, 0xcb, // [68] 4111 4311
    0x2f, 0xca, // [6a] 2421 3421
];

static LO_BASE: [u8; 8] = [0x00, 0x07, 0x0c, 0x19, 0x24, 0x32, 0x40, 0x47];

static LO_OFFSET: [u8; 0x80] = [
    0xff, 0xf0, 0xff, 0x1f, 0xff, 0xf2, 0xff, 0xff, // 00 [00]
    0xff, 0xff, 0xff, 0x3f, 0xf4, 0xf5, 0xff, 0x6f, // 01
    0xff, 0xff, 0xff, 0xff, 0xf0, 0xf1, 0xff, 0x2f, // 02 [07]
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x3f, 0x4f, // 03
    0xff, 0x0f, 0xf1, 0xf2, 0xff, 0x3f, 0xff, 0xf4, // 10 [0c]
    0xf5, 0xf6, 0xf7, 0x89, 0xff, 0xab, 0xff, 0xfc, // 11
    0xff, 0xff, 0x0f, 0x1f, 0x23, 0x45, 0xf6, 0x7f, // 12 [19]
    0xff, 0xff, 0xff, 0xff, 0xf8, 0xff, 0xf9, 0xaf, // 13
    0xf0, 0xf1, 0xff, 0x2f, 0xff, 0xf3, 0xff, 0xff, // 20 [24]
    0x4f, 0x5f, 0x67, 0x89, 0xfa, 0xbf, 0xff, 0xcd, // 21
    0xf0, 0xf1, 0xf2, 0x3f, 0xf4, 0x56, 0xff, 0xff, // 22 [32]
    0xff, 0xff, 0x7f, 0x8f, 0x9a, 0xff, 0xbc, 0xdf, // 23
    0x0f, 0x1f, 0xf2, 0xff, 0xff, 0x3f, 0xff, 0xff, // 30 [40]
    0xf4, 0xff, 0xf5, 0x6f, 0xff, 0xff, 0xff, 0xff, // 31
    0x0f, 0x1f, 0x23, 0xff, 0x45, 0x6f, 0xff, 0xff, // 32 [47]
    0xf7, 0xff, 0xf8, 0x9f, 0xff, 0xff, 0xff, 0xff, // 33
];

// ============================================================================
// Character decoding
// ============================================================================

/// Decode low signature
#[inline]
fn decode_lo(sig: i32) -> i8 {
    let offset =
        (((sig >> 1) & 0x01) | ((sig >> 3) & 0x06) | ((sig >> 5) & 0x18) | ((sig >> 7) & 0x60))
            as usize;
    let mut idx = LO_OFFSET[offset];

    if (sig & 1) != 0 {
        idx &= 0xf;
    } else {
        idx >>= 4;
    }
    if idx == 0xf {
        return -1;
    }

    let base = ((sig >> 11) | ((sig >> 9) & 1)) as usize;
    zassert!(base < 8, -1, "sig={:x} offset={:x} idx={:x} base={:x}", sig, offset, idx, base);
    let idx = idx as usize + LO_BASE[base] as usize;

    zassert!(idx <= 0x50, -1, "sig={:x} offset={:x} base={:x} idx={:x}", sig, offset, base, idx);
    CHARACTERS[idx] as i8
}

/// Decode high signature
#[inline]
fn decode_hi(mut sig: i32) -> i8 {
    let mut rev = (sig & 0x4400) != 0;
    if rev {
        sig = ((sig >> 12) & 0x000f)
            | ((sig >> 4) & 0x00f0)
            | ((sig << 4) & 0x0f00)
            | ((sig << 12) & 0xf000);
    }

    let mut idx = match sig {
        0x0014 => 0x0,
        0x0025 => 0x1,
        0x0034 => 0x2,
        0x0134 => 0x3,
        0x0143 => 0x4,
        0x0243 => 0x5,
        0x0341 => 0x6,
        0x0352 => 0x7,
        0x1024 => 0x8,
        0x1114 => 0x9,
        0x1134 => 0xa,
        0x1242 => 0xb,
        0x1243 => 0xc,
        0x1441 => {
            rev = false;
            0xd
        }
        _ => return -1,
    };
    if rev {
        idx += 0xe;
    }
    CHARACTERS[0x51 + idx] as i8
}

/// Expected bar module count of a character, scaled by 4
#[inline]
fn calc_check(c: u8) -> i64 {
    if (c & 0x80) == 0 {
        return 0x18;
    }
    let c = c & 0x7f;
    if c < 0x3d {
        return if c < 0x30 && c != 0x17 { 0x10 } else { 0x20 };
    }
    if c < 0x50 {
        return if c == 0x4d { 0x20 } else { 0x10 };
    }
    if c < 0x67 {
        0x20
    } else {
        0x10
    }
}

/// Decode the 6 elements ending at the current width
fn decode6(st: &DecoderState, s: u32) -> i8 {
    if s < 5 {
        return -1;
    }

    let w = |i: u8| st.get_width(i);
    let bar = st.color() == Color::Bar;

    // edge signature of character
    let sig = if bar {
        (decode_e(w(0) + w(1), s, 11) << 12)
            | (decode_e(w(1) + w(2), s, 11) << 8)
            | (decode_e(w(2) + w(3), s, 11) << 4)
            | decode_e(w(3) + w(4), s, 11)
    } else {
        (decode_e(w(5) + w(4), s, 11) << 12)
            | (decode_e(w(4) + w(3), s, 11) << 8)
            | (decode_e(w(3) + w(2), s, 11) << 4)
            | decode_e(w(2) + w(1), s, 11)
    };
    if sig < 0 {
        return -1;
    }

    let c = if (sig & 0x4444) != 0 {
        decode_hi(sig)
    } else {
        decode_lo(sig)
    };
    if c == -1 {
        return -1;
    }

    // character validation
    let bars = if bar {
        w(0) + w(2) + w(4)
    } else {
        w(1) + w(3) + w(5)
    };
    let bars = bars as i64 * 11 * 4 / s as i64;
    let chk = calc_check(c as u8);
    if chk - 7 > bars || bars > chk + 7 {
        return -1;
    }

    c & 0x7f
}

/// Verify the mod-103 check character of characters in reading order
fn validate_checksum(chars: &[u8]) -> bool {
    let n = chars.len();
    if n < 3 {
        return true;
    }

    // irregularly weighted start character
    let mut sum = chars[0] as u32;
    if sum >= 103 {
        sum -= 103;
    }

    // sum in reverse to avoid multiplies
    let mut acc: u32 = 0;
    for &c in chars[1..n - 2].iter().rev() {
        zassert!(sum < 103, false, "sum={:x} acc={:x}", sum, acc);
        acc += c as u32;
        if acc >= 103 {
            acc -= 103;
        }
        sum += acc;
        if sum >= 103 {
            sum -= 103;
        }
    }

    sum == chars[n - 2] as u32
}

/// Convert characters in reading order to data bytes
///
/// Returns the data and the modifier flags it carries.
fn postprocess(chars: &[u8]) -> Option<(Vec<u8>, u32)> {
    let n = chars.len();
    zassert!(chars[n - 1] == STOP_REV || chars[n - 1] == STOP_FWD, None, "stop={:x}", chars[n - 1]);
    let start = chars[0];
    zassert!((START_A..=START_C).contains(&start), None, "code={:x}", start);

    let mut modifiers = 0;
    let mut out = Vec::with_capacity(2 * n);
    // 0 set A, 1 set B, 2 set C; 0x80 marks a SHIFT for one character
    let mut charset = start - START_A;
    let mut fnc4_latch = false;
    let mut fnc4_next = false;

    for (i, &code) in chars.iter().enumerate().take(n - 2).skip(1) {
        zassert!((code & 0x80) == 0, None, "i={:x} code={:02x} charset={:x}", i, code, charset);

        if (charset & 0x2) != 0 && code < 100 {
            out.push(b'0' + code / 10);
            out.push(b'0' + code % 10);
        } else if code < 0x60 {
            let mut ascii = code + 0x20;
            if (charset == 0 || charset == 0x81) && ascii >= 0x60 {
                ascii -= 0x60;
            }
            if fnc4_latch != fnc4_next {
                ascii |= 0x80;
            }
            fnc4_next = false;
            out.push(ascii);
            charset &= 0x7f;
        } else if code < CODE_C {
            // FNC2 (message append) and FNC3 (initialize) carry no data
            if code == SHIFT {
                charset |= 0x80;
            }
        } else if code == FNC1 {
            if i == 1 {
                modifiers |= 1 << Modifier::Gs1 as u32;
            } else if i == 2 {
                modifiers |= 1 << Modifier::Aim as u32;
            } else if i < n - 3 {
                out.push(GS);
            }
            // trailing FNC1 is dropped
        } else if code >= START_A {
            return None;
        } else {
            let newset = CODE_A - code;
            if newset != charset {
                charset = newset;
            } else if fnc4_next {
                // double FNC4 toggles extended mode
                fnc4_latch = !fnc4_latch;
                fnc4_next = false;
            } else {
                fnc4_next = true;
            }
        }
    }

    Some((out, modifiers))
}

// ============================================================================
// Code 128 Decoder
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct Code128Decoder {
    /// Color of the element closing each character
    direction: Color,
    /// 3-bit element counter
    element: u8,
    character: i32,
    /// Start (or reversed stop) character value
    start: u8,
    /// Running width of the last 6 elements including the current one
    s6: u32,
    width: u32,
    pub(crate) config: SymbologyConfig,
}

impl Default for Code128Decoder {
    fn default() -> Self {
        Self {
            direction: Color::Space,
            element: 0,
            character: -1,
            start: 0,
            s6: 0,
            width: 0,
            config: SymbologyConfig::default().with(Config::Enable),
        }
    }
}

impl Code128Decoder {
    pub(crate) fn reset(&mut self) {
        self.direction = Color::Space;
        self.element = 0;
        self.character = -1;
        self.s6 = 0;
    }

    fn abort(&mut self, st: &mut DecoderState) -> SymbolType {
        if self.character > 1 {
            st.release_lock(SymbolType::Code128);
        }
        self.character = -1;
        SymbolType::None
    }

    /// Validate and convert a complete symbol held in the shared buffer
    fn finish(&mut self, st: &mut DecoderState) -> SymbolType {
        let n = self.character as usize;
        let reversed = self.direction == Color::Bar;
        let mut chars = st.buf_mut()[..n].to_vec();
        if reversed {
            chars.reverse();
        }
        self.character = -1;

        let decoded = if validate_checksum(&chars) {
            postprocess(&chars)
        } else {
            None
        };
        let ok = match decoded {
            Some((data, modifiers)) if self.config.length_ok(data.len() as i32) => {
                st.modifiers = modifiers;
                st.direction = if reversed { -1 } else { 1 };
                st.write_data(&data)
            }
            _ => false,
        };

        if ok {
            SymbolType::Code128
        } else {
            st.release_lock(SymbolType::Code128);
            SymbolType::None
        }
    }

    pub(crate) fn decode(&mut self, st: &mut DecoderState) -> SymbolType {
        // update latest character width
        self.s6 = self
            .s6
            .wrapping_sub(st.get_width(6))
            .wrapping_add(st.get_width(0));

        if self.character < 0 {
            if st.color() != Color::Space {
                return SymbolType::None;
            }
        } else if self.element + 1 != 6 || st.color() != self.direction {
            self.element = (self.element + 1) & 7;
            return SymbolType::None;
        }
        self.element = 0;

        let c = decode6(st, self.s6);

        if self.character < 0 {
            let qz = st.get_width(6);
            if c < START_A as i8 || c > STOP_REV as i8 || c == STOP_FWD as i8 {
                return SymbolType::None;
            }
            if qz != 0 && qz < (self.s6 * 3) / 4 {
                return SymbolType::None;
            }
            // decoded valid start/stop - initialize state
            self.character = 1;
            if c == STOP_REV as i8 {
                self.direction = Color::Bar;
                self.element = 7;
            } else {
                self.direction = Color::Space;
            }
            self.start = c as u8;
            self.width = self.s6;
            return SymbolType::None;
        }

        if c < 0 || !st.size_buf(self.character as usize + 1) {
            return self.abort(st);
        }
        if self.width.abs_diff(self.s6).wrapping_mul(4) > self.width {
            return self.abort(st);
        }
        self.width = self.s6;

        if self.character == 1 {
            // lock shared resources
            if !st.acquire_lock(SymbolType::Code128) {
                self.character = -1;
                return SymbolType::None;
            }
            st.buf_mut()[0] = self.start;
        }

        let c = c as u8;
        st.buf_mut()[self.character as usize] = c;
        self.character += 1;

        let reversed = self.direction == Color::Bar;
        if self.character > 2
            && ((reversed && (START_A..=START_C).contains(&c)) || (!reversed && c == STOP_FWD))
        {
            return self.finish(st);
        }
        SymbolType::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_check(body: &[u8]) -> Vec<u8> {
        let mut sum = body[0] as u32;
        for (i, &c) in body.iter().enumerate().skip(1) {
            sum += i as u32 * c as u32;
        }
        let mut chars = body.to_vec();
        chars.push((sum % 103) as u8);
        chars.push(STOP_FWD);
        chars
    }

    #[test]
    fn test_checksum() {
        // "HELLO" in code set B
        let chars = with_check(&[0x68, 40, 37, 44, 44, 47]);
        assert_eq!(chars[6], 40);
        assert!(validate_checksum(&chars));

        let mut bad = chars.clone();
        bad[2] = 38;
        assert!(!validate_checksum(&bad));
    }

    #[test]
    fn test_set_b_text() {
        let chars = with_check(&[0x68, 40, 37, 44, 44, 47]);
        let (data, modifiers) = postprocess(&chars).unwrap();
        assert_eq!(data, b"HELLO");
        assert_eq!(modifiers, 0);
    }

    #[test]
    fn test_set_c_digits_and_switch() {
        // START_C 12 34 CODE_B 'A'
        let chars = with_check(&[START_C, 12, 34, 100, 33]);
        let (data, _) = postprocess(&chars).unwrap();
        assert_eq!(data, b"1234A");
    }

    #[test]
    fn test_set_a_controls_and_shift() {
        // START_A 'A' <HT> SHIFT 'a'
        let chars = with_check(&[START_A, 33, 73, SHIFT, 65]);
        let (data, _) = postprocess(&chars).unwrap();
        assert_eq!(data, b"A\ta");
    }

    #[test]
    fn test_fnc1_modifiers() {
        let chars = with_check(&[START_C, FNC1, 1, 23, FNC1, 45, 67]);
        let (data, modifiers) = postprocess(&chars).unwrap();
        assert_eq!(data, b"0123\x1d4567");
        assert_eq!(modifiers, 1 << Modifier::Gs1 as u32);

        let chars = with_check(&[0x68, 33, FNC1, 34]);
        let (data, modifiers) = postprocess(&chars).unwrap();
        assert_eq!(data, b"AB");
        assert_eq!(modifiers, 1 << Modifier::Aim as u32);
    }

    #[test]
    fn test_fnc4_extended() {
        // single FNC4 in set B (code 100) shifts the next character only
        let chars = with_check(&[0x68, 100, 33, 33]);
        let (data, _) = postprocess(&chars).unwrap();
        assert_eq!(data, vec![0xc1, b'A']);

        // double FNC4 latches
        let chars = with_check(&[0x68, 100, 100, 33, 34]);
        let (data, _) = postprocess(&chars).unwrap();
        assert_eq!(data, vec![0xc1, 0xc2]);
    }

    #[test]
    fn test_misplaced_start_rejected() {
        let chars = with_check(&[0x68, 33, START_A, 34]);
        assert!(postprocess(&chars).is_none());
    }

    #[test]
    fn test_decode_widths_both_directions() {
        use crate::testutil::{code128, decode_all, decoder_for, reversed};
        let cases: [(&[u8], &[u8]); 4] = [
            (&[104, 40, 37, 44, 44, 47], b"HELLO"),
            (&[105, 12, 34, 100, 33], b"1234A"),
            (&[105, 102, 1, 23, 102, 45, 67], b"0123\x1d4567"),
            (&[103, 33, 73, 98, 65], b"A\ta"),
        ];
        for (chars, expected) in cases {
            let ws = code128(chars, 2);
            let mut dcode = decoder_for(&[SymbolType::Code128]);
            assert_eq!(
                decode_all(&mut dcode, &ws),
                vec![(SymbolType::Code128, expected.to_vec(), 1)]
            );
            let mut dcode = decoder_for(&[SymbolType::Code128]);
            assert_eq!(
                decode_all(&mut dcode, &reversed(&ws)),
                vec![(SymbolType::Code128, expected.to_vec(), -1)]
            );
        }
    }

    #[test]
    fn test_decode_widths_bad_checksum() {
        use crate::testutil::{code128, decode_all, decoder_for, reversed};
        // "HELOL" data characters followed by the check character of "HELLO"
        let good = code128(&[104, 40, 37, 44, 44, 47], 2);
        let swapped = code128(&[104, 40, 37, 44, 47, 44], 2);
        let mut ws = swapped[..37].to_vec();
        ws.extend_from_slice(&good[37..]);

        let mut dcode = decoder_for(&[SymbolType::Code128]);
        assert!(decode_all(&mut dcode, &ws).is_empty());
        let mut dcode = decoder_for(&[SymbolType::Code128]);
        assert!(decode_all(&mut dcode, &reversed(&ws)).is_empty());
    }

    #[test]
    fn test_decode_widths_gs1_modifier() {
        use crate::testutil::{code128, decode_all, decoder_for};
        let mut dcode = decoder_for(&[SymbolType::Code128]);
        let found = decode_all(&mut dcode, &code128(&[105, 102, 1, 23, 102, 45, 67], 2));
        assert_eq!(found.len(), 1);
        assert_eq!(dcode.modifiers(), 1 << Modifier::Gs1 as u32);
    }

    #[test]
    fn test_decode_widths_any_scale() {
        use crate::testutil::{code128, decode_all, decoder_for};
        for u in [1, 3, 7] {
            let mut dcode = decoder_for(&[SymbolType::Code128]);
            let found = decode_all(&mut dcode, &code128(&[104, 40, 37, 44, 44, 47], u));
            assert_eq!(found, vec![(SymbolType::Code128, b"HELLO".to_vec(), 1)]);
        }
    }
}
