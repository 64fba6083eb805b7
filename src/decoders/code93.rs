//! Code 93 barcode decoder

use crate::color::Color;
use crate::config::Config;
use crate::decoder::{decode_e, DecoderState, SymbologyConfig};
use crate::error::zassert;
use crate::SymbolType;

// Checksum modulus
const CHKMOD: i32 = 47;

/// Start/stop character value
const START_STOP: i32 = 0x2f;

// ============================================================================
// Code 93 lookup tables
// ============================================================================

static CODE93_HASH: [i8; 0x40] = [
    0x0f, 0x2b, 0x30, 0x38, 0x13, 0x1b, 0x11, 0x2a, 0x0a, -1, 0x2f, 0x0f, 0x38, 0x38, 0x2f, 0x37,
    0x24, 0x3a, 0x1b, 0x36, 0x18, 0x26, 0x02, 0x2c, 0x2b, 0x05, 0x21, 0x3b, 0x04, 0x15, 0x12, 0x0c,
    0x00, 0x26, 0x23, 0x00, -1, 0x2e, 0x3f, 0x13, 0x2e, 0x36, -1, 0x08, 0x09, -1, 0x15, 0x14, -1,
    0x00, 0x21, 0x3b, -1, 0x33, 0x00, -1, 0x2d, 0x0c, 0x1b, 0x0a, 0x3f, 0x3f, 0x29, 0x1c,
];

static CODE93_GRAPH: &[u8; 7] = b"-. $/+%";
static CODE93_S2: &[u8; 26] = b"\x1b\x1c\x1d\x1e\x1f;<=>?[\\]^_{|}~\x7f\x00\x40`\x7f\x7f\x7f";

// ============================================================================
// Code 93 Decoder
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct Code93Decoder {
    direction: bool,
    /// 3-bit element counter
    element: u8,
    character: i32,
    width: u32,
    /// Holding byte for the first character, before the lock is taken
    hold: u8,
    pub(crate) config: SymbologyConfig,
}

impl Default for Code93Decoder {
    fn default() -> Self {
        Self {
            direction: false,
            element: 0,
            character: -1,
            width: 0,
            hold: 0,
            config: SymbologyConfig::default().with(Config::Enable),
        }
    }
}

/// Check width variance
#[inline]
fn check_width(cur: u32, prev: u32) -> bool {
    let dw = prev.abs_diff(cur).wrapping_mul(4);
    dw > prev
}

/// Plus modulo 47
#[inline]
fn plusmod47(mut acc: i32, add: i32) -> i32 {
    acc += add;
    if acc >= CHKMOD {
        acc -= CHKMOD;
    }
    acc
}

/// Validate a 6-element edge signature
fn validate_sig(mut sig: i32) -> i32 {
    let mut sum = 0;
    let mut emin = 0;
    let mut sig0 = 0;
    let mut sig1 = 0;

    for i in (0..3).rev() {
        let e = sig & 3;
        sig >>= 2;
        sum = e - sum;
        sig1 <<= 4;
        sig1 += sum;
        if i == 0 {
            break;
        }

        let e = sig & 3;
        sig >>= 2;
        sum = e - sum;
        sig0 <<= 4;
        if emin > sum {
            emin = sum;
        }
        sig0 += sum;
    }

    emin = emin + (emin << 4) + (emin << 8);
    sig0 -= emin;
    sig1 += emin;
    (sig0 | sig1) & 0x888
}

/// Build edge signature of character
fn encode6(st: &DecoderState) -> i32 {
    let s = st.s6;
    if s < 9 {
        return -1;
    }

    let mut sig: i32 = 0;
    for i in (1..6).rev() {
        let c = decode_e(st.pair_width(i), s, 9);
        if !(0..=3).contains(&c) {
            return -1;
        }
        sig = (sig << 2) | c;
    }
    sig
}

impl Code93Decoder {
    pub(crate) fn reset(&mut self) {
        self.direction = false;
        self.element = 0;
        self.character = -1;
    }

    fn decode6(&self, st: &DecoderState) -> i32 {
        let mut sig = encode6(st);
        if sig < 0 {
            return -1;
        }

        if (sig & 0x3) + ((sig >> 4) & 0x3) + ((sig >> 8) & 0x3) != 3 || validate_sig(sig) != 0 {
            return -1;
        }

        if self.direction {
            // reverse signature
            let tmp = sig & 0x030;
            sig = ((sig & 0x3c0) >> 6) | ((sig & 0x00f) << 6);
            sig = ((sig & 0x30c) >> 2) | ((sig & 0x0c3) << 2) | tmp;
        }

        let g0 = CODE93_HASH[((sig - (sig >> 4)) & 0x3f) as usize];
        let g1 = CODE93_HASH[(((sig >> 2) - (sig >> 7)) & 0x3f) as usize];
        zassert!(
            g0 >= 0 && g1 >= 0,
            -1,
            "dir={:x} sig={:03x} g0={:03x} g1={:03x}",
            self.direction as i32,
            sig,
            g0,
            g1
        );

        ((g0 + g1) & 0x3f) as i32
    }

    fn decode_start(&mut self, st: &DecoderState) -> SymbolType {
        let s = st.s6;
        let c = encode6(st);
        if c < 0 || (c != 0x00f && c != 0x0f0) {
            return SymbolType::None;
        }

        let dir = (c >> 7) != 0;

        let qz = if dir {
            if decode_e(st.pair_width(0), s, 9) != 0 {
                return SymbolType::None;
            }
            st.get_width(8)
        } else {
            st.get_width(7)
        };

        if qz != 0 && qz < (s * 3) / 4 {
            return SymbolType::None;
        }

        // decoded valid start/stop - initialize state
        self.direction = dir;
        self.element = if dir { 7 } else { 0 };
        self.character = 0;
        self.width = s;
        SymbolType::Partial
    }

    fn abort(&mut self, st: &mut DecoderState) -> SymbolType {
        if self.character > 1 {
            st.release_lock(SymbolType::Code93);
        }
        self.character = -1;
        SymbolType::None
    }

    fn check_stop(&self, st: &DecoderState) -> bool {
        let n = self.character;
        let s = st.s6;

        if n < 2 || !self.config.length_ok(n) {
            return false;
        }

        if self.direction {
            let qz = st.get_width(0);
            if qz != 0 && qz < (s * 3) / 4 {
                return false;
            }
        } else if decode_e(st.pair_width(0), s, 9) != 0 {
            return false;
        }
        true
    }

    /// Validate the C and K check characters
    fn validate_checksums(&self, st: &mut DecoderState) -> bool {
        let n = self.character as usize;
        let dir = self.direction;
        let buf = &st.buf_mut()[..n];

        let mut sum_c = 0;
        let mut acc_c = 0;
        let mut i_c = ((n - 2) % 20) as i32;
        let mut sum_k = 0;
        let mut acc_k = 0;
        let mut i_k = ((n - 1) % 15) as i32;

        for i in 0..(n - 2) {
            let d = if dir { buf[n - 1 - i] } else { buf[i] } as i32;

            i_c -= 1;
            if i_c < 0 {
                acc_c = 0;
                i_c = 19;
            }
            acc_c = plusmod47(acc_c, d);
            sum_c = plusmod47(sum_c, acc_c);

            i_k -= 1;
            if i_k < 0 {
                acc_k = 0;
                i_k = 14;
            }
            acc_k = plusmod47(acc_k, d);
            sum_k = plusmod47(sum_k, acc_k);
        }

        let d = if dir { buf[1] } else { buf[n - 2] } as i32;
        if d != sum_c {
            return false;
        }

        acc_k = plusmod47(acc_k, sum_c);
        sum_k = plusmod47(sum_k, acc_k);
        let d = if dir { buf[0] } else { buf[n - 1] } as i32;
        d == sum_k
    }

    /// Resolve scan direction and convert to ASCII
    fn postprocess(&self, st: &mut DecoderState) -> bool {
        let n = self.character as usize;
        st.direction = 1 - 2 * self.direction as i32;

        let mut raw = st.buf_mut()[..n].to_vec();
        if self.direction {
            raw.reverse();
        }

        let mut out = Vec::with_capacity(n);
        let mut chars = raw[..n - 2].iter().copied();
        while let Some(mut d) = chars.next() {
            if d < 0xa {
                d += b'0';
            } else if d < 0x24 {
                d = b'A' + d - 0xa;
            } else if d < 0x2b {
                d = CODE93_GRAPH[(d - 0x24) as usize];
            } else {
                let shift = d;
                zassert!(shift < 0x2f, false, "shift={:02x}", shift);
                d = match chars.next() {
                    Some(next) if (0xa..0x24).contains(&next) => next - 0xa,
                    _ => return false,
                };
                d = match shift {
                    0x2b => d + 1,
                    0x2c => CODE93_S2[d as usize],
                    0x2d => d + 0x21,
                    _ => d + 0x61,
                };
            }
            out.push(d);
        }

        st.modifiers = 0;
        st.write_data(&out)
    }

    pub(crate) fn decode(&mut self, st: &mut DecoderState) -> SymbolType {
        if self.character < 0 {
            if st.color() != Color::Bar {
                return SymbolType::None;
            }
            return self.decode_start(st);
        }

        // process every 6th element of active symbol
        self.element = (self.element + 1) & 7;
        if self.element != 6 || (st.color() == Color::Bar) == self.direction {
            return SymbolType::None;
        }
        self.element = 0;

        if check_width(st.s6, self.width) {
            return self.abort(st);
        }

        let c = self.decode6(st);
        if c < 0 {
            return self.abort(st);
        }

        if c == START_STOP {
            if !self.check_stop(st) {
                return SymbolType::None;
            }
            if !self.validate_checksums(st) || !self.postprocess(st) {
                return self.abort(st);
            }
            self.character = -1;
            return SymbolType::Code93;
        }

        if !st.size_buf(self.character as usize + 1) {
            return self.abort(st);
        }

        self.width = st.s6;

        if self.character == 1 {
            // lock shared resources
            if !st.acquire_lock(SymbolType::Code93) {
                return self.abort(st);
            }
            // copy from holding buffer
            st.buf_mut()[0] = self.hold;
        }

        if self.character == 0 {
            self.hold = c as u8;
        } else {
            st.buf_mut()[self.character as usize] = c as u8;
        }
        self.character += 1;
        SymbolType::None
    }
}
