//! Interleaved 2 of 5 barcode decoder

use crate::color::Color;
use crate::config::Config;
use crate::decoder::{decode_e, DecoderState, SymbologyConfig};
use crate::SymbolType;

/// Digits held locally before the shared buffer is locked
const NIBUF: usize = 4;

/// Decode a single element, shifting its wide/narrow bit into `enc`
#[inline]
fn decode1(enc: u8, e: u32, s: u32) -> Option<u8> {
    let e = decode_e(e, s, 45);
    if !(0..=7).contains(&e) {
        return None;
    }
    Some((enc << 1) | (e > 2) as u8)
}

#[derive(Debug, Clone)]
pub(crate) struct I25Decoder {
    direction: bool,
    /// 4-bit element countdown
    element: u8,
    character: i32,
    /// Running width of the last 10 elements
    s10: u32,
    width: u32,
    /// Holding buffer for the first digits, before the lock is taken
    hold: [u8; NIBUF],
    pub(crate) config: SymbologyConfig,
}

impl Default for I25Decoder {
    fn default() -> Self {
        Self {
            direction: false,
            element: 0,
            character: -1,
            s10: 0,
            width: 0,
            hold: [0; NIBUF],
            config: SymbologyConfig::default()
                .with(Config::Enable)
                .with_lengths(6, 0),
        }
    }
}

impl I25Decoder {
    pub(crate) fn reset(&mut self) {
        self.direction = false;
        self.element = 0;
        self.character = -1;
        self.s10 = 0;
    }

    /// Decode 5 like-colored elements into a digit
    fn decode10(&self, st: &DecoderState, offset: u8) -> Option<u8> {
        if self.s10 < 10 {
            return None;
        }

        // threshold bar width ratios
        let mut enc: u8 = 0;
        let mut par = 0;
        for i in (0..=8u8).rev().step_by(2) {
            let j = offset + if self.direction { i } else { 8 - i };
            enc = decode1(enc, st.get_width(j), self.s10)?;
            if enc & 1 != 0 {
                par += 1;
            }
        }

        // parity check
        if par != 2 {
            return None;
        }

        // decode binary weights
        enc &= 0xf;
        if enc & 8 != 0 {
            if enc == 12 {
                enc = 0;
            } else {
                enc -= 1;
                if enc > 9 {
                    return None;
                }
            }
        }
        Some(enc)
    }

    /// Look for a start pattern preceding the most recent 10 elements
    fn decode_start(&mut self, st: &DecoderState) -> SymbolType {
        let s10 = self.s10;
        if s10 < 10 {
            return SymbolType::None;
        }

        let start = |enc: Option<u8>, i: u8| decode1(enc?, st.get_width(i), s10);
        let enc = start(start(start(Some(0), 10), 11), 12);
        let (valid, i) = if st.color() == Color::Bar {
            (enc == Some(4), 13)
        } else {
            (start(enc, 13) == Some(0), 14)
        };
        if !valid {
            return SymbolType::None;
        }

        // check leading quiet zone
        let quiet = st.get_width(i);
        if quiet != 0 && quiet < s10 * 3 / 8 {
            return SymbolType::None;
        }

        self.direction = st.color() == Color::Bar;
        self.element = 1;
        self.character = 0;
        SymbolType::Partial
    }

    /// Lock shared resources and copy the holding buffer
    fn acquire_lock(&mut self, st: &mut DecoderState) -> bool {
        if !st.acquire_lock(SymbolType::I25) {
            self.character = -1;
            return false;
        }
        st.buf_mut()[..NIBUF].copy_from_slice(&self.hold);
        true
    }

    fn abort(&mut self, st: &mut DecoderState) -> SymbolType {
        if self.character >= NIBUF as i32 {
            st.release_lock(SymbolType::I25);
        }
        self.character = -1;
        SymbolType::None
    }

    fn decode_end(&mut self, st: &mut DecoderState) -> SymbolType {
        let width = self.width;

        // check trailing quiet zone
        let quiet = st.get_width(0);
        if (quiet != 0 && quiet < width * 3 / 8)
            || decode_e(st.get_width(1), width, 45) > 2
            || decode_e(st.get_width(2), width, 45) > 2
        {
            return SymbolType::None;
        }

        // check exit condition
        let e = decode_e(st.get_width(3), width, 45);
        let valid = if !self.direction {
            (3..=7).contains(&e)
        } else {
            e <= 2 && decode_e(st.get_width(4), width, 45) <= 2
        };
        if !valid {
            return SymbolType::None;
        }

        if self.character <= NIBUF as i32 && !self.acquire_lock(st) {
            return SymbolType::Partial;
        }

        let n = self.character as usize;
        st.direction = 1 - 2 * self.direction as i32;
        let mut data = st.buf_mut()[..n].to_vec();
        if self.direction {
            data.reverse();
        }

        if !self.config.length_ok(self.character) || !st.write_data(&data) {
            st.release_lock(SymbolType::I25);
            self.character = -1;
            return SymbolType::None;
        }

        st.modifiers = 0;
        self.character = -1;
        SymbolType::I25
    }

    pub(crate) fn decode(&mut self, st: &mut DecoderState) -> SymbolType {
        // update latest character width
        self.s10 = self
            .s10
            .wrapping_sub(st.get_width(10))
            .wrapping_add(st.get_width(0));

        if self.character < 0 && self.decode_start(st) == SymbolType::None {
            return SymbolType::None;
        }

        self.element = self.element.wrapping_sub(1) & 0xf;
        if self.element == 6 - self.direction as u8 {
            return self.decode_end(st);
        } else if self.element != 0 {
            return SymbolType::None;
        }

        self.width = self.s10;

        if self.character == NIBUF as i32 && !self.acquire_lock(st) {
            return SymbolType::Partial;
        }

        let Some(c) = self.decode10(st, 1) else {
            return self.abort(st);
        };
        if !st.size_buf(self.character as usize + 3) {
            return self.abort(st);
        }
        self.store(st, c);

        let Some(c) = self.decode10(st, 0) else {
            return self.abort(st);
        };
        self.store(st, c);
        self.element = 10;

        if self.character == 2 {
            SymbolType::Partial
        } else {
            SymbolType::None
        }
    }

    fn store(&mut self, st: &mut DecoderState, digit: u8) {
        let i = self.character as usize;
        if i < NIBUF {
            self.hold[i] = digit + b'0';
        } else {
            st.buf_mut()[i] = digit + b'0';
        }
        self.character += 1;
    }
}
