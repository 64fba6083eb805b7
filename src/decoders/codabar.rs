//! Codabar barcode decoder

use crate::color::Color;
use crate::config::Config;
use crate::decoder::{DecoderState, SymbologyConfig};
use crate::error::zassert;
use crate::SymbolType;

/// Characters held locally before the shared buffer is locked
const NIBUF: usize = 6;

// ============================================================================
// Codabar lookup tables
// ============================================================================

static CODABAR_LO: [i8; 12] = [0x0, 0x1, 0x4, 0x5, 0x2, 0xa, 0xb, 0x9, 0x6, 0x7, 0x8, 0x3];

static CODABAR_HI: [u8; 8] = [0x1, 0x4, 0x7, 0x6, 0x2, 0x3, 0x0, 0x5];

static CODABAR_CHARACTERS: &[u8; 20] = b"0123456789-$:/.+ABCD";

// ============================================================================
// Element sorting
// ============================================================================

#[inline]
fn width(st: &DecoderState, offset: u32) -> u64 {
    st.get_width(offset as u8) as u64
}

/// Sort 3 like-colored elements and return ordering
fn decode_sort3(st: &DecoderState, i0: u32) -> u32 {
    let w0 = width(st, i0);
    let w2 = width(st, i0 + 2);
    let w4 = width(st, i0 + 4);

    if w0 < w2 {
        if w2 < w4 {
            (i0 << 8) | ((i0 + 2) << 4) | (i0 + 4)
        } else if w0 < w4 {
            (i0 << 8) | ((i0 + 4) << 4) | (i0 + 2)
        } else {
            ((i0 + 4) << 8) | (i0 << 4) | (i0 + 2)
        }
    } else if w4 < w2 {
        ((i0 + 4) << 8) | ((i0 + 2) << 4) | i0
    } else if w0 < w4 {
        ((i0 + 2) << 8) | (i0 << 4) | (i0 + 4)
    } else {
        ((i0 + 2) << 8) | ((i0 + 4) << 4) | i0
    }
}

/// Sort N like-colored elements and return ordering
fn decode_sortn(st: &DecoderState, n: u32, i0: u32) -> u32 {
    let mut mask: u32 = 0;
    let mut sort: u32 = 0;

    for _ in 0..n {
        let mut wmin = u64::MAX;
        let mut jmin: Option<u32> = None;

        for j in (0..n).rev() {
            if (mask >> j) & 1 != 0 {
                continue;
            }
            let w = width(st, i0 + j * 2);
            if wmin >= w {
                wmin = w;
                jmin = Some(j);
            }
        }
        let Some(jmin) = jmin else {
            log::trace!("sortn({n},{i0}) found no minimum");
            return 0;
        };
        sort <<= 4;
        mask |= 1 << jmin;
        sort |= i0 + jmin * 2;
    }
    sort
}

/// Check width against reference
#[inline]
fn check_width(ref_width: u32, w: u32) -> bool {
    let dref = ref_width as u64;
    let ref_4 = dref * 4;
    let w_4 = w as u64 * 4;
    ref_4 - dref <= w_4 && w_4 <= ref_4 + dref
}

// ============================================================================
// Codabar Decoder
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct CodabarDecoder {
    direction: bool,
    /// Spaces remaining until the next character
    element: u8,
    character: i32,
    /// Running width of the last 7 elements
    s7: u32,
    width: u32,
    /// Holding buffer for the first characters, before the lock is taken
    hold: [u8; NIBUF],
    pub(crate) config: SymbologyConfig,
}

impl Default for CodabarDecoder {
    fn default() -> Self {
        Self {
            direction: false,
            element: 0,
            character: -1,
            s7: 0,
            width: 0,
            hold: [0; NIBUF],
            config: SymbologyConfig::default()
                .with(Config::Enable)
                .with_lengths(4, 0),
        }
    }
}

impl CodabarDecoder {
    pub(crate) fn reset(&mut self) {
        self.direction = false;
        self.element = 0;
        self.character = -1;
        self.s7 = 0;
    }

    /// Decode 7 elements into a character
    fn decode7(&self, st: &DecoderState) -> i8 {
        let s = self.s7;
        if s < 7 {
            return -1;
        }
        if !check_width(self.width, s) {
            return -1;
        }

        // extract min/max bar
        let ibar = decode_sortn(st, 4, 1);

        let wbmax = width(st, ibar & 0xf);
        let wbmin = width(st, ibar >> 12);
        if 8 * wbmin < wbmax || 3 * wbmin > 2 * wbmax {
            return -1;
        }

        let wb1 = width(st, (ibar >> 8) & 0xf);
        let wb2 = width(st, (ibar >> 4) & 0xf);
        let b0b3 = wbmin * wbmax;
        let b1b2 = wb1 * wb2;

        let ibar = if b1b2 + b1b2 / 8 < b0b3 {
            // single wide bar combinations
            if 8 * wbmin < 5 * wb1
                || 8 * wb1 < 5 * wb2
                || 4 * wb2 > 3 * wbmax
                || wb2 * wb2 >= wb1 * wbmax
            {
                return -1;
            }
            (ibar >> 1) & 0x3
        } else if b1b2 > b0b3 + b0b3 / 8 {
            // three wide bars, no wide spaces
            if 4 * wbmin > 3 * wb1
                || 8 * wb1 < 5 * wb2
                || 8 * wb2 < 5 * wbmax
                || wbmin * wb2 >= wb1 * wb1
            {
                return -1;
            }
            (ibar >> 13) + 4
        } else {
            return -1;
        };

        let ispc = decode_sort3(st, 2);

        let wsmax = width(st, ispc & 0xf);
        let wsmid = width(st, (ispc >> 4) & 0xf);
        let wsmin = width(st, (ispc >> 8) & 0xf);

        if ibar >> 2 != 0 {
            // verify no wide spaces
            if 8 * wsmin < wsmax || 8 * wsmin < 5 * wsmid || 8 * wsmid < 5 * wsmax {
                return -1;
            }
            let mut ibar = ibar & 0x3;
            if self.direction {
                ibar = 3 - ibar;
            }
            return ((0xfcde >> (ibar << 2)) & 0xf) as i8;
        }
        if 8 * wsmin < wsmax || 3 * wsmin > 2 * wsmax {
            return -1;
        }

        let s0s2 = wsmin * wsmax;
        let s1s1 = wsmid * wsmid;

        if s1s1 + s1s1 / 8 < s0s2 {
            // single wide space
            if 8 * wsmin < 5 * wsmid || 4 * wsmid > 3 * wsmax {
                return -1;
            }
            let ispc = ((ispc & 0xf) >> 1) - 1;
            let mut ic = (ispc << 2) | ibar;
            if self.direction {
                ic = 11 - ic;
            }
            CODABAR_LO[ic as usize]
        } else if s1s1 > s0s2 + s0s2 / 8 {
            // two wide spaces, check start/stop
            if 4 * wsmin > 3 * wsmid || 8 * wsmid < 5 * wsmax {
                return -1;
            }
            if (ispc >> 8) == 4 {
                return -1;
            }
            let ic = (ispc >> 10) * 4 + ibar;
            zassert!(ic < 8, -1, "ic={} ispc={} ibar={}", ic, ispc, ibar);
            let c = CODABAR_HI[ic as usize];
            if (c >> 2) != self.direction as u8 {
                return -1;
            }
            ((c & 0x3) | 0x10) as i8
        } else {
            -1
        }
    }

    fn decode_start(&mut self, st: &DecoderState) -> SymbolType {
        let s = self.s7 as u64;
        if s < 8 {
            return SymbolType::None;
        }

        // check leading quiet zone
        let qz = width(st, 8);
        if (qz != 0 && qz * 2 < s) || 4 * width(st, 0) > 3 * s {
            return SymbolType::None;
        }

        // check space ratios first
        let ispc = decode_sort3(st, 2);
        if (ispc >> 8) == 4 {
            return SymbolType::None;
        }

        // require 2 wide and 1 narrow spaces
        let wsmax = width(st, ispc & 0xf);
        let wsmin = width(st, ispc >> 8);
        let wsmid = width(st, (ispc >> 4) & 0xf);
        if 8 * wsmin < wsmax
            || 3 * wsmin > 2 * wsmax
            || 4 * wsmin > 3 * wsmid
            || 8 * wsmid < 5 * wsmax
            || wsmid * wsmid <= wsmax * wsmin
        {
            return SymbolType::None;
        }
        let ispc = ispc >> 10;

        // check bar ratios
        let ibar = decode_sortn(st, 4, 1);

        let wbmax = width(st, ibar & 0xf);
        let wbmin = width(st, ibar >> 12);
        if 8 * wbmin < wbmax || 3 * wbmin > 2 * wbmax {
            return SymbolType::None;
        }

        // require 1 wide and 3 narrow bars
        let wb1 = width(st, (ibar >> 8) & 0xf);
        let wb2 = width(st, (ibar >> 4) & 0xf);
        if 8 * wbmin < 5 * wb1
            || 8 * wb1 < 5 * wb2
            || 4 * wb2 > 3 * wbmax
            || wb1 * wb2 >= wbmin * wbmax
            || wb2 * wb2 >= wb1 * wbmax
        {
            return SymbolType::None;
        }
        let ibar = ((ibar & 0xf) - 1) >> 1;

        let ic = ispc * 4 + ibar;
        zassert!(ic < 8, SymbolType::None, "ic={} ispc={} ibar={}", ic, ispc, ibar);
        let c = CODABAR_HI[ic as usize];
        self.hold[0] = (c & 0x3) | 0x10;

        self.direction = (c >> 2) != 0;
        self.element = 4;
        self.character = 1;
        self.width = self.s7;
        SymbolType::Partial
    }

    fn abort(&mut self, st: &mut DecoderState) -> SymbolType {
        if self.character >= NIBUF as i32 {
            st.release_lock(SymbolType::Codabar);
        }
        self.character = -1;
        SymbolType::None
    }

    /// Resolve direction, verify the optional check character and convert
    fn postprocess(&mut self, st: &mut DecoderState) -> SymbolType {
        let n = self.character as usize;
        self.character = -1;
        st.direction = 1 - 2 * self.direction as i32;

        let buf = st.buf_mut();
        buf[..NIBUF].copy_from_slice(&self.hold);
        let mut chars = buf[..n].to_vec();
        if self.direction {
            chars.reverse();
        }

        if self.config.test(Config::AddCheck) {
            let chk: u32 = chars.iter().map(|&c| c as u32).sum();
            if chk & 0xf != 0 {
                return SymbolType::None;
            }
            if !self.config.test(Config::EmitCheck) {
                chars.remove(n - 2);
            }
        }

        let data: Vec<u8> = chars
            .iter()
            .map(|&c| CODABAR_CHARACTERS.get(c as usize).copied().unwrap_or(b'?'))
            .collect();
        st.modifiers = 0;
        if !st.write_data(&data) {
            return SymbolType::None;
        }
        SymbolType::Codabar
    }

    pub(crate) fn decode(&mut self, st: &mut DecoderState) -> SymbolType {
        // update latest character width
        self.s7 = self
            .s7
            .wrapping_sub(st.get_width(8))
            .wrapping_add(st.get_width(1));

        if st.color() != Color::Space {
            return SymbolType::None;
        }

        if self.character < 0 {
            return self.decode_start(st);
        }

        if self.character < 2 && self.decode_start(st) != SymbolType::None {
            return SymbolType::Partial;
        }

        self.element = self.element.wrapping_sub(1) & 0xf;
        if self.element != 0 {
            return SymbolType::None;
        }
        self.element = 4;

        let c = self.decode7(st);
        if c < 0 {
            return self.abort(st);
        }

        let character = self.character as usize;
        if character < NIBUF {
            self.hold[character] = c as u8;
        } else {
            if !st.size_buf(character + 1) {
                return self.abort(st);
            }
            st.buf_mut()[character] = c as u8;
        }
        self.character += 1;

        // lock shared resources
        if self.character == NIBUF as i32 && !st.acquire_lock(SymbolType::Codabar) {
            self.character = -1;
            return SymbolType::Partial;
        }

        let s = self.s7 as u64;
        if (c & 0x10) != 0 {
            let qz = width(st, 0);
            if qz != 0 && qz * 2 < s {
                return self.abort(st);
            }

            if !self.config.length_ok(self.character) {
                return self.abort(st);
            }

            if self.character < NIBUF as i32 && !st.acquire_lock(SymbolType::Codabar) {
                self.character = -1;
                return SymbolType::Partial;
            }

            let sym = self.postprocess(st);
            if sym <= SymbolType::Partial {
                st.release_lock(SymbolType::Codabar);
            }
            return sym;
        } else if 4 * width(st, 0) > 3 * s {
            return self.abort(st);
        }

        SymbolType::None
    }
}
