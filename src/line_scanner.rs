//! Low-level barcode line scanner
//!
//! A [`LineScanner`] turns a stream of intensity samples into bar/space
//! widths. Edges are located at zero crossings of the second derivative of
//! a moving average and interpolated to 1/32 of a sample; every width is
//! passed on to the attached [`Decoder`], if any.

use crate::color::Color;
use crate::decoder::Decoder;
use crate::SymbolType;

/// Fraction bits of edge positions
const FIXED: u32 = 5;
const ROUND: u32 = 1 << (FIXED - 1);

/// Threshold decay over one width
const THRESH_FADE: u64 = 8;
const THRESH_MIN: u64 = 4;

// (0.78 * (1 << 6) + 1) / 2
const EWMA_WEIGHT: i64 = 25;

// (0.44 * (1 << 6) + 1) / 2
const THRESH_INIT: u64 = 14;

/// Edge detector feeding an optional width decoder
///
/// Samples may use the whole `i32` range; the moving average and its
/// derivatives are kept in 64 bits.
#[derive(Debug)]
pub struct LineScanner {
    decoder: Option<Decoder>,
    y1_min_thresh: u64,
    /// Sample index within the current pass
    x: u32,
    /// Short history of the moving average
    y0: [i64; 4],
    /// Slope at the last edge candidate (sign gives the color)
    y1_sign: i64,
    y1_thresh: u64,
    cur_edge: u32,
    last_edge: u32,
    width: u32,
}

impl Default for LineScanner {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LineScanner {
    /// Create a scanner, optionally owning the decoder it feeds
    pub fn new(decoder: Option<Decoder>) -> Self {
        Self {
            decoder,
            y1_min_thresh: THRESH_MIN,
            x: 0,
            y0: [0; 4],
            y1_sign: 0,
            y1_thresh: THRESH_MIN,
            cur_edge: 0,
            last_edge: 0,
            width: 0,
        }
    }

    pub fn decoder(&self) -> Option<&Decoder> {
        self.decoder.as_ref()
    }

    pub fn decoder_mut(&mut self) -> Option<&mut Decoder> {
        self.decoder.as_mut()
    }

    /// Clear all scanner state, including the attached decoder
    pub fn reset(&mut self) {
        self.x = 0;
        self.y0 = [0; 4];
        self.y1_sign = 0;
        self.y1_thresh = self.y1_min_thresh;
        self.cur_edge = 0;
        self.last_edge = 0;
        self.width = 0;
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.reset();
        }
    }

    /// Width of the most recent bar or space
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Interpolated position of the last edge
    ///
    /// `offset` is subtracted first (in 1/32 sample units); `prec` is the
    /// number of fraction bits wanted in the result.
    pub fn edge(&self, offset: u32, prec: i32) -> u32 {
        let edge = self
            .last_edge
            .wrapping_sub(offset)
            .wrapping_sub(1 << FIXED)
            .wrapping_sub(ROUND);
        let shift = FIXED as i32 - prec;
        match shift {
            1.. => edge >> shift,
            0 => edge,
            _ => edge << -shift,
        }
    }

    /// Color of the element that began at the last edge
    pub fn color(&self) -> Color {
        if self.y1_sign <= 0 {
            Color::Space
        } else {
            Color::Bar
        }
    }

    /// Current edge threshold, fading back to the minimum over one width
    fn calc_thresh(&mut self) -> u64 {
        let thresh = self.y1_thresh;
        if thresh <= self.y1_min_thresh || self.width == 0 {
            return self.y1_min_thresh;
        }

        let dx = (self.x << FIXED).wrapping_sub(self.last_edge);
        let t = u128::from(thresh) * u128::from(dx)
            / u128::from(self.width)
            / u128::from(THRESH_FADE);
        if u128::from(thresh) > t {
            let faded = thresh - t as u64;
            if faded > self.y1_min_thresh {
                return faded;
            }
        }
        self.y1_thresh = self.y1_min_thresh;
        self.y1_min_thresh
    }

    fn decode_width(&mut self, width: u32) -> SymbolType {
        match self.decoder.as_mut() {
            Some(decoder) => decoder.decode_width(width),
            None => SymbolType::Partial,
        }
    }

    /// Close the pending edge and report its width
    fn process_edge(&mut self) -> SymbolType {
        if self.y1_sign == 0 {
            self.last_edge = (1 << FIXED) + ROUND;
            self.cur_edge = self.last_edge;
        } else if self.last_edge == 0 {
            self.last_edge = self.cur_edge;
        }

        self.width = self.cur_edge.wrapping_sub(self.last_edge);
        self.last_edge = self.cur_edge;
        self.decode_width(self.width)
    }

    /// Force a boundary at the current position
    ///
    /// Three calls in a row always drain every pending edge.
    pub fn flush(&mut self) -> SymbolType {
        if self.y1_sign == 0 {
            return SymbolType::None;
        }

        let x = (self.x << FIXED).wrapping_add(ROUND);
        if self.cur_edge != x || self.y1_sign > 0 {
            let edge = self.process_edge();
            self.cur_edge = x;
            self.y1_sign = -self.y1_sign;
            return edge;
        }

        self.y1_sign = 0;
        self.width = 0;
        self.decode_width(0)
    }

    /// Drain pending edges and start a new pass
    ///
    /// Returns the highest result produced while draining. Partial symbol
    /// state in the decoder survives, see [`Decoder::new_scan`].
    pub fn new_scan(&mut self) -> SymbolType {
        let mut edge = SymbolType::None;
        while self.y1_sign != 0 {
            let tmp = self.flush();
            if tmp > edge {
                edge = tmp;
            }
        }

        self.x = 0;
        self.y0 = [0; 4];
        self.y1_sign = 0;
        self.y1_thresh = self.y1_min_thresh;
        self.cur_edge = 0;
        self.last_edge = 0;
        self.width = 0;
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.new_scan();
        }
        edge
    }

    /// Process the next intensity sample
    pub fn scan_y(&mut self, y: i32) -> SymbolType {
        let x = self.x;
        let hist = |n: u32| (x.wrapping_sub(n) & 3) as usize;

        let y = i64::from(y);
        let mut y0_1 = self.y0[hist(1)];
        let y0_0 = if x != 0 {
            let y0_0 = y0_1 + (((y - y0_1) * EWMA_WEIGHT) >> FIXED);
            self.y0[(x & 3) as usize] = y0_0;
            y0_0
        } else {
            y0_1 = y;
            self.y0 = [y; 4];
            y
        };
        let y0_2 = self.y0[hist(2)];
        let y0_3 = self.y0[hist(3)];

        // 1st differential @ x-1
        let mut y1_1 = y0_1 - y0_2;
        let y1_2 = y0_2 - y0_3;
        if y1_1.abs() < y1_2.abs() && (y1_1 >= 0) == (y1_2 >= 0) {
            y1_1 = y1_2;
        }

        // 2nd differentials @ x-1 & x-2
        let y2_1 = y0_0 - 2 * y0_1 + y0_2;
        let y2_2 = y0_1 - 2 * y0_2 + y0_3;

        let mut edge = SymbolType::None;

        // 2nd zero-crossing is 1st local min/max - could be edge
        if (y2_1 == 0 || (y2_1 > 0) == (y2_2 < 0)) && self.calc_thresh() <= y1_1.unsigned_abs() {
            let y1_rev = if self.y1_sign > 0 { y1_1 < 0 } else { y1_1 > 0 };
            if y1_rev {
                // intensity change reversal - finalize previous edge
                edge = self.process_edge();
            }

            if y1_rev || self.y1_sign.abs() < y1_1.abs() {
                self.y1_sign = y1_1;

                // adaptive threshold starts at a multiple of the new extreme
                self.y1_thresh = ((y1_1.unsigned_abs() * THRESH_INIT + u64::from(ROUND)) >> FIXED)
                    .max(self.y1_min_thresh);

                // interpolate zero crossing
                let d = y2_1 - y2_2;
                let mut cur = 1i64 << FIXED;
                if d == 0 {
                    cur >>= 1;
                } else if y2_1 != 0 {
                    cur -= ((y2_1 << FIXED) + 1) / d;
                }
                self.cur_edge = (x << FIXED).wrapping_add(cur as u32);
            }
        }

        self.x = x.wrapping_add(1);
        edge
    }

    /// Process an RGB sample; intensity is the channel sum
    pub fn scan_rgb24(&mut self, rgb: [u8; 3]) -> SymbolType {
        let y = rgb.iter().map(|&c| i32::from(c)).sum();
        self.scan_y(y)
    }
}
