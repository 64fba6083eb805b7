//! Width-stream barcode decoder
//!
//! A [`Decoder`] consumes the alternating space/bar widths produced by a
//! [`LineScanner`](crate::LineScanner) and feeds every width to one state
//! machine per enabled symbology. Machines share a 16-element width window
//! and a single output buffer guarded by a lock: the first machine to claim
//! the lock owns the buffer until it completes or gives up.

use std::any::Any;
use std::fmt;

use crate::color::Color;
use crate::config::Config;
use crate::decoders::SymbologyDecoder;
use crate::error::{zprintf, Error, ErrorInfo, Module, Result, Severity};
use crate::SymbolType;

/// Number of widths retained for look-back
pub(crate) const DECODE_WINDOW: usize = 16;

/// Initial size of the shared data buffer
pub(crate) const BUFFER_MIN: usize = 0x20;
/// Largest data buffer a symbol may use
pub(crate) const BUFFER_MAX: usize = 0x100;
/// Buffer growth step
pub(crate) const BUFFER_INCR: usize = 0x10;

/// Widths are clamped to this before they enter the window, which keeps
/// every per-symbology width sum and its small multiples inside `u32`
pub(crate) const WIDTH_MAX: u32 = 1 << 24;

/// Callback invoked synchronously when a width completes a symbol
pub type DecoderHandler = Box<dyn FnMut(&Decoder) + Send>;

/// Decode element width into a discrete value
///
/// `e` is an edge-to-similar-edge measurement, `s` the total character
/// width and `n` the number of modules in a character. Returns -1 if the
/// width is out of range.
#[inline]
pub(crate) fn decode_e(e: u32, s: u32, n: u32) -> i32 {
    if s == 0 {
        return -1;
    }
    let big_e = ((e as u64 * n as u64 * 2 + 1) / s as u64).wrapping_sub(3) / 2;
    if big_e >= n.saturating_sub(3) as u64 {
        -1
    } else {
        big_e as i32
    }
}

// ============================================================================
// Per-symbology configuration
// ============================================================================

/// Boolean flags and length limits of one symbology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct SymbologyConfig {
    flags: u32,
    pub(crate) min_len: i32,
    pub(crate) max_len: i32,
}

impl SymbologyConfig {
    pub(crate) fn with(mut self, cfg: Config) -> Self {
        self.set(cfg, true);
        self
    }

    pub(crate) fn with_lengths(mut self, min_len: i32, max_len: i32) -> Self {
        self.min_len = min_len;
        self.max_len = max_len;
        self
    }

    #[inline]
    pub(crate) fn test(&self, cfg: Config) -> bool {
        (self.flags >> cfg.code()) & 1 != 0
    }

    pub(crate) fn set(&mut self, cfg: Config, on: bool) {
        if on {
            self.flags |= 1 << cfg.code();
        } else {
            self.flags &= !(1 << cfg.code());
        }
    }

    /// Whether `len` characters satisfy the configured limits
    #[inline]
    pub(crate) fn length_ok(&self, len: i32) -> bool {
        len >= self.min_len && (self.max_len <= 0 || len <= self.max_len)
    }
}

// ============================================================================
// Shared decoder state
// ============================================================================

/// State shared by every symbology state machine
#[derive(Debug)]
pub(crate) struct DecoderState {
    /// Index of the next width; its low bit is the next color
    pub(crate) idx: u8,
    w: [u32; DECODE_WINDOW],
    /// Symbology currently owning the data buffer
    pub(crate) lock: SymbolType,
    pub(crate) modifiers: u32,
    pub(crate) direction: i32,
    /// Running width of the last 6 elements
    pub(crate) s6: u32,
    buf: Vec<u8>,
    buflen: usize,
    /// Non-recoverable failure raised by a state machine
    pub(crate) fault: Option<Error>,
}

impl DecoderState {
    fn new() -> Self {
        Self {
            idx: 0,
            w: [0; DECODE_WINDOW],
            lock: SymbolType::None,
            modifiers: 0,
            direction: 0,
            s6: 0,
            buf: vec![0; BUFFER_MIN],
            buflen: 0,
            fault: None,
        }
    }

    /// Retrieve the i-th previous element width
    #[inline]
    pub(crate) fn get_width(&self, offset: u8) -> u32 {
        self.w[(self.idx.wrapping_sub(offset) as usize) & (DECODE_WINDOW - 1)]
    }

    /// Sum of two consecutive element widths
    #[inline]
    pub(crate) fn pair_width(&self, offset: u8) -> u32 {
        self.get_width(offset)
            .wrapping_add(self.get_width(offset + 1))
    }

    /// Color of the most recently stored element
    #[inline]
    pub(crate) fn color(&self) -> Color {
        Color::from(self.idx)
    }

    /// Claim the shared data buffer; false when another symbology holds it
    pub(crate) fn acquire_lock(&mut self, req: SymbolType) -> bool {
        if self.lock != SymbolType::None {
            zprintf!(2, "lock={} req={}", self.lock, req);
            return false;
        }
        self.lock = req;
        true
    }

    /// Give the shared data buffer back
    pub(crate) fn release_lock(&mut self, req: SymbolType) {
        if self.lock == req {
            self.lock = SymbolType::None;
        } else if self.lock == SymbolType::None {
            log::trace!("release of unheld lock req={}", req);
        } else {
            log::trace!("lock={} req={}", self.lock, req);
            self.fault = Some(Error::Internal);
        }
    }

    /// Ensure the data buffer can hold `len` bytes
    ///
    /// Returns false when `len` exceeds the maximum symbol size or memory
    /// cannot be reserved.
    pub(crate) fn size_buf(&mut self, len: usize) -> bool {
        let alloc = self.buf.len();
        if len <= BUFFER_MIN || len < alloc {
            return true;
        }
        if len > BUFFER_MAX {
            return false;
        }
        let mut new_len = len;
        if len < alloc + BUFFER_INCR {
            new_len = (alloc + BUFFER_INCR).min(BUFFER_MAX);
        }
        if self.buf.try_reserve_exact(new_len - alloc).is_err() {
            self.fault = Some(Error::OutOfMemory);
            return false;
        }
        self.buf.resize(new_len, 0);
        true
    }

    /// Writable view of the whole data buffer
    #[inline]
    pub(crate) fn buf_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Replace the decoded data
    pub(crate) fn write_data(&mut self, data: &[u8]) -> bool {
        if !self.size_buf(data.len() + 1) {
            return false;
        }
        self.buf[..data.len()].copy_from_slice(data);
        self.buflen = data.len();
        true
    }

    fn data(&self) -> &[u8] {
        &self.buf[..self.buflen]
    }

    /// Store the next width and update the shared character width
    fn push_width(&mut self, w: u32) {
        self.w[self.idx as usize & (DECODE_WINDOW - 1)] = w.min(WIDTH_MAX);
        self.s6 = self.s6.wrapping_sub(self.get_width(7));
        self.s6 = self.s6.wrapping_add(self.get_width(1));
    }

    fn new_scan(&mut self) {
        self.w = [0; DECODE_WINDOW];
        self.lock = SymbolType::None;
        self.idx = 0;
        self.s6 = 0;
    }

    fn reset(&mut self) {
        self.new_scan();
        self.modifiers = 0;
        self.direction = 0;
        self.buflen = 0;
        self.fault = None;
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// Width-stream decoder running one state machine per symbology
pub struct Decoder {
    state: DecoderState,
    /// State machines in registration (tie-break) order
    machines: Vec<SymbologyDecoder>,
    symbol_type: SymbolType,
    handler: Option<DecoderHandler>,
    userdata: Option<Box<dyn Any + Send>>,
    err: ErrorInfo,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("symbol_type", &self.symbol_type)
            .field("lock", &self.state.lock)
            .field("idx", &self.state.idx)
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

impl Decoder {
    /// Create a decoder with the default symbology configuration
    pub fn new() -> Self {
        Self {
            state: DecoderState::new(),
            machines: SymbologyDecoder::registry(),
            symbol_type: SymbolType::None,
            handler: None,
            userdata: None,
            err: ErrorInfo::new(Module::Decoder),
        }
    }

    /// Clear all decoder state, including partial decodes in progress
    pub fn reset(&mut self) {
        self.state.reset();
        self.symbol_type = SymbolType::None;
        for m in &mut self.machines {
            m.reset();
        }
        self.err.clear();
    }

    /// Mark the start of a new scan pass
    ///
    /// Clears the width window and the buffer lock. EAN/UPC half-symbol
    /// results collected so far survive, so halves seen on different
    /// passes can still be merged.
    pub fn new_scan(&mut self) {
        self.state.new_scan();
        for m in &mut self.machines {
            m.new_scan();
        }
    }

    /// Process the next bar/space width
    ///
    /// The first width of a scan is a space, alternating from there.
    /// Returns the symbol type when this width completes a symbol (its
    /// data is then available from [`data`](Self::data)),
    /// [`SymbolType::Partial`] when some machine made progress and
    /// [`SymbolType::None`] otherwise.
    pub fn decode_width(&mut self, w: u32) -> SymbolType {
        let st = &mut self.state;
        st.push_width(w);

        let mut sym = SymbolType::None;
        for m in self.machines.iter_mut().filter(|m| m.is_enabled()) {
            let tmp = m.decode(st);
            if tmp > SymbolType::Partial {
                if sym <= SymbolType::Partial {
                    sym = tmp;
                }
            } else if tmp == SymbolType::Partial && sym == SymbolType::None {
                sym = tmp;
            }
        }

        st.idx = st.idx.wrapping_add(1);
        self.symbol_type = sym;

        if sym != SymbolType::None {
            if st.lock != SymbolType::None && sym > SymbolType::Partial {
                st.release_lock(sym);
            }
            if let Some(mut handler) = self.handler.take() {
                handler(self);
                self.handler = Some(handler);
            }
        }
        sym
    }

    /// Process the next width, checking that colors alternate
    ///
    /// Fails with [`Error::Invalid`] when `color` is not the color the
    /// decoder expects next.
    pub fn decode_width_colored(&mut self, w: u32, color: Color) -> Result<SymbolType> {
        let expected = self.color();
        if color != expected {
            return Err(self.err.record(
                Severity::Error,
                Error::Invalid,
                "decode_width",
                format!("expected {expected:?} width, got {color:?}"),
            ));
        }
        Ok(self.decode_width(w))
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Set a symbology configuration value
    ///
    /// `SymbolType::None` applies the setting to every symbology that
    /// supports it.
    pub fn set_config(&mut self, sym: SymbolType, cfg: Config, val: i32) -> Result<()> {
        let result = if sym == SymbolType::None {
            let mut applied = false;
            let mut result = Ok(());
            for s in SymbolType::ALL {
                match self.apply_config(s, cfg, val) {
                    Ok(()) => applied = true,
                    Err(Error::Unsupported) => {}
                    Err(e) => {
                        result = Err(e);
                        break;
                    }
                }
            }
            if result.is_ok() && !applied {
                result = Err(Error::Unsupported);
            }
            result
        } else {
            self.apply_config(sym, cfg, val)
        };
        result.map_err(|e| {
            self.err.record(
                Severity::Error,
                e,
                "set_config",
                format!("{sym}: {cfg:?}={val}"),
            )
        })
    }

    fn apply_config(&mut self, sym: SymbolType, cfg: Config, val: i32) -> Result<()> {
        if !cfg.is_decoder_setting() {
            return Err(Error::Unsupported);
        }
        let config = self
            .machines
            .iter_mut()
            .find_map(|m| m.config_mut(sym))
            .ok_or(Error::Unsupported)?;

        match cfg {
            Config::MinLen | Config::MaxLen => {
                if sym.is_ean_family() {
                    return Err(Error::Unsupported);
                }
                if val < 0 {
                    return Err(Error::Invalid);
                }
                if cfg == Config::MinLen {
                    config.min_len = val;
                } else {
                    config.max_len = val;
                }
            }
            _ => match val {
                0 => config.set(cfg, false),
                1 => config.set(cfg, true),
                _ => return Err(Error::Invalid),
            },
        }
        zprintf!(1, "{sym} {cfg:?}={val}");
        Ok(())
    }

    /// Read back a symbology configuration value
    pub fn config(&self, sym: SymbolType, cfg: Config) -> Result<i32> {
        if !cfg.is_decoder_setting() {
            return Err(Error::Unsupported);
        }
        let config = self
            .machines
            .iter()
            .find_map(|m| m.config(sym))
            .ok_or(Error::Unsupported)?;
        match cfg {
            Config::MinLen | Config::MaxLen if sym.is_ean_family() => Err(Error::Unsupported),
            Config::MinLen => Ok(config.min_len),
            Config::MaxLen => Ok(config.max_len),
            _ => Ok(config.test(cfg) as i32),
        }
    }

    /// Whether a symbology is currently enabled
    pub fn is_enabled(&self, sym: SymbolType) -> bool {
        self.config(sym, Config::Enable) == Ok(1)
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Type of the last decoded symbol
    pub fn symbol_type(&self) -> SymbolType {
        self.symbol_type
    }

    /// Data of the last decoded symbol
    pub fn data(&self) -> &[u8] {
        self.state.data()
    }

    pub fn data_len(&self) -> usize {
        self.state.buflen
    }

    /// Color of the next element expected by [`decode_width`](Self::decode_width)
    pub fn color(&self) -> Color {
        self.state.color()
    }

    /// Modifier flags of the last decoded symbol
    pub fn modifiers(&self) -> u32 {
        self.state.modifiers
    }

    /// Direction of the last decoded symbol: 1 forward, -1 reverse
    pub fn direction(&self) -> i32 {
        self.state.direction
    }

    /// Install a result handler, returning the previous one
    pub fn set_handler(&mut self, handler: Option<DecoderHandler>) -> Option<DecoderHandler> {
        std::mem::replace(&mut self.handler, handler)
    }

    /// Attach an opaque application value
    pub fn set_userdata(&mut self, userdata: Option<Box<dyn Any + Send>>) {
        self.userdata = userdata;
    }

    pub fn userdata(&self) -> Option<&(dyn Any + Send)> {
        self.userdata.as_deref()
    }

    /// Last error reported by this decoder
    pub fn error(&self) -> &ErrorInfo {
        &self.err
    }

    /// Failure that makes further decoding unreliable
    pub(crate) fn fault(&self) -> Option<&Error> {
        self.state.fault.as_ref()
    }
}
