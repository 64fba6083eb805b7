//! 2-D image scanner
//!
//! Drives a [`LineScanner`] and its [`Decoder`] over the rows and columns
//! of a grayscale image, collecting one [`SymbolSet`](crate::SymbolSetView)
//! of results per frame. Repeated decodes of the same symbol on different
//! scan lines are merged, and an optional inter-frame cache tracks how
//! long a symbol has stayed in view across video frames.

use std::any::Any;
use std::fmt;
use std::time::Instant;

use crate::config::{parse_config, Config, DecoderConfig};
use crate::decoder::Decoder;
use crate::error::{zprintf, Error, ErrorInfo, Module, Result, Severity};
use crate::image::{Image, GREY, Y800};
use crate::img_scanner_config::ImageScannerConfig;
use crate::line_scanner::LineScanner;
use crate::symbol::{Addon, Orientation, SymbolData, SymbolType};
use crate::symbol_set::{SymbolArena, SymbolId, SymbolSetId, SymbolSetView};

/// Re-detections closer than this (ms) keep a symbol's count climbing
const CACHE_PROXIMITY: i64 = 1000;
/// A symbol unseen for this long (ms) starts over as tentative
const CACHE_HYSTERESIS: i64 = 2000;
/// History entries older than this (ms) are forgotten
const CACHE_TIMEOUT: i64 = CACHE_HYSTERESIS * 2;

/// Callback invoked after a frame that produced a newly confirmed symbol
pub type DataHandler = Box<dyn FnMut(&ImageScanner, &Image) + Send>;

// ============================================================================
// Inter-frame cache
// ============================================================================

#[derive(Debug)]
struct CacheEntry {
    symbol_type: SymbolType,
    data: Vec<u8>,
    time: i64,
    count: i32,
}

/// Detection history keyed by symbol type and data
#[derive(Debug, Default)]
struct ResultCache {
    entries: Vec<CacheEntry>,
}

impl ResultCache {
    /// Record a detection at `now` and return the symbol's new count
    fn update(&mut self, sym: SymbolType, data: &[u8], now: i64, uncertainty: i32) -> i32 {
        self.entries.retain(|e| now - e.time <= CACHE_TIMEOUT);

        let pos = match self
            .entries
            .iter()
            .position(|e| e.symbol_type == sym && e.data == data)
        {
            Some(pos) => pos,
            None => {
                self.entries.push(CacheEntry {
                    symbol_type: sym,
                    data: data.to_vec(),
                    time: now - CACHE_HYSTERESIS,
                    count: 0,
                });
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[pos];
        let age = now - entry.time;
        entry.time = now;
        let near = age < CACHE_PROXIMITY;
        let far = age >= CACHE_HYSTERESIS;
        let dup = entry.count >= 0;
        if (!dup && !near) || far {
            entry.count = -uncertainty;
        } else {
            entry.count += 1;
        }
        entry.count
    }
}

// ============================================================================
// Image scanner
// ============================================================================

/// Geometry of the scan line in progress
#[derive(Debug, Clone, Copy, Default)]
struct ScanLine {
    dx: i32,
    dy: i32,
    /// Step along the line: 1 forward, -1 backward
    du: i32,
    /// Image coordinate where the line starts
    umin: i32,
    /// Fixed coordinate of the line
    v: i32,
}

/// Scans grayscale images for linear barcodes
///
/// # Example
/// ```
/// use zedscan::{Image, ImageScanner};
///
/// let mut scanner = ImageScanner::new();
/// scanner.parse_config("code39.disable").unwrap();
///
/// let data = vec![255u8; 64 * 48];
/// let mut image = Image::from_gray(&data, 64, 48).unwrap();
/// assert_eq!(scanner.scan_image(&mut image).unwrap(), 0);
/// ```
pub struct ImageScanner {
    scn: LineScanner,
    config: ImageScannerConfig,
    arena: SymbolArena,
    /// Result set of the last frame
    frame: Option<SymbolSetId>,
    /// Set reference held on behalf of the last scanned image
    image_ref: Option<SymbolSetId>,
    /// `None` while caching is disabled
    cache: Option<ResultCache>,
    line: ScanLine,
    /// Timestamp of the frame in progress (ms)
    time: i64,
    epoch: Instant,
    handler: Option<DataHandler>,
    userdata: Option<Box<dyn Any + Send>>,
    err: ErrorInfo,
    /// Failure that poisons the scanner until [`reset`](Self::reset)
    fault: Option<Error>,
}

impl Default for ImageScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ImageScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageScanner")
            .field("config", &self.config)
            .field("frame", &self.frame)
            .field("cache", &self.cache.is_some())
            .field("has_handler", &self.handler.is_some())
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

impl ImageScanner {
    /// Create a scanner with the default configuration
    pub fn new() -> Self {
        Self {
            scn: LineScanner::new(Some(Decoder::new())),
            config: ImageScannerConfig::default(),
            arena: SymbolArena::new(),
            frame: None,
            image_ref: None,
            cache: None,
            line: ScanLine::default(),
            time: 0,
            epoch: Instant::now(),
            handler: None,
            userdata: None,
            err: ErrorInfo::new(Module::ImageScanner),
            fault: None,
        }
    }

    /// Create a scanner and apply every setting of `config`
    ///
    /// # Example
    /// ```
    /// use zedscan::config::*;
    /// use zedscan::{ImageScanner, SymbolType};
    ///
    /// let config = DecoderConfig::new()
    ///     .disable_all()
    ///     .enable(Code128)
    ///     .set_uncertainty(Code128, 1)
    ///     .scan_density(2, 2);
    /// let scanner = ImageScanner::with_config(&config).unwrap();
    /// assert_eq!(scanner.config(SymbolType::Code128, Config::Enable), Ok(1));
    /// assert_eq!(scanner.config(SymbolType::Ean13, Config::Enable), Ok(0));
    /// ```
    pub fn with_config(config: &DecoderConfig) -> Result<Self> {
        let mut scanner = Self::new();
        for (sym, cfg, val) in config.settings() {
            scanner.set_config(sym, cfg, val)?;
        }
        Ok(scanner)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Set a configuration value
    ///
    /// Decoder settings are forwarded to the decoder. `Uncertainty` applies
    /// to one symbology, or to all of them for `None`/`Partial`. Scanner
    /// settings (`Position`, `TestInverted`, densities) only accept `None`
    /// or `Partial`. `Enable` on `Composite` (or on `None`) toggles merging
    /// of EAN/UPC symbols with their add-on.
    pub fn set_config(&mut self, sym: SymbolType, cfg: Config, val: i32) -> Result<()> {
        self.apply_config(sym, cfg, val).map_err(|e| {
            self.err
                .record(Severity::Error, e, "set_config", format!("{sym}: {cfg:?}={val}"))
        })
    }

    fn apply_config(&mut self, sym: SymbolType, cfg: Config, val: i32) -> Result<()> {
        if cfg == Config::Enable && matches!(sym, SymbolType::None | SymbolType::Composite) {
            if !(0..=1).contains(&val) {
                return Err(Error::Invalid);
            }
            self.config.ean_composite = val != 0;
            if sym == SymbolType::Composite {
                return Ok(());
            }
        }

        if cfg.is_decoder_setting() {
            return self.decoder_mut()?.set_config(sym, cfg, val);
        }

        match cfg {
            Config::Uncertainty => {
                if val < 0 {
                    return Err(Error::Invalid);
                }
                self.config.set_uncertainty(sym, val);
            }
            _ if sym > SymbolType::Partial => return Err(Error::Unsupported),
            Config::XDensity | Config::YDensity => {
                let density = u32::try_from(val).map_err(|_| Error::Invalid)?;
                if cfg == Config::XDensity {
                    self.config.x_density = density;
                } else {
                    self.config.y_density = density;
                }
            }
            Config::Position | Config::TestInverted => {
                let on = match val {
                    0 => false,
                    1 => true,
                    _ => return Err(Error::Invalid),
                };
                if cfg == Config::Position {
                    self.config.position_tracking = on;
                } else {
                    self.config.test_inverted = on;
                }
            }
            _ => return Err(Error::Unsupported),
        }
        zprintf!(1, "{sym} {cfg:?}={val}");
        Ok(())
    }

    /// Parse a `[symbology.]config[=value]` string and apply it
    pub fn parse_config(&mut self, cfgstr: &str) -> Result<()> {
        let (sym, cfg, val) = parse_config(cfgstr).map_err(|e| {
            self.err
                .record(Severity::Error, Error::Parse(e), "parse_config", cfgstr)
        })?;
        self.set_config(sym, cfg, val)
    }

    /// Read back a configuration value
    pub fn config(&self, sym: SymbolType, cfg: Config) -> Result<i32> {
        if cfg == Config::Enable && sym == SymbolType::Composite {
            return Ok(self.config.ean_composite as i32);
        }
        if cfg.is_decoder_setting() {
            return self.decoder()?.config(sym, cfg);
        }
        match cfg {
            Config::Uncertainty if sym > SymbolType::Partial => Ok(self.config.uncertainty(sym)),
            Config::Uncertainty => Err(Error::Unsupported),
            _ if sym > SymbolType::Partial => Err(Error::Unsupported),
            Config::Position => Ok(self.config.position_tracking as i32),
            Config::TestInverted => Ok(self.config.test_inverted as i32),
            Config::XDensity => Ok(self.config.x_density as i32),
            Config::YDensity => Ok(self.config.y_density as i32),
            _ => Err(Error::Unsupported),
        }
    }

    /// Enable or disable the inter-frame result cache
    ///
    /// Every call clears the detection history.
    pub fn enable_cache(&mut self, enable: bool) {
        self.cache = enable.then(ResultCache::default);
    }

    fn decoder(&self) -> Result<&Decoder> {
        self.scn.decoder().ok_or(Error::Internal)
    }

    fn decoder_mut(&mut self) -> Result<&mut Decoder> {
        self.scn.decoder_mut().ok_or(Error::Internal)
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Symbols found in the last scanned frame
    pub fn results(&self) -> Option<SymbolSetView<'_>> {
        self.frame.and_then(|id| self.arena.set(id))
    }

    /// Storage behind every symbol and set handle this scanner produced
    pub fn symbols(&self) -> &SymbolArena {
        &self.arena
    }

    /// Mutable storage access, for retaining or releasing handles
    pub fn symbols_mut(&mut self) -> &mut SymbolArena {
        &mut self.arena
    }

    /// Drop the image's reference to its last result set
    ///
    /// Only the most recently scanned image holds a reference; scanning a
    /// different image releases it, so an image dropped without recycling
    /// costs nothing past the next scan.
    pub fn recycle_image(&mut self, img: &mut Image) {
        if let Some(id) = img.syms.take() {
            if self.image_ref == Some(id) {
                self.release_image_ref();
            } else {
                zprintf!(2, "image result set already superseded");
            }
        }
    }

    fn release_image_ref(&mut self) {
        if let Some(id) = self.image_ref.take() {
            if self.arena.symbol_set_ref(id, -1).is_err() {
                log::debug!("image held a stale result set");
            }
        }
    }

    /// Install a data handler, returning the previous one
    pub fn set_data_handler(&mut self, handler: Option<DataHandler>) -> Option<DataHandler> {
        std::mem::replace(&mut self.handler, handler)
    }

    /// Attach an opaque application value, available to the data handler
    pub fn set_userdata(&mut self, userdata: Option<Box<dyn Any + Send>>) {
        self.userdata = userdata;
    }

    pub fn userdata(&self) -> Option<&(dyn Any + Send)> {
        self.userdata.as_deref()
    }

    /// Last error reported by this scanner
    pub fn error(&self) -> &ErrorInfo {
        &self.err
    }

    /// Clear scan state and any fault, keeping configuration and results
    pub fn reset(&mut self) {
        self.scn.reset();
        self.fault = None;
        self.err.clear();
    }

    // ========================================================================
    // Scanning
    // ========================================================================

    /// Scan an image, timestamping the frame with the scanner's clock
    ///
    /// Returns the number of symbols found. The results are available from
    /// [`results`](Self::results) and through [`Image::symbols`].
    pub fn scan_image(&mut self, img: &mut Image) -> Result<usize> {
        let now = self.epoch.elapsed().as_millis();
        self.scan_image_at(img, u64::try_from(now).unwrap_or(u64::MAX))
    }

    /// Scan an image captured at `time_ms`
    ///
    /// The timestamp only matters to the inter-frame cache.
    pub fn scan_image_at(&mut self, img: &mut Image, time_ms: u64) -> Result<usize> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        if !matches!(img.format(), Y800 | GREY) {
            return Err(self.err.record(
                Severity::Error,
                Error::Unsupported,
                "scan_image",
                format!("format {:08x}", img.format()),
            ));
        }

        self.recycle_image(img);
        self.release_image_ref();
        if let Some(prev) = self.frame.take() {
            // a retained set survives this
            if self.arena.symbol_set_ref(prev, -1).is_err() {
                log::debug!("previous result set already released");
            }
        }
        let frame = self.arena.alloc_set();
        self.frame = Some(frame);
        self.time = i64::try_from(time_ms).unwrap_or(i64::MAX);

        let (width, height) = (img.width(), img.height());
        self.scan_frame(frame, width, height, img.data())?;
        if self.frame_len(frame) == 0 && self.config.test_inverted {
            zprintf!(1, "no symbols, retrying inverted");
            let inverted = img.inverted_data();
            self.scan_frame(frame, width, height, &inverted)?;
        }

        self.arena
            .symbol_set_ref(frame, 1)
            .map_err(|e| self.poison(e, "result set vanished"))?;
        img.syms = Some(frame);
        self.image_ref = Some(frame);

        let nsyms = self.frame_len(frame);
        zprintf!(1, "frame {}: {} symbols", img.sequence(), nsyms);

        let confirmed = self.results().is_some_and(|set| set.iter().any(|s| s.count() == 0));
        if nsyms > 0 && confirmed {
            if let Some(mut handler) = self.handler.take() {
                handler(self, img);
                self.handler = Some(handler);
            }
        }
        Ok(nsyms)
    }

    fn frame_len(&self, frame: SymbolSetId) -> usize {
        self.arena.set_members(frame).map_or(0, <[SymbolId]>::len)
    }

    /// Record a fatal error and refuse further scans until reset
    fn poison(&mut self, error: Error, detail: &str) -> Error {
        self.fault = Some(error.clone());
        self.err.record(Severity::Fatal, error, "scan_image", detail)
    }

    /// Run every scan line over one copy of the pixels
    fn scan_frame(&mut self, frame: SymbolSetId, width: u32, height: u32, data: &[u8]) -> Result<()> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || data.len() < w * h {
            return Ok(());
        }
        let pixel = |x: usize, y: usize| i32::from(data[y * w + x]);

        // horizontal lines, alternating direction
        let density = self.config.y_density as usize;
        if density > 0 {
            let mut y = ((h - 1) % density + 1) / 2;
            while y < h {
                self.line = ScanLine { dx: 1, dy: 0, du: 1, umin: 0, v: y as i32 };
                for x in 0..w {
                    let res = self.scn.scan_y(pixel(x, y));
                    self.handle_result(frame, res);
                }
                self.quiet_border(frame);

                y += density;
                if y >= h {
                    break;
                }
                self.line = ScanLine { dx: -1, dy: 0, du: -1, umin: w as i32, v: y as i32 };
                for x in (0..w).rev() {
                    let res = self.scn.scan_y(pixel(x, y));
                    self.handle_result(frame, res);
                }
                self.quiet_border(frame);
                y += density;
            }
        }

        // vertical lines
        let density = self.config.x_density as usize;
        if density > 0 {
            let mut x = ((w - 1) % density + 1) / 2;
            while x < w {
                self.line = ScanLine { dx: 0, dy: 1, du: 1, umin: 0, v: x as i32 };
                for y in 0..h {
                    let res = self.scn.scan_y(pixel(x, y));
                    self.handle_result(frame, res);
                }
                self.quiet_border(frame);

                x += density;
                if x >= w {
                    break;
                }
                self.line = ScanLine { dx: 0, dy: -1, du: -1, umin: h as i32, v: x as i32 };
                for y in (0..h).rev() {
                    let res = self.scn.scan_y(pixel(x, y));
                    self.handle_result(frame, res);
                }
                self.quiet_border(frame);
                x += density;
            }
        }
        self.line = ScanLine::default();

        if let Some(fault) = self.scn.decoder().and_then(Decoder::fault).cloned() {
            return Err(self.poison(fault, "decoder failure"));
        }

        self.filter_uncertain(frame);
        if self.config.ean_composite {
            self.merge_composite(frame);
        }
        Ok(())
    }

    /// End of a scan line: drain the pipeline and start over
    fn quiet_border(&mut self, frame: SymbolSetId) {
        let res = self.scn.flush();
        self.handle_result(frame, res);
        let res = self.scn.flush();
        self.handle_result(frame, res);
        let res = self.scn.new_scan();
        self.handle_result(frame, res);
    }

    /// Image coordinates of the symbol just decoded
    fn position(&self) -> (i32, i32) {
        let line = self.line;
        let w = self.scn.width();
        let u = line.umin + line.du * self.scn.edge(w, 0) as i32;
        if line.dx != 0 {
            (u, line.v)
        } else {
            (line.v, u)
        }
    }

    /// Merge a decoder result into the frame
    fn handle_result(&mut self, frame: SymbolSetId, result: SymbolType) {
        if result <= SymbolType::Partial {
            return;
        }
        let point = self.config.position_tracking.then(|| self.position());
        let Some(decoder) = self.scn.decoder() else {
            return;
        };
        let data = decoder.data();

        // same symbol seen on another scan line
        let members = self.arena.set_members(frame).unwrap_or(&[]);
        let dup = members.iter().copied().find(|&id| {
            self.arena
                .symbol_data(id)
                .is_some_and(|s| s.symbol_type == result && s.data == data)
        });
        if let Some(id) = dup {
            if let Some(sym) = self.arena.symbol_data_mut(id) {
                sym.quality += 1;
                if let Some((x, y)) = point {
                    sym.add_point(x, y);
                }
            }
            return;
        }

        let mut sym = SymbolData::new(result, data.to_vec());
        sym.modifiers = decoder.modifiers();
        sym.time = self.time as u64;
        if let Some((x, y)) = point {
            sym.add_point(x, y);
        }
        let dir = decoder.direction();
        if dir != 0 {
            let line = self.line;
            sym.orient = Orientation::from_index((line.dy != 0) as i32 + ((line.du ^ dir) & 2));
        }
        zprintf!(2, "{result} {:?} at {point:?}", String::from_utf8_lossy(&sym.data));
        self.add_symbol(frame, sym, self.config.uncertainty(result));
    }

    /// Append a new symbol to the frame, updating the cache
    fn add_symbol(&mut self, frame: SymbolSetId, mut sym: SymbolData, uncertainty: i32) {
        sym.cache_count = match self.cache.as_mut() {
            Some(cache) => cache.update(sym.symbol_type, &sym.data, self.time, uncertainty),
            None => 0,
        };
        let id = self.arena.alloc_symbol(sym);
        if self.arena.push(frame, id).is_err() {
            log::warn!("result set released during scan");
        }
    }

    /// Drop symbols seen on too few scan lines to be trusted
    fn filter_uncertain(&mut self, frame: SymbolSetId) {
        let filter = self.cache.is_none()
            && (self.config.x_density == 1 || self.config.y_density == 1);
        if !filter {
            return;
        }
        let members = self.arena.set_members(frame).unwrap_or(&[]).to_vec();
        for id in members {
            let Some(sym) = self.arena.symbol_data(id) else {
                continue;
            };
            if sym.quality <= self.config.uncertainty(sym.symbol_type) {
                zprintf!(1, "dropping uncertain {} (quality {})", sym.symbol_type, sym.quality);
                if self.arena.remove(frame, id).is_err() {
                    log::warn!("uncertain symbol missing from its set");
                }
            }
        }
    }

    /// Combine a lone EAN/UPC symbol with a lone add-on
    fn merge_composite(&mut self, frame: SymbolSetId) {
        let members = self.arena.set_members(frame).unwrap_or(&[]).to_vec();
        let mut ean = Vec::new();
        let mut addon = Vec::new();
        for &id in &members {
            let Some(sym) = self.arena.symbol_data(id) else {
                continue;
            };
            if sym.cache_count > 0 || !sym.symbol_type.is_ean_family() {
                continue;
            }
            if sym.symbol_type.is_addon() {
                addon.push(id);
            } else if sym.symbol_type != SymbolType::Isbn10 {
                ean.push(id);
            }
        }
        let ([ean], [addon]) = (ean.as_slice(), addon.as_slice()) else {
            return;
        };
        let (Some(main), Some(extra)) = (self.arena.symbol_data(*ean), self.arena.symbol_data(*addon))
        else {
            return;
        };

        let mut data = main.data.clone();
        data.extend_from_slice(&extra.data);
        let mut sym = SymbolData::new(main.symbol_type, data);
        sym.addon = Addon::for_type(extra.symbol_type);
        sym.modifiers = main.modifiers;
        sym.orient = main.orient;
        sym.time = self.time as u64;
        sym.pts = main.pts.iter().chain(&extra.pts).copied().collect();
        zprintf!(1, "composite {}{}", sym.symbol_type, sym.addon.name());

        let components = self.arena.alloc_set();
        for id in [*ean, *addon] {
            if self.arena.push(components, id).is_err() || self.arena.remove(frame, id).is_err() {
                log::warn!("composite component vanished");
            }
        }
        sym.components = Some(components);
        let uncertainty = self.config.uncertainty(SymbolType::Composite);
        self.add_symbol(frame, sym, uncertainty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_counts_climb_on_close_frames() {
        let mut cache = ResultCache::default();
        assert_eq!(cache.update(SymbolType::Code128, b"x", 0, 0), 0);
        assert_eq!(cache.update(SymbolType::Code128, b"x", 100, 0), 1);
        assert_eq!(cache.update(SymbolType::Code128, b"x", 200, 0), 2);
        // a different payload has its own history
        assert_eq!(cache.update(SymbolType::Code128, b"y", 300, 0), 0);
    }

    #[test]
    fn test_cache_tentative_until_confirmed() {
        let mut cache = ResultCache::default();
        assert_eq!(cache.update(SymbolType::Ean13, b"1", 0, 2), -2);
        assert_eq!(cache.update(SymbolType::Ean13, b"1", 100, 2), -1);
        assert_eq!(cache.update(SymbolType::Ean13, b"1", 200, 2), 0);
        assert_eq!(cache.update(SymbolType::Ean13, b"1", 300, 2), 1);
    }

    #[test]
    fn test_cache_gaps() {
        let mut cache = ResultCache::default();
        assert_eq!(cache.update(SymbolType::Code39, b"A", 0, 1), -1);
        // seen again after the proximity window: still tentative
        assert_eq!(cache.update(SymbolType::Code39, b"A", 1500, 1), -1);
        // after the hysteresis window the count restarts
        assert_eq!(cache.update(SymbolType::Code39, b"A", 1600, 1), 0);
        assert_eq!(cache.update(SymbolType::Code39, b"A", 3700, 1), -1);
        // entries past the timeout are forgotten
        assert_eq!(cache.update(SymbolType::Code39, b"A", 9000, 1), -1);
        assert_eq!(cache.entries.len(), 1);
    }

    #[test]
    fn test_scanner_settings_need_scanner_symbology() {
        let mut scanner = ImageScanner::new();
        scanner
            .set_config(SymbolType::Partial, Config::XDensity, 3)
            .unwrap();
        scanner
            .set_config(SymbolType::None, Config::TestInverted, 1)
            .unwrap();
        assert_eq!(scanner.config(SymbolType::Partial, Config::XDensity), Ok(3));
        assert_eq!(scanner.config(SymbolType::None, Config::TestInverted), Ok(1));

        assert_eq!(
            scanner.set_config(SymbolType::Code39, Config::Position, 0),
            Err(Error::Unsupported)
        );
        assert_eq!(
            scanner.set_config(SymbolType::Partial, Config::Position, 2),
            Err(Error::Invalid)
        );
        assert_eq!(
            scanner.set_config(SymbolType::Partial, Config::YDensity, -1),
            Err(Error::Invalid)
        );
        assert_eq!(scanner.config(SymbolType::Partial, Config::Position), Ok(1));
        assert_eq!(scanner.error().code(), Error::Invalid.code());
    }

    #[test]
    fn test_uncertainty_and_composite_settings() {
        let mut scanner = ImageScanner::new();
        assert_eq!(scanner.config(SymbolType::Ean13, Config::Uncertainty), Ok(2));
        scanner
            .set_config(SymbolType::Ean13, Config::Uncertainty, 0)
            .unwrap();
        assert_eq!(scanner.config(SymbolType::Ean13, Config::Uncertainty), Ok(0));
        assert_eq!(scanner.config(SymbolType::Ean8, Config::Uncertainty), Ok(2));
        assert_eq!(
            scanner.config(SymbolType::Partial, Config::Uncertainty),
            Err(Error::Unsupported)
        );

        assert_eq!(scanner.config(SymbolType::Composite, Config::Enable), Ok(0));
        scanner.parse_config("composite.enable").unwrap();
        assert_eq!(scanner.config(SymbolType::Composite, Config::Enable), Ok(1));
        assert_eq!(
            scanner.set_config(SymbolType::Composite, Config::MinLen, 2),
            Err(Error::Unsupported)
        );
    }

    #[test]
    fn test_parse_failure_is_distinct() {
        let mut scanner = ImageScanner::new();
        let err = scanner.parse_config("code39.bogus").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(
            scanner.parse_config("qrcode.enable"),
            Err(Error::Unsupported)
        );
        assert_eq!(scanner.config(SymbolType::Code39, Config::Enable), Ok(1));
    }

    #[test]
    fn test_blank_image_has_no_results() {
        let mut scanner = ImageScanner::new();
        let mut img = Image::from_gray(&[200; 40 * 30], 40, 30).unwrap();
        assert_eq!(scanner.scan_image(&mut img).unwrap(), 0);
        let set = img.symbols().unwrap();
        assert_eq!(scanner.symbols().set_refcount(set), Some(2));
        assert!(scanner.results().unwrap().is_empty());

        scanner.recycle_image(&mut img);
        assert!(img.symbols().is_none());
        assert_eq!(scanner.symbols().set_refcount(set), Some(1));
    }
}
