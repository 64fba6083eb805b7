//! Grayscale image container

use std::any::Any;
use std::fmt;

use crate::symbol_set::SymbolSetId;
use crate::{Error, Result};

/// Create a fourcc code from 4 bytes
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24)
}

/// 8-bit grayscale
pub const Y800: u32 = fourcc(b"Y800");
/// Same layout as [`Y800`]
pub const GREY: u32 = fourcc(b"GREY");

/// An 8-bit grayscale image to be scanned
pub struct Image {
    width: u32,
    height: u32,
    format: u32,
    data: Vec<u8>,
    sequence: u32,
    userdata: Option<Box<dyn Any + Send>>,
    /// Result set reference held since the last scan
    pub(crate) syms: Option<SymbolSetId>,
}

impl Image {
    /// Create an image from tightly packed grayscale data
    pub fn from_gray(data: &[u8], width: u32, height: u32) -> Result<Self> {
        Self::from_gray_with_stride(data, width, height, width)
    }

    /// Create an image from grayscale rows `stride` bytes apart
    ///
    /// Padding at the end of each row is dropped.
    pub fn from_gray_with_stride(data: &[u8], width: u32, height: u32, stride: u32) -> Result<Self> {
        if stride < width {
            return Err(Error::Invalid);
        }
        let (w, h, stride) = (width as usize, height as usize, stride as usize);
        let needed = match h {
            0 => 0,
            _ => stride
                .checked_mul(h - 1)
                .and_then(|n| n.checked_add(w))
                .ok_or(Error::Invalid)?,
        };
        if data.len() < needed || (stride == w && data.len() != needed) {
            return Err(Error::Invalid);
        }

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(w * h)
            .map_err(|_| Error::OutOfMemory)?;
        if stride == w {
            pixels.extend_from_slice(data);
        } else {
            for row in data.chunks(stride).take(h) {
                pixels.extend_from_slice(&row[..w]);
            }
        }

        Ok(Self {
            width,
            height,
            format: Y800,
            data: pixels,
            sequence: 0,
            userdata: None,
            syms: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel data, one byte per sample, row major
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fourcc of the pixel format
    pub fn format(&self) -> u32 {
        self.format
    }

    /// Relabel the pixel format; only grayscale layouts are accepted
    pub fn set_format(&mut self, format: u32) -> Result<()> {
        match format {
            Y800 | GREY => {
                self.format = format;
                Ok(())
            }
            _ => Err(Error::Unsupported),
        }
    }

    /// Frame number, for video sources
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn set_sequence(&mut self, sequence: u32) {
        self.sequence = sequence;
    }

    pub fn set_userdata(&mut self, userdata: Option<Box<dyn Any + Send>>) {
        self.userdata = userdata;
    }

    pub fn userdata(&self) -> Option<&(dyn Any + Send)> {
        self.userdata.as_deref()
    }

    /// Results of the last scan, resolved through the scanner's arena
    ///
    /// The handle stays valid until this image is recycled or rescanned, or
    /// the scanner moves on to another image; retain the set through
    /// [`SymbolArena::symbol_set_ref`](crate::SymbolArena::symbol_set_ref)
    /// to keep it longer.
    pub fn symbols(&self) -> Option<SymbolSetId> {
        self.syms
    }

    /// Copy of the pixel data with every sample inverted
    pub(crate) fn inverted_data(&self) -> Vec<u8> {
        self.data.iter().map(|&p| !p).collect()
    }
}

impl From<&::image::GrayImage> for Image {
    fn from(img: &::image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: Y800,
            data: img.as_raw().clone(),
            sequence: 0,
            userdata: None,
            syms: None,
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sequence", &self.sequence)
            .field("syms", &self.syms)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_gray_checks_size() {
        assert!(Image::from_gray(&[0; 12], 4, 3).is_ok());
        assert_eq!(Image::from_gray(&[0; 11], 4, 3).unwrap_err(), Error::Invalid);
        assert_eq!(Image::from_gray(&[0; 13], 4, 3).unwrap_err(), Error::Invalid);
    }

    #[test]
    fn test_stride_drops_padding() {
        let data = [1, 2, 9, 9, 3, 4, 9, 9, 5, 6];
        let img = Image::from_gray_with_stride(&data, 2, 3, 4).unwrap();
        assert_eq!(img.data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(
            Image::from_gray_with_stride(&data, 5, 2, 4).unwrap_err(),
            Error::Invalid
        );
    }

    #[test]
    fn test_only_grayscale_formats() {
        let mut img = Image::from_gray(&[0; 4], 2, 2).unwrap();
        assert_eq!(img.format(), Y800);
        img.set_format(GREY).unwrap();
        assert_eq!(img.format(), GREY);
        assert_eq!(img.set_format(fourcc(b"YUYV")), Err(Error::Unsupported));
        assert_eq!(img.format(), GREY);
    }

    #[test]
    fn test_inverted_data() {
        let img = Image::from_gray(&[0, 255, 10, 200], 2, 2).unwrap();
        assert_eq!(img.inverted_data(), vec![255, 0, 245, 55]);
    }

    #[test]
    fn test_from_gray_image() {
        let gray = ::image::GrayImage::from_raw(3, 1, vec![7, 8, 9]).unwrap();
        let img = Image::from(&gray);
        assert_eq!((img.width(), img.height()), (3, 1));
        assert_eq!(img.data(), &[7, 8, 9]);
        assert!(img.symbols().is_none());
    }
}
