//! In-memory frames produced by the decoder and consumed by the encoder.

use std::collections::BTreeMap;

use crate::endian::Endian;
use crate::error::{Error, ResourceReason, Result};
use crate::quantize::Quantum;

/// One RGB pixel in quantum units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub red: Quantum,
    pub green: Quantum,
    pub blue: Quantum,
}

impl Pixel {
    /// A gray pixel with all channels set to `q`.
    pub const fn gray(q: Quantum) -> Self {
        Pixel {
            red: q,
            green: q,
            blue: q,
        }
    }

    /// Returns `true` if all three channels are equal.
    pub fn is_gray(&self) -> bool {
        self.red == self.green && self.green == self.blue
    }
}

/// Colorspace tag carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colorspace {
    #[default]
    Gray,
    Rgb,
}

/// One scene: a `columns x rows` grid of pixels, rows stored top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: usize,
    rows: usize,
    pixels: Vec<Pixel>,
    /// Bits per sample of the source or target encoding.
    pub depth: u32,
    pub endian: Endian,
    pub colorspace: Colorspace,
    /// Index of this scene within its file.
    pub scene: usize,
    /// Named string properties (`fits:<keyword>`, `comment`, ...).
    pub properties: BTreeMap<String, String>,
}

impl Frame {
    /// Allocate a black frame of the given size.
    ///
    /// Fails with [`Error::ResourceLimit`] when the pixel buffer cannot be
    /// allocated, and with [`Error::Unsupported`] for an empty geometry.
    pub fn new(columns: usize, rows: usize, depth: u32) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(Error::Unsupported("frame must have at least one pixel"));
        }
        let count = columns
            .checked_mul(rows)
            .ok_or(Error::ResourceLimit(ResourceReason::MemoryAllocationFailed))?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(count)
            .map_err(|_| Error::ResourceLimit(ResourceReason::MemoryAllocationFailed))?;
        pixels.resize(count, Pixel::default());
        Ok(Frame {
            columns,
            rows,
            pixels,
            depth,
            endian: Endian::default(),
            colorspace: Colorspace::Gray,
            scene: 0,
            properties: BTreeMap::new(),
        })
    }

    /// Build a grayscale frame from row-major quantum values.
    pub fn from_gray(columns: usize, rows: usize, depth: u32, values: &[Quantum]) -> Result<Self> {
        let mut frame = Frame::new(columns, rows, depth)?;
        if values.len() != frame.pixels.len() {
            return Err(Error::Unsupported("pixel count does not match geometry"));
        }
        for (dst, &q) in frame.pixels.iter_mut().zip(values) {
            *dst = Pixel::gray(q);
        }
        Ok(frame)
    }

    /// Build an RGB frame from row-major pixels.
    pub fn from_pixels(
        columns: usize,
        rows: usize,
        depth: u32,
        pixels: Vec<Pixel>,
    ) -> Result<Self> {
        if columns == 0 || rows == 0 || columns.checked_mul(rows) != Some(pixels.len()) {
            return Err(Error::Unsupported("pixel count does not match geometry"));
        }
        Ok(Frame {
            columns,
            rows,
            pixels,
            depth,
            endian: Endian::default(),
            colorspace: Colorspace::Rgb,
            scene: 0,
            properties: BTreeMap::new(),
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// All pixels, row-major from the top row.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y` (row 0 is the top).
    pub fn pixel(&self, x: usize, y: usize) -> Option<Pixel> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        Some(self.pixels[y * self.columns + x])
    }

    /// Borrow scanline `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= self.rows()`. Use [`Frame::pixel`] for a checked
    /// lookup.
    pub fn row(&self, y: usize) -> &[Pixel] {
        let start = y * self.columns;
        &self.pixels[start..start + self.columns]
    }

    /// Mutably borrow scanline `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= self.rows()`.
    pub fn row_mut(&mut self, y: usize) -> &mut [Pixel] {
        let start = y * self.columns;
        &mut self.pixels[start..start + self.columns]
    }

    /// Returns `true` if the frame is tagged gray or every pixel has equal
    /// channels.
    pub fn is_gray(&self) -> bool {
        self.colorspace == Colorspace::Gray || self.pixels.iter().all(Pixel::is_gray)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }
}

/// Ordered list of frames, first scene first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageList {
    frames: Vec<Frame>,
}

impl ImageList {
    pub fn new() -> Self {
        ImageList::default()
    }

    /// Append a frame as the next scene.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl From<Frame> for ImageList {
    fn from(frame: Frame) -> Self {
        ImageList {
            frames: vec![frame],
        }
    }
}

impl From<Vec<Frame>> for ImageList {
    fn from(frames: Vec<Frame>) -> Self {
        ImageList { frames }
    }
}

impl<'a> IntoIterator for &'a ImageList {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
