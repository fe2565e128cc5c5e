//! Frames to a FITS stream.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, instrument};

use crate::block::{pad_to_block_boundary, DATA_PAD_BYTE};
use crate::endian::Endian;
use crate::error::{Error, Result};
use crate::header::{serialize_header, Card};
use crate::image::{Frame, ImageList, Pixel};
use crate::io::Blob;
use crate::progress::{NoProgress, Progress};
use crate::quantize::{quantum_range, Quantum};
use crate::sample::{encode_row, SampleKind};
use crate::value::Value;

/// Knobs for an encode call.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Output bits per sample. Defaults to the first frame's depth rounded up
    /// to 8 or 16 (32 for floating-point output).
    pub depth: Option<u32>,
    /// Write IEEE-754 samples normalized to `[0, 1]`; needs depth 32 or 64.
    pub floating_point: bool,
    pub endian: Endian,
    /// Text of the `HISTORY` record; empty writes none.
    pub history: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            depth: None,
            floating_point: false,
            endian: Endian::Msb,
            history: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl EncodeOptions {
    fn sample_kind(&self, frame_depth: u32) -> Result<SampleKind> {
        if self.floating_point {
            return match self.depth.unwrap_or(32) {
                32 => Ok(SampleKind::F32),
                64 => Ok(SampleKind::F64),
                _ => Err(Error::Unsupported("floating-point output needs depth 32 or 64")),
            };
        }
        let depth = self.depth.unwrap_or(if frame_depth <= 8 { 8 } else { 16 });
        match depth {
            8 => Ok(SampleKind::U8),
            16 => Ok(SampleKind::I16),
            32 => Ok(SampleKind::I32),
            64 => Ok(SampleKind::I64),
            _ => Err(Error::Unsupported("integer output depth must be 8, 16, 32 or 64")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn pick(self, pixel: &Pixel) -> Quantum {
        match self {
            Channel::Red => pixel.red,
            Channel::Green => pixel.green,
            Channel::Blue => pixel.blue,
        }
    }
}

/// Planes to write, in file order, plus whether NAXIS3 is needed.
struct Layout<'a> {
    columns: usize,
    rows: usize,
    planes: Vec<(&'a Frame, Channel)>,
    cube: bool,
}

impl<'a> Layout<'a> {
    fn plan(images: &'a ImageList) -> Result<Self> {
        let first = images
            .first()
            .ok_or(Error::Unsupported("no frames to encode"))?;
        let (columns, rows) = (first.columns(), first.rows());

        if images.len() == 1 {
            let planes = if first.is_gray() {
                vec![(first, Channel::Red)]
            } else {
                vec![
                    (first, Channel::Red),
                    (first, Channel::Green),
                    (first, Channel::Blue),
                ]
            };
            let cube = planes.len() > 1;
            return Ok(Layout {
                columns,
                rows,
                planes,
                cube,
            });
        }

        let mut planes = Vec::with_capacity(images.len());
        for frame in images {
            if !frame.is_gray() {
                return Err(Error::Unsupported("multi-frame output must be grayscale"));
            }
            if frame.columns() != columns || frame.rows() != rows {
                return Err(Error::Unsupported("multi-frame output needs equal geometry"));
            }
            planes.push((frame, Channel::Red));
        }
        Ok(Layout {
            columns,
            rows,
            planes,
            cube: true,
        })
    }

    fn cards(&self, kind: SampleKind, options: &EncodeOptions) -> Vec<Card> {
        let depth = kind.depth();
        let naxis = if self.cube { 3 } else { 2 };
        let mut cards = vec![
            Card::new("SIMPLE", Value::Logical(true)).with_comment("conforms to FITS standard"),
            Card::new("BITPIX", Value::Integer(kind.bitpix())),
            Card::new("NAXIS", Value::Integer(naxis)).with_comment("number of axes"),
            Card::new("NAXIS1", Value::Integer(self.columns as i64)).with_comment("columns"),
            Card::new("NAXIS2", Value::Integer(self.rows as i64)).with_comment("rows"),
        ];
        if self.cube {
            let planes = Value::Integer(self.planes.len() as i64);
            cards.push(Card::new("NAXIS3", planes).with_comment("planes"));
        }
        let (zero, max) = if kind.is_float() {
            (0.0, 1.0)
        } else if depth > 8 {
            ((1u64 << (depth - 1)) as f64, quantum_range(depth))
        } else {
            (0.0, quantum_range(depth))
        };
        cards.push(Card::new("BSCALE", Value::Float(1.0)));
        cards.push(Card::new("BZERO", Value::Float(zero)));
        cards.push(Card::new("DATAMAX", Value::Float(max)));
        cards.push(Card::new("DATAMIN", Value::Float(0.0)));
        if options.endian == Endian::Lsb {
            let order = Value::String(String::from("SMALL"));
            cards.push(Card::new("XENDIAN", order).with_comment("byte order"));
        }
        if !options.history.is_empty() {
            cards.push(Card::commentary("HISTORY", &options.history));
        }
        cards
    }
}

/// Encode `images` as a single FITS primary image.
pub fn encode<W: Write>(writer: W, images: &ImageList, options: &EncodeOptions) -> Result<()> {
    encode_with_progress(writer, images, options, &mut NoProgress)
}

/// Encode like [`encode`], reporting each scanline to `progress`.
#[instrument(skip_all, fields(frames = images.len()))]
pub fn encode_with_progress<W: Write>(
    writer: W,
    images: &ImageList,
    options: &EncodeOptions,
    progress: &mut dyn Progress,
) -> Result<()> {
    let layout = Layout::plan(images)?;
    let first_depth = layout.planes[0].0.depth;
    let kind = options.sample_kind(first_depth)?;
    debug!(
        bitpix = kind.bitpix(),
        columns = layout.columns,
        rows = layout.rows,
        planes = layout.planes.len(),
        endian = ?options.endian,
        "encoding FITS image"
    );

    let mut blob = Blob::new(writer);
    blob.write_all(&serialize_header(&layout.cards(kind, options)))?;

    let total = (layout.rows * layout.planes.len()) as u64;
    let mut done = 0u64;
    let mut buf = Vec::with_capacity(layout.columns * kind.width());
    for &(frame, channel) in &layout.planes {
        // Bottom row first.
        for y in (0..layout.rows).rev() {
            let quanta = frame.row(y).iter().map(|p| channel.pick(p));
            encode_row(kind, options.endian, quanta, &mut buf);
            blob.write_all(&buf)?;
            if !progress.report(done, total) {
                return Err(Error::Cancelled);
            }
            done += 1;
        }
    }
    pad_to_block_boundary(&mut blob, DATA_PAD_BYTE)?;
    blob.flush()?;
    debug!(bytes = blob.tell(), "wrote FITS image");
    Ok(())
}

/// Create `path` and encode into it.
pub fn write_file<P: AsRef<Path>>(
    path: P,
    images: &ImageList,
    options: &EncodeOptions,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    encode(BufWriter::new(file), images, options)
}
