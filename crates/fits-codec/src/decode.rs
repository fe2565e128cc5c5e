//! FITS stream to frames.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::error::{Error, ResourceReason, Result};
use crate::header::{parse_header, ImageHeader};
use crate::image::{Colorspace, Frame, ImageList};
use crate::io::Blob;
use crate::progress::{NoProgress, Progress};
use crate::quantize::{DegenerateRange, Quantizer};
use crate::sample::{read_row, SampleKind};
use crate::stats::resolve_range;

/// Knobs for a decode call.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Name reported in corrupt-image errors.
    pub filename: Option<String>,
    /// Index of the first scene to decode.
    pub first_scene: usize,
    /// Maximum number of scenes to decode; 0 decodes all remaining scenes.
    pub number_scenes: usize,
    pub degenerate_range: DegenerateRange,
}

/// Frames decoded from one stream.
///
/// When a scene fails after at least one earlier scene was decoded, the
/// completed frames are kept and the failure is reported in `error`.
#[derive(Debug)]
pub struct Decoded {
    pub frames: ImageList,
    pub error: Option<Error>,
}

impl Decoded {
    /// Returns `true` if every requested scene was decoded.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Discard partial results, turning a trailing scene failure into an error.
    pub fn into_result(self) -> Result<ImageList> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.frames),
        }
    }
}

/// Decode every requested scene from a FITS stream.
pub fn decode<R: Read + Seek>(reader: R, options: &DecodeOptions) -> Result<Decoded> {
    decode_with_progress(reader, options, &mut NoProgress)
}

/// Decode like [`decode`], reporting each scanline to `progress`.
#[instrument(skip_all, fields(filename = options.filename.as_deref().unwrap_or("")))]
pub fn decode_with_progress<R: Read + Seek>(
    reader: R,
    options: &DecodeOptions,
    progress: &mut dyn Progress,
) -> Result<Decoded> {
    let name = options.filename.as_deref().unwrap_or("");
    let mut blob = Blob::at_current(reader)?;

    let header = parse_header(&mut blob).map_err(|e| e.with_filename(name))?;
    let kind = header.sample_kind()?;

    let total = usize::try_from(header.number_planes).unwrap_or(usize::MAX);
    let end = match options.number_scenes {
        0 => total,
        n => options.first_scene.saturating_add(n).min(total),
    };
    let scene_len = header
        .scene_byte_len()
        .ok_or(Error::ResourceLimit(ResourceReason::MemoryAllocationFailed))?;

    let mut frames = ImageList::new();
    for scene in 0..end {
        let result = if scene < options.first_scene {
            blob.skip(scene_len).map_err(Error::from)
        } else {
            match decode_scene(&mut blob, &header, kind, scene, options, progress) {
                Ok(frame) => {
                    frames.push(frame);
                    Ok(())
                }
                Err(err) => Err(err),
            }
        };
        if let Err(err) = result {
            let err = err.with_filename(name);
            if frames.is_empty() {
                return Err(err);
            }
            warn!(scene, error = %err, "scene failed, keeping earlier scenes");
            return Ok(Decoded {
                frames,
                error: Some(err),
            });
        }
    }

    debug!(scenes = frames.len(), "decoded FITS image");
    Ok(Decoded {
        frames,
        error: None,
    })
}

fn decode_scene<R: Read + Seek>(
    blob: &mut Blob<R>,
    header: &ImageHeader,
    kind: SampleKind,
    scene: usize,
    options: &DecodeOptions,
    progress: &mut dyn Progress,
) -> Result<Frame> {
    let too_large = || Error::ResourceLimit(ResourceReason::MemoryAllocationFailed);
    let columns = usize::try_from(header.columns).map_err(|_| too_large())?;
    let rows = usize::try_from(header.rows).map_err(|_| too_large())?;

    let mut frame = Frame::new(columns, rows, kind.depth())?;
    frame.endian = header.endian;
    frame.colorspace = Colorspace::Gray;
    frame.scene = scene;
    for (key, value) in &header.properties {
        frame.set_property(key.as_str(), value.as_str());
    }
    if let Some(comment) = &header.comment {
        frame.set_property("comment", comment.as_str());
    }

    let range = resolve_range(blob, header, kind)?;
    let quantizer = Quantizer::new(header.scale, header.zero, range, options.degenerate_range)?;

    // Storage rows run bottom to top.
    for r in 0..rows {
        let samples = read_row(blob, kind, header.endian, columns)?;
        let y = rows - 1 - r;
        for (dst, raw) in frame.row_mut(y).iter_mut().zip(samples) {
            *dst = quantizer.map_gray(raw);
        }
        if !progress.report(r as u64, rows as u64) {
            return Err(Error::Cancelled);
        }
    }
    debug!(scene, columns, rows, "decoded scene");
    Ok(frame)
}

/// Open `path` and decode it.
///
/// The path is used as the error-report filename unless `options` names one.
pub fn read_file<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Decoded> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut options = options.clone();
    if options.filename.is_none() {
        options.filename = Some(path.display().to_string());
    }
    decode(BufReader::new(file), &options)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::block::BLOCK_SIZE;
    use crate::error::CorruptReason;
    use crate::image::Pixel;
    use crate::quantize::Quantum;

    fn card(text: &str) -> Vec<u8> {
        let mut buf = vec![b' '; 80];
        buf[..text.len()].copy_from_slice(text.as_bytes());
        buf
    }

    fn fits(records: &[String], data: &[u8]) -> Vec<u8> {
        let mut out: Vec<u8> = records.iter().flat_map(|r| card(r)).collect();
        out.extend(card("END"));
        out.resize(out.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, b' ');
        out.extend_from_slice(data);
        out.resize(out.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE, 0);
        out
    }

    fn keywords(bitpix: i64, naxis: &[u64], extra: &[&str]) -> Vec<String> {
        let mut v = vec![
            format!("SIMPLE  = {:>20}", "T"),
            format!("BITPIX  = {bitpix:>20}"),
            format!("NAXIS   = {:>20}", naxis.len()),
        ];
        for (i, n) in naxis.iter().enumerate() {
            v.push(format!("NAXIS{:<3}= {n:>20}", i + 1));
        }
        v.extend(extra.iter().map(|s| s.to_string()));
        v
    }

    #[test]
    fn eight_bit_rows_are_flipped() {
        let data = [0u8, 255, 255, 0];
        let bytes = fits(&keywords(8, &[2, 2], &[]), &data);
        let decoded = decode(Cursor::new(bytes), &DecodeOptions::default()).unwrap();
        assert!(decoded.is_complete());
        let frame = decoded.frames.first().unwrap();
        assert_eq!(frame.depth, 8);
        assert_eq!(frame.row(1), &[Pixel::gray(0), Pixel::gray(Quantum::MAX)]);
        assert_eq!(frame.row(0), &[Pixel::gray(Quantum::MAX), Pixel::gray(0)]);
        assert_eq!(frame.property("fits:bitpix"), Some("8"));
    }

    #[test]
    fn float_data_is_measured() {
        let mut data = Vec::new();
        for v in [-1.0f32, 0.0, 0.5, 1.0] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        let bytes = fits(&keywords(-32, &[4, 1], &[]), &data);
        let frames = decode(Cursor::new(bytes), &DecodeOptions::default())
            .unwrap()
            .into_result()
            .unwrap();
        let frame = frames.first().unwrap();
        let row: Vec<Quantum> = frame.row(0).iter().map(|p| p.red).collect();
        assert_eq!(row[0], 0);
        assert_eq!(row[3], Quantum::MAX);
        assert_eq!(row[1], 32768);
    }

    #[test]
    fn lsb_samples_honoured() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-32768i16).to_le_bytes());
        data.extend_from_slice(&32767i16.to_le_bytes());
        let extra = ["BZERO   =              32768.0", "XENDIAN = 'SMALL   '"];
        let bytes = fits(&keywords(16, &[2, 1], &extra), &data);
        let frames = decode(Cursor::new(bytes), &DecodeOptions::default())
            .unwrap()
            .into_result()
            .unwrap();
        let frame = frames.first().unwrap();
        assert_eq!(frame.endian, crate::endian::Endian::Lsb);
        assert_eq!(frame.row(0), &[Pixel::gray(0), Pixel::gray(Quantum::MAX)]);
    }

    #[test]
    fn bscale_and_bzero_shift_raw_samples() {
        let extra = [
            "BSCALE  =                  2.0",
            "BZERO   =                 10.0",
        ];
        let bytes = fits(&keywords(8, &[3, 1], &extra), &[0, 50, 200]);
        let frames = decode(Cursor::new(bytes), &DecodeOptions::default())
            .unwrap()
            .into_result()
            .unwrap();
        let frame = frames.first().unwrap();
        let row: Vec<Quantum> = frame.row(0).iter().map(|p| p.red).collect();
        // 257 * (2 * raw + 10) over the full 8-bit range.
        assert_eq!(row, vec![2570, 28270, Quantum::MAX]);
        assert_eq!(frame.property("fits:bscale"), Some("2.0"));
    }

    #[test]
    fn scene_window_selects_planes() {
        let data = [10u8, 20, 30, 40];
        let bytes = fits(&keywords(8, &[1, 1, 4], &[]), &data);
        let options = DecodeOptions {
            first_scene: 1,
            number_scenes: 2,
            ..DecodeOptions::default()
        };
        let frames = decode(Cursor::new(bytes), &options)
            .unwrap()
            .into_result()
            .unwrap();
        let scenes: Vec<usize> = frames.iter().map(|f| f.scene).collect();
        assert_eq!(scenes, vec![1, 2]);
        assert_eq!(frames.get(0).unwrap().row(0)[0], Pixel::gray(20 * 257));
        assert_eq!(frames.get(1).unwrap().row(0)[0], Pixel::gray(30 * 257));
    }

    #[test]
    fn truncated_later_scene_keeps_earlier_frames() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut bytes = fits(&keywords(8, &[2, 2, 2], &[]), &data);
        bytes.truncate(BLOCK_SIZE + 6);
        let decoded = decode(Cursor::new(bytes), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.frames.len(), 1);
        let reason = decoded.error.unwrap().corrupt_reason();
        assert_eq!(reason, Some(CorruptReason::UnexpectedEndOfFile));
    }

    #[test]
    fn truncated_first_scene_is_error() {
        let mut bytes = fits(&keywords(16, &[4, 4], &[]), &[0u8; 32]);
        bytes.truncate(BLOCK_SIZE + 10);
        let options = DecodeOptions {
            filename: Some("short.fits".into()),
            ..DecodeOptions::default()
        };
        let err = decode(Cursor::new(bytes), &options).unwrap_err();
        let reason = err.corrupt_reason();
        assert_eq!(reason, Some(CorruptReason::UnexpectedEndOfFile));
        assert!(err.to_string().contains("short.fits"));
    }

    #[test]
    fn degenerate_range_policies() {
        let bytes = fits(&keywords(-64, &[2, 1], &[]), &[0u8; 16]);
        let frames = decode(Cursor::new(bytes.clone()), &DecodeOptions::default())
            .unwrap()
            .into_result()
            .unwrap();
        let first = frames.first().unwrap().row(0)[0];
        assert_eq!(first, Pixel::gray(Quantum::MAX / 2));

        let options = DecodeOptions {
            degenerate_range: DegenerateRange::Fail,
            ..DecodeOptions::default()
        };
        let err = decode(Cursor::new(bytes), &options).unwrap_err();
        assert!(matches!(err, Error::Domain { .. }));
    }

    #[test]
    fn progress_can_cancel() {
        let bytes = fits(&keywords(8, &[3, 3], &[]), &[0u8; 9]);
        let mut calls = 0;
        let mut cancel = |_row: u64, _total: u64| {
            calls += 1;
            calls < 2
        };
        let err =
            decode_with_progress(Cursor::new(bytes), &DecodeOptions::default(), &mut cancel)
                .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(calls, 2);
    }

    #[test]
    fn comment_property_attached() {
        let bytes = fits(
            &keywords(8, &[1, 1], &["COMMENT hello", "COMMENT world"]),
            &[7u8],
        );
        let frames = decode(Cursor::new(bytes), &DecodeOptions::default())
            .unwrap()
            .into_result()
            .unwrap();
        let comment = frames.first().unwrap().property("comment");
        assert_eq!(comment, Some("hello\nworld"));
    }

    #[test]
    fn missing_file_is_file_open() {
        let err = read_file("/nonexistent/dir/image.fits", &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, Error::FileOpen { .. }));
    }
}
