//! Min/max scan over a scene and per-scene data range resolution.

use std::io::{Read, Seek};

use tracing::debug;

use crate::endian::Endian;
use crate::error::Result;
use crate::header::ImageHeader;
use crate::io::Blob;
use crate::quantize::{quantum_range, DataRange};
use crate::sample::{read_row, SampleKind};

/// Samples pulled per read during the scan.
const SCAN_CHUNK: u64 = 4096;

/// Scan `count` samples from the current position and return `(min, max)`.
///
/// NaN samples are skipped; if every sample is NaN (or `count` is zero) the
/// result is `(0.0, 0.0)`. The stream position is restored afterwards, on
/// error paths as well.
pub fn compute_extrema<R: Read + Seek>(
    blob: &mut Blob<R>,
    kind: SampleKind,
    endian: Endian,
    count: u64,
) -> Result<(f64, f64)> {
    let mut mark = blob.mark();
    let origin = mark.origin();
    let mut extrema: Option<(f64, f64)> = None;
    let mut remaining = count;
    while remaining > 0 {
        let n = remaining.min(SCAN_CHUNK);
        let chunk = read_row(&mut *mark, kind, endian, n as usize)?;
        for v in chunk.into_iter().filter(|v| !v.is_nan()) {
            extrema = Some(match extrema {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        remaining -= n;
    }
    mark.restore()?;
    let (min, max) = extrema.unwrap_or((0.0, 0.0));
    debug!(offset = origin, count, min, max, "scanned sample extrema");
    Ok((min, max))
}

/// Decide the normalization range for the scene starting at the current
/// position.
///
/// An undeclared range (both `DATAMIN` and `DATAMAX` zero) is measured for
/// floating-point data and taken as the full unsigned range of the sample
/// width for integer data. A declared minimum without a maximum gets the full
/// width as its maximum.
pub fn resolve_range<R: Read + Seek>(
    blob: &mut Blob<R>,
    header: &ImageHeader,
    kind: SampleKind,
) -> Result<DataRange> {
    let full = quantum_range(kind.depth());
    let range = if header.min_data == 0.0 && header.max_data == 0.0 {
        if kind.is_float() {
            let (min, max) =
                compute_extrema(blob, kind, header.endian, header.pixels_per_scene())?;
            DataRange { min, max }
        } else {
            DataRange {
                min: 0.0,
                max: full,
            }
        }
    } else if header.max_data == 0.0 {
        DataRange {
            min: header.min_data,
            max: full,
        }
    } else {
        DataRange {
            min: header.min_data,
            max: header.max_data,
        }
    };
    debug!(min = range.min, max = range.max, "resolved data range");
    Ok(range)
}
