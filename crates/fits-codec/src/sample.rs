//! Pixel sample kinds and the per-sample / per-scanline codecs.

use std::io::Read;

use bytemuck::pod_collect_to_vec;

use crate::endian::Endian;
use crate::error::{CorruptReason, Error, ResourceReason, Result};
use crate::io::Blob;
use crate::quantize::{scale_quantum_to_depth, Quantum, QUANTUM_RANGE};

const VALID_BITPIX: [i64; 6] = [8, 16, 32, 64, -32, -64];

/// Numeric type of one stored sample, chosen once from BITPIX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl SampleKind {
    /// Map a BITPIX value to its sample kind.
    pub fn from_bitpix(bitpix: i64) -> Result<Self> {
        match bitpix {
            8 => Ok(SampleKind::U8),
            16 => Ok(SampleKind::I16),
            32 => Ok(SampleKind::I32),
            64 => Ok(SampleKind::I64),
            -32 => Ok(SampleKind::F32),
            -64 => Ok(SampleKind::F64),
            other => Err(Error::InvalidBitpix(other)),
        }
    }

    /// Returns `true` for the six BITPIX values FITS defines.
    pub fn is_valid_bitpix(bitpix: i64) -> bool {
        VALID_BITPIX.contains(&bitpix)
    }

    pub fn bitpix(self) -> i64 {
        match self {
            SampleKind::U8 => 8,
            SampleKind::I16 => 16,
            SampleKind::I32 => 32,
            SampleKind::I64 => 64,
            SampleKind::F32 => -32,
            SampleKind::F64 => -64,
        }
    }

    /// Sample width in bytes.
    pub fn width(self) -> usize {
        (self.bitpix().unsigned_abs() / 8) as usize
    }

    /// Sample width in bits.
    pub fn depth(self) -> u32 {
        self.width() as u32 * 8
    }

    pub fn is_float(self) -> bool {
        matches!(self, SampleKind::F32 | SampleKind::F64)
    }

    /// Integer encodings wider than a byte are stored with the sign bit
    /// flipped on output.
    pub fn needs_unsigned_bias(self) -> bool {
        matches!(self, SampleKind::I16 | SampleKind::I32 | SampleKind::I64)
    }

    /// Decode one sample from the start of `buf`.
    #[inline]
    pub fn decode(self, buf: &[u8], endian: Endian) -> f64 {
        match self {
            SampleKind::U8 => f64::from(buf[0]),
            SampleKind::I16 => f64::from(endian.read_i16(buf)),
            SampleKind::I32 => f64::from(endian.read_i32(buf)),
            SampleKind::I64 => endian.read_i64(buf) as f64,
            SampleKind::F32 => f64::from(endian.read_f32(buf)),
            SampleKind::F64 => endian.read_f64(buf),
        }
    }
}

/// Read a single sample, widened to `f64`.
pub fn read_sample<R: Read>(blob: &mut Blob<R>, kind: SampleKind, endian: Endian) -> Result<f64> {
    let mut buf = [0u8; 8];
    let buf = &mut buf[..kind.width()];
    if !blob.read_full(buf)? {
        return Err(Error::corrupt(CorruptReason::UnexpectedEndOfFile, blob.tell()));
    }
    Ok(kind.decode(buf, endian))
}

/// Read one scanline of `columns` samples in a single request.
pub fn read_row<R: Read>(
    blob: &mut Blob<R>,
    kind: SampleKind,
    endian: Endian,
    columns: usize,
) -> Result<Vec<f64>> {
    let len = columns
        .checked_mul(kind.width())
        .ok_or(Error::ResourceLimit(ResourceReason::MemoryAllocationFailed))?;
    let mut raw = Vec::new();
    raw.try_reserve_exact(len)
        .map_err(|_| Error::ResourceLimit(ResourceReason::MemoryAllocationFailed))?;
    raw.resize(len, 0u8);
    if !blob.read_full(&mut raw)? {
        return Err(Error::corrupt(CorruptReason::UnexpectedEndOfFile, blob.tell()));
    }

    let samples = match kind {
        SampleKind::U8 => raw.iter().map(|&b| f64::from(b)).collect(),
        SampleKind::I16 => {
            let values: Vec<i16> = pod_collect_to_vec(&raw);
            values
                .into_iter()
                .map(|v| f64::from(endian.i16_to_native(v)))
                .collect()
        }
        SampleKind::I32 => {
            let values: Vec<i32> = pod_collect_to_vec(&raw);
            values
                .into_iter()
                .map(|v| f64::from(endian.i32_to_native(v)))
                .collect()
        }
        SampleKind::I64 => {
            let values: Vec<i64> = pod_collect_to_vec(&raw);
            values
                .into_iter()
                .map(|v| endian.i64_to_native(v) as f64)
                .collect()
        }
        SampleKind::F32 => {
            let values: Vec<f32> = pod_collect_to_vec(&raw);
            values
                .into_iter()
                .map(|v| f64::from(endian.f32_to_native(v)))
                .collect()
        }
        SampleKind::F64 => {
            let values: Vec<f64> = pod_collect_to_vec(&raw);
            values
                .into_iter()
                .map(|v| endian.f64_to_native(v))
                .collect()
        }
    };
    Ok(samples)
}

/// Flip the most significant bit of every `width`-byte sample in `buf`.
///
/// Turns unsigned values into the signed offset-from-midpoint form FITS
/// stores (BZERO = 2^(bits-1)).
pub fn apply_unsigned_bias(buf: &mut [u8], width: usize, endian: Endian) {
    let msb = endian.msb_index(width);
    for sample in buf.chunks_exact_mut(width) {
        sample[msb] ^= 0x80;
    }
}

/// Encode one scanline of quanta into `out` (cleared first).
///
/// Integer kinds store the quantum rescaled to the kind's bit depth; float
/// kinds store it normalized to `[0, 1]`.
pub fn encode_row<I>(kind: SampleKind, endian: Endian, quanta: I, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = Quantum>,
{
    out.clear();
    let width = kind.width();
    let depth = kind.depth();
    let mut sample = [0u8; 8];
    for q in quanta {
        match kind {
            SampleKind::U8 => sample[0] = scale_quantum_to_depth(q, depth) as u8,
            SampleKind::I16 => {
                endian.write_u16(&mut sample, scale_quantum_to_depth(q, depth) as u16)
            }
            SampleKind::I32 => {
                endian.write_u32(&mut sample, scale_quantum_to_depth(q, depth) as u32)
            }
            SampleKind::I64 => endian.write_u64(&mut sample, scale_quantum_to_depth(q, depth)),
            SampleKind::F32 => endian.write_f32(&mut sample, (f64::from(q) / QUANTUM_RANGE) as f32),
            SampleKind::F64 => endian.write_f64(&mut sample, f64::from(q) / QUANTUM_RANGE),
        }
        out.extend_from_slice(&sample[..width]);
    }
    if kind.needs_unsigned_bias() {
        apply_unsigned_bias(out, width, endian);
    }
}
