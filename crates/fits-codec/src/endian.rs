//! Byte order handling for FITS pixel data.
//!
//! Standard FITS stores binary data most-significant byte first. The `XENDIAN`
//! keyword lets a header declare least-significant-byte-first data instead, so
//! every conversion here is parameterized by [`Endian`].

/// Byte order of the pixel data unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Most significant byte first (the FITS standard).
    #[default]
    Msb,
    /// Least significant byte first.
    Lsb,
}

impl Endian {
    /// Read an `i16` from the first 2 bytes of the slice.
    #[inline]
    pub fn read_i16(self, buf: &[u8]) -> i16 {
        let bytes = [buf[0], buf[1]];
        match self {
            Endian::Msb => i16::from_be_bytes(bytes),
            Endian::Lsb => i16::from_le_bytes(bytes),
        }
    }

    /// Read an `i32` from the first 4 bytes of the slice.
    #[inline]
    pub fn read_i32(self, buf: &[u8]) -> i32 {
        let bytes = [buf[0], buf[1], buf[2], buf[3]];
        match self {
            Endian::Msb => i32::from_be_bytes(bytes),
            Endian::Lsb => i32::from_le_bytes(bytes),
        }
    }

    /// Read an `i64` from the first 8 bytes of the slice.
    #[inline]
    pub fn read_i64(self, buf: &[u8]) -> i64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&buf[..8]);
        match self {
            Endian::Msb => i64::from_be_bytes(bytes),
            Endian::Lsb => i64::from_le_bytes(bytes),
        }
    }

    /// Read an IEEE 754 `f32` from the first 4 bytes of the slice.
    #[inline]
    pub fn read_f32(self, buf: &[u8]) -> f32 {
        f32::from_bits(self.read_i32(buf) as u32)
    }

    /// Read an IEEE 754 `f64` from the first 8 bytes of the slice.
    #[inline]
    pub fn read_f64(self, buf: &[u8]) -> f64 {
        f64::from_bits(self.read_i64(buf) as u64)
    }

    /// Write a `u16` into the first 2 bytes of the slice.
    #[inline]
    pub fn write_u16(self, buf: &mut [u8], val: u16) {
        let bytes = match self {
            Endian::Msb => val.to_be_bytes(),
            Endian::Lsb => val.to_le_bytes(),
        };
        buf[..2].copy_from_slice(&bytes);
    }

    /// Write a `u32` into the first 4 bytes of the slice.
    #[inline]
    pub fn write_u32(self, buf: &mut [u8], val: u32) {
        let bytes = match self {
            Endian::Msb => val.to_be_bytes(),
            Endian::Lsb => val.to_le_bytes(),
        };
        buf[..4].copy_from_slice(&bytes);
    }

    /// Write a `u64` into the first 8 bytes of the slice.
    #[inline]
    pub fn write_u64(self, buf: &mut [u8], val: u64) {
        let bytes = match self {
            Endian::Msb => val.to_be_bytes(),
            Endian::Lsb => val.to_le_bytes(),
        };
        buf[..8].copy_from_slice(&bytes);
    }

    /// Write an `f32` into the first 4 bytes of the slice.
    #[inline]
    pub fn write_f32(self, buf: &mut [u8], val: f32) {
        self.write_u32(buf, val.to_bits());
    }

    /// Write an `f64` into the first 8 bytes of the slice.
    #[inline]
    pub fn write_f64(self, buf: &mut [u8], val: f64) {
        self.write_u64(buf, val.to_bits());
    }

    /// Index of the most significant byte inside a sample of `width` bytes.
    #[inline]
    pub fn msb_index(self, width: usize) -> usize {
        match self {
            Endian::Msb => 0,
            Endian::Lsb => width - 1,
        }
    }

    /// Convert an `i16` loaded with native layout from this byte order.
    #[inline]
    pub fn i16_to_native(self, v: i16) -> i16 {
        match self {
            Endian::Msb => i16::from_be(v),
            Endian::Lsb => i16::from_le(v),
        }
    }

    /// Convert an `i32` loaded with native layout from this byte order.
    #[inline]
    pub fn i32_to_native(self, v: i32) -> i32 {
        match self {
            Endian::Msb => i32::from_be(v),
            Endian::Lsb => i32::from_le(v),
        }
    }

    /// Convert an `i64` loaded with native layout from this byte order.
    #[inline]
    pub fn i64_to_native(self, v: i64) -> i64 {
        match self {
            Endian::Msb => i64::from_be(v),
            Endian::Lsb => i64::from_le(v),
        }
    }

    /// Convert an `f32` loaded with native layout from this byte order.
    #[inline]
    pub fn f32_to_native(self, v: f32) -> f32 {
        f32::from_bits(self.i32_to_native(v.to_bits() as i32) as u32)
    }

    /// Convert an `f64` loaded with native layout from this byte order.
    #[inline]
    pub fn f64_to_native(self, v: f64) -> f64 {
        f64::from_bits(self.i64_to_native(v.to_bits() as i64) as u64)
    }
}
