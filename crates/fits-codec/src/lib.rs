//! Reader and writer for FITS primary images.
//!
//! A FITS file is a sequence of 2880-byte blocks: header blocks of 80-byte
//! records, then big-endian pixel data. [`decode`] turns one into an
//! [`ImageList`] of grayscale frames in 16-bit quantum units; [`encode`] does
//! the reverse.

#[cfg(feature = "array")]
mod array;
pub mod block;
pub mod codec;
pub mod decode;
pub mod encode;
pub mod endian;
pub mod error;
pub mod header;
pub mod image;
pub mod io;
pub mod progress;
pub mod quantize;
pub mod sample;
pub mod stats;
pub mod value;

pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use codec::{detect, is_fits, lookup, Codec, FitsCodec};
pub use decode::{decode, decode_with_progress, read_file, DecodeOptions, Decoded};
pub use encode::{encode, encode_with_progress, write_file, EncodeOptions};
pub use endian::Endian;
pub use error::{CorruptReason, Error, ResourceReason, Result};
pub use image::{Colorspace, Frame, ImageList, Pixel};
pub use progress::{NoProgress, Progress};
pub use quantize::{DegenerateRange, Quantum, QUANTUM_DEPTH, QUANTUM_RANGE};
