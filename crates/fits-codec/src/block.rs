use std::io::{Read, Write};

use crate::io::Blob;

/// FITS block size in bytes (each logical record is one block).
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Padding byte used for header blocks (ASCII space).
pub const HEADER_PAD_BYTE: u8 = 0x20;

/// Padding byte used for data blocks (zero).
pub const DATA_PAD_BYTE: u8 = 0x00;

/// Returns the number of FITS blocks required to hold `num_bytes` bytes.
///
/// A FITS file is organized in units of 2880 bytes. This computes the ceiling
/// division: 0 bytes requires 0 blocks, 1 byte requires 1 block, 2880 bytes
/// requires 1 block, 2881 bytes requires 2 blocks, etc.
pub const fn blocks_needed(num_bytes: usize) -> usize {
    if num_bytes == 0 {
        return 0;
    }
    num_bytes.div_ceil(BLOCK_SIZE)
}

/// Returns the total byte length (in whole blocks) required to hold `num_bytes`.
pub const fn padded_byte_len(num_bytes: usize) -> usize {
    blocks_needed(num_bytes) * BLOCK_SIZE
}

/// Number of filler bytes between `position` and the next block boundary.
///
/// Zero when `position` is already aligned.
pub const fn bytes_to_boundary(position: u64) -> u64 {
    let rem = position % BLOCK_SIZE as u64;
    if rem == 0 {
        0
    } else {
        BLOCK_SIZE as u64 - rem
    }
}

/// Consume filler one byte at a time until the stream sits on a block boundary
/// or the source runs dry.
///
/// Returns the number of bytes consumed. An aligned stream is left untouched.
pub fn skip_to_block_boundary<R: Read>(blob: &mut Blob<R>) -> std::io::Result<u64> {
    let mut consumed = 0;
    while blob.tell() % BLOCK_SIZE as u64 != 0 {
        if blob.read_byte()?.is_none() {
            break;
        }
        consumed += 1;
    }
    Ok(consumed)
}

/// Write `fill` bytes until the stream sits on a block boundary.
///
/// Returns the number of bytes written; nothing is written when the stream is
/// already aligned.
pub fn pad_to_block_boundary<W: Write>(blob: &mut Blob<W>, fill: u8) -> std::io::Result<u64> {
    let remaining = bytes_to_boundary(blob.tell());
    if remaining != 0 {
        let filler = [fill; BLOCK_SIZE];
        blob.write_all(&filler[..remaining as usize])?;
    }
    Ok(remaining)
}
