//! Position-tracking stream wrapper used by the reader and writer.
//!
//! [`Blob`] wraps any `std::io` stream and keeps the absolute byte offset the
//! block arithmetic depends on, plus a sticky end-of-file flag that is raised
//! by the first short read. [`Mark`] is a scoped "remember and rewind" guard
//! over a seekable blob.

use std::io::{ErrorKind, Read, Result, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};

/// A stream that can be both read and repositioned.
///
/// Blanket-implemented so codec entry points can take `&mut dyn ReadSeek`.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Byte stream with an absolute position and an end-of-file flag.
#[derive(Debug)]
pub struct Blob<T> {
    inner: T,
    position: u64,
    eof: bool,
}

impl<T> Blob<T> {
    /// Wrap a stream whose current offset is taken to be zero.
    pub fn new(inner: T) -> Self {
        Blob {
            inner,
            position: 0,
            eof: false,
        }
    }

    /// Current absolute byte offset.
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Returns `true` once a read has come up short.
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    /// Borrow the wrapped stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the blob, returning the wrapped stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<R: Seek> Blob<R> {
    /// Wrap a seekable stream, starting from its current absolute offset.
    pub fn at_current(mut inner: R) -> Result<Self> {
        let position = inner.stream_position()?;
        Ok(Blob {
            inner,
            position,
            eof: false,
        })
    }

    /// Seek to an absolute offset. Clears the end-of-file flag.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.position = self.inner.seek(SeekFrom::Start(offset))?;
        self.eof = false;
        Ok(())
    }

    /// Move forward `count` bytes without reading them.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        let target = self.position.checked_add(count).ok_or_else(|| {
            std::io::Error::new(ErrorKind::InvalidInput, "skip past addressable range")
        })?;
        self.seek_to(target)
    }

    /// Remember the current offset; the returned guard seeks back to it when
    /// dropped or explicitly restored.
    pub fn mark(&mut self) -> Mark<'_, R> {
        let origin = self.position;
        Mark {
            blob: self,
            origin,
            restored: false,
        }
    }
}

impl<R: Read> Blob<R> {
    /// Fill `buf` completely.
    ///
    /// Returns `Ok(false)` on a short read; the bytes that were available are
    /// consumed and the end-of-file flag is raised.
    pub fn read_full(&mut self, buf: &mut [u8]) -> Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.position += filled as u64;
        if filled < buf.len() {
            self.eof = true;
            return Ok(false);
        }
        Ok(true)
    }

    /// Read a single byte, or `None` at end of stream.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        if self.read_full(&mut byte)? {
            Ok(Some(byte[0]))
        } else {
            Ok(None)
        }
    }
}

impl<W: Write> Blob<W> {
    /// Write the whole buffer, advancing the position.
    pub fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.inner.write_all(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Flush the wrapped writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

/// Scoped offset bookmark over a seekable [`Blob`].
///
/// Dereferences to the blob so the guarded scan can keep reading through it.
/// The original offset is restored on every exit path.
pub struct Mark<'a, R: Seek> {
    blob: &'a mut Blob<R>,
    origin: u64,
    restored: bool,
}

impl<R: Seek> Mark<'_, R> {
    /// Offset that will be restored.
    pub fn origin(&self) -> u64 {
        self.origin
    }

    /// Seek back now, reporting any seek failure.
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.blob.seek_to(self.origin)
    }
}

impl<R: Seek> Deref for Mark<'_, R> {
    type Target = Blob<R>;

    fn deref(&self) -> &Blob<R> {
        &*self.blob
    }
}

impl<R: Seek> DerefMut for Mark<'_, R> {
    fn deref_mut(&mut self) -> &mut Blob<R> {
        &mut *self.blob
    }
}

impl<R: Seek> Drop for Mark<'_, R> {
    fn drop(&mut self) {
        if !self.restored {
            // Drop cannot report; callers that need the error use `restore`.
            let _ = self.blob.seek_to(self.origin);
        }
    }
}
