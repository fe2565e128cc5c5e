//! Static format table and the codec interface it dispatches to.

use std::io::Write;

use crate::decode::{decode, DecodeOptions, Decoded};
use crate::encode::{encode, EncodeOptions};
use crate::error::Result;
use crate::image::ImageList;
use crate::io::ReadSeek;

/// A format coder reachable through the format table.
pub trait Codec: Sync {
    /// Canonical format name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Returns `true` if `bytes` starts with this format's signature.
    fn magic(&self, bytes: &[u8]) -> bool;

    fn decode(&self, reader: &mut dyn ReadSeek, options: &DecodeOptions) -> Result<Decoded>;

    fn encode(
        &self,
        writer: &mut dyn Write,
        images: &ImageList,
        options: &EncodeOptions,
    ) -> Result<()>;
}

/// The Flexible Image Transport System coder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitsCodec;

impl Codec for FitsCodec {
    fn name(&self) -> &'static str {
        "FITS"
    }

    fn description(&self) -> &'static str {
        "Flexible Image Transport System"
    }

    fn magic(&self, bytes: &[u8]) -> bool {
        is_fits(bytes)
    }

    fn decode(&self, reader: &mut dyn ReadSeek, options: &DecodeOptions) -> Result<Decoded> {
        decode(&mut *reader, options)
    }

    fn encode(
        &self,
        writer: &mut dyn Write,
        images: &ImageList,
        options: &EncodeOptions,
    ) -> Result<()> {
        encode(&mut *writer, images, options)
    }
}

/// One row of the format table.
pub struct FormatEntry {
    /// Format name as matched by [`lookup`].
    pub name: &'static str,
    pub codec: &'static dyn Codec,
}

static FORMATS: [FormatEntry; 2] = [
    FormatEntry {
        name: "FITS",
        codec: &FitsCodec,
    },
    FormatEntry {
        name: "FTS",
        codec: &FitsCodec,
    },
];

/// Every registered format.
pub fn formats() -> &'static [FormatEntry] {
    &FORMATS
}

/// Find a codec by format name, ignoring ASCII case.
pub fn lookup(name: &str) -> Option<&'static dyn Codec> {
    FORMATS
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
        .map(|entry| entry.codec)
}

/// Find the codec whose signature matches the start of `bytes`.
pub fn detect(bytes: &[u8]) -> Option<&'static dyn Codec> {
    FORMATS
        .iter()
        .map(|entry| entry.codec)
        .find(|codec| codec.magic(bytes))
}

/// FITS signature check: at least 6 bytes, starting with `IT0` or `SIMPLE`.
pub fn is_fits(bytes: &[u8]) -> bool {
    if bytes.len() < 6 {
        return false;
    }
    bytes[..3].eq_ignore_ascii_case(b"IT0") || bytes[..6].eq_ignore_ascii_case(b"SIMPLE")
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::image::Frame;

    #[test]
    fn signature_detection() {
        assert!(is_fits(b"SIMPLE  =                    T"));
        assert!(is_fits(b"simple"));
        assert!(is_fits(b"IT0xyz"));
        assert!(!is_fits(b"SIMPL"));
        assert!(!is_fits(b"IT0"));
        assert!(!is_fits(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("fits").map(|c| c.name()), Some("FITS"));
        assert_eq!(lookup("Fts").map(|c| c.name()), Some("FITS"));
        assert!(lookup("png").is_none());
        assert_eq!(formats().len(), 2);
    }

    #[test]
    fn detect_by_magic() {
        assert!(detect(b"SIMPLE  = T").is_some());
        assert!(detect(b"GIF89a").is_none());
    }

    #[test]
    fn codec_round_trip_through_trait_objects() {
        let codec = lookup("FITS").unwrap();
        let images = ImageList::from(Frame::from_gray(2, 1, 8, &[0, u16::MAX]).unwrap());
        let mut out: Vec<u8> = Vec::new();
        codec
            .encode(&mut out, &images, &EncodeOptions::default())
            .unwrap();
        assert!(codec.magic(&out));

        let mut reader = Cursor::new(out);
        let decoded = codec
            .decode(&mut reader, &DecodeOptions::default())
            .unwrap();
        let frame = decoded.frames.first().unwrap();
        assert_eq!(frame.row(0), images.first().unwrap().row(0));
    }
}
