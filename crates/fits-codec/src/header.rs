//! FITS header records: the block-structured reader and the card writer.

use std::io::Read;

use tracing::{debug, trace, warn};

use crate::block::{padded_byte_len, skip_to_block_boundary, CARD_SIZE, HEADER_PAD_BYTE};
use crate::endian::Endian;
use crate::error::{CorruptReason, Error, Result};
use crate::io::Blob;
use crate::sample::SampleKind;
use crate::value::{bare_text, format_value, parse_value, Value};

const KEYWORD_LEN: usize = 8;
const VALUE_LEN: usize = CARD_SIZE - KEYWORD_LEN;

// ── Reading ──

/// One 80-byte header record with its keyword normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    /// Lowercased keyword, cut at the first blank.
    pub keyword: String,
    /// Value text after the `=` indicator, leading blanks removed.
    pub value: String,
}

impl HeaderRecord {
    pub fn from_bytes(keyword: &[u8; KEYWORD_LEN], value: &[u8; VALUE_LEN]) -> Self {
        let keyword: String = keyword
            .iter()
            .take_while(|b| !b.is_ascii_whitespace())
            .map(|&b| b.to_ascii_lowercase() as char)
            .collect();

        let mut start = 0;
        if value[0] == b'=' {
            start = 2;
            while start < VALUE_LEN && value[start].is_ascii_whitespace() {
                start += 1;
            }
        }
        let value = String::from_utf8_lossy(&value[start..]).into_owned();
        HeaderRecord { keyword, value }
    }

    pub fn is_end(&self) -> bool {
        self.keyword == "end"
    }

    /// First character of the value is `T` or `t`.
    fn as_flag(&self) -> bool {
        matches!(self.value.as_bytes().first(), Some(b'T' | b't'))
    }

    fn as_integer(&self) -> i64 {
        let number = leading_number(&self.value);
        match number.as_ref().and_then(Value::as_integer) {
            Some(n) => n,
            None => {
                warn!(
                    keyword = %self.keyword,
                    value = %self.value.trim_end(),
                    "unparseable integer, using 0"
                );
                0
            }
        }
    }

    fn as_float(&self) -> f64 {
        let number = leading_number(&self.value);
        match number.as_ref().and_then(Value::as_float) {
            Some(f) => f,
            None => {
                warn!(
                    keyword = %self.keyword,
                    value = %self.value.trim_end(),
                    "unparseable number, using 0"
                );
                0.0
            }
        }
    }

    fn as_axis_length(&self) -> u64 {
        self.as_integer().max(0) as u64
    }
}

/// Parse the longest numeric prefix of a value field.
fn leading_number(text: &str) -> Option<Value> {
    let text = bare_text(text);
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || "+-.eEdD".contains(c)))
        .unwrap_or(text.len());
    parse_value(&text[..end])
}

/// Everything the decoder needs from the primary header.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHeader {
    pub simple: bool,
    pub extend: bool,
    pub bits_per_pixel: i64,
    /// NAXIS1.
    pub columns: u64,
    /// NAXIS2.
    pub rows: u64,
    pub number_axes: i64,
    /// NAXIS3: number of scenes stored back to back.
    pub number_planes: u64,
    pub min_data: f64,
    pub max_data: f64,
    /// BZERO.
    pub zero: f64,
    /// BSCALE.
    pub scale: f64,
    pub endian: Endian,
    /// COMMENT records, one per line.
    pub comment: Option<String>,
    /// `fits:<keyword>` properties in first-seen order.
    pub properties: Vec<(String, String)>,
}

impl Default for ImageHeader {
    fn default() -> Self {
        ImageHeader {
            simple: false,
            extend: false,
            bits_per_pixel: 8,
            columns: 1,
            rows: 1,
            number_axes: 0,
            number_planes: 1,
            min_data: 0.0,
            max_data: 0.0,
            zero: 0.0,
            scale: 1.0,
            endian: Endian::Msb,
            comment: None,
            properties: Vec::new(),
        }
    }
}

impl ImageHeader {
    /// Samples in one scene.
    pub fn pixels_per_scene(&self) -> u64 {
        self.columns.saturating_mul(self.rows)
    }

    /// Bytes in one scene, or `None` on overflow.
    pub fn scene_byte_len(&self) -> Option<u64> {
        let width = self.bits_per_pixel.unsigned_abs() / 8;
        self.pixels_per_scene().checked_mul(width)
    }

    /// `SIMPLE = T`, one to four axes, and at least one pixel.
    pub fn is_supported(&self) -> bool {
        self.simple
            && (1..=4).contains(&self.number_axes)
            && self.pixels_per_scene() != 0
            && self.number_planes != 0
    }

    pub fn sample_kind(&self) -> Result<SampleKind> {
        SampleKind::from_bitpix(self.bits_per_pixel)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_property(&mut self, name: String, value: String) {
        match self.properties.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((name, value)),
        }
    }

    fn apply(&mut self, record: &HeaderRecord) {
        match record.keyword.as_str() {
            "simple" => self.simple = record.as_flag(),
            "extend" => self.extend = record.as_flag(),
            "bitpix" => self.bits_per_pixel = record.as_integer(),
            "naxis" => self.number_axes = record.as_integer(),
            "naxis1" => self.columns = record.as_axis_length(),
            "naxis2" => self.rows = record.as_axis_length(),
            "naxis3" => self.number_planes = record.as_axis_length(),
            "datamax" => self.max_data = record.as_float(),
            "datamin" => self.min_data = record.as_float(),
            "bzero" => self.zero = record.as_float(),
            "bscale" => self.scale = record.as_float(),
            "comment" => {
                let line = record.value.trim();
                match &mut self.comment {
                    Some(text) => {
                        text.push('\n');
                        text.push_str(line);
                    }
                    None => self.comment = Some(line.to_string()),
                }
            }
            "xendian" => {
                let order = bare_text(&record.value).to_ascii_lowercase();
                self.endian = if order.starts_with("big") {
                    Endian::Msb
                } else {
                    Endian::Lsb
                };
            }
            _ => {}
        }
        if !record.keyword.is_empty() {
            self.set_property(
                format!("fits:{}", record.keyword),
                record.value.trim_end().to_string(),
            );
        }
    }
}

/// Read records until `END` or a short read; a short read leaves the blob at
/// end of file.
fn read_records<R: Read>(blob: &mut Blob<R>, header: &mut ImageHeader) -> Result<()> {
    let mut keyword = [0u8; KEYWORD_LEN];
    let mut value = [0u8; VALUE_LEN];
    loop {
        if !blob.read_full(&mut keyword)? || !blob.read_full(&mut value)? {
            return Ok(());
        }
        let record = HeaderRecord::from_bytes(&keyword, &value);
        trace!(keyword = %record.keyword, value = %record.value.trim_end(), "header record");
        if record.is_end() {
            return Ok(());
        }
        header.apply(&record);
    }
}

/// Scan header blocks until a supported image header is found.
///
/// When `EXTEND = T`, headers that do not describe an image are skipped and
/// the next block is scanned. The blob is left at the first byte of pixel
/// data.
pub fn parse_header<R: Read>(blob: &mut Blob<R>) -> Result<ImageHeader> {
    let mut header = ImageHeader::default();
    while !blob.at_eof() {
        read_records(blob, &mut header)?;
        skip_to_block_boundary(blob)?;
        if !header.extend {
            break;
        }
        if !SampleKind::is_valid_bitpix(header.bits_per_pixel) {
            return Err(Error::corrupt(CorruptReason::ImproperImageHeader, blob.tell()));
        }
        if header.is_supported() {
            break;
        }
        debug!(
            offset = blob.tell(),
            "header does not describe an image, scanning next block"
        );
    }

    if blob.at_eof() {
        return Err(Error::corrupt(CorruptReason::UnexpectedEndOfFile, blob.tell()));
    }
    if !header.is_supported() {
        return Err(Error::corrupt(CorruptReason::ImageTypeNotSupported, blob.tell()));
    }
    if !SampleKind::is_valid_bitpix(header.bits_per_pixel) {
        return Err(Error::corrupt(CorruptReason::ImproperImageHeader, blob.tell()));
    }

    debug!(
        bitpix = header.bits_per_pixel,
        naxis = header.number_axes,
        columns = header.columns,
        rows = header.rows,
        planes = header.number_planes,
        datamin = header.min_data,
        datamax = header.max_data,
        bzero = header.zero,
        bscale = header.scale,
        endian = ?header.endian,
        data_offset = blob.tell(),
        "parsed FITS header"
    );
    Ok(header)
}

// ── Writing ──

/// A header card to be written: keyword, optional value, optional comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// The 8-byte keyword name, ASCII, left-justified, space-padded.
    pub keyword: [u8; KEYWORD_LEN],
    /// Value written after the `= ` indicator. Commentary cards have none.
    pub value: Option<Value>,
    /// Trailing comment, or the free text of a commentary card.
    pub comment: Option<String>,
}

impl Card {
    pub fn new(keyword: &str, value: Value) -> Self {
        Card {
            keyword: kw(keyword.as_bytes()),
            value: Some(value),
            comment: None,
        }
    }

    /// A commentary card such as `HISTORY`; text beyond 72 bytes is dropped.
    pub fn commentary(keyword: &str, text: &str) -> Self {
        Card {
            keyword: kw(keyword.as_bytes()),
            value: None,
            comment: Some(text.to_string()),
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

/// Pad a short keyword name to 8 bytes with trailing ASCII spaces.
const fn kw(name: &[u8]) -> [u8; KEYWORD_LEN] {
    let mut buf = [b' '; KEYWORD_LEN];
    let mut i = 0;
    while i < name.len() && i < KEYWORD_LEN {
        buf[i] = name[i].to_ascii_uppercase();
        i += 1;
    }
    buf
}

/// Serialize a [`Card`] into an 80-byte record.
pub fn format_card(card: &Card) -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..KEYWORD_LEN].copy_from_slice(&card.keyword);

    match (&card.value, &card.comment) {
        (Some(value), comment) => {
            buf[8] = b'=';
            let mut field = format_value(value);
            if let Some(comment) = comment {
                insert_comment(&mut field, comment);
            }
            buf[10..].copy_from_slice(&field);
        }
        (None, Some(text)) => {
            let bytes = text.as_bytes();
            let len = bytes.len().min(VALUE_LEN);
            buf[KEYWORD_LEN..KEYWORD_LEN + len].copy_from_slice(&bytes[..len]);
        }
        (None, None) => {}
    }
    buf
}

/// Place ` / comment` after the value in a 70-byte field.
fn insert_comment(field: &mut [u8; 70], comment: &str) {
    let content_end = if field[0] == b'\'' {
        // Closing quote of the string.
        field[1..]
            .iter()
            .rposition(|&b| b == b'\'')
            .map_or(field.len(), |i| i + 2)
    } else {
        20
    };
    let sep = content_end + 1;
    if sep + 3 >= field.len() {
        return;
    }
    field[sep] = b'/';
    let start = sep + 2;
    let bytes = comment.as_bytes();
    let len = bytes.len().min(field.len() - start);
    field[start..start + len].copy_from_slice(&bytes[..len]);
}

/// The `END` record, blank padded.
pub fn format_end_card() -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..3].copy_from_slice(b"END");
    buf
}

/// Serialize cards plus `END` into whole header blocks padded with blanks.
pub fn serialize_header(cards: &[Card]) -> Vec<u8> {
    let mut buf = vec![HEADER_PAD_BYTE; padded_byte_len((cards.len() + 1) * CARD_SIZE)];

    for (i, card) in cards.iter().enumerate() {
        let offset = i * CARD_SIZE;
        buf[offset..offset + CARD_SIZE].copy_from_slice(&format_card(card));
    }
    let end_offset = cards.len() * CARD_SIZE;
    buf[end_offset..end_offset + CARD_SIZE].copy_from_slice(&format_end_card());
    buf
}
