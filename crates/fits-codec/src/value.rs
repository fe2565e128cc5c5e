/// A typed FITS header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// FITS logical value (`T` or `F`).
    Logical(bool),
    /// FITS integer value.
    Integer(i64),
    /// FITS floating-point value.
    Float(f64),
    /// FITS character string (content between single quotes).
    String(String),
}

impl Value {
    /// Integer view; floats are truncated toward zero.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            _ => None,
        }
    }

    /// Floating-point view; integers are promoted.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Split a value at the comment separator.
///
/// The FITS standard uses ` / ` (space-slash-space) but real-world files
/// produced by IDL and other tools omit the trailing space, so ` /` alone is
/// accepted. A value that starts with `/` has no value part at all.
fn split_comment(text: &str) -> (&str, Option<&str>) {
    if let Some(rest) = text.strip_prefix('/') {
        let comment = rest.trim();
        return ("", Some(comment).filter(|s| !s.is_empty()));
    }
    match text.find(" /") {
        Some(idx) => {
            let comment = text[idx + 2..].trim();
            (&text[..idx], Some(comment).filter(|s| !s.is_empty()))
        }
        None => (text, None),
    }
}

/// Parse a quoted FITS character string.
///
/// Doubled single-quotes inside the string represent a literal `'`. An
/// unterminated string is accepted as-is.
fn parse_string(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'\'') {
        return None;
    }

    let mut value = String::new();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                value.push('\'');
                i += 2;
                continue;
            }
            break;
        }
        value.push(bytes[i] as char);
        i += 1;
    }

    // FITS pads strings to a minimum of 8 characters.
    Some(value.trim_end().to_string())
}

/// Parse a float string, handling FITS `D` exponent notation.
fn parse_float_str(s: &str) -> Option<f64> {
    let normalized = s.replace('D', "E").replace('d', "e");
    normalized.parse::<f64>().ok()
}

/// Parse the text that follows a record's value indicator.
///
/// Trailing ` / comment` text is discarded. Returns `None` for an empty or
/// unrecognized value.
pub fn parse_value(text: &str) -> Option<Value> {
    let text = text.trim_start();

    if text.starts_with('\'') {
        return parse_string(text).map(Value::String);
    }

    let (val_part, _) = split_comment(text);
    let val_text = val_part.trim();
    if val_text.is_empty() {
        return None;
    }

    if val_text == "T" {
        return Some(Value::Logical(true));
    }
    if val_text == "F" {
        return Some(Value::Logical(false));
    }

    if !val_text.contains(['.', 'E', 'e', 'D', 'd']) {
        if let Ok(n) = val_text.parse::<i64>() {
            return Some(Value::Integer(n));
        }
    }

    parse_float_str(val_text).map(Value::Float)
}

/// Strip quotes, a trailing comment and blanks from a value, leaving the bare
/// text.
pub fn bare_text(text: &str) -> String {
    let text = text.trim_start();
    if let Some(s) = parse_string(text) {
        return s.trim().to_string();
    }
    split_comment(text).0.trim().to_string()
}

/// Serialize a [`Value`] into a 70-byte field suitable for bytes 10..80 of an
/// 80-byte FITS card.
///
/// Numeric and logical values are right-justified in the first 20 bytes
/// (columns 11-30 of the card). String values start at byte 0 with a single
/// quote.
pub fn format_value(value: &Value) -> [u8; 70] {
    let mut buf = [b' '; 70];

    match value {
        Value::Logical(b) => {
            buf[19] = if *b { b'T' } else { b'F' };
        }
        Value::Integer(n) => {
            right_justify(n.to_string().as_bytes(), &mut buf[..20]);
        }
        Value::Float(f) => {
            right_justify(format_float(*f).as_bytes(), &mut buf[..20]);
        }
        Value::String(s) => {
            write_string(s, &mut buf);
        }
    }

    buf
}

/// Right-justify `src` within `dest`, padding the left with spaces.
fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest.fill(b' ');
    dest[start..start + len].copy_from_slice(&src[..len]);
}

/// Format a float in at most 20 characters, always with a decimal point or
/// exponent so it reads back as a float.
fn format_float(f: f64) -> String {
    if f == 0.0 {
        return String::from("0.0");
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{f:.1}");
    }
    // Start with high precision and reduce until the result fits.
    let mut precision = 15usize;
    loop {
        let s = format!("{:.prec$E}", f, prec = precision);
        if s.len() <= 20 || precision == 0 {
            return s;
        }
        precision -= 1;
    }
}

fn write_string(s: &str, buf: &mut [u8; 70]) {
    let mut pos = 0;
    buf[pos] = b'\'';
    pos += 1;

    for ch in s.bytes() {
        if pos >= 69 {
            break;
        }
        if ch == b'\'' {
            if pos + 1 >= 69 {
                break;
            }
            buf[pos] = b'\'';
            buf[pos + 1] = b'\'';
            pos += 2;
        } else {
            buf[pos] = ch;
            pos += 1;
        }
    }

    // Minimum 8 characters between the quotes.
    while pos < 9 {
        buf[pos] = b' ';
        pos += 1;
    }

    buf[pos] = b'\'';
}
