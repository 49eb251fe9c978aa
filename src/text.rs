//! Byte-to-text normalization for values captured from external commands.
//!
//! Toolchain output and argument lists arrive as raw bytes; everything the
//! build system stores or prints is text in the host's preferred encoding.
//! The encoding is resolved once from the locale environment and held in a
//! [`TextCodec`], which every coercion goes through.

use encoding_rs::Encoding;

/// A value on its way into the build system: raw bytes, decoded text, a
/// number, or a one-level list of those.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Bytes(Vec<u8>),
    Text(String),
    Int(i64),
    List(Vec<Value>),
}

impl Value {
    /// True iff the value is textual (raw bytes or decoded text).
    pub fn is_text_like(&self) -> bool {
        matches!(self, Value::Bytes(_) | Value::Text(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Text(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Value {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Value {
        Value::Bytes(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Int(n)
    }
}

/// Decoder for the host's preferred text encoding, resolved once at startup
/// and immutable for the process lifetime.
#[derive(Copy, Clone, Debug)]
pub struct TextCodec {
    encoding: &'static Encoding,
}

impl TextCodec {
    /// Resolve the preferred encoding from `LC_ALL`, `LC_CTYPE`, or `LANG`
    /// (first one set wins), falling back to UTF-8 when no usable codeset is
    /// named.
    pub fn from_locale() -> TextCodec {
        TextCodec {
            encoding: locale_encoding(),
        }
    }

    /// Codec for an explicit encoding label, e.g. `"ISO-8859-1"`.
    pub fn with_label(label: &str) -> Option<TextCodec> {
        Encoding::for_label(label.as_bytes()).map(|encoding| TextCodec { encoding })
    }

    /// Canonical name of the resolved encoding.
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Decode bytes with the preferred encoding. Malformed input turns into
    /// replacement characters rather than failing the build.
    pub fn decode_bytes(&self, data: &[u8]) -> String {
        let (text, _, had_errors) = self.encoding.decode(data);
        if had_errors {
            log::debug!(
                "replaced malformed {} sequences while decoding {} bytes",
                self.encoding.name(),
                data.len()
            );
        }
        text.into_owned()
    }

    /// Coerce a value to text: bytes are decoded, and a list has each bytes
    /// element decoded exactly one level deep. Everything else, including any
    /// nested list inside a list, passes through unchanged.
    pub fn normalize(&self, value: Value) -> Value {
        match value {
            Value::Bytes(bytes) => Value::Text(self.decode_bytes(&bytes)),
            Value::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Bytes(bytes) => Value::Text(self.decode_bytes(&bytes)),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    /// Decode only a top-level bytes value; a list passes through untouched.
    /// Call sites that collect command arguments depend on this never
    /// descending into sequences, unlike [`normalize`](Self::normalize).
    pub fn normalize_scalar(&self, value: Value) -> Value {
        match value {
            Value::Bytes(bytes) => Value::Text(self.decode_bytes(&bytes)),
            other => other,
        }
    }

    /// Append [`normalize_scalar`](Self::normalize_scalar)`(value)` to `out`.
    pub fn append_normalized(&self, out: &mut Vec<Value>, value: Value) {
        out.push(self.normalize_scalar(value));
    }
}

fn locale_encoding() -> &'static Encoding {
    for var in ["LC_ALL", "LC_CTYPE", "LANG"] {
        match std::env::var(var) {
            Ok(value) if !value.is_empty() => {
                if let Some(encoding) = codeset_label(&value)
                    .and_then(|label| Encoding::for_label(label.as_bytes()))
                {
                    return encoding;
                }
                // The highest-priority set variable decides, even when its
                // codeset is missing or unknown.
                break;
            }
            _ => continue,
        }
    }
    encoding_rs::UTF_8
}

/// Extract the codeset from a locale name: `en_US.ISO-8859-1@euro` names
/// `ISO-8859-1`.
fn codeset_label(locale: &str) -> Option<&str> {
    let (_, rest) = locale.split_once('.')?;
    Some(match rest.split_once('@') {
        Some((label, _)) => label,
        None => rest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8() -> TextCodec {
        TextCodec::with_label("UTF-8").unwrap()
    }

    #[test]
    fn decode_bytes_round_trips_utf8() {
        assert_eq!(utf8().decode_bytes(b"hi"), "hi");
    }

    #[test]
    fn decode_bytes_honors_the_resolved_encoding() {
        let latin1 = TextCodec::with_label("ISO-8859-1").unwrap();
        assert_eq!(latin1.decode_bytes(&[0x63, 0x61, 0x66, 0xe9]), "caf\u{e9}");
    }

    #[test]
    fn malformed_input_becomes_replacement_characters() {
        assert_eq!(utf8().decode_bytes(&[0xff, 0x68]), "\u{fffd}h");
    }

    #[test]
    fn normalize_decodes_bytes_to_text() {
        assert_eq!(
            utf8().normalize(Value::from(&b"hi"[..])),
            Value::from("hi")
        );
    }

    #[test]
    fn normalize_decodes_list_elements_one_level_deep() {
        let input = Value::List(vec![
            Value::from(&b"a"[..]),
            Value::Int(1),
            Value::from(&b"c"[..]),
        ]);
        let expected = Value::List(vec![Value::from("a"), Value::Int(1), Value::from("c")]);
        assert_eq!(utf8().normalize(input), expected);
    }

    #[test]
    fn normalize_leaves_nested_lists_untouched() {
        let nested = Value::List(vec![Value::from(&b"inner"[..])]);
        let input = Value::List(vec![nested.clone()]);
        assert_eq!(utf8().normalize(input), Value::List(vec![nested]));
    }

    #[test]
    fn normalize_passes_integers_through() {
        assert_eq!(utf8().normalize(Value::Int(7)), Value::Int(7));
    }

    #[test]
    fn normalize_scalar_does_not_descend_into_lists() {
        let list = Value::List(vec![Value::from(&b"raw"[..])]);
        assert_eq!(utf8().normalize_scalar(list.clone()), list);
    }

    #[test]
    fn append_normalized_decodes_only_scalars() {
        let codec = utf8();
        let mut out = Vec::new();
        codec.append_normalized(&mut out, Value::from(&b"x"[..]));
        codec.append_normalized(&mut out, Value::Int(3));
        assert_eq!(out, vec![Value::from("x"), Value::Int(3)]);
    }

    #[test]
    fn text_likeness_covers_bytes_and_text_only() {
        assert!(Value::from("t").is_text_like());
        assert!(Value::from(&b"b"[..]).is_text_like());
        assert!(!Value::Int(0).is_text_like());
        assert!(!Value::List(Vec::new()).is_text_like());
    }

    #[test]
    fn codeset_label_extraction() {
        assert_eq!(codeset_label("en_US.UTF-8"), Some("UTF-8"));
        assert_eq!(codeset_label("de_DE.ISO-8859-1@euro"), Some("ISO-8859-1"));
        assert_eq!(codeset_label("C"), None);
    }
}
