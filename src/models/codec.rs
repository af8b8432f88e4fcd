//! Object-key codec for document metadata.
//!
//! A document has no record outside the blob store: its id, title and age
//! restriction live in the object key itself, as
//! `documents/<id>_<title>_<age_restriction>.pdf`. Both text fields are
//! percent-encoded with `_` escaped, so the delimiter never appears inside a
//! field.

use crate::error::AppError;

/// Key prefix shared by every stored document.
pub const DOCUMENTS_PREFIX: &str = "documents/";

/// File extension appended to every document key.
pub const PDF_EXTENSION: &str = ".pdf";

/// Title used when a key carries no title segment.
pub const DEFAULT_TITLE: &str = "Sin título";

/// Age restriction used when a key carries no age restriction segment.
pub const DEFAULT_AGE_RESTRICTION: &str = "18+";

const FIELD_DELIMITER: char = '_';

/// The metadata triple carried by a document's object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentKey {
    pub id: u64,
    pub title: String,
    pub age_restriction: String,
}

impl DocumentKey {
    pub fn new(id: u64, title: impl Into<String>, age_restriction: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            age_restriction: age_restriction.into(),
        }
    }

    /// Build the object key for this document.
    pub fn encode(&self) -> String {
        format!(
            "{DOCUMENTS_PREFIX}{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}{PDF_EXTENSION}",
            self.id,
            encode_field(&self.title),
            encode_field(&self.age_restriction),
        )
    }

    /// Parse an object key back into its metadata.
    ///
    /// Missing title or age restriction segments fall back to
    /// [`DEFAULT_TITLE`] and [`DEFAULT_AGE_RESTRICTION`]. A missing or
    /// non-numeric id is an error.
    pub fn decode(key: &str) -> Result<Self, AppError> {
        let name = key.strip_prefix(DOCUMENTS_PREFIX).ok_or_else(|| {
            AppError::Validation(format!("Key '{key}' is not under '{DOCUMENTS_PREFIX}'"))
        })?;
        let name = name.strip_suffix(PDF_EXTENSION).unwrap_or(name);

        let mut parts = name.split(FIELD_DELIMITER);

        let id = parts
            .next()
            .and_then(parse_id)
            .ok_or_else(|| AppError::Validation(format!("Key '{key}' has no numeric id")))?;

        let title = decode_field(parts.next(), DEFAULT_TITLE, key)?;
        let age_restriction = decode_field(parts.next(), DEFAULT_AGE_RESTRICTION, key)?;

        Ok(Self {
            id,
            title,
            age_restriction,
        })
    }
}

/// Parse a document id written in canonical decimal form.
///
/// Signs, whitespace and leading zeros are refused, so the parsed id always
/// formats back to `raw` and [`id_prefix`] names the same keys.
pub fn parse_id(raw: &str) -> Option<u64> {
    let canonical = !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'));
    if !canonical {
        return None;
    }
    raw.parse().ok()
}

/// Prefix matching every key that belongs to the document with `id`.
pub fn id_prefix(id: u64) -> String {
    format!("{DOCUMENTS_PREFIX}{id}{FIELD_DELIMITER}")
}

fn encode_field(value: &str) -> String {
    // urlencoding leaves `_` untouched
    urlencoding::encode(value).replace(FIELD_DELIMITER, "%5F")
}

fn decode_field(raw: Option<&str>, default: &str, key: &str) -> Result<String, AppError> {
    match raw {
        None | Some("") => Ok(default.to_string()),
        Some(raw) => urlencoding::decode(raw)
            .map(|decoded| decoded.into_owned())
            .map_err(|e| AppError::Validation(format!("Key '{key}' is not valid UTF-8: {e}"))),
    }
}
