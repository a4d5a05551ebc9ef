//! Export/import codec.
//!
//! Payloads travel as base64 data URIs (`data:<mime>;base64,<payload>`)
//! inside a JSON document:
//!
//! ```json
//! { "version": 1,
//!   "items": [ { "name": "cat.png", "type": "image/png", "size": 1024,
//!                "createdAt": 1700000000000, "base64": "data:image/png;base64,..." } ] }
//! ```
//!
//! Store ids are never written, and any `id` found on import is ignored.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD as BASE64};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{now_millis, NewPhoto, PhotoRecord};
use crate::error::{Error, Result};

/// Interchange document version written by [`encode`].
pub const FORMAT_VERSION: u32 = 1;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Standard alphabet that accepts payloads with or without `=` padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: u32,
    pub items: Vec<ExportItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportItem {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    pub base64: String,
}

impl ExportItem {
    pub fn from_record(record: &PhotoRecord) -> Self {
        Self {
            name: record.name.clone(),
            mime_type: record.mime_type.clone(),
            size: record.size,
            created_at: Some(record.created_at),
            base64: encode_data_uri(&record.mime_type, &record.blob),
        }
    }

    /// Rebuild the record, tagging the payload with the item's own MIME type.
    /// The declared `size` must match the decoded payload.
    pub fn into_new_photo(self, now: i64) -> Result<NewPhoto> {
        let blob = decode_data_uri(&self.base64)?;
        if blob.len() as u64 != self.size {
            return Err(Error::invalid_format(format!(
                "declared size {} does not match payload of {} bytes",
                self.size,
                blob.len()
            )));
        }
        Ok(NewPhoto {
            name: self.name,
            mime_type: self.mime_type,
            size: self.size,
            created_at: self.created_at.unwrap_or(now),
            blob,
        })
    }
}

// ── Data URIs ───────────────────────────────────────────────────────

pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    let mime = if mime_type.is_empty() { FALLBACK_MIME } else { mime_type };
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Decode a base64 data URI, or a bare base64 string, back to bytes.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let payload = match uri.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| Error::invalid_format("data URI has no ',' separator"))?;
            if !header.ends_with(";base64") {
                return Err(Error::invalid_format("data URI is not base64-encoded"));
            }
            data
        }
        None => uri,
    };
    LENIENT_BASE64
        .decode(payload.trim())
        .map_err(|e| Error::invalid_format(format!("bad base64 payload: {e}")))
}

// ── Documents ───────────────────────────────────────────────────────

/// Build the interchange document for `records`, preserving their order.
pub fn encode(records: &[PhotoRecord]) -> ExportDocument {
    let items = records.par_iter().map(ExportItem::from_record).collect();
    ExportDocument {
        version: FORMAT_VERSION,
        items,
    }
}

pub fn to_json(document: &ExportDocument) -> Result<String> {
    Ok(serde_json::to_string(document)?)
}

/// Parse an interchange document into records ready for the store.
/// Items missing `createdAt` are stamped with the current time.
pub fn decode(text: &str) -> Result<Vec<NewPhoto>> {
    decode_at(text, now_millis())
}

/// Like [`decode`], with an explicit fallback timestamp.
///
/// Fails on the first malformed item; nothing is returned for the rest.
pub fn decode_at(text: &str, now: i64) -> Result<Vec<NewPhoto>> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::invalid_format(format!("not JSON: {e}")))?;

    if let Some(version) = value.get("version").and_then(serde_json::Value::as_u64) {
        if version > u64::from(FORMAT_VERSION) {
            return Err(Error::invalid_format(format!(
                "document version {version} is newer than supported version {FORMAT_VERSION}"
            )));
        }
    }

    let items = value
        .get("items")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| Error::invalid_format("missing `items` array"))?;

    items
        .par_iter()
        .enumerate()
        .map(|(idx, item)| {
            let item: ExportItem = serde_json::from_value(item.clone())
                .map_err(|e| Error::invalid_format(format!("item {idx}: {e}")))?;
            item.into_new_photo(now).map_err(|e| match e {
                Error::InvalidFormat(reason) => Error::invalid_format(format!("item {idx}: {reason}")),
                other => other,
            })
        })
        .collect()
}

/// Suggested file name for an export made at `now`.
pub fn default_export_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("galeria-{}.json", now.format("%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: i64, name: &str, mime: &str, blob: Vec<u8>, created_at: i64) -> PhotoRecord {
        PhotoRecord {
            id,
            name: name.to_string(),
            mime_type: mime.to_string(),
            size: blob.len() as u64,
            created_at,
            blob,
        }
    }

    // ── Data URI ─────────────────────────────────────────────────

    #[test]
    fn test_encode_data_uri_embeds_mime() {
        assert_eq!(encode_data_uri("image/png", b"hello"), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_encode_data_uri_empty_mime_falls_back() {
        assert_eq!(encode_data_uri("", b""), "data:application/octet-stream;base64,");
    }

    #[test]
    fn test_decode_data_uri() {
        assert_eq!(decode_data_uri("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_data_uri("data:image/png;base64,").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_bare_base64() {
        assert_eq!(decode_data_uri("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_data_uri_rejects_garbage() {
        for bad in [
            "data:image/png;base64",
            "data:image/png,aGVsbG8=",
            "data:image/png;base64,@@@",
            "not base64 at all!",
        ] {
            let err = decode_data_uri(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidFormat(_)), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_decode_accepts_unpadded_payload() {
        assert_eq!(decode_data_uri("data:image/png;base64,aGVsbG8").unwrap(), b"hello");
        assert_eq!(decode_data_uri("aGk").unwrap(), b"hi");
    }

    #[test]
    fn test_all_byte_values_survive() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let uri = encode_data_uri("image/jpeg", &bytes);
        assert_eq!(decode_data_uri(&uri).unwrap(), bytes);
    }

    // ── Documents ────────────────────────────────────────────────

    #[test]
    fn test_encode_document_shape() {
        let doc = encode(&[record(1, "cat.png", "image/png", b"hello".to_vec(), 1_700_000_000_000)]);
        let json: serde_json::Value = serde_json::from_str(&to_json(&doc).unwrap()).unwrap();

        assert_eq!(json["version"], 1);
        let item = &json["items"][0];
        assert_eq!(item["name"], "cat.png");
        assert_eq!(item["type"], "image/png");
        assert_eq!(item["size"], 5);
        assert_eq!(item["createdAt"], 1_700_000_000_000i64);
        assert_eq!(item["base64"], "data:image/png;base64,aGVsbG8=");
        assert!(item.get("id").is_none());
        assert!(item.get("blob").is_none());
    }

    #[test]
    fn test_encode_preserves_order() {
        let records: Vec<PhotoRecord> = (1..=50)
            .map(|i| record(i, &format!("{i}.png"), "image/png", vec![i as u8; 16], i))
            .collect();
        let doc = encode(&records);
        let names: Vec<String> = doc.items.iter().map(|i| i.name.clone()).collect();
        let expected: Vec<String> = (1..=50).map(|i| format!("{i}.png")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let records = vec![
            record(4, "cat.png", "image/png", vec![0, 1, 2, 255], 1_000),
            record(9, "cat.png", "image/jpeg", vec![], 2_000),
            record(12, "Ünïcødé 🐱.webp", "image/webp", vec![42; 3000], 3_000),
        ];
        let text = to_json(&encode(&records)).unwrap();
        let decoded = decode_at(&text, 0).unwrap();

        assert_eq!(decoded.len(), records.len());
        for (photo, original) in decoded.iter().zip(&records) {
            assert_eq!(photo, &NewPhoto::from(original));
        }
    }

    #[test]
    fn test_decode_missing_items() {
        for text in [r#"{"version":1}"#, r#"{"items":{}}"#, r#"[]"#, r#"{"items":null}"#] {
            let err = decode_at(text, 0).unwrap_err();
            assert!(matches!(err, Error::InvalidFormat(_)), "accepted {text}");
        }
    }

    #[test]
    fn test_decode_not_json() {
        let err = decode_at("<html>", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_decode_rejects_newer_version() {
        let err = decode_at(r#"{"version":2,"items":[]}"#, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_decode_without_version() {
        assert!(decode_at(r#"{"items":[]}"#, 0).unwrap().is_empty());
    }

    #[test]
    fn test_decode_defaults_created_at() {
        let text = r#"{"version":1,"items":[
            {"name":"a.png","type":"image/png","size":5,"base64":"data:image/png;base64,aGVsbG8="},
            {"name":"b.png","type":"image/png","size":5,"createdAt":null,"base64":"data:image/png;base64,aGVsbG8="},
            {"name":"c.png","type":"image/png","size":5,"createdAt":0,"base64":"data:image/png;base64,aGVsbG8="}
        ]}"#;
        let photos = decode_at(text, 777).unwrap();
        assert_eq!(photos[0].created_at, 777);
        assert_eq!(photos[1].created_at, 777);
        assert_eq!(photos[2].created_at, 0);
    }

    #[test]
    fn test_decode_ignores_ids_and_unknown_fields() {
        let text = r#"{"version":1,"items":[
            {"id":42,"name":"a.png","type":"image/png","size":5,"createdAt":1,
             "base64":"data:image/png;base64,aGVsbG8=","extra":true}
        ]}"#;
        let photos = decode_at(text, 0).unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].blob, b"hello");
    }

    #[test]
    fn test_decode_tags_payload_with_item_type() {
        let text = r#"{"items":[{"name":"a","type":"image/gif","size":5,"createdAt":1,
            "base64":"data:image/png;base64,aGVsbG8="}]}"#;
        let photos = decode_at(text, 0).unwrap();
        assert_eq!(photos[0].mime_type, "image/gif");
    }

    #[test]
    fn test_decode_bad_item_aborts_and_names_index() {
        let text = r#"{"version":1,"items":[
            {"name":"a.png","type":"image/png","size":5,"createdAt":1,"base64":"data:image/png;base64,aGVsbG8="},
            {"name":"b.png","type":"image/png","size":5,"createdAt":1,"base64":"data:image/png;base64,%%%"}
        ]}"#;
        let err = decode_at(text, 0).unwrap_err();
        match err {
            Error::InvalidFormat(reason) => assert!(reason.starts_with("item 1:"), "{reason}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_rejects_size_mismatch() {
        let text = r#"{"version":1,"items":[
            {"name":"a.png","type":"image/png","size":999999,"createdAt":1,"base64":"data:image/png;base64,aGVsbG8="}
        ]}"#;
        let err = decode_at(text, 0).unwrap_err();
        match err {
            Error::InvalidFormat(reason) => {
                assert!(reason.starts_with("item 0:"), "{reason}");
                assert!(reason.contains("999999"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_item_missing_required_field() {
        let text = r#"{"items":[{"name":"a.png","size":5,"base64":""}]}"#;
        let err = decode_at(text, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(ref r) if r.contains("item 0")));
    }

    #[test]
    fn test_default_export_file_name() {
        let now = chrono::Utc.with_ymd_and_hms(2026, 10, 19, 8, 5, 3).unwrap();
        assert_eq!(default_export_file_name(now), "galeria-20261019-080503.json");
    }
}
