//! Payload extraction: turns a request body into a single `FilePayload`.
//!
//! Two encodings are supported and the route decides which one applies:
//! - `Json`: `{ "csv": "...", "originalName": "..." }`, optionally base64
//!   transport-encoded as a whole.
//! - `Multipart`: `multipart/form-data`, first part that carries a file name.

use crate::{
    errors::UploadError,
    models::payload::{FilePayload, UploadRequest},
};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use futures::stream;
use std::convert::Infallible;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    Json,
    Multipart,
}

impl ExtractMode {
    pub async fn extract(self, request: &UploadRequest) -> Result<FilePayload, UploadError> {
        match self {
            ExtractMode::Json => extract_json(&request.body, request.is_base64_encoded),
            ExtractMode::Multipart => {
                extract_multipart(request.content_type.as_deref(), request.body.clone()).await
            }
        }
    }
}

/// Decode the JSON envelope.
///
/// Malformed JSON and a missing or empty `csv` field are both client errors,
/// told apart only by message.
pub fn extract_json(body: &[u8], is_base64_encoded: bool) -> Result<FilePayload, UploadError> {
    let decoded;
    let raw: &[u8] = if is_base64_encoded {
        decoded = general_purpose::STANDARD
            .decode(trim_ascii_whitespace(body))
            .map_err(|err| {
                debug!("base64 body rejected: {}", err);
                UploadError::InvalidEncoding
            })?;
        &decoded
    } else {
        body
    };

    let text = std::str::from_utf8(raw).map_err(|_| UploadError::InvalidJson)?;
    let data: Value = serde_json::from_str(text).map_err(|err| {
        debug!("JSON body rejected: {}", err);
        UploadError::InvalidJson
    })?;
    let object = data.as_object().ok_or(UploadError::InvalidJson)?;

    let csv = object
        .get("csv")
        .and_then(Value::as_str)
        .filter(|csv| !csv.is_empty())
        .ok_or(UploadError::MissingCsv)?;

    let original_name = object
        .get("originalName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_owned);

    Ok(FilePayload {
        content: Bytes::copy_from_slice(csv.as_bytes()),
        original_name,
    })
}

/// Pull the first file part out of a `multipart/form-data` body.
///
/// The body is already buffered, so it is parsed without any size limit.
pub async fn extract_multipart(
    content_type: Option<&str>,
    body: Bytes,
) -> Result<FilePayload, UploadError> {
    let boundary = content_type
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(UploadError::NoFile)?;

    let body_stream = stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(body_stream, boundary);

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(UploadError::NoFile),
            Err(err) => {
                debug!("multipart field rejected: {}", err);
                return Err(UploadError::NoFile);
            }
        };

        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let content = field.bytes().await.map_err(|err| {
            debug!("reading multipart file `{}` failed: {}", file_name, err);
            UploadError::NoFile
        })?;
        if content.is_empty() {
            return Err(UploadError::NoFile);
        }

        return Ok(FilePayload {
            content,
            original_name: Some(file_name).filter(|name| !name.is_empty()),
        });
    }
}

fn trim_ascii_whitespace(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "X-RELAY-BOUNDARY";

    fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> Bytes {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Bytes::from(body)
    }

    fn multipart_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    #[test]
    fn json_with_csv_and_name() {
        let payload =
            extract_json(br#"{"csv":"a,b\n1,2","originalName":"My File!.txt"}"#, false).unwrap();
        assert_eq!(payload.content, Bytes::from_static(b"a,b\n1,2"));
        assert_eq!(payload.original_name.as_deref(), Some("My File!.txt"));
    }

    #[test]
    fn json_without_name_uses_placeholder() {
        let payload = extract_json(br#"{"csv":"a,b"}"#, false).unwrap();
        assert!(payload.original_name.is_none());
        assert_eq!(payload.original_name_or_default(), "TestStock.csv");
    }

    #[test]
    fn base64_and_raw_bodies_agree() {
        let raw = br#"{"csv":"x,y\n3,4","originalName":"stock.csv"}"#;
        let encoded = general_purpose::STANDARD.encode(raw);
        let from_raw = extract_json(raw, false).unwrap();
        let from_b64 = extract_json(encoded.as_bytes(), true).unwrap();
        assert_eq!(from_raw, from_b64);
    }

    #[test]
    fn missing_or_empty_csv_is_rejected() {
        for body in [
            r#"{"originalName":"a.csv"}"#,
            r#"{"csv":""}"#,
            r#"{"csv":null}"#,
            r#"{"csv":42}"#,
        ] {
            let err = extract_json(body.as_bytes(), false).unwrap_err();
            assert!(matches!(err, UploadError::MissingCsv), "{body}");
        }
    }

    #[test]
    fn malformed_json_is_rejected() {
        for body in ["", "{not json", "[1,2]", "\"csv\""] {
            let err = extract_json(body.as_bytes(), false).unwrap_err();
            assert!(matches!(err, UploadError::InvalidJson), "{body:?}");
        }
    }

    #[test]
    fn bad_base64_is_rejected() {
        let err = extract_json(b"!!!not-base64!!!", true).unwrap_err();
        assert!(matches!(err, UploadError::InvalidEncoding));
    }

    #[tokio::test]
    async fn multipart_takes_first_file_part() {
        let body = multipart_body(&[
            ("note", None, "ignored"),
            ("file", Some("stock.csv"), "a,b\n1,2"),
            ("other", Some("second.csv"), "c,d"),
        ]);
        let payload = extract_multipart(Some(&multipart_type()), body).await.unwrap();
        assert_eq!(payload.content, Bytes::from_static(b"a,b\n1,2"));
        assert_eq!(payload.original_name.as_deref(), Some("stock.csv"));
    }

    #[tokio::test]
    async fn multipart_file_larger_than_two_mib_is_accepted() {
        let content = "sku,qty\n".repeat(400_000);
        assert!(content.len() > 2 * 1024 * 1024);
        let body = multipart_body(&[("file", Some("big.csv"), &content)]);
        let payload = extract_multipart(Some(&multipart_type()), body).await.unwrap();
        assert_eq!(payload.content.len(), content.len());
        assert_eq!(payload.original_name.as_deref(), Some("big.csv"));
    }

    #[tokio::test]
    async fn multipart_without_file_is_rejected() {
        let body = multipart_body(&[("note", None, "just text")]);
        let err = extract_multipart(Some(&multipart_type()), body).await.unwrap_err();
        assert!(matches!(err, UploadError::NoFile));
    }

    #[tokio::test]
    async fn non_multipart_body_is_rejected() {
        let err = extract_multipart(Some("application/json"), Bytes::from_static(b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NoFile));

        let err = extract_multipart(None, Bytes::new()).await.unwrap_err();
        assert!(matches!(err, UploadError::NoFile));
    }
}
