//! Inline image encoding
//!
//! Uploaded images are embedded into the place as a `data:` URI so the
//! persisted wishlist is self-contained.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("image is empty")]
    Empty,

    #[error("unsupported image format ({0})")]
    Unsupported(String),

    #[error("invalid image encoding: {0}")]
    Encoding(String),
}

/// Image as supplied with a submission
#[derive(Debug, Clone)]
pub enum ImageUpload {
    Bytes(Vec<u8>),
    /// Bare base64 or a `data:<mime>;base64,<payload>` URI
    Base64(String),
}

impl ImageUpload {
    pub fn into_bytes(self) -> Result<Vec<u8>, ImageError> {
        match self {
            ImageUpload::Bytes(bytes) => Ok(bytes),
            ImageUpload::Base64(encoded) => {
                let payload = match encoded.split_once(";base64,") {
                    Some((prefix, payload)) if prefix.starts_with("data:") => payload,
                    _ => encoded.as_str(),
                };

                STANDARD
                    .decode(payload.trim())
                    .map_err(|e| ImageError::Encoding(e.to_string()))
            }
        }
    }
}

/// Encode raw image bytes as a base64 `data:` URI
///
/// The MIME type is sniffed from the content; anything that is not an image
/// is rejected.
pub fn encode_data_uri(bytes: &[u8]) -> Result<String, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }

    let kind = infer::get(bytes).ok_or_else(|| ImageError::Unsupported("unknown".to_string()))?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(ImageError::Unsupported(kind.mime_type().to_string()));
    }

    Ok(format!(
        "data:{};base64,{}",
        kind.mime_type(),
        STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 16] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    #[test]
    fn test_png_becomes_data_uri() {
        let uri = encode_data_uri(&PNG_HEADER).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(uri, format!("data:image/png;base64,{}", STANDARD.encode(PNG_HEADER)));
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(encode_data_uri(&[]), Err(ImageError::Empty));
    }

    #[test]
    fn test_base64_upload_accepts_data_uri() {
        let bare = ImageUpload::Base64("iVBORw0=".to_string()).into_bytes().unwrap();
        let uri = ImageUpload::Base64("data:image/png;base64,iVBORw0=".to_string())
            .into_bytes()
            .unwrap();
        assert_eq!(bare, uri);
        assert_eq!(&bare[..3], &[0x89, 0x50, 0x4E]);
    }

    #[test]
    fn test_base64_upload_rejects_garbage() {
        assert!(matches!(
            ImageUpload::Base64("not base64!".to_string()).into_bytes(),
            Err(ImageError::Encoding(_))
        ));
    }

    #[test]
    fn test_non_image_rejected() {
        // PDF magic
        let result = encode_data_uri(b"%PDF-1.7\n");
        assert_eq!(result, Err(ImageError::Unsupported("application/pdf".to_string())));

        assert!(matches!(
            encode_data_uri(b"plain text"),
            Err(ImageError::Unsupported(_))
        ));
    }
}
