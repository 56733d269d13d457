// src/image_processing.rs
//
// Intake of uploaded injury photos: validation and base64 encoding for the
// completion request

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use thiserror::Error;

/// Uploads larger than this are rejected before they reach the model
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Request body limit for uploads: the base64 form of `MAX_IMAGE_BYTES` plus
/// room for a data URL prefix and the rest of the JSON body
pub const MAX_UPLOAD_BODY_BYTES: usize = MAX_IMAGE_BYTES.div_ceil(3) * 4 + 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("no image provided")]
    Empty,

    #[error("image is not valid base64")]
    InvalidBase64,

    #[error("unsupported image format; upload a JPEG, PNG or WEBP photo")]
    UnsupportedFormat,

    #[error("image is {0} bytes, over the 10 MiB limit")]
    TooLarge(usize),
}

/// An image ready to be sent as `inline_data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

/// MIME type from the file signature
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

pub fn encode_image(bytes: &[u8]) -> Result<EncodedImage, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge(bytes.len()));
    }
    let mime_type = sniff_mime_type(bytes).ok_or(ImageError::UnsupportedFormat)?;

    Ok(EncodedImage {
        mime_type: mime_type.to_string(),
        data: STANDARD.encode(bytes),
    })
}

/// Decode a base64 upload, with or without a `data:image/...;base64,` prefix.
pub fn decode_upload(upload: &str) -> Result<EncodedImage, ImageError> {
    let payload = upload.trim();
    let payload = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    if payload.is_empty() {
        return Err(ImageError::Empty);
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| ImageError::InvalidBase64)?;
    encode_image(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_sniffs_supported_formats() {
        assert_eq!(sniff_mime_type(JPEG_HEADER), Some("image/jpeg"));
        assert_eq!(
            sniff_mime_type(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Some("image/png")
        );
        assert_eq!(sniff_mime_type(b"RIFF\x24\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime_type(b"GIF89a"), None);
    }

    #[test]
    fn test_decode_upload_reencodes_jpeg() {
        let upload = STANDARD.encode(JPEG_HEADER);
        let image = decode_upload(&upload).unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, upload);

        let data_url = format!("data:image/jpeg;base64,{}", upload);
        assert_eq!(decode_upload(&data_url).unwrap(), image);
    }

    #[test]
    fn test_rejected_uploads() {
        assert_eq!(decode_upload("   "), Err(ImageError::Empty));
        assert_eq!(decode_upload("data:image/jpeg;base64,"), Err(ImageError::Empty));
        assert_eq!(decode_upload("not base64!"), Err(ImageError::InvalidBase64));
        assert_eq!(
            decode_upload(&STANDARD.encode(b"plain text")),
            Err(ImageError::UnsupportedFormat)
        );
        assert_eq!(encode_image(&[]), Err(ImageError::Empty));
    }

    #[test]
    fn test_size_limit() {
        let mut oversized = JPEG_HEADER.to_vec();
        oversized.resize(MAX_IMAGE_BYTES + 1, 0);
        assert_eq!(
            encode_image(&oversized),
            Err(ImageError::TooLarge(MAX_IMAGE_BYTES + 1))
        );
    }

    #[test]
    fn test_upload_body_limit_fits_largest_image() {
        let mut largest = JPEG_HEADER.to_vec();
        largest.resize(MAX_IMAGE_BYTES, 0);
        let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(&largest));
        assert!(data_url.len() < MAX_UPLOAD_BODY_BYTES);
    }
}
