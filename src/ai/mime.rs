/// Media type for uploads that declare none and cannot be sniffed.
pub const FALLBACK_IMAGE_MIME: &str = "image/png";

/// Recognise JPEG, PNG and WebP by their leading magic bytes.
fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

/// Media type sent to the model for an uploaded image: the declared content
/// type when present, else sniffed, else [`FALLBACK_IMAGE_MIME`].
pub fn resolve_image_mime(declared: Option<&str>, bytes: &[u8]) -> String {
    if let Some(mime) = declared.map(str::trim).filter(|m| !m.is_empty()) {
        return mime.to_string();
    }

    match sniff_image_mime(bytes) {
        Some(mime) => mime.to_string(),
        None => {
            tracing::debug!(
                "Upload declares no content type and {} bytes are unrecognised; using {}",
                bytes.len(),
                FALLBACK_IMAGE_MIME
            );
            FALLBACK_IMAGE_MIME.to_string()
        }
    }
}
