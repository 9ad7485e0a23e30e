use std::path::Path;

/// Sniff the media type from magic bytes, falling back to the file extension.
pub fn detect_mime(bytes: &[u8], path: Option<&Path>) -> String {
    if let Some(mime) = sniff_magic(bytes) {
        return mime.to_string();
    }

    let from_extension = path
        .and_then(|p| p.extension())
        .and_then(|ext| ext.to_str())
        .and_then(mime_for_extension);

    match from_extension {
        Some(mime) => mime.to_string(),
        None => {
            tracing::warn!(
                "Unrecognized file format (first 4 bytes: {:02X?}), falling back to application/octet-stream",
                &bytes[..bytes.len().min(4)]
            );
            "application/octet-stream".to_string()
        }
    }
}

fn sniff_magic(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, ..] => Some("video/mp4"),
        _ => None,
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "mp4" => Some("video/mp4"),
        _ => None,
    }
}
