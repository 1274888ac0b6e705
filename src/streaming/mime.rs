//! Response content type and disposition.

/// Pick the content type for an object.
///
/// Browsers refuse to play some video types when served with the generic type
/// an upstream reports, so well-known video extensions override it.
pub fn content_type(file_name: &str, upstream: Option<&str>) -> String {
    let lower = file_name.to_ascii_lowercase();
    let sniffed = if lower.ends_with(".mkv") {
        Some("video/x-matroska")
    } else if lower.ends_with(".webm") {
        Some("video/webm")
    } else if lower.ends_with(".mp4") {
        Some("video/mp4")
    } else {
        None
    };

    sniffed
        .or(upstream.filter(|m| !m.is_empty()))
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// File name to present for an object, inventing one when the source has none.
pub fn display_name(file_name: Option<&str>) -> String {
    match file_name.filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => {
            let suffix: [u8; 2] = rand::random();
            format!("{:02x}{:02x}.bin", suffix[0], suffix[1])
        }
    }
}

/// Value of the `Content-Disposition` header.
pub fn content_disposition(file_name: &str, download: bool) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c.is_control() { '_' } else { c })
        .collect();
    let kind = if download { "attachment" } else { "inline" };
    format!("{kind}; filename=\"{safe}\"")
}
