//! Local names for downloaded dataset files.
//!
//! The download endpoint usually names its payload through
//! `Content-Disposition`; when it doesn't, the dataset slug is used.

mod content_disposition;
mod sanitize;

pub use content_disposition::parse_content_disposition_filename;
pub use sanitize::sanitize_filename;

/// Picks the on-disk name for a downloaded payload.
///
/// Prefers the server-provided name (sanitized); falls back to `{slug}.zip`,
/// which is what the service sends for multi-file datasets.
pub fn payload_filename(content_disposition: Option<&str>, slug: &str) -> String {
    let from_header = content_disposition
        .and_then(parse_content_disposition_filename)
        .map(|raw| sanitize_filename(&raw))
        .filter(|s| !s.is_empty() && s != "." && s != "..");

    match from_header {
        Some(name) => name,
        None => {
            let base = sanitize_filename(slug);
            if base.is_empty() {
                "dataset.zip".to_string()
            } else {
                format!("{}.zip", base)
            }
        }
    }
}
