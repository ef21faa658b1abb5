//! Extension allow-list and MIME mapping for conversion targets.

/// Extensions the conversion form accepts, for both source and target.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "pdf", "png", "doc"];

/// Whether an extension is a member of the allow-list.
pub fn is_allowed_extension(ext: &str) -> bool {
    ALLOWED_EXTENSIONS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(ext))
}

/// Map a file extension to its MIME content type.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
