//! MIME type detection for files served by the content origin.

/// Get MIME Content-Type based on file extension
///
/// Extensions are matched case-insensitively.
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    let extension = extension.map(str::to_ascii_lowercase);
    match extension.as_deref() {
        // Video
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogv") => "video/ogg",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("ts") => "video/mp2t",

        // Audio tracks served alongside
        Some("m4a") => "audio/mp4",
        Some("mp3") => "audio/mpeg",

        // Pages and subtitles
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("vtt") => "text/vtt",

        // Default
        _ => "application/octet-stream",
    }
}
