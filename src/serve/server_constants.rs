/// Server constants and static-asset helpers
use std::path::Path;
use std::time::SystemTime;

/// Content type of every page response
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Path of the favicon, served from the assets directory
pub const FAVICON_PATH: &str = "/favicon.svg";

/// Static file cache control max-age for production (1 year in seconds)
pub const STATIC_CACHE_MAX_AGE: &str = "public, max-age=31536000, immutable";

/// MIME types for static file serving
pub const MIME_TYPES: &[(&str, &str)] = &[
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("map", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("html", "text/html"),
    ("json", "application/json"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("gif", "image/gif"),
];

/// Get the MIME type for a file based on its extension.
pub fn get_mime_type(file_path: &Path) -> &'static str {
    file_path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| MIME_TYPES.iter().find(|(k, _)| *k == ext).map(|(_, v)| *v))
        .unwrap_or("application/octet-stream")
}

/// Generate an ETag from a file's modification time.
pub fn generate_etag(modified: SystemTime) -> String {
    let secs = modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("\"{:x}\"", secs)
}

/// Resolve a request path below `root`, refusing anything that could escape it.
pub fn resolve_asset(root: &Path, relative: &str) -> Option<std::path::PathBuf> {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() || relative.contains("..") || relative.contains('\\') {
        return None;
    }
    Some(root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_mime_types() {
        assert_eq!(get_mime_type(Path::new("bundle.js")), "application/javascript");
        assert_eq!(get_mime_type(Path::new("favicon.svg")), "image/svg+xml");
        assert_eq!(get_mime_type(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn test_etag_is_hex_seconds() {
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(255);
        assert_eq!(generate_etag(modified), "\"ff\"");
    }

    #[test]
    fn test_resolve_asset_rejects_traversal() {
        let root = Path::new("/srv/assets");
        assert_eq!(
            resolve_asset(root, "/assets/bundle.js"),
            Some(root.join("assets/bundle.js"))
        );
        assert_eq!(resolve_asset(root, "../etc/passwd"), None);
        assert_eq!(resolve_asset(root, ""), None);
    }
}
