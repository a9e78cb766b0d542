//! Small helpers shared by the service and the binaries.

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in seconds.
pub fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Strip the web-service component prefix from a method name, if present.
pub fn bare_method_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix(METHOD_PREFIX).unwrap_or(name)
}

/// Prefix the host platform puts in front of this service's method names
pub const METHOD_PREFIX: &str = "local_aguiaplugin_";
