//! Decides which responses are worth writing to disk.

use serde_json::Value;

use crate::TEXT_MIME_HINTS;

/// True when the content-type names a text-like format we keep.
pub fn should_save(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type.map(str::trim).filter(|ct| !ct.is_empty()) else {
        return false;
    };
    let ct = ct.to_ascii_lowercase();
    TEXT_MIME_HINTS.iter().any(|hint| ct.contains(hint))
}

/// 2xx, or 0 for responses that never touched the network (service worker,
/// memory cache).
pub fn is_success(status: u32) -> bool {
    status == 0 || (200..300).contains(&status)
}

/// Looks up a header in a CDP header object, ignoring case.
pub fn header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    headers
        .as_object()?
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .and_then(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_text_like_types() {
        assert!(should_save(Some("text/html; charset=utf-8")));
        assert!(should_save(Some("application/javascript")));
        assert!(should_save(Some("text/css")));
        assert!(should_save(Some("Application/JSON")));
        assert!(should_save(Some("image/svg+xml")));
        assert!(should_save(Some("application/ecmascript")));
    }

    #[test]
    fn drops_binary_and_missing_types() {
        assert!(!should_save(Some("image/png")));
        assert!(!should_save(Some("font/woff2")));
        assert!(!should_save(Some("application/octet-stream")));
        assert!(!should_save(Some("")));
        assert!(!should_save(Some("   ")));
        assert!(!should_save(None));
    }

    #[test]
    fn ok_statuses() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(is_success(0));
        assert!(!is_success(304));
        assert!(!is_success(404));
        assert!(!is_success(500));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let h2 = json!({ "content-type": "text/css" });
        let h1 = json!({ "Content-Type": "text/html" });
        assert_eq!(header_value(&h2, "content-type"), Some("text/css"));
        assert_eq!(header_value(&h1, "content-type"), Some("text/html"));
        assert_eq!(header_value(&h1, "etag"), None);
        assert_eq!(header_value(&Value::Null, "content-type"), None);
    }
}
