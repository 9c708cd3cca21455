//! Host extraction from submitted URLs.

use url::Url;

/// Host of a well-formed absolute URL, lowercased.
///
/// Returns `None` for anything the URL parser rejects or that has no host.
pub fn extract_domain(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

/// Host component used for look-alike comparison.
///
/// Falls back to the text before the first `/` when the input has no scheme
/// or does not parse, so bare inputs such as `paypa1.com/login` still
/// compare by their host.
pub fn host_component(raw: &str) -> String {
    extract_domain(raw).unwrap_or_else(|| {
        raw.trim()
            .split('/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://Login.Example.com:8443/path?q=1"),
            Some("login.example.com".to_string())
        );
        assert_eq!(extract_domain("example.com/path"), None);
        assert_eq!(extract_domain("not a url"), None);
        assert_eq!(extract_domain(""), None);
    }

    #[test]
    fn test_host_component_falls_back() {
        assert_eq!(host_component("http://paypa1.com/x"), "paypa1.com");
        assert_eq!(host_component("paypa1.com/login"), "paypa1.com");
        assert_eq!(host_component("Gooogle.com"), "gooogle.com");
    }
}
