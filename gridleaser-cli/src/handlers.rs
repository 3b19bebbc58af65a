use axum::http::HeaderMap;
use serde::Serialize;

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub uid: String,
}

// ─── Session Helpers ────────────────────────────────────────────────────────

/// The opaque client token assigned at login, carried back as a cookie.
pub fn uid_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("uid="))
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
}

/// Browser-style XHR marker required on task traffic.
pub fn is_xhr(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// Entity-escape client-supplied values before interpolating them into
/// the stats page. Owner tokens and result payloads are untrusted.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("uid")</script>"#),
            "&lt;script&gt;alert(&quot;uid&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("owner-a&b'c"), "owner-a&amp;b&#39;c");
        assert_eq!(escape_html("plain_token-1"), "plain_token-1");
    }

    #[test]
    fn test_uid_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("theme=dark; uid=abc12"));
        assert_eq!(uid_cookie(&headers), Some("abc12".to_string()));

        headers.insert("cookie", HeaderValue::from_static("uid="));
        assert_eq!(uid_cookie(&headers), None);

        headers.remove("cookie");
        assert_eq!(uid_cookie(&headers), None);
    }
}
