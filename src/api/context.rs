//! Immutable per-run request context.

use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::error::{Error, Result};

/// Default browser user agent attached to every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Headers attached to every metadata and download request.
///
/// Built once per run from the configured credentials and never mutated
/// afterwards; the cookie is treated as an opaque, possibly stale credential.
/// Requests failing because of it surface as ordinary retryable errors.
#[derive(Debug, Clone)]
pub struct RequestContext {
    headers: HeaderMap,
}

impl RequestContext {
    /// Build the context from an optional cookie string and a user agent.
    pub fn new(cookie: Option<&str>, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            parse_header_value("user_agent", user_agent)?,
        );
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://www.douyin.com/"),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
        );
        // brotli responses decode inconsistently upstream; stick to gzip.
        headers.insert(
            header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );

        if let Some(cookie) = cookie {
            let cookie = cookie.trim();
            if !cookie.is_empty() {
                headers.insert(header::COOKIE, parse_header_value("cookie", cookie)?);
            }
        }

        Ok(Self { headers })
    }

    /// Header map for one outgoing request.
    pub fn headers(&self) -> HeaderMap {
        self.headers.clone()
    }

    /// Whether a cookie credential is attached.
    pub fn has_cookie(&self) -> bool {
        self.headers.contains_key(header::COOKIE)
    }
}

fn parse_header_value(field: &str, value: &str) -> Result<HeaderValue> {
    value.parse().map_err(|_| Error::ConfigValidation {
        field: field.to_string(),
        message: "contains characters not allowed in an HTTP header".to_string(),
    })
}
