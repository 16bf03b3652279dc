//! CSRF double-submit token access.
//!
//! The server sets a readable cookie whose value must be echoed in a header
//! on state-changing requests. The transport is abstracted behind
//! `CsrfProvider` so call sites don't care whether the token comes from a
//! cookie jar, a header capture, or a meta tag equivalent.

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;

pub trait CsrfProvider: Send + Sync {
    /// The current double-submit token, if the server has issued one.
    fn current(&self) -> Option<String>;
}

/// Reads the CSRF token out of the shared reqwest cookie jar.
pub struct CookieCsrfProvider {
    jar: Arc<Jar>,
    base_url: Url,
    cookie_name: String,
}

impl CookieCsrfProvider {
    pub fn new(jar: Arc<Jar>, base_url: Url, cookie_name: impl Into<String>) -> Self {
        Self {
            jar,
            base_url,
            cookie_name: cookie_name.into(),
        }
    }
}

impl CsrfProvider for CookieCsrfProvider {
    fn current(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        parse_cookie(cookies, &self.cookie_name)
    }
}

/// Extract a single cookie value from a `name=value; name2=value2` header.
fn parse_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_finds_named_value() {
        let header = "session=abc; XSRF-TOKEN=tok-123; theme=dark";
        assert_eq!(parse_cookie(header, "XSRF-TOKEN").as_deref(), Some("tok-123"));
    }

    #[test]
    fn test_parse_cookie_misses() {
        assert!(parse_cookie("session=abc", "XSRF-TOKEN").is_none());
        assert!(parse_cookie("", "XSRF-TOKEN").is_none());
        // Empty value is treated as absent
        assert!(parse_cookie("XSRF-TOKEN=", "XSRF-TOKEN").is_none());
    }

    #[test]
    fn test_cookie_provider_reads_jar() {
        let jar = Arc::new(Jar::default());
        let url: Url = "https://api.campus.example".parse().unwrap();
        jar.add_cookie_str("XSRF-TOKEN=fresh-token; Path=/", &url);

        let provider = CookieCsrfProvider::new(jar, url, "XSRF-TOKEN");
        assert_eq!(provider.current().as_deref(), Some("fresh-token"));
    }

    #[test]
    fn test_cookie_provider_empty_jar() {
        let jar = Arc::new(Jar::default());
        let url: Url = "https://api.campus.example".parse().unwrap();
        let provider = CookieCsrfProvider::new(jar, url, "XSRF-TOKEN");
        assert!(provider.current().is_none());
    }
}
