//! Cookie writing and reading for the auth tokens.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use tracing::error;

use crate::config::CookieConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub path: &'static str,
    pub max_age_secs: u64,
}

impl CookieOptions {
    pub fn auth(cfg: &CookieConfig, max_age_secs: u64) -> Self {
        Self {
            http_only: true,
            secure: cfg.secure,
            path: "/",
            max_age_secs,
        }
    }

    fn render(&self, name: &str, value: &str) -> String {
        let mut cookie = format!(
            "{name}={value}; Path={}; SameSite=Lax; Max-Age={}",
            self.path, self.max_age_secs
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Destination for cookies set while handling a request.
pub trait CookieSink {
    fn cookie(&mut self, name: &str, value: &str, options: &CookieOptions);
}

/// Collects cookies as `Set-Cookie` response headers.
#[derive(Debug, Default)]
pub struct ResponseCookies {
    headers: HeaderMap,
}

impl ResponseCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }
}

impl CookieSink for ResponseCookies {
    fn cookie(&mut self, name: &str, value: &str, options: &CookieOptions) {
        match HeaderValue::from_str(&options.render(name, value)) {
            Ok(v) => {
                self.headers.append(SET_COOKIE, v);
            }
            Err(e) => error!(error = %e, cookie = name, "invalid cookie header value"),
        }
    }
}

/// Value of the named cookie from the request `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, val)| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
