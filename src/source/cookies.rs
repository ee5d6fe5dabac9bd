//! Netscape `cookies.txt` support
//!
//! Session cookies exported from a browser are used to authenticate caption
//! requests. Only cookies scoped to the video site are kept.

use std::path::Path;

use crate::error::ServerError;

/// A single name/value cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub domain: String,
    pub name: String,
    pub value: String,
}

/// Cookies loaded from a Netscape cookie jar
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    /// Read and parse a cookie jar file
    pub fn from_file(path: &Path) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Config(format!(
                "cannot read cookies file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse Netscape cookie file content. Malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let cookies = content
            .lines()
            .filter_map(|line| {
                let line = line.trim_end_matches('\r');
                let line = match line.strip_prefix("#HttpOnly_") {
                    Some(rest) => rest,
                    None if line.starts_with('#') => return None,
                    None => line,
                };
                if line.trim().is_empty() {
                    return None;
                }

                let fields: Vec<&str> = line.split('\t').collect();
                if fields.len() != 7 {
                    return None;
                }
                Some(Cookie {
                    domain: fields[0].to_string(),
                    name: fields[5].to_string(),
                    value: fields[6].to_string(),
                })
            })
            .collect();

        Self { cookies }
    }

    /// Keep only cookies whose domain falls under `site`
    pub fn for_site(&self, site: &str) -> Self {
        let cookies = self
            .cookies
            .iter()
            .filter(|c| {
                let domain = c.domain.trim_start_matches('.');
                domain == site || domain.ends_with(&format!(".{}", site))
            })
            .cloned()
            .collect();
        Self { cookies }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Render as a `Cookie` request header value
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
