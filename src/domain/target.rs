use std::fmt;

use url::Url;

/// A monitored document address. Identity key for all per-target state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target(String);

impl Target {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse_url(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }

    /// Filesystem-safe label derived from the host, e.g. `news.example.com`
    /// for `https://www.news.example.com/a/b`.
    pub fn file_label(&self) -> String {
        let host = self
            .parse_url()
            .and_then(|url| {
                let host = url.host_str()?.to_string();
                Some(match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host,
                })
            })
            .unwrap_or_else(|| self.0.clone());
        let host = host.strip_prefix("www.").unwrap_or(&host);
        host.replace(['/', ':', '\\'], "_")
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
