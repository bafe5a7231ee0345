//! Origin Access Control
//!
//! The only security boundary in the system: decides whether a
//! browser-originated request may receive a response. Pure, total and
//! side-effect free; the allow-list is built once at startup and is
//! immutable afterwards.

use tracing::warn;

/// Origins always allowed, before any configuration.
const STATIC_ALLOWED_ORIGINS: &[&str] = &[
    "https://chatgpt.com",
    ".chatgpt.com",
    "https://chat.openai.com",
    ".openai.com",
    "http://localhost",
    "https://localhost",
    "http://127.0.0.1",
    "https://127.0.0.1",
    "vscode-webview://",
];

const LOCALHOST_ORIGINS: &[&str] = &[
    "http://localhost",
    "https://localhost",
    "http://127.0.0.1",
    "https://127.0.0.1",
];

/// One allow-list entry, as a typed matcher variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginRule {
    /// Exact string equality with the request origin.
    Exact(String),
    /// Entry ends in `://`; matches any origin starting with it.
    SchemePrefix(String),
    /// `http(s)://localhost` or `http(s)://127.0.0.1`, any port.
    LocalhostAnyPort(String),
    /// Leading-dot suffix: `.example.com` matches `example.com` and any
    /// subdomain of it.
    DomainSuffix(String),
}

impl OriginRule {
    pub fn parse(entry: &str) -> Self {
        if entry.ends_with("://") {
            OriginRule::SchemePrefix(entry.to_string())
        } else if LOCALHOST_ORIGINS.contains(&entry) {
            OriginRule::LocalhostAnyPort(entry.to_string())
        } else if entry.starts_with('.') {
            OriginRule::DomainSuffix(entry.to_string())
        } else {
            OriginRule::Exact(entry.to_string())
        }
    }

    pub fn matches(&self, origin: &str) -> bool {
        match self {
            OriginRule::Exact(entry) => origin == entry,
            OriginRule::SchemePrefix(prefix) => origin.starts_with(prefix.as_str()),
            OriginRule::LocalhostAnyPort(prefix) => origin.starts_with(prefix.as_str()),
            OriginRule::DomainSuffix(suffix) => {
                let Some(hostname) = origin_hostname(origin) else {
                    return false;
                };
                // Both checks are kept deliberately: they overlap for the
                // common case but diverge for single-label hosts.
                hostname == &suffix[1..] || hostname.ends_with(suffix.as_str())
            }
        }
    }
}

/// Ordered allow-list. First match wins; no match denies.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    rules: Vec<OriginRule>,
}

impl OriginPolicy {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: entries
                .into_iter()
                .map(|entry| OriginRule::parse(entry.as_ref()))
                .collect(),
        }
    }

    /// Build the startup policy: static table, then the public base URL's
    /// own origin plus a wildcard for its hostname, then the override
    /// list. Malformed inputs are skipped; a configuration typo must not
    /// crash startup.
    pub fn build(public_base_url: Option<&str>, extra_origins: Option<&str>) -> Self {
        let mut entries: Vec<String> = STATIC_ALLOWED_ORIGINS
            .iter()
            .map(|s| s.to_string())
            .collect();

        if let Some(url) = public_base_url {
            match parse_origin(url) {
                Some((origin, hostname)) => {
                    entries.push(origin);
                    entries.push(format!(".{}", hostname));
                }
                None => warn!("Ignoring malformed public base URL: {}", url),
            }
        }

        if let Some(extra) = extra_origins {
            for entry in extra.split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                // Dot-wildcards and scheme prefixes are valid entry forms
                // that parse_origin cannot represent.
                if !entry.starts_with('.') && !entry.ends_with("://") && parse_origin(entry).is_none()
                {
                    warn!("Ignoring malformed allowed-origin entry: {}", entry);
                    continue;
                }
                entries.push(entry.to_string());
            }
        }

        Self::from_entries(entries)
    }

    /// Whether a request with this `Origin` header may receive a response.
    ///
    /// A missing origin or the literal `"null"` is allowed: sandboxed
    /// iframes cannot supply a standard origin.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        let origin = match origin {
            None => return true,
            Some("null") => return true,
            Some(origin) => origin,
        };
        self.rules.iter().any(|rule| rule.matches(origin))
    }
}

/// Split an origin or URL into (`scheme://host[:port]`, hostname).
/// Returns None when there is no scheme or no host.
fn parse_origin(url: &str) -> Option<(String, String)> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next()?;
    if authority.is_empty() {
        return None;
    }
    let hostname = authority.split(':').next()?.to_string();
    if hostname.is_empty() {
        return None;
    }
    Some((format!("{}://{}", scheme, authority), hostname))
}

/// Hostname portion of an origin string, without port.
fn origin_hostname(origin: &str) -> Option<&str> {
    let rest = origin.split_once("://")?.1;
    let hostname = rest.split([':', '/']).next()?;
    if hostname.is_empty() {
        None
    } else {
        Some(hostname)
    }
}
