/*!
 * Configuration
 * Environment-driven server and site settings
 */
use serde::Serialize;
use std::{str::FromStr, time::Duration};
use url::Url;

/// How the site is packaged for deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Static,
    #[default]
    Server,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" | "export" => Ok(OutputMode::Static),
            "server" | "standalone" => Ok(OutputMode::Server),
            other => Err(format!("unknown output mode '{}'", other)),
        }
    }
}

/// Image handling: optimization toggle and the remote hosts images may come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageConfig {
    pub unoptimized: bool,
    /// Host patterns: `**` (any), `**.example.com` (any subdomain depth),
    /// `*.example.com` (one subdomain level) or an exact host.
    pub remote_hosts: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            unoptimized: true,
            remote_hosts: vec!["**".to_string()],
        }
    }
}

impl ImageConfig {
    /// Whether an image reference may be used. Site-relative paths are always allowed.
    pub fn allows(&self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() || is_site_relative(url) {
            return true;
        }
        let Some(host) = image_host(url) else {
            return false;
        };
        self.remote_hosts
            .iter()
            .any(|pattern| host_matches(pattern, &host))
    }
}

/// `/path` but not `//host` or `/\host`, which browsers resolve off-site.
fn is_site_relative(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\")
}

/// Host of an absolute http(s) URL, lowercased by the parser.
fn image_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().map(str::to_string)
}

/// `**` any host, `**.d` any depth below `d`, `*.d` exactly one label below `d`.
fn host_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    if pattern == "**" {
        return true;
    }
    if let Some(domain) = pattern.strip_prefix("**.") {
        return host
            .strip_suffix(domain)
            .is_some_and(|sub| sub.len() > 1 && sub.ends_with('.'));
    }
    if let Some(domain) = pattern.strip_prefix("*.") {
        return host
            .strip_suffix(domain)
            .and_then(|sub| sub.strip_suffix('.'))
            .is_some_and(|label| !label.is_empty() && !label.contains('.'));
    }
    host == pattern
}

/// Deployment packaging options, exposed read-only at `/api/site`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteConfig {
    pub output: OutputMode,
    pub images: ImageConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// How long a dashboard banner stays visible.
    pub banner_ttl: Duration,
    pub site: SiteConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            environment: "development".to_string(),
            banner_ttl: Duration::from_millis(3000),
            site: SiteConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let output = std::env::var("SITE_OUTPUT")
            .ok()
            .and_then(|s| match s.parse() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    tracing::warn!("Ignoring SITE_OUTPUT: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        let unoptimized = std::env::var("IMAGES_UNOPTIMIZED")
            .map(|s| matches!(s.trim(), "1" | "true" | "yes"))
            .unwrap_or(defaults.site.images.unoptimized);

        let remote_hosts = std::env::var("IMAGE_REMOTE_HOSTS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|h| h.trim().to_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|hosts| !hosts.is_empty())
            .unwrap_or(defaults.site.images.remote_hosts);

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            banner_ttl: std::env::var("BANNER_TTL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.banner_ttl),
            site: SiteConfig {
                output,
                images: ImageConfig {
                    unoptimized,
                    remote_hosts,
                },
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
