//! Host and token resolution.

use std::env;

use tracing::warn;

/// Host searched when nothing else is configured.
pub const DEFAULT_HOST: &str = "github.com";

/// Where requests go and how they authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub token: Option<String>,
}

impl Config {
    /// Resolve configuration from explicit values, falling back to the environment.
    ///
    /// Host: `host`, then `GH_HOST`, then [`DEFAULT_HOST`].
    /// Token: `token`, then `GH_TOKEN`, then `GITHUB_TOKEN`. Blank values count as unset.
    pub fn resolve(host: Option<String>, token: Option<String>) -> Self {
        Self::resolve_with(host, token, |name| env::var(name).ok())
    }

    fn resolve_with(
        host: Option<String>,
        token: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let host = non_blank(host)
            .or_else(|| non_blank(lookup("GH_HOST")))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let token = non_blank(token)
            .or_else(|| non_blank(lookup("GH_TOKEN")))
            .or_else(|| non_blank(lookup("GITHUB_TOKEN")));
        if token.is_none() {
            warn!("No GitHub token found; searching unauthenticated with a lower rate limit");
        }

        Config { host, token }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
