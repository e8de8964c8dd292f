//! User-configurable device endpoint root and the relative paths under it.

use plotter_types::{PanelError, PanelResult};
use url::Url;

/// Relative paths of the device HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Metadata,
    Image,
    Move,
    Zero,
    Unlock,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Metadata => "metadata",
            Endpoint::Image => "image",
            Endpoint::Move => "move",
            Endpoint::Zero => "zero",
            Endpoint::Unlock => "unlock",
        }
    }
}

/// Validated endpoint root plus the anti-forgery token configuration.
///
/// Rejected updates retain the previous root, so a typo in the URL field
/// never breaks a working connection.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    base: Url,
    csrf_token: Option<String>,
    attach_csrf: bool,
}

impl EndpointConfig {
    pub const DEFAULT_BASE: &'static str = "http://localhost:8000/plotter/";

    pub fn new() -> Self {
        Self {
            // The default is a compile-time constant and always parses.
            base: Url::parse(Self::DEFAULT_BASE).expect("default endpoint root parses"),
            csrf_token: None,
            attach_csrf: false,
        }
    }

    /// Replace the endpoint root. Malformed input and non-http(s) schemes are
    /// rejected and the previous root kept.
    pub fn set_base(&mut self, raw: &str) -> PanelResult<()> {
        let parsed = Url::parse(raw)
            .map_err(|e| PanelError::validation(format!("Invalid URL: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(PanelError::validation(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }
        // Joins replace the last path segment unless the base ends in '/'.
        self.base = if parsed.path().ends_with('/') {
            parsed
        } else {
            let mut with_slash = parsed;
            let path = format!("{}/", with_slash.path());
            with_slash.set_path(&path);
            with_slash
        };
        Ok(())
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn url_for(&self, endpoint: Endpoint) -> Url {
        // A relative single-segment join onto an http(s) base cannot fail.
        self.base
            .join(endpoint.path())
            .unwrap_or_else(|_| self.base.clone())
    }

    pub fn set_csrf_token(&mut self, token: Option<String>) {
        self.csrf_token = token;
    }

    pub fn set_attach_csrf(&mut self, attach: bool) {
        self.attach_csrf = attach;
    }

    /// Token to attach as a request header, if configured to do so.
    pub fn csrf_header(&self) -> Option<&str> {
        if self.attach_csrf {
            self.csrf_token.as_deref()
        } else {
            None
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_endpoint_paths() {
        let config = EndpointConfig::new();
        assert_eq!(
            config.url_for(Endpoint::Metadata).as_str(),
            "http://localhost:8000/plotter/metadata"
        );
        assert_eq!(
            config.url_for(Endpoint::Move).as_str(),
            "http://localhost:8000/plotter/move"
        );
    }

    #[test]
    fn invalid_url_retains_previous_base() {
        let mut config = EndpointConfig::new();
        let before = config.base().clone();

        assert!(config.set_base("not a url").is_err());
        assert!(config.set_base("ftp://device.local/plotter/").is_err());
        assert_eq!(config.base(), &before);
    }

    #[test]
    fn missing_trailing_slash_is_normalized() {
        let mut config = EndpointConfig::new();
        config.set_base("http://192.168.1.20:8000/plotter").unwrap();
        assert_eq!(
            config.url_for(Endpoint::Image).as_str(),
            "http://192.168.1.20:8000/plotter/image"
        );
    }

    #[test]
    fn csrf_header_requires_opt_in() {
        let mut config = EndpointConfig::new();
        config.set_csrf_token(Some("abc123".into()));
        assert_eq!(config.csrf_header(), None);

        config.set_attach_csrf(true);
        assert_eq!(config.csrf_header(), Some("abc123"));
    }
}
