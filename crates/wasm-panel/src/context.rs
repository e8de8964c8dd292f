//! Shared panel state, passed explicitly into every task and closure.

use std::cell::{Cell, RefCell};

use plotter_control::{Endpoint, EndpointConfig, MetadataCache, TargetTracker};
use plotter_types::{DeviceMetadata, PanelResult, PlotterStatus};
use wasm_bindgen::JsCast;

use crate::fetch::FetchClient;

/// Outcome of the most recent fire-and-forget command, left for the preview
/// loop to surface on its next successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Submitted,
    Failed(String),
}

/// Live state of one panel instance. Async callbacks reach it through an
/// `Rc<PanelContext>` captured at spawn time; there is no process-wide
/// singleton.
pub struct PanelContext {
    pub canvas_id: String,
    pub client: FetchClient,
    pub endpoints: RefCell<EndpointConfig>,
    pub metadata: RefCell<MetadataCache>,
    pub target: RefCell<TargetTracker>,
    pub boundary_check: Cell<bool>,
    pub status_line: RefCell<String>,
    pub plotter_status: RefCell<PlotterStatus>,
    pub last_command: RefCell<Option<CommandOutcome>>,
}

impl PanelContext {
    pub fn new(canvas_id: &str) -> Self {
        Self {
            canvas_id: canvas_id.to_string(),
            client: FetchClient::new(),
            endpoints: RefCell::new(EndpointConfig::new()),
            metadata: RefCell::new(MetadataCache::new()),
            target: RefCell::new(TargetTracker::default()),
            boundary_check: Cell::new(true),
            status_line: RefCell::new(String::new()),
            plotter_status: RefCell::new(PlotterStatus::default()),
            last_command: RefCell::new(None),
        }
    }

    pub fn set_status(&self, message: impl Into<String>) {
        *self.status_line.borrow_mut() = message.into();
    }

    /// Fetch fresh device geometry and replace the cache wholesale. On
    /// failure the previous generation stays in place. The target marker is
    /// re-projected under the new scale so it stays consistent with what the
    /// preview loop draws.
    pub async fn refresh_metadata(&self) -> PanelResult<()> {
        let url = self.endpoints.borrow().url_for(Endpoint::Metadata);
        let fetched: PanelResult<DeviceMetadata> = self.client.get_json(&url).await;
        self.metadata.borrow_mut().apply(fetched)?;

        if let Ok(mapper) = self.metadata.borrow().mapper() {
            self.target.borrow_mut().reproject(&mapper);
        }
        Ok(())
    }
}

/// Extract a cookie value from a `document.cookie`-style string.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim() == name {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

/// Read the anti-forgery token from the page's cookie store.
pub fn csrf_token_from_document() -> Option<String> {
    let document = web_sys::window()?.document()?;
    let html_document: web_sys::HtmlDocument = document.dyn_into().ok()?;
    let cookies = html_document.cookie().ok()?;
    cookie_value(&cookies, "csrftoken")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_value_finds_token_among_many() {
        let cookies = "sessionid=xyz; csrftoken=abc123; theme=dark";
        assert_eq!(cookie_value(cookies, "csrftoken").as_deref(), Some("abc123"));
        assert_eq!(cookie_value(cookies, "sessionid").as_deref(), Some("xyz"));
        assert_eq!(cookie_value(cookies, "missing"), None);
    }

    #[test]
    fn cookie_value_handles_empty_store() {
        assert_eq!(cookie_value("", "csrftoken"), None);
    }
}
