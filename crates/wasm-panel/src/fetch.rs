//! Browser HTTP client for the device endpoints, built on the fetch API.

use js_sys::Uint8Array;
use plotter_types::{PanelError, PanelResult, PlotterStatus, Vec3};
use url::Url;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

/// Header name the anti-forgery token travels under when attached.
pub const CSRF_HEADER: &str = "X-CSRFToken";

const STATE_HEADER: &str = "Plotter-State";
const POSITION_HEADER: &str = "Plotter-Position";

/// One preview frame: the raw image bytes plus the machine state that rode
/// along in the response headers.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub image_bytes: Vec<u8>,
    pub content_type: String,
    pub status: PlotterStatus,
}

/// Thin wrapper over `window.fetch`. No request timeouts are imposed; a hang
/// is indistinguishable from a slow device until the transport gives up.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchClient;

impl FetchClient {
    pub fn new() -> Self {
        Self
    }

    fn window() -> PanelResult<web_sys::Window> {
        web_sys::window().ok_or_else(|| PanelError::transport("No window object available"))
    }

    fn build_request(url: &Url, method: &str, body: Option<&str>) -> PanelResult<Request> {
        let opts = RequestInit::new();
        opts.set_method(method);
        if let Some(body) = body {
            opts.set_body(&JsValue::from_str(body));
        }
        Ok(Request::new_with_str_and_init(url.as_str(), &opts)?)
    }

    async fn dispatch(request: &Request) -> PanelResult<Response> {
        let window = Self::window()?;
        let resp_value = JsFuture::from(window.fetch_with_request(request))
            .await
            .map_err(|e| PanelError::transport(format!("Fetch failed: {e:?}")))?;
        let resp: Response = resp_value
            .dyn_into()
            .map_err(|_| PanelError::transport("Fetch did not yield a Response"))?;

        if !resp.ok() {
            return Err(PanelError::transport(format!(
                "HTTP error: status {}",
                resp.status()
            )));
        }
        Ok(resp)
    }

    /// GET a JSON body and deserialize it.
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> PanelResult<T> {
        let request = Self::build_request(url, "GET", None)?;
        request.headers().set("Accept", "application/json")?;

        let resp = Self::dispatch(&request).await?;
        let text = JsFuture::from(resp.text()?).await?;
        let text: String = text.as_string().unwrap_or_default();

        Ok(serde_json::from_str(&text)?)
    }

    /// GET the preview snapshot: binary image payload plus the two machine
    /// state headers. A missing or malformed header fails the whole poll.
    pub async fn get_snapshot(&self, url: &Url) -> PanelResult<Snapshot> {
        let request = Self::build_request(url, "GET", None)?;
        let resp = Self::dispatch(&request).await?;

        let status = Self::status_from_headers(&resp.headers())?;
        let content_type = resp
            .headers()
            .get("Content-Type")
            .ok()
            .flatten()
            .unwrap_or_else(|| "image/png".to_string());

        let array_buffer = JsFuture::from(resp.array_buffer()?).await?;
        let uint8_array = Uint8Array::new(&array_buffer);
        let mut image_bytes = vec![0u8; uint8_array.length() as usize];
        uint8_array.copy_to(&mut image_bytes);

        Ok(Snapshot {
            image_bytes,
            content_type,
            status,
        })
    }

    fn status_from_headers(headers: &Headers) -> PanelResult<PlotterStatus> {
        let state = headers
            .get(STATE_HEADER)
            .ok()
            .flatten()
            .ok_or_else(|| PanelError::transport(format!("Missing {STATE_HEADER} header")))?;
        let position_json = headers
            .get(POSITION_HEADER)
            .ok()
            .flatten()
            .ok_or_else(|| PanelError::transport(format!("Missing {POSITION_HEADER} header")))?;
        let position: Vec3 = serde_json::from_str(&position_json)?;

        Ok(PlotterStatus { state, position })
    }

    /// POST a JSON body, fire-and-forget: only the transport outcome is
    /// reported, the response body is ignored.
    pub async fn post_json<B: serde::Serialize>(
        &self,
        url: &Url,
        body: &B,
        csrf_token: Option<&str>,
    ) -> PanelResult<()> {
        let payload = serde_json::to_string(body)?;
        let request = Self::build_request(url, "POST", Some(&payload))?;
        request.headers().set("Content-Type", "application/json")?;
        if let Some(token) = csrf_token {
            request.headers().set(CSRF_HEADER, token)?;
        }

        Self::dispatch(&request).await?;
        Ok(())
    }

    /// Bare GET notification with no payload and no response handling.
    pub async fn notify(&self, url: &Url) -> PanelResult<()> {
        let request = Self::build_request(url, "GET", None)?;
        Self::dispatch(&request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn non_2xx_is_a_transport_error() {
        let client = FetchClient::new();
        let url = Url::parse("http://localhost:1/unreachable/metadata").unwrap();
        let result: PanelResult<serde_json::Value> = client.get_json(&url).await;
        assert!(result.is_err());
    }
}
