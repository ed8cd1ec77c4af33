// W3C WebDriver client implementing Page
// Talks JSON over HTTP to geckodriver / chromedriver / selenium
// Element work is done by injected scripts (see scripts.rs), one round-trip per action

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::scripts::Script;
use super::{GridLayout, GridRow, Locator, Page};
use crate::config::{BrowserConfig, BrowserKind};
use crate::error::{Result, SweepError};

/// Viewport large enough for the results panel and both sliders without scrolling
const WINDOW_SIZE: (u32, u32) = (1400, 2400);

/// Build the `capabilities` payload for a new session
fn capabilities(config: &BrowserConfig) -> Value {
    let (width, height) = WINDOW_SIZE;
    match config.kind {
        BrowserKind::Firefox => {
            let mut args = vec![
                format!("--width={}", width),
                format!("--height={}", height),
            ];
            if config.headless {
                args.push("-headless".to_string());
            }
            json!({
                "capabilities": {
                    "alwaysMatch": {
                        "browserName": "firefox",
                        "acceptInsecureCerts": true,
                        "moz:firefoxOptions": { "args": args }
                    }
                }
            })
        }
        BrowserKind::Chrome => {
            let mut args = vec![
                format!("--window-size={},{}", width, height),
                "--disable-gpu".to_string(),
                "--no-sandbox".to_string(),
            ];
            if config.headless {
                args.push("--headless=new".to_string());
            }
            json!({
                "capabilities": {
                    "alwaysMatch": {
                        "browserName": "chrome",
                        "acceptInsecureCerts": true,
                        "goog:chromeOptions": { "args": args }
                    }
                }
            })
        }
    }
}

/// Map a WebDriver error body to the sweep taxonomy
///
/// Error codes follow W3C WebDriver (`value.error`); anything unrecognized is a transport-level
/// WebDriver error and therefore fatal.
fn wire_error(status: StatusCode, body: &Value) -> SweepError {
    let code = body
        .pointer("/value/error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = body
        .pointer("/value/message")
        .and_then(Value::as_str)
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .to_string();

    match code {
        "invalid session id" | "no such window" | "session not created" => {
            SweepError::SessionLost(format!("{}: {}", code, message))
        }
        "javascript error" | "no such element" | "stale element reference"
        | "element not interactable" | "script timeout" => {
            SweepError::Script(format!("{}: {}", code, message))
        }
        _ => SweepError::WebDriver(format!("{} (HTTP {}): {}", code, status.as_u16(), message)),
    }
}

/// A live browser session driven over the WebDriver protocol
pub struct WebDriverPage {
    client: Client,
    base_url: String,
    session_id: Option<String>,
}

impl WebDriverPage {
    /// Start a new browser session
    ///
    /// # Errors
    /// `Http` if the endpoint is unreachable, `WebDriver`/`SessionLost` if the driver refuses
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.command_timeout + Duration::from_secs(30))
            .build()?;

        let mut page = Self {
            client,
            base_url: config.webdriver_url.trim_end_matches('/').to_string(),
            session_id: None,
        };

        let response = page
            .send(Method::POST, "/session".to_string(), Some(capabilities(config)))
            .await?;
        let session_id = response
            .pointer("/sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SweepError::WebDriver(format!("new session response without sessionId: {}", response))
            })?
            .to_string();
        page.session_id = Some(session_id.clone());

        // the browser exists from here on; a failed setup must not leak it
        if let Err(e) = page.configure(config).await {
            if let Err(close_err) = page.close().await {
                warn!(error = %close_err, "failed to end session after setup error");
            }
            return Err(e);
        }

        info!(session_id = %session_id, browser = ?config.kind, headless = config.headless, "WebDriver session started");
        Ok(page)
    }

    async fn configure(&self, config: &BrowserConfig) -> Result<()> {
        let timeout_ms = config.command_timeout.as_millis() as u64;
        self.command(
            Method::POST,
            "timeouts",
            Some(json!({ "script": timeout_ms, "pageLoad": timeout_ms, "implicit": 0 })),
        )
        .await?;
        Ok(())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Issue a raw request and unwrap the `value` member of the response
    async fn send(&self, method: Method, path: String, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(wire_error(status, &payload));
        }

        Ok(payload.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Issue a command scoped to the current session
    async fn command(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<Value> {
        let session_id = self
            .session_id
            .as_deref()
            .ok_or_else(|| SweepError::SessionLost("session already closed".to_string()))?;
        let path = if endpoint.is_empty() {
            format!("/session/{}", session_id)
        } else {
            format!("/session/{}/{}", session_id, endpoint)
        };
        self.send(method, path, body).await
    }

    async fn execute(&self, script: Script, args: Vec<Value>) -> Result<Value> {
        debug!(script = script.name(), "execute");
        self.command(
            Method::POST,
            "execute/sync",
            Some(json!({ "script": script.source(), "args": args })),
        )
        .await
    }

    async fn execute_bool(&self, script: Script, args: Vec<Value>) -> Result<bool> {
        Ok(self.execute(script, args).await?.as_bool().unwrap_or(false))
    }

    async fn execute_string(&self, script: Script, args: Vec<Value>) -> Result<Option<String>> {
        Ok(self.execute(script, args).await?.as_str().map(str::to_string))
    }

    fn locator_arg(locator: &Locator) -> Result<Value> {
        serde_json::to_value(locator)
            .map_err(|e| SweepError::Script(format!("unserializable locator {}: {}", locator, e)))
    }
}

#[async_trait]
impl Page for WebDriverPage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.command(Method::POST, "url", Some(json!({ "url": url }))).await?;
        let state = self.execute_string(Script::ReadyState, vec![]).await?;
        debug!(url, ready_state = ?state, "navigated");
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<bool> {
        let args = vec![Self::locator_arg(locator)?, json!(value)];
        self.execute_bool(Script::Fill, args).await
    }

    async fn read_value(&mut self, locator: &Locator) -> Result<Option<String>> {
        let args = vec![Self::locator_arg(locator)?];
        self.execute_string(Script::ReadValue, args).await
    }

    async fn select(&mut self, locator: &Locator, value: &str, label: &str) -> Result<bool> {
        let args = vec![Self::locator_arg(locator)?, json!(value), json!(label)];
        self.execute_bool(Script::Select, args).await
    }

    async fn read_selection(&mut self, locator: &Locator) -> Result<Option<String>> {
        let args = vec![Self::locator_arg(locator)?];
        self.execute_string(Script::ReadSelection, args).await
    }

    async fn click(&mut self, locator: &Locator) -> Result<bool> {
        let args = vec![Self::locator_arg(locator)?];
        self.execute_bool(Script::Click, args).await
    }

    async fn set_slider(&mut self, locator: &Locator, value: u32) -> Result<bool> {
        let args = vec![Self::locator_arg(locator)?, json!(value)];
        self.execute_bool(Script::SetSlider, args).await
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool> {
        let args = vec![Self::locator_arg(locator)?];
        self.execute_bool(Script::IsVisible, args).await
    }

    async fn read_texts(&mut self, css: &str) -> Result<Vec<String>> {
        let value = self.execute(Script::ReadTexts, vec![json!(css)]).await?;
        Ok(value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn read_grid(&mut self, layout: &GridLayout) -> Result<Option<Vec<GridRow>>> {
        let layout_arg = serde_json::to_value(layout)
            .map_err(|e| SweepError::Script(format!("unserializable grid layout: {}", e)))?;
        let value = self.execute(Script::ReadGrid, vec![layout_arg]).await?;

        let rows = match value.as_array() {
            None => return Ok(None),
            Some(rows) => rows,
        };

        Ok(Some(
            rows.iter()
                .filter_map(|row| {
                    let label = row.get(0)?.as_str()?;
                    let value = row.get(1)?.as_str()?;
                    Some((label.to_string(), value.to_string()))
                })
                .collect(),
        ))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>> {
        let value = self.command(Method::GET, "screenshot", None).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| SweepError::WebDriver("screenshot response is not a string".to_string()))?;
        STANDARD
            .decode(encoded)
            .map_err(|e| SweepError::WebDriver(format!("screenshot is not valid base64: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        let session_id = match self.session_id.take() {
            Some(id) => id,
            None => return Ok(()),
        };

        let path = format!("/session/{}", session_id);
        match self.send(Method::DELETE, path, None).await {
            Ok(_) => {
                info!(session_id = %session_id, "WebDriver session closed");
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "failed to close WebDriver session");
                Err(e)
            }
        }
    }
}
