//! Sessioned client for the Piwigo WallDisplay plugin.
//!
//! The plugin does not answer an expired session with an HTTP error; it
//! returns the plain-text body `Not Logged In`. Every plugin call therefore
//! checks for that body, logs in again and repeats the request once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::WallDisplayConfig;
use crate::error::{Result, WallDisplayError};
use crate::flatten::GalleryTreeFlattener;
use crate::model::ToggleableItem;
use crate::transport::{HttpResponse, Transport};
use crate::tree::RawTree;

/// Body the plugin sends instead of JSON when the session has expired.
pub const NOT_LOGGED_IN: &str = "Not Logged In";

/// Piwigo web-service entry point, used for login.
pub const LOGIN_PATH: &str = "/ws.php";

/// WallDisplay plugin endpoint.
pub const PLUGIN_PATH: &str = "/plugins/WallDisplay/api_wall_display.inc.php";

#[derive(Debug, Deserialize)]
struct LoginReply {
    #[serde(default)]
    stat: Option<String>,
}

/// Client for one configured Piwigo server.
pub struct SessionedClient {
    base_url: String,
    username: String,
    password: String,
    transport: Arc<dyn Transport>,
    flattener: GalleryTreeFlattener,
    connected: AtomicBool,
}

impl std::fmt::Debug for SessionedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionedClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl SessionedClient {
    /// Create a client over an existing transport.
    pub fn new(config: &WallDisplayConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            transport,
            flattener: GalleryTreeFlattener::new(config.controller_name()),
            connected: AtomicBool::new(false),
        }
    }

    /// Create a client with a `reqwest` transport honouring the configured timeout.
    #[cfg(feature = "http")]
    pub fn from_config(config: &WallDisplayConfig) -> Result<Self> {
        config.validate()?;
        let transport = crate::transport::ReqwestTransport::new(config.timeout())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Namespace prefix of this connection's unique keys.
    pub fn controller_name(&self) -> &str {
        self.flattener.controller_name()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Log in with the configured credentials.
    ///
    /// Any reply other than `{"stat": "ok"}`, including an unreachable host,
    /// is an [`WallDisplayError::Auth`].
    pub async fn connect(&self) -> Result<()> {
        self.connected.store(false, Ordering::Relaxed);

        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        let query = [
            ("format", "json".to_string()),
            ("method", "pwg.session.login".to_string()),
        ];
        let form = [
            ("username", self.username.clone()),
            ("password", self.password.clone()),
        ];

        let response = self
            .transport
            .post_form(&url, &query, &form)
            .await
            .map_err(|e| WallDisplayError::Auth(format!("Cannot reach {}: {}", self.base_url, e)))?;

        let reply: LoginReply = serde_json::from_str(&response.body).map_err(|e| {
            WallDisplayError::Auth(format!("Unexpected login response: {}", e))
        })?;

        if reply.stat.as_deref() == Some("ok") {
            self.connected.store(true, Ordering::Relaxed);
            info!(host = %self.base_url, user = %self.username, "Logged in to Piwigo");
            Ok(())
        } else {
            warn!(host = %self.base_url, stat = ?reply.stat, "Piwigo login rejected");
            Err(WallDisplayError::Auth(
                "Invalid username or password".to_string(),
            ))
        }
    }

    /// Forget the session.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Relaxed);
        debug!(host = %self.base_url, "Disconnected");
    }

    /// Fetch the raw album/tag table.
    ///
    /// A second `Not Logged In` after re-login is reported as a
    /// [`WallDisplayError::MalformedResponse`], like any other non-JSON body.
    pub async fn fetch_tree(&self) -> Result<RawTree> {
        let query = [("api", "full_table".to_string())];
        let response = self.plugin_get(&query).await?;

        if !response.is_success() {
            return Err(WallDisplayError::Connection(format!(
                "HTTP error: {}",
                response.status
            )));
        }

        RawTree::from_json(&response.body)
            .map_err(|e| WallDisplayError::MalformedResponse(format!("full_table: {}", e)))
    }

    /// Fetch and flatten the album/tag table.
    pub async fn fetch_items(&self) -> Result<Vec<ToggleableItem>> {
        let tree = self.fetch_tree().await?;
        let items = self.flattener.flatten(&tree);
        debug!(
            albums = items.len() - tree.tags.len() - 1,
            tags = tree.tags.len(),
            mode = %tree.mode,
            "Fetched wall display table"
        );
        Ok(items)
    }

    /// Set the enabled flag of an album/tag, or the display mode.
    ///
    /// `value` is sent verbatim as `enabled` (`"true"`, `"false"` or a mode
    /// token). The outcome of the request made after a re-login is the
    /// outcome of the call; a session that stays expired is
    /// [`WallDisplayError::SessionExpired`].
    pub async fn set_item(&self, item: &ToggleableItem, value: &str) -> Result<()> {
        let query = [
            ("api", "edit_options".to_string()),
            ("type", item.server_type.as_str().to_string()),
            ("id", item.server_id.to_string()),
            ("enabled", value.to_string()),
        ];
        let response = self.plugin_get(&query).await?;

        if response.body == NOT_LOGGED_IN {
            self.connected.store(false, Ordering::Relaxed);
            return Err(WallDisplayError::SessionExpired);
        }
        if !response.is_success() {
            return Err(WallDisplayError::Connection(format!(
                "HTTP error: {}",
                response.status
            )));
        }

        info!(
            key = %item.unique_key,
            kind = %item.kind,
            value = %value,
            "Updated wall display option"
        );
        Ok(())
    }

    /// GET the plugin endpoint, logging in again once if the session expired.
    async fn plugin_get(&self, query: &[(&str, String)]) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, PLUGIN_PATH);
        let response = self.transport.get(&url, query).await?;

        if response.body != NOT_LOGGED_IN {
            return Ok(response);
        }

        warn!(host = %self.base_url, "Piwigo session expired, logging in again");
        self.connected.store(false, Ordering::Relaxed);
        self.connect().await?;
        self.transport.get(&url, query).await
    }
}
