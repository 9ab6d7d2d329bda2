//! Host adapter boundary.
//!
//! A host (home-automation platform, CLI, ...) plugs in through two traits:
//! [`Observer`] receives every refreshed [`Snapshot`], and [`ActionSink`]
//! turns user actions into server updates. [`Coordinator`] implements the
//! refresh cycle between the two.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::client::SessionedClient;
use crate::error::{Result, WallDisplayError};
use crate::model::{switch_wire_value, DisplayMode, ItemKind, ItemState, ToggleableItem};

/// Receives the outcome of every refresh.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Called with the new item collection after a successful refresh.
    async fn on_data(&self, snapshot: &Snapshot);

    /// Called when a refresh fails; the host should mark items unavailable.
    async fn on_error(&self, _error: &WallDisplayError) {}
}

/// Applies a user action to one item.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn apply(&self, item: &ToggleableItem, value: &str) -> Result<()>;
}

/// Item collection from one refresh.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub controller_name: String,
    pub items: Vec<ToggleableItem>,
    /// Unix timestamp of the fetch
    pub fetched_at: i64,
}

/// Difference for one item between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemChange {
    Added(ToggleableItem),
    Removed(ToggleableItem),
    StateChanged {
        unique_key: String,
        old: ItemState,
        new: ItemState,
    },
}

impl Snapshot {
    pub fn new(controller_name: impl Into<String>, items: Vec<ToggleableItem>) -> Self {
        Self {
            controller_name: controller_name.into(),
            items,
            fetched_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Item with this unique key.
    pub fn find(&self, unique_key: &str) -> Option<&ToggleableItem> {
        self.items.iter().find(|item| item.unique_key == unique_key)
    }

    /// Item with this unique key, if it is of the given kind.
    pub fn get(&self, kind: ItemKind, unique_key: &str) -> Option<&ToggleableItem> {
        self.find(unique_key).filter(|item| item.kind == kind)
    }

    /// Items of one kind, in collection order.
    pub fn items_of(&self, kind: ItemKind) -> impl Iterator<Item = &ToggleableItem> {
        self.items.iter().filter(move |item| item.kind == kind)
    }

    /// The mode item.
    pub fn mode_item(&self) -> Option<&ToggleableItem> {
        self.items.iter().find(|item| item.kind == ItemKind::Mode)
    }

    /// Currently selected display mode.
    pub fn mode(&self) -> Option<DisplayMode> {
        self.mode_item()
            .and_then(|item| item.state.as_mode())
            .map(DisplayMode::from_server_mode)
    }

    /// Changes from `previous` to `self`, matched by unique key.
    ///
    /// Added and changed items are listed in this snapshot's order, removed
    /// items after them in the previous snapshot's order.
    pub fn changes_since(&self, previous: &Snapshot) -> Vec<ItemChange> {
        let before: HashMap<&str, &ToggleableItem> = previous
            .items
            .iter()
            .map(|item| (item.unique_key.as_str(), item))
            .collect();
        let after: HashMap<&str, &ToggleableItem> = self
            .items
            .iter()
            .map(|item| (item.unique_key.as_str(), item))
            .collect();

        let mut changes = Vec::new();
        for item in &self.items {
            match before.get(item.unique_key.as_str()) {
                None => changes.push(ItemChange::Added(item.clone())),
                Some(old) if old.state != item.state => changes.push(ItemChange::StateChanged {
                    unique_key: item.unique_key.clone(),
                    old: old.state.clone(),
                    new: item.state.clone(),
                }),
                Some(_) => {}
            }
        }
        for item in &previous.items {
            if !after.contains_key(item.unique_key.as_str()) {
                changes.push(ItemChange::Removed(item.clone()));
            }
        }
        changes
    }
}

/// Drives refreshes for one connection and routes user actions to it.
///
/// Refreshes and actions are serialized; an action is always followed by a
/// full refresh before the next one starts.
pub struct Coordinator {
    client: Arc<SessionedClient>,
    observers: RwLock<Vec<Arc<dyn Observer>>>,
    data: RwLock<Option<Arc<Snapshot>>>,
    cycle: Mutex<()>,
    running: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    pub fn new(client: Arc<SessionedClient>) -> Self {
        Self {
            client,
            observers: RwLock::new(Vec::new()),
            data: RwLock::new(None),
            cycle: Mutex::new(()),
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub fn client(&self) -> &Arc<SessionedClient> {
        &self.client
    }

    /// Register an observer for future refreshes.
    pub async fn subscribe(&self, observer: Arc<dyn Observer>) {
        self.observers.write().await.push(observer);
    }

    /// Latest successful snapshot.
    pub async fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.data.read().await.clone()
    }

    /// Look up an item of a given kind in the latest snapshot.
    pub async fn get_item(&self, kind: ItemKind, unique_key: &str) -> Option<ToggleableItem> {
        self.data
            .read()
            .await
            .as_ref()
            .and_then(|snapshot| snapshot.get(kind, unique_key).cloned())
    }

    /// Fetch the table, store the snapshot and notify observers.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        let _cycle = self.cycle.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<Arc<Snapshot>> {
        let observers = self.observers.read().await.clone();

        match self.client.fetch_items().await {
            Ok(items) => {
                let snapshot = Arc::new(Snapshot::new(self.client.controller_name(), items));
                *self.data.write().await = Some(Arc::clone(&snapshot));
                for observer in &observers {
                    observer.on_data(&snapshot).await;
                }
                Ok(snapshot)
            }
            Err(e) => {
                if matches!(e, WallDisplayError::Auth(_)) {
                    error!("Refresh failed: {}", e);
                } else {
                    warn!("Refresh failed: {}", e);
                }
                for observer in &observers {
                    observer.on_error(&e).await;
                }
                Err(e)
            }
        }
    }

    /// Switch an album or tag on.
    pub async fn turn_on(&self, unique_key: &str) -> Result<()> {
        self.switch(unique_key, true).await
    }

    /// Switch an album or tag off.
    pub async fn turn_off(&self, unique_key: &str) -> Result<()> {
        self.switch(unique_key, false).await
    }

    async fn switch(&self, unique_key: &str, on: bool) -> Result<()> {
        let item = self.require_item(unique_key).await?;
        if !item.kind.is_switch() {
            return Err(WallDisplayError::InvalidAction(format!(
                "'{}' is a {} item and cannot be switched",
                unique_key, item.kind
            )));
        }
        self.apply(&item, switch_wire_value(on)).await
    }

    /// Select the display mode.
    pub async fn select_mode(&self, mode: DisplayMode) -> Result<()> {
        let item = self
            .data
            .read()
            .await
            .as_ref()
            .and_then(|snapshot| snapshot.mode_item().cloned())
            .ok_or_else(|| WallDisplayError::ItemNotFound("mode".to_string()))?;
        self.apply(&item, mode.wire_value()).await
    }

    async fn require_item(&self, unique_key: &str) -> Result<ToggleableItem> {
        self.data
            .read()
            .await
            .as_ref()
            .and_then(|snapshot| snapshot.find(unique_key).cloned())
            .ok_or_else(|| WallDisplayError::ItemNotFound(unique_key.to_string()))
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Refresh every `interval` until [`stop`](Self::stop) is called.
    ///
    /// Failed refreshes are reported to observers and the loop carries on.
    /// A zero `interval` is a [`WallDisplayError::Configuration`] error.
    pub async fn run(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(WallDisplayError::Configuration(
                "polling interval must be non-zero".to_string(),
            ));
        }
        {
            let mut running = self.running.write().await;
            if *running {
                return Ok(());
            }
            *running = true;
        }
        info!(
            controller = %self.client.controller_name(),
            interval_secs = interval.as_secs(),
            "Wall display polling started"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while self.is_running().await {
            ticker.tick().await;
            if !self.is_running().await {
                break;
            }
            if let Ok(snapshot) = self.refresh().await {
                debug!(items = snapshot.items.len(), "Refresh complete");
            }
        }

        info!(controller = %self.client.controller_name(), "Wall display polling stopped");
        Ok(())
    }

    /// Stop the polling loop after the current cycle.
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }
}

#[async_trait]
impl ActionSink for Coordinator {
    /// Log in, send the update, then refresh so observers see the result.
    async fn apply(&self, item: &ToggleableItem, value: &str) -> Result<()> {
        let _cycle = self.cycle.lock().await;

        self.client.connect().await?;
        let outcome = self.client.set_item(item, value).await;
        if let Err(e) = &outcome {
            warn!(key = %item.unique_key, "Update failed: {}", e);
        }

        // the server's view wins either way
        let refreshed = self.refresh_locked().await;
        outcome?;
        refreshed.map(|_| ())
    }
}
