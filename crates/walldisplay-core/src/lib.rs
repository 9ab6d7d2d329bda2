//! Piwigo Wall Display bridge
//!
//! This crate connects to a Piwigo gallery running the WallDisplay plugin and
//! presents its albums, tags and display mode as a flat list of toggleable
//! items that a home-automation host can show as switches and a selector.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `http` | ✅ | `reqwest`-backed transport |
//!
//! ## Architecture
//!
//! - **SessionedClient**: login, table fetch and option updates, with one
//!   automatic re-login when the plugin reports an expired session
//! - **GalleryTreeFlattener**: nested album tree + tags + mode → flat item list
//! - **Coordinator**: refresh cycle feeding [`Observer`]s and accepting
//!   actions through [`ActionSink`]
//! - **Transport**: the HTTP seam, swappable in tests

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod flatten;
pub mod model;
pub mod transport;
pub mod tree;

// Re-exports for convenience
pub use adapter::{ActionSink, Coordinator, ItemChange, Observer, Snapshot};
pub use client::{SessionedClient, NOT_LOGGED_IN};
pub use config::WallDisplayConfig;
pub use error::{Result, WallDisplayError};
pub use flatten::GalleryTreeFlattener;
pub use model::{DisplayMode, ItemAttributes, ItemKind, ItemState, ServerType, ToggleableItem};
pub use transport::{HttpResponse, Transport};
pub use tree::{RawCategory, RawTag, RawTree};

#[cfg(feature = "http")]
pub use transport::ReqwestTransport;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
