//! Toggleable items - the flat view of a Piwigo server's albums, tags and mode.

use serde::{Deserialize, Serialize};

/// Prefix used when the host needs an entity id unique across integrations.
pub const DOMAIN: &str = "piwigo_wall_display";

/// Offset added to album ids when building unique keys.
pub const ALBUM_KEY_OFFSET: i64 = 1000;

/// Offset added to tag ids when building unique keys.
pub const TAG_KEY_OFFSET: i64 = 2000;

/// Kind of item, which decides the control the host shows for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// On/off switch for one album
    Album,
    /// On/off switch for one tag
    Tag,
    /// Single-choice selector for the display mode
    Mode,
}

impl ItemKind {
    /// Albums and tags are switches; the mode is a selector.
    pub fn is_switch(&self) -> bool {
        matches!(self, Self::Album | Self::Tag)
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Album => write!(f, "album"),
            Self::Tag => write!(f, "tag"),
            Self::Mode => write!(f, "mode"),
        }
    }
}

/// Category name the server's `edit_options` endpoint expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    Cat,
    Tag,
    Mode,
}

impl ServerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cat => "cat",
            Self::Tag => "tag",
            Self::Mode => "mode",
        }
    }
}

impl std::fmt::Display for ServerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemState {
    /// Enabled flag of an album or tag
    Enabled(bool),
    /// Mode string reported by the server
    Mode(String),
}

impl ItemState {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Enabled(v) => Some(*v),
            Self::Mode(_) => None,
        }
    }

    pub fn as_mode(&self) -> Option<&str> {
        match self {
            Self::Mode(v) => Some(v),
            Self::Enabled(_) => None,
        }
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enabled(true) => write!(f, "on"),
            Self::Enabled(false) => write!(f, "off"),
            Self::Mode(mode) => write!(f, "{}", mode),
        }
    }
}

/// One album, tag or the mode, flattened out of the server's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleableItem {
    /// Unique within one server connection
    pub unique_key: String,
    pub kind: ItemKind,
    /// Human-readable name, with the full album path for nested albums
    pub display_name: String,
    /// Normalized identifier for an entity-id namespace
    pub entity_slug: String,
    pub state: ItemState,
    pub server_type: ServerType,
    /// Compact `Parent=>Child` label without the top-level ancestor
    pub breadcrumb_name: String,
    /// Piwigo id of the album or tag, 0 for the mode
    pub server_id: i64,
    /// Piwigo id of the parent album, 0 for top-level albums and non-albums
    pub server_parent_id: i64,
}

impl ToggleableItem {
    /// Id the host should register the entity under.
    pub fn entity_unique_id(&self) -> String {
        format!("{}-{}", DOMAIN, self.unique_key)
    }

    /// Whether a switch item is currently on. Always `false` for the mode.
    pub fn is_on(&self) -> bool {
        self.state.as_bool().unwrap_or(false)
    }

    /// Secondary attributes shown next to the state.
    pub fn attributes(&self) -> ItemAttributes {
        let (album_id, parent_album_id) = match self.kind {
            ItemKind::Album => (Some(self.server_id), Some(self.server_parent_id)),
            _ => (None, None),
        };
        ItemAttributes {
            simple_name: self.breadcrumb_name.clone(),
            album_id,
            parent_album_id,
        }
    }
}

/// Extra state attributes of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAttributes {
    pub simple_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_album_id: Option<i64>,
}

/// Choices offered by the mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Show photos from the enabled albums
    Album,
    /// Show photos carrying the enabled tags
    Tag,
}

impl DisplayMode {
    /// Options in the order the selector lists them.
    pub const OPTIONS: [DisplayMode; 2] = [DisplayMode::Album, DisplayMode::Tag];

    /// Interpret the mode string reported by the server.
    pub fn from_server_mode(mode: &str) -> Self {
        if mode == "cat" { Self::Album } else { Self::Tag }
    }

    /// Value sent as `enabled` when selecting this mode.
    pub fn wire_value(&self) -> &'static str {
        match self {
            Self::Album => "true",
            Self::Tag => "false",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Album => "Album",
            Self::Tag => "Tag",
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "album" | "cat" => Ok(Self::Album),
            "tag" => Ok(Self::Tag),
            other => Err(format!("unknown display mode '{}'", other)),
        }
    }
}

/// Value sent as `enabled` when switching an album or tag.
pub fn switch_wire_value(on: bool) -> &'static str {
    if on { "true" } else { "false" }
}

/// Lower-case `text` and collapse every run of other characters into one `_`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_underscore = true;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    out.trim_end_matches('_').to_string()
}
