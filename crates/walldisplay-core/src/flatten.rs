//! Flattening of the nested album tree into toggleable items.
//!
//! Albums come out in pre-order (each album immediately followed by all of
//! its descendants), then one item per tag, then the single mode item.

use crate::model::{
    slugify, ItemKind, ItemState, ServerType, ToggleableItem, ALBUM_KEY_OFFSET, TAG_KEY_OFFSET,
};
use crate::tree::{RawCategory, RawTag, RawTree};

/// Separator between album names in a full album path.
pub const PATH_SEPARATOR: &str = " / ";

/// Marker between the ancestors and the album in a breadcrumb name.
pub const BREADCRUMB_MARKER: &str = "=>";

/// Turns a [`RawTree`] into the flat item list for one connection.
#[derive(Debug, Clone)]
pub struct GalleryTreeFlattener {
    controller_name: String,
}

impl GalleryTreeFlattener {
    pub fn new(controller_name: impl Into<String>) -> Self {
        Self {
            controller_name: controller_name.into(),
        }
    }

    pub fn controller_name(&self) -> &str {
        &self.controller_name
    }

    /// Build the complete item list: albums, then tags, then the mode.
    pub fn flatten(&self, tree: &RawTree) -> Vec<ToggleableItem> {
        let mut items = self.flatten_albums(&tree.cats);
        items.extend(tree.tags.iter().map(|tag| self.tag_item(tag)));
        items.push(self.mode_item(&tree.mode));
        items
    }

    /// Flatten an album forest in pre-order.
    ///
    /// Uses an explicit stack, so nesting depth is not limited by the call stack.
    pub fn flatten_albums(&self, roots: &[RawCategory]) -> Vec<ToggleableItem> {
        let mut items = Vec::new();
        // (node, ancestor path); siblings pushed in reverse so they pop in order
        let mut stack: Vec<(&RawCategory, String)> =
            roots.iter().rev().map(|node| (node, String::new())).collect();

        while let Some((node, ancestors)) = stack.pop() {
            let full_name = if ancestors.is_empty() {
                node.name.clone()
            } else {
                format!("{}{}{}", ancestors, PATH_SEPARATOR, node.name)
            };

            items.push(self.album_item(node, &ancestors, &full_name));

            stack.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|child| (child, full_name.clone())),
            );
        }

        items
    }

    fn album_item(&self, node: &RawCategory, ancestors: &str, full_name: &str) -> ToggleableItem {
        let server_parent_id = if ancestors.is_empty() {
            0
        } else {
            node.id_uppercat.map(i64::from).unwrap_or(0)
        };

        ToggleableItem {
            unique_key: format!(
                "{}_cat_ID{}",
                self.controller_name,
                ALBUM_KEY_OFFSET + i64::from(node.id)
            ),
            kind: ItemKind::Album,
            display_name: format!("Piwigo_album_{}", full_name),
            entity_slug: slugify(&format!("{}_cat_{}", self.controller_name, node.name)),
            state: ItemState::Enabled(node.is_enabled()),
            server_type: ServerType::Cat,
            breadcrumb_name: breadcrumb_name(ancestors, &node.name),
            server_id: i64::from(node.id),
            server_parent_id,
        }
    }

    fn tag_item(&self, tag: &RawTag) -> ToggleableItem {
        ToggleableItem {
            unique_key: format!(
                "{}_tag_ID{}",
                self.controller_name,
                TAG_KEY_OFFSET + i64::from(tag.id)
            ),
            kind: ItemKind::Tag,
            display_name: format!("Piwigo_tag_{}", tag.name),
            entity_slug: slugify(&format!("{}_tag_{}", self.controller_name, tag.name)),
            state: ItemState::Enabled(tag.is_enabled()),
            server_type: ServerType::Tag,
            breadcrumb_name: tag.name.clone(),
            server_id: i64::from(tag.id),
            server_parent_id: 0,
        }
    }

    fn mode_item(&self, mode: &str) -> ToggleableItem {
        ToggleableItem {
            unique_key: format!("{}_mode", self.controller_name),
            kind: ItemKind::Mode,
            display_name: "Piwigo_mode".to_string(),
            entity_slug: slugify(&format!("{}_mode", self.controller_name)),
            state: ItemState::Mode(mode.to_string()),
            server_type: ServerType::Mode,
            breadcrumb_name: "Mode".to_string(),
            server_id: 0,
            server_parent_id: 0,
        }
    }
}

/// Compact label for an album: the top-level ancestor is dropped, the rest of
/// the path is kept verbatim and joined to the album name with `=>`.
///
/// `("A / B / C", "D")` gives `"B / C=>D"`; with fewer than two ancestors the
/// album's own name is returned.
pub fn breadcrumb_name(ancestors: &str, name: &str) -> String {
    match ancestors.split_once(PATH_SEPARATOR) {
        Some((top, rest)) if !top.is_empty() => {
            format!("{}{}{}", rest, BREADCRUMB_MARKER, name)
        }
        _ => name.to_string(),
    }
}
