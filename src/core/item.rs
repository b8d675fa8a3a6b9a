//! Feed data model: the caller's items and the engine's positions.
//!
//! An [`Item`] is owned by the data source and never mutated by the engine.
//! Items are referenced by their index in the current sequence; the engine
//! produces one [`Position`] per index.

use std::collections::BTreeMap;
use std::fmt;

// ───────────────────────────────────────── items ─────────────

/// Stable identifier supplied by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemId {
    Int(u64),
    Str(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(n) => write!(f, "{n}"),
            ItemId::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ItemId {
    fn from(n: u64) -> Self {
        ItemId::Int(n)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Str(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId::Str(s)
    }
}

/// One card's worth of content.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    /// Intrinsic media width (any unit; only the ratio matters).
    pub width: f64,
    /// Intrinsic media height.
    pub height: f64,
    /// Display text (title / caption).
    pub text: String,
    /// Optional blur hash or placeholder asset reference.
    pub placeholder: Option<String>,
    /// Open-ended attributes the renderer may use (author, likes, …).
    pub extra: BTreeMap<String, String>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, width: f64, height: f64, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            text: text.into(),
            placeholder: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up an extra attribute.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

// ───────────────────────────────────────── positions ─────────

/// Absolute placement of one item, in layout pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub column: usize,
}

impl Position {
    /// Bottom edge (`top + height`).
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// A page of items delivered by the data source.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Item>,
    /// `false` once the source has nothing more for the current query.
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_ids_display_without_decoration() {
        assert_eq!(ItemId::from(42).to_string(), "42");
        assert_eq!(ItemId::from("abc").to_string(), "abc");
    }

    #[test]
    fn extras_are_looked_up_by_key() {
        let item = Item::new(1, 100.0, 200.0, "hello").with_extra("author", "mia");
        assert_eq!(item.extra("author"), Some("mia"));
        assert_eq!(item.extra("likes"), None);
    }
}
