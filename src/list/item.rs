use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Stable row identity: the item's id, falling back to its title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NoteFlags: u8 {
        const PINNED = 1 << 0;
        const FAVORITE = 1 << 1;
        const LOCKED = 1 << 2;
        const DELETED = 1 << 3;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteSummary {
    pub headline: String,
    /// Unix seconds.
    pub edited_at: i64,
    pub deleted_at: Option<i64>,
    pub tags: Vec<String>,
    pub color: Option<String>,
    pub flags: NoteFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub title: String,
    pub note_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotebookSummary {
    pub description: Option<String>,
    pub topics: Vec<TopicSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagSummary {
    pub note_count: usize,
}

/// Payload of a non-header row.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Note(NoteSummary),
    Notebook(NotebookSummary),
    Tag(TagSummary),
    /// A kind this build does not know how to draw; profiles render nothing for it.
    Unknown { kind: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Header,
    Content(Content),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: Option<String>,
    pub title: Option<String>,
    pub kind: ItemKind,
}

impl Item {
    pub fn header(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: Some(format!("header:{label}")),
            title: Some(label),
            kind: ItemKind::Header,
        }
    }

    pub fn content(id: impl Into<String>, title: impl Into<String>, content: Content) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            kind: ItemKind::Content(content),
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self.kind, ItemKind::Header)
    }

    pub fn content_ref(&self) -> Option<&Content> {
        match &self.kind {
            ItemKind::Header => None,
            ItemKind::Content(content) => Some(content),
        }
    }

    /// `id` when present and non-empty, otherwise `title`.
    pub fn key(&self) -> Option<ItemKey> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.title.as_deref().filter(|title| !title.is_empty()))
            .map(ItemKey::new)
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn kind_name(&self) -> &str {
        match &self.kind {
            ItemKind::Header => "header",
            ItemKind::Content(Content::Note(_)) => "note",
            ItemKind::Content(Content::Notebook(_)) => "notebook",
            ItemKind::Content(Content::Tag(_)) => "tag",
            ItemKind::Content(Content::Unknown { kind }) => kind,
        }
    }
}
