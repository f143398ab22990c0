use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::list::NoteFlags;

mod json;

pub use json::JsonLibrary;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to access library {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("library {} is not valid JSON", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("notebook `{0}` not found")]
    NotebookNotFound(String),
    #[error("topic `{topic}` not found in notebook `{notebook}`")]
    TopicNotFound { notebook: String, topic: String },
}

/// Placement of a note inside a notebook topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookRef {
    pub id: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub headline: String,
    /// Unix seconds.
    pub date_edited: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_deleted: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub notebooks: Vec<NotebookRef>,
}

impl NoteRecord {
    pub fn flags(&self) -> NoteFlags {
        let mut flags = NoteFlags::empty();
        flags.set(NoteFlags::PINNED, self.pinned);
        flags.set(NoteFlags::FAVORITE, self.favorite);
        flags.set(NoteFlags::LOCKED, self.locked);
        flags.set(NoteFlags::DELETED, self.date_deleted.is_some());
        flags
    }

    pub fn is_deleted(&self) -> bool {
        self.date_deleted.is_some()
    }

    pub fn in_topic(&self, notebook: &str, topic: &str) -> bool {
        self.notebooks
            .iter()
            .any(|entry| entry.id == notebook && entry.topics.iter().any(|t| t == topic))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<TopicRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub name: String,
    pub note_count: usize,
}

/// On-disk library document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
    #[serde(default)]
    pub notebooks: Vec<NotebookRecord>,
}

/// Which notes a notes view shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NoteFilter {
    #[default]
    All,
    Tagged(String),
    Colored(String),
    Topic { notebook: String, topic: String },
}

impl NoteFilter {
    /// Where a note created from this view gets filed.
    pub fn context(&self) -> Option<NoteContext> {
        match self {
            NoteFilter::All => None,
            NoteFilter::Tagged(tag) => Some(NoteContext::Tag(tag.clone())),
            NoteFilter::Colored(color) => Some(NoteContext::Color(color.clone())),
            NoteFilter::Topic { notebook, topic } => Some(NoteContext::Topic {
                notebook: notebook.clone(),
                topic: topic.clone(),
            }),
        }
    }
}

/// Filing context handed to the editor for a note created from a filtered view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteContext {
    Tag(String),
    Color(String),
    Topic { notebook: String, topic: String },
}

/// Result of a notes query: the notes plus the heading the view shows above them.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteView {
    pub heading: String,
    pub notes: Vec<NoteRecord>,
}

/// Title shown above a filtered view: `#tag` for tags, otherwise the title
/// with its first letter uppercased.
pub fn view_heading(filter: &NoteFilter, title: &str) -> String {
    match filter {
        NoteFilter::Tagged(_) => format!("#{title}"),
        _ => {
            let mut chars = title.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Read side of the note library consumed by the list views.
pub trait NoteSource: fmt::Debug + Send {
    fn notes(&self, filter: &NoteFilter) -> Result<NoteView, SourceError>;
    fn notebooks(&self) -> Result<Vec<NotebookRecord>, SourceError>;
    fn tags(&self) -> Result<Vec<TagRecord>, SourceError>;
    fn trash(&self) -> Result<Vec<NoteRecord>, SourceError>;
    /// Brings the local copy up to date with its backing store.
    fn sync(&mut self) -> Result<(), SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_follow_the_filter_kind() {
        assert_eq!(
            view_heading(&NoteFilter::Tagged("work".into()), "work"),
            "#work"
        );
        assert_eq!(
            view_heading(&NoteFilter::Colored("red".into()), "red"),
            "Red"
        );
        assert_eq!(view_heading(&NoteFilter::All, "écrits"), "Écrits");
        assert_eq!(view_heading(&NoteFilter::All, ""), "");
    }

    #[test]
    fn filtered_views_carry_a_filing_context() {
        assert_eq!(NoteFilter::All.context(), None);
        assert_eq!(
            NoteFilter::Colored("blue".into()).context(),
            Some(NoteContext::Color("blue".into()))
        );
        let topic = NoteFilter::Topic {
            notebook: "nb1".into(),
            topic: "t1".into(),
        };
        assert_eq!(
            topic.context(),
            Some(NoteContext::Topic {
                notebook: "nb1".into(),
                topic: "t1".into()
            })
        );
    }

    #[test]
    fn records_deserialize_with_defaults() {
        let record: NoteRecord = serde_json::from_str(
            r#"{"id":"n1","title":"Groceries","dateEdited":1700000000,"pinned":true}"#,
        )
        .expect("record");
        assert!(record.tags.is_empty());
        assert_eq!(record.flags(), NoteFlags::PINNED);
        assert!(!record.in_topic("nb", "t"));
    }
}
