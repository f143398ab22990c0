use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{
    view_heading, Library, NoteFilter, NoteRecord, NoteSource, NoteView, NotebookRecord,
    SourceError, TagRecord,
};

/// Note library backed by a single JSON document on disk. Syncing re-reads it.
#[derive(Debug, Clone)]
pub struct JsonLibrary {
    path: Option<PathBuf>,
    library: Library,
}

impl JsonLibrary {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        let library = read_library(&path)?;
        tracing::debug!(
            path = %path.display(),
            notes = library.notes.len(),
            notebooks = library.notebooks.len(),
            "library loaded"
        );
        Ok(Self {
            path: Some(path),
            library,
        })
    }

    /// Opens the library, first writing an empty one when the file is missing.
    pub fn open_or_init(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| SourceError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            let empty = serde_json::to_string_pretty(&Library::default()).map_err(|source| {
                SourceError::Parse {
                    path: path.clone(),
                    source,
                }
            })?;
            fs::write(&path, empty).map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), "created empty library");
        }
        Self::open(path)
    }

    /// In-memory library; `sync` is a no-op.
    pub fn from_library(library: Library) -> Self {
        Self {
            path: None,
            library,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    fn live_notes(&self) -> impl Iterator<Item = &NoteRecord> {
        self.library.notes.iter().filter(|note| !note.is_deleted())
    }
}

impl NoteSource for JsonLibrary {
    fn notes(&self, filter: &NoteFilter) -> Result<NoteView, SourceError> {
        let (title, notes): (String, Vec<NoteRecord>) = match filter {
            NoteFilter::All => ("notes".to_string(), self.live_notes().cloned().collect()),
            NoteFilter::Tagged(tag) => (
                tag.clone(),
                self.live_notes()
                    .filter(|note| note.tags.iter().any(|t| t == tag))
                    .cloned()
                    .collect(),
            ),
            NoteFilter::Colored(color) => (
                color.clone(),
                self.live_notes()
                    .filter(|note| note.color.as_deref() == Some(color.as_str()))
                    .cloned()
                    .collect(),
            ),
            NoteFilter::Topic { notebook, topic } => {
                let book = self
                    .library
                    .notebooks
                    .iter()
                    .find(|candidate| &candidate.id == notebook)
                    .ok_or_else(|| SourceError::NotebookNotFound(notebook.clone()))?;
                let entry = book
                    .topics
                    .iter()
                    .find(|candidate| &candidate.id == topic)
                    .ok_or_else(|| SourceError::TopicNotFound {
                        notebook: notebook.clone(),
                        topic: topic.clone(),
                    })?;
                (
                    entry.title.clone(),
                    self.live_notes()
                        .filter(|note| note.in_topic(notebook, topic))
                        .cloned()
                        .collect(),
                )
            }
        };
        Ok(NoteView {
            heading: view_heading(filter, &title),
            notes,
        })
    }

    fn notebooks(&self) -> Result<Vec<NotebookRecord>, SourceError> {
        Ok(self.library.notebooks.clone())
    }

    fn tags(&self) -> Result<Vec<TagRecord>, SourceError> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for note in self.live_notes() {
            for tag in &note.tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(name, note_count)| TagRecord {
                name: name.to_string(),
                note_count,
            })
            .collect())
    }

    fn trash(&self) -> Result<Vec<NoteRecord>, SourceError> {
        Ok(self
            .library
            .notes
            .iter()
            .filter(|note| note.is_deleted())
            .cloned()
            .collect())
    }

    fn sync(&mut self) -> Result<(), SourceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        self.library = read_library(path)?;
        tracing::info!(
            path = %path.display(),
            notes = self.library.notes.len(),
            "library reloaded"
        );
        Ok(())
    }
}

fn read_library(path: &Path) -> Result<Library, SourceError> {
    let raw = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    use super::*;
    use crate::source::{NotebookRef, TopicRecord};

    fn record(id: &str, tags: &[&str]) -> NoteRecord {
        NoteRecord {
            id: id.to_string(),
            title: format!("Title {id}"),
            headline: String::new(),
            date_edited: 1_700_000_000,
            date_deleted: None,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            color: None,
            pinned: false,
            favorite: false,
            locked: false,
            notebooks: Vec::new(),
        }
    }

    fn sample() -> Library {
        let mut topic_note = record("n3", &[]);
        topic_note.notebooks = vec![NotebookRef {
            id: "nb1".into(),
            topics: vec!["t1".into()],
        }];
        topic_note.color = Some("red".into());
        let mut deleted = record("n4", &["work"]);
        deleted.date_deleted = Some(1_700_000_100);
        Library {
            notes: vec![
                record("n1", &["work", "home"]),
                record("n2", &["work"]),
                topic_note,
                deleted,
            ],
            notebooks: vec![NotebookRecord {
                id: "nb1".into(),
                title: "Projects".into(),
                description: None,
                topics: vec![TopicRecord {
                    id: "t1".into(),
                    title: "meetings".into(),
                }],
            }],
        }
    }

    #[test]
    fn filters_select_live_notes_and_build_headings() -> Result<()> {
        let library = JsonLibrary::from_library(sample());

        let all = library.notes(&NoteFilter::All)?;
        assert_eq!(all.heading, "Notes");
        assert_eq!(all.notes.len(), 3);

        let tagged = library.notes(&NoteFilter::Tagged("work".into()))?;
        assert_eq!(tagged.heading, "#work");
        let ids: Vec<&str> = tagged.notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n2"]);

        let colored = library.notes(&NoteFilter::Colored("red".into()))?;
        assert_eq!(colored.heading, "Red");
        assert_eq!(colored.notes.len(), 1);

        let topic = library.notes(&NoteFilter::Topic {
            notebook: "nb1".into(),
            topic: "t1".into(),
        })?;
        assert_eq!(topic.heading, "Meetings");
        assert_eq!(topic.notes[0].id, "n3");
        Ok(())
    }

    #[test]
    fn unknown_notebooks_and_topics_are_errors() {
        let library = JsonLibrary::from_library(sample());
        assert_matches!(
            library.notes(&NoteFilter::Topic {
                notebook: "missing".into(),
                topic: "t1".into()
            }),
            Err(SourceError::NotebookNotFound(id)) if id == "missing"
        );
        assert_matches!(
            library.notes(&NoteFilter::Topic {
                notebook: "nb1".into(),
                topic: "nope".into()
            }),
            Err(SourceError::TopicNotFound { .. })
        );
    }

    #[test]
    fn tags_count_live_notes_and_trash_holds_deleted() -> Result<()> {
        let library = JsonLibrary::from_library(sample());
        assert_eq!(
            library.tags()?,
            vec![
                TagRecord {
                    name: "home".into(),
                    note_count: 1
                },
                TagRecord {
                    name: "work".into(),
                    note_count: 2
                },
            ]
        );
        let trash = library.trash()?;
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].id, "n4");
        Ok(())
    }

    #[test]
    fn sync_rereads_the_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("library.json");
        let mut library = JsonLibrary::open_or_init(&path)?;
        assert!(library.notes(&NoteFilter::All)?.notes.is_empty());

        fs::write(&path, serde_json::to_string(&sample())?)?;
        library.sync()?;
        assert_eq!(library.notes(&NoteFilter::All)?.notes.len(), 3);

        fs::write(&path, "{ not json")?;
        assert_matches!(library.sync(), Err(SourceError::Parse { .. }));
        // a failed sync keeps what was loaded before
        assert_eq!(library.notes(&NoteFilter::All)?.notes.len(), 3);
        Ok(())
    }

    #[test]
    fn opening_a_missing_file_reports_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = JsonLibrary::open(&path).unwrap_err();
        assert_matches!(&err, SourceError::Io { path: reported, .. } if reported == &path);
        assert!(err.to_string().contains("absent.json"));
    }
}
