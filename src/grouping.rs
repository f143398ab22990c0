//! Builds list item sequences from library records, interleaving group headers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::list::{Content, Item, NoteSummary, NotebookSummary, TagSummary, TopicSummary};
use crate::source::{NoteRecord, NotebookRecord, TagRecord};

const PINNED: &str = "Pinned";
const TODAY: &str = "Today";
const YESTERDAY: &str = "Yesterday";
const THIS_WEEK: &str = "This week";
const EARLIER: &str = "Earlier";

/// How notes are bucketed under header rows.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GroupKind {
    /// Flat list, newest first.
    None,
    /// Pinned, then recency buckets.
    #[default]
    Default,
    /// By first letter of the title.
    Abc,
    Month,
    Year,
}

pub fn note_item(record: &NoteRecord) -> Item {
    Item::content(
        record.id.clone(),
        record.title.clone(),
        Content::Note(NoteSummary {
            headline: record.headline.clone(),
            edited_at: record.date_edited,
            deleted_at: record.date_deleted,
            tags: record.tags.clone(),
            color: record.color.clone(),
            flags: record.flags(),
        }),
    )
}

/// Sorts and groups notes. Groups without notes never get a header.
pub fn group_notes(records: &[NoteRecord], kind: GroupKind, now: OffsetDateTime) -> Vec<Item> {
    let mut sorted: Vec<&NoteRecord> = records.iter().collect();
    match kind {
        GroupKind::Abc => sorted.sort_by_cached_key(|note| note.title.to_lowercase()),
        _ => sorted.sort_by(|a, b| b.date_edited.cmp(&a.date_edited)),
    }

    if kind == GroupKind::None {
        return sorted.into_iter().map(note_item).collect();
    }

    let mut groups: IndexMap<String, Vec<&NoteRecord>> = IndexMap::new();
    if kind == GroupKind::Default {
        for label in [PINNED, TODAY, YESTERDAY, THIS_WEEK, EARLIER] {
            groups.insert(label.to_string(), Vec::new());
        }
    }
    for note in sorted {
        groups
            .entry(group_label(note, kind, now))
            .or_default()
            .push(note);
    }

    let mut items = Vec::with_capacity(records.len() + groups.len());
    for (label, notes) in groups {
        if notes.is_empty() {
            continue;
        }
        items.push(Item::header(label));
        items.extend(notes.into_iter().map(note_item));
    }
    items
}

fn group_label(note: &NoteRecord, kind: GroupKind, now: OffsetDateTime) -> String {
    let edited = OffsetDateTime::from_unix_timestamp(note.date_edited)
        .map(|dt| dt.to_offset(now.offset()))
        .ok();
    match kind {
        GroupKind::None => String::new(),
        GroupKind::Default => {
            if note.pinned {
                return PINNED.to_string();
            }
            let Some(edited) = edited else {
                return EARLIER.to_string();
            };
            let label = match (now.date() - edited.date()).whole_days() {
                days if days <= 0 => TODAY,
                1 => YESTERDAY,
                days if days < 7 => THIS_WEEK,
                _ => EARLIER,
            };
            label.to_string()
        }
        GroupKind::Abc => match note.title.trim_start().chars().next() {
            Some(first) if first.is_alphabetic() => first.to_uppercase().collect(),
            _ => "#".to_string(),
        },
        GroupKind::Month => edited
            .and_then(|dt| {
                dt.format(&format_description!("[month repr:long] [year]"))
                    .ok()
            })
            .unwrap_or_else(|| EARLIER.to_string()),
        GroupKind::Year => edited
            .map(|dt| dt.year().to_string())
            .unwrap_or_else(|| EARLIER.to_string()),
    }
}

/// Notebook rows with per-topic counts of live notes.
pub fn notebook_items(notebooks: &[NotebookRecord], notes: &[NoteRecord]) -> Vec<Item> {
    notebooks
        .iter()
        .map(|notebook| {
            let topics = notebook
                .topics
                .iter()
                .map(|topic| TopicSummary {
                    title: topic.title.clone(),
                    note_count: notes
                        .iter()
                        .filter(|note| !note.is_deleted() && note.in_topic(&notebook.id, &topic.id))
                        .count(),
                })
                .collect();
            Item::content(
                notebook.id.clone(),
                notebook.title.clone(),
                Content::Notebook(NotebookSummary {
                    description: notebook.description.clone(),
                    topics,
                }),
            )
        })
        .collect()
}

pub fn tag_items(tags: &[TagRecord]) -> Vec<Item> {
    tags.iter()
        .map(|tag| {
            Item::content(
                format!("tag:{}", tag.name),
                tag.name.clone(),
                Content::Tag(TagSummary {
                    note_count: tag.note_count,
                }),
            )
        })
        .collect()
}

/// Deleted notes, most recently deleted first.
pub fn trash_items(records: &[NoteRecord]) -> Vec<Item> {
    let mut sorted: Vec<&NoteRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.date_deleted.cmp(&a.date_deleted));
    sorted.into_iter().map(note_item).collect()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::source::{NotebookRef, TopicRecord};

    const NOW: OffsetDateTime = datetime!(2026-10-19 15:00 UTC);

    fn note(id: &str, title: &str, edited: OffsetDateTime) -> NoteRecord {
        NoteRecord {
            id: id.to_string(),
            title: title.to_string(),
            headline: String::new(),
            date_edited: edited.unix_timestamp(),
            date_deleted: None,
            tags: Vec::new(),
            color: None,
            pinned: false,
            favorite: false,
            locked: false,
            notebooks: Vec::new(),
        }
    }

    fn titles(items: &[Item]) -> Vec<String> {
        items
            .iter()
            .map(|item| {
                if item.is_header() {
                    format!("[{}]", item.title())
                } else {
                    item.title().to_string()
                }
            })
            .collect()
    }

    #[test]
    fn default_grouping_buckets_by_recency_after_pinned() {
        let mut pinned = note("p", "Pinned note", datetime!(2025-01-01 0:00 UTC));
        pinned.pinned = true;
        let notes = vec![
            note("old", "Old", datetime!(2026-09-01 9:00 UTC)),
            note("today", "Fresh", datetime!(2026-10-19 8:00 UTC)),
            pinned,
            note("yday", "Yesterday's", datetime!(2026-10-18 23:59 UTC)),
            note("week", "Monday", datetime!(2026-10-14 12:00 UTC)),
        ];
        let items = group_notes(&notes, GroupKind::Default, NOW);
        assert_eq!(
            titles(&items),
            vec![
                "[Pinned]",
                "Pinned note",
                "[Today]",
                "Fresh",
                "[Yesterday]",
                "Yesterday's",
                "[This week]",
                "Monday",
                "[Earlier]",
                "Old",
            ]
        );
        assert_eq!(items[0].id.as_deref(), Some("header:Pinned"));
    }

    #[test]
    fn empty_groups_are_skipped() {
        let notes = vec![note("a", "A", datetime!(2026-10-19 1:00 UTC))];
        let items = group_notes(&notes, GroupKind::Default, NOW);
        assert_eq!(titles(&items), vec!["[Today]", "A"]);
        assert!(group_notes(&[], GroupKind::Default, NOW).is_empty());
    }

    #[test]
    fn alphabetical_grouping_uses_first_letter() {
        let notes = vec![
            note("1", "banana", NOW),
            note("2", "42 ideas", NOW),
            note("3", "Apple", NOW),
            note("4", "avocado", NOW),
        ];
        let items = group_notes(&notes, GroupKind::Abc, NOW);
        assert_eq!(
            titles(&items),
            vec!["[#]", "42 ideas", "[A]", "Apple", "avocado", "[B]", "banana"]
        );
    }

    #[test]
    fn month_and_year_groups_run_newest_first() {
        let notes = vec![
            note("1", "Spring", datetime!(2025-04-02 10:00 UTC)),
            note("2", "Autumn", datetime!(2026-10-02 10:00 UTC)),
            note("3", "Also autumn", datetime!(2026-10-12 10:00 UTC)),
        ];
        assert_eq!(
            titles(&group_notes(&notes, GroupKind::Month, NOW)),
            vec![
                "[October 2026]",
                "Also autumn",
                "Autumn",
                "[April 2025]",
                "Spring"
            ]
        );
        assert_eq!(
            titles(&group_notes(&notes, GroupKind::Year, NOW)),
            vec!["[2026]", "Also autumn", "Autumn", "[2025]", "Spring"]
        );
        assert_eq!(
            titles(&group_notes(&notes, GroupKind::None, NOW)),
            vec!["Also autumn", "Autumn", "Spring"]
        );
    }

    #[test]
    fn notebooks_count_live_notes_per_topic() {
        let mut in_topic = note("n1", "Agenda", NOW);
        in_topic.notebooks = vec![NotebookRef {
            id: "nb".into(),
            topics: vec!["t1".into()],
        }];
        let mut deleted = in_topic.clone();
        deleted.id = "n2".into();
        deleted.date_deleted = Some(0);
        let notebooks = vec![NotebookRecord {
            id: "nb".into(),
            title: "Work".into(),
            description: None,
            topics: vec![
                TopicRecord {
                    id: "t1".into(),
                    title: "Meetings".into(),
                },
                TopicRecord {
                    id: "t2".into(),
                    title: "General".into(),
                },
            ],
        }];
        let items = notebook_items(&notebooks, &[in_topic, deleted]);
        let Some(Content::Notebook(summary)) = items[0].content_ref() else {
            panic!("expected a notebook row");
        };
        let counts: Vec<usize> = summary.topics.iter().map(|t| t.note_count).collect();
        assert_eq!(counts, vec![1, 0]);
    }

    #[test]
    fn tag_and_trash_rows() {
        let tags = tag_items(&[TagRecord {
            name: "work".into(),
            note_count: 2,
        }]);
        assert_eq!(tags[0].id.as_deref(), Some("tag:work"));
        assert_eq!(tags[0].title(), "work");

        let mut first = note("a", "A", NOW);
        first.date_deleted = Some(10);
        let mut second = note("b", "B", NOW);
        second.date_deleted = Some(20);
        let trash = trash_items(&[first, second]);
        assert_eq!(titles(&trash), vec!["B", "A"]);
    }
}
