use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use time::macros::format_description;
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::item::{Content, Item, NoteFlags, NoteSummary};
use super::ListError;
use crate::grouping::GroupKind;

/// Tag naming a kind of list; selects the rendering profile and identifies the
/// active list for select-all.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ListType {
    Notes,
    Notebooks,
    Tags,
    Trash,
}

impl Default for ListType {
    fn default() -> Self {
        ListType::Notes
    }
}

impl ListType {
    pub fn label(self) -> &'static str {
        match self {
            ListType::Notes => "Notes",
            ListType::Notebooks => "Notebooks",
            ListType::Tags => "Tags",
            ListType::Trash => "Trash",
        }
    }
}

/// Per-row state handed to a profile.
#[derive(Debug, Clone, Copy)]
pub struct RowContext {
    pub width: u16,
    pub selected: bool,
    pub focused: bool,
}

pub trait ListProfile: fmt::Debug {
    /// Layout hint in terminal lines, used until a row has been rendered once.
    fn estimated_item_height(&self) -> u16;

    /// Draws one content row. `None` renders nothing for the row.
    fn render_content(
        &self,
        index: usize,
        item: &Item,
        group: GroupKind,
        ctx: &RowContext,
    ) -> Option<Text<'static>>;
}

#[derive(Debug, Default, Clone)]
pub struct ProfileRegistry {
    profiles: HashMap<ListType, Arc<dyn ListProfile>>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a profile for every built-in list type.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(ListType::Notes, NotesProfile)
            .register(ListType::Notebooks, NotebooksProfile)
            .register(ListType::Tags, TagsProfile)
            .register(ListType::Trash, TrashProfile);
        registry
    }

    pub fn register(
        &mut self,
        list_type: ListType,
        profile: impl ListProfile + 'static,
    ) -> &mut Self {
        self.profiles.insert(list_type, Arc::new(profile));
        self
    }

    pub fn resolve(&self, list_type: ListType) -> Result<Arc<dyn ListProfile>, ListError> {
        self.profiles
            .get(&list_type)
            .cloned()
            .ok_or(ListError::MissingProfile(list_type))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotesProfile;

impl ListProfile for NotesProfile {
    fn estimated_item_height(&self) -> u16 {
        3
    }

    fn render_content(
        &self,
        _index: usize,
        item: &Item,
        group: GroupKind,
        ctx: &RowContext,
    ) -> Option<Text<'static>> {
        let Content::Note(note) = item.content_ref()? else {
            return None;
        };
        let date = format_note_date(note.edited_at, group);
        Some(note_text(item.title(), note, date, ctx))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrashProfile;

impl ListProfile for TrashProfile {
    fn estimated_item_height(&self) -> u16 {
        3
    }

    fn render_content(
        &self,
        _index: usize,
        item: &Item,
        _group: GroupKind,
        ctx: &RowContext,
    ) -> Option<Text<'static>> {
        let Content::Note(note) = item.content_ref()? else {
            return None;
        };
        let date = match note.deleted_at {
            Some(deleted_at) => format!(
                "Deleted {}",
                format_note_date(deleted_at, GroupKind::Default)
            ),
            None => "Deleted".to_string(),
        };
        Some(note_text(item.title(), note, date, ctx))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotebooksProfile;

impl ListProfile for NotebooksProfile {
    fn estimated_item_height(&self) -> u16 {
        2
    }

    fn render_content(
        &self,
        _index: usize,
        item: &Item,
        _group: GroupKind,
        ctx: &RowContext,
    ) -> Option<Text<'static>> {
        let Content::Notebook(notebook) = item.content_ref()? else {
            return None;
        };
        let width = usize::from(ctx.width);
        let title = Line::from(vec![
            selection_marker(ctx),
            Span::styled(
                fit_width(item.title(), width.saturating_sub(2)),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]);
        let detail = match notebook.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => description.to_string(),
            None => notebook
                .topics
                .iter()
                .map(|topic| format!("{} ({})", topic.title, topic.note_count))
                .collect::<Vec<_>>()
                .join(" · "),
        };
        let detail = Line::from(vec![
            Span::raw("  "),
            Span::styled(
                fit_width(&detail, width.saturating_sub(2)),
                Style::default().fg(Color::Gray),
            ),
        ]);
        Some(Text::from(vec![title, detail]))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TagsProfile;

impl ListProfile for TagsProfile {
    fn estimated_item_height(&self) -> u16 {
        1
    }

    fn render_content(
        &self,
        _index: usize,
        item: &Item,
        _group: GroupKind,
        ctx: &RowContext,
    ) -> Option<Text<'static>> {
        let Content::Tag(tag) = item.content_ref()? else {
            return None;
        };
        let count = match tag.note_count {
            1 => "1 note".to_string(),
            n => format!("{n} notes"),
        };
        let label = fit_width(
            &format!("#{}", item.title()),
            usize::from(ctx.width).saturating_sub(count.width() + 4),
        );
        Some(Text::from(Line::from(vec![
            selection_marker(ctx),
            Span::styled(label, Style::default().fg(Color::Green)),
            Span::raw("  "),
            Span::styled(count, Style::default().fg(Color::DarkGray)),
        ])))
    }
}

fn note_text(title: &str, note: &NoteSummary, meta: String, ctx: &RowContext) -> Text<'static> {
    let width = usize::from(ctx.width);
    let mut title_spans = vec![selection_marker(ctx)];
    let mut used = 2;
    if note.flags.contains(NoteFlags::PINNED) {
        title_spans.push(Span::styled(
            "★ ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
        used += 2;
    }
    if note.flags.contains(NoteFlags::FAVORITE) {
        title_spans.push(Span::styled("♥ ", Style::default().fg(Color::Red)));
        used += 2;
    }
    if note.flags.contains(NoteFlags::LOCKED) {
        title_spans.push(Span::styled(
            "[L] ",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        ));
        used += 4;
    }
    title_spans.push(Span::styled(
        fit_width(title, width.saturating_sub(used)),
        Style::default().add_modifier(Modifier::BOLD),
    ));

    let headline = if note.flags.contains(NoteFlags::LOCKED) {
        "(locked)".to_string()
    } else {
        fit_width(&note.headline, width.saturating_sub(2))
    };
    let headline_line = Line::from(vec![
        Span::raw("  "),
        Span::styled(headline, Style::default().fg(Color::Gray)),
    ]);

    let mut meta_spans = vec![
        Span::raw("  "),
        Span::styled(meta, Style::default().fg(Color::DarkGray)),
    ];
    for tag in &note.tags {
        meta_spans.push(Span::raw(" "));
        meta_spans.push(Span::styled(
            format!("#{tag}"),
            Style::default().fg(Color::Green),
        ));
    }
    if let Some(color) = &note.color {
        meta_spans.push(Span::raw(" "));
        meta_spans.push(Span::styled("●", Style::default().fg(note_color(color))));
    }

    Text::from(vec![
        Line::from(title_spans),
        headline_line,
        Line::from(meta_spans),
    ])
}

fn selection_marker(ctx: &RowContext) -> Span<'static> {
    if ctx.selected {
        Span::styled(
            "✔ ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw("  ")
    }
}

pub(crate) fn format_note_date(epoch: i64, group: GroupKind) -> String {
    let Ok(dt) = OffsetDateTime::from_unix_timestamp(epoch) else {
        return epoch.to_string();
    };
    let formatted = match group {
        GroupKind::Month | GroupKind::Year => {
            dt.format(&format_description!("[day padding:none] [month repr:short]"))
        }
        GroupKind::Default => dt.format(&format_description!("[year]-[month]-[day]")),
        GroupKind::None | GroupKind::Abc => {
            dt.format(&format_description!("[year]-[month]-[day] [hour]:[minute]"))
        }
    };
    formatted.unwrap_or_else(|_| epoch.to_string())
}

pub(crate) fn note_color(name: &str) -> Color {
    match name.to_ascii_lowercase().as_str() {
        "red" => Color::Red,
        "orange" => Color::LightRed,
        "yellow" => Color::Yellow,
        "green" => Color::Green,
        "blue" => Color::Blue,
        "purple" => Color::Magenta,
        "gray" | "grey" => Color::Gray,
        _ => Color::White,
    }
}

/// Truncates to `width` display columns, ending with `…` when cut.
pub(crate) fn fit_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = grapheme.width();
        if used + w + 1 > width {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out.push('…');
    out
}
