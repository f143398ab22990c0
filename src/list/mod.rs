//! Virtualized, grouped list with keyboard focus navigation.
//!
//! Only rows inside the viewport (plus overscan) are rendered each frame.
//! Arrow keys move a focus cursor that steps over group header rows, group
//! labels can be jumped to with an animated scroll, and the list fills the
//! shared [`SelectionStore`] when a select-all is requested while it is the
//! active list.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{KeyEvent, KeyEventKind};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;
use thiserror::Error;

use crate::config::ListOptions;
use crate::grouping::GroupKind;
use crate::selection::SelectionStore;

pub mod group_header;
pub mod item;
pub mod navigation;
pub mod profiles;
pub mod viewport;

pub use group_header::GroupJumpMenu;
pub use item::{
    Content, Item, ItemKey, ItemKind, NoteFlags, NoteSummary, NotebookSummary, TagSummary,
    TopicSummary,
};
pub use navigation::{next_focus, FocusCursor, NavDirection};
pub use profiles::{ListProfile, ListType, ProfileRegistry, RowContext};
pub use viewport::{Align, ScrollBehavior, Viewport};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("no rendering profile registered for list type `{0}`")]
    MissingProfile(ListType),
    #[error("item at index {index} has neither an id nor a title")]
    MissingKey { index: usize },
    #[error("duplicate item key `{key}` at indices {first} and {second}")]
    DuplicateKey {
        key: ItemKey,
        first: usize,
        second: usize,
    },
}

/// Whether the list used a key press; consumed keys must not scroll anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Consumed,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Row(usize),
    Header(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCommand {
    NewNote,
}

/// The list's single primary action control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListAction {
    pub label: String,
    pub command: ActionCommand,
    pub key_hint: char,
}

#[derive(Debug)]
pub struct VirtualList {
    list_type: ListType,
    group_kind: GroupKind,
    profile: Arc<dyn ListProfile>,
    items: Vec<Item>,
    cursor: FocusCursor,
    focused_row: Option<usize>,
    viewport: Viewport,
    mounted: Range<usize>,
    row_areas: Vec<(usize, Rect)>,
    header: Option<Text<'static>>,
    placeholder: Option<String>,
    loading: bool,
    action: Option<ListAction>,
    wheel_step: u16,
    generation: u64,
}

impl VirtualList {
    pub fn new(
        list_type: ListType,
        registry: &ProfileRegistry,
        options: &ListOptions,
    ) -> Result<Self, ListError> {
        let profile = registry.resolve(list_type)?;
        let viewport = Viewport::new(profile.estimated_item_height(), options.overscan_rows)
            .with_smooth_duration(options.smooth_scroll());
        Ok(Self {
            list_type,
            group_kind: GroupKind::None,
            profile,
            items: Vec::new(),
            cursor: FocusCursor::NONE,
            focused_row: None,
            viewport,
            mounted: 0..0,
            row_areas: Vec::new(),
            header: None,
            placeholder: None,
            loading: false,
            action: None,
            wheel_step: options.wheel_step.max(1),
            generation: 0,
        })
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_action(mut self, action: ListAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn list_type(&self) -> ListType {
        self.list_type
    }

    pub fn group_kind(&self) -> GroupKind {
        self.group_kind
    }

    pub fn set_group_kind(&mut self, group_kind: GroupKind) {
        self.group_kind = group_kind;
    }

    pub fn set_header(&mut self, header: Option<Text<'static>>) {
        self.header = header;
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn action(&self) -> Option<&ListAction> {
        self.action.as_ref()
    }

    /// Replaces every item. Rejects sets with a keyless item or a repeated key
    /// and keeps the previous items in that case.
    pub fn set_items(&mut self, items: Vec<Item>) -> Result<(), ListError> {
        let mut seen: HashMap<ItemKey, usize> = HashMap::with_capacity(items.len());
        let mut keys = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let key = item.key().ok_or(ListError::MissingKey { index })?;
            if let Some(first) = seen.insert(key.clone(), index) {
                return Err(ListError::DuplicateKey {
                    key,
                    first,
                    second: index,
                });
            }
            keys.push(key);
        }

        let len = items.len();
        let cursor_key = self.cursor.index().and_then(|index| self.key_at(index));
        let focused_key = self.focused_row.and_then(|index| self.key_at(index));
        self.viewport.reset(keys);
        self.items = items;
        self.generation += 1;
        // positions survive only where the same content row is still in place
        if self.cursor.index().and_then(|index| self.key_at(index)) != cursor_key
            || cursor_key.is_none()
        {
            self.cursor = FocusCursor::NONE;
        }
        if self.focused_row.and_then(|index| self.key_at(index)) != focused_key
            || focused_key.is_none()
        {
            self.focused_row = None;
        }
        self.mounted = self.mounted.start.min(len)..self.mounted.end.min(len);
        self.row_areas.retain(|(index, _)| *index < len);
        tracing::debug!(list = %self.list_type, count = len, "list items replaced");
        Ok(())
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Bumped by every successful `set_items`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn key_at(&self, index: usize) -> Option<ItemKey> {
        self.items
            .get(index)
            .filter(|item| !item.is_header())
            .and_then(Item::key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> FocusCursor {
        self.cursor
    }

    /// Row currently holding visual focus. Lags the cursor when the cursor's
    /// row was not mounted at the time of the key press.
    pub fn focused_row(&self) -> Option<usize> {
        self.focused_row
    }

    pub fn focused_item(&self) -> Option<&Item> {
        self.cursor.index().and_then(|index| self.items.get(index))
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn mounted_range(&self) -> Range<usize> {
        self.mounted.clone()
    }

    pub fn header_items(&self) -> Vec<&Item> {
        self.items.iter().filter(|item| item.is_header()).collect()
    }

    /// Label of the group the cursor (or, without a cursor, the top row) sits in.
    pub fn current_group(&self) -> Option<&str> {
        let anchor = self
            .cursor
            .index()
            .or_else(|| self.viewport.index_at(self.viewport.scroll_offset()))?;
        self.items
            .get(..=anchor.min(self.items.len().checked_sub(1)?))?
            .iter()
            .rev()
            .find(|item| item.is_header())
            .map(Item::title)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind != KeyEventKind::Press {
            return KeyOutcome::Ignored;
        }
        let Some(direction) = NavDirection::from_key(key.code) else {
            return KeyOutcome::Ignored;
        };
        match self.navigate(direction) {
            Some(_) => KeyOutcome::Consumed,
            None => KeyOutcome::Ignored,
        }
    }

    /// Moves the focus cursor one step, skipping a header row with a single
    /// extra hop, and scrolls the target into view immediately.
    pub fn navigate(&mut self, direction: NavDirection) -> Option<usize> {
        let target = next_focus(&self.items, self.cursor, direction)?;
        self.viewport.scroll_into_view(target);
        self.cursor = FocusCursor::at(target);
        if self.mounted.contains(&target) {
            self.focused_row = Some(target);
        } else {
            tracing::debug!(
                list = %self.list_type,
                target,
                "focus target not mounted; visual focus unchanged"
            );
        }
        Some(target)
    }

    /// Smoothly centres the header labelled `label`. Unknown labels are ignored.
    pub fn jump_to_group(&mut self, label: &str) -> Option<usize> {
        let index = self
            .items
            .iter()
            .position(|item| item.is_header() && item.title() == label)?;
        self.viewport
            .scroll_to_index(index, Align::Center, ScrollBehavior::Smooth, Instant::now());
        tracing::debug!(list = %self.list_type, label, index, "jumping to group");
        Some(index)
    }

    /// Fills `selection` with every non-header row when a select-all is pending
    /// and this list is the active one. Leaves the request flag untouched.
    pub fn sync_select_all(&self, selection: &mut SelectionStore, active: ListType) -> bool {
        if !selection.should_select_all() || active != self.list_type {
            return false;
        }
        selection.set_selected_items(
            self.items
                .iter()
                .filter(|item| !item.is_header())
                .filter_map(Item::key),
        );
        true
    }

    /// Toggles the cursor row in `selection`. Header rows are never selectable.
    pub fn toggle_focused_selection(&self, selection: &mut SelectionStore) -> Option<bool> {
        let item = self.focused_item().filter(|item| !item.is_header())?;
        Some(selection.toggle(item.key()?))
    }

    /// Resolves a click on screen coordinates against the rows drawn last frame.
    pub fn focus_at(&mut self, column: u16, row: u16) -> Option<ClickTarget> {
        let index = self
            .row_areas
            .iter()
            .find(|(_, rect)| {
                column >= rect.x
                    && column < rect.x + rect.width
                    && row >= rect.y
                    && row < rect.y + rect.height
            })
            .map(|(index, _)| *index)?;
        if self.items.get(index)?.is_header() {
            return Some(ClickTarget::Header(index));
        }
        self.cursor = FocusCursor::at(index);
        self.focused_row = Some(index);
        Some(ClickTarget::Row(index))
    }

    pub fn scroll_wheel(&mut self, down: bool) {
        let step = i32::from(self.wheel_step);
        self.viewport.scroll_by(if down { step } else { -step });
    }

    pub fn scroll_page(&mut self, down: bool) {
        let page = i32::from(self.viewport.height().max(1));
        self.viewport.scroll_by(if down { page } else { -page });
    }

    pub fn scroll_to_top(&mut self) {
        self.viewport.scroll_to_top();
    }

    /// Advances smooth scrolling; returns `true` while an animation is running.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.viewport.tick(now);
        self.viewport.is_animating()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, selection: &SelectionStore) {
        let header_height = self
            .header
            .as_ref()
            .map(|header| u16::try_from(header.height()).unwrap_or(u16::MAX))
            .unwrap_or(0);
        let action_height = u16::from(self.action.is_some());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(header_height),
                Constraint::Min(0),
                Constraint::Length(action_height),
            ])
            .split(area);

        if let Some(header) = &self.header {
            frame.render_widget(Paragraph::new(header.clone()), chunks[0]);
        }

        if self.items.is_empty() {
            self.mounted = 0..0;
            self.row_areas.clear();
            if let Some(placeholder) = &self.placeholder {
                let message = if self.loading {
                    "⟳ Loading…"
                } else {
                    placeholder.as_str()
                };
                let body = chunks[1];
                if body.height > 0 {
                    let line = Rect {
                        y: body.y + body.height / 2,
                        height: 1,
                        ..body
                    };
                    frame.render_widget(
                        Paragraph::new(Span::styled(message, Style::default().fg(Color::Gray)))
                            .alignment(Alignment::Center),
                        line,
                    );
                }
            }
        } else {
            self.render_rows(frame, chunks[1], selection);
        }

        if let Some(action) = &self.action {
            let button = Line::from(vec![
                Span::styled(
                    format!(" + {} ", action.label),
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" ({})", action.key_hint),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            frame.render_widget(Paragraph::new(button).alignment(Alignment::Right), chunks[2]);
        }
    }

    fn render_rows(&mut self, frame: &mut Frame, body: Rect, selection: &SelectionStore) {
        let row_width = body.width.saturating_sub(1);
        self.viewport.set_height(body.height);

        // Measuring can shift the window, so render until it stops moving.
        let mut rendered: BTreeMap<usize, Option<Text<'static>>> = BTreeMap::new();
        let mut range = self.viewport.mounted_range();
        for _ in 0..3 {
            let missing: Vec<usize> = range
                .clone()
                .filter(|index| !rendered.contains_key(index))
                .collect();
            for index in missing {
                let text = self.render_row(index, row_width, selection);
                let height = text.as_ref().map(Text::height).unwrap_or(0);
                self.viewport
                    .measure(index, u16::try_from(height).unwrap_or(u16::MAX));
                rendered.insert(index, text);
            }
            let next = self.viewport.mounted_range();
            if next == range {
                break;
            }
            range = next;
        }

        let offset = self.viewport.scroll_offset();
        let bottom = offset + u32::from(body.height);
        self.row_areas.clear();
        for index in range.clone() {
            let Some(Some(text)) = rendered.remove(&index) else {
                continue;
            };
            let top = self.viewport.row_top(index);
            let height = u32::from(self.viewport.row_height(index));
            if height == 0 || top + height <= offset || top >= bottom {
                continue;
            }
            let visible_top = top.max(offset);
            let visible_bottom = (top + height).min(bottom);
            let rect = Rect {
                x: body.x,
                y: body.y + u16::try_from(visible_top - offset).unwrap_or(0),
                width: row_width,
                height: u16::try_from(visible_bottom - visible_top).unwrap_or(0),
            };
            let skip = u16::try_from(visible_top - top).unwrap_or(0);
            let mut paragraph = Paragraph::new(text).scroll((skip, 0));
            if self.focused_row == Some(index) {
                paragraph = paragraph.style(Style::default().bg(Color::DarkGray));
            }
            frame.render_widget(paragraph, rect);
            self.row_areas.push((index, rect));
        }
        self.mounted = range;

        let max_offset = self.viewport.max_offset();
        if max_offset > 0 {
            let mut state = ScrollbarState::new(max_offset as usize + 1)
                .position(offset as usize)
                .viewport_content_length(usize::from(body.height));
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                body,
                &mut state,
            );
        }
    }

    fn render_row(
        &self,
        index: usize,
        width: u16,
        selection: &SelectionStore,
    ) -> Option<Text<'static>> {
        let item = self.items.get(index)?;
        if item.is_header() {
            let groups = self.header_items();
            return Some(group_header::render_header(
                item.title(),
                index,
                &groups,
                width,
            ));
        }
        let ctx = RowContext {
            width,
            selected: item
                .key()
                .is_some_and(|key| selection.is_selected(&key)),
            focused: self.focused_row == Some(index),
        };
        self.profile
            .render_content(index, item, self.group_kind, &ctx)
    }
}
