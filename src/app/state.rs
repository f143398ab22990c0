use anyhow::{Context, Result};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::Frame;
use strum::IntoEnumIterator;
use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::events::NoteIntent;
use crate::grouping::{group_notes, notebook_items, tag_items, trash_items, GroupKind};
use crate::list::{
    ActionCommand, GroupJumpMenu, Item, ListAction, ListType, ProfileRegistry, VirtualList,
};
use crate::selection::SelectionStore;
use crate::source::{NoteFilter, NoteSource};

/// Everything the frame is drawn from: one list per view, the shared
/// selection, and the group-jump menu when open.
#[derive(Debug)]
pub struct AppState {
    lists: Vec<VirtualList>,
    active: usize,
    selection: SelectionStore,
    filter: NoteFilter,
    group_by: GroupKind,
    menu: Option<GroupJumpMenu>,
    status_message: Option<String>,
    /// List and item generation the pending select-all was last applied to.
    select_all_applied: Option<(ListType, u64)>,
}

impl AppState {
    pub fn new(config: &AppConfig, registry: &ProfileRegistry, filter: NoteFilter) -> Result<Self> {
        let mut lists = Vec::new();
        for list_type in ListType::iter() {
            let list = VirtualList::new(list_type, registry, &config.list)
                .with_context(|| format!("creating the {list_type} list"))?;
            let list = match list_type {
                ListType::Notes => list
                    .with_placeholder("No notes yet")
                    .with_action(ListAction {
                        label: "Create a new note".to_string(),
                        command: ActionCommand::NewNote,
                        key_hint: 'n',
                    }),
                ListType::Notebooks => list.with_placeholder("No notebooks yet"),
                ListType::Tags => list.with_placeholder("No tags yet"),
                ListType::Trash => list.with_placeholder("Trash is empty"),
            };
            lists.push(list);
        }
        for list in &mut lists {
            list.set_loading(true);
        }
        let active = lists
            .iter()
            .position(|list| list.list_type() == config.default_view)
            .unwrap_or(0);
        Ok(Self {
            lists,
            active,
            selection: SelectionStore::new(),
            filter,
            group_by: config.group_by,
            menu: None,
            status_message: None,
            select_all_applied: None,
        })
    }

    pub fn active_type(&self) -> ListType {
        self.lists[self.active].list_type()
    }

    pub fn active_list(&self) -> &VirtualList {
        &self.lists[self.active]
    }

    pub fn active_list_mut(&mut self) -> &mut VirtualList {
        &mut self.lists[self.active]
    }

    pub fn render_active(&mut self, frame: &mut Frame, area: Rect) {
        self.lists[self.active].render(frame, area, &self.selection);
    }

    pub fn list(&self, list_type: ListType) -> Option<&VirtualList> {
        self.lists.iter().find(|list| list.list_type() == list_type)
    }

    pub fn lists_mut(&mut self) -> impl Iterator<Item = &mut VirtualList> {
        self.lists.iter_mut()
    }

    pub fn tab_titles(&self) -> Vec<&'static str> {
        self.lists.iter().map(|list| list.list_type().label()).collect()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Switching views leaves selection mode.
    pub fn set_active(&mut self, list_type: ListType) -> bool {
        let Some(index) = self.lists.iter().position(|list| list.list_type() == list_type) else {
            return false;
        };
        if index != self.active {
            self.active = index;
            self.selection.clear();
            self.select_all_applied = None;
            self.menu = None;
            tracing::debug!(list = %list_type, "switched view");
        }
        true
    }

    pub fn cycle_view(&mut self, delta: isize) {
        let len = self.lists.len() as isize;
        let next = (self.active as isize + delta).rem_euclid(len) as usize;
        let list_type = self.lists[next].list_type();
        self.set_active(list_type);
    }

    pub fn filter(&self) -> &NoteFilter {
        &self.filter
    }

    pub fn group_by(&self) -> GroupKind {
        self.group_by
    }

    pub fn reload(&mut self, source: &dyn NoteSource, now: OffsetDateTime) -> Result<()> {
        for list_type in ListType::iter() {
            self.reload_list(list_type, source, now)?;
        }
        Ok(())
    }

    /// Replaces one list's items from `source`. On failure the list keeps its
    /// previous items.
    pub fn reload_list(
        &mut self,
        list_type: ListType,
        source: &dyn NoteSource,
        now: OffsetDateTime,
    ) -> Result<()> {
        let LoadedView {
            heading,
            items,
            group,
        } = load_view(source, list_type, &self.filter, self.group_by, now)?;
        let count = items.iter().filter(|item| !item.is_header()).count();
        let Some(list) = self
            .lists
            .iter_mut()
            .find(|list| list.list_type() == list_type)
        else {
            return Ok(());
        };
        list.set_loading(false);
        list.set_items(items)
            .with_context(|| format!("replacing {list_type} items"))?;
        list.set_group_kind(group);
        list.set_header(Some(heading_text(&heading, count)));
        tracing::info!(list = %list_type, count, "list reloaded");
        Ok(())
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn request_select_all(&mut self) {
        self.selection.request_select_all();
        self.select_all_applied = None;
    }

    /// Lets every list react to a pending select-all; only the active one does.
    ///
    /// Applies once per request and again only after the active list's items
    /// are replaced, so rows deselected in between stay deselected.
    pub fn sync_select_all(&mut self) -> bool {
        let active = self.active_type();
        let stamp = (active, self.lists[self.active].generation());
        if self.select_all_applied == Some(stamp) {
            return false;
        }
        let mut applied = false;
        for list in &self.lists {
            applied |= list.sync_select_all(&mut self.selection, active);
        }
        if applied {
            self.select_all_applied = Some(stamp);
        }
        applied
    }

    pub fn toggle_selection(&mut self) -> Option<bool> {
        self.lists[self.active].toggle_focused_selection(&mut self.selection)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.select_all_applied = None;
    }

    pub fn menu(&self) -> Option<&GroupJumpMenu> {
        self.menu.as_ref()
    }

    pub fn menu_mut(&mut self) -> Option<&mut GroupJumpMenu> {
        self.menu.as_mut()
    }

    pub fn open_group_menu(&mut self) -> bool {
        let list = &self.lists[self.active];
        self.menu = GroupJumpMenu::open(&list.header_items(), list.current_group());
        self.menu.is_some()
    }

    pub fn close_group_menu(&mut self) {
        self.menu = None;
    }

    /// Closes the menu and jumps to the chosen group.
    pub fn confirm_group_menu(&mut self) -> Option<usize> {
        let menu = self.menu.take()?;
        let label = menu.selected_label()?;
        self.lists[self.active].jump_to_group(label)
    }

    /// Intent for the active list's primary action, if it has one.
    pub fn primary_action(&self) -> Option<NoteIntent> {
        match self.active_list().action()?.command {
            ActionCommand::NewNote => Some(NoteIntent::New {
                context: self.filter.context(),
            }),
        }
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }
}

/// Items and heading for one view, read from `source`.
#[derive(Debug, Clone)]
pub struct LoadedView {
    pub heading: String,
    pub items: Vec<Item>,
    pub group: GroupKind,
}

pub fn load_view(
    source: &dyn NoteSource,
    list_type: ListType,
    filter: &NoteFilter,
    group_by: GroupKind,
    now: OffsetDateTime,
) -> Result<LoadedView> {
    let (heading, items, group) = match list_type {
        ListType::Notes => {
            let view = source.notes(filter).context("loading notes")?;
            let items = group_notes(&view.notes, group_by, now);
            (view.heading, items, group_by)
        }
        ListType::Notebooks => {
            let notebooks = source.notebooks().context("loading notebooks")?;
            let notes = source
                .notes(&NoteFilter::All)
                .context("loading notes for topic counts")?
                .notes;
            (
                list_type.label().to_string(),
                notebook_items(&notebooks, &notes),
                GroupKind::None,
            )
        }
        ListType::Tags => (
            list_type.label().to_string(),
            tag_items(&source.tags().context("loading tags")?),
            GroupKind::None,
        ),
        ListType::Trash => (
            list_type.label().to_string(),
            trash_items(&source.trash().context("loading trash")?),
            GroupKind::None,
        ),
    };
    Ok(LoadedView {
        heading,
        items,
        group,
    })
}

fn heading_text(heading: &str, count: usize) -> Text<'static> {
    let noun = if count == 1 { "item" } else { "items" };
    Text::from(Line::from(vec![
        Span::styled(
            heading.to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {count} {noun}"),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
}
