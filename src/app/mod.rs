use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};
use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::editor::{EditorBridge, HistoryToolbar};
use crate::events::{AppEvent, EventBus, EventTopic, NoteIntent, Subscription};
use crate::list::{ClickTarget, KeyOutcome, ListType, ProfileRegistry};
use crate::source::{NoteContext, NoteFilter, NoteSource};
use crate::toast::{position_for, ToastAction, ToastCommand, ToastKind, ToastQueue};
use crate::ui;

pub mod state;

pub use state::AppState;

const FRAME_RATE: Duration = Duration::from_millis(16);

enum Action {
    Quit,
    NextView,
    PreviousView,
    ShowView(ListType),
    OpenGroupMenu,
    ToggleSelection,
    SelectAll,
    ClearSelection,
    PageDown,
    PageUp,
    ScrollToTop,
    Refresh,
    Sync,
    RunToastAction,
    PrimaryAction,
    Undo,
    Redo,
}

pub struct App {
    pub config: Arc<AppConfig>,
    source: Box<dyn NoteSource>,
    editor: Box<dyn EditorBridge>,
    bus: EventBus,
    state: AppState,
    toasts: ToastQueue,
    history: HistoryToolbar,
    refresh_events: Subscription,
    scroll_events: Subscription,
    note_events: Subscription,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(
        config: Arc<AppConfig>,
        source: Box<dyn NoteSource>,
        editor: Box<dyn EditorBridge>,
        filter: NoteFilter,
    ) -> Result<Self> {
        let registry = ProfileRegistry::standard();
        let state = AppState::new(&config, &registry, filter).context("building list views")?;
        let bus = EventBus::new();
        let history = HistoryToolbar::new(&bus);
        let refresh_events = bus.subscribe(EventTopic::RefreshNotes);
        let scroll_events = bus.subscribe(EventTopic::ScrollToTop);
        let note_events = bus.subscribe(EventTopic::LoadNote);
        let toasts = ToastQueue::new(config.toast.clone());
        let mut app = Self {
            config,
            source,
            editor,
            bus,
            state,
            toasts,
            history,
            refresh_events,
            scroll_events,
            note_events,
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        };
        app.reload();
        Ok(app)
    }

    /// Handle for publishing into the app from elsewhere, e.g. an editor thread.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| self.draw(frame))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let rate = if self.state.active_list().viewport().is_animating() {
                FRAME_RATE
            } else {
                self.tick_rate
            };
            let timeout = rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(_, _) => {
                        // next draw re-measures against the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= rate {
                self.on_tick(Instant::now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let position = position_for(area.width, self.config.compact_width);
        ui::draw_app(frame, &mut self.state, &self.history);
        self.toasts.render(frame, area, position);
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.toasts.expire(now);
        self.history.pump();

        if !self.refresh_events.drain().is_empty() {
            self.reload();
        }
        if !self.scroll_events.drain().is_empty() {
            for list in self.state.lists_mut() {
                list.scroll_to_top();
            }
        }
        for event in self.note_events.drain() {
            if let AppEvent::LoadNote(intent) = event {
                self.open_note(intent);
            }
        }

        // no-op unless the active list got new items since the last select-all
        self.state.sync_select_all();
        self.state.active_list_mut().tick(now);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.state.menu().is_some() {
            self.handle_menu_key(key);
            return;
        }

        if self.state.active_list_mut().handle_key(key) == KeyOutcome::Consumed {
            return;
        }

        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        let action = match key.code {
            KeyCode::Char('q') if plain => Some(Action::Quit),
            KeyCode::Char('c') if ctrl => Some(Action::Quit),
            KeyCode::Tab => Some(Action::NextView),
            KeyCode::BackTab => Some(Action::PreviousView),
            KeyCode::Char('1') if plain => Some(Action::ShowView(ListType::Notes)),
            KeyCode::Char('2') if plain => Some(Action::ShowView(ListType::Notebooks)),
            KeyCode::Char('3') if plain => Some(Action::ShowView(ListType::Tags)),
            KeyCode::Char('4') if plain => Some(Action::ShowView(ListType::Trash)),
            KeyCode::Char('g') if plain => Some(Action::OpenGroupMenu),
            KeyCode::Char(' ') if plain => Some(Action::ToggleSelection),
            KeyCode::Char('a') if ctrl => Some(Action::SelectAll),
            KeyCode::Esc => Some(Action::ClearSelection),
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::Home => Some(Action::ScrollToTop),
            KeyCode::Char('r') if ctrl => Some(Action::Sync),
            KeyCode::Char('r') if plain => Some(Action::Refresh),
            KeyCode::Char('x') if plain => Some(Action::RunToastAction),
            KeyCode::Char('n') if plain => Some(Action::PrimaryAction),
            KeyCode::Char('z') if ctrl => Some(Action::Undo),
            KeyCode::Char('y') if ctrl => Some(Action::Redo),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(menu) = self.state.menu_mut() {
                    menu.move_selection(-1);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(menu) = self.state.menu_mut() {
                    menu.move_selection(1);
                }
            }
            KeyCode::Enter => {
                self.state.confirm_group_menu();
            }
            KeyCode::Esc | KeyCode::Char('g') | KeyCode::Char('q') => {
                self.state.close_group_menu();
            }
            _ => {}
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::NextView => self.state.cycle_view(1),
            Action::PreviousView => self.state.cycle_view(-1),
            Action::ShowView(list_type) => {
                self.state.set_active(list_type);
            }
            Action::OpenGroupMenu => {
                if !self.state.open_group_menu() {
                    self.state.set_status_message(Some("This view has no groups"));
                }
            }
            Action::ToggleSelection => {
                if let Some(selected) = self.state.toggle_selection() {
                    tracing::debug!(selected, "toggled selection");
                }
            }
            Action::SelectAll => {
                self.state.request_select_all();
                self.state.sync_select_all();
            }
            Action::ClearSelection => self.state.clear_selection(),
            Action::PageDown => self.state.active_list_mut().scroll_page(true),
            Action::PageUp => self.state.active_list_mut().scroll_page(false),
            Action::ScrollToTop => self.state.active_list_mut().scroll_to_top(),
            Action::Refresh => {
                self.bus.publish(AppEvent::RefreshNotes);
            }
            Action::Sync => self.sync(),
            Action::RunToastAction => self.run_toast_action(),
            Action::PrimaryAction => {
                if let Some(intent) = self.state.primary_action() {
                    self.bus.publish(AppEvent::LoadNote(intent));
                }
            }
            Action::Undo => self.forward_history(true),
            Action::Redo => self.forward_history(false),
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.state.menu().is_some() {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let target = self
                    .state
                    .active_list_mut()
                    .focus_at(mouse.column, mouse.row);
                if let Some(ClickTarget::Header(_)) = target {
                    self.state.open_group_menu();
                }
            }
            MouseEventKind::ScrollDown => self.state.active_list_mut().scroll_wheel(true),
            MouseEventKind::ScrollUp => self.state.active_list_mut().scroll_wheel(false),
            _ => {}
        }
    }

    fn reload(&mut self) {
        let now = OffsetDateTime::now_utc();
        match self.state.reload(self.source.as_ref(), now) {
            Ok(()) => {
                self.bus.publish(AppEvent::ScrollToTop);
            }
            Err(err) => {
                tracing::error!(?err, "failed to load lists");
                self.toasts
                    .show(ToastKind::Error, format!("Loading failed: {err:#}"), Vec::new());
            }
        }
    }

    fn sync(&mut self) {
        match self.source.sync() {
            Ok(()) => {
                self.toasts
                    .show(ToastKind::Success, "Sync complete", Vec::new());
                self.bus.publish(AppEvent::RefreshNotes);
            }
            Err(err) => {
                tracing::error!(?err, "sync failed");
                self.toasts.show(
                    ToastKind::Error,
                    format!("Sync failed: {err}"),
                    vec![ToastAction::new("Retry", ToastCommand::RetrySync)],
                );
            }
        }
    }

    fn run_toast_action(&mut self) {
        let Some((id, action)) = self.toasts.latest_action() else {
            return;
        };
        self.toasts.dismiss(id);
        match action.command {
            ToastCommand::RetrySync => self.sync(),
            ToastCommand::Dismiss => {}
        }
    }

    fn forward_history(&mut self, undo: bool) {
        let forwarded = if undo {
            self.history.undo(self.editor.as_ref())
        } else {
            self.history.redo(self.editor.as_ref())
        };
        if let Err(err) = forwarded {
            tracing::warn!(?err, "editor unavailable");
            self.toasts
                .show(ToastKind::Warn, err.to_string(), Vec::new());
        }
    }

    fn open_note(&mut self, intent: NoteIntent) {
        let NoteIntent::New { context } = intent;
        let message = match &context {
            None => "New note".to_string(),
            Some(NoteContext::Tag(tag)) => format!("New note tagged #{tag}"),
            Some(NoteContext::Color(color)) => format!("New note colored {color}"),
            Some(NoteContext::Topic { notebook, topic }) => {
                format!("New note in {notebook} / {topic}")
            }
        };
        tracing::info!(?context, "new note requested");
        self.state.set_status_message(Some(message));
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crossterm::event::KeyEventState;
    use ratatui::backend::TestBackend;
    use tempfile::tempdir;

    use super::*;
    use crate::editor::{self, EditorCommand, HistoryState};
    use crate::list::FocusCursor;
    use crate::source::{JsonLibrary, Library, NoteRecord};

    fn record(id: &str) -> NoteRecord {
        NoteRecord {
            id: id.to_string(),
            title: format!("Note {id}"),
            headline: format!("about {id}"),
            date_edited: OffsetDateTime::now_utc().unix_timestamp(),
            date_deleted: None,
            tags: vec!["work".to_string()],
            color: None,
            pinned: false,
            favorite: false,
            locked: false,
            notebooks: Vec::new(),
        }
    }

    fn app_with(
        source: Box<dyn NoteSource>,
        filter: NoteFilter,
    ) -> (App, crossbeam_channel::Receiver<EditorCommand>) {
        let (bridge, commands) = editor::channel();
        let app = App::new(
            Arc::new(AppConfig::default()),
            source,
            Box::new(bridge),
            filter,
        )
        .expect("app");
        (app, commands)
    }

    fn in_memory(ids: &[&str]) -> Box<dyn NoteSource> {
        Box::new(JsonLibrary::from_library(Library {
            notes: ids.iter().map(|id| record(id)).collect(),
            notebooks: Vec::new(),
        }))
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        app.handle_key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
    }

    fn draw(app: &mut App, terminal: &mut Terminal<TestBackend>) {
        terminal.draw(|frame| app.draw(frame)).expect("draw");
    }

    #[test]
    fn arrows_navigate_and_space_selects() {
        let (mut app, _commands) = app_with(in_memory(&["a", "b"]), NoteFilter::All);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
        draw(&mut app, &mut terminal);

        press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        // [Today] header is skipped
        assert_eq!(app.state().active_list().cursor(), FocusCursor::at(1));
        press(&mut app, KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(app.state().selection().len(), 1);
        press(&mut app, KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(app.state().selection().len(), 2);
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert!(app.state().selection().is_empty());
        assert!(!app.state().selection().should_select_all());

        press(&mut app, KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(app.should_quit());
    }

    #[test]
    fn rows_deselected_after_select_all_stay_deselected() {
        let (mut app, _commands) = app_with(in_memory(&["a", "b", "c"]), NoteFilter::All);
        press(&mut app, KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(app.state().selection().len(), 3);

        press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(app.state().selection().len(), 2);
        app.on_tick(Instant::now());
        app.on_tick(Instant::now());
        assert_eq!(app.state().selection().len(), 2);

        // a reload brings every row back into the pending select-all
        app.bus().publish(AppEvent::RefreshNotes);
        app.on_tick(Instant::now());
        assert_eq!(app.state().selection().len(), 3);
    }

    #[test]
    fn primary_action_publishes_a_new_note_intent() {
        let (mut app, _commands) =
            app_with(in_memory(&["a"]), NoteFilter::Tagged("work".to_string()));
        press(&mut app, KeyCode::Char('n'), KeyModifiers::NONE);
        app.on_tick(Instant::now());
        assert_eq!(app.state().status_message(), Some("New note tagged #work"));
    }

    #[test]
    fn failed_sync_offers_a_retry_that_recovers() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("library.json");
        let library = Library {
            notes: vec![record("a")],
            notebooks: Vec::new(),
        };
        fs::write(&path, serde_json::to_string(&library)?)?;
        let source = JsonLibrary::open(&path)?;
        let (mut app, _commands) = app_with(Box::new(source), NoteFilter::All);

        fs::write(&path, "not json")?;
        press(&mut app, KeyCode::Char('r'), KeyModifiers::CONTROL);
        let toast = &app.toasts().toasts()[0];
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.message.starts_with("Sync failed:"));
        assert_eq!(toast.actions[0].label, "Retry");

        let library = Library {
            notes: vec![record("a"), record("b")],
            notebooks: Vec::new(),
        };
        fs::write(&path, serde_json::to_string(&library)?)?;
        press(&mut app, KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(app.toasts().toasts().len(), 1);
        assert_eq!(app.toasts().toasts()[0].message, "Sync complete");

        app.on_tick(Instant::now());
        assert_eq!(
            app.state().list(ListType::Notes).map(|list| list.len()),
            Some(3)
        );
        Ok(())
    }

    #[test]
    fn undo_is_forwarded_once_history_allows_it() {
        let (mut app, commands) = app_with(in_memory(&["a"]), NoteFilter::All);
        press(&mut app, KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert!(commands.try_recv().is_err());

        app.bus().publish(AppEvent::HistoryChanged(HistoryState {
            undo: true,
            redo: false,
        }));
        app.on_tick(Instant::now());
        press(&mut app, KeyCode::Char('z'), KeyModifiers::CONTROL);
        press(&mut app, KeyCode::Char('y'), KeyModifiers::CONTROL);
        assert_eq!(
            commands.try_iter().collect::<Vec<_>>(),
            vec![EditorCommand::Undo]
        );
    }

    #[test]
    fn clicking_a_header_opens_the_group_menu() {
        let (mut app, _commands) = app_with(in_memory(&["a", "b"]), NoteFilter::All);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
        draw(&mut app, &mut terminal);

        let header_row = terminal
            .backend()
            .buffer()
            .content
            .chunks(80)
            .position(|row| {
                row.iter()
                    .map(|cell| cell.symbol())
                    .collect::<String>()
                    .contains("▾ Today")
            })
            .expect("header drawn");
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 4,
            row: header_row as u16,
            modifiers: KeyModifiers::NONE,
        });
        assert!(app.state().menu().is_some());
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);
        assert!(app.state().menu().is_none());
    }
}
