use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::state::AppState;
use crate::editor::HistoryToolbar;
use crate::list::GroupJumpMenu;

const KEY_HINTS: &str = "↑↓ move · g groups · space select · ^a all · ^r sync · q quit";

pub fn draw_app(frame: &mut Frame, state: &mut AppState, history: &HistoryToolbar) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let tabs = Tabs::new(state.tab_titles())
        .select(state.active_index())
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(Span::styled("│", Style::default().fg(Color::DarkGray)));
    frame.render_widget(tabs, vertical[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(vertical[1]);
    frame.render_widget(block, vertical[1]);
    state.render_active(frame, inner);

    let history_line = history.line();
    let history_width = u16::try_from(history_line.width()).unwrap_or(0);
    let status_columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(history_width + 1)])
        .split(vertical[2]);
    frame.render_widget(Paragraph::new(build_status_line(state)), status_columns[0]);
    frame.render_widget(Paragraph::new(history_line), status_columns[1]);

    if let Some(menu) = state.menu() {
        render_group_menu(frame, menu, vertical[1]);
    }
}

fn build_status_line(state: &AppState) -> Line<'static> {
    let mut spans = Vec::new();
    let selected = state.selection().len();
    if selected > 0 || state.selection().should_select_all() {
        spans.push(Span::styled(
            format!("{selected} selected"),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" | "));
    }
    match state.status_message() {
        Some(message) => spans.push(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Yellow),
        )),
        None => spans.push(Span::styled(KEY_HINTS, Style::default().fg(Color::Gray))),
    }
    Line::from(spans)
}

fn render_group_menu(frame: &mut Frame, menu: &GroupJumpMenu, area: Rect) {
    let widest = menu
        .labels()
        .iter()
        .map(|label| label.width())
        .max()
        .unwrap_or(0);
    let width = u16::try_from(widest + 6).unwrap_or(u16::MAX).max(22);
    let height = u16::try_from(menu.labels().len() + 2).unwrap_or(u16::MAX);
    let popup = centered_rect(width, height, area);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = menu
        .labels()
        .iter()
        .map(|label| ListItem::new(label.clone()))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title("Jump to group")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("› ");
    let mut list_state = ListState::default();
    list_state.select(Some(menu.selected()));
    frame.render_stateful_widget(list, popup, &mut list_state);
}

/// Fixed-size rectangle centred in `area`, shrunk to fit.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use time::macros::datetime;

    use super::*;
    use crate::config::AppConfig;
    use crate::events::EventBus;
    use crate::list::ProfileRegistry;
    use crate::source::{JsonLibrary, Library, NoteFilter, NoteRecord};

    fn state_with_groups() -> AppState {
        let notes = ["Alpha", "Bravo", "Charlie"]
            .iter()
            .enumerate()
            .map(|(i, title)| NoteRecord {
                id: format!("n{i}"),
                title: title.to_string(),
                headline: String::new(),
                date_edited: 1_700_000_000,
                date_deleted: None,
                tags: Vec::new(),
                color: None,
                pinned: false,
                favorite: false,
                locked: false,
                notebooks: Vec::new(),
            })
            .collect();
        let config = AppConfig {
            group_by: crate::grouping::GroupKind::Abc,
            ..AppConfig::default()
        };
        let mut state = AppState::new(&config, &ProfileRegistry::standard(), NoteFilter::All)
            .expect("state");
        state
            .reload(
                &JsonLibrary::from_library(Library {
                    notes,
                    notebooks: Vec::new(),
                }),
                datetime!(2026-10-19 12:00 UTC),
            )
            .expect("reload");
        state
    }

    fn rows(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    #[test]
    fn frame_has_tabs_list_and_status() {
        let mut state = state_with_groups();
        let history = HistoryToolbar::new(&EventBus::new());
        let mut terminal = Terminal::new(TestBackend::new(70, 20)).expect("terminal");
        terminal
            .draw(|frame| draw_app(frame, &mut state, &history))
            .expect("draw");
        let rows = rows(&terminal);
        assert!(rows[0].contains("Notes") && rows[0].contains("Trash"));
        assert!(rows[2].contains("Notes") && rows[2].contains("3 items"), "{:?}", rows[2]);
        assert!(rows[3].contains("▾ A"), "{:?}", rows[3]);
        assert!(rows[19].contains("g groups"));
        assert!(rows[19].contains("undo"));
    }

    #[test]
    fn open_group_menu_lists_every_label() {
        let mut state = state_with_groups();
        assert!(state.open_group_menu());
        let history = HistoryToolbar::new(&EventBus::new());
        let mut terminal = Terminal::new(TestBackend::new(70, 20)).expect("terminal");
        terminal
            .draw(|frame| draw_app(frame, &mut state, &history))
            .expect("draw");
        let screen = rows(&terminal).join("\n");
        assert!(screen.contains("Jump to group"));
        assert!(screen.contains("› A"));
        assert!(screen.contains("B"));
    }
}
