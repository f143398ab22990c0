use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use unicode_width::UnicodeWidthStr;

use super::item::Item;
use super::profiles::fit_width;

/// Draws a group header row: the label, a rule, and the group's position among
/// its siblings when there is more than one group to jump between.
pub fn render_header(label: &str, index: usize, groups: &[&Item], width: u16) -> Text<'static> {
    let width = usize::from(width);
    let position = groups
        .iter()
        .position(|group| group.title() == label)
        .map(|pos| pos + 1);
    let counter = match position {
        Some(pos) if groups.len() > 1 => format!(" {pos}/{} · g ", groups.len()),
        _ => String::new(),
    };
    let label = fit_width(label, width.saturating_sub(counter.width() + 4));
    let rule_len = width.saturating_sub(label.width() + counter.width() + 3);
    let label_style = if index == 0 {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::LightCyan)
            .add_modifier(Modifier::BOLD)
    };
    Text::from(Line::from(vec![
        Span::styled("▾ ", Style::default().fg(Color::DarkGray)),
        Span::styled(label, label_style),
        Span::raw(" "),
        Span::styled("─".repeat(rule_len), Style::default().fg(Color::DarkGray)),
        Span::styled(counter, Style::default().fg(Color::DarkGray)),
    ]))
}

/// Picker listing every group label of the list, used to jump between groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupJumpMenu {
    labels: Vec<String>,
    selected: usize,
}

impl GroupJumpMenu {
    /// Returns `None` when the list has no groups to offer.
    pub fn open(groups: &[&Item], current: Option<&str>) -> Option<Self> {
        let labels: Vec<String> = groups.iter().map(|item| item.title().to_string()).collect();
        if labels.is_empty() {
            return None;
        }
        let selected = current
            .and_then(|label| labels.iter().position(|candidate| candidate == label))
            .unwrap_or(0);
        Some(Self { labels, selected })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.labels.len() as isize;
        if len == 0 {
            return;
        }
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.labels.get(self.selected).map(String::as_str)
    }
}
