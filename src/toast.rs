//! Transient notifications drawn over the list.

use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use strum::Display;
use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

use crate::config::ToastOptions;
use crate::list::profiles::fit_width;

const TOAST_WIDTH: u16 = 46;
const TOAST_HEIGHT: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warn,
    Info,
}

impl ToastKind {
    fn color(self) -> Color {
        match self {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
            ToastKind::Warn => Color::Yellow,
            ToastKind::Info => Color::Cyan,
        }
    }

    fn icon(self) -> &'static str {
        match self {
            ToastKind::Success => "✓",
            ToastKind::Error => "✗",
            ToastKind::Warn => "!",
            ToastKind::Info => "i",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastCommand {
    RetrySync,
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastAction {
    pub label: String,
    pub command: ToastCommand,
}

impl ToastAction {
    pub fn new(label: impl Into<String>, command: ToastCommand) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub actions: Vec<ToastAction>,
    pub shown_at: Instant,
    pub hide_after: Duration,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.hide_after
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPosition {
    TopRight,
    BottomCenter,
}

/// Compact terminals get centred toasts along the bottom edge.
pub fn position_for(width: u16, compact_width: u16) -> ToastPosition {
    if width < compact_width {
        ToastPosition::BottomCenter
    } else {
        ToastPosition::TopRight
    }
}

#[derive(Debug)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    options: ToastOptions,
}

impl ToastQueue {
    pub fn new(options: ToastOptions) -> Self {
        Self {
            toasts: Vec::new(),
            options,
        }
    }

    pub fn lifetime_for(&self, kind: ToastKind, has_actions: bool) -> Duration {
        if has_actions {
            self.options.action_hide_after
        } else if kind == ToastKind::Error {
            self.options.error_hide_after
        } else {
            self.options.hide_after
        }
    }

    pub fn show(
        &mut self,
        kind: ToastKind,
        message: impl Into<String>,
        actions: Vec<ToastAction>,
    ) -> Uuid {
        self.show_at(kind, message, actions, Instant::now())
    }

    pub fn show_at(
        &mut self,
        kind: ToastKind,
        message: impl Into<String>,
        actions: Vec<ToastAction>,
        now: Instant,
    ) -> Uuid {
        let message = message.into();
        let hide_after = self.lifetime_for(kind, !actions.is_empty());
        let id = Uuid::new_v4();
        match kind {
            ToastKind::Error | ToastKind::Warn => {
                tracing::warn!(%kind, %id, message = %message, "toast shown")
            }
            _ => tracing::debug!(%kind, %id, message = %message, "toast shown"),
        }
        self.toasts.push(Toast {
            id,
            kind,
            message,
            actions,
            shown_at: now,
            hide_after,
        });
        id
    }

    /// Drops expired toasts. Returns how many were removed.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.toasts.len();
        self.toasts.retain(|toast| !toast.is_expired(now));
        before - self.toasts.len()
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        before != self.toasts.len()
    }

    /// First action of the newest toast that has one.
    pub fn latest_action(&self) -> Option<(Uuid, ToastAction)> {
        self.toasts.iter().rev().find_map(|toast| {
            toast
                .actions
                .first()
                .map(|action| (toast.id, action.clone()))
        })
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Draws toasts newest-nearest-the-edge; ones that do not fit are skipped.
    pub fn render(&self, frame: &mut Frame, area: Rect, position: ToastPosition) {
        for (slot, toast) in self.toasts.iter().rev().enumerate() {
            let Some(rect) = toast_area(area, position, slot) else {
                break;
            };
            frame.render_widget(Clear, rect);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(toast.kind.color()));
            frame.render_widget(Paragraph::new(toast_line(toast, rect.width)).block(block), rect);
        }
    }
}

fn toast_line(toast: &Toast, width: u16) -> Line<'static> {
    let inner = usize::from(width.saturating_sub(2));
    let actions: String = toast
        .actions
        .iter()
        .map(|action| format!(" [x] {}", action.label))
        .collect();
    let message = fit_width(
        &toast.message,
        inner.saturating_sub(actions.width() + 3),
    );
    Line::from(vec![
        Span::styled(
            format!(" {} ", toast.kind.icon()),
            Style::default()
                .fg(toast.kind.color())
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(message),
        Span::styled(
            actions,
            Style::default()
                .fg(toast.kind.color())
                .add_modifier(Modifier::UNDERLINED),
        ),
    ])
}

/// Area of the `slot`-th toast counted from the anchored edge.
pub fn toast_area(area: Rect, position: ToastPosition, slot: usize) -> Option<Rect> {
    let width = TOAST_WIDTH.min(area.width);
    let offset = u16::try_from(slot).ok()?.checked_mul(TOAST_HEIGHT)?;
    if width == 0 || offset + TOAST_HEIGHT > area.height {
        return None;
    }
    let (x, y) = match position {
        ToastPosition::TopRight => (area.x + area.width - width, area.y + offset),
        ToastPosition::BottomCenter => (
            area.x + (area.width - width) / 2,
            area.y + area.height - TOAST_HEIGHT - offset,
        ),
    };
    Some(Rect {
        x,
        y,
        width,
        height: TOAST_HEIGHT,
    })
}
