use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::{BridgeError, EditorBridge, EditorCommand};
use crate::events::{AppEvent, EventBus, EventTopic, Subscription};

/// Whether the editor currently has something to undo or redo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryState {
    pub undo: bool,
    pub redo: bool,
}

/// Undo/redo controls mirroring the editor's history.
#[derive(Debug)]
pub struct HistoryToolbar {
    state: HistoryState,
    subscription: Subscription,
}

impl HistoryToolbar {
    pub fn new(bus: &EventBus) -> Self {
        Self {
            state: HistoryState::default(),
            subscription: bus.subscribe(EventTopic::HistoryChanged),
        }
    }

    pub fn state(&self) -> HistoryState {
        self.state
    }

    /// Applies the newest queued history change. Returns `true` if the state changed.
    pub fn pump(&mut self) -> bool {
        let latest = self
            .subscription
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                AppEvent::HistoryChanged(state) => Some(state),
                _ => None,
            })
            .last();
        match latest {
            Some(state) if state != self.state => {
                self.state = state;
                true
            }
            _ => false,
        }
    }

    /// Forwards an undo when one is available. Returns whether it was sent.
    pub fn undo(&self, bridge: &dyn EditorBridge) -> Result<bool, BridgeError> {
        self.forward(self.state.undo, EditorCommand::Undo, bridge)
    }

    pub fn redo(&self, bridge: &dyn EditorBridge) -> Result<bool, BridgeError> {
        self.forward(self.state.redo, EditorCommand::Redo, bridge)
    }

    fn forward(
        &self,
        enabled: bool,
        command: EditorCommand,
        bridge: &dyn EditorBridge,
    ) -> Result<bool, BridgeError> {
        if !enabled {
            return Ok(false);
        }
        bridge.send(command)?;
        tracing::debug!(?command, "forwarded to editor");
        Ok(true)
    }

    pub fn line(&self) -> Line<'static> {
        let control = |label: &'static str, enabled: bool| {
            let style = if enabled {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(label, style)
        };
        Line::from(vec![
            control("↶ undo", self.state.undo),
            Span::raw("  "),
            control("↷ redo", self.state.redo),
        ])
    }
}
