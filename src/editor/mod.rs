//! Bridge to the note editor, which lives outside this crate.

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

mod history;

pub use history::{HistoryState, HistoryToolbar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Undo,
    Redo,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("editor is not connected")]
    Disconnected,
}

/// Receives commands aimed at the editor.
pub trait EditorBridge: std::fmt::Debug + Send {
    fn send(&self, command: EditorCommand) -> Result<(), BridgeError>;
}

/// Forwards commands over a channel to whichever thread hosts the editor.
#[derive(Debug, Clone)]
pub struct ChannelEditorBridge {
    tx: Sender<EditorCommand>,
}

impl EditorBridge for ChannelEditorBridge {
    fn send(&self, command: EditorCommand) -> Result<(), BridgeError> {
        self.tx
            .send(command)
            .map_err(|_| BridgeError::Disconnected)
    }
}

pub fn channel() -> (ChannelEditorBridge, Receiver<EditorCommand>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChannelEditorBridge { tx }, rx)
}
