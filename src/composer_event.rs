//! Outbound notifications from the composer to its owner.

use tokio::sync::mpsc::UnboundedSender;

/// Fired on every committed mutation / cursor change. Submission and
/// cancellation travel through the return value of
/// [`crate::Composer::handle_chunk`] instead, mirroring how the owner polls
/// input results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerEvent {
    ValueChanged(String),
    CursorMoved(usize),
}

/// Cloneable sender handle. Sending never blocks; a closed channel is logged
/// and otherwise ignored so a torn-down owner cannot wedge input handling.
#[derive(Clone, Debug)]
pub struct ComposerEventSender {
    tx: UnboundedSender<ComposerEvent>,
}

impl ComposerEventSender {
    pub fn new(tx: UnboundedSender<ComposerEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: ComposerEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::error!("failed to notify composer owner: {err}");
        }
    }
}
