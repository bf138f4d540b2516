//! One-shot, cancellable retry timer.
//!
//! Arming a new retry aborts the previous task, so at most one timer task is
//! ever alive. A fire that was already queued before a cancel still carries
//! its token and is discarded by the controller.

use crate::app::event::{AppEvent, RetryToken};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct RetryTimer {
    pending: Option<(RetryToken, JoinHandle<()>)>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl RetryTimer {
    pub fn new(event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            pending: None,
            event_tx,
        }
    }

    pub fn arm(&mut self, token: RetryToken, delay: Duration) {
        self.cancel_all();
        let tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AppEvent::RetryFired { token });
        });
        tracing::debug!(token, delay_ms = delay.as_millis() as u64, "retry armed");
        self.pending = Some((token, handle));
    }

    pub fn cancel(&mut self, token: RetryToken) {
        if matches!(self.pending, Some((pending, _)) if pending == token) {
            self.cancel_all();
        }
    }

    pub fn cancel_all(&mut self) {
        if let Some((token, handle)) = self.pending.take() {
            handle.abort();
            tracing::debug!(token, "retry cancelled");
        }
    }

    #[cfg(test)]
    /// Token of the timer that has not fired yet, if any.
    pub fn pending(&self) -> Option<RetryToken> {
        self.pending
            .as_ref()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(token, _)| *token)
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
