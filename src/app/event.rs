use crate::surface::policy::{CertReply, CertificateIssue};
use crossterm::event::Event as CrosstermEvent;

/// Navigation id handed to the render surface with every load.
pub type AttemptId = u64;
/// Identifies one armed retry timer.
pub type RetryToken = u64;

#[derive(Debug)]
pub enum AppEvent {
    /// Boot trigger
    Start,

    /// Out-of-band URL override or accepted configuration prompt
    PushUrl { url: String },

    /// Explicit restart from the control channel
    Reload,

    /// Render surface events, tagged with the attempt they belong to
    PageStarted { attempt: AttemptId, url: String },
    PageFinished {
        attempt: AttemptId,
        url: String,
        status: Option<u16>,
    },
    LoadError {
        attempt: AttemptId,
        description: String,
        main_frame: bool,
    },
    CertificateError {
        attempt: AttemptId,
        issue: CertificateIssue,
        reply: CertReply,
    },

    /// Retry timer elapsed
    RetryFired { token: RetryToken },

    /// Terminal input, stamped with monotonic milliseconds
    Input { event: CrosstermEvent, at_ms: u64 },

    /// Process is shutting down
    Teardown,
}
