use crate::app::event::{AttemptId, RetryToken};
use crate::surface::policy::{CertDecision, CertReply};
use std::time::Duration;

/// Side effects requested by the controller, executed by the runtime.
#[derive(Debug)]
pub enum Action {
    Load { url: String, attempt: AttemptId },
    SetSurfaceVisible(bool),
    ArmRetry { token: RetryToken, delay: Duration },
    CancelRetry { token: RetryToken },
    GoBack,
    ResolveCertificate { reply: CertReply, decision: CertDecision },
    ReleaseSurface,
}
