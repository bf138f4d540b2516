//! Certificate trust decisions.
//!
//! Kiosks usually point at a box on the local network with a self-signed
//! certificate, so the stock policy trusts whatever it is shown. Deployments
//! that can rely on a proper CA switch to [`VerifyStrict`] in the config.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// A certificate problem reported by the render surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateIssue {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertDecision {
    Trust,
    Reject,
}

/// Decides whether a navigation may continue past a certificate error.
pub trait CertificatePolicy: Send {
    fn name(&self) -> &'static str;
    fn decide(&self, issue: &CertificateIssue) -> CertDecision;
}

/// Accept every certificate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustAll;

impl CertificatePolicy for TrustAll {
    fn name(&self) -> &'static str {
        "trust-all"
    }

    fn decide(&self, issue: &CertificateIssue) -> CertDecision {
        tracing::warn!("SSL error (accepting) for {}: {}", issue.url, issue.reason);
        CertDecision::Trust
    }
}

/// Refuse any certificate that failed verification.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerifyStrict;

impl CertificatePolicy for VerifyStrict {
    fn name(&self) -> &'static str {
        "verify-strict"
    }

    fn decide(&self, issue: &CertificateIssue) -> CertDecision {
        tracing::warn!("SSL error (rejecting) for {}: {}", issue.url, issue.reason);
        CertDecision::Reject
    }
}

/// Policy selector as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertPolicyKind {
    #[default]
    TrustAll,
    VerifyStrict,
}

impl CertPolicyKind {
    pub fn build(self) -> Box<dyn CertificatePolicy> {
        match self {
            CertPolicyKind::TrustAll => Box::new(TrustAll),
            CertPolicyKind::VerifyStrict => Box::new(VerifyStrict),
        }
    }
}

/// Return path for a certificate decision back into the waiting probe.
pub struct CertReply(oneshot::Sender<CertDecision>);

impl CertReply {
    pub fn channel() -> (Self, oneshot::Receiver<CertDecision>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    pub fn send(self, decision: CertDecision) {
        // The probe may already have been superseded.
        let _ = self.0.send(decision);
    }
}

impl std::fmt::Debug for CertReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CertReply")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue() -> CertificateIssue {
        CertificateIssue {
            url: "https://ha.lan:8123".into(),
            reason: "invalid peer certificate: UnknownIssuer".into(),
        }
    }

    #[test]
    fn test_default_policy_trusts() {
        let policy = CertPolicyKind::default().build();
        assert_eq!(policy.name(), "trust-all");
        assert_eq!(policy.decide(&issue()), CertDecision::Trust);
    }

    #[test]
    fn test_strict_policy_rejects() {
        let policy = CertPolicyKind::VerifyStrict.build();
        assert_eq!(policy.decide(&issue()), CertDecision::Reject);
    }

    #[test]
    fn test_policy_kind_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: CertPolicyKind,
        }
        let w: Wrapper = toml::from_str("policy = \"verify-strict\"").unwrap();
        assert_eq!(w.policy, CertPolicyKind::VerifyStrict);
    }

    #[tokio::test]
    async fn test_reply_reaches_receiver() {
        let (reply, rx) = CertReply::channel();
        reply.send(CertDecision::Trust);
        assert_eq!(rx.await.unwrap(), CertDecision::Trust);
    }
}
