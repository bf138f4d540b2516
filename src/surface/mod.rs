//! Render surface: the component that fetches the kiosk page and reports
//! navigation events back to the controller.

pub mod policy;
pub mod probe;
pub mod tls;
pub mod viewer;

use crate::app::event::{AppEvent, AttemptId};
use probe::ProbeSettings;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use viewer::Viewer;

/// Calls the controller makes on the render surface. Results come back as
/// [`AppEvent`]s on the event channel.
pub trait RenderSurface {
    /// Start a top-level navigation. Events it produces carry `attempt`.
    fn load(&mut self, url: &str, attempt: AttemptId);
    /// Navigate one step back in the surface history, if there is one.
    /// History survives a URL change, so back may reach a URL that is no
    /// longer the stored one. The next retry or reload returns to the stored
    /// URL.
    fn go_back_if_possible(&mut self) -> bool;
    fn set_visible(&mut self, visible: bool);
    fn release(&mut self);
}

/// Surface backed by the HTTP(S) probe and an optional viewer process.
pub struct ProbeSurface {
    settings: Arc<ProbeSettings>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    in_flight: Option<JoinHandle<()>>,
    history: Vec<String>,
    current: Option<(AttemptId, String)>,
    visible: bool,
    viewer: Viewer,
}

impl ProbeSurface {
    pub fn new(
        settings: ProbeSettings,
        viewer: Viewer,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            event_tx,
            in_flight: None,
            history: Vec::new(),
            current: None,
            visible: false,
            viewer,
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn navigate(&mut self, url: String, attempt: AttemptId) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.current = Some((attempt, url.clone()));
        let settings = self.settings.clone();
        let tx = self.event_tx.clone();
        self.in_flight = Some(tokio::spawn(probe::navigate(attempt, url, settings, tx)));
    }

    fn sync_viewer(&mut self) {
        match (&self.current, self.visible) {
            (Some((_, url)), true) => {
                let url = url.clone();
                self.viewer.show(&url);
            }
            _ => self.viewer.hide(),
        }
    }
}

impl RenderSurface for ProbeSurface {
    fn load(&mut self, url: &str, attempt: AttemptId) {
        if self.history.last().map(String::as_str) != Some(url) {
            self.history.push(url.to_string());
        }
        self.navigate(url.to_string(), attempt);
    }

    fn go_back_if_possible(&mut self) -> bool {
        let Some((attempt, _)) = self.current else {
            return false;
        };
        if self.history.len() < 2 {
            return false;
        }
        self.history.pop();
        let Some(previous) = self.history.last().cloned() else {
            return false;
        };
        tracing::info!("Going back to {}", previous);
        // Back stays within the current navigation session.
        self.navigate(previous, attempt);
        true
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.sync_viewer();
    }

    fn release(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.current = None;
        self.visible = false;
        self.viewer.hide();
        tracing::debug!("Render surface released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn surface() -> (ProbeSurface, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = ProbeSettings {
            timeout: Duration::from_millis(500),
            user_agent: "test KioskBrowser/1.0".into(),
            ca_bundle: PathBuf::from("/nonexistent/ca.pem"),
        };
        (ProbeSurface::new(settings, Viewer::new(vec![]), tx), rx)
    }

    #[tokio::test]
    async fn test_load_reports_started_with_attempt() {
        let (mut s, mut rx) = surface();
        s.load("http://127.0.0.1:1/", 3);
        let ev = rx.recv().await.unwrap();
        assert!(matches!(ev, AppEvent::PageStarted { attempt: 3, .. }));
        assert_eq!(s.history(), ["http://127.0.0.1:1/".to_string()]);
    }

    #[tokio::test]
    async fn test_reloading_same_url_does_not_grow_history() {
        let (mut s, _rx) = surface();
        s.load("http://a.invalid/", 1);
        s.load("http://a.invalid/", 2);
        assert_eq!(s.history().len(), 1);
        assert!(!s.go_back_if_possible());
    }

    #[tokio::test]
    async fn test_back_reloads_previous_under_current_attempt() {
        let (mut s, mut rx) = surface();
        s.load("http://127.0.0.1:1/first", 1);
        s.load("http://127.0.0.1:1/second", 2);
        assert!(s.go_back_if_possible());
        assert_eq!(s.history(), ["http://127.0.0.1:1/first".to_string()]);

        // Earlier tasks may have reported before they were aborted.
        loop {
            if let AppEvent::PageStarted { attempt: 2, url } = rx.recv().await.unwrap() {
                if url.ends_with("/first") {
                    break;
                }
            }
        }
        assert!(!s.go_back_if_possible());
    }

    #[tokio::test]
    async fn test_back_reaches_url_replaced_by_push() {
        let (mut s, _rx) = surface();
        s.load("http://old-panel.invalid/", 1);
        // A pushed URL becomes the stored one and loads under a new attempt.
        s.load("http://new-panel.invalid/", 2);
        assert!(s.go_back_if_possible());
        assert_eq!(s.history(), ["http://old-panel.invalid/".to_string()]);

        // Loading the stored URL again puts it back on top.
        s.load("http://new-panel.invalid/", 3);
        assert_eq!(
            s.history(),
            [
                "http://old-panel.invalid/".to_string(),
                "http://new-panel.invalid/".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_release_drops_navigation() {
        let (mut s, _rx) = surface();
        s.load("http://a.invalid/", 1);
        s.set_visible(true);
        assert!(s.is_visible());
        s.release();
        assert!(!s.is_visible());
        assert!(!s.go_back_if_possible());
    }
}
