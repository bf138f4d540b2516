use crate::app::event::{AttemptId, RetryToken};
use crate::gesture::GestureUnlock;
use crate::net::ConnectivityGate;
use crate::store::UrlStore;
use crate::surface::policy::CertificatePolicy;
use chrono::Local;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Idle,
    Loading,
    Displayed,
    LoadError,
    NetworkUnavailable,
}

impl DisplayState {
    pub fn label(self) -> &'static str {
        match self {
            DisplayState::Idle => "IDLE",
            DisplayState::Loading => "LOADING",
            DisplayState::Displayed => "DISPLAYED",
            DisplayState::LoadError => "LOAD ERROR",
            DisplayState::NetworkUnavailable => "NO NETWORK",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, DisplayState::LoadError | DisplayState::NetworkUnavailable)
    }
}

/// Full-screen status text shown instead of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub title: String,
    pub message: String,
}

impl Overlay {
    pub fn no_network(retry_in: Duration) -> Self {
        Self {
            title: "No Network".to_string(),
            message: format!(
                "Waiting for network connection...\n\nRetrying in {} seconds...",
                retry_in.as_secs()
            ),
        }
    }

    pub fn load_error(description: &str, retry_in: Duration) -> Self {
        Self {
            title: "Connection Error".to_string(),
            message: format!(
                "Could not load page.\n{}\n\nRetrying in {} seconds...",
                description,
                retry_in.as_secs()
            ),
        }
    }
}

/// The page currently on the render surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub url: String,
    pub status: Option<u16>,
    pub loaded_at: String,
}

/// Single-line editor behind the configuration prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptState {
    pub text: String,
    pub cursor: usize,
}

impl PromptState {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            let prev = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.text.len() {
            let next = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
            self.text.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.text.len() {
            self.cursor = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Terminal columns occupied by the text left of the cursor.
    pub fn cursor_column(&self) -> usize {
        self.text[..self.cursor].width()
    }

    /// The accepted value, if it is non-empty after trimming.
    pub fn value(&self) -> Option<String> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

pub struct KioskState {
    pub display: DisplayState,
    pub overlay: Option<Overlay>,
    pub page: Option<PageInfo>,
    pub prompt: Option<PromptState>,
    pub gesture: GestureUnlock,
    /// URL of the most recent load attempt.
    pub current_url: String,
    /// Navigation whose events are honored; everything else is stale.
    pub current_attempt: Option<AttemptId>,
    /// Set once the current navigation reported a top-level error.
    pub errored_attempt: Option<AttemptId>,
    pub pending_retry: Option<RetryToken>,
    pub retry_delay: Duration,
    pub torn_down: bool,
    pub dirty: bool,
    pub store: UrlStore,
    pub gate: ConnectivityGate,
    pub cert_policy: Box<dyn CertificatePolicy>,
    next_attempt: AttemptId,
    next_retry_token: RetryToken,
}

impl KioskState {
    pub fn new(
        store: UrlStore,
        gate: ConnectivityGate,
        cert_policy: Box<dyn CertificatePolicy>,
        gesture: GestureUnlock,
    ) -> Self {
        let current_url = store.get();
        Self {
            display: DisplayState::Idle,
            overlay: None,
            page: None,
            prompt: None,
            gesture,
            current_url,
            current_attempt: None,
            errored_attempt: None,
            pending_retry: None,
            retry_delay: crate::app::handler::RETRY_DELAY,
            torn_down: false,
            dirty: true,
            store,
            gate,
            cert_policy,
            next_attempt: 1,
            next_retry_token: 1,
        }
    }

    pub fn allocate_attempt_id(&mut self) -> AttemptId {
        let id = self.next_attempt;
        self.next_attempt += 1;
        id
    }

    pub fn allocate_retry_token(&mut self) -> RetryToken {
        let token = self.next_retry_token;
        self.next_retry_token += 1;
        token
    }

    pub fn set_display(&mut self, next: DisplayState) {
        if self.display != next {
            tracing::info!("{} -> {}", self.display.label(), next.label());
        }
        self.display = next;
        self.dirty = true;
    }

    pub fn mark_page_loaded(&mut self, url: String, status: Option<u16>) {
        self.page = Some(PageInfo {
            url,
            status,
            loaded_at: Local::now().format("%H:%M:%S").to_string(),
        });
    }

    pub fn status_line(&self) -> String {
        let mut s = format!("{} | {}", self.display.label(), self.current_url);
        if let Some(ref page) = self.page {
            if self.display == DisplayState::Displayed {
                s.push_str(&format!(" | loaded {}", page.loaded_at));
            }
        }
        if self.pending_retry.is_some() {
            s.push_str(&format!(" | retry in {}s", self.retry_delay.as_secs()));
        }
        s
    }
}
