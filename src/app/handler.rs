//! Kiosk state machine.
//!
//! `handle_event` is the only way state changes. It never performs I/O on
//! the render surface or the timer itself; it returns the [`Action`]s the
//! runtime has to carry out. Store and gate are consulted synchronously.

use crate::app::action::Action;
use crate::app::event::{AppEvent, AttemptId, RetryToken};
use crate::app::state::*;
use crate::surface::policy::{CertDecision, CertReply, CertificateIssue};
use crossterm::event::{
    Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// Fixed delay between a failure and the next load attempt.
pub const RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Result of the configuration prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Accepted(String),
    Cancelled,
}

pub fn handle_event(state: &mut KioskState, event: AppEvent) -> Vec<Action> {
    if state.torn_down {
        tracing::debug!("Ignoring {:?} after teardown", event);
        return vec![];
    }

    match event {
        AppEvent::Start => start(state),
        AppEvent::PushUrl { url } => push_url(state, &url),
        AppEvent::Reload => {
            tracing::info!("Reload requested");
            load_attempt(state)
        }
        AppEvent::PageStarted { attempt, url } => {
            on_page_started(state, attempt, &url);
            vec![]
        }
        AppEvent::PageFinished {
            attempt,
            url,
            status,
        } => on_page_finished(state, attempt, url, status),
        AppEvent::LoadError {
            attempt,
            description,
            main_frame,
        } => on_load_error(state, attempt, &description, main_frame),
        AppEvent::CertificateError {
            attempt,
            issue,
            reply,
        } => on_certificate_error(state, attempt, issue, reply),
        AppEvent::RetryFired { token } => on_retry_fire(state, token),
        AppEvent::Input { event, at_ms } => handle_terminal(state, event, at_ms),
        AppEvent::Teardown => teardown(state),
    }
}

fn start(state: &mut KioskState) -> Vec<Action> {
    if state.display == DisplayState::Loading {
        tracing::debug!("start() while already loading, ignored");
        return vec![];
    }
    tracing::info!("Kiosk starting");
    load_attempt(state)
}

/// Check the network, then hand the configured URL to the render surface.
fn load_attempt(state: &mut KioskState) -> Vec<Action> {
    let mut actions = cancel_retry(state);

    let url = state.store.get();
    state.current_url = url.clone();
    tracing::info!("Loading URL: {}", url);

    if !state.gate.is_reachable() {
        tracing::warn!("No viable network, retrying in {}s", state.retry_delay.as_secs());
        state.current_attempt = None;
        state.errored_attempt = None;
        state.set_display(DisplayState::NetworkUnavailable);
        state.overlay = Some(Overlay::no_network(state.retry_delay));
        actions.push(Action::SetSurfaceVisible(false));
        actions.extend(arm_retry(state));
        return actions;
    }

    let attempt = state.allocate_attempt_id();
    state.current_attempt = Some(attempt);
    state.errored_attempt = None;
    state.set_display(DisplayState::Loading);
    actions.push(Action::Load { url, attempt });
    actions
}

fn push_url(state: &mut KioskState, url: &str) -> Vec<Action> {
    let url = url.trim();
    if url.is_empty() {
        tracing::warn!("Ignoring empty URL override");
        return vec![];
    }
    if let Err(e) = state.store.set(url) {
        // The store keeps the value in memory; only durability is lost.
        tracing::warn!("URL not persisted: {}", e);
    }
    tracing::info!("URL saved: {}", url);
    load_attempt(state)
}

fn is_current(state: &KioskState, attempt: AttemptId) -> bool {
    if state.current_attempt == Some(attempt) {
        return true;
    }
    tracing::debug!(
        attempt,
        current = ?state.current_attempt,
        "stale surface event ignored"
    );
    false
}

fn on_page_started(state: &mut KioskState, attempt: AttemptId, url: &str) {
    if !is_current(state, attempt) {
        return;
    }
    if state.display == DisplayState::LoadError {
        tracing::debug!("Page started after the navigation failed, ignored");
        return;
    }
    tracing::debug!("Page started: {}", url);
    state.errored_attempt = None;
}

fn on_page_finished(
    state: &mut KioskState,
    attempt: AttemptId,
    url: String,
    status: Option<u16>,
) -> Vec<Action> {
    if !is_current(state, attempt) {
        return vec![];
    }
    if state.errored_attempt == Some(attempt) {
        tracing::debug!("Page finished after an error for attempt {}, ignored", attempt);
        return vec![];
    }
    tracing::info!("Page loaded: {}", url);
    state.mark_page_loaded(url, status);
    state.overlay = None;
    state.set_display(DisplayState::Displayed);
    vec![Action::SetSurfaceVisible(true)]
}

fn on_load_error(
    state: &mut KioskState,
    attempt: AttemptId,
    description: &str,
    main_frame: bool,
) -> Vec<Action> {
    if !main_frame {
        tracing::debug!("Sub-resource error ignored: {}", description);
        return vec![];
    }
    if !is_current(state, attempt) {
        return vec![];
    }
    tracing::error!("Load error: {}", description);
    state.errored_attempt = Some(attempt);
    state.set_display(DisplayState::LoadError);
    state.overlay = Some(Overlay::load_error(description, state.retry_delay));

    let mut actions = vec![Action::SetSurfaceVisible(false)];
    actions.extend(arm_retry(state));
    actions
}

fn on_certificate_error(
    state: &mut KioskState,
    attempt: AttemptId,
    issue: CertificateIssue,
    reply: CertReply,
) -> Vec<Action> {
    let decision = if state.current_attempt == Some(attempt) {
        state.cert_policy.decide(&issue)
    } else {
        tracing::debug!("Certificate error for superseded attempt {}", attempt);
        CertDecision::Reject
    };
    vec![Action::ResolveCertificate { reply, decision }]
}

fn on_retry_fire(state: &mut KioskState, token: RetryToken) -> Vec<Action> {
    if state.pending_retry != Some(token) {
        tracing::debug!(token, "retry timer superseded, ignored");
        return vec![];
    }
    state.pending_retry = None;
    load_attempt(state)
}

fn arm_retry(state: &mut KioskState) -> Vec<Action> {
    let mut actions = cancel_retry(state);
    let token = state.allocate_retry_token();
    state.pending_retry = Some(token);
    actions.push(Action::ArmRetry {
        token,
        delay: state.retry_delay,
    });
    actions
}

fn cancel_retry(state: &mut KioskState) -> Vec<Action> {
    match state.pending_retry.take() {
        Some(token) => vec![Action::CancelRetry { token }],
        None => vec![],
    }
}

fn teardown(state: &mut KioskState) -> Vec<Action> {
    tracing::info!("Kiosk teardown");
    let mut actions = cancel_retry(state);
    actions.push(Action::ReleaseSurface);
    state.current_attempt = None;
    state.prompt = None;
    state.set_display(DisplayState::Idle);
    state.torn_down = true;
    actions
}

fn handle_terminal(state: &mut KioskState, event: CEvent, at_ms: u64) -> Vec<Action> {
    match event {
        CEvent::Key(key) if key.kind == KeyEventKind::Press => {
            state.dirty = true;
            handle_key(state, key)
        }
        CEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(_),
            column,
            row,
            ..
        }) => {
            on_tap_down(state, column, row, at_ms);
            vec![]
        }
        CEvent::Resize(width, _) => {
            state.gesture.resize(width);
            state.dirty = true;
            vec![]
        }
        _ => vec![],
    }
}

fn on_tap_down(state: &mut KioskState, x: u16, y: u16, at_ms: u64) {
    if state.gesture.on_tap_down(x, y, at_ms) {
        open_prompt(state);
    }
}

fn open_prompt(state: &mut KioskState) {
    if state.prompt.is_some() {
        return;
    }
    tracing::info!("Settings unlocked");
    state.prompt = Some(PromptState::with_text(&state.store.get()));
    state.dirty = true;
}

fn handle_key(state: &mut KioskState, key: KeyEvent) -> Vec<Action> {
    if state.prompt.is_some() {
        return match handle_prompt_key(state, key) {
            Some(outcome) => {
                state.prompt = None;
                on_prompt_closed(state, outcome)
            }
            None => vec![],
        };
    }

    match key.code {
        KeyCode::Esc | KeyCode::Backspace => request_back(),
        KeyCode::Left if key.modifiers.contains(KeyModifiers::ALT) => request_back(),
        _ => vec![],
    }
}

fn handle_prompt_key(state: &mut KioskState, key: KeyEvent) -> Option<PromptOutcome> {
    let prompt = state.prompt.as_mut()?;
    match key.code {
        KeyCode::Enter => return prompt.value().map(PromptOutcome::Accepted),
        KeyCode::Esc => return Some(PromptOutcome::Cancelled),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => prompt.clear(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.insert_char(c)
        }
        KeyCode::Backspace => prompt.delete_back(),
        KeyCode::Delete => prompt.delete_forward(),
        KeyCode::Left => prompt.move_left(),
        KeyCode::Right => prompt.move_right(),
        KeyCode::Home => prompt.move_home(),
        KeyCode::End => prompt.move_end(),
        _ => {}
    }
    None
}

fn on_prompt_closed(state: &mut KioskState, outcome: PromptOutcome) -> Vec<Action> {
    match outcome {
        PromptOutcome::Accepted(url) => push_url(state, &url),
        PromptOutcome::Cancelled => {
            tracing::info!("Settings cancelled");
            vec![]
        }
    }
}

fn request_back() -> Vec<Action> {
    vec![Action::GoBack]
}
