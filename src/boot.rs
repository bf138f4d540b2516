//! Process-start glue: turns the command line into the first controller events.

use crate::app::event::AppEvent;

/// Events that start the kiosk. A `--url` override is persisted and loaded
/// in one step; otherwise the controller starts from the stored URL.
pub fn boot_events(url_override: Option<&str>) -> Vec<AppEvent> {
    match url_override.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            tracing::info!("Boot with URL override {}", url);
            vec![AppEvent::PushUrl {
                url: url.to_string(),
            }]
        }
        None => vec![AppEvent::Start],
    }
}
