use tokio::process::{Child, Command};

/// External full-screen viewer process, running only while a page is shown.
pub struct Viewer {
    command: Vec<String>,
    child: Option<Child>,
    shown_url: Option<String>,
}

impl Viewer {
    /// `command` is the program and its arguments; the URL is appended.
    /// An empty command disables the viewer.
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            child: None,
            shown_url: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.command.is_empty()
    }

    #[cfg(test)]
    pub fn shown_url(&self) -> Option<&str> {
        self.shown_url.as_deref()
    }

    pub fn show(&mut self, url: &str) {
        if !self.is_enabled() || self.shown_url.as_deref() == Some(url) {
            return;
        }
        self.hide();

        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..])
            .arg(url)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);

        match cmd.spawn() {
            Ok(child) => {
                tracing::info!("Viewer started for {}", url);
                self.child = Some(child);
                self.shown_url = Some(url.to_string());
            }
            Err(e) => {
                tracing::warn!("Failed to start viewer '{}': {}", self.command[0], e);
            }
        }
    }

    pub fn hide(&mut self) {
        self.shown_url = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                tracing::warn!("Failed to stop viewer: {}", e);
            }
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.hide();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_viewer_is_inert() {
        let mut v = Viewer::new(vec![]);
        v.show("http://a");
        assert!(!v.is_enabled());
        assert_eq!(v.shown_url(), None);
    }

    #[tokio::test]
    async fn test_missing_program_only_warns() {
        let mut v = Viewer::new(vec!["/nonexistent/kiosk-viewer".into()]);
        v.show("http://a");
        assert_eq!(v.shown_url(), None);
    }

    #[tokio::test]
    async fn test_show_and_hide() {
        let mut v = Viewer::new(vec!["sleep".into()]);
        // `sleep http://a` exits with an error, but spawning succeeds.
        v.show("http://a");
        assert_eq!(v.shown_url(), Some("http://a"));
        v.hide();
        assert_eq!(v.shown_url(), None);
    }
}
