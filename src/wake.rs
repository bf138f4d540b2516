use tokio::process::{Child, Command};

/// Keeps the display awake for as long as it is held.
///
/// Backed by an inhibitor process (`systemd-inhibit ... sleep infinity` by
/// default) that is killed when the lock is released or dropped. A kiosk
/// without an inhibitor still runs; the failure is only logged.
pub struct WakeLock {
    child: Option<Child>,
}

impl WakeLock {
    pub fn acquire(command: &[String]) -> Self {
        let Some((program, args)) = command.split_first() else {
            tracing::debug!("No wake lock command configured");
            return Self { child: None };
        };

        let spawned = Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn();

        match spawned {
            Ok(child) => {
                tracing::info!("Wake lock acquired ({})", program);
                Self { child: Some(child) }
            }
            Err(e) => {
                tracing::warn!("Could not acquire wake lock via '{}': {}", program, e);
                Self { child: None }
            }
        }
    }

    #[cfg(test)]
    pub fn is_held(&self) -> bool {
        self.child.is_some()
    }

    pub fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            match child.start_kill() {
                Ok(()) => tracing::info!("Wake lock released"),
                Err(e) => tracing::warn!("Failed to release wake lock: {}", e),
            }
        }
    }
}

impl Drop for WakeLock {
    fn drop(&mut self) {
        self.release();
    }
}
