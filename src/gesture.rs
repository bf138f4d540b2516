//! Hidden unlock gesture.
//!
//! Five taps in the top-right corner, each within three seconds of the
//! previous one, request the configuration prompt. There is no visible
//! control for it. Taps anywhere else are inert and leave the counter alone.

/// Maximum gap between two qualifying taps.
pub const TAP_WINDOW_MS: u64 = 3000;

/// Qualifying taps needed to request the prompt.
pub const TAPS_TO_UNLOCK: u32 = 5;

/// Fixed rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockRegion {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl UnlockRegion {
    /// Region of `width` x `height` anchored to the top-right corner of a
    /// surface `surface_width` wide.
    pub fn top_right(surface_width: u16, width: u16, height: u16) -> Self {
        let width = width.min(surface_width);
        Self {
            x: surface_width - width,
            y: 0,
            width,
            height,
        }
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x
            && u32::from(x) < u32::from(self.x) + u32::from(self.width)
            && y >= self.y
            && u32::from(y) < u32::from(self.y) + u32::from(self.height)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureTracker {
    pub tap_count: u32,
    /// `None` stands for "never", so the first tap always starts a new run.
    pub last_tap_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct GestureUnlock {
    region: UnlockRegion,
    tracker: GestureTracker,
}

impl GestureUnlock {
    pub fn new(region: UnlockRegion) -> Self {
        Self {
            region,
            tracker: GestureTracker::default(),
        }
    }

    #[cfg(test)]
    pub fn region(&self) -> UnlockRegion {
        self.region
    }

    #[cfg(test)]
    pub fn tracker(&self) -> GestureTracker {
        self.tracker
    }

    /// Re-anchor the region after the surface changed width. The tracker is
    /// kept so a resize mid-burst does not lose taps.
    pub fn resize(&mut self, surface_width: u16) {
        self.region =
            UnlockRegion::top_right(surface_width, self.region.width, self.region.height);
    }

    /// Feed one tap-down. Returns `true` when the unlock threshold is reached.
    pub fn on_tap_down(&mut self, x: u16, y: u16, now_ms: u64) -> bool {
        if !self.region.contains(x, y) {
            return false;
        }

        let stale = match self.tracker.last_tap_ms {
            Some(last) => now_ms.saturating_sub(last) > TAP_WINDOW_MS,
            None => true,
        };
        if stale {
            self.tracker.tap_count = 0;
        }

        self.tracker.tap_count += 1;
        self.tracker.last_tap_ms = Some(now_ms);
        tracing::debug!(taps = self.tracker.tap_count, "corner tap");

        if self.tracker.tap_count >= TAPS_TO_UNLOCK {
            self.tracker.tap_count = 0;
            return true;
        }
        false
    }
}
