//! Configuration for the follow-mode controller.
//!
//! # Example Configuration (INI)
//!
//! ```ini
//! [follow]
//! resume_delay_ms = 5000
//! nav_zoom = 17
//! nav_tilt = 45
//! locate_zoom = 15
//! first_fix_zoom = 15
//! ```

use std::time::Duration;

use super::timer::DEFAULT_RESUME_DELAY;

/// Default zoom while following.
pub const DEFAULT_NAV_ZOOM: f32 = 17.0;

/// Default camera tilt for the nav-look (degrees).
pub const DEFAULT_NAV_TILT: f32 = 45.0;

/// Tilt restored when leaving the nav-look.
pub const BROWSE_TILT: f32 = 0.0;

/// Default zoom for "locate me".
pub const DEFAULT_LOCATE_ZOOM: f32 = 15.0;

/// Default zoom for the first-fix cut and cold-start restore.
pub const DEFAULT_FIRST_FIX_ZOOM: f32 = 15.0;

/// Follow-mode tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowConfig {
    /// Quiet period after the last touch before follow resumes.
    pub resume_delay: Duration,

    /// Zoom applied when entering follow.
    pub nav_zoom: f32,

    /// Tilt applied when entering and while following.
    ///
    /// Range: 0 - 60
    pub nav_tilt: f32,

    /// Zoom used by `locate_me`.
    pub locate_zoom: f32,

    /// Zoom for the first fix and the cold-start restore.
    pub first_fix_zoom: f32,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            resume_delay: DEFAULT_RESUME_DELAY,
            nav_zoom: DEFAULT_NAV_ZOOM,
            nav_tilt: DEFAULT_NAV_TILT,
            locate_zoom: DEFAULT_LOCATE_ZOOM,
            first_fix_zoom: DEFAULT_FIRST_FIX_ZOOM,
        }
    }
}

impl FollowConfig {
    /// Set the resume quiet period.
    pub fn with_resume_delay(mut self, delay: Duration) -> Self {
        self.resume_delay = delay;
        self
    }

    /// Set the nav-look zoom and tilt.
    pub fn with_nav_look(mut self, zoom: f32, tilt: f32) -> Self {
        self.nav_zoom = zoom;
        self.nav_tilt = tilt;
        self
    }
}
