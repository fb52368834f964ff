//! Follow-mode states, events and the status snapshot.

use std::fmt;

use crate::geo::PositionFix;

/// Who owns the camera right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowState {
    /// No live fix yet. The camera shows a default or restored position.
    #[default]
    Idle,

    /// Fixes are arriving but the user owns the viewport (free browse).
    Previewing,

    /// The camera tracks the latest fix with the nav-look applied.
    Following,

    /// A touch interrupted `Following`; control returns after a quiet period.
    FollowingPausedByUser,
}

impl FollowState {
    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            FollowState::Idle => "waiting for first fix",
            FollowState::Previewing => "free browse",
            FollowState::Following => "following position",
            FollowState::FollowingPausedByUser => "paused by user",
        }
    }

    /// Whether the program currently drives the camera.
    pub fn is_auto_follow(&self) -> bool {
        matches!(self, FollowState::Following)
    }
}

impl fmt::Display for FollowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FollowState::Idle => write!(f, "idle"),
            FollowState::Previewing => write!(f, "previewing"),
            FollowState::Following => write!(f, "following"),
            FollowState::FollowingPausedByUser => write!(f, "paused"),
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum FollowEvent {
    /// A new fix from the location feed.
    FixReceived(PositionFix),

    /// A touch or drag on the map surface.
    UserTouchDetected,

    /// Business layer started (`true`) or ended (`false`) navigation.
    FollowRequested(bool),

    /// The pause quiet period elapsed.
    ResumeTimerFired,
}

impl FollowEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            FollowEvent::FixReceived(_) => "fix",
            FollowEvent::UserTouchDetected => "touch",
            FollowEvent::FollowRequested(true) => "follow_on",
            FollowEvent::FollowRequested(false) => "follow_off",
            FollowEvent::ResumeTimerFired => "resume_timer",
        }
    }
}

/// Point-in-time view of the controller for status indicators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FollowStatus {
    pub state: FollowState,
    /// Follow was requested before any fix arrived.
    pub pending_follow: bool,
    /// A resume timer is armed.
    pub resume_pending: bool,
    /// Most recent valid fix.
    pub last_fix: Option<PositionFix>,
    /// The controller has been torn down.
    pub torn_down: bool,
}

impl FollowStatus {
    /// Whether any live fix has been received.
    pub fn has_fix(&self) -> bool {
        self.last_fix.is_some()
    }
}
