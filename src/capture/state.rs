//! Capture lifecycle state machine.
//!
//! ```text
//! Idle ──Start──▶ RequestingPermission ──PermissionGranted──▶ Listening
//!                        │                                     │    │
//!                     Failure                               Stop  Failure
//!                        ▼                                     ▼    ▼
//!                      Error ◀──────────Failure────────── Stopping  Error
//!                                                              │
//! Error ──Start──▶ RequestingPermission                     Stopped
//!                                                              ▼
//!                                                             Idle
//! ```
//!
//! [`CaptureState::next`] is pure: events that make no sense in the current
//! state leave it unchanged.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Idle,
    RequestingPermission,
    Listening,
    Stopping,
    /// A capture or recognition failure.  Recoverable through `Start`.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    Start,
    PermissionGranted,
    Stop,
    Stopped,
    Failure,
}

impl CaptureState {
    pub fn next(self, event: CaptureEvent) -> Self {
        use CaptureEvent as E;
        use CaptureState as S;

        match (self, event) {
            (S::Idle | S::Error, E::Start) => S::RequestingPermission,
            (S::RequestingPermission, E::PermissionGranted) => S::Listening,
            (S::RequestingPermission, E::Stop) => S::Idle,
            (S::Listening, E::Stop) => S::Stopping,
            (S::Stopping, E::Stopped) => S::Idle,
            (S::RequestingPermission | S::Listening | S::Stopping, E::Failure) => S::Error,
            (state, _) => state,
        }
    }

    /// `true` while audio resources may be held.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CaptureState::RequestingPermission | CaptureState::Listening | CaptureState::Stopping
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            CaptureState::Idle => "Idle",
            CaptureState::RequestingPermission => "Requesting permission",
            CaptureState::Listening => "Listening",
            CaptureState::Stopping => "Stopping",
            CaptureState::Error => "Error",
        }
    }
}
