use crate::error::SessionError;
use serde::{Deserialize, Serialize};

/// Which view the widget is showing. Window visibility is tracked separately
/// and combines freely with any state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewState {
    /// Pre-chat form disabled, waiting for the window to be opened.
    Idle,
    AwaitingPrechat,
    Connecting,
    Active,
    Ended,
}

impl ViewState {
    pub fn can_transition_to(self, target: Self) -> bool {
        use ViewState::{Active, AwaitingPrechat, Connecting, Ended, Idle};
        matches!(
            (self, target),
            (Idle | AwaitingPrechat, Connecting)
                | (Connecting, Active | AwaitingPrechat | Idle)
                | (Active, Ended)
                | (Ended, AwaitingPrechat | Idle)
        )
    }

    pub fn valid_transitions(self) -> Vec<Self> {
        use ViewState::{Active, AwaitingPrechat, Connecting, Ended, Idle};
        match self {
            Idle | AwaitingPrechat => vec![Connecting],
            Connecting => vec![Active, AwaitingPrechat, Idle],
            Active => vec![Ended],
            Ended => vec![AwaitingPrechat, Idle],
        }
    }

    /// Outbound text, control activations and uploads are only accepted here.
    pub fn accepts_outbound(self) -> bool {
        self == Self::Active
    }

    pub fn transition(self, target: Self) -> Result<Self, SessionError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(SessionError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}
