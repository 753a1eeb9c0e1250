//! Session state and the read-only queries the UI renders from.

use wp_api_types::{Account, Wave};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    ProviderUnavailable,
    CallFailure,
    StuckPending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Everything the client knows. Created empty, filled by contract reads,
/// never persisted.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    /// Empty until a wallet is connected.
    pub account: Account,
    /// Mirror of the contract counter; not tied to `waves.len()`.
    pub total_waves: u64,
    /// Contract emission order. Live events are appended as delivered.
    pub waves: Vec<Wave>,
    pub draft: String,
    pub submission: SubmissionState,
    /// Last submission failure, cleared when the next one starts.
    pub notice: Option<Notice>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        !self.account.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.submission == SubmissionState::Submitting
    }

    /// The submit control is only offered for a non-empty draft.
    pub fn can_submit(&self) -> bool {
        !self.draft.is_empty()
    }

    pub fn show_connect_button(&self) -> bool {
        !self.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_requires_non_empty_draft() {
        let mut state = SessionState::default();
        assert!(!state.can_submit());

        state.draft = "x".to_owned();
        assert!(state.can_submit());

        state.draft.clear();
        assert!(!state.can_submit());
    }

    #[test]
    fn connect_button_follows_account() {
        let mut state = SessionState::default();
        assert!(state.show_connect_button());
        assert!(!state.is_connected());

        state.account = Account::new("0xABC");
        assert!(!state.show_connect_button());
        assert!(state.is_connected());
    }

    #[test]
    fn pending_follows_submission_state() {
        let mut state = SessionState::default();
        assert!(!state.is_pending());

        state.submission = SubmissionState::Submitting;
        assert!(state.is_pending());

        state.submission = SubmissionState::Idle;
        assert!(!state.is_pending());
    }
}
