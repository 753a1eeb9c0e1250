use thiserror::Error;
use wp_api_types::TxHash;
use wp_chain_client::ChainError;

use crate::state::{Notice, NoticeKind};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no wallet provider detected")]
    ProviderUnavailable,
    #[error("wallet authorization rejected: {0}")]
    UserRejected(String),
    #[error("contract call failed: {0}")]
    CallFailure(#[source] ChainError),
    #[error("transaction {0} is still unconfirmed")]
    StuckPending(TxHash),
    #[error("session is shut down")]
    Closed,
}

impl From<ChainError> for SessionError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::ProviderUnavailable => SessionError::ProviderUnavailable,
            ChainError::UserRejected(message) => SessionError::UserRejected(message),
            ChainError::InclusionTimeout(tx_hash) => SessionError::StuckPending(tx_hash),
            other => SessionError::CallFailure(other),
        }
    }
}

impl SessionError {
    /// What the UI shows for a failed submission.
    pub fn notice(&self) -> Notice {
        let kind = match self {
            SessionError::ProviderUnavailable => NoticeKind::ProviderUnavailable,
            SessionError::StuckPending(_) => NoticeKind::StuckPending,
            SessionError::UserRejected(_) | SessionError::CallFailure(_) | SessionError::Closed => {
                NoticeKind::CallFailure
            }
        };
        Notice {
            kind,
            message: self.to_string(),
        }
    }
}
