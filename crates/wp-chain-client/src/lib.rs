use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use wp_abi::AbiError;
use wp_api_types::{Account, NewWaveEvent, RawWave, TxHash, TxReceipt};

/// EIP-1193 error code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("no wallet provider in this environment")]
    ProviderUnavailable,
    #[error("user rejected the request: {0}")]
    UserRejected(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error(transparent)]
    Abi(#[from] AbiError),
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("wallet has no account to sign with")]
    NoAccount,
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    #[error("transaction {0} was not confirmed in time")]
    InclusionTimeout(TxHash),
}

impl ChainError {
    /// Classify a provider error object by its EIP-1193 code.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == USER_REJECTED_CODE {
            ChainError::UserRejected(message)
        } else {
            ChainError::Rpc { code, message }
        }
    }
}

pub type ChainResult<T> = Result<T, ChainError>;

/// Injected wallet: account custody and authorization.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Prompts the user; the first returned account is the one to adopt.
    async fn request_accounts(&self) -> ChainResult<Vec<Account>>;
    /// Accounts the user already authorized. Never prompts.
    async fn authorized_accounts(&self) -> ChainResult<Vec<Account>>;
}

/// Callback invoked once per delivered `NewWave` notification.
pub type WaveSink = Box<dyn FnMut(NewWaveEvent)>;

/// The deployed WavePortal contract, reached through a provider.
#[async_trait(?Send)]
pub trait WavePortalContract {
    /// First phase of a wave: the node acknowledged the transaction.
    async fn send_wave(&self, message: &str, gas_limit: u64) -> ChainResult<TxHash>;
    /// Second phase: resolves once the transaction is included. A reverted
    /// transaction is an error.
    async fn wait_for_inclusion(&self, tx_hash: &TxHash) -> ChainResult<TxReceipt>;
    async fn get_all_waves(&self) -> ChainResult<Vec<RawWave>>;
    async fn get_total_waves(&self) -> ChainResult<u64>;
    fn subscribe_new_waves(&self, sink: WaveSink) -> ChainResult<Subscription>;
}

/// The environment the client runs in.
///
/// The provider is looked up again on every call; contract handles are built
/// per operation and never cached.
pub trait Host {
    type Provider: WalletProvider;
    type Contract: WavePortalContract;

    fn provider(&self) -> Option<Self::Provider>;
    fn contract(&self, provider: &Self::Provider) -> Self::Contract;
}

/// Live subscription handle. Cancels the underlying stream exactly once,
/// either through [`Subscription::unsubscribe`] or on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting() -> (Rc<Cell<u32>>, Subscription) {
        let calls = Rc::new(Cell::new(0));
        let sub = {
            let calls = Rc::clone(&calls);
            Subscription::new(move || calls.set(calls.get() + 1))
        };
        (calls, sub)
    }

    #[test]
    fn drop_cancels_once() {
        let (calls, sub) = counting();
        assert!(sub.is_active());
        drop(sub);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unsubscribe_does_not_cancel_twice() {
        let (calls, sub) = counting();
        sub.unsubscribe();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn rpc_code_4001_is_user_rejection() {
        assert!(matches!(
            ChainError::from_rpc(4001, "User denied account authorization"),
            ChainError::UserRejected(_)
        ));
        assert!(matches!(
            ChainError::from_rpc(-32603, "Internal JSON-RPC error"),
            ChainError::Rpc { code: -32603, .. }
        ));
    }
}
