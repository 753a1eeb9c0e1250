use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};
use wp_api_types::{Account, NewWaveEvent, TxHash, TxReceipt, Wave};
use wp_chain_client::{ChainError, Host, Subscription, WalletProvider, WavePortalContract, WaveSink};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::state::{SessionState, SubmissionState};

type Listener = Rc<dyn Fn(&SessionState)>;

/// State shared with the live-event sink.
#[derive(Default)]
struct Shared {
    state: RefCell<SessionState>,
    closed: Cell<bool>,
    listener: RefCell<Option<Listener>>,
}

impl Shared {
    /// Apply a mutation and notify the listener. Once the session is closed
    /// every update is discarded.
    fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> Option<R> {
        if self.closed.get() {
            debug!("session closed, discarding late update");
            return None;
        }
        let out = f(&mut self.state.borrow_mut());
        self.notify();
        Some(out)
    }

    fn notify(&self) {
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(&self.state.borrow());
        }
    }

    fn append_wave(&self, event: NewWaveEvent) {
        debug!(from = %event.from, timestamp = event.timestamp_secs, message = %event.message, "NewWave");
        self.update(|s| s.waves.push(Wave::from(event)));
    }
}

pub struct Session<H: Host> {
    host: H,
    config: SessionConfig,
    shared: Rc<Shared>,
    subscription: RefCell<Option<Subscription>>,
}

impl<H: Host> Session<H> {
    pub fn new(host: H, config: SessionConfig) -> Self {
        Self {
            host,
            config,
            shared: Rc::new(Shared::default()),
            subscription: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read the current state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.shared.state.borrow())
    }

    pub fn snapshot(&self) -> SessionState {
        self.with(Clone::clone)
    }

    /// Register the callback run after every state change.
    pub fn set_listener(&self, listener: impl Fn(&SessionState) + 'static) {
        *self.shared.listener.borrow_mut() = Some(Rc::new(listener));
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.get()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.borrow().is_some()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.shared.update(|s| s.draft = text);
    }

    /// Startup sequence: subscribe, then issue the three reads concurrently.
    /// None of them depends on another.
    pub async fn start(&self) {
        if let Err(err) = self.subscribe() {
            warn!(error = %err, "live wave subscription not established");
        }
        let _ = futures_util::join!(
            self.check_existing_connection(),
            self.fetch_total_count(),
            self.fetch_all_waves(),
        );
    }

    /// Adopt an already-authorized account without prompting. Failures are
    /// logged and leave the account empty.
    pub async fn check_existing_connection(&self) {
        if self.is_closed() {
            return;
        }
        let Some(provider) = self.host.provider() else {
            info!("no wallet provider found, make sure a wallet extension is installed");
            return;
        };
        debug!("wallet provider detected");

        match provider.authorized_accounts().await {
            Ok(accounts) => match accounts.into_iter().next() {
                Some(account) => {
                    info!(%account, "found an authorized account");
                    self.shared.update(|s| s.account = account);
                }
                None => info!("no authorized account found"),
            },
            Err(err) => warn!(error = %err, "failed to query authorized accounts"),
        }
    }

    /// Ask the wallet to authorize an account and adopt the first one.
    ///
    /// `ProviderUnavailable` is the only error the UI surfaces; everything
    /// else is logged here and leaves the account untouched.
    pub async fn connect_wallet(&self) -> Result<Account, SessionError> {
        self.ensure_open("connect")?;
        let Some(provider) = self.host.provider() else {
            warn!("cannot connect, no wallet provider");
            return Err(SessionError::ProviderUnavailable);
        };

        let accounts = provider.request_accounts().await.map_err(|err| {
            let err = SessionError::from(err);
            warn!(error = %err, "wallet connection failed");
            err
        })?;

        let Some(account) = accounts.into_iter().next() else {
            warn!("wallet authorized no accounts");
            return Err(SessionError::CallFailure(ChainError::NoAccount));
        };

        info!(%account, "connected");
        self.shared.update(|s| s.account = account.clone());
        Ok(account)
    }

    /// Both contract reads, concurrently.
    pub async fn refresh_waves(&self) {
        let _ = futures_util::join!(self.fetch_total_count(), self.fetch_all_waves());
    }

    /// Overwrite the cached counter. Leaves it unchanged on failure.
    pub async fn fetch_total_count(&self) -> Result<u64, SessionError> {
        let contract = self.contract("getTotalWaves")?;
        match contract.get_total_waves().await {
            Ok(count) => {
                debug!(count, "retrieved total wave count");
                self.shared.update(|s| s.total_waves = count);
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "getTotalWaves failed");
                Err(err.into())
            }
        }
    }

    /// Replace the whole wave list with the contract's. Leaves it unchanged on
    /// failure.
    pub async fn fetch_all_waves(&self) -> Result<usize, SessionError> {
        let contract = self.contract("getAllWaves")?;
        match contract.get_all_waves().await {
            Ok(raw) => {
                let waves: Vec<Wave> = raw.into_iter().map(Wave::from).collect();
                let len = waves.len();
                debug!(len, "retrieved all waves");
                self.shared.update(|s| s.waves = waves);
                Ok(len)
            }
            Err(err) => {
                warn!(error = %err, "getAllWaves failed");
                Err(err.into())
            }
        }
    }

    /// Submit the current draft as a wave.
    ///
    /// Pending is set for the whole call and cleared on every exit path. The
    /// draft is cleared only once the transaction is included. The wave list
    /// is not touched here; the contract's `NewWave` event appends it.
    pub async fn submit_wave(&self) -> Result<TxHash, SessionError> {
        self.ensure_open("wave")?;
        let message = self.with(|s| s.draft.clone());
        self.shared.update(|s| {
            s.submission = SubmissionState::Submitting;
            s.notice = None;
        });

        match self.send_and_confirm(&message).await {
            Ok(receipt) => {
                self.shared.update(|s| {
                    s.draft.clear();
                    s.submission = SubmissionState::Idle;
                });
                Ok(receipt.tx_hash)
            }
            Err(err) => {
                warn!(error = %err, "wave submission failed");
                let notice = err.notice();
                self.shared.update(|s| {
                    s.submission = SubmissionState::Idle;
                    s.notice = Some(notice);
                });
                Err(err)
            }
        }
    }

    async fn send_and_confirm(&self, message: &str) -> Result<TxReceipt, SessionError> {
        let contract = self.contract("wave")?;

        let tx_hash = contract.send_wave(message, self.config.gas_limit).await?;
        info!(%tx_hash, gas_limit = self.config.gas_limit, "mining");

        let receipt = contract.wait_for_inclusion(&tx_hash).await?;
        if !receipt.success {
            return Err(SessionError::CallFailure(ChainError::Reverted(tx_hash)));
        }
        info!(%tx_hash, block = receipt.block_number, "mined");
        Ok(receipt)
    }

    /// Start appending `NewWave` notifications. Replaces any earlier
    /// subscription.
    pub fn subscribe(&self) -> Result<(), SessionError> {
        let contract = self.contract("NewWave subscription")?;

        let weak = Rc::downgrade(&self.shared);
        let sink: WaveSink = Box::new(move |event| match weak.upgrade() {
            Some(shared) => shared.append_wave(event),
            None => debug!("session dropped, ignoring NewWave"),
        });

        let subscription = contract.subscribe_new_waves(sink)?;
        debug!("subscribed to NewWave");
        *self.subscription.borrow_mut() = Some(subscription);
        Ok(())
    }

    /// Append one live event. Same path the subscription sink takes.
    pub fn apply_new_wave(&self, event: NewWaveEvent) {
        self.shared.append_wave(event);
    }

    /// Cancel the subscription and stop accepting updates. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.closed.replace(true) {
            return;
        }
        if let Some(subscription) = self.subscription.borrow_mut().take() {
            subscription.unsubscribe();
        }
        info!("session shut down");
    }

    fn ensure_open(&self, operation: &str) -> Result<(), SessionError> {
        if self.is_closed() {
            debug!(operation, "session closed");
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    fn contract(&self, operation: &str) -> Result<H::Contract, SessionError> {
        self.ensure_open(operation)?;
        match self.host.provider() {
            Some(provider) => Ok(self.host.contract(&provider)),
            None => {
                info!(operation, "ethereum provider doesn't exist");
                Err(SessionError::ProviderUnavailable)
            }
        }
    }
}
