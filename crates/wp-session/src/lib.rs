//! WavePortal session controller.
//!
//! Owns the client's only mutable state and the operations that reconcile it
//! with the wallet and the contract. Runtime-agnostic: everything external
//! goes through [`wp_chain_client::Host`].

pub mod config;
pub mod error;
pub mod session;
pub mod state;

pub use config::{DEFAULT_GAS_LIMIT, SessionConfig};
pub use error::SessionError;
pub use session::Session;
pub use state::{Notice, NoticeKind, SessionState, SubmissionState};
