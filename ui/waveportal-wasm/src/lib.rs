//! WavePortal WASM Frontend
//!
//! Browser shell around the `wp-session` controller: binds the DOM, provides
//! the `window.ethereum` host, and re-renders on every state change.

pub mod config;
pub mod dom;
pub mod ethereum;
pub mod events;
pub mod logging;
pub mod render;

use std::rc::Rc;

use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wp_session::Session;

use crate::config::AppConfig;
use crate::ethereum::BrowserHost;

pub type AppSession = Session<BrowserHost>;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let config = AppConfig::load();
    logging::init(&config.log_filter);
    info!(
        contract = %config.contract.address,
        gas_limit = config.session.gas_limit,
        "starting waveportal"
    );

    let els = dom::Elements::bind()?;
    let session = Rc::new(Session::new(BrowserHost::new(config.contract), config.session));

    {
        let els = els.clone();
        session.set_listener(move |state| {
            if let Err(err) = render::render(&els, state) {
                warn!(?err, "render failed");
            }
        });
    }
    session.with(|state| render::render(&els, state))?;

    events::bind_events(&els, &session)?;

    session.start().await;
    Ok(())
}
