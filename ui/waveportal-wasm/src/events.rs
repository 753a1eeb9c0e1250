//! Event binding.
//!
//! Wires the UI listeners to session operations. Async handlers are spawned
//! with `wasm_bindgen_futures::spawn_local`; their errors are already logged
//! by the session.

use std::rc::Rc;

use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wp_session::SessionError;

use crate::AppSession;
use crate::dom::{self, Elements};

/// Attach an async click handler taking the session.
macro_rules! on_click_async {
    ($el:expr, $session:expr, $handler:expr) => {{
        let session = Rc::clone($session);
        let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
            let session = Rc::clone(&session);
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&session).await;
            });
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements, session: &Rc<AppSession>) -> Result<(), JsValue> {
    // ── Draft ──
    {
        let input = els.message_input.clone();
        let session = Rc::clone(session);
        let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
            session.set_draft(input.value());
        }) as Box<dyn FnMut(_)>);
        els.message_input
            .add_event_listener_with_callback("input", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }

    // ── Wallet / wave ──
    on_click_async!(els.connect_btn, session, on_connect);
    on_click_async!(els.wave_btn, session, on_wave);

    // ── Teardown ──
    {
        let session = Rc::clone(session);
        let cb = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let persisted = event
                .dyn_ref::<web_sys::PageTransitionEvent>()
                .map(|e| e.persisted());
            if ends_session(persisted) {
                session.shutdown();
            } else {
                debug!("page entering back/forward cache, keeping session");
            }
        }) as Box<dyn FnMut(_)>);
        dom::window().add_event_listener_with_callback("pagehide", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }

    Ok(())
}

/// A persisted `pagehide` may be restored from the back/forward cache.
fn ends_session(persisted: Option<bool>) -> bool {
    !persisted.unwrap_or(false)
}

async fn on_connect(session: &AppSession) {
    if let Err(SessionError::ProviderUnavailable) = session.connect_wallet().await {
        let _ = dom::window().alert_with_message("Get MetaMask!");
    }
}

async fn on_wave(session: &AppSession) {
    // the button is only shown for a non-empty draft; keyboard activation can still race it
    if !session.with(|s| s.can_submit()) {
        debug!("ignoring wave with empty draft");
        return;
    }
    let _ = session.submit_wave().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_page_keeps_session() {
        assert!(!ends_session(Some(true)));
    }

    #[test]
    fn final_unload_ends_session() {
        assert!(ends_session(Some(false)));
        assert!(ends_session(None));
    }
}
