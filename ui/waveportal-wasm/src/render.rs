//! Stateless projection of [`SessionState`] onto the DOM.

use wasm_bindgen::JsValue;
use wp_api_types::Wave;
use wp_session::{Notice, SessionState};

use crate::dom::{self, Elements};

const HIDDEN: &str = "hidden";

pub fn render(els: &Elements, state: &SessionState) -> Result<(), JsValue> {
    // the pending view replaces everything else while a wave is mining
    dom::toggle_class(&els.pending_view, HIDDEN, !state.is_pending());
    dom::toggle_class(&els.data_view, HIDDEN, state.is_pending());

    dom::toggle_class(&els.wave_btn, HIDDEN, !state.can_submit());
    dom::toggle_class(&els.connect_btn, HIDDEN, !state.show_connect_button());

    if els.message_input.value() != state.draft {
        els.message_input.set_value(&state.draft);
    }

    render_notice(els, state.notice.as_ref());
    dom::set_text(&els.wave_count, &count_label(state.total_waves));
    render_waves(els, &state.waves)
}

fn render_notice(els: &Elements, notice: Option<&Notice>) {
    match notice {
        Some(notice) => {
            dom::set_text(&els.notice, &notice.message);
            dom::toggle_class(&els.notice, HIDDEN, false);
        }
        None => {
            dom::set_text(&els.notice, "");
            dom::toggle_class(&els.notice, HIDDEN, true);
        }
    }
}

fn render_waves(els: &Elements, waves: &[Wave]) -> Result<(), JsValue> {
    dom::clear(&els.wave_list);
    for wave in waves {
        let item = dom::create_text_element("div", "wave", "")?;
        for part in wave_parts(wave) {
            let child = dom::create_text_element(part.tag, part.class, &part.text)?;
            item.append_child(&child)?;
        }
        els.wave_list.append_child(&item)?;
    }
    Ok(())
}

/// One child node of a rendered wave.
#[derive(Debug, PartialEq, Eq)]
pub struct WavePart {
    pub tag: &'static str,
    pub class: &'static str,
    pub text: String,
}

/// Children of a wave item, in display order.
pub fn wave_parts(wave: &Wave) -> [WavePart; 3] {
    [
        WavePart {
            tag: "h5",
            class: "wave-address",
            text: wave.address.to_string(),
        },
        WavePart {
            tag: "p",
            class: "wave-message",
            text: wave.message.clone(),
        },
        WavePart {
            tag: "small",
            class: "wave-time",
            text: time_label(wave),
        },
    ]
}

pub fn count_label(total: u64) -> String {
    format!("There are currently {total} messages")
}

pub fn time_label(wave: &Wave) -> String {
    wave.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wp_api_types::Account;

    #[test]
    fn count_label_reads_naturally() {
        assert_eq!(count_label(0), "There are currently 0 messages");
        assert_eq!(count_label(12), "There are currently 12 messages");
    }

    #[test]
    fn wave_item_shows_address_message_and_time() {
        let wave = Wave::new(Account::new("0xA"), 1_000, "hi".to_owned());
        let [address, message, time] = wave_parts(&wave);

        assert_eq!((address.tag, address.class, address.text.as_str()), ("h5", "wave-address", "0xA"));
        assert_eq!((message.tag, message.class, message.text.as_str()), ("p", "wave-message", "hi"));
        assert_eq!(time.tag, "small");
        assert_eq!(time.class, "wave-time");
        assert_eq!(time.text, "1970-01-01 00:16:40 UTC");
    }

    #[test]
    fn time_label_is_utc() {
        let wave = Wave::new(Account::new("0xA"), 1_000, "hi".to_owned());
        assert_eq!(time_label(&wave), "1970-01-01 00:16:40 UTC");
    }
}
