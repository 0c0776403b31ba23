//! Web Speech API backend.
use std::collections::VecDeque;

use accessibility_core::{SpeechSynth, Utterance};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{
    SpeechSynthesis, SpeechSynthesisErrorCode, SpeechSynthesisErrorEvent,
    SpeechSynthesisUtterance, SpeechSynthesisVoice,
};

use crate::dom;

const PREFERRED_VOICE_HINTS: [&str; 3] = ["Natural", "Google", "Microsoft"];
const SPOKEN_LOG_LEN: usize = 32;

/// Index of the first English voice whose name suggests a high quality
/// engine. `None` leaves the choice to the browser.
#[must_use]
pub fn preferred_voice<'a, I>(voices: I) -> Option<usize>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    voices.into_iter().position(|(name, lang)| {
        lang.to_ascii_lowercase().starts_with("en")
            && PREFERRED_VOICE_HINTS.iter().any(|hint| name.contains(hint))
    })
}

pub struct BrowserSpeech {
    synth: Option<SpeechSynthesis>,
    on_error: Closure<dyn FnMut(SpeechSynthesisErrorEvent)>,
    spoken: VecDeque<String>,
}

impl BrowserSpeech {
    /// Bind to `window.speechSynthesis` when the browser provides it.
    #[must_use]
    pub fn detect() -> Self {
        let synth = dom::window().and_then(|win| {
            let present = js_sys::Reflect::has(&win, &"speechSynthesis".into()).unwrap_or(false);
            if present {
                win.speech_synthesis().ok()
            } else {
                None
            }
        });
        let on_error = Closure::wrap(Box::new(|event: SpeechSynthesisErrorEvent| {
            match event.error() {
                SpeechSynthesisErrorCode::Interrupted | SpeechSynthesisErrorCode::Canceled => {}
                code => log::error!("speech synthesis error: {code:?}"),
            }
        }) as Box<dyn FnMut(SpeechSynthesisErrorEvent)>);
        Self {
            synth,
            on_error,
            spoken: VecDeque::with_capacity(SPOKEN_LOG_LEN),
        }
    }

    /// Most recent utterance texts, oldest first.
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.iter().cloned().collect()
    }

    fn pick_voice(synth: &SpeechSynthesis) -> Option<SpeechSynthesisVoice> {
        let voices: Vec<SpeechSynthesisVoice> = synth
            .get_voices()
            .iter()
            .filter_map(|v| v.dyn_into::<SpeechSynthesisVoice>().ok())
            .collect();
        let names: Vec<(String, String)> = voices.iter().map(|v| (v.name(), v.lang())).collect();
        let index = preferred_voice(names.iter().map(|(n, l)| (n.as_str(), l.as_str())))?;
        voices.into_iter().nth(index)
    }

    fn remember(&mut self, text: &str) {
        if self.spoken.len() == SPOKEN_LOG_LEN {
            self.spoken.pop_front();
        }
        self.spoken.push_back(text.to_string());
    }
}

impl SpeechSynth for BrowserSpeech {
    fn is_supported(&self) -> bool {
        self.synth.is_some()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn speak(&mut self, utterance: &Utterance) {
        let Some(synth) = self.synth.clone() else {
            return;
        };
        let spoken = match SpeechSynthesisUtterance::new_with_text(&utterance.text) {
            Ok(spoken) => spoken,
            Err(err) => {
                log::error!(
                    "could not create utterance: {}",
                    dom::js_error_message(&err)
                );
                return;
            }
        };
        spoken.set_rate(utterance.rate as f32);
        spoken.set_volume(utterance.volume as f32);
        spoken.set_pitch(utterance.pitch as f32);
        if let Some(voice) = Self::pick_voice(&synth) {
            spoken.set_voice(Some(&voice));
        }
        spoken.set_onerror(Some(self.on_error.as_ref().unchecked_ref()));
        synth.speak(&spoken);
        self.remember(&utterance.text);
    }

    fn cancel(&mut self) {
        if let Some(synth) = &self.synth {
            synth.cancel();
        }
    }
}
