//! Speech output with an at-most-one-utterance guarantee.
use serde::Serialize;

use crate::prefs::SpeechPreferences;

pub const TEST_SENTENCE: &str = "This is a test of the text to speech functionality. You can adjust the speed and volume settings above.";
pub const ACTIVATED_ANNOUNCEMENT: &str =
    "Screen reader activated. Click on any text to have it read aloud, or use the read page button.";
pub const DEACTIVATED_ANNOUNCEMENT: &str = "Screen reader deactivated.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Utterance {
    pub text: String,
    pub rate: f64,
    pub volume: f64,
    pub pitch: f64,
}

impl Utterance {
    #[must_use]
    pub fn new(text: impl Into<String>, prefs: SpeechPreferences) -> Self {
        Self {
            text: text.into(),
            rate: prefs.rate,
            volume: prefs.volume,
            pitch: 1.0,
        }
    }
}

/// Platform text-to-speech backend.
pub trait SpeechSynth {
    fn is_supported(&self) -> bool;

    /// Begin speaking. Callers cancel any current utterance first.
    fn speak(&mut self, utterance: &Utterance);

    /// Stop the current utterance, if any.
    fn cancel(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakOutcome {
    Started,
    /// Nothing to say after trimming.
    Skipped,
    /// No speech backend. `notify` is true only the first time, so the host
    /// can surface a single fallback message.
    Unavailable { notify: bool },
}

/// Owns the synth and enforces that starting speech cancels what is playing.
#[derive(Debug)]
pub struct Narrator<S> {
    synth: S,
    warned_unsupported: bool,
    pending_notice: bool,
}

impl<S: SpeechSynth> Narrator<S> {
    pub const fn new(synth: S) -> Self {
        Self {
            synth,
            warned_unsupported: false,
            pending_notice: false,
        }
    }

    pub fn speak(&mut self, text: &str, prefs: SpeechPreferences) -> SpeakOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SpeakOutcome::Skipped;
        }
        if !self.synth.is_supported() {
            log::info!("Screen Reader: {text}");
            let notify = !self.warned_unsupported;
            if notify {
                log::warn!("text-to-speech is not supported in this browser");
                self.warned_unsupported = true;
                self.pending_notice = true;
            }
            return SpeakOutcome::Unavailable { notify };
        }
        self.synth.cancel();
        self.synth.speak(&Utterance::new(text, prefs));
        SpeakOutcome::Started
    }

    pub fn stop(&mut self) {
        if self.synth.is_supported() {
            self.synth.cancel();
        }
    }

    /// True once after the first unsupported attempt; the host shows its
    /// fallback message then.
    pub const fn take_unsupported_notice(&mut self) -> bool {
        let pending = self.pending_notice;
        self.pending_notice = false;
        pending
    }

    pub const fn synth(&self) -> &S {
        &self.synth
    }

    pub const fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }
}
