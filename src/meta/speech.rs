//! Where spoken text goes. The screen reader client belongs to the host, so all we need is
//! something that accepts text.

use std::sync::{Arc, Mutex};

/// Receives text to be spoken.
pub trait Speaker {
    /// Speaks `text`. If `interrupt` is true, anything currently being spoken should stop first.
    fn speak(&mut self, text: &str, interrupt: bool);
}

/// Speaker used before the host registers one. Text goes to the log so that testers can still see
/// what would have been read.
#[derive(Default)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak(&mut self, text: &str, interrupt: bool) {
        log::info!("speak (interrupt: {}): {}", interrupt, text);
    }
}

/// Speaker that remembers everything it was asked to say.
#[derive(Default, Debug)]
pub struct RecordingSpeaker {
    pub spoken: Vec<(String, bool)>,
}

impl RecordingSpeaker {
    /// The most recent utterance.
    pub fn last(&self) -> Option<&str> {
        self.spoken.last().map(|(text, _)| text.as_str())
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, text: &str, interrupt: bool) {
        self.spoken.push((text.to_string(), interrupt));
    }
}

/// Lets one speaker be shared between the plugin and whoever else wants to look at it.
impl<S: Speaker> Speaker for Arc<Mutex<S>> {
    fn speak(&mut self, text: &str, interrupt: bool) {
        match self.lock() {
            Ok(mut speaker) => speaker.speak(text, interrupt),
            Err(_) => log::error!("speaker lock poisoned, dropping: {}", text),
        }
    }
}
