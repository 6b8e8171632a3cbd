//! Speech output: one utterance at a time, mirrored into the chat log

use crate::messages::{ChatLog, ChatMessage};
use crate::Result;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Voice settings applied to every utterance
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Locale tag for the voice
    pub lang: String,

    /// Speech rate (1.0 = normal)
    pub rate: f32,

    /// Voice pitch (1.0 = normal)
    pub pitch: f32,

    /// Volume from 0.0 to 1.0
    pub volume: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            lang: "hi-IN".to_string(),
            rate: 0.9,
            pitch: 1.05,
            volume: 1.0,
        }
    }
}

/// A single request to the synthesis engine
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, config: &SynthesisConfig) -> Self {
        Self {
            text: text.into(),
            lang: config.lang.clone(),
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume,
        }
    }
}

/// A speech synthesis backend
pub trait SynthesisEngine: Send {
    /// Drop whatever is currently being spoken
    fn cancel(&mut self);

    /// Start speaking an utterance
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;
}

/// Speech output adapter
pub struct SpeechOutput {
    engine: Box<dyn SynthesisEngine>,
    config: SynthesisConfig,
    chat: ChatLog,
}

impl SpeechOutput {
    pub fn new(engine: Box<dyn SynthesisEngine>, config: SynthesisConfig, chat: ChatLog) -> Self {
        Self {
            engine,
            config,
            chat,
        }
    }

    /// Speak `text`, cutting off any utterance in progress, and log it
    pub fn say(&mut self, text: &str) {
        debug!("Speaking: {}", text);
        self.engine.cancel();
        if let Err(e) = self.engine.speak(&Utterance::new(text, &self.config)) {
            warn!("Speech synthesis failed: {}", e);
        }
        self.chat.add(ChatMessage::bot(text));
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }
}

/// Engine for environments without speech output
#[derive(Debug, Default)]
pub struct NullSynthesis;

impl SynthesisEngine for NullSynthesis {
    fn cancel(&mut self) {}

    fn speak(&mut self, _utterance: &Utterance) -> Result<()> {
        Ok(())
    }
}

/// Engine that prints each utterance to stdout
#[derive(Debug, Default)]
pub struct ConsoleSynthesis;

impl SynthesisEngine for ConsoleSynthesis {
    fn cancel(&mut self) {}

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        println!("🤖 Bot: {}", utterance.text);
        Ok(())
    }
}

/// Calls seen by a `MemorySynthesis`
#[derive(Clone, Debug, PartialEq)]
pub enum SynthesisCall {
    Cancel,
    Speak(Utterance),
}

/// Engine that records calls instead of producing audio
#[derive(Clone, Debug, Default)]
pub struct MemorySynthesis {
    calls: Arc<Mutex<Vec<SynthesisCall>>>,
}

impl MemorySynthesis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SynthesisCall> {
        self.calls.lock().clone()
    }

    /// Texts spoken so far, in order
    pub fn spoken(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                SynthesisCall::Speak(u) => Some(u.text.clone()),
                SynthesisCall::Cancel => None,
            })
            .collect()
    }

    pub fn last_spoken(&self) -> Option<String> {
        self.spoken().pop()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl SynthesisEngine for MemorySynthesis {
    fn cancel(&mut self) {
        self.calls.lock().push(SynthesisCall::Cancel);
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        self.calls.lock().push(SynthesisCall::Speak(utterance.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Sender;
    use crate::GigError;

    struct BrokenSynthesis;

    impl SynthesisEngine for BrokenSynthesis {
        fn cancel(&mut self) {}

        fn speak(&mut self, _utterance: &Utterance) -> Result<()> {
            Err(GigError::SpeechError("no voices".into()))
        }
    }

    #[test]
    fn test_say_cancels_before_speaking() {
        let engine = MemorySynthesis::new();
        let mut output = SpeechOutput::new(
            Box::new(engine.clone()),
            SynthesisConfig::default(),
            ChatLog::new(),
        );

        output.say("one");
        output.say("two");

        let calls = engine.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], SynthesisCall::Cancel);
        assert_eq!(calls[2], SynthesisCall::Cancel);
        assert_eq!(engine.spoken(), vec!["one", "two"]);
    }

    #[test]
    fn test_utterance_uses_voice_settings() {
        let engine = MemorySynthesis::new();
        let mut output = SpeechOutput::new(
            Box::new(engine.clone()),
            SynthesisConfig::default(),
            ChatLog::new(),
        );
        output.say("Namaste");

        match &engine.calls()[1] {
            SynthesisCall::Speak(u) => {
                assert_eq!(u.lang, "hi-IN");
                assert_eq!(u.rate, 0.9);
                assert_eq!(u.pitch, 1.05);
                assert_eq!(u.volume, 1.0);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_say_logs_even_when_engine_fails() {
        let chat = ChatLog::new();
        let mut output =
            SpeechOutput::new(Box::new(BrokenSynthesis), SynthesisConfig::default(), chat.clone());
        output.say("Gig delete!");

        let last = chat.last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.text, "Gig delete!");
    }
}
