//! Continuous speech recognition session with automatic restart
//!
//! The engine ends its session on its own from time to time (silence, browser
//! limits). `SpeechInput` keeps it alive while voice mode is on by scheduling
//! restarts, and turns each result batch into at most one transcript.
//!
//! Session lifecycle:
//!
//! ```text
//!   Idle --start--> Listening --no-speech/end--> Restarting{g} --timer(g)--> Listening
//!    ^                  |                             |
//!    +------stop--------+-------------stop------------+
//! ```
//!
//! Every stop and every newly scheduled restart bumps the generation, so a
//! timer that fires for an older generation is discarded.

use crate::{GigError, Result};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the recognition engine and restart policy
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Locale tag passed to the engine
    pub lang: String,

    /// Keep listening across utterances
    pub continuous: bool,

    /// Report interim (non-final) guesses
    pub interim_results: bool,

    /// Alternatives requested per result
    pub max_alternatives: u32,

    /// Delay before restarting after a "no speech" error
    pub no_speech_restart_ms: u64,

    /// Delay before restarting after the session ends
    pub end_restart_ms: u64,

    /// Restarts allowed without a transcript in between (0 = unlimited)
    pub max_consecutive_restarts: u32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            lang: "en-IN".to_string(),
            continuous: true,
            interim_results: true,
            max_alternatives: 3,
            no_speech_restart_ms: 200,
            end_restart_ms: 300,
            max_consecutive_restarts: 25,
        }
    }
}

impl RecognitionConfig {
    pub fn no_speech_delay(&self) -> Duration {
        Duration::from_millis(self.no_speech_restart_ms)
    }

    pub fn end_delay(&self) -> Duration {
        Duration::from_millis(self.end_restart_ms)
    }

    /// Set the restart cap (0 disables it)
    pub fn with_restart_cap(mut self, max: u32) -> Self {
        self.max_consecutive_restarts = max;
        self
    }
}

/// One candidate transcription
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionAlternative {
    pub transcript: String,
    pub confidence: f32,
}

/// One result in a batch, with its alternatives best-first
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionResult {
    pub alternatives: Vec<RecognitionAlternative>,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn new(transcript: impl Into<String>, is_final: bool) -> Self {
        Self {
            alternatives: vec![RecognitionAlternative {
                transcript: transcript.into(),
                confidence: 1.0,
            }],
            is_final,
        }
    }

    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self::new(transcript, true)
    }

    pub fn interim(transcript: impl Into<String>) -> Self {
        Self::new(transcript, false)
    }

    fn best(&self) -> Option<&str> {
        self.alternatives.first().map(|a| a.transcript.as_str())
    }
}

/// Error codes reported by the engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    Other(String),
}

impl RecognitionErrorKind {
    /// Map an engine error code such as `no-speech`
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Errors that mean recognition cannot work in this environment
    pub fn disables_voice(&self) -> bool {
        matches!(
            self,
            Self::AudioCapture | Self::NotAllowed | Self::ServiceNotAllowed
        )
    }
}

/// Callbacks from the engine, delivered to the controller loop
#[derive(Clone, Debug)]
pub enum RecognitionEvent {
    Result(Vec<RecognitionResult>),
    Error(RecognitionErrorKind),
    End,
}

/// A speech recognition backend
pub trait RecognitionEngine: Send {
    /// Apply session settings before the first start
    fn configure(&mut self, _config: &RecognitionConfig) {}

    /// Begin a recognition session
    fn start(&mut self) -> Result<()>;

    /// End the current session
    fn stop(&mut self);
}

/// Pick the transcript to act on from one result batch
///
/// Prefers the first final result. Without one, or when its text is empty,
/// falls back to the last result even though it may still be an interim guess.
pub fn extract_transcript(batch: &[RecognitionResult]) -> Option<String> {
    let chosen = batch
        .iter()
        .find(|r| r.is_final)
        .and_then(RecognitionResult::best)
        .filter(|text| !text.is_empty())
        .or_else(|| batch.last().and_then(RecognitionResult::best))?;

    if chosen.trim().is_empty() {
        None
    } else {
        Some(chosen.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No session and none pending
    Idle,
    /// Engine session running
    Listening,
    /// Waiting for the restart timer of this generation
    Restarting { generation: u64 },
}

/// What the controller should do after an engine event
#[derive(Clone, Debug, PartialEq)]
pub enum RecognitionOutcome {
    /// A transcript ready for the interpreter
    Transcript(String),
    /// Arm a timer and call `restart_due(generation)` when it fires
    ScheduleRestart { delay: Duration, generation: u64 },
    /// The environment cannot recognise speech; voice mode must go off
    Disabled(RecognitionErrorKind),
    /// Too many restarts without a transcript; voice mode must go off
    GaveUp,
    /// Nothing to do
    Ignored,
}

/// Recognition adapter that owns the engine and its restart state
pub struct SpeechInput {
    engine: Box<dyn RecognitionEngine>,
    config: RecognitionConfig,
    state: SessionState,
    generation: u64,
    consecutive_restarts: u32,
}

impl SpeechInput {
    pub fn new(mut engine: Box<dyn RecognitionEngine>, config: RecognitionConfig) -> Self {
        engine.configure(&config);
        Self {
            engine,
            config,
            state: SessionState::Idle,
            generation: 0,
            consecutive_restarts: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != SessionState::Idle
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    /// Start listening; a no-op when a session is already active
    pub fn start(&mut self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }
        self.engine.start()?;
        self.state = SessionState::Listening;
        self.consecutive_restarts = 0;
        info!("Speech recognition started ({})", self.config.lang);
        Ok(())
    }

    /// Stop listening and invalidate any pending restart
    pub fn stop(&mut self) {
        let was_active = self.is_active();
        self.go_idle();
        if was_active {
            self.engine.stop();
        }
        info!("Speech recognition stopped");
    }

    /// Feed one engine event through the state machine
    pub fn handle_event(&mut self, event: RecognitionEvent) -> RecognitionOutcome {
        if self.state == SessionState::Idle {
            debug!("Ignoring recognition event while idle: {:?}", event);
            return RecognitionOutcome::Ignored;
        }

        match event {
            RecognitionEvent::Result(batch) => match extract_transcript(&batch) {
                Some(text) => {
                    self.consecutive_restarts = 0;
                    debug!("Transcript: {}", text);
                    RecognitionOutcome::Transcript(text)
                }
                None => RecognitionOutcome::Ignored,
            },
            RecognitionEvent::Error(RecognitionErrorKind::NoSpeech) => {
                self.schedule_restart(self.config.no_speech_delay())
            }
            RecognitionEvent::Error(kind) if kind.disables_voice() => {
                warn!("Speech recognition unavailable: {:?}", kind);
                self.go_idle();
                RecognitionOutcome::Disabled(kind)
            }
            RecognitionEvent::Error(kind) => {
                // The engine follows these with an end event, which restarts
                debug!("Transient recognition error: {:?}", kind);
                RecognitionOutcome::Ignored
            }
            RecognitionEvent::End => {
                if let SessionState::Restarting { .. } = self.state {
                    return RecognitionOutcome::Ignored;
                }
                self.schedule_restart(self.config.end_delay())
            }
        }
    }

    /// Called when a restart timer fires
    ///
    /// Returns `Ok(true)` if the session was restarted, `Ok(false)` if the
    /// timer was stale.
    pub fn restart_due(&mut self, generation: u64) -> Result<bool> {
        match self.state {
            SessionState::Restarting { generation: current } if current == generation => {
                if let Err(e) = self.engine.start() {
                    self.go_idle();
                    return Err(GigError::SpeechError(format!(
                        "Failed to restart recognition: {}",
                        e
                    )));
                }
                self.state = SessionState::Listening;
                debug!("Recognition session restarted (generation {})", generation);
                Ok(true)
            }
            _ => {
                debug!("Discarding stale restart (generation {})", generation);
                Ok(false)
            }
        }
    }

    fn schedule_restart(&mut self, delay: Duration) -> RecognitionOutcome {
        let cap = self.config.max_consecutive_restarts;
        if cap > 0 && self.consecutive_restarts >= cap {
            warn!("Giving up after {} restarts without speech", cap);
            self.go_idle();
            return RecognitionOutcome::GaveUp;
        }

        self.consecutive_restarts += 1;
        self.generation += 1;
        self.state = SessionState::Restarting {
            generation: self.generation,
        };
        RecognitionOutcome::ScheduleRestart {
            delay,
            generation: self.generation,
        }
    }

    fn go_idle(&mut self) {
        self.generation += 1;
        self.state = SessionState::Idle;
    }
}

/// Engine fed from outside the process's audio stack
///
/// Start and stop only flip a flag; events arrive through the controller's
/// recognition sender. Used by the console driver and tests.
#[derive(Clone, Debug, Default)]
pub struct ChannelRecognition {
    listening: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
    fail_starts: Arc<AtomicBool>,
}

impl ChannelRecognition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Number of times the session was (re)started
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Make subsequent starts fail
    pub fn set_fail_starts(&self, fail: bool) {
        self.fail_starts.store(fail, Ordering::SeqCst);
    }
}

impl RecognitionEngine for ChannelRecognition {
    fn start(&mut self) -> Result<()> {
        if self.fail_starts.load(Ordering::SeqCst) {
            return Err(GigError::SpeechError("engine refused to start".into()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.listening.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.listening.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> (SpeechInput, ChannelRecognition) {
        let engine = ChannelRecognition::new();
        let input = SpeechInput::new(Box::new(engine.clone()), RecognitionConfig::default());
        (input, engine)
    }

    fn scheduled(outcome: RecognitionOutcome) -> (Duration, u64) {
        match outcome {
            RecognitionOutcome::ScheduleRestart { delay, generation } => (delay, generation),
            other => panic!("expected restart, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_prefers_first_final() {
        let batch = vec![
            RecognitionResult::interim("plum"),
            RecognitionResult::final_text("plumber book karo"),
            RecognitionResult::final_text("second"),
        ];
        assert_eq!(extract_transcript(&batch).as_deref(), Some("plumber book karo"));
    }

    #[test]
    fn test_extract_falls_back_to_last_interim() {
        let batch = vec![
            RecognitionResult::interim("hel"),
            RecognitionResult::interim("hello"),
        ];
        assert_eq!(extract_transcript(&batch).as_deref(), Some("hello"));
    }

    #[test]
    fn test_extract_skips_empty_final() {
        let batch = vec![
            RecognitionResult::final_text(""),
            RecognitionResult::interim("painter chahiye"),
        ];
        assert_eq!(extract_transcript(&batch).as_deref(), Some("painter chahiye"));
    }

    #[test]
    fn test_extract_discards_blank() {
        assert!(extract_transcript(&[RecognitionResult::final_text("   ")]).is_none());
        assert!(extract_transcript(&[]).is_none());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            RecognitionErrorKind::from_code("no-speech"),
            RecognitionErrorKind::NoSpeech
        );
        assert!(RecognitionErrorKind::from_code("not-allowed").disables_voice());
        assert!(!RecognitionErrorKind::from_code("network").disables_voice());
    }

    #[test]
    fn test_no_speech_schedules_short_restart() {
        let (mut input, engine) = input();
        input.start().unwrap();

        let (delay, generation) =
            scheduled(input.handle_event(RecognitionEvent::Error(RecognitionErrorKind::NoSpeech)));
        assert_eq!(delay, Duration::from_millis(200));
        assert_eq!(input.state(), SessionState::Restarting { generation });

        // The end event that follows does not stack a second restart
        assert_eq!(
            input.handle_event(RecognitionEvent::End),
            RecognitionOutcome::Ignored
        );

        assert!(input.restart_due(generation).unwrap());
        assert_eq!(input.state(), SessionState::Listening);
        assert_eq!(engine.start_count(), 2);
    }

    #[test]
    fn test_end_schedules_restart() {
        let (mut input, _) = input();
        input.start().unwrap();
        let (delay, _) = scheduled(input.handle_event(RecognitionEvent::End));
        assert_eq!(delay, Duration::from_millis(300));
    }

    #[test]
    fn test_stop_suppresses_pending_restart() {
        let (mut input, engine) = input();
        input.start().unwrap();
        let (_, generation) = scheduled(input.handle_event(RecognitionEvent::End));

        input.stop();
        assert!(!input.restart_due(generation).unwrap());
        assert_eq!(input.state(), SessionState::Idle);
        assert_eq!(engine.start_count(), 1);
        assert!(!engine.is_listening());
    }

    #[test]
    fn test_stale_generation_after_restart_cycle() {
        let (mut input, engine) = input();
        input.start().unwrap();
        let (_, first) = scheduled(input.handle_event(RecognitionEvent::End));
        input.stop();
        input.start().unwrap();
        let (_, second) = scheduled(input.handle_event(RecognitionEvent::End));

        assert!(!input.restart_due(first).unwrap());
        assert!(input.restart_due(second).unwrap());
        assert_eq!(engine.start_count(), 3);
    }

    #[test]
    fn test_events_ignored_when_idle() {
        let (mut input, _) = input();
        assert_eq!(
            input.handle_event(RecognitionEvent::Result(vec![RecognitionResult::final_text("hello")])),
            RecognitionOutcome::Ignored
        );
        assert_eq!(
            input.handle_event(RecognitionEvent::End),
            RecognitionOutcome::Ignored
        );
    }

    #[test]
    fn test_restart_cap_resets_on_transcript() {
        let engine = ChannelRecognition::new();
        let mut input = SpeechInput::new(
            Box::new(engine),
            RecognitionConfig::default().with_restart_cap(2),
        );
        input.start().unwrap();

        for _ in 0..2 {
            let (_, g) = scheduled(input.handle_event(RecognitionEvent::End));
            input.restart_due(g).unwrap();
        }
        // A transcript resets the counter
        assert!(matches!(
            input.handle_event(RecognitionEvent::Result(vec![RecognitionResult::final_text("hi")])),
            RecognitionOutcome::Transcript(_)
        ));
        for _ in 0..2 {
            let (_, g) = scheduled(input.handle_event(RecognitionEvent::End));
            input.restart_due(g).unwrap();
        }
        assert_eq!(
            input.handle_event(RecognitionEvent::End),
            RecognitionOutcome::GaveUp
        );
        assert_eq!(input.state(), SessionState::Idle);
    }

    #[test]
    fn test_permission_error_disables() {
        let (mut input, _) = input();
        input.start().unwrap();
        let outcome =
            input.handle_event(RecognitionEvent::Error(RecognitionErrorKind::NotAllowed));
        assert_eq!(
            outcome,
            RecognitionOutcome::Disabled(RecognitionErrorKind::NotAllowed)
        );
        assert!(!input.is_active());
    }

    #[test]
    fn test_failed_restart_goes_idle() {
        let (mut input, engine) = input();
        input.start().unwrap();
        let (_, g) = scheduled(input.handle_event(RecognitionEvent::End));
        engine.set_fail_starts(true);
        assert!(input.restart_due(g).is_err());
        assert_eq!(input.state(), SessionState::Idle);
    }
}
