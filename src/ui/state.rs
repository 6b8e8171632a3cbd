//! Application state management
//!
//! `AppState` is the single owner of everything a renderer shows: the gig
//! listing, the chat log, form visibility and voice mode. The controller
//! drives it from one thread; renderers read it or the snapshots the
//! controller publishes.

use crate::commands::{CommandInterpreter, Effect, Outcome};
use crate::gigs::{Gig, GigForm, ListingStore};
use crate::messages::{ChatLog, ChatMessage};
use crate::speech::{RecognitionEvent, RecognitionOutcome, SpeechInput, SpeechOutput};
use crate::Result;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const VOICE_ON_REPLY: &str =
    "Namaste bhai! GigWorker full voice control ON! Gig post karo, book karo, services dekho!";
pub const VOICE_OFF_REPLY: &str = "Voice OFF ho gaya!";
pub const GIG_POSTED_REPLY: &str = "Gig post ho gaya!";
pub const GIG_DELETED_REPLY: &str = "Gig delete!";

/// How much of the state a renderer shows at once
#[derive(Debug, Clone, Copy)]
pub struct DisplayLimits {
    pub chat: usize,
    pub listings: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            chat: 8,
            listings: 10,
        }
    }
}

/// A restart the controller has to arm a timer for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRestart {
    pub delay: Duration,
    pub generation: u64,
}

/// What happened after a recognition event
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceStep {
    /// A transcript was interpreted and executed
    Handled { transcript: String, outcome: Outcome },
    /// A restart timer has to be armed
    Restart(PendingRestart),
    /// Recognition stopped for good; voice mode is now off
    VoiceOff,
    Nothing,
}

/// Central application state
pub struct AppState {
    /// Gig collection mirrored to storage
    pub store: ListingStore,

    /// Chat log, shared with the speech output
    pub chat: ChatLog,

    /// Whether the manual posting form is open
    pub show_form: bool,

    /// Whether the user wants the recognition session kept alive
    pub voice_mode: bool,

    /// Last transcript handed to the interpreter
    pub last_transcript: Option<String>,

    pub limits: DisplayLimits,

    speech_out: SpeechOutput,

    /// `None` when the environment has no recognition engine
    speech_in: Option<SpeechInput>,

    interpreter: CommandInterpreter,
}

impl AppState {
    pub fn new(
        store: ListingStore,
        speech_out: SpeechOutput,
        speech_in: Option<SpeechInput>,
    ) -> Self {
        let chat = speech_out.chat().clone();
        Self {
            store,
            chat,
            show_form: false,
            voice_mode: false,
            last_transcript: None,
            limits: DisplayLimits::default(),
            speech_out,
            speech_in,
            interpreter: CommandInterpreter::new(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: CommandInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_limits(mut self, limits: DisplayLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn is_voice_supported(&self) -> bool {
        self.speech_in.is_some()
    }

    pub fn speech_input(&self) -> Option<&SpeechInput> {
        self.speech_in.as_ref()
    }

    /// Speak a reply and log it in the chat
    pub fn speak(&mut self, text: &str) {
        self.speech_out.say(text);
    }

    /// Flip voice mode
    ///
    /// Returns the new voice mode. Without a recognition engine this is a
    /// silent no-op.
    pub fn toggle_voice(&mut self) -> bool {
        let Some(speech_in) = self.speech_in.as_mut() else {
            info!("Speech recognition unavailable, voice mode stays off");
            return false;
        };

        if self.voice_mode {
            speech_in.stop();
            self.voice_mode = false;
            self.speech_out.say(VOICE_OFF_REPLY);
        } else {
            if let Err(e) = speech_in.start() {
                warn!("Could not start speech recognition: {}", e);
                return false;
            }
            self.voice_mode = true;
            self.speech_out.say(VOICE_ON_REPLY);
        }
        self.voice_mode
    }

    /// Route an engine event through the recognition adapter
    ///
    /// Transcripts are executed immediately. A returned `VoiceStep::Restart`
    /// must be armed by the caller.
    pub fn handle_recognition_event(&mut self, event: RecognitionEvent) -> VoiceStep {
        let Some(speech_in) = self.speech_in.as_mut() else {
            return VoiceStep::Nothing;
        };
        match speech_in.handle_event(event) {
            RecognitionOutcome::Transcript(text) => {
                let outcome = self.handle_transcript(&text);
                VoiceStep::Handled {
                    transcript: text,
                    outcome,
                }
            }
            RecognitionOutcome::ScheduleRestart { delay, generation } => {
                VoiceStep::Restart(PendingRestart { delay, generation })
            }
            RecognitionOutcome::Disabled(kind) => {
                info!("Voice mode disabled: {:?}", kind);
                self.voice_mode = false;
                VoiceStep::VoiceOff
            }
            RecognitionOutcome::GaveUp => {
                info!("Voice mode switched off after repeated silent sessions");
                self.voice_mode = false;
                VoiceStep::VoiceOff
            }
            RecognitionOutcome::Ignored => VoiceStep::Nothing,
        }
    }

    /// Stop recognition without announcing it
    pub fn shutdown_voice(&mut self) {
        if let Some(speech_in) = self.speech_in.as_mut() {
            speech_in.stop();
        }
        self.voice_mode = false;
    }

    /// Called when a restart timer fires
    pub fn restart_due(&mut self, generation: u64) {
        let Some(speech_in) = self.speech_in.as_mut() else {
            return;
        };
        if !self.voice_mode {
            debug!("Voice mode off, dropping restart {}", generation);
            return;
        }
        if let Err(e) = speech_in.restart_due(generation) {
            warn!("{}", e);
            self.voice_mode = false;
        }
    }

    /// Interpret one transcript and apply its effect
    pub fn handle_transcript(&mut self, transcript: &str) -> Outcome {
        self.chat.add(ChatMessage::user(transcript));
        self.last_transcript = Some(transcript.to_string());

        let outcome = self.interpreter.handle(transcript, &mut self.store, now_ms());
        if outcome.effect == Effect::FormOpened {
            self.show_form = true;
        }
        if let Some(reply) = &outcome.reply {
            self.speech_out.say(reply);
        }
        outcome
    }

    /// Post a gig from the manual form
    pub fn submit_form(&mut self, form: GigForm) -> Result<u64> {
        let gig = form.into_gig(self.store.next_id(now_ms()))?;
        let id = gig.id;
        self.store.insert(gig);
        self.show_form = false;
        self.speech_out.say(GIG_POSTED_REPLY);
        Ok(id)
    }

    /// Delete a gig by id; returns whether it existed
    pub fn delete_gig(&mut self, id: u64) -> bool {
        if self.store.delete_by_id(id).is_some() {
            self.speech_out.say(GIG_DELETED_REPLY);
            true
        } else {
            false
        }
    }

    /// The gigs a listing view shows, newest first
    pub fn visible_gigs(&self) -> &[Gig] {
        let gigs = self.store.gigs();
        &gigs[..gigs.len().min(self.limits.listings)]
    }

    pub fn recent_chat(&self) -> Vec<ChatMessage> {
        self.chat.recent(self.limits.chat)
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}
