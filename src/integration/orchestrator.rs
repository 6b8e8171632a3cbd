//! Orchestrator for the voice command loop
//!
//! Connects all components: Recognition -> Interpreter -> Listing Store / Speech Output
//!
//! Everything runs on one worker thread. Commands from the handle, engine
//! events and restart timers are multiplexed with `select!`, so no two
//! handlers ever touch `AppState` at the same time.

use crate::gigs::{DurableStorage, Gig, GigForm, ListingStore};
use crate::integration::config::AppConfig;
use crate::messages::ChatLog;
use crate::speech::{
    RecognitionEngine, RecognitionEvent, SpeechInput, SpeechOutput, SynthesisEngine,
};
use crate::ui::{AppState, PendingRestart, VoiceStep};
use crate::{GigError, Result};
use crossbeam_channel::{at, bounded, never, select, unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Commands that can be sent to the orchestrator
#[derive(Debug, Clone)]
pub enum OrchestratorCommand {
    /// Switch voice mode on or off
    ToggleVoice,

    /// Run a typed command as if it had been spoken
    SendText(String),

    /// Post a gig from the manual form
    SubmitForm(GigForm),

    /// Delete a gig by id
    DeleteGig(u64),

    /// Shutdown the orchestrator
    Shutdown,
}

/// Events emitted by the orchestrator
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    /// Voice mode changed
    VoiceMode(bool),

    /// Current listing after a change, newest first
    Listings(Vec<Gig>),

    /// Posting form opened or closed
    FormVisible(bool),

    /// A transcript was handled
    Transcript(String),

    /// A reply was spoken
    Reply(String),

    /// A manual form was rejected
    FormRejected(String),

    /// Orchestrator has shut down
    Shutdown,
}

/// Handle for controlling the orchestrator from a front end
pub struct OrchestratorHandle {
    /// Command sender
    command_tx: Sender<OrchestratorCommand>,

    /// Event receiver
    event_rx: Receiver<OrchestratorEvent>,

    /// Sender the recognition engine reports through
    recognition_tx: Sender<RecognitionEvent>,

    /// Shared chat log
    chat: ChatLog,
}

impl OrchestratorHandle {
    /// Send a command to the orchestrator
    pub fn send_command(&self, cmd: OrchestratorCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| GigError::ChannelError(format!("Failed to send command: {}", e)))
    }

    /// Try to receive an event from the orchestrator
    pub fn try_recv_event(&self) -> Option<OrchestratorEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get the event receiver
    pub fn event_receiver(&self) -> Receiver<OrchestratorEvent> {
        self.event_rx.clone()
    }

    /// Get the sender recognition engines push events into
    pub fn recognition_sender(&self) -> Sender<RecognitionEvent> {
        self.recognition_tx.clone()
    }

    /// Get the chat log for rendering
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Ask the orchestrator to stop and wait for its thread
    pub fn shutdown(&self, worker: JoinHandle<()>) -> Result<()> {
        // The loop may already be gone; the join below reports why
        if let Err(e) = self.send_command(OrchestratorCommand::Shutdown) {
            warn!("{}", e);
        }
        worker
            .join()
            .map_err(|_| GigError::ChannelError("Orchestrator thread panicked".to_string()))
    }
}

/// Main orchestrator that owns the application state
pub struct Orchestrator {
    state: AppState,

    /// Command receiver
    command_rx: Receiver<OrchestratorCommand>,

    /// Event sender
    event_tx: Sender<OrchestratorEvent>,

    /// Recognition event receiver
    recognition_rx: Receiver<RecognitionEvent>,

    /// Next restart timer, if one is armed
    pending_restart: Option<(Instant, u64)>,
}

impl Orchestrator {
    /// Create a new orchestrator, loading the listing from storage
    ///
    /// Passing no recognition engine, or a config with voice input disabled,
    /// runs in text-only mode.
    pub fn new(
        config: AppConfig,
        storage: Box<dyn DurableStorage>,
        recognition: Option<Box<dyn RecognitionEngine>>,
        synthesis: Box<dyn SynthesisEngine>,
    ) -> Result<(Self, OrchestratorHandle)> {
        config.validate()?;

        let (command_tx, command_rx) = bounded(100);
        let (event_tx, event_rx) = unbounded();
        let (recognition_tx, recognition_rx) = bounded(100);

        let chat = ChatLog::with_limit(config.chat.history_limit);
        let store = ListingStore::load(storage, config.storage.key.clone());
        let speech_out = SpeechOutput::new(synthesis, config.synthesis.clone(), chat.clone());
        let speech_in = recognition
            .filter(|_| config.enable_voice_input)
            .map(|engine| SpeechInput::new(engine, config.recognition.clone()));

        let state = AppState::new(store, speech_out, speech_in)
            .with_limits(config.chat.display_limits());

        let handle = OrchestratorHandle {
            command_tx,
            event_rx,
            recognition_tx,
            chat,
        };

        let orchestrator = Self {
            state,
            command_rx,
            event_tx,
            recognition_rx,
            pending_restart: None,
        };

        Ok((orchestrator, handle))
    }

    /// Start the orchestrator loop
    ///
    /// This consumes the orchestrator and returns the join handle for the
    /// worker thread.
    pub fn start(self) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("gigvoice-orchestrator".into())
            .spawn(move || self.run())
            .map_err(|e| GigError::IOError(format!("Failed to spawn orchestrator: {}", e)))
    }

    fn run(mut self) {
        info!("Orchestrator started with {} gigs", self.state.store.len());
        self.publish_listings();

        let command_rx = self.command_rx.clone();
        let mut recognition_rx = self.recognition_rx.clone();

        loop {
            let mut feed_closed = false;
            let timer = match self.pending_restart {
                Some((deadline, _)) => at(deadline),
                None => never(),
            };

            select! {
                recv(command_rx) -> msg => match msg {
                    Ok(OrchestratorCommand::Shutdown) => {
                        info!("Orchestrator shutdown requested");
                        break;
                    }
                    Ok(cmd) => self.handle_command(cmd),
                    Err(_) => {
                        warn!("Command channel disconnected");
                        break;
                    }
                },
                recv(recognition_rx) -> msg => match msg {
                    Ok(event) => self.handle_recognition(event),
                    Err(_) => {
                        debug!("Recognition feed closed");
                        feed_closed = true;
                    }
                },
                recv(timer) -> _ => {
                    if let Some((_, generation)) = self.pending_restart.take() {
                        let voice_before = self.state.voice_mode;
                        self.state.restart_due(generation);
                        self.publish_voice_mode_if_changed(voice_before);
                    }
                },
            }

            if feed_closed {
                recognition_rx = never();
            }
        }

        self.state.shutdown_voice();
        self.emit(OrchestratorEvent::Shutdown);
        info!("Orchestrator stopped");
    }

    fn handle_command(&mut self, cmd: OrchestratorCommand) {
        match cmd {
            OrchestratorCommand::ToggleVoice => {
                let before = self.state.voice_mode;
                let after = self.state.toggle_voice();
                if before != after {
                    self.emit_last_reply();
                    self.emit(OrchestratorEvent::VoiceMode(after));
                }
                if !after {
                    self.pending_restart = None;
                }
            }
            OrchestratorCommand::SendText(text) => {
                if !text.trim().is_empty() {
                    self.handle_transcript(&text);
                }
            }
            OrchestratorCommand::SubmitForm(form) => match self.state.submit_form(form) {
                Ok(id) => {
                    debug!("Posted gig {}", id);
                    self.emit_last_reply();
                    self.emit(OrchestratorEvent::FormVisible(false));
                    self.publish_listings();
                }
                Err(e) => {
                    warn!("Form rejected: {}", e);
                    self.emit(OrchestratorEvent::FormRejected(e.user_message()));
                }
            },
            OrchestratorCommand::DeleteGig(id) => {
                if self.state.delete_gig(id) {
                    self.emit_last_reply();
                    self.publish_listings();
                }
            }
            OrchestratorCommand::Shutdown => {}
        }
    }

    fn handle_recognition(&mut self, event: RecognitionEvent) {
        let voice_before = self.state.voice_mode;
        let count_before = self.state.store.len();
        let form_before = self.state.show_form;

        match self.state.handle_recognition_event(event) {
            VoiceStep::Handled {
                transcript,
                outcome,
            } => {
                self.emit(OrchestratorEvent::Transcript(transcript));
                if let Some(reply) = outcome.reply {
                    self.emit(OrchestratorEvent::Reply(reply));
                }
            }
            VoiceStep::Restart(PendingRestart { delay, generation }) => {
                debug!("Restart {} armed in {:?}", generation, delay);
                self.pending_restart = Some((Instant::now() + delay, generation));
            }
            VoiceStep::VoiceOff | VoiceStep::Nothing => {}
        }

        self.publish_changes(count_before, form_before);
        self.publish_voice_mode_if_changed(voice_before);
    }

    fn handle_transcript(&mut self, text: &str) {
        let count_before = self.state.store.len();
        let form_before = self.state.show_form;

        let outcome = self.state.handle_transcript(text);
        self.emit(OrchestratorEvent::Transcript(text.to_string()));
        if let Some(reply) = outcome.reply {
            self.emit(OrchestratorEvent::Reply(reply));
        }
        self.publish_changes(count_before, form_before);
    }

    fn publish_changes(&mut self, count_before: usize, form_before: bool) {
        if self.state.store.len() != count_before {
            self.publish_listings();
        }
        if self.state.show_form != form_before {
            self.emit(OrchestratorEvent::FormVisible(self.state.show_form));
        }
    }

    fn publish_voice_mode_if_changed(&mut self, before: bool) {
        if self.state.voice_mode != before {
            self.emit(OrchestratorEvent::VoiceMode(self.state.voice_mode));
            if !self.state.voice_mode {
                self.pending_restart = None;
            }
        }
    }

    fn publish_listings(&self) {
        self.emit(OrchestratorEvent::Listings(self.state.store.gigs().to_vec()));
    }

    fn emit_last_reply(&self) {
        if let Some(message) = self.state.chat.last().filter(|m| m.is_bot()) {
            self.emit(OrchestratorEvent::Reply(message.text));
        }
    }

    fn emit(&self, event: OrchestratorEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Builder for creating an orchestrator
pub struct OrchestratorBuilder {
    config: AppConfig,
    storage: Option<Box<dyn DurableStorage>>,
    recognition: Option<Box<dyn RecognitionEngine>>,
    synthesis: Option<Box<dyn SynthesisEngine>>,
}

impl OrchestratorBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            storage: None,
            recognition: None,
            synthesis: None,
        }
    }

    /// Set the complete configuration
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_storage(mut self, storage: impl DurableStorage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    pub fn with_recognition(mut self, engine: impl RecognitionEngine + 'static) -> Self {
        self.recognition = Some(Box::new(engine));
        self
    }

    pub fn with_synthesis(mut self, engine: impl SynthesisEngine + 'static) -> Self {
        self.synthesis = Some(Box::new(engine));
        self
    }

    /// Build the orchestrator
    ///
    /// Missing pieces fall back to in-memory storage and silent synthesis.
    pub fn build(self) -> Result<(Orchestrator, OrchestratorHandle)> {
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(crate::gigs::MemoryStorage::new()));
        let synthesis = self
            .synthesis
            .unwrap_or_else(|| Box::new(crate::speech::NullSynthesis));
        Orchestrator::new(self.config, storage, self.recognition, synthesis)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
