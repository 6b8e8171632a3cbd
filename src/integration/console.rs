//! Typed input for text front ends
//!
//! While voice mode is on, a typed line stands in for a finalized speech
//! result and goes through the recognition feed. Otherwise recognition is
//! idle and would drop it, so the line is sent as a text command.

use super::orchestrator::{OrchestratorCommand, OrchestratorEvent, OrchestratorHandle};
use crate::speech::{RecognitionEvent, RecognitionResult};
use crate::{GigError, Result};

#[derive(Debug, Default)]
pub struct TypedInput {
    voice_on: bool,
}

impl TypedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track voice mode from the orchestrator's events
    pub fn observe(&mut self, event: &OrchestratorEvent) {
        if let OrchestratorEvent::VoiceMode(on) = event {
            self.voice_on = *on;
        }
    }

    pub fn voice_on(&self) -> bool {
        self.voice_on
    }

    /// Submit one typed line
    pub fn submit(&self, handle: &OrchestratorHandle, line: &str) -> Result<()> {
        if !self.voice_on {
            return handle.send_command(OrchestratorCommand::SendText(line.to_string()));
        }
        handle
            .recognition_sender()
            .send(RecognitionEvent::Result(vec![RecognitionResult::final_text(
                line,
            )]))
            .map_err(|e| GigError::ChannelError(format!("Failed to send transcript: {}", e)))
    }
}
