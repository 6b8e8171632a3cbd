//! Speech adapters around the recognition and synthesis engines
//!
//! This module provides:
//! - `SpeechInput`: keeps a continuous recognition session alive and yields transcripts
//! - `SpeechOutput`: speaks replies one at a time and mirrors them into the chat log

pub mod recognition;
pub mod synthesis;

// Re-export commonly used types
pub use recognition::{
    extract_transcript, ChannelRecognition, RecognitionConfig, RecognitionEngine,
    RecognitionErrorKind, RecognitionEvent, RecognitionOutcome, RecognitionResult, SessionState,
    SpeechInput,
};
pub use synthesis::{
    ConsoleSynthesis, MemorySynthesis, NullSynthesis, SpeechOutput, SynthesisCall,
    SynthesisConfig, SynthesisEngine, Utterance,
};
