//! State exposed to renderers
//!
//! Rendering itself lives outside this crate; this module owns the
//! application state a view reads from.

pub mod state;

pub use state::{
    AppState, DisplayLimits, PendingRestart, VoiceStep, GIG_DELETED_REPLY, GIG_POSTED_REPLY,
    VOICE_OFF_REPLY, VOICE_ON_REPLY,
};
