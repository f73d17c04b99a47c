//! Cross-frame messenger protocol for envlens.
//!
//! Defines the structured messages carried over the frame-to-parent
//! post-message channel and the companion state machine that runs inside
//! each wrapper document: it forwards local scroll activity as messages and
//! applies remote ones under a re-entrancy guard.

pub mod companion;
pub mod message;

pub use companion::{Companion, ScrollCommand};
pub use message::FrameMessage;
