//! Wrapper-document companion: the relay strategy's far end.
//!
//! One `Companion` runs per wrapper document. While the lock is active it
//! forwards local scroll activity to the parent as [`FrameMessage`]s and
//! applies remote scroll messages to its own window, guarded so a
//! programmatic write is never re-emitted as a fresh local scroll.

use envlens_types::SlotId;

use crate::message::FrameMessage;

/// Minimum interval between outbound scroll messages.
pub const EMIT_THROTTLE_MS: u64 = 50;

/// Window after applying a remote update during which local scroll events
/// are treated as echoes and suppressed.
pub const APPLY_GUARD_MS: u64 = 50;

/// A scroll operation the wrapper must perform on its own window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollCommand {
    /// `window.scrollTo(x, y)` -- absolute, idempotent.
    To { x: f64, y: f64 },
    /// `window.scrollBy(dx, dy)` -- relative.
    By { dx: f64, dy: f64 },
}

/// Per-wrapper relay state machine.
#[derive(Debug, Clone)]
pub struct Companion {
    frame_id: SlotId,
    locked: bool,
    /// Local events before this instant are echoes of a remote apply.
    guard_until_ms: u64,
    last_emit_ms: Option<u64>,
}

impl Companion {
    pub fn new(frame_id: SlotId) -> Self {
        Self {
            frame_id,
            locked: false,
            guard_until_ms: 0,
            last_emit_ms: None,
        }
    }

    pub fn frame_id(&self) -> SlotId {
        self.frame_id
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The load notification sent to the parent once the hosted page is up.
    pub fn loaded(&self, content_height: Option<f64>) -> FrameMessage {
        FrameMessage::Loaded {
            frame_id: self.frame_id,
            content_height,
        }
    }

    /// Local scroll event (absolute position). Returns the message to post
    /// to the parent, or `None` when emission is gated.
    pub fn on_scroll(&mut self, now_ms: u64, x: f64, y: f64) -> Option<FrameMessage> {
        if !self.emission_allowed(now_ms) {
            return None;
        }
        self.last_emit_ms = Some(now_ms);
        Some(FrameMessage::ScrollAbsolute {
            frame_id: self.frame_id,
            x,
            y,
        })
    }

    /// Local wheel event (delta).
    pub fn on_wheel(&mut self, now_ms: u64, dx: f64, dy: f64) -> Option<FrameMessage> {
        if !self.emission_allowed(now_ms) {
            return None;
        }
        self.last_emit_ms = Some(now_ms);
        Some(FrameMessage::ScrollDelta {
            frame_id: self.frame_id,
            dx,
            dy,
        })
    }

    /// Local touch-move event (vertical delta only).
    pub fn on_touch_move(&mut self, now_ms: u64, dy: f64) -> Option<FrameMessage> {
        self.on_wheel(now_ms, 0.0, dy)
    }

    /// Handle a message from the parent. Scroll messages yield the command
    /// to run on the wrapper's own window; lock-state messages update the
    /// gate; anything else is ignored.
    pub fn handle_message(&mut self, now_ms: u64, msg: &FrameMessage) -> Option<ScrollCommand> {
        match msg {
            FrameMessage::LockState { active } => {
                self.locked = *active;
                if !self.locked {
                    self.last_emit_ms = None;
                }
                None
            }
            FrameMessage::ScrollAbsolute { x, y, .. } => {
                if !self.locked {
                    return None;
                }
                self.guard_until_ms = now_ms + APPLY_GUARD_MS;
                Some(ScrollCommand::To { x: *x, y: *y })
            }
            FrameMessage::ScrollDelta { dx, dy, .. } => {
                if !self.locked {
                    return None;
                }
                self.guard_until_ms = now_ms + APPLY_GUARD_MS;
                Some(ScrollCommand::By { dx: *dx, dy: *dy })
            }
            FrameMessage::Loaded { .. } => None,
        }
    }

    fn emission_allowed(&self, now_ms: u64) -> bool {
        if !self.locked {
            return false;
        }
        if now_ms < self.guard_until_ms {
            // Echo of a remote apply.
            return false;
        }
        match self.last_emit_ms {
            Some(last) => now_ms.saturating_sub(last) >= EMIT_THROTTLE_MS,
            None => true,
        }
    }
}
