//! Relay strategy: cross-origin scroll sync over the message channel.
//!
//! Each frame's wrapper document runs companion logic that reports local
//! scroll activity to the controller; the controller relays each report,
//! unchanged, to the opposite wrapper. Everything here degrades by
//! dropping and logging -- a relay must never throw out of the event path.

use envlens_dom::DomHost;
use envlens_proto::FrameMessage;
use envlens_types::error::Result;
use envlens_types::SlotId;

use crate::frame_host::FrameHost;

/// Try to install companion logic in both wrappers. `false` means at least
/// one page cannot host it and the caller should fall back.
pub fn install(dom: &mut dyn DomHost, frames: &FrameHost) -> Result<bool> {
    for slot in SlotId::BOTH {
        let Some(frame) = frames.frame(slot) else {
            return Ok(false);
        };
        if !dom.install_companion(frame, slot)? {
            log::debug!("{slot}: companion injection not possible");
            return Ok(false);
        }
    }
    Ok(true)
}

/// Broadcast the lock state to both wrappers so they start or stop
/// emitting.
pub fn broadcast_lock(dom: &mut dyn DomHost, frames: &FrameHost, active: bool) {
    let message = FrameMessage::LockState { active };
    for slot in SlotId::BOTH {
        let Some(frame) = frames.frame(slot) else {
            continue;
        };
        if let Err(e) = dom.post_message(frame, &message) {
            log::warn!("{slot}: lock-state broadcast failed: {e}");
        }
    }
}

/// Forward a scroll report from one wrapper to the other, verbatim. A
/// missing or failing target drops the message.
pub fn relay(dom: &mut dyn DomHost, frames: &FrameHost, from: SlotId, message: &FrameMessage) {
    let target = from.other();
    let Some(frame) = frames.frame(target) else {
        log::warn!("relay dropped: {target} has no frame");
        return;
    };
    if let Err(e) = dom.post_message(frame, message) {
        log::warn!("relay to {target} dropped: {e}");
    }
}
