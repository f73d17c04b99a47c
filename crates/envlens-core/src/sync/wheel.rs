//! Wheel fallback: degraded relative-delta sync for frames that accept
//! neither document reads nor companion injection.
//!
//! The top-level document's wheel events are consumed and turned into
//! `scrollBy` calls on both content windows. Position accuracy is not a
//! goal here; the two pages stay roughly together as long as their content
//! heights are comparable.

use envlens_dom::DomHost;
use envlens_types::SlotId;

use crate::frame_host::FrameHost;

/// Wheel deltas are scaled up to compensate for long-page feel.
pub const WHEEL_SCROLL_FACTOR: f64 = 1.5;

/// Re-entrancy window for the wheel path.
pub const WHEEL_GUARD_MS: u64 = 30;

/// Apply a wheel delta to both frames. Per-frame failures are logged and
/// dropped; one frame going dark must not stop the other.
pub fn scroll_both(dom: &mut dyn DomHost, frames: &FrameHost, delta_y: f64) {
    let amount = delta_y * WHEEL_SCROLL_FACTOR;
    for slot in SlotId::BOTH {
        let Some(frame) = frames.frame(slot) else {
            continue;
        };
        if let Err(e) = dom.frame_scroll_by(frame, 0.0, amount) {
            log::warn!("{slot}: wheel fallback scroll dropped: {e}");
        }
    }
}
