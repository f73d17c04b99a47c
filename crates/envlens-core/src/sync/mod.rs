//! Scroll synchronizer: the lock's core state machine.
//!
//! `Disabled → StrategySelection → {Transform | Relay | WheelFallback} →
//! Disabled`. Strategy selection runs exactly once per enable, from fresh
//! origin probes, and the choice is held until the next disable -- origin
//! accessibility changing mid-session never hot-swaps the strategy.
//!
//! Ordering is best-effort: scroll events landing inside the re-entrancy
//! guard window are dropped, and a trailing realignment write scheduled at
//! guard expiry catches the wrappers up. Disable is immediate -- bumping the
//! session generation invalidates every queued write.

pub mod relay;
pub mod transform;
pub mod wheel;

use envlens_dom::{DomHost, NodeId};
use envlens_proto::FrameMessage;
use envlens_types::SlotId;

use crate::frame_host::{FrameHost, OriginAccess};
use transform::TransformSync;

/// Re-entrancy guard window for the transform strategy.
pub const GUARD_MS: u64 = 15;

/// Wrapper offsets within this distance count as aligned.
pub const SCROLL_TOLERANCE_PX: f64 = 1.0;

/// The synchronization mechanism chosen for the current lock session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Lock disabled; no strategy active.
    #[default]
    None,
    /// Same-origin wrapper/translate sync.
    Transform,
    /// Cross-origin message relay through companion wrappers.
    Relay,
    /// Degraded direct wheel-delta sync.
    WheelFallback,
}

/// Externally visible synchronizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncState {
    pub enabled: bool,
    pub strategy: Strategy,
}

/// A queued catch-up write. Carries the generation of the lock session
/// that scheduled it; a stale generation means the session was disabled
/// and the write must never run.
#[derive(Debug, Clone, Copy)]
struct PendingRealign {
    due_ms: u64,
    generation: u64,
    source: SlotId,
}

/// The scroll-lock state machine.
#[derive(Debug, Default)]
pub struct ScrollSynchronizer {
    enabled: bool,
    strategy: Strategy,
    generation: u64,
    guard_until_ms: u64,
    pending: Vec<PendingRealign>,
    transform: Option<TransformSync>,
}

impl ScrollSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        SyncState {
            enabled: self.enabled,
            strategy: self.strategy,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Enable the lock. Probes both slots fresh, picks a strategy, and
    /// holds it for the whole session. Never fails outward: a strategy
    /// whose setup breaks falls back to the wheel path.
    pub fn enable(&mut self, dom: &mut dyn DomHost, frames: &FrameHost) -> Strategy {
        if self.enabled {
            log::debug!("enable ignored: lock already active");
            return self.strategy;
        }
        let env1 = frames.origin_access(dom, SlotId::Env1);
        let env2 = frames.origin_access(dom, SlotId::Env2);

        let strategy = if env1 == OriginAccess::SameOrigin && env2 == OriginAccess::SameOrigin {
            match TransformSync::install(dom, frames) {
                Ok(installed) => {
                    self.transform = Some(installed);
                    Strategy::Transform
                }
                Err(e) => {
                    log::warn!("transform setup failed, using wheel fallback: {e}");
                    Strategy::WheelFallback
                }
            }
        } else {
            match relay::install(dom, frames) {
                Ok(true) => {
                    relay::broadcast_lock(dom, frames, true);
                    Strategy::Relay
                }
                Ok(false) => Strategy::WheelFallback,
                Err(e) => {
                    log::warn!("relay setup failed, using wheel fallback: {e}");
                    Strategy::WheelFallback
                }
            }
        };

        self.enabled = true;
        self.strategy = strategy;
        log::info!("scroll lock enabled ({strategy:?})");
        strategy
    }

    /// Disable the lock, effective immediately: strategy teardown, native
    /// scrolling restored, and every queued write invalidated.
    pub fn disable(&mut self, dom: &mut dyn DomHost, frames: &FrameHost) {
        if !self.enabled {
            return;
        }
        match self.strategy {
            Strategy::Transform => {
                if let Some(installed) = self.transform.take() {
                    installed.teardown(dom);
                }
            }
            Strategy::Relay => relay::broadcast_lock(dom, frames, false),
            Strategy::WheelFallback | Strategy::None => {}
        }
        self.generation = self.generation.wrapping_add(1);
        self.pending.clear();
        self.guard_until_ms = 0;
        self.enabled = false;
        self.strategy = Strategy::None;
        log::info!("scroll lock disabled");
    }

    /// An element scrolled. Only transform wrappers are interesting here;
    /// events inside the guard window are dropped and reconciled by the
    /// trailing realignment.
    pub fn on_scrolled(&mut self, dom: &mut dyn DomHost, node: NodeId) {
        if !(self.enabled && self.strategy == Strategy::Transform) {
            return;
        }
        let Some(installed) = &self.transform else {
            return;
        };
        let Some(source) = installed.slot_for_wrapper(node) else {
            return;
        };
        let now = dom.now_ms();
        if now < self.guard_until_ms {
            log::trace!("scroll event from {source} dropped inside guard window");
            return;
        }
        self.guard_until_ms = now + GUARD_MS;
        if let Err(e) = installed.sync_from(dom, source) {
            // The guard clears on its own clock regardless.
            let e = envlens_types::EnvlensError::SyncApply(e.to_string());
            log::warn!("update dropped: {e}");
        }
        self.pending.retain(|p| p.source != source);
        self.pending.push(PendingRealign {
            due_ms: now + GUARD_MS,
            generation: self.generation,
            source,
        });
    }

    /// A wheel event over the comparison page. Returns `true` when the
    /// event was consumed (wheel-fallback sessions own the wheel).
    pub fn on_wheel(&mut self, dom: &mut dyn DomHost, frames: &FrameHost, delta_y: f64) -> bool {
        if !(self.enabled && self.strategy == Strategy::WheelFallback) {
            return false;
        }
        let now = dom.now_ms();
        if now < self.guard_until_ms {
            return true;
        }
        self.guard_until_ms = now + wheel::WHEEL_GUARD_MS;
        wheel::scroll_both(dom, frames, delta_y);
        true
    }

    /// A scroll report from one wrapper, to be relayed to the other.
    pub fn on_relay_message(
        &mut self,
        dom: &mut dyn DomHost,
        frames: &FrameHost,
        from: SlotId,
        message: &FrameMessage,
    ) {
        if !(self.enabled && self.strategy == Strategy::Relay) {
            return;
        }
        if !message.is_scroll() {
            return;
        }
        relay::relay(dom, frames, from, message);
    }

    /// Run queued realignment writes that have come due. Writes scheduled
    /// by a disabled session are discarded unconditionally.
    pub fn tick(&mut self, dom: &mut dyn DomHost) {
        if self.pending.is_empty() {
            return;
        }
        let now = dom.now_ms();
        let generation = self.generation;
        let mut due = Vec::new();
        self.pending.retain(|p| {
            if p.generation != generation {
                return false;
            }
            if p.due_ms <= now {
                due.push(p.source);
                return false;
            }
            true
        });
        if !(self.enabled && self.strategy == Strategy::Transform) {
            return;
        }
        let Some(installed) = &self.transform else {
            return;
        };
        for source in due {
            if let Err(e) = installed.sync_from(dom, source) {
                let e = envlens_types::EnvlensError::SyncApply(e.to_string());
                log::warn!("realign from {source} dropped: {e}");
            }
        }
    }

    /// Node id of a slot's transform wrapper, when that strategy is live.
    pub fn transform_wrapper(&self, slot: SlotId) -> Option<NodeId> {
        self.transform.as_ref().map(|t| t.wrapper(slot))
    }
}
