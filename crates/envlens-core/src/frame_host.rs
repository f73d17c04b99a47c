//! Frame host: the two page surfaces and their load lifecycle.
//!
//! Owns both [`FrameSlot`]s exclusively. The synchronizer and controller
//! reach frames only through the accessors here, so a slot can be reloaded
//! with a different URL (and a different origin character) without anyone
//! holding a stale handle.

use url::Url;

use envlens_dom::{DomHost, NodeId, NodeTag, StyleProp};
use envlens_types::error::{EnvlensError, Result};
use envlens_types::SlotId;

/// A navigation that has not produced a document within this bound failed.
pub const LOAD_TIMEOUT_MS: u64 = 60_000;

/// Measured content heights are floored here so tiny or unmeasurable pages
/// still get a usable scroll range.
pub const MIN_CONTENT_HEIGHT_PX: f64 = 1000.0;

/// Load lifecycle of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No frame present.
    Empty,
    /// Navigation in flight.
    Pending,
    /// Document arrived.
    Loaded,
    /// Navigation failed or timed out.
    Error,
}

/// Result of probing a slot's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginAccess {
    SameOrigin,
    CrossOrigin,
    /// The frame has not finished loading (or the probe failed oddly).
    Unknown,
}

/// Terminal per-slot load notifications delivered to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotEvent {
    Loaded(SlotId),
    Failed(SlotId, String),
}

#[derive(Debug)]
struct FrameSlot {
    slot: SlotId,
    container: NodeId,
    frame: Option<NodeId>,
    url: Option<Url>,
    display_name: Option<String>,
    state: LoadState,
    started_ms: u64,
    content_height: Option<f64>,
}

impl FrameSlot {
    fn new(slot: SlotId, container: NodeId) -> Self {
        Self {
            slot,
            container,
            frame: None,
            url: None,
            display_name: None,
            state: LoadState::Empty,
            started_ms: 0,
            content_height: None,
        }
    }
}

/// Owner of the two comparison frames.
#[derive(Debug)]
pub struct FrameHost {
    slots: [FrameSlot; 2],
}

impl FrameHost {
    /// Build a host over the two fixed slot containers.
    pub fn new(env1_container: NodeId, env2_container: NodeId) -> Self {
        Self {
            slots: [
                FrameSlot::new(SlotId::Env1, env1_container),
                FrameSlot::new(SlotId::Env2, env2_container),
            ],
        }
    }

    pub fn container(&self, slot: SlotId) -> NodeId {
        self.slots[slot.index()].container
    }

    pub fn frame(&self, slot: SlotId) -> Option<NodeId> {
        self.slots[slot.index()].frame
    }

    pub fn url(&self, slot: SlotId) -> Option<&Url> {
        self.slots[slot.index()].url.as_ref()
    }

    pub fn display_name(&self, slot: SlotId) -> Option<&str> {
        self.slots[slot.index()].display_name.as_deref()
    }

    pub fn load_state(&self, slot: SlotId) -> LoadState {
        self.slots[slot.index()].state
    }

    /// Last measured content height, floored to [`MIN_CONTENT_HEIGHT_PX`].
    pub fn content_height(&self, slot: SlotId) -> Option<f64> {
        self.slots[slot.index()].content_height
    }

    /// The slot a frame node belongs to, if any.
    pub fn slot_of_frame(&self, node: NodeId) -> Option<SlotId> {
        self.slots
            .iter()
            .find(|s| s.frame == Some(node))
            .map(|s| s.slot)
    }

    /// Load a URL into a slot. Any previous frame in the slot is torn down
    /// first; the slot re-enters `Pending` and will produce exactly one
    /// terminal [`SlotEvent`] for this navigation.
    pub fn load_slot(
        &mut self,
        dom: &mut dyn DomHost,
        slot: SlotId,
        url: &Url,
        display_name: Option<&str>,
    ) -> Result<()> {
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(EnvlensError::MissingInput(format!(
                "{slot} url '{url}' is not loadable"
            )));
        }
        self.teardown_slot(dom, slot)?;

        let container = self.container(slot);
        let frame = dom.create_element(NodeTag::Frame);
        dom.append_child(container, frame)?;
        dom.set_style(frame, StyleProp::Width, "100%")?;
        dom.set_style(frame, StyleProp::Height, "100%")?;
        dom.navigate_frame(frame, url)?;

        let s = &mut self.slots[slot.index()];
        s.frame = Some(frame);
        s.url = Some(url.clone());
        s.display_name = display_name.map(str::to_string);
        s.state = LoadState::Pending;
        s.started_ms = dom.now_ms();
        s.content_height = None;
        log::info!("{slot}: loading {url}");
        Ok(())
    }

    /// A frame reported load completion. Returns the slot event for the
    /// first completion of a pending navigation; stale or duplicate load
    /// events produce nothing.
    pub fn on_frame_loaded(&mut self, dom: &mut dyn DomHost, node: NodeId) -> Option<SlotEvent> {
        let slot = self.slot_of_frame(node)?;
        let s = &mut self.slots[slot.index()];
        if s.state != LoadState::Pending {
            return None;
        }
        s.state = LoadState::Loaded;
        s.content_height = match dom.frame_metrics(node) {
            Ok(metrics) => Some(metrics.max_height().max(MIN_CONTENT_HEIGHT_PX)),
            Err(EnvlensError::CrossOrigin(reason)) => {
                log::debug!("{slot}: content height unavailable: {reason}");
                None
            }
            Err(e) => {
                log::warn!("{slot}: content height measurement failed: {e}");
                None
            }
        };
        Some(SlotEvent::Loaded(slot))
    }

    /// A frame reported a navigation failure.
    pub fn on_frame_failed(&mut self, node: NodeId, reason: &str) -> Option<SlotEvent> {
        let slot = self.slot_of_frame(node)?;
        let s = &mut self.slots[slot.index()];
        if s.state != LoadState::Pending {
            return None;
        }
        s.state = LoadState::Error;
        Some(SlotEvent::Failed(slot, reason.to_string()))
    }

    /// A wrapper's companion reported its page loaded, possibly with a
    /// measured height. Only a pending slot transitions; a later report
    /// just refreshes the height.
    pub fn on_loaded_message(
        &mut self,
        slot: SlotId,
        content_height: Option<f64>,
    ) -> Option<SlotEvent> {
        let s = &mut self.slots[slot.index()];
        if let Some(h) = content_height {
            s.content_height = Some(h.max(MIN_CONTENT_HEIGHT_PX));
        }
        if s.state != LoadState::Pending {
            return None;
        }
        s.state = LoadState::Loaded;
        Some(SlotEvent::Loaded(slot))
    }

    /// Fail any navigation that has exceeded [`LOAD_TIMEOUT_MS`].
    pub fn poll_timeouts(&mut self, dom: &dyn DomHost) -> Vec<SlotEvent> {
        let now = dom.now_ms();
        let mut events = Vec::new();
        for s in &mut self.slots {
            if s.state == LoadState::Pending && now.saturating_sub(s.started_ms) >= LOAD_TIMEOUT_MS
            {
                s.state = LoadState::Error;
                let e = EnvlensError::LoadTimeout {
                    timeout_ms: LOAD_TIMEOUT_MS,
                };
                events.push(SlotEvent::Failed(s.slot, e.to_string()));
            }
        }
        events
    }

    /// Probe the slot's document accessibility. Always a fresh read: a page
    /// can navigate itself across an origin boundary after the initial
    /// load, so the answer is never cached.
    pub fn origin_access(&self, dom: &dyn DomHost, slot: SlotId) -> OriginAccess {
        let s = &self.slots[slot.index()];
        if s.state != LoadState::Loaded {
            return OriginAccess::Unknown;
        }
        let Some(frame) = s.frame else {
            return OriginAccess::Unknown;
        };
        match dom.frame_metrics(frame) {
            Ok(_) => OriginAccess::SameOrigin,
            Err(EnvlensError::CrossOrigin(_)) => OriginAccess::CrossOrigin,
            Err(e) => {
                log::debug!("{slot}: origin probe inconclusive: {e}");
                OriginAccess::Unknown
            }
        }
    }

    /// Remove the slot's frame and any wrapper elements around it,
    /// returning the slot to an empty, reusable state.
    pub fn teardown_slot(&mut self, dom: &mut dyn DomHost, slot: SlotId) -> Result<()> {
        let container = self.container(slot);
        let s = &mut self.slots[slot.index()];
        if let Some(frame) = s.frame.take() {
            let wrapper = match dom.parent(frame) {
                Ok(Some(p)) if p != container => Some(p),
                _ => None,
            };
            if dom.contains(frame) {
                dom.remove_element(frame)?;
            }
            if let Some(w) = wrapper
                && dom.contains(w)
                && let Err(e) = dom.remove_element(w)
            {
                log::warn!("{slot}: wrapper removal failed: {e}");
            }
        }
        s.url = None;
        s.display_name = None;
        s.state = LoadState::Empty;
        s.content_height = None;
        s.started_ms = 0;
        Ok(())
    }
}
