//! Comparison page controller.
//!
//! Orchestrates the page lifecycle: resolves the session, drives the frame
//! host, routes host events, owns the lock toggle, and keeps each slot's
//! loading/error surface honest. No callback here lets an error escape the
//! event boundary; failures become logs and per-slot UI state.

use envlens_dom::{DomEvent, DomHost, NodeId, NodeTag};
use envlens_proto::FrameMessage;
use envlens_types::error::Result;
use envlens_types::{ComparisonSession, SlotId};

use crate::frame_host::{FrameHost, SlotEvent};
use crate::session::{resolve_session, SessionSource};
use crate::sync::{ScrollSynchronizer, SyncState};
use crate::watchdog::Watchdog;

const LOCK_LABEL: &str = "Lock Scroll";
const UNLOCK_LABEL: &str = "Unlock Scroll";
const MISSING_INPUT_MESSAGE: &str =
    "Missing environment URLs. Start the comparison again from the environment list.";
const RESTART_FAILED_MESSAGE: &str =
    "The comparison session could not be restored. Reload the page to continue.";

/// The per-slot page chrome: labels, spinner, inline error surface.
#[derive(Debug)]
struct SlotUi {
    frame_container: NodeId,
    name_label: NodeId,
    url_label: NodeId,
    spinner: NodeId,
    error_box: NodeId,
}

fn build_slot_ui(dom: &mut dyn DomHost) -> SlotUi {
    let root = dom.create_element(NodeTag::Container);
    let name_label = dom.create_element(NodeTag::Div);
    let url_label = dom.create_element(NodeTag::Div);
    let spinner = dom.create_element(NodeTag::Div);
    let error_box = dom.create_element(NodeTag::Div);
    let frame_container = dom.create_element(NodeTag::Container);
    for (node, class) in [
        (name_label, "env-name"),
        (url_label, "env-url"),
        (spinner, "loading-indicator"),
        (error_box, "error-message"),
        (frame_container, "env-frame-container"),
    ] {
        let _ = dom.set_attribute(node, "class", class);
        let _ = dom.append_child(root, node);
    }
    let _ = dom.set_visible(spinner, false);
    let _ = dom.set_visible(error_box, false);
    SlotUi {
        frame_container,
        name_label,
        url_label,
        spinner,
        error_box,
    }
}

/// Top-level orchestrator of the comparison page.
#[derive(Debug)]
pub struct CompareController {
    session: Option<ComparisonSession>,
    frames: FrameHost,
    sync: ScrollSynchronizer,
    ui: [SlotUi; 2],
    lock_button: NodeId,
    watchdog: Watchdog,
}

impl CompareController {
    /// Build the page scaffold (slot chrome and lock toggle) on the host.
    pub fn new(dom: &mut dyn DomHost) -> Self {
        let ui = [build_slot_ui(dom), build_slot_ui(dom)];
        let lock_button = dom.create_element(NodeTag::Div);
        let _ = dom.set_attribute(lock_button, "class", "lock-toggle");
        let _ = dom.set_text(lock_button, LOCK_LABEL);
        let frames = FrameHost::new(ui[0].frame_container, ui[1].frame_container);
        Self {
            session: None,
            frames,
            sync: ScrollSynchronizer::new(),
            ui,
            lock_button,
            watchdog: Watchdog::new(),
        }
    }

    /// Resolve the session and start both loads. With missing input, both
    /// slots show the inline error and no load is attempted.
    pub fn init(&mut self, dom: &mut dyn DomHost, source: SessionSource<'_>) -> Result<()> {
        let session = match resolve_session(source) {
            Ok(session) => session,
            Err(e) => {
                log::error!("comparison init failed: {e}");
                self.show_both_slots_error(dom, MISSING_INPUT_MESSAGE);
                return Err(e);
            }
        };
        for slot in SlotId::BOTH {
            let side = session.side(slot);
            let _ = dom.set_text(self.ui[slot.index()].name_label, &side.name);
            let _ = dom.set_text(self.ui[slot.index()].url_label, side.url.as_str());
        }
        self.session = Some(session);
        self.load_both(dom);
        Ok(())
    }

    fn load_both(&mut self, dom: &mut dyn DomHost) {
        let Some(session) = self.session.clone() else {
            return;
        };
        for slot in SlotId::BOTH {
            let side = session.side(slot).clone();
            self.show_loading(dom, slot);
            if let Err(e) = self
                .frames
                .load_slot(dom, slot, &side.url, Some(&side.name))
            {
                log::error!("{slot}: load failed to start: {e}");
                self.apply_slot_event(dom, &SlotEvent::Failed(slot, e.to_string()));
            }
        }
    }

    /// Route one host event. Never lets an error escape.
    pub fn handle_event(&mut self, dom: &mut dyn DomHost, event: DomEvent) {
        match event {
            DomEvent::FrameLoaded { frame } => {
                if let Some(slot_event) = self.frames.on_frame_loaded(dom, frame) {
                    self.apply_slot_event(dom, &slot_event);
                }
            }
            DomEvent::FrameFailed { frame, reason } => {
                if let Some(slot_event) = self.frames.on_frame_failed(frame, &reason) {
                    self.apply_slot_event(dom, &slot_event);
                }
            }
            DomEvent::Scrolled { node } => self.sync.on_scrolled(dom, node),
            DomEvent::Wheel { delta_y, .. } => {
                self.sync.on_wheel(dom, &self.frames, delta_y);
            }
            DomEvent::Message { frame, message } => self.on_message(dom, frame, message),
            DomEvent::HostInvalidated => {
                if let Err(e) = self.restart(dom) {
                    log::error!("restart abandoned: {e}");
                }
            }
        }
    }

    /// Periodic housekeeping: load timeouts and queued sync writes.
    pub fn tick(&mut self, dom: &mut dyn DomHost) {
        for slot_event in self.frames.poll_timeouts(dom) {
            self.apply_slot_event(dom, &slot_event);
        }
        self.sync.tick(dom);
    }

    /// Flip the lock. Reflects only on/off on the control -- the chosen
    /// strategy stays an implementation detail.
    pub fn toggle_lock(&mut self, dom: &mut dyn DomHost) -> bool {
        if self.sync.is_enabled() {
            self.sync.disable(dom, &self.frames);
            let _ = dom.set_attribute(self.lock_button, "class", "lock-toggle");
            let _ = dom.set_text(self.lock_button, LOCK_LABEL);
            false
        } else {
            self.sync.enable(dom, &self.frames);
            let _ = dom.set_attribute(self.lock_button, "class", "lock-toggle active");
            let _ = dom.set_text(self.lock_button, UNLOCK_LABEL);
            true
        }
    }

    /// Load a new URL into one slot. An active lock session is reset
    /// first; the strategy never survives a reload.
    pub fn reload_slot(
        &mut self,
        dom: &mut dyn DomHost,
        slot: SlotId,
        url: &url::Url,
        name: Option<&str>,
    ) -> Result<()> {
        if self.sync.is_enabled() {
            self.sync.disable(dom, &self.frames);
            let _ = dom.set_attribute(self.lock_button, "class", "lock-toggle");
            let _ = dom.set_text(self.lock_button, LOCK_LABEL);
        }
        self.show_loading(dom, slot);
        self.frames.load_slot(dom, slot, url, name)
    }

    fn on_message(&mut self, dom: &mut dyn DomHost, frame: NodeId, message: FrameMessage) {
        let Some(slot) = self.frames.slot_of_frame(frame) else {
            log::debug!("message from unknown frame {frame} dropped");
            return;
        };
        match &message {
            FrameMessage::Loaded { content_height, .. } => {
                if let Some(slot_event) = self.frames.on_loaded_message(slot, *content_height) {
                    self.apply_slot_event(dom, &slot_event);
                }
            }
            FrameMessage::ScrollAbsolute { .. } | FrameMessage::ScrollDelta { .. } => {
                self.sync.on_relay_message(dom, &self.frames, slot, &message);
            }
            // Lock state flows controller -> wrapper only.
            FrameMessage::LockState { .. } => {}
        }
    }

    /// Update exactly one slot's UI for its terminal load event.
    fn apply_slot_event(&mut self, dom: &mut dyn DomHost, event: &SlotEvent) {
        match event {
            SlotEvent::Loaded(slot) => {
                log::info!("{slot}: loaded");
                let ui = &self.ui[slot.index()];
                let _ = dom.set_visible(ui.spinner, false);
                let _ = dom.set_visible(ui.error_box, false);
            }
            SlotEvent::Failed(slot, reason) => {
                log::warn!("{slot}: failed: {reason}");
                let ui = &self.ui[slot.index()];
                let _ = dom.set_visible(ui.spinner, false);
                let _ = dom.set_text(ui.error_box, reason);
                let _ = dom.set_visible(ui.error_box, true);
            }
        }
    }

    fn show_loading(&mut self, dom: &mut dyn DomHost, slot: SlotId) {
        let ui = &self.ui[slot.index()];
        let _ = dom.set_visible(ui.spinner, true);
        let _ = dom.set_visible(ui.error_box, false);
    }

    fn show_both_slots_error(&mut self, dom: &mut dyn DomHost, message: &str) {
        for slot in SlotId::BOTH {
            let ui = &self.ui[slot.index()];
            let _ = dom.set_visible(ui.spinner, false);
            let _ = dom.set_text(ui.error_box, message);
            let _ = dom.set_visible(ui.error_box, true);
        }
    }

    /// Tear down and rebuild the session after a host invalidation, within
    /// the watchdog's budget.
    fn restart(&mut self, dom: &mut dyn DomHost) -> Result<()> {
        let attempt = match self.watchdog.request_restart() {
            Ok(n) => n,
            Err(e) => {
                self.show_both_slots_error(dom, RESTART_FAILED_MESSAGE);
                return Err(e);
            }
        };
        log::warn!(
            "host invalidated; restarting session (attempt {attempt}, {} left)",
            self.watchdog.remaining()
        );
        self.sync.disable(dom, &self.frames);
        let _ = dom.set_attribute(self.lock_button, "class", "lock-toggle");
        let _ = dom.set_text(self.lock_button, LOCK_LABEL);
        for slot in SlotId::BOTH {
            if let Err(e) = self.frames.teardown_slot(dom, slot) {
                log::warn!("{slot}: teardown during restart failed: {e}");
            }
        }
        self.load_both(dom);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    pub fn frames(&self) -> &FrameHost {
        &self.frames
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    pub fn is_locked(&self) -> bool {
        self.sync.is_enabled()
    }

    pub fn session(&self) -> Option<&ComparisonSession> {
        self.session.as_ref()
    }

    pub fn lock_button(&self) -> NodeId {
        self.lock_button
    }

    /// Slot chrome nodes, exposed for the embedding page and tests.
    pub fn slot_spinner(&self, slot: SlotId) -> NodeId {
        self.ui[slot.index()].spinner
    }

    pub fn slot_error_box(&self, slot: SlotId) -> NodeId {
        self.ui[slot.index()].error_box
    }

    pub fn slot_name_label(&self, slot: SlotId) -> NodeId {
        self.ui[slot.index()].name_label
    }

    /// Node id of a slot's transform wrapper while that strategy is live.
    pub fn transform_wrapper(&self, slot: SlotId) -> Option<NodeId> {
        self.sync.transform_wrapper(slot)
    }
}
