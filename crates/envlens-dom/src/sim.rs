//! In-memory host implementation.
//!
//! `SimDom` models exactly as much of a browser as the engine exercises: an
//! element tree with inline styles, scrollable elements whose programmatic
//! writes fire scroll events, frames that load staged pages on a manual
//! clock, and wrapper documents that host [`Companion`] relay logic.
//! The entire state lives in plain maps, so tests can drive and inspect
//! every interaction deterministically.

use std::collections::{BTreeMap, VecDeque};

use envlens_proto::{Companion, FrameMessage, ScrollCommand};
use envlens_types::error::{EnvlensError, Result};
use envlens_types::SlotId;
use url::Url;

use crate::{DocumentMetrics, DomEvent, DomHost, NodeId, NodeTag, StyleProp};

/// How a staged page behaves when navigated to.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadBehavior {
    /// Load completes after the delay.
    Succeed { delay_ms: u64 },
    /// Navigation errors after the delay.
    Fail { delay_ms: u64, reason: String },
    /// Navigation never completes (exercises the load timeout).
    Hang,
}

/// Description of a page a frame can navigate to.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSpec {
    /// Scrollable content height in pixels.
    pub content_height: f64,
    /// Whether document reads from the parent throw a security error.
    pub cross_origin: bool,
    /// Whether companion relay logic can be installed for this page.
    pub companion_capable: bool,
    /// Whether `scrollTo`/`scrollBy` on the content window still work when
    /// the document itself is unreadable (same-process embedding).
    pub scriptable: bool,
    pub load: LoadBehavior,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            content_height: 2000.0,
            cross_origin: false,
            companion_capable: true,
            scriptable: true,
            load: LoadBehavior::Succeed { delay_ms: 10 },
        }
    }
}

#[derive(Debug)]
struct SimNode {
    tag: NodeTag,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    styles: BTreeMap<StyleProp, String>,
    attrs: BTreeMap<String, String>,
    text: String,
    visible: bool,
    scroll_top: f64,
}

impl SimNode {
    fn new(tag: NodeTag) -> Self {
        Self {
            tag,
            parent: None,
            children: Vec::new(),
            styles: BTreeMap::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            visible: true,
            scroll_top: 0.0,
        }
    }
}

#[derive(Debug)]
struct SimPage {
    url: Url,
    spec: PageSpec,
    loaded: bool,
    scroll_x: f64,
    scroll_y: f64,
    companion: Option<Companion>,
    /// When armed, the document becomes unreadable after this many more
    /// successful metric reads (simulated client-side navigation).
    metrics_reads_left: std::cell::Cell<Option<u32>>,
}

#[derive(Debug)]
enum PendingLoad {
    Complete { frame: NodeId },
    Fail { frame: NodeId, reason: String },
}

/// Fully in-memory [`DomHost`].
#[derive(Debug, Default)]
pub struct SimDom {
    nodes: BTreeMap<NodeId, SimNode>,
    next_id: NodeId,
    pages: BTreeMap<NodeId, SimPage>,
    staged: BTreeMap<String, PageSpec>,
    timers: Vec<(u64, PendingLoad)>,
    events: VecDeque<DomEvent>,
    now_ms: u64,
    viewport_height: f64,
    /// Programmatic scroll writes performed by the engine (spy for tests).
    scroll_writes: usize,
}

impl SimDom {
    pub fn new() -> Self {
        Self {
            viewport_height: 800.0,
            ..Self::default()
        }
    }

    pub fn with_viewport(mut self, height: f64) -> Self {
        self.viewport_height = height;
        self
    }

    /// Register the page served at `url`.
    pub fn stage_page(&mut self, url: &str, spec: PageSpec) {
        self.staged.insert(url.to_string(), spec);
    }

    /// Advance the clock, completing any due navigations.
    pub fn advance(&mut self, ms: u64) {
        let target = self.now_ms + ms;
        loop {
            let due = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, (at, _))| *at <= target)
                .min_by_key(|(_, (at, _))| *at)
                .map(|(i, (at, _))| (i, *at));
            let Some((idx, at)) = due else { break };
            self.now_ms = at;
            let (_, pending) = self.timers.remove(idx);
            match pending {
                PendingLoad::Complete { frame } => {
                    if let Some(page) = self.pages.get_mut(&frame) {
                        page.loaded = true;
                        self.events.push_back(DomEvent::FrameLoaded { frame });
                    }
                }
                PendingLoad::Fail { frame, reason } => {
                    if self.pages.contains_key(&frame) {
                        self.events.push_back(DomEvent::FrameFailed { frame, reason });
                    }
                }
            }
        }
        self.now_ms = target;
    }

    /// Next queued event, if any.
    pub fn poll_event(&mut self) -> Option<DomEvent> {
        self.events.pop_front()
    }

    /// Drain every queued event.
    pub fn drain_events(&mut self) -> Vec<DomEvent> {
        self.events.drain(..).collect()
    }

    // -------------------------------------------------------------------
    // Simulated user / environment input
    // -------------------------------------------------------------------

    /// The user drags an element's scrollbar to an absolute offset.
    pub fn user_scroll(&mut self, node: NodeId, to_y: f64) {
        let max = self.element_max_scroll(node);
        if let Some(n) = self.nodes.get_mut(&node) {
            n.scroll_top = to_y.clamp(0.0, max);
            self.events.push_back(DomEvent::Scrolled { node });
        }
    }

    /// The user wheels over the top-level comparison document.
    pub fn user_wheel(&mut self, delta_x: f64, delta_y: f64) {
        self.events.push_back(DomEvent::Wheel { delta_x, delta_y });
    }

    /// The user scrolls inside a wrapper document to an absolute offset.
    pub fn page_user_scroll(&mut self, frame: NodeId, to_y: f64) {
        let now = self.now_ms;
        let viewport = self.viewport_height;
        if let Some(page) = self.pages.get_mut(&frame) {
            let max = (page.spec.content_height - viewport).max(0.0);
            page.scroll_y = to_y.clamp(0.0, max);
            let (x, y) = (page.scroll_x, page.scroll_y);
            if let Some(companion) = page.companion.as_mut()
                && let Some(message) = companion.on_scroll(now, x, y)
            {
                self.events.push_back(DomEvent::Message { frame, message });
            }
        }
    }

    /// The user wheels inside a wrapper document.
    pub fn page_user_wheel(&mut self, frame: NodeId, delta_y: f64) {
        let now = self.now_ms;
        let viewport = self.viewport_height;
        if let Some(page) = self.pages.get_mut(&frame) {
            let max = (page.spec.content_height - viewport).max(0.0);
            page.scroll_y = (page.scroll_y + delta_y).clamp(0.0, max);
            if let Some(companion) = page.companion.as_mut()
                && let Some(message) = companion.on_wheel(now, 0.0, delta_y)
            {
                self.events.push_back(DomEvent::Message { frame, message });
            }
        }
    }

    /// The hosting environment becomes unusable.
    pub fn invalidate_host(&mut self) {
        self.events.push_back(DomEvent::HostInvalidated);
    }

    /// Simulate a client-side navigation that changes the page's origin
    /// accessibility without a frame load event.
    pub fn set_page_cross_origin(&mut self, frame: NodeId, cross_origin: bool) {
        if let Some(page) = self.pages.get_mut(&frame) {
            page.spec.cross_origin = cross_origin;
        }
    }

    /// Let the next `reads` document reads succeed, then turn the page
    /// cross-origin. Models a client-side navigation landing between an
    /// origin probe and a later document access.
    pub fn poison_metrics_after(&mut self, frame: NodeId, reads: u32) {
        if let Some(page) = self.pages.get_mut(&frame) {
            page.metrics_reads_left.set(Some(reads));
        }
    }

    // -------------------------------------------------------------------
    // Inspection helpers for tests and the demo driver
    // -------------------------------------------------------------------

    pub fn page_scroll(&self, frame: NodeId) -> Option<(f64, f64)> {
        self.pages.get(&frame).map(|p| (p.scroll_x, p.scroll_y))
    }

    pub fn page_url(&self, frame: NodeId) -> Option<&Url> {
        self.pages.get(&frame).map(|p| &p.url)
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).map(|n| n.visible).unwrap_or(false)
    }

    pub fn text_of(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node).map(|n| n.text.as_str())
    }

    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Count of programmatic scroll writes performed through the host.
    pub fn scroll_write_count(&self) -> usize {
        self.scroll_writes
    }

    pub fn reset_scroll_write_count(&mut self) {
        self.scroll_writes = 0;
    }

    pub fn pending_event_count(&self) -> usize {
        self.events.len()
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn node(&self, node: NodeId) -> Result<&SimNode> {
        self.nodes
            .get(&node)
            .ok_or_else(|| EnvlensError::Dom(format!("unknown node {node}")))
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut SimNode> {
        self.nodes
            .get_mut(&node)
            .ok_or_else(|| EnvlensError::Dom(format!("unknown node {node}")))
    }

    fn page(&self, frame: NodeId) -> Result<&SimPage> {
        self.pages
            .get(&frame)
            .ok_or_else(|| EnvlensError::Dom(format!("frame {frame} has no document")))
    }

    fn element_max_scroll(&self, node: NodeId) -> f64 {
        let scroll_height = self.scroll_height(node).unwrap_or(0.0);
        let client_height = self.client_height(node).unwrap_or(0.0);
        (scroll_height - client_height).max(0.0)
    }

    fn detach_from_parent(&mut self, node: NodeId) {
        let parent = self.nodes.get(&node).and_then(|n| n.parent);
        if let Some(p) = parent
            && let Some(pn) = self.nodes.get_mut(&p)
        {
            pn.children.retain(|c| *c != node);
        }
    }

    fn remove_subtree(&mut self, node: NodeId) {
        let children = self
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove_subtree(child);
        }
        self.nodes.remove(&node);
        self.pages.remove(&node);
        self.timers.retain(|(_, pending)| {
            let f = match pending {
                PendingLoad::Complete { frame } | PendingLoad::Fail { frame, .. } => *frame,
            };
            f != node
        });
    }

    /// Apply a companion scroll command to a page, clamped to its range.
    fn apply_to_page(page: &mut SimPage, viewport: f64, cmd: ScrollCommand) {
        let max = (page.spec.content_height - viewport).max(0.0);
        match cmd {
            ScrollCommand::To { x, y } => {
                page.scroll_x = x.max(0.0);
                page.scroll_y = y.clamp(0.0, max);
            }
            ScrollCommand::By { dx, dy } => {
                page.scroll_x = (page.scroll_x + dx).max(0.0);
                page.scroll_y = (page.scroll_y + dy).clamp(0.0, max);
            }
        }
    }
}

/// Parse a pixel length such as `"4000px"`.
fn parse_px(value: &str) -> Option<f64> {
    value.strip_suffix("px")?.trim().parse().ok()
}

impl DomHost for SimDom {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn create_element(&mut self, tag: NodeTag) -> NodeId {
        self.next_id += 1;
        let id = self.next_id;
        self.nodes.insert(id, SimNode::new(tag));
        id
    }

    fn remove_element(&mut self, node: NodeId) -> Result<()> {
        self.node(node)?;
        self.detach_from_parent(node);
        self.remove_subtree(node);
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if parent == child {
            return Err(EnvlensError::Dom("cannot append node to itself".into()));
        }
        self.node(parent)?;
        self.node(child)?;
        self.detach_from_parent(child);
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(node)?.parent)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn set_style(&mut self, node: NodeId, prop: StyleProp, value: &str) -> Result<()> {
        self.node_mut(node)?.styles.insert(prop, value.to_string());
        Ok(())
    }

    fn style(&self, node: NodeId, prop: StyleProp) -> Result<Option<String>> {
        Ok(self.node(node)?.styles.get(&prop).cloned())
    }

    fn clear_style(&mut self, node: NodeId, prop: StyleProp) -> Result<()> {
        self.node_mut(node)?.styles.remove(&prop);
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.node_mut(node)?
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>> {
        Ok(self.node(node)?.attrs.get(name).cloned())
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.node_mut(node)?.text = text.to_string();
        Ok(())
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<()> {
        self.node_mut(node)?.visible = visible;
        Ok(())
    }

    fn scroll_top(&self, node: NodeId) -> Result<f64> {
        Ok(self.node(node)?.scroll_top)
    }

    fn set_scroll_top(&mut self, node: NodeId, px: f64) -> Result<()> {
        let max = self.element_max_scroll(node);
        let n = self.node_mut(node)?;
        let clamped = px.clamp(0.0, max);
        if (n.scroll_top - clamped).abs() > f64::EPSILON {
            n.scroll_top = clamped;
            self.events.push_back(DomEvent::Scrolled { node });
        }
        self.scroll_writes += 1;
        Ok(())
    }

    fn scroll_height(&self, node: NodeId) -> Result<f64> {
        let n = self.node(node)?;
        let tallest = n
            .children
            .iter()
            .filter_map(|c| self.nodes.get(c))
            .filter_map(|c| c.styles.get(&StyleProp::Height))
            .filter_map(|h| parse_px(h))
            .fold(0.0, f64::max);
        if tallest > 0.0 {
            Ok(tallest)
        } else {
            self.client_height(node)
        }
    }

    fn client_height(&self, node: NodeId) -> Result<f64> {
        let n = self.node(node)?;
        match n.styles.get(&StyleProp::Height).and_then(|h| parse_px(h)) {
            Some(px) => Ok(px),
            None => Ok(self.viewport_height),
        }
    }

    fn navigate_frame(&mut self, frame: NodeId, url: &Url) -> Result<()> {
        let n = self.node(frame)?;
        if n.tag != NodeTag::Frame {
            return Err(EnvlensError::Dom(format!("node {frame} is not a frame")));
        }
        self.timers.retain(|(_, pending)| {
            let f = match pending {
                PendingLoad::Complete { frame } | PendingLoad::Fail { frame, .. } => *frame,
            };
            f != frame
        });
        let spec = self
            .staged
            .get(url.as_str())
            .cloned()
            .unwrap_or_default();
        match &spec.load {
            LoadBehavior::Succeed { delay_ms } => {
                self.timers
                    .push((self.now_ms + delay_ms, PendingLoad::Complete { frame }));
            }
            LoadBehavior::Fail { delay_ms, reason } => {
                self.timers.push((
                    self.now_ms + delay_ms,
                    PendingLoad::Fail {
                        frame,
                        reason: reason.clone(),
                    },
                ));
            }
            LoadBehavior::Hang => {}
        }
        self.pages.insert(
            frame,
            SimPage {
                url: url.clone(),
                spec,
                loaded: false,
                scroll_x: 0.0,
                scroll_y: 0.0,
                companion: None,
                metrics_reads_left: std::cell::Cell::new(None),
            },
        );
        self.set_attribute(frame, "src", url.as_str())
    }

    fn frame_metrics(&self, frame: NodeId) -> Result<DocumentMetrics> {
        let page = self.page(frame)?;
        if !page.loaded {
            return Err(EnvlensError::Dom(format!(
                "frame {frame} document not ready"
            )));
        }
        if page.spec.cross_origin {
            return Err(EnvlensError::CrossOrigin(format!(
                "document of {} is not readable",
                page.url
            )));
        }
        if let Some(left) = page.metrics_reads_left.get() {
            if left == 0 {
                return Err(EnvlensError::CrossOrigin(format!(
                    "document of {} navigated away",
                    page.url
                )));
            }
            page.metrics_reads_left.set(Some(left - 1));
        }
        let h = page.spec.content_height;
        Ok(DocumentMetrics {
            document_scroll_height: h,
            document_offset_height: h,
            document_client_height: self.viewport_height.min(h),
            body_scroll_height: h,
            body_offset_height: h,
            body_client_height: self.viewport_height.min(h),
        })
    }

    fn frame_scroll_to(&mut self, frame: NodeId, x: f64, y: f64) -> Result<()> {
        let viewport = self.viewport_height;
        let now = self.now_ms;
        let page = self
            .pages
            .get_mut(&frame)
            .ok_or_else(|| EnvlensError::Dom(format!("frame {frame} has no document")))?;
        if page.spec.cross_origin && !page.spec.scriptable {
            return Err(EnvlensError::CrossOrigin(format!(
                "content window of {} is not scriptable",
                page.url
            )));
        }
        Self::apply_to_page(page, viewport, ScrollCommand::To { x, y });
        self.scroll_writes += 1;
        let (sx, sy) = (page.scroll_x, page.scroll_y);
        if let Some(companion) = page.companion.as_mut()
            && let Some(message) = companion.on_scroll(now, sx, sy)
        {
            self.events.push_back(DomEvent::Message { frame, message });
        }
        Ok(())
    }

    fn frame_scroll_by(&mut self, frame: NodeId, dx: f64, dy: f64) -> Result<()> {
        let viewport = self.viewport_height;
        let now = self.now_ms;
        let page = self
            .pages
            .get_mut(&frame)
            .ok_or_else(|| EnvlensError::Dom(format!("frame {frame} has no document")))?;
        if page.spec.cross_origin && !page.spec.scriptable {
            return Err(EnvlensError::CrossOrigin(format!(
                "content window of {} is not scriptable",
                page.url
            )));
        }
        Self::apply_to_page(page, viewport, ScrollCommand::By { dx, dy });
        self.scroll_writes += 1;
        let (sx, sy) = (page.scroll_x, page.scroll_y);
        if let Some(companion) = page.companion.as_mut()
            && let Some(message) = companion.on_scroll(now, sx, sy)
        {
            self.events.push_back(DomEvent::Message { frame, message });
        }
        Ok(())
    }

    fn frame_scroll_offset(&self, frame: NodeId) -> Result<(f64, f64)> {
        let page = self.page(frame)?;
        Ok((page.scroll_x, page.scroll_y))
    }

    fn install_companion(&mut self, frame: NodeId, frame_id: SlotId) -> Result<bool> {
        let page = self
            .pages
            .get_mut(&frame)
            .ok_or_else(|| EnvlensError::Dom(format!("frame {frame} has no document")))?;
        if !page.spec.companion_capable {
            return Ok(false);
        }
        page.companion = Some(Companion::new(frame_id));
        Ok(true)
    }

    fn post_message(&mut self, frame: NodeId, msg: &FrameMessage) -> Result<()> {
        let viewport = self.viewport_height;
        let now = self.now_ms;
        let page = self
            .pages
            .get_mut(&frame)
            .ok_or_else(|| EnvlensError::Dom(format!("frame {frame} has no document")))?;
        let Some(companion) = page.companion.as_mut() else {
            // No listener installed; real postMessage would vanish the same way.
            log::debug!("message to frame {frame} dropped: no companion");
            return Ok(());
        };
        if let Some(cmd) = companion.handle_message(now, msg) {
            Self::apply_to_page(page, viewport, cmd);
            self.scroll_writes += 1;
            // The programmatic scroll fires the wrapper's own scroll
            // listener; the companion's guard decides whether it echoes.
            let (sx, sy) = (page.scroll_x, page.scroll_y);
            if let Some(companion) = page.companion.as_mut()
                && let Some(message) = companion.on_scroll(now, sx, sy)
            {
                self.events.push_back(DomEvent::Message { frame, message });
            }
        }
        Ok(())
    }
}
