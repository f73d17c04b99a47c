//! Host abstraction for envlens.
//!
//! The comparison engine never touches a real browser directly; everything
//! it needs from the hosting document -- element tree edits, inline styles,
//! scroll geometry, frame navigation and metrics, companion installation,
//! post-message delivery -- goes through the [`DomHost`] trait. Host inputs
//! arrive as [`DomEvent`] values fed to the engine by the embedding loop.
//!
//! [`SimDom`] is the reference implementation: a fully in-memory host with
//! a manual clock, used by the test suite and the demo binary.

pub mod sim;

use envlens_proto::FrameMessage;
use envlens_types::{Result, SlotId};
use url::Url;

pub use sim::{LoadBehavior, PageSpec, SimDom};

/// Opaque handle to a host element.
pub type NodeId = u64;

/// The element kinds the engine creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTag {
    /// A slot's fixed outer container.
    Container,
    /// A page-hosting frame.
    Frame,
    /// A generic block element (wrappers, sizers, labels, indicators).
    Div,
}

/// Inline style properties the engine reads and writes.
///
/// Exactly the set the transform strategy touches; keeping the enum closed
/// makes the restore-on-disable property checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleProp {
    Position,
    Top,
    Left,
    Width,
    Height,
    Overflow,
    OverflowX,
    OverflowY,
    Transform,
    Float,
}

impl StyleProp {
    /// CSS property name.
    pub fn as_str(self) -> &'static str {
        match self {
            StyleProp::Position => "position",
            StyleProp::Top => "top",
            StyleProp::Left => "left",
            StyleProp::Width => "width",
            StyleProp::Height => "height",
            StyleProp::Overflow => "overflow",
            StyleProp::OverflowX => "overflow-x",
            StyleProp::OverflowY => "overflow-y",
            StyleProp::Transform => "transform",
            StyleProp::Float => "float",
        }
    }
}

/// Height metrics read from a frame's document.
///
/// Mirrors the six values a document exposes; the effective content height
/// is their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocumentMetrics {
    pub document_scroll_height: f64,
    pub document_offset_height: f64,
    pub document_client_height: f64,
    pub body_scroll_height: f64,
    pub body_offset_height: f64,
    pub body_client_height: f64,
}

impl DocumentMetrics {
    /// Largest of the six height readings.
    pub fn max_height(&self) -> f64 {
        [
            self.document_scroll_height,
            self.document_offset_height,
            self.document_client_height,
            self.body_scroll_height,
            self.body_offset_height,
            self.body_client_height,
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

/// An input event delivered by the host to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DomEvent {
    /// A frame finished loading its document.
    FrameLoaded { frame: NodeId },
    /// A frame navigation failed.
    FrameFailed { frame: NodeId, reason: String },
    /// An element (wrapper) scrolled -- user or programmatic.
    Scrolled { node: NodeId },
    /// A wheel event over the top-level comparison document.
    Wheel { delta_x: f64, delta_y: f64 },
    /// A message posted by a wrapper document to the parent.
    Message { frame: NodeId, message: FrameMessage },
    /// The hosting environment became unusable (extension context gone).
    HostInvalidated,
}

/// Everything the engine may ask of the hosting document.
///
/// Implementations must be synchronous and non-throwing in the panicking
/// sense; failures are reported through `Result`, and a cross-origin
/// document read fails with `EnvlensError::CrossOrigin`.
pub trait DomHost {
    /// Milliseconds of host time. Monotonic within a session.
    fn now_ms(&self) -> u64;

    // -------------------------------------------------------------------
    // Element tree
    // -------------------------------------------------------------------

    fn create_element(&mut self, tag: NodeTag) -> NodeId;

    /// Remove an element and its subtree.
    fn remove_element(&mut self, node: NodeId) -> Result<()>;

    /// Append `child` to `parent`, re-parenting if already attached.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>>;

    /// Whether the node is still part of the host tree.
    fn contains(&self, node: NodeId) -> bool;

    // -------------------------------------------------------------------
    // Styles, attributes, content
    // -------------------------------------------------------------------

    fn set_style(&mut self, node: NodeId, prop: StyleProp, value: &str) -> Result<()>;

    /// Current inline value of a style property, if set.
    fn style(&self, node: NodeId, prop: StyleProp) -> Result<Option<String>>;

    /// Remove an inline style property.
    fn clear_style(&mut self, node: NodeId, prop: StyleProp) -> Result<()>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>>;

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<()>;

    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<()>;

    // -------------------------------------------------------------------
    // Element scroll geometry
    // -------------------------------------------------------------------

    fn scroll_top(&self, node: NodeId) -> Result<f64>;

    /// Set an element's scroll offset. Like the browser, a programmatic
    /// write fires a `Scrolled` event for the element.
    fn set_scroll_top(&mut self, node: NodeId, px: f64) -> Result<()>;

    fn scroll_height(&self, node: NodeId) -> Result<f64>;

    fn client_height(&self, node: NodeId) -> Result<f64>;

    // -------------------------------------------------------------------
    // Frames
    // -------------------------------------------------------------------

    /// Point a frame at a URL. Loading completes asynchronously with a
    /// `FrameLoaded` or `FrameFailed` event.
    fn navigate_frame(&mut self, frame: NodeId, url: &Url) -> Result<()>;

    /// Read the frame document's height metrics. Fails with
    /// `EnvlensError::CrossOrigin` when the document is inaccessible and
    /// `EnvlensError::Dom` while it has not finished loading.
    fn frame_metrics(&self, frame: NodeId) -> Result<DocumentMetrics>;

    /// `contentWindow.scrollTo(x, y)`.
    fn frame_scroll_to(&mut self, frame: NodeId, x: f64, y: f64) -> Result<()>;

    /// `contentWindow.scrollBy(dx, dy)`.
    fn frame_scroll_by(&mut self, frame: NodeId, dx: f64, dy: f64) -> Result<()>;

    /// Current scroll offset of the frame's content window.
    fn frame_scroll_offset(&self, frame: NodeId) -> Result<(f64, f64)>;

    /// Try to install companion relay logic in the frame's wrapper
    /// document. Returns `false` when the hosted page cannot run it.
    fn install_companion(&mut self, frame: NodeId, frame_id: SlotId) -> Result<bool>;

    /// Post a structured message to the frame's wrapper document.
    fn post_message(&mut self, frame: NodeId, msg: &FrameMessage) -> Result<()>;
}
