//! Transform strategy: same-origin scroll sync through wrapper elements.
//!
//! Each frame is moved into a scrollable wrapper, taken out of normal flow,
//! oversized to its content height, and repositioned with a vertical
//! translation equal to `-wrapper.scrollTop`. A zero-width sizer gives the
//! wrapper its scrollable range. Teardown restores the frame's original
//! inline styles exactly.

use envlens_dom::{DomHost, NodeId, NodeTag, StyleProp};
use envlens_types::error::{EnvlensError, Result};
use envlens_types::SlotId;

use crate::frame_host::{FrameHost, MIN_CONTENT_HEIGHT_PX};
use crate::sync::SCROLL_TOLERANCE_PX;

/// Frame height used when the content height cannot be measured.
pub const FALLBACK_FRAME_HEIGHT_PX: f64 = 10_000.0;

/// The frame styles the install touches, saved before and restored after.
const TOUCHED_FRAME_STYLES: [StyleProp; 7] = [
    StyleProp::Position,
    StyleProp::Top,
    StyleProp::Left,
    StyleProp::Width,
    StyleProp::Height,
    StyleProp::Overflow,
    StyleProp::Transform,
];

/// Format a pixel length the way inline styles carry it.
fn fmt_px(px: f64) -> String {
    if px.fract().abs() < f64::EPSILON {
        format!("{}", px as i64)
    } else {
        format!("{px}")
    }
}

/// The vertical translation for a wrapper scrolled to `scroll_top`.
fn translate_y(scroll_top: f64) -> String {
    format!("translateY(-{}px)", fmt_px(scroll_top))
}

/// Saved inline styles of one element (property, previous value).
#[derive(Debug, Clone)]
struct SavedStyles {
    entries: Vec<(StyleProp, Option<String>)>,
}

impl SavedStyles {
    fn capture(dom: &dyn DomHost, node: NodeId, props: &[StyleProp]) -> Result<Self> {
        let mut entries = Vec::with_capacity(props.len());
        for &prop in props {
            entries.push((prop, dom.style(node, prop)?));
        }
        Ok(Self { entries })
    }

    fn restore(&self, dom: &mut dyn DomHost, node: NodeId) {
        for (prop, value) in &self.entries {
            let result = match value {
                Some(v) => dom.set_style(node, *prop, v),
                None => dom.clear_style(node, *prop),
            };
            if let Err(e) = result {
                log::warn!("style restore failed for node {node}: {e}");
            }
        }
    }
}

#[derive(Debug)]
struct SlotInstall {
    slot: SlotId,
    container: NodeId,
    frame: NodeId,
    wrapper: NodeId,
    saved_frame: SavedStyles,
    saved_container_overflow: Option<String>,
}

/// Live transform-sync installation over both slots.
#[derive(Debug)]
pub struct TransformSync {
    installs: [SlotInstall; 2],
}

impl TransformSync {
    /// Wrap both frames. On any failure the partial install is unwound and
    /// the error is reported as a strategy-setup failure so the caller can
    /// fall back.
    pub fn install(dom: &mut dyn DomHost, frames: &FrameHost) -> Result<TransformSync> {
        let first = install_slot(dom, frames, SlotId::Env1)?;
        match install_slot(dom, frames, SlotId::Env2) {
            Ok(second) => Ok(TransformSync {
                installs: [first, second],
            }),
            Err(e) => {
                first.teardown(dom);
                Err(e)
            }
        }
    }

    fn install_for(&self, slot: SlotId) -> &SlotInstall {
        &self.installs[slot.index()]
    }

    /// The slot whose wrapper is `node`, if any.
    pub fn slot_for_wrapper(&self, node: NodeId) -> Option<SlotId> {
        self.installs
            .iter()
            .find(|i| i.wrapper == node)
            .map(|i| i.slot)
    }

    pub fn wrapper(&self, slot: SlotId) -> NodeId {
        self.install_for(slot).wrapper
    }

    pub fn frame(&self, slot: SlotId) -> NodeId {
        self.install_for(slot).frame
    }

    /// Propagate `source`'s wrapper position: translate its own frame, and
    /// if the other wrapper has drifted past the tolerance, write its
    /// scroll offset and translate its frame immediately rather than
    /// waiting for the other wrapper's own scroll event.
    pub fn sync_from(&self, dom: &mut dyn DomHost, source: SlotId) -> Result<()> {
        let src = self.install_for(source);
        let scroll_top = dom.scroll_top(src.wrapper)?;
        dom.set_style(src.frame, StyleProp::Transform, &translate_y(scroll_top))?;

        let target = self.install_for(source.other());
        let target_top = dom.scroll_top(target.wrapper)?;
        if (target_top - scroll_top).abs() > SCROLL_TOLERANCE_PX {
            dom.set_scroll_top(target.wrapper, scroll_top)?;
            dom.set_style(target.frame, StyleProp::Transform, &translate_y(scroll_top))?;
        }
        Ok(())
    }

    /// Unwrap both frames and restore their pre-install styles.
    pub fn teardown(self, dom: &mut dyn DomHost) {
        for install in self.installs {
            install.teardown(dom);
        }
    }
}

impl SlotInstall {
    fn teardown(self, dom: &mut dyn DomHost) {
        // Re-append the frame to its container before removing the wrapper,
        // so the wrapper removal never detaches a node about to be queried.
        if dom.contains(self.frame)
            && let Err(e) = dom.append_child(self.container, self.frame)
        {
            log::warn!("{}: frame re-append failed: {e}", self.slot);
        }
        if dom.contains(self.wrapper)
            && let Err(e) = dom.remove_element(self.wrapper)
        {
            log::warn!("{}: wrapper removal failed: {e}", self.slot);
        }
        if dom.contains(self.frame) {
            self.saved_frame.restore(dom, self.frame);
        }
        let result = match &self.saved_container_overflow {
            Some(v) => dom.set_style(self.container, StyleProp::Overflow, v),
            None => dom.clear_style(self.container, StyleProp::Overflow),
        };
        if let Err(e) = result {
            log::warn!("{}: container style restore failed: {e}", self.slot);
        }
    }
}

fn install_slot(dom: &mut dyn DomHost, frames: &FrameHost, slot: SlotId) -> Result<SlotInstall> {
    let frame = frames
        .frame(slot)
        .ok_or_else(|| EnvlensError::StrategySetup(format!("{slot} has no frame")))?;
    let container = frames.container(slot);

    // Re-measure at install time; a page that has wandered cross-origin
    // since its load shows up here as a setup failure, not a wedged UI.
    let height = match dom.frame_metrics(frame) {
        Ok(metrics) => metrics.max_height().max(MIN_CONTENT_HEIGHT_PX),
        Err(EnvlensError::CrossOrigin(reason)) => {
            return Err(EnvlensError::StrategySetup(format!(
                "{slot} document became unreadable: {reason}"
            )));
        }
        Err(e) => {
            log::warn!("{slot}: height re-measure failed ({e}); using fallback");
            frames
                .content_height(slot)
                .unwrap_or(FALLBACK_FRAME_HEIGHT_PX)
        }
    };
    let height_px = format!("{}px", fmt_px(height));

    let saved_frame = SavedStyles::capture(dom, frame, &TOUCHED_FRAME_STYLES)?;
    let saved_container_overflow = dom.style(container, StyleProp::Overflow)?;

    let wrapper = dom.create_element(NodeTag::Div);
    dom.append_child(container, wrapper)?;
    dom.set_style(wrapper, StyleProp::OverflowY, "scroll")?;
    dom.set_style(wrapper, StyleProp::OverflowX, "hidden")?;
    dom.set_style(wrapper, StyleProp::Width, "100%")?;
    dom.set_style(wrapper, StyleProp::Height, "100%")?;
    dom.set_style(wrapper, StyleProp::Position, "relative")?;

    dom.append_child(wrapper, frame)?;
    dom.set_style(frame, StyleProp::Position, "absolute")?;
    dom.set_style(frame, StyleProp::Top, "0")?;
    dom.set_style(frame, StyleProp::Left, "0")?;
    dom.set_style(frame, StyleProp::Width, "100%")?;
    dom.set_style(frame, StyleProp::Height, &height_px)?;
    dom.set_style(frame, StyleProp::Overflow, "hidden")?;
    dom.set_style(frame, StyleProp::Transform, &translate_y(0.0))?;

    let sizer = dom.create_element(NodeTag::Div);
    dom.append_child(wrapper, sizer)?;
    dom.set_style(sizer, StyleProp::Position, "relative")?;
    dom.set_style(sizer, StyleProp::Width, "1px")?;
    dom.set_style(sizer, StyleProp::Height, &height_px)?;
    dom.set_style(sizer, StyleProp::Float, "left")?;

    dom.set_style(container, StyleProp::Overflow, "hidden")?;

    Ok(SlotInstall {
        slot,
        container,
        frame,
        wrapper,
        saved_frame,
        saved_container_overflow,
    })
}
