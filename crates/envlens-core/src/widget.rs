//! Floating on-page widget: jump to a sibling environment.
//!
//! A single widget instance exists at most once per page, owned explicitly
//! by a [`WidgetController`] whose `create`/`destroy` lifecycle follows the
//! persisted visibility setting. The registry and current page are passed
//! in at every sync; nothing here lives in ambient module state.

use url::Url;

use envlens_dom::{DomHost, NodeId, NodeTag};
use envlens_registry::{rebase_url, Registry};
use envlens_types::error::Result;

/// A user's request to jump to a sibling environment, with the current
/// page's path carried over.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpRequest {
    pub environment: String,
    pub target: Url,
}

#[derive(Debug)]
struct SiblingLink {
    name: String,
    target: Url,
}

/// The live widget: root element plus one link per sibling environment.
#[derive(Debug)]
pub struct FloatingWidget {
    root: NodeId,
    current_name: String,
    links: Vec<SiblingLink>,
}

impl FloatingWidget {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn current_name(&self) -> &str {
        &self.current_name
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

/// Owner of the at-most-one widget instance.
#[derive(Debug, Default)]
pub struct WidgetController {
    widget: Option<FloatingWidget>,
}

impl WidgetController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_created(&self) -> bool {
        self.widget.is_some()
    }

    pub fn widget(&self) -> Option<&FloatingWidget> {
        self.widget.as_ref()
    }

    /// Reconcile the widget with the persisted visibility setting.
    /// Idempotent in both directions: a visible widget stays, a hidden one
    /// stays gone.
    pub fn sync_visibility(
        &mut self,
        dom: &mut dyn DomHost,
        visible: bool,
        registry: &Registry,
        page: &Url,
    ) -> Result<()> {
        if visible {
            if self.widget.is_none() {
                self.widget = build_widget(dom, registry, page)?;
            }
            Ok(())
        } else {
            self.destroy(dom)
        }
    }

    /// Remove the widget if present.
    pub fn destroy(&mut self, dom: &mut dyn DomHost) -> Result<()> {
        if let Some(widget) = self.widget.take()
            && dom.contains(widget.root)
        {
            dom.remove_element(widget.root)?;
        }
        Ok(())
    }

    /// The jump a click on the named sibling performs.
    pub fn jump_to(&self, name: &str) -> Option<JumpRequest> {
        let widget = self.widget.as_ref()?;
        widget
            .links
            .iter()
            .find(|l| l.name == name)
            .map(|l| JumpRequest {
                environment: l.name.clone(),
                target: l.target.clone(),
            })
    }
}

/// Build the widget for the current page. Pages that match no registered
/// environment, or environments without siblings, get no widget.
fn build_widget(
    dom: &mut dyn DomHost,
    registry: &Registry,
    page: &Url,
) -> Result<Option<FloatingWidget>> {
    let Some(current) = registry.find_current(page) else {
        log::debug!("widget skipped: {page} matches no registered environment");
        return Ok(None);
    };
    let siblings = registry.siblings_of(current);
    if siblings.is_empty() {
        log::debug!("widget skipped: '{}' has no siblings", current.name);
        return Ok(None);
    }

    let root = dom.create_element(NodeTag::Div);
    dom.set_attribute(root, "class", "envlens-widget")?;

    let header = dom.create_element(NodeTag::Div);
    dom.set_attribute(header, "class", "envlens-widget-current")?;
    dom.set_text(header, &current.name)?;
    dom.append_child(root, header)?;

    let mut links = Vec::with_capacity(siblings.len());
    for sibling in siblings {
        let target = rebase_url(page, &sibling.url)?;
        let item = dom.create_element(NodeTag::Div);
        dom.set_attribute(item, "class", "envlens-widget-link")?;
        dom.set_attribute(item, "href", target.as_str())?;
        dom.set_text(item, &sibling.name)?;
        dom.append_child(root, item)?;
        links.push(SiblingLink {
            name: sibling.name.clone(),
            target,
        });
    }

    Ok(Some(FloatingWidget {
        root,
        current_name: current.name.clone(),
        links,
    }))
}
