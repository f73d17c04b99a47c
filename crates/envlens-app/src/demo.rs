//! Scripted comparison scenario over the simulated host.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use url::Url;

use envlens_core::{CompareController, SessionSource, Strategy, WidgetController};
use envlens_dom::{DomHost, PageSpec, SimDom};
use envlens_registry::{load_settings, save_settings, stash_session, MemoryStore, Registry};
use envlens_types::{Environment, SlotId};

/// Demo configuration (TOML). Defaults describe a three-environment web
/// group with the comparison running production against staging.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Name of the environment shown on the left.
    pub left: String,
    /// Name of the environment shown on the right.
    pub right: String,
    /// Page path carried onto both environments.
    pub page_path: String,
    /// Treat the right environment as cross-origin to the comparison page.
    pub cross_origin_right: bool,
    /// Simulated content height of both pages.
    pub content_height: f64,
    pub environments: Vec<Environment>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let parse = |s: &str| Url::parse(s).expect("static demo url");
        Self {
            left: "production".to_string(),
            right: "staging".to_string(),
            page_path: "/products/42?tab=specs".to_string(),
            cross_origin_right: false,
            content_height: 4000.0,
            environments: vec![
                Environment::new("production", parse("https://www.example.com")).with_group("web"),
                Environment::new("staging", parse("https://staging.example.com"))
                    .with_group("web"),
                Environment::new("qa", parse("https://qa.example.com")).with_group("web"),
            ],
        }
    }
}

impl DemoConfig {
    pub fn load(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading demo config {path}"))?;
        toml::from_str(&text).with_context(|| format!("parsing demo config {path}"))
    }
}

fn pump(sim: &mut SimDom, controller: &mut CompareController) {
    loop {
        let Some(event) = sim.poll_event() else { break };
        controller.handle_event(sim, event);
    }
}

pub fn run(config: &DemoConfig) -> Result<()> {
    // Registry and persisted settings, as the popup would have left them.
    let mut store = MemoryStore::new();
    let mut settings = load_settings(&store)?;
    settings.environments = config.environments.clone();
    save_settings(&mut store, &settings)?;
    let registry = Registry::from_settings(&settings);
    log::info!(
        "registry: {} environments, groups {:?}",
        registry.environments().len(),
        registry.groups(),
    );

    let find = |name: &str| {
        registry
            .environments()
            .iter()
            .find(|e| e.name == name)
            .cloned()
    };
    let Some(left) = find(&config.left) else {
        bail!("unknown left environment '{}'", config.left);
    };
    let Some(right) = find(&config.right) else {
        bail!("unknown right environment '{}'", config.right);
    };

    // The page the user is looking at when they hit "compare".
    let page = left.url.join(&config.page_path)?;
    log::info!("current page: {page}");

    // The floating widget the user would see on that page.
    let mut sim = SimDom::new();
    let mut widget = WidgetController::new();
    widget.sync_visibility(&mut sim, settings.widget_enabled, &registry, &page)?;
    if let Some(w) = widget.widget() {
        log::info!(
            "widget on '{}' offers {} sibling jump(s)",
            w.current_name(),
            w.link_count(),
        );
    }
    if let Some(jump) = widget.jump_to(&right.name) {
        log::info!("jump to '{}' would open {}", jump.environment, jump.target);
    }

    // Compare action: build the session and stash it for the page.
    let session = registry.compare(&left, &right, Some(&page))?;
    stash_session(&mut store, &session)?;

    // Stage both target pages in the simulated host.
    sim.stage_page(
        session.left.url.as_str(),
        PageSpec {
            content_height: config.content_height,
            ..PageSpec::default()
        },
    );
    sim.stage_page(
        session.right.url.as_str(),
        PageSpec {
            content_height: config.content_height,
            cross_origin: config.cross_origin_right,
            ..PageSpec::default()
        },
    );

    // Comparison page lifecycle.
    let mut controller = CompareController::new(&mut sim);
    controller.init(&mut sim, SessionSource::Stash(&mut store))?;
    sim.advance(50);
    pump(&mut sim, &mut controller);
    for slot in SlotId::BOTH {
        log::info!("{slot}: {:?}", controller.frames().load_state(slot));
    }

    // Lock, scroll, observe, unlock.
    controller.toggle_lock(&mut sim);
    let strategy = controller.sync_state().strategy;
    log::info!("lock enabled");
    match strategy {
        Strategy::Transform => {
            let w1 = controller
                .transform_wrapper(SlotId::Env1)
                .context("transform wrapper missing")?;
            let w2 = controller
                .transform_wrapper(SlotId::Env2)
                .context("transform wrapper missing")?;
            sim.user_scroll(w1, 1000.0);
            pump(&mut sim, &mut controller);
            sim.advance(20);
            controller.tick(&mut sim);
            pump(&mut sim, &mut controller);
            log::info!(
                "scrolled left wrapper to 1000; right wrapper follows at {}",
                sim.scroll_top(w2)?,
            );
        }
        Strategy::Relay => {
            let f1 = controller
                .frames()
                .frame(SlotId::Env1)
                .context("env1 frame missing")?;
            let f2 = controller
                .frames()
                .frame(SlotId::Env2)
                .context("env2 frame missing")?;
            sim.page_user_scroll(f1, 1000.0);
            pump(&mut sim, &mut controller);
            let (_, y) = sim.page_scroll(f2).context("env2 page missing")?;
            log::info!("scrolled left page to 1000; right page follows at {y}");
        }
        Strategy::WheelFallback | Strategy::None => {
            sim.user_wheel(0.0, 240.0);
            pump(&mut sim, &mut controller);
            if let Some(f2) = controller.frames().frame(SlotId::Env2)
                && let Some((_, y)) = sim.page_scroll(f2)
            {
                log::info!("wheel moved both pages; right page at {y}");
            }
        }
    }

    controller.toggle_lock(&mut sim);
    log::info!("lock disabled; native scrolling restored");
    Ok(())
}
