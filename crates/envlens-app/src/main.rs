//! envlens demo entry point.
//!
//! Seeds a registry, stashes a comparison session the way the registry's
//! compare action would, and drives a full lock/scroll/unlock cycle over
//! the simulated host, logging what the engine does at each step.
//! Pass a TOML config path to swap in your own environments.

mod demo;

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => demo::DemoConfig::load(&path)?,
        None => demo::DemoConfig::default(),
    };
    demo::run(&config)
}
