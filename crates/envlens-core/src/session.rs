//! Comparison session input.
//!
//! A session reaches the comparison page one of two ways: the registry's
//! compare action stashes it in storage (consumed exactly once), or the
//! page is opened directly with `env1`/`env2` query parameters.

use url::form_urlencoded;
use url::Url;

use envlens_registry::{take_session, SettingsStore};
use envlens_types::error::{EnvlensError, Result};
use envlens_types::{ComparisonSession, EnvType, EnvironmentRef};

/// Where the controller reads its session from.
pub enum SessionSource<'a> {
    /// Consume-once stash written by the registry's compare action.
    Stash(&'a mut dyn SettingsStore),
    /// Query string of a directly opened comparison page.
    Query(&'a str),
}

/// Resolve the session from its source. Absent input is a
/// [`EnvlensError::MissingInput`]; the controller turns that into the
/// per-slot error UI.
pub fn resolve_session(source: SessionSource<'_>) -> Result<ComparisonSession> {
    match source {
        SessionSource::Stash(store) => take_session(store)?.ok_or_else(|| {
            EnvlensError::MissingInput("no stashed comparison session".to_string())
        }),
        SessionSource::Query(query) => session_from_query(query),
    }
}

/// Parse `env1`/`env2` (URL-encoded) plus optional `env1Name`/`env2Name`
/// query parameters into a session.
pub fn session_from_query(query: &str) -> Result<ComparisonSession> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut env1 = None;
    let mut env2 = None;
    let mut env1_name = None;
    let mut env2_name = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "env1" => env1 = Some(value.into_owned()),
            "env2" => env2 = Some(value.into_owned()),
            "env1Name" => env1_name = Some(value.into_owned()),
            "env2Name" => env2_name = Some(value.into_owned()),
            _ => {}
        }
    }
    let env1 = env1
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EnvlensError::MissingInput("env1 query parameter".to_string()))?;
    let env2 = env2
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EnvlensError::MissingInput("env2 query parameter".to_string()))?;
    Ok(ComparisonSession::new(
        env_ref(&env1, env1_name.as_deref(), "env1")?,
        env_ref(&env2, env2_name.as_deref(), "env2")?,
    ))
}

fn env_ref(url_str: &str, name: Option<&str>, fallback: &str) -> Result<EnvironmentRef> {
    let url = Url::parse(url_str)?;
    let name = name
        .filter(|n| !n.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| url.host_str().unwrap_or(fallback).to_string());
    Ok(EnvironmentRef {
        env_type: EnvType::infer_from_name(&name),
        name,
        url,
    })
}
