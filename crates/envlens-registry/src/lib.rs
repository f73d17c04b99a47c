//! Environment registry: the persisted list of named environments and the
//! queries the popup, widget, and comparison page run against it.
//!
//! The registry is read-only from the comparison engine's perspective; all
//! mutation happens here, and identity is always the `(name, url)` pair.

pub mod store;

use url::Url;

use envlens_types::error::{EnvlensError, Result};
use envlens_types::{ComparisonSession, Environment};

pub use store::{
    load_settings, save_settings, stash_session, take_session, MemoryStore, Settings,
    SettingsStore, KEY_SESSION, KEY_SETTINGS,
};

/// Normalize a group label for comparison: trimmed, lowercased, empty → None.
pub fn normalize_group(group: Option<&str>) -> Option<String> {
    let g = group?.trim();
    if g.is_empty() {
        return None;
    }
    Some(g.to_lowercase())
}

/// Hostname of a URL with any leading `www.` stripped.
fn bare_hostname(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_lowercase())
}

/// Rebase the current page's path, query, and fragment onto another
/// environment's base URL. This is the "same page, other environment" jump.
pub fn rebase_url(current: &Url, target_base: &Url) -> Result<Url> {
    let mut target = target_base.clone();
    target.set_path(current.path());
    target.set_query(current.query());
    target.set_fragment(current.fragment());
    Ok(target)
}

/// The environment list and the queries over it.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    environments: Vec<Environment>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            environments: settings.environments.clone(),
        }
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// Add a record. Rejects a duplicate `(name, url)` identity.
    pub fn add(&mut self, env: Environment) -> Result<()> {
        if self.environments.iter().any(|e| e.same_identity(&env)) {
            return Err(EnvlensError::Registry(format!(
                "environment '{}' at {} already exists",
                env.name, env.url
            )));
        }
        self.environments.push(env);
        Ok(())
    }

    /// Replace the record identified by `(name, url)`.
    pub fn update(&mut self, name: &str, url: &Url, replacement: Environment) -> Result<()> {
        let probe = Environment::new(name, url.clone());
        let Some(slot) = self
            .environments
            .iter_mut()
            .find(|e| e.same_identity(&probe))
        else {
            return Err(EnvlensError::Registry(format!(
                "environment '{name}' at {url} not found"
            )));
        };
        *slot = replacement;
        Ok(())
    }

    /// Remove the record identified by `(name, url)`.
    pub fn remove(&mut self, name: &str, url: &Url) -> Result<()> {
        let probe = Environment::new(name, url.clone());
        let before = self.environments.len();
        self.environments.retain(|e| !e.same_identity(&probe));
        if self.environments.len() == before {
            return Err(EnvlensError::Registry(format!(
                "environment '{name}' at {url} not found"
            )));
        }
        Ok(())
    }

    /// Distinct normalized group labels, sorted.
    pub fn groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self
            .environments
            .iter()
            .filter_map(|e| normalize_group(e.group.as_deref()))
            .collect();
        groups.sort();
        groups.dedup();
        groups
    }

    /// Find the environment the given page belongs to: hostname match
    /// (leading `www.` ignored) or base-URL prefix match.
    pub fn find_current(&self, page: &Url) -> Option<&Environment> {
        let page_host = bare_hostname(page);
        let page_lower = page.as_str().to_lowercase();
        let found = self.environments.iter().find(|env| {
            if page_host.is_some() && bare_hostname(&env.url) == page_host {
                return true;
            }
            let mut base = env.url.as_str().to_lowercase();
            if !base.ends_with('/') {
                base.push('/');
            }
            page_lower.starts_with(&base)
        });
        if found.is_none() {
            log::debug!("no registered environment matches {page}");
        }
        found
    }

    /// Whether two records belong to the same comparison group. Two
    /// ungrouped environments count as grouped together.
    pub fn same_group(&self, a: &Environment, b: &Environment) -> bool {
        normalize_group(a.group.as_deref()) == normalize_group(b.group.as_deref())
    }

    /// Environments in `env`'s group, excluding `env` itself.
    pub fn siblings_of(&self, env: &Environment) -> Vec<&Environment> {
        self.environments
            .iter()
            .filter(|other| !other.same_identity(env) && self.same_group(env, other))
            .collect()
    }

    /// Build the session for comparing two registered environments, with
    /// the left side's current path carried onto both.
    pub fn compare(
        &self,
        left: &Environment,
        right: &Environment,
        current_page: Option<&Url>,
    ) -> Result<ComparisonSession> {
        let mut left_ref = left.to_ref();
        let mut right_ref = right.to_ref();
        if let Some(page) = current_page {
            left_ref.url = rebase_url(page, &left.url)?;
            right_ref.url = rebase_url(page, &right.url)?;
        }
        Ok(ComparisonSession::new(left_ref, right_ref))
    }
}
