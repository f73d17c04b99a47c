//! Environment records and comparison sessions.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::slot::SlotId;

/// Deployment environment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvType {
    Production,
    Staging,
    Development,
    Qa,
    Uat,
    Custom,
}

impl EnvType {
    /// Infer a type from an environment name.
    ///
    /// Legacy records persisted before the `type` field existed carry only a
    /// name; the original ordering of the checks is preserved so e.g.
    /// "staging-qa" still resolves to `Staging`.
    pub fn infer_from_name(name: &str) -> EnvType {
        let lower = name.to_lowercase();
        if lower.contains("staging") || lower.contains("stg") {
            EnvType::Staging
        } else if lower.contains("prod") {
            EnvType::Production
        } else if lower.contains("dev") {
            EnvType::Development
        } else if lower.contains("uat") {
            EnvType::Uat
        } else if lower.contains("qa") || lower.contains("test") {
            EnvType::Qa
        } else {
            EnvType::Custom
        }
    }
}

impl std::fmt::Display for EnvType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EnvType::Production => "production",
            EnvType::Staging => "staging",
            EnvType::Development => "development",
            EnvType::Qa => "qa",
            EnvType::Uat => "uat",
            EnvType::Custom => "custom",
        };
        f.write_str(s)
    }
}

/// A named deployment environment in the registry.
///
/// Identity is the `(name, url)` pair. Records are immutable once loaded
/// into a comparison session; edits happen only through the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub url: Url,
    #[serde(default)]
    pub group: Option<String>,
    /// Absent in legacy records; inferred from the name when missing.
    #[serde(default, rename = "type")]
    pub env_type: Option<EnvType>,
}

impl Environment {
    pub fn new(name: &str, url: Url) -> Self {
        Self {
            name: name.to_string(),
            url,
            group: None,
            env_type: None,
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_type(mut self, env_type: EnvType) -> Self {
        self.env_type = Some(env_type);
        self
    }

    /// Effective type: the stored one, or inferred from the name.
    pub fn effective_type(&self) -> EnvType {
        self.env_type
            .unwrap_or_else(|| EnvType::infer_from_name(&self.name))
    }

    /// Whether two records denote the same environment.
    pub fn same_identity(&self, other: &Environment) -> bool {
        self.name == other.name && self.url == other.url
    }

    /// Lightweight reference for embedding in a session.
    pub fn to_ref(&self) -> EnvironmentRef {
        EnvironmentRef {
            name: self.name.clone(),
            url: self.url.clone(),
            env_type: self.effective_type(),
        }
    }
}

/// A reference to one side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentRef {
    pub name: String,
    pub url: Url,
    #[serde(rename = "type")]
    pub env_type: EnvType,
}

/// The two environments being compared.
///
/// Created by the registry's compare action, consumed once by the comparison
/// page controller, never mutated afterward. A new comparison always starts
/// a fresh session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSession {
    pub left: EnvironmentRef,
    pub right: EnvironmentRef,
}

impl ComparisonSession {
    pub fn new(left: EnvironmentRef, right: EnvironmentRef) -> Self {
        Self { left, right }
    }

    /// The side occupying the given slot (left = env1, right = env2).
    pub fn side(&self, slot: SlotId) -> &EnvironmentRef {
        match slot {
            SlotId::Env1 => &self.left,
            SlotId::Env2 => &self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str, url: &str) -> Environment {
        Environment::new(name, Url::parse(url).unwrap())
    }

    #[test]
    fn infer_staging_variants() {
        assert_eq!(EnvType::infer_from_name("Staging"), EnvType::Staging);
        assert_eq!(EnvType::infer_from_name("eu-stg-2"), EnvType::Staging);
    }

    #[test]
    fn infer_production() {
        assert_eq!(EnvType::infer_from_name("prod"), EnvType::Production);
        assert_eq!(EnvType::infer_from_name("Production US"), EnvType::Production);
    }

    #[test]
    fn infer_development() {
        assert_eq!(EnvType::infer_from_name("dev"), EnvType::Development);
        assert_eq!(EnvType::infer_from_name("development"), EnvType::Development);
    }

    #[test]
    fn infer_uat_and_qa() {
        assert_eq!(EnvType::infer_from_name("UAT"), EnvType::Uat);
        assert_eq!(EnvType::infer_from_name("qa-2"), EnvType::Qa);
        assert_eq!(EnvType::infer_from_name("test bench"), EnvType::Qa);
    }

    #[test]
    fn infer_falls_back_to_custom() {
        assert_eq!(EnvType::infer_from_name("sandbox"), EnvType::Custom);
        assert_eq!(EnvType::infer_from_name(""), EnvType::Custom);
    }

    #[test]
    fn infer_ordering_staging_wins_over_qa() {
        // "staging-qa" contains both markers; staging is checked first.
        assert_eq!(EnvType::infer_from_name("staging-qa"), EnvType::Staging);
    }

    #[test]
    fn effective_type_prefers_stored() {
        let e = env("qa box", "https://qa.example.com").with_type(EnvType::Custom);
        assert_eq!(e.effective_type(), EnvType::Custom);
    }

    #[test]
    fn effective_type_infers_when_missing() {
        let e = env("qa box", "https://qa.example.com");
        assert_eq!(e.effective_type(), EnvType::Qa);
    }

    #[test]
    fn identity_is_name_and_url() {
        let a = env("prod", "https://example.com");
        let b = env("prod", "https://example.com").with_group("web");
        let c = env("prod", "https://other.example.com");
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn session_side_mapping() {
        let session = ComparisonSession::new(
            env("prod", "https://example.com").to_ref(),
            env("staging", "https://staging.example.com").to_ref(),
        );
        assert_eq!(session.side(SlotId::Env1).name, "prod");
        assert_eq!(session.side(SlotId::Env2).name, "staging");
    }

    #[test]
    fn environment_serde_uses_type_key() {
        let e = env("prod", "https://example.com").with_type(EnvType::Production);
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"type\":\"production\""));
        let back: Environment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn legacy_record_without_type_deserializes() {
        let json = r#"{"name":"stg","url":"https://stg.example.com/"}"#;
        let e: Environment = serde_json::from_str(json).unwrap();
        assert_eq!(e.env_type, None);
        assert_eq!(e.effective_type(), EnvType::Staging);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn inference_is_total_and_case_insensitive(name in "[a-zA-Z0-9 _-]{0,40}") {
                let lower = EnvType::infer_from_name(&name.to_lowercase());
                let upper = EnvType::infer_from_name(&name.to_uppercase());
                prop_assert_eq!(lower, upper);
            }

            #[test]
            fn stored_type_always_wins(name in "[a-z ]{0,20}") {
                let e = Environment::new(&name, Url::parse("https://x.example.com").unwrap())
                    .with_type(EnvType::Custom);
                prop_assert_eq!(e.effective_type(), EnvType::Custom);
            }
        }
    }
}
