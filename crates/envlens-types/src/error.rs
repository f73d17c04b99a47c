//! Error types for envlens.

use std::io;

/// Errors produced by the envlens crates.
#[derive(Debug, thiserror::Error)]
pub enum EnvlensError {
    /// One or both comparison URLs were absent at controller init.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// A frame never reached a loaded state within the bound.
    #[error("frame load timed out after {timeout_ms} ms")]
    LoadTimeout { timeout_ms: u64 },

    /// A document read hit the browser's cross-origin wall. Expected,
    /// not exceptional: this is the signal that drives strategy selection.
    #[error("cross-origin access denied: {0}")]
    CrossOrigin(String),

    /// Applying a remote scroll update failed (target mid-navigation, gone).
    #[error("sync apply failure: {0}")]
    SyncApply(String),

    /// Strategy setup failed where same-origin access was assumed.
    #[error("strategy setup failure: {0}")]
    StrategySetup(String),

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    /// The watchdog exhausted its restart budget.
    #[error("session restart abandoned after {0} attempts")]
    WatchdogExhausted(u32),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EnvlensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_display() {
        let e = EnvlensError::MissingInput("env2 url".into());
        assert_eq!(format!("{e}"), "missing input: env2 url");
    }

    #[test]
    fn load_timeout_display() {
        let e = EnvlensError::LoadTimeout { timeout_ms: 60_000 };
        assert_eq!(format!("{e}"), "frame load timed out after 60000 ms");
    }

    #[test]
    fn cross_origin_display() {
        let e = EnvlensError::CrossOrigin("env1 document".into());
        assert_eq!(format!("{e}"), "cross-origin access denied: env1 document");
    }

    #[test]
    fn sync_apply_display() {
        let e = EnvlensError::SyncApply("target frame gone".into());
        assert_eq!(format!("{e}"), "sync apply failure: target frame gone");
    }

    #[test]
    fn strategy_setup_display() {
        let e = EnvlensError::StrategySetup("wrap failed".into());
        assert_eq!(format!("{e}"), "strategy setup failure: wrap failed");
    }

    #[test]
    fn watchdog_display() {
        let e = EnvlensError::WatchdogExhausted(3);
        assert_eq!(format!("{e}"), "session restart abandoned after 3 attempts");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: EnvlensError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("not [[[ valid").unwrap_err();
        let e: EnvlensError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: EnvlensError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }

    #[test]
    fn url_error_from_conversion() {
        let url_err = url::Url::parse("::no-scheme::").unwrap_err();
        let e: EnvlensError = url_err.into();
        assert!(format!("{e}").contains("URL parse error"));
    }

    #[test]
    fn result_alias() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(ok.unwrap(), 7);
        let err: Result<u32> = Err(EnvlensError::Dom("detached".into()));
        assert!(err.is_err());
    }
}
