//! Error types for the MIRAGE_OS terminal core.

use std::io;

/// Errors produced by the terminal core.
#[derive(Debug, thiserror::Error)]
pub enum MirageError {
    #[error("command error: {0}")]
    Command(String),

    #[error("VFS error: {0}")]
    Vfs(String),

    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("worker error: {0}")]
    Worker(String),

    #[error("script error: {0}")]
    Script(String),

    /// Cooperative cancellation of a running script. Callers match on the
    /// Display string, which is exactly `canceled`.
    #[error("canceled")]
    Canceled,

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, MirageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_display() {
        let e = MirageError::Command("unknown cmd".into());
        assert_eq!(format!("{e}"), "command error: unknown cmd");
    }

    #[test]
    fn vfs_error_display() {
        let e = MirageError::Vfs("file not found".into());
        assert_eq!(format!("{e}"), "VFS error: file not found");
    }

    #[test]
    fn pipeline_error_display() {
        let e = MirageError::Pipeline("bad stage".into());
        assert_eq!(format!("{e}"), "pipeline error: bad stage");
    }

    #[test]
    fn worker_error_display() {
        let e = MirageError::Worker("channel closed".into());
        assert_eq!(format!("{e}"), "worker error: channel closed");
    }

    #[test]
    fn canceled_displays_exact_message() {
        // Script-runner callers compare against this exact string.
        assert_eq!(format!("{}", MirageError::Canceled), "canceled");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: MirageError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let bad_toml = "this is [[[not valid toml";
        let toml_err = toml::from_str::<toml::Value>(bad_toml).unwrap_err();
        let e: MirageError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: MirageError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }

    #[test]
    fn error_is_debug() {
        let e = MirageError::Canceled;
        assert!(format!("{e:?}").contains("Canceled"));
    }

    #[test]
    fn result_alias_roundtrip() {
        let ok: Result<i32> = Ok(7);
        assert_eq!(ok.unwrap(), 7);
        let err: Result<i32> = Err(MirageError::Vfs("oops".into()));
        assert!(err.is_err());
    }
}
