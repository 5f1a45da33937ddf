//! Runtime abstraction for the few system operations configuration needs.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    fn env_var(&self, key: &str) -> Result<String, env::VarError>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;
    fn config_dir(&self) -> Option<PathBuf>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    #[tracing::instrument(skip(self))]
    fn env_var(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(skip(self))]
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
    }

    #[tracing::instrument(skip(self))]
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(skip(self))]
    fn config_dir(&self) -> Option<PathBuf> {
        dirs::config_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_runtime_read_to_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookie");
        std::fs::write(&path, "SESSIONID=abc").unwrap();

        let runtime = RealRuntime;
        assert!(runtime.exists(&path));
        assert_eq!(runtime.read_to_string(&path).unwrap(), "SESSIONID=abc");
    }

    #[test]
    fn test_real_runtime_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");

        let runtime = RealRuntime;
        assert!(!runtime.exists(&path));
        let err = runtime.read_to_string(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
