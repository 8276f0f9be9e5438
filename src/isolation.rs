//! Per-run isolated agent configuration roots.
//!
//! Concurrent runs must not share mutable agent configuration, so each run
//! gets a fresh temporary directory that becomes the child's config home.
//! The directory is removed when the [`ConfigRoot`] is dropped, which covers
//! every exit path including timeouts and panics.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::{AGENT_CONFIG_FILE, AGENT_CONFIG_SUBDIR};

/// An isolated configuration root for a single agent run.
pub struct ConfigRoot {
    dir: TempDir,
}

impl ConfigRoot {
    /// Create a fresh root with the agent's config subdirectory inside it.
    ///
    /// If `seed` points at an existing file, it is copied in as the agent's
    /// config. A missing seed file is not an error; the agent then runs with
    /// its built-in defaults. Failure to create the root is a hard failure of
    /// the run — there is deliberately no fallback to a shared location.
    pub fn create(seed: Option<&Path>) -> Result<Self> {
        let dir = TempDir::new().context("failed to create isolated config root")?;

        let agent_dir = dir.path().join(AGENT_CONFIG_SUBDIR);
        fs::create_dir_all(&agent_dir).with_context(|| {
            format!("failed to create agent config dir {}", agent_dir.display())
        })?;

        if let Some(seed) = seed
            && seed.exists()
        {
            let target = agent_dir.join(AGENT_CONFIG_FILE);
            fs::copy(seed, &target).with_context(|| {
                format!(
                    "failed to seed agent config from {} to {}",
                    seed.display(),
                    target.display()
                )
            })?;
        }

        Ok(Self { dir })
    }

    /// Path exported to the child as its config home.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
