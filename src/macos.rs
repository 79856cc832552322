use std::path::{Path, PathBuf};

use anyhow::anyhow;
use which::which;

use crate::store::TrustStore;

fn defaults() -> Result<PathBuf, anyhow::Error> {
    Ok(which("defaults")?)
}

/// A preferences domain read and written through `defaults(1)`.
pub struct DefaultsStore {
    domain: String,
    key: String,
}

impl DefaultsStore {
    pub fn new(domain: impl Into<String>, key: impl Into<String>) -> Self {
        DefaultsStore {
            domain: domain.into(),
            key: key.into(),
        }
    }
}

impl TrustStore for DefaultsStore {
    fn trusted_path(&self) -> Result<Option<PathBuf>, anyhow::Error> {
        let output = std::process::Command::new(defaults()?)
            .args(["read", self.domain.as_str(), self.key.as_str()])
            .stdin(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .output()?;

        // defaults exits non-zero when the domain or key does not exist
        if !output.status.success() {
            return Ok(None);
        }

        let value = String::from_utf8(output.stdout)?;
        let value = value.trim();

        Ok((!value.is_empty()).then(|| PathBuf::from(value)))
    }

    fn set_trusted_path(&self, path: &Path) -> Result<(), anyhow::Error> {
        let value = path
            .to_str()
            .ok_or_else(|| anyhow!("path '{}' is not valid UTF-8", path.display()))?;

        log::debug!("defaults write {} {} -string {}", self.domain, self.key, value);

        let status = std::process::Command::new(defaults()?)
            .args([
                "write",
                self.domain.as_str(),
                self.key.as_str(),
                "-string",
                value,
            ])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()?;

        if !status.success() {
            return Err(anyhow!("defaults write {} {} failed", self.domain, self.key));
        }

        Ok(())
    }
}

pub fn launch(name: &str) -> Result<(), anyhow::Error> {
    log::debug!("Running open -a {}", name);

    let status = std::process::Command::new(which("open")?)
        .args(["-a", name])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()?;

    if !status.success() {
        return Err(anyhow!("open -a '{}' failed: {}", name, status));
    }

    Ok(())
}
