use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::anyhow;

/// Access to the single setting holding the path of the bundle the target
/// application trusts.
pub trait TrustStore {
    /// `Ok(None)` when the key is not set.
    fn trusted_path(&self) -> Result<Option<PathBuf>, anyhow::Error>;

    fn set_trusted_path(&self, path: &Path) -> Result<(), anyhow::Error>;
}

#[cfg(unix)]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    None
}

/// A settings file of `key=value` lines. Lines it does not own are kept as-is.
pub struct KeyFileStore {
    path: PathBuf,
    key: String,
}

impl KeyFileStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        KeyFileStore {
            path: path.into(),
            key: key.into(),
        }
    }

    fn value_of<'a>(&self, line: &'a str) -> Option<&'a str> {
        let (key, value) = line.split_once('=')?;
        if key.trim() == self.key {
            Some(value.trim())
        } else {
            None
        }
    }
}

impl TrustStore for KeyFileStore {
    fn trusted_path(&self) -> Result<Option<PathBuf>, anyhow::Error> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(contents
            .lines()
            .filter_map(|line| self.value_of(line))
            .last()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from))
    }

    fn set_trusted_path(&self, path: &Path) -> Result<(), anyhow::Error> {
        let value = path
            .to_str()
            .ok_or_else(|| anyhow!("path '{}' is not valid UTF-8", path.display()))?;

        let existing = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        // the client reads this file as the logged-in user
        let permissions = match std::fs::metadata(&self.path) {
            Ok(meta) => Some(meta.permissions()),
            Err(_) => new_file_permissions(),
        };

        let mut lines = existing
            .lines()
            .filter(|line| self.value_of(line).is_none())
            .map(str::to_string)
            .collect::<Vec<String>>();
        lines.push(format!("{}={}", self.key, value));

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        log::debug!(
            "writing {}={} to {}",
            self.key,
            value,
            self.path.display()
        );

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all((lines.join("\n") + "\n").as_bytes())?;
        if let Some(permissions) = permissions {
            tmp.as_file().set_permissions(permissions)?;
        }
        tmp.persist(&self.path)?;

        Ok(())
    }
}
