use std::path::PathBuf;

use anyhow::anyhow;
use which::which;

pub trait ProcessController {
    /// Stops every process with one of `names`. Names with no running process
    /// are not an error.
    fn terminate(&self, names: &[String]) -> Result<(), anyhow::Error>;

    fn launch(&self, name: &str) -> Result<(), anyhow::Error>;
}

fn pkill() -> Result<PathBuf, anyhow::Error> {
    Ok(which("pkill")?)
}

/// Controls the target application through `pkill` and the platform launcher.
pub struct SystemProcesses;

impl ProcessController for SystemProcesses {
    fn terminate(&self, names: &[String]) -> Result<(), anyhow::Error> {
        let pkill = pkill()?;

        for name in names {
            log::debug!("Running {} -x {}", pkill.display(), name);

            let status = std::process::Command::new(pkill.clone())
                .args(["-x", name.as_str()])
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()?;

            // pkill exits 1 when nothing matched
            match status.code() {
                Some(0) | Some(1) => {}
                _ => return Err(anyhow!("pkill failed for '{}': {}", name, status)),
            }
        }

        Ok(())
    }

    fn launch(&self, name: &str) -> Result<(), anyhow::Error> {
        #[cfg(target_os = "macos")]
        return crate::macos::launch(name);

        #[cfg(target_os = "linux")]
        return crate::linux::launch(name);

        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        Err(anyhow!("Unable to launch '{}' on this platform", name))
    }
}
