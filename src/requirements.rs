use which::which;

use crate::{
    config::{Config, SettingsBackend, TargetApp},
    error::{Error, Result},
};

/// Returns the entries of `tools` that cannot be found on PATH.
pub fn missing_tools<'a>(tools: &[&'a str]) -> Vec<&'a str> {
    tools
        .iter()
        .copied()
        .filter(|tool| which(tool).is_err())
        .collect()
}

fn required_tools(config: &Config) -> Vec<&'static str> {
    let mut tools = vec!["pkill"];

    if let SettingsBackend::Defaults { .. } = config.app().settings {
        tools.push("defaults");
    }

    #[cfg(target_os = "macos")]
    tools.push("open");

    tools
}

#[cfg(unix)]
fn is_elevated() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn is_elevated() -> bool {
    false
}

/// Pre-flight checks: root privileges, the tools used for settings and
/// process control, and an installed target application.
pub fn check(config: &Config) -> Result<()> {
    if !is_elevated() {
        return Err(Error::Requirement(
            "must be run with elevated privileges (try sudo)".to_string(),
        ));
    }

    check_environment(&required_tools(config), config.app())
}

/// The checks of [`check`] that do not depend on who runs them.
pub fn check_environment(tools: &[&str], app: &TargetApp) -> Result<()> {
    let missing = missing_tools(tools);
    if !missing.is_empty() {
        return Err(Error::Requirement(format!(
            "required tools not found on PATH: {}",
            missing.join(", ")
        )));
    }

    match &app.install_path {
        Some(install_path) if !install_path.exists() => Err(Error::Requirement(format!(
            "{} is not installed at '{}'",
            app.launch_name,
            install_path.display()
        ))),
        Some(_) => Ok(()),
        None => match which(&app.launch_name) {
            Ok(_) => Ok(()),
            Err(_) => Err(Error::Requirement(format!(
                "{} is not installed (not found on PATH)",
                app.launch_name
            ))),
        },
    }
}
