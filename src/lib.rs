pub mod config;
pub mod digest;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod process;
pub mod reconcile;
pub mod requirements;
pub mod store;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

pub use config::{Config, Settings};
pub use error::{Error, Result};
pub use reconcile::{Outcome, Reconciler};

use config::{SettingsBackend, SinkKind};
use notify::{ConsoleSink, FileSink, Notifier, Sink};
use store::{KeyFileStore, TrustStore};

/// The settings store the target application reads its trusted bundle from.
pub fn trust_store(app: &config::TargetApp) -> Result<Box<dyn TrustStore>> {
    match &app.settings {
        SettingsBackend::KeyFile { path } => Ok(Box::new(KeyFileStore::new(
            path.clone(),
            app.settings_key.clone(),
        ))),
        SettingsBackend::Defaults { domain } => {
            #[cfg(target_os = "macos")]
            return Ok(Box::new(crate::macos::DefaultsStore::new(
                domain.clone(),
                app.settings_key.clone(),
            )));

            #[cfg(not(target_os = "macos"))]
            Err(Error::Requirement(format!(
                "preferences domain '{}' can only be managed on macOS",
                domain
            )))
        }
    }
}

/// Builds a notifier writing to each requested sink. The log file lives next
/// to the bundle.
pub fn notifier(sinks: &[SinkKind], log_path: &std::path::Path) -> Result<Notifier> {
    let mut notifier = Notifier::default();

    for kind in sinks {
        let sink: Box<dyn Sink> = match kind {
            SinkKind::Console => Box::new(ConsoleSink),
            SinkKind::File => Box::new(
                FileSink::open(log_path)
                    .map_err(|e| Error::io("unable to open log file", log_path, e))?,
            ),
        };
        notifier.add(sink);
    }

    Ok(notifier)
}
