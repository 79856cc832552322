use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::{Error, Result},
    fetch::CertSource,
};

// Edit these before running, or override them through the environment.
pub const TENANT_PLACEHOLDER: &str = "<TENANT_FQDN>";
pub const ORG_KEY_PLACEHOLDER: &str = "<ORG_KEY>";

pub const DEFAULT_PUBLIC_ROOTS_URL: &str = "https://curl.se/ca/cacert.pem";
pub const DEFAULT_BUNDLE_NAME: &str = "ca-bundle.pem";
pub const LOG_FILE_NAME: &str = "ca-bundle-sync.log";
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(5);

pub const DEFAULT_SETTINGS_KEY: &str = "TrustedRootCertsFile";

#[cfg(target_os = "macos")]
pub const DEFAULT_BUNDLE_DIR: &str = "/Library/Application Support/ca_bundle_sync";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_BUNDLE_DIR: &str = "/var/lib/ca_bundle_sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsPolicy {
    Strict,
    /// Accept invalid certificates and hostnames from the certificate endpoints.
    Permissive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Console,
    File,
}

/// Parses the logging mode: `console`, `file`, `both` or `none`, or a comma
/// separated list of sinks.
pub fn parse_sinks(value: &str) -> Result<Vec<SinkKind>> {
    let mut sinks = Vec::new();

    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kinds: &[SinkKind] = match part.to_lowercase().as_str() {
            "console" | "cli" => &[SinkKind::Console],
            "file" => &[SinkKind::File],
            "both" => &[SinkKind::Console, SinkKind::File],
            "none" => &[],
            other => {
                return Err(Error::Validation(format!(
                    "unknown logging mode '{}'",
                    other
                )))
            }
        };

        for kind in kinds {
            if !sinks.contains(kind) {
                sinks.push(*kind);
            }
        }
    }

    Ok(sinks)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsBackend {
    /// macOS preferences domain, accessed through `defaults`.
    Defaults { domain: String },
    /// Plain `key=value` file.
    KeyFile { path: PathBuf },
}

/// The desktop client whose trust setting is managed.
///
/// The macOS default is Google Drive for desktop. That client has no Linux
/// build, so the default used elsewhere (`drivefs` with a settings file under
/// `/etc/opt/drivefs`) is only a placeholder. [`Settings::from_env`] refuses
/// to run there until `CA_BUNDLE_SETTINGS_FILE` names the real client's
/// settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetApp {
    pub process_names: Vec<String>,
    pub launch_name: String,
    pub settings: SettingsBackend,
    pub settings_key: String,
    pub install_path: Option<PathBuf>,
}

impl Default for TargetApp {
    #[cfg(target_os = "macos")]
    fn default() -> Self {
        TargetApp {
            process_names: vec!["Google Drive".to_string()],
            launch_name: "Google Drive".to_string(),
            settings: SettingsBackend::Defaults {
                domain: "/Library/Preferences/com.google.drivefs.settings".to_string(),
            },
            settings_key: DEFAULT_SETTINGS_KEY.to_string(),
            install_path: Some(PathBuf::from("/Applications/Google Drive.app")),
        }
    }

    #[cfg(not(target_os = "macos"))]
    fn default() -> Self {
        TargetApp {
            process_names: vec!["drivefs".to_string()],
            launch_name: "drivefs".to_string(),
            settings: SettingsBackend::KeyFile {
                path: PathBuf::from("/etc/opt/drivefs/settings.conf"),
            },
            settings_key: DEFAULT_SETTINGS_KEY.to_string(),
            install_path: None,
        }
    }
}

/// Raw, unvalidated settings. Build a [`Config`] with [`Settings::validate`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub tenant: String,
    pub org_key: String,
    pub bundle_dir: PathBuf,
    pub bundle_name: String,
    pub public_roots_url: String,
    pub tls: TlsPolicy,
    pub sinks: Vec<SinkKind>,
    pub settle: Duration,
    pub app: TargetApp,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            tenant: TENANT_PLACEHOLDER.to_string(),
            org_key: ORG_KEY_PLACEHOLDER.to_string(),
            bundle_dir: PathBuf::from(DEFAULT_BUNDLE_DIR),
            bundle_name: DEFAULT_BUNDLE_NAME.to_string(),
            public_roots_url: DEFAULT_PUBLIC_ROOTS_URL.to_string(),
            tls: TlsPolicy::Strict,
            sinks: vec![SinkKind::Console, SinkKind::File],
            settle: DEFAULT_SETTLE,
            app: TargetApp::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies `CA_BUNDLE_*` overrides found through `lookup` to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(tenant) = lookup("CA_BUNDLE_TENANT") {
            settings.tenant = tenant;
        }

        if let Some(org_key) = lookup("CA_BUNDLE_ORG_KEY") {
            settings.org_key = org_key;
        }

        if let Some(dir) = lookup("CA_BUNDLE_DIR") {
            settings.bundle_dir = PathBuf::from(dir);
        }

        if let Some(mode) = lookup("CA_BUNDLE_LOG") {
            settings.sinks = parse_sinks(&mode)?;
        }

        if let Some(tls) = lookup("CA_BUNDLE_TLS") {
            settings.tls = match tls.to_lowercase().as_str() {
                "strict" => TlsPolicy::Strict,
                "permissive" | "insecure" => TlsPolicy::Permissive,
                other => {
                    return Err(Error::Validation(format!(
                        "unknown TLS policy '{}'",
                        other
                    )))
                }
            };
        }

        if let Some(secs) = lookup("CA_BUNDLE_SETTLE_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                Error::Validation(format!("CA_BUNDLE_SETTLE_SECS is not a number: '{}'", secs))
            })?;
            settings.settle = Duration::from_secs(secs);
        }

        match lookup("CA_BUNDLE_SETTINGS_FILE") {
            Some(path) => {
                settings.app.settings = SettingsBackend::KeyFile {
                    path: PathBuf::from(path),
                }
            }
            #[cfg(not(target_os = "macos"))]
            None => {
                return Err(Error::Validation(
                    "CA_BUNDLE_SETTINGS_FILE must name the client's settings file on this platform"
                        .to_string(),
                ))
            }
            #[cfg(target_os = "macos")]
            None => {}
        }

        Ok(settings)
    }

    pub fn validate(self) -> Result<Config> {
        let tenant = self.tenant.trim();
        if tenant.is_empty() || tenant == TENANT_PLACEHOLDER {
            return Err(Error::Validation(
                "tenant FQDN is still the placeholder; set CA_BUNDLE_TENANT".to_string(),
            ));
        }

        if tenant.contains(|c: char| c == '/' || c.is_whitespace()) {
            return Err(Error::Validation(format!(
                "tenant '{}' is not a bare host name",
                tenant
            )));
        }

        let org_key = self.org_key.trim();
        if org_key.is_empty() || org_key == ORG_KEY_PLACEHOLDER {
            return Err(Error::Validation(
                "org key is still the placeholder; set CA_BUNDLE_ORG_KEY".to_string(),
            ));
        }

        // goes into the query string as-is
        if !org_key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
        {
            return Err(Error::Validation(
                "org key may only contain letters, digits, '-', '.', '_' and '~'".to_string(),
            ));
        }

        if self.bundle_name.is_empty() || self.bundle_name.contains(std::path::MAIN_SEPARATOR) {
            return Err(Error::Validation(format!(
                "bundle name '{}' must be a plain file name",
                self.bundle_name
            )));
        }

        if !self.public_roots_url.starts_with("https://") {
            return Err(Error::Validation(format!(
                "public root bundle URL '{}' must use https",
                self.public_roots_url
            )));
        }

        if self.app.process_names.is_empty() || self.app.launch_name.is_empty() {
            return Err(Error::Validation(
                "target application process names are not configured".to_string(),
            ));
        }

        Ok(Config {
            tenant: tenant.to_string(),
            org_key: org_key.to_string(),
            bundle_path: self.bundle_dir.join(&self.bundle_name),
            bundle_dir: self.bundle_dir,
            public_roots_url: self.public_roots_url,
            tls: self.tls,
            sinks: self.sinks,
            settle: self.settle,
            app: self.app,
        })
    }
}

/// Validated configuration. Only obtainable through [`Settings::validate`].
#[derive(Debug, Clone)]
pub struct Config {
    tenant: String,
    org_key: String,
    bundle_dir: PathBuf,
    bundle_path: PathBuf,
    public_roots_url: String,
    tls: TlsPolicy,
    sinks: Vec<SinkKind>,
    settle: Duration,
    app: TargetApp,
}

impl Config {
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn bundle_dir(&self) -> &Path {
        &self.bundle_dir
    }

    /// The canonical bundle path the target application is pointed at.
    pub fn bundle_path(&self) -> &Path {
        &self.bundle_path
    }

    pub fn log_path(&self) -> PathBuf {
        self.bundle_dir.join(LOG_FILE_NAME)
    }

    pub fn tls(&self) -> TlsPolicy {
        self.tls
    }

    pub fn sinks(&self) -> &[SinkKind] {
        &self.sinks
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub fn app(&self) -> &TargetApp {
        &self.app
    }

    pub fn source_url(&self, source: CertSource) -> String {
        match source {
            CertSource::TenantRoot => format!(
                "https://addon-{}/config/ca/cert?orgkey={}",
                self.tenant, self.org_key
            ),
            CertSource::TenantIntermediate => format!(
                "https://addon-{}/config/org/cert?orgkey={}",
                self.tenant, self.org_key
            ),
            CertSource::PublicRoots => self.public_roots_url.clone(),
        }
    }
}
