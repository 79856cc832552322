use std::{io::Write, path::PathBuf};

use glob::glob;

use crate::{
    config::{Config, Settings},
    digest::Digest,
    error::{Error, Result},
    fetch::{CertSource, Fetcher},
    notify::Notifier,
    process::ProcessController,
    store::TrustStore,
};

const TEMP_PREFIX: &str = ".ca-bundle-";
const TEMP_SUFFIX: &str = ".tmp";

// The client runs as the logged-in user; the bundle is written as root.
#[cfg(unix)]
const BUNDLE_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The configured bundle already matches upstream. Nothing was written.
    UpToDate { digest: Digest },
    /// The canonical bundle was replaced and the client pointed at it.
    /// `relaunch_error` is set when the client could not be started again;
    /// the new configuration stands either way.
    Replaced {
        digest: Digest,
        previous: Option<Digest>,
        relaunch_error: Option<String>,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        !matches!(
            self,
            Outcome::Replaced {
                relaunch_error: Some(_),
                ..
            }
        )
    }

    pub fn digest(&self) -> Digest {
        match self {
            Outcome::UpToDate { digest } | Outcome::Replaced { digest, .. } => *digest,
        }
    }
}

pub struct Reconciler<'a> {
    config: Config,
    fetcher: &'a dyn Fetcher,
    store: &'a dyn TrustStore,
    processes: &'a dyn ProcessController,
    notifier: &'a Notifier,
}

impl<'a> Reconciler<'a> {
    /// Validates `settings` first; nothing is fetched when that fails.
    pub fn new(
        settings: Settings,
        fetcher: &'a dyn Fetcher,
        store: &'a dyn TrustStore,
        processes: &'a dyn ProcessController,
        notifier: &'a Notifier,
    ) -> Result<Self> {
        Ok(Self::with_config(
            settings.validate()?,
            fetcher,
            store,
            processes,
            notifier,
        ))
    }

    pub fn with_config(
        config: Config,
        fetcher: &'a dyn Fetcher,
        store: &'a dyn TrustStore,
        processes: &'a dyn ProcessController,
        notifier: &'a Notifier,
    ) -> Self {
        Reconciler {
            config,
            fetcher,
            store,
            processes,
            notifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reconcile(&self) -> Result<Outcome> {
        let dir = self.config.bundle_dir();
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::io("unable to create bundle directory", dir, e))?;

        self.sweep_stale_temp_files();

        let bundle = self.build()?;
        let digest = Digest::of_file(bundle.path())
            .map_err(|e| Error::io("unable to hash", bundle.path(), e))?;
        log::debug!("fresh bundle digest {}", digest);

        let previous = self.current_digest();

        if previous == Some(digest) {
            bundle
                .close()
                .map_err(|e| Error::io("unable to remove temporary bundle in", dir, e))?;
            self.notifier.info("certificate bundle is up to date; nothing to do");
            return Ok(Outcome::UpToDate { digest });
        }

        let canonical = self.config.bundle_path();
        bundle
            .persist(canonical)
            .map_err(|e| Error::io("unable to move new bundle to", canonical, e.error))?;
        self.notifier.info(&format!(
            "wrote new certificate bundle to {}",
            canonical.display()
        ));

        self.store.set_trusted_path(canonical).map_err(Error::Settings)?;
        self.notifier.info(&format!(
            "{} now trusts {}",
            self.config.app().launch_name,
            canonical.display()
        ));

        let relaunch_error = self.restart();

        Ok(Outcome::Replaced {
            digest,
            previous,
            relaunch_error,
        })
    }

    /// Fetches every source in order into a temporary file next to the
    /// canonical path. The file is removed when dropped.
    fn build(&self) -> Result<tempfile::NamedTempFile> {
        let dir = self.config.bundle_dir();
        let mut bundle = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| Error::io("unable to create temporary bundle in", dir, e))?;

        for source in CertSource::ALL {
            self.notifier.info(&format!("fetching the {}", source));

            let bytes = self
                .fetcher
                .fetch(&self.config.source_url(source))
                .map_err(|reason| Error::Fetch {
                    cert: source,
                    reason,
                })?;

            bundle
                .write_all(&bytes)
                .map_err(|e| Error::io("unable to write temporary bundle", bundle.path(), e))?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            bundle
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(BUNDLE_MODE))
                .map_err(|e| Error::io("unable to set permissions on", bundle.path(), e))?;
        }

        bundle
            .as_file()
            .sync_all()
            .map_err(|e| Error::io("unable to flush temporary bundle", bundle.path(), e))?;

        Ok(bundle)
    }

    /// Digest of the bundle the client trusts now, or `None` when there is
    /// nothing usable to compare against.
    fn current_digest(&self) -> Option<Digest> {
        let path = match self.store.trusted_path() {
            Ok(Some(path)) => path,
            Ok(None) => {
                log::debug!("no trusted bundle configured");
                return None;
            }
            Err(e) => {
                log::warn!("unable to read the trusted bundle setting: {:#}", e);
                return None;
            }
        };

        match Digest::of_file(&path) {
            Ok(digest) => {
                log::debug!("configured bundle {} has digest {}", path.display(), digest);
                Some(digest)
            }
            Err(e) => {
                log::debug!("configured bundle {} is unusable: {}", path.display(), e);
                None
            }
        }
    }

    fn restart(&self) -> Option<String> {
        let app = self.config.app();

        self.notifier.info(&format!("restarting {}", app.launch_name));

        if let Err(e) = self.processes.terminate(&app.process_names) {
            log::warn!("unable to stop {}: {:#}", app.launch_name, e);
        }

        std::thread::sleep(self.config.settle());

        match self.processes.launch(&app.launch_name) {
            Ok(()) => None,
            Err(e) => {
                let message = format!("unable to relaunch {}: {:#}", app.launch_name, e);
                self.notifier.error(&message);
                Some(message)
            }
        }
    }

    /// Removes temporary bundles left behind by an interrupted run.
    fn sweep_stale_temp_files(&self) {
        let dir = match self.config.bundle_dir().to_str() {
            Some(dir) => glob::Pattern::escape(dir),
            None => return,
        };
        let pattern = format!(
            "{}{}{}*{}",
            dir,
            std::path::MAIN_SEPARATOR,
            TEMP_PREFIX,
            TEMP_SUFFIX
        );

        let paths = match glob(&pattern) {
            Ok(paths) => paths.filter_map(|p| p.ok()).collect::<Vec<PathBuf>>(),
            Err(e) => {
                log::warn!("unable to look for stale temporary bundles: {}", e);
                return;
            }
        };

        for path in paths {
            log::debug!("removing stale temporary bundle {}", path.display());
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("unable to remove {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        collections::HashMap,
        path::{Path, PathBuf},
        time::Duration,
    };

    use anyhow::anyhow;
    use tempfile::TempDir;

    use super::{Outcome, Reconciler};
    use crate::{
        config::Settings,
        digest::Digest,
        error::Error,
        fetch::{CertSource, Fetcher},
        notify::{tests::MemorySink, Level, Notifier, Sink},
        process::ProcessController,
        store::TrustStore,
    };

    const ROOT: &[u8] = b"-----BEGIN CERTIFICATE-----\nroot\n-----END CERTIFICATE-----\n";
    const INTERMEDIATE: &[u8] = b"-----BEGIN CERTIFICATE-----\norg\n-----END CERTIFICATE-----\n";
    const PUBLIC: &[u8] = b"-----BEGIN CERTIFICATE-----\npublic\n-----END CERTIFICATE-----\n";

    const ROOT_URL: &str = "https://addon-acme.goskope.com/config/ca/cert?orgkey=k3y";
    const INTERMEDIATE_URL: &str = "https://addon-acme.goskope.com/config/org/cert?orgkey=k3y";
    const PUBLIC_URL: &str = "https://roots.example.com/cacert.pem";

    fn init_logging() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    struct FakeFetcher {
        bodies: RefCell<HashMap<String, Vec<u8>>>,
        failing: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn upstream() -> Self {
            let bodies = [
                (ROOT_URL, ROOT),
                (INTERMEDIATE_URL, INTERMEDIATE),
                (PUBLIC_URL, PUBLIC),
            ]
            .into_iter()
            .map(|(url, body)| (url.to_string(), body.to_vec()))
            .collect();

            FakeFetcher {
                bodies: RefCell::new(bodies),
                failing: None,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing_at(url: &'static str) -> Self {
            FakeFetcher {
                failing: Some(url),
                ..Self::upstream()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, anyhow::Error> {
            self.calls.borrow_mut().push(url.to_string());

            if self.failing == Some(url) {
                return Err(anyhow!("connection reset by peer"));
            }

            self.bodies
                .borrow()
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("server answered 404 Not Found"))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        path: RefCell<Option<PathBuf>>,
        unreadable: bool,
        writes: Cell<usize>,
    }

    impl MemoryStore {
        fn pointing_at(path: &Path) -> Self {
            MemoryStore {
                path: RefCell::new(Some(path.to_path_buf())),
                ..Default::default()
            }
        }

        fn current(&self) -> Option<PathBuf> {
            self.path.borrow().clone()
        }
    }

    impl TrustStore for MemoryStore {
        fn trusted_path(&self) -> Result<Option<PathBuf>, anyhow::Error> {
            if self.unreadable {
                return Err(anyhow!("settings store is locked"));
            }
            Ok(self.current())
        }

        fn set_trusted_path(&self, path: &Path) -> Result<(), anyhow::Error> {
            self.writes.set(self.writes.get() + 1);
            *self.path.borrow_mut() = Some(path.to_path_buf());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeProcesses {
        terminated: RefCell<Vec<String>>,
        launched: RefCell<Vec<String>>,
        fail_terminate: bool,
        fail_launch: bool,
    }

    impl ProcessController for FakeProcesses {
        fn terminate(&self, names: &[String]) -> Result<(), anyhow::Error> {
            self.terminated.borrow_mut().extend(names.iter().cloned());
            if self.fail_terminate {
                return Err(anyhow!("pkill failed"));
            }
            Ok(())
        }

        fn launch(&self, name: &str) -> Result<(), anyhow::Error> {
            self.launched.borrow_mut().push(name.to_string());
            if self.fail_launch {
                return Err(anyhow!("application not found"));
            }
            Ok(())
        }
    }

    fn settings(dir: &Path) -> Settings {
        Settings {
            tenant: "acme.goskope.com".to_string(),
            org_key: "k3y".to_string(),
            bundle_dir: dir.join("bundles"),
            public_roots_url: PUBLIC_URL.to_string(),
            sinks: vec![],
            settle: Duration::ZERO,
            ..Settings::default()
        }
    }

    fn expected_bundle() -> Vec<u8> {
        [ROOT, INTERMEDIATE, PUBLIC].concat()
    }

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().path())
                .filter(|p| p.to_string_lossy().ends_with(".tmp"))
                .collect(),
            Err(_) => vec![],
        }
    }

    fn run(
        dir: &Path,
        fetcher: &FakeFetcher,
        store: &MemoryStore,
        processes: &FakeProcesses,
    ) -> Result<Outcome, Error> {
        init_logging();
        let notifier = Notifier::default();
        let reconciler = Reconciler::new(settings(dir), fetcher, store, processes, &notifier)?;
        reconciler.reconcile()
    }

    #[test]
    fn test_replaces_when_nothing_configured() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::default();
        let processes = FakeProcesses::default();

        let outcome = run(dir.path(), &fetcher, &store, &processes).unwrap();

        let canonical = dir.path().join("bundles").join("ca-bundle.pem");
        assert_eq!(std::fs::read(&canonical).unwrap(), expected_bundle());
        assert_eq!(
            outcome,
            Outcome::Replaced {
                digest: Digest::of_bytes(&expected_bundle()),
                previous: None,
                relaunch_error: None,
            }
        );
        assert!(outcome.is_success());
        assert_eq!(store.current(), Some(canonical));
        assert_eq!(store.writes.get(), 1);
        assert_eq!(
            *processes.launched.borrow(),
            vec![Settings::default().app.launch_name]
        );
        assert_eq!(
            *fetcher.calls.borrow(),
            vec![ROOT_URL, INTERMEDIATE_URL, PUBLIC_URL]
        );
        assert!(temp_files(&dir.path().join("bundles")).is_empty());
    }

    #[test]
    fn test_replaces_when_configured_file_is_missing() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::pointing_at(&dir.path().join("gone.pem"));
        let processes = FakeProcesses::default();

        let outcome = run(dir.path(), &fetcher, &store, &processes).unwrap();

        assert!(matches!(outcome, Outcome::Replaced { previous: None, .. }));
        assert_eq!(
            store.current(),
            Some(dir.path().join("bundles").join("ca-bundle.pem"))
        );
        assert_eq!(processes.terminated.borrow().len(), 1);
        assert_eq!(processes.launched.borrow().len(), 1);
    }

    #[test]
    fn test_replaces_when_setting_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore {
            unreadable: true,
            ..Default::default()
        };
        let processes = FakeProcesses::default();

        let outcome = run(dir.path(), &fetcher, &store, &processes).unwrap();

        assert!(matches!(outcome, Outcome::Replaced { previous: None, .. }));
        assert_eq!(store.writes.get(), 1);
    }

    #[test]
    fn test_replaces_when_configured_bundle_differs() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.pem");
        std::fs::write(&old, ROOT).unwrap();

        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::pointing_at(&old);
        let processes = FakeProcesses::default();

        let outcome = run(dir.path(), &fetcher, &store, &processes).unwrap();

        assert_eq!(
            outcome,
            Outcome::Replaced {
                digest: Digest::of_bytes(&expected_bundle()),
                previous: Some(Digest::of_bytes(ROOT)),
                relaunch_error: None,
            }
        );
        assert_eq!(
            store.current(),
            Some(dir.path().join("bundles").join("ca-bundle.pem"))
        );
        // the old file is not ours to remove
        assert_eq!(std::fs::read(&old).unwrap(), ROOT);
    }

    #[test]
    fn test_up_to_date_when_identical() {
        let dir = TempDir::new().unwrap();
        let current = dir.path().join("current.pem");
        std::fs::write(&current, expected_bundle()).unwrap();

        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::pointing_at(&current);
        let processes = FakeProcesses::default();

        let outcome = run(dir.path(), &fetcher, &store, &processes).unwrap();

        assert_eq!(
            outcome,
            Outcome::UpToDate {
                digest: Digest::of_bytes(&expected_bundle())
            }
        );
        assert!(outcome.is_success());
        assert_eq!(store.writes.get(), 0);
        assert_eq!(store.current(), Some(current));
        assert!(processes.terminated.borrow().is_empty());
        assert!(processes.launched.borrow().is_empty());
        assert!(!dir.path().join("bundles").join("ca-bundle.pem").exists());
        assert!(temp_files(&dir.path().join("bundles")).is_empty());
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::default();
        let processes = FakeProcesses::default();

        let first = run(dir.path(), &fetcher, &store, &processes).unwrap();
        assert!(matches!(first, Outcome::Replaced { .. }));

        let canonical = dir.path().join("bundles").join("ca-bundle.pem");
        let modified = std::fs::metadata(&canonical).unwrap().modified().unwrap();

        let second = run(dir.path(), &fetcher, &store, &processes).unwrap();
        assert_eq!(second, Outcome::UpToDate { digest: first.digest() });

        assert_eq!(
            std::fs::metadata(&canonical).unwrap().modified().unwrap(),
            modified
        );
        assert_eq!(store.writes.get(), 1);
        assert_eq!(processes.launched.borrow().len(), 1);
    }

    #[test]
    fn test_changed_upstream_replaces_again() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::default();
        let processes = FakeProcesses::default();

        let first = run(dir.path(), &fetcher, &store, &processes).unwrap();

        let rotated = b"-----BEGIN CERTIFICATE-----\nrotated\n-----END CERTIFICATE-----\n";
        fetcher
            .bodies
            .borrow_mut()
            .insert(INTERMEDIATE_URL.to_string(), rotated.to_vec());

        let second = run(dir.path(), &fetcher, &store, &processes).unwrap();
        assert_eq!(
            second,
            Outcome::Replaced {
                digest: Digest::of_bytes(&[ROOT, &rotated[..], PUBLIC].concat()),
                previous: Some(first.digest()),
                relaunch_error: None,
            }
        );
        assert_eq!(store.writes.get(), 2);
    }

    #[test]
    fn test_failed_fetch_leaves_canonical_untouched() {
        for (url, source, calls) in [
            (INTERMEDIATE_URL, CertSource::TenantIntermediate, 2),
            (PUBLIC_URL, CertSource::PublicRoots, 3),
        ] {
            let dir = TempDir::new().unwrap();
            let bundles = dir.path().join("bundles");
            let canonical = bundles.join("ca-bundle.pem");
            std::fs::create_dir_all(&bundles).unwrap();
            std::fs::write(&canonical, b"previous bundle").unwrap();

            let fetcher = FakeFetcher::failing_at(url);
            let store = MemoryStore::pointing_at(&canonical);
            let processes = FakeProcesses::default();

            let err = run(dir.path(), &fetcher, &store, &processes).unwrap_err();

            match &err {
                Error::Fetch { cert, .. } => assert_eq!(*cert, source),
                other => panic!("unexpected error: {}", other),
            }
            assert_eq!(err.exit_code(), 4);
            assert!(err.to_string().contains("connection reset by peer"));

            assert_eq!(fetcher.call_count(), calls);
            assert_eq!(std::fs::read(&canonical).unwrap(), b"previous bundle");
            assert!(temp_files(&bundles).is_empty());
            assert_eq!(store.writes.get(), 0);
            assert!(processes.launched.borrow().is_empty());
        }
    }

    #[test]
    fn test_first_fetch_failure_stops_early() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::failing_at(ROOT_URL);
        let store = MemoryStore::default();
        let processes = FakeProcesses::default();

        let err = run(dir.path(), &fetcher, &store, &processes).unwrap_err();
        assert!(matches!(
            err,
            Error::Fetch {
                cert: CertSource::TenantRoot,
                ..
            }
        ));
        assert_eq!(fetcher.call_count(), 1);
        assert!(!dir.path().join("bundles").join("ca-bundle.pem").exists());
    }

    #[test]
    fn test_placeholders_never_reach_the_network() {
        init_logging();
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::default();
        let processes = FakeProcesses::default();
        let notifier = Notifier::default();

        for settings in [
            Settings {
                tenant: crate::config::TENANT_PLACEHOLDER.to_string(),
                ..settings(dir.path())
            },
            Settings {
                org_key: crate::config::ORG_KEY_PLACEHOLDER.to_string(),
                ..settings(dir.path())
            },
        ] {
            let err = Reconciler::new(settings, &fetcher, &store, &processes, &notifier)
                .err()
                .unwrap();
            assert!(matches!(err, Error::Validation(_)));
            assert_eq!(err.exit_code(), 2);
        }

        assert_eq!(fetcher.call_count(), 0);
        assert!(!dir.path().join("bundles").exists());
    }

    #[test]
    fn test_relaunch_failure_keeps_new_configuration() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::default();
        let processes = FakeProcesses {
            fail_launch: true,
            ..Default::default()
        };

        let outcome = run(dir.path(), &fetcher, &store, &processes).unwrap();

        match &outcome {
            Outcome::Replaced {
                relaunch_error: Some(message),
                ..
            } => assert!(message.contains("application not found")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!outcome.is_success());
        assert_eq!(
            store.current(),
            Some(dir.path().join("bundles").join("ca-bundle.pem"))
        );
    }

    #[test]
    fn test_terminate_failure_is_best_effort() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::default();
        let processes = FakeProcesses {
            fail_terminate: true,
            ..Default::default()
        };

        let outcome = run(dir.path(), &fetcher, &store, &processes).unwrap();

        assert!(outcome.is_success());
        assert_eq!(processes.launched.borrow().len(), 1);
    }

    #[test]
    fn test_overwrites_existing_canonical_file() {
        let dir = TempDir::new().unwrap();
        let bundles = dir.path().join("bundles");
        let canonical = bundles.join("ca-bundle.pem");
        std::fs::create_dir_all(&bundles).unwrap();
        std::fs::write(&canonical, b"stale").unwrap();

        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::pointing_at(&canonical);
        let processes = FakeProcesses::default();

        run(dir.path(), &fetcher, &store, &processes).unwrap();

        assert_eq!(std::fs::read(&canonical).unwrap(), expected_bundle());
        assert_eq!(
            Digest::of_file(&canonical).unwrap(),
            Digest::of_bytes(&expected_bundle())
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_replaced_bundle_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::default();
        let processes = FakeProcesses::default();

        run(dir.path(), &fetcher, &store, &processes).unwrap();

        let canonical = dir.path().join("bundles").join("ca-bundle.pem");
        let mode = std::fs::metadata(&canonical).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_sweeps_stale_temp_files() {
        let dir = TempDir::new().unwrap();
        let bundles = dir.path().join("bundles");
        std::fs::create_dir_all(&bundles).unwrap();
        std::fs::write(bundles.join(".ca-bundle-abc123.tmp"), b"half a bun").unwrap();
        std::fs::write(bundles.join("notes.txt"), b"keep me").unwrap();

        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::default();
        let processes = FakeProcesses::default();

        run(dir.path(), &fetcher, &store, &processes).unwrap();

        assert!(temp_files(&bundles).is_empty());
        assert!(bundles.join("notes.txt").exists());
    }

    #[test]
    fn test_reports_progress() {
        init_logging();
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::upstream();
        let store = MemoryStore::default();
        let processes = FakeProcesses {
            fail_launch: true,
            ..Default::default()
        };

        let sink = MemorySink::default();
        let sinks: Vec<Box<dyn Sink>> = vec![Box::new(sink.clone())];
        let notifier = Notifier::new(sinks);

        Reconciler::new(settings(dir.path()), &fetcher, &store, &processes, &notifier)
            .unwrap()
            .reconcile()
            .unwrap();

        let lines = sink.0.borrow();
        assert!(lines
            .iter()
            .any(|(level, msg)| *level == Level::Info && msg.contains("tenant root CA")));
        assert!(lines
            .iter()
            .any(|(level, msg)| *level == Level::Error && msg.contains("unable to relaunch")));
    }
}
