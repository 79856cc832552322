use std::process::ExitCode;

use ca_bundle_sync::{
    fetch::HttpFetcher,
    notify::{ConsoleSink, Notifier},
    process::SystemProcesses,
    requirements, Config, Error, Outcome, Reconciler, Settings,
};

const RELAUNCH_FAILED: u8 = 5;

fn console() -> Notifier {
    let mut notifier = Notifier::default();
    notifier.add(Box::new(ConsoleSink));
    notifier
}

fn fail(notifier: &Notifier, err: &Error) -> ExitCode {
    notifier.error(&err.to_string());
    ExitCode::from(err.exit_code())
}

fn reconcile(config: &Config, notifier: &Notifier) -> Result<Outcome, Error> {
    let fetcher = HttpFetcher::new(config.tls())
        .map_err(|e| Error::Requirement(format!("unable to set up the HTTP client: {:#}", e)))?;
    let store = ca_bundle_sync::trust_store(config.app())?;
    let processes = SystemProcesses;

    let reconciler =
        Reconciler::with_config(config.clone(), &fetcher, store.as_ref(), &processes, notifier);
    reconciler.reconcile()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match Settings::from_env().and_then(Settings::validate) {
        Ok(config) => config,
        Err(e) => return fail(&console(), &e),
    };

    if let Err(e) = requirements::check(&config) {
        return fail(&console(), &e);
    }

    let notifier = match ca_bundle_sync::notifier(config.sinks(), &config.log_path()) {
        Ok(notifier) => notifier,
        Err(e) => return fail(&console(), &e),
    };

    notifier.info(&format!(
        "reconciling certificate bundle for tenant {}",
        config.tenant()
    ));

    match reconcile(&config, &notifier) {
        Ok(Outcome::UpToDate { digest }) => {
            notifier.success(&format!("certificate bundle {} is already trusted", digest));
            ExitCode::SUCCESS
        }
        Ok(Outcome::Replaced {
            relaunch_error: None,
            digest,
            ..
        }) => {
            notifier.success(&format!(
                "{} restarted and trusting {} ({})",
                config.app().launch_name,
                config.bundle_path().display(),
                digest
            ));
            ExitCode::SUCCESS
        }
        Ok(Outcome::Replaced {
            relaunch_error: Some(_),
            ..
        }) => {
            notifier.error(&format!(
                "the trusted bundle was updated but {} did not start again; start it manually",
                config.app().launch_name
            ));
            ExitCode::from(RELAUNCH_FAILED)
        }
        Err(e) => fail(&notifier, &e),
    }
}
