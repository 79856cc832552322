use anyhow::anyhow;
use which::which;

pub fn launch(name: &str) -> Result<(), anyhow::Error> {
    let bin = which(name).map_err(|e| anyhow!("'{}' is not on PATH: {}", name, e))?;

    log::debug!("Spawning {}", bin.display());

    // Not waited on; the client keeps running after we exit.
    std::process::Command::new(bin)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;

    Ok(())
}
