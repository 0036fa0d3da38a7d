use crate::logger::Logger;
use anyhow::Result;
use self_update::cargo_crate_version;
use semver::Version;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long we are willing to hold the exit for a slow release lookup.
const REPORT_TIMEOUT: Duration = Duration::from_secs(2);

/// Starts the release lookup in the background so the scaffold isn't kept waiting.
pub fn spawn_check() -> JoinHandle<Result<Option<String>>> {
    tokio::spawn(latest_newer_version())
}

/// Asks GitHub for the latest release. `Some(version)` if it beats ours.
async fn latest_newer_version() -> Result<Option<String>> {
    let current_version = cargo_crate_version!();

    // self_update is blocking; keep it off the runtime threads.
    let latest = tokio::task::spawn_blocking(move || {
        self_update::backends::github::Update::configure()
            .repo_owner("kitstart")
            .repo_name("kitstart")
            .bin_name("kitstart")
            .current_version(current_version)
            .build()
            .and_then(|u| u.get_latest_release())
    })
    .await??;

    Ok(is_newer(current_version, &latest.version).then_some(latest.version))
}

/// Compares versions with semver; anything unparsable counts as "not newer".
pub fn is_newer(current: &str, latest: &str) -> bool {
    let latest = latest.trim_start_matches('v');
    match (Version::parse(current), Version::parse(latest)) {
        (Ok(current), Ok(latest)) => latest > current,
        _ => false,
    }
}

/// Prints the update nudge if the background check finished in time.
/// Failures are only logged; nobody's scaffold should fail over this.
pub async fn report(handle: JoinHandle<Result<Option<String>>>) {
    match tokio::time::timeout(REPORT_TIMEOUT, handle).await {
        Ok(Ok(Ok(Some(latest)))) => {
            println!();
            Logger::warn(format!(
                "Update available! {} -> {}",
                cargo_crate_version!(),
                Logger::highlight(&latest)
            ));
            println!(
                "  Grab it from {}",
                Logger::brand_text("https://github.com/kitstart/kitstart/releases")
            );
        }
        Ok(Ok(Ok(None))) => log::debug!("kitstart is up to date"),
        Ok(Ok(Err(e))) => log::debug!("update check failed: {}", e),
        Ok(Err(e)) => log::debug!("update check task failed: {}", e),
        Err(_) => log::debug!("update check timed out"),
    }
}
