use crate::config::Settings;
use crate::error::{KitError, KitResult};
use crate::logger::Logger;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// The package manager we are going to run, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerCommand {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl InstallerCommand {
    pub fn display(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Picks the preferred installer if it's on PATH, otherwise the fallback.
///
/// The preferred tool installs with no arguments, the fallback needs `install`.
/// `lookup` resolves a tool name to its executable (normally `which`).
pub fn select_installer<F>(settings: &Settings, lookup: F) -> KitResult<InstallerCommand>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    if let Some(program) = lookup(&settings.preferred_installer) {
        return Ok(InstallerCommand {
            name: settings.preferred_installer.clone(),
            program,
            args: Vec::new(),
        });
    }

    log::debug!(
        "{} not found on PATH, trying {}",
        settings.preferred_installer,
        settings.fallback_installer
    );

    if let Some(program) = lookup(&settings.fallback_installer) {
        return Ok(InstallerCommand {
            name: settings.fallback_installer.clone(),
            program,
            args: vec!["install".to_string()],
        });
    }

    Err(KitError::Installer(format!(
        "neither {} nor {} was found on PATH; install one of them or re-run with --skip-install",
        settings.preferred_installer, settings.fallback_installer
    )))
}

pub fn which_lookup(tool: &str) -> Option<PathBuf> {
    which::which(tool).ok()
}

/// Clears the spinner however we leave `run_installer`.
struct SpinnerGuard(ProgressBar);

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

/// Copies `reader` to `out` line by line without tearing the spinner.
///
/// `suspend` clears the spinner, writes, and redraws it. A hidden spinner
/// (no terminal) still runs the closure, so the lines are never dropped.
async fn forward_output<R, W>(reader: R, pb: &ProgressBar, mut out: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        pb.suspend(|| writeln!(out, "{}", line))?;
    }
    out.flush()
}

/// Runs the installer inside `root`, forwarding its output above a spinner.
///
/// The spinner ticks on its own timer and knows nothing about the child's
/// actual progress.
pub async fn run_installer(installer: &InstallerCommand, root: &Path) -> KitResult<()> {
    Logger::command(&installer.display(), format!("in {}", root.display()));

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} {elapsed}")
            .unwrap(),
    );
    pb.set_message(format!("Installing dependencies with {}", installer.name));
    pb.enable_steady_tick(Duration::from_millis(120));
    let guard = SpinnerGuard(pb.clone());

    let mut child = Command::new(&installer.program)
        .args(&installer.args)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| KitError::Installer(format!("could not start {}: {}", installer.name, e)))?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(KitError::Installer(format!(
            "could not capture {} output",
            installer.name
        )));
    };

    tokio::try_join!(
        forward_output(stdout, &pb, io::stdout()),
        forward_output(stderr, &pb, io::stderr()),
    )
    .map_err(|e| KitError::Installer(format!("reading {} output: {}", installer.name, e)))?;

    let status = child
        .wait()
        .await
        .map_err(|e| KitError::Installer(format!("waiting for {}: {}", installer.name, e)))?;
    drop(guard);

    if !status.success() {
        return Err(KitError::Installer(format!(
            "{} exited with {}",
            installer.display(),
            status
        )));
    }

    Ok(())
}
