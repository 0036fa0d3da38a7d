use crate::archive::{self, MaterializeSummary};
use crate::config::Settings;
use crate::error::KitError;
use crate::fetcher;
use crate::installer::{self, InstallerCommand};
use crate::logger::Logger;
use crate::manifest;
use crate::project::ProjectOptions;
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};

/// Creates the project: download → extract → patch manifest → install.
///
/// Each stage finishes before the next starts. If the install folder was
/// created by this run and anything before the install step fails, the
/// folder is removed again.
pub async fn scaffold(
    client: &reqwest::Client,
    options: &ProjectOptions,
    settings: &Settings,
) -> Result<()> {
    let url = settings.archive_url()?;

    // Pick the installer up front so a missing one fails before we download anything.
    let installer = if options.skip_install {
        None
    } else {
        Some(installer::select_installer(settings, installer::which_lookup)?)
    };

    let root = InstallRoot::prepare(&options.path)?;

    let prepared = prepare_tree(client, &url, options, settings, root.path()).await;
    if let Err(e) = prepared {
        root.rollback();
        return Err(e);
    }

    if let Some(installer) = &installer {
        Logger::header("Installing dependencies");
        installer::run_installer(installer, root.path()).await?;
        Logger::success("Dependencies installed");
    }

    print_next_steps(options, installer.as_ref());
    Ok(())
}

/// Fetch, materialize and patch.
async fn prepare_tree(
    client: &reqwest::Client,
    url: &url::Url,
    options: &ProjectOptions,
    settings: &Settings,
    root: &Path,
) -> Result<()> {
    Logger::info(format!("Downloading starter kit from {}", Logger::dim(url)));
    let download = fetcher::fetch_archive(client, url, true)
        .await
        .context("Could not download the starter kit")?;
    log::debug!(
        "fetched {} into {}",
        download.source_url,
        download.path().display()
    );
    Logger::success(format!("Downloaded {} bytes", download.size));

    let summary = extract(download.path().to_path_buf(), root.to_path_buf())
        .await
        .context("Could not extract the starter kit")?;
    drop(download);
    Logger::success(format!(
        "Extracted {} files into {}",
        summary.files,
        Logger::highlight(root.display())
    ));

    let manifest_path = root.join(&settings.manifest_file);
    manifest::patch_manifest(&manifest_path, &options.metadata)
        .with_context(|| format!("Could not update {}", settings.manifest_file))?;
    Logger::success(format!(
        "Updated {} for {}",
        settings.manifest_file,
        Logger::brand_text(&options.metadata.name)
    ));

    Ok(())
}

/// Extraction is plain blocking file I/O, so it gets its own thread.
async fn extract(archive_path: PathBuf, root: PathBuf) -> Result<MaterializeSummary> {
    let summary = tokio::task::spawn_blocking(move || archive::materialize(&archive_path, &root))
        .await
        .map_err(|e| anyhow!("extraction task failed: {}", e))??;
    log::debug!("{:?}", summary);
    Ok(summary)
}

fn print_next_steps(options: &ProjectOptions, installer: Option<&InstallerCommand>) {
    Logger::header("Done!");
    Logger::success(format!(
        "Created {} in {}",
        Logger::brand_text(&options.metadata.name),
        Logger::highlight(options.path.display())
    ));
    println!();
    println!("  cd {}", options.path.display());
    match installer {
        Some(installer) => println!("  {} start", installer.name),
        None => println!("  {}", Logger::dim("# install dependencies, then start the app")),
    }
    println!();
}

/// The install folder, remembering which part of it this run created.
#[derive(Debug)]
pub struct InstallRoot {
    path: PathBuf,
    /// Topmost directory that did not exist before `prepare`.
    created: Option<PathBuf>,
}

impl InstallRoot {
    pub fn prepare(path: &Path) -> Result<Self> {
        let created = path
            .ancestors()
            .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
            .last()
            .map(Path::to_path_buf);
        fs::create_dir_all(path).map_err(|e| KitError::fs(path, e))?;
        log::debug!("install root {} (created: {:?})", path.display(), created);
        Ok(Self {
            path: path.to_path_buf(),
            created,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes every folder we made on the way to the root.
    /// A folder the user handed us stays put.
    pub fn rollback(self) {
        let Some(created) = self.created else {
            return;
        };
        match fs::remove_dir_all(&created) {
            Ok(()) => log::debug!("removed {}", created.display()),
            Err(e) => Logger::warn(format!("Could not clean up {}: {}", created.display(), e)),
        }
    }
}
