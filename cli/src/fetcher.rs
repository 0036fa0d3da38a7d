use crate::error::{KitError, KitResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use url::Url;

/// Local file header, and end-of-central-directory for an empty archive.
const ZIP_MAGIC: [&[u8; 4]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

/// A downloaded archive sitting in a temporary file.
/// The file is deleted when the task is dropped.
#[derive(Debug)]
pub struct DownloadTask {
    pub source_url: Url,
    pub size: u64,
    file: NamedTempFile,
}

impl DownloadTask {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

pub fn http_client() -> KitResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("kitstart/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| KitError::Network(e.to_string()))
}

/// Downloads `url` into a fresh temporary file, chunk by chunk.
///
/// One attempt only. Non-2xx responses and bodies that are not zip archives
/// (an HTML error page from a proxy, say) are rejected before anyone tries to
/// extract them.
pub async fn fetch_archive(
    client: &reqwest::Client,
    url: &Url,
    show_progress: bool,
) -> KitResult<DownloadTask> {
    log::debug!("GET {}", url);
    let mut response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| KitError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(KitError::Network(format!("GET {} returned {}", url, status)));
    }

    let pb = if show_progress {
        let pb = match response.content_length() {
            Some(len) => {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes}")
                        .unwrap()
                        .progress_chars("=> "),
                );
                pb
            }
            // GitHub archives are generated on the fly and usually come without a length.
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} {msg} {bytes}")
                        .unwrap(),
                );
                pb
            }
        };
        pb.set_message("Downloading starter kit");
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let mut file = NamedTempFile::with_prefix("kitstart-")
        .map_err(|e| KitError::fs(std::env::temp_dir(), e))?;
    let mut head: Vec<u8> = Vec::with_capacity(4);
    let mut size = 0u64;

    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                if let Some(pb) = &pb {
                    pb.finish_and_clear();
                }
                return Err(KitError::Network(e.to_string()));
            }
        };

        if head.len() < 4 {
            let take = (4 - head.len()).min(chunk.len());
            head.extend_from_slice(&chunk[..take]);
        }

        if let Err(e) = file.write_all(&chunk) {
            if let Some(pb) = &pb {
                pb.finish_and_clear();
            }
            return Err(KitError::fs(file.path(), e));
        }

        size += chunk.len() as u64;
        if let Some(pb) = &pb {
            pb.set_position(size);
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    file.flush().map_err(|e| KitError::fs(file.path(), e))?;

    if !ZIP_MAGIC.iter().any(|magic| head.as_slice() == magic.as_slice()) {
        return Err(KitError::Archive(format!(
            "{} did not return a zip archive",
            url
        )));
    }

    log::debug!("downloaded {} bytes to {}", size, file.path().display());

    Ok(DownloadTask {
        source_url: url.clone(),
        size,
        file,
    })
}
