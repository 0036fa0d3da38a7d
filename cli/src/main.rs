pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod installer;
pub mod licenses;
pub mod logger;
pub mod manifest;
pub mod pipeline;
pub mod project;
pub mod updater;
pub mod validation;

#[cfg(test)]
mod test_support;

use clap::Parser;
use cli::{Cli, Commands};
use logger::Logger;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("KITSTART_LOG", "warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        Logger::error_banner(&err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Version => {
            println!("kitstart {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::New(args) => {
            let settings = config::Settings::load()?.with_overrides(
                cli.archive_url.as_deref(),
                std::env::var("KITSTART_ARCHIVE_URL").ok(),
            )?;

            let update_check = (settings.check_for_updates
                && std::env::var_os("KITSTART_NO_UPDATE_CHECK").is_none())
            .then(updater::spawn_check);

            Logger::banner();

            let cwd = std::env::current_dir()?;
            let options = project::ProjectOptions::collect(args, &settings, &cwd)?;
            let client = fetcher::http_client()?;
            pipeline::scaffold(&client, &options, &settings).await?;

            if let Some(handle) = update_check {
                updater::report(handle).await;
            }
        }
    }

    Ok(())
}
