use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kitstart")]
#[command(about = "Scaffold a new project from the starter kit", long_about = None)]
#[command(version, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the starter-kit archive URL
    #[arg(long, global = true)]
    pub archive_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project from the starter kit
    #[command(alias = "create")]
    New(NewArgs),
    /// Print the kitstart version
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct NewArgs {
    /// Project name (letters, digits, '-' and '_', max 32 characters)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Short description (max 64 characters)
    #[arg(short, long)]
    pub description: Option<String>,

    /// SPDX license identifier, or "None"
    #[arg(short, long)]
    pub license: Option<String>,

    /// Folder to create the project in (must be empty or not exist yet)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Use defaults for anything not given as a flag instead of prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Don't run the package manager after scaffolding
    #[arg(long)]
    pub skip_install: bool,
}
