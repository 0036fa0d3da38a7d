use crate::cli::NewArgs;
use crate::config::Settings;
use crate::error::{KitError, KitResult};
use crate::licenses;
use crate::logger::Logger;
use crate::validation;
use anyhow::{Result, anyhow, bail};
use comfy_table::Table;
use inquire::validator::Validation;
use inquire::{Confirm, CustomUserError, InquireError, Select, Text};
use std::path::{Path, PathBuf};

/// What ends up in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub name: String,
    pub description: String,
    pub license: String,
}

/// Everything a scaffold run needs, fixed before any network I/O happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOptions {
    pub metadata: ProjectMetadata,
    pub path: PathBuf,
    pub skip_install: bool,
}

impl ProjectOptions {
    /// Builds the options from flags, asking only for what the flags left out.
    ///
    /// Flags are validated right away and a bad one ends the run; prompts
    /// re-ask until the answer is valid. With `--yes`, defaults are used
    /// instead of prompts (the name has no default, so it stays required).
    pub fn collect(args: &NewArgs, settings: &Settings, cwd: &Path) -> Result<Self> {
        let mut prompted = false;

        let name = match &args.name {
            Some(name) => {
                validation::validate_name(name)?;
                name.clone()
            }
            None if args.yes => bail!("--name is required when using --yes"),
            None => {
                prompted = true;
                prompt_name()?
            }
        };

        let description = match &args.description {
            Some(description) => {
                validation::validate_description(description)?;
                description.clone()
            }
            None if args.yes => String::new(),
            None => {
                prompted = true;
                prompt_description()?
            }
        };

        let license = match &args.license {
            Some(license) => validation::validate_license(license)?.to_string(),
            None if args.yes => validation::validate_license(&settings.default_license)?.to_string(),
            None => {
                prompted = true;
                prompt_license(&settings.default_license)?
            }
        };

        let path = match &args.path {
            Some(path) => validation::validate_install_path(path, cwd)?,
            None if args.yes => validation::validate_install_path(&name, cwd)?,
            None => {
                prompted = true;
                prompt_path(&name, cwd)?
            }
        };

        let options = Self {
            metadata: ProjectMetadata {
                name,
                description,
                license,
            },
            path,
            skip_install: args.skip_install,
        };

        if prompted {
            options.print_summary();
            let go = Confirm::new("Create this project?")
                .with_default(true)
                .prompt()
                .map_err(prompt_error)?;
            if !go {
                bail!("Aborted, nothing was created");
            }
        }

        Ok(options)
    }

    pub fn print_summary(&self) {
        Logger::header("New project");
        let mut table = Table::new();
        table.set_header(vec!["Field", "Value"]);
        table.add_row(vec!["Name", self.metadata.name.as_str()]);
        table.add_row(vec!["Description", self.metadata.description.as_str()]);
        table.add_row(vec!["License", self.metadata.license.as_str()]);
        table.add_row(vec!["Path".to_string(), self.path.display().to_string()]);
        println!("{}", table);
    }
}

/// Adapts a validator result to what inquire expects.
/// Validation failures re-prompt; anything else (an unreadable folder) aborts.
fn to_validation<T>(result: KitResult<T>) -> std::result::Result<Validation, CustomUserError> {
    match result {
        Ok(_) => Ok(Validation::Valid),
        Err(KitError::Validation { message, .. }) => Ok(Validation::Invalid(message.into())),
        Err(other) => Err(Box::new(other)),
    }
}

fn prompt_error(err: InquireError) -> anyhow::Error {
    match err {
        InquireError::NotTTY => {
            anyhow!("Not running in a terminal; pass every field as a flag (see --help)")
        }
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            anyhow!("Aborted, nothing was created")
        }
        other => anyhow!(other),
    }
}

fn prompt_name() -> Result<String> {
    Text::new("Project name:")
        .with_help_message("letters, digits, '-' and '_' (max 32)")
        .with_validator(|input: &str| to_validation(validation::validate_name(input)))
        .prompt()
        .map_err(prompt_error)
}

fn prompt_description() -> Result<String> {
    Text::new("Description:")
        .with_default("")
        .with_validator(|input: &str| to_validation(validation::validate_description(input)))
        .prompt()
        .map_err(prompt_error)
}

fn prompt_license(default_license: &str) -> Result<String> {
    let choices = licenses::prompt_choices();
    let start = licenses::canonical(default_license)
        .and_then(|id| choices.iter().position(|choice| *choice == id))
        .unwrap_or(0);

    Select::new("License:", choices)
        .with_help_message("type to filter, \"None\" for no license")
        .with_starting_cursor(start)
        .prompt()
        .map(str::to_string)
        .map_err(prompt_error)
}

fn prompt_path(name: &str, cwd: &Path) -> Result<PathBuf> {
    let default_path = format!("./{}", name);
    let base = cwd.to_path_buf();
    let answer = Text::new("Install path:")
        .with_default(&default_path)
        .with_validator(move |input: &str| {
            to_validation(validation::validate_install_path(input, &base))
        })
        .prompt()
        .map_err(prompt_error)?;

    Ok(validation::validate_install_path(&answer, cwd)?)
}
