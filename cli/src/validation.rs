use crate::error::{KitError, KitResult};
use crate::licenses;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const NAME_MAX_LEN: usize = 32;
pub const DESCRIPTION_MAX_LEN: usize = 64;

/// Validates a project name.
///
/// Rules:
/// 1. Between 1 and 32 characters
/// 2. ASCII letters and digits, with single '-' or '_' between runs
/// 3. No leading, trailing or doubled separators
pub fn validate_name(name: &str) -> KitResult<()> {
    if name.is_empty() {
        return Err(KitError::validation("name", "Project name cannot be empty"));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(KitError::validation(
            "name",
            format!("Project name must be at most {} characters long", NAME_MAX_LEN),
        ));
    }

    // ^[A-Za-z0-9]+          a run of alphanumerics
    // (?:[-_][A-Za-z0-9]+)*  each separator followed by another run
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+(?:[-_][A-Za-z0-9]+)*$").unwrap());

    if !re.is_match(name) {
        return Err(KitError::validation(
            "name",
            "Project name may only contain letters, digits and single '-' or '_' separators",
        ));
    }

    Ok(())
}

pub fn validate_description(description: &str) -> KitResult<()> {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(KitError::validation(
            "description",
            format!(
                "Description must be at most {} characters long",
                DESCRIPTION_MAX_LEN
            ),
        ));
    }
    Ok(())
}

/// Validates a license and returns its canonical SPDX spelling (or "None").
pub fn validate_license(license: &str) -> KitResult<&'static str> {
    licenses::canonical(license).ok_or_else(|| {
        KitError::validation(
            "license",
            format!(
                "'{}' is not a known SPDX license identifier (use \"None\" for no license)",
                license.trim()
            ),
        )
    })
}

/// Validates the install path and resolves it against `cwd`.
///
/// The folder must either not exist yet or be empty. We never scaffold on top
/// of existing files.
pub fn validate_install_path(input: &str, cwd: &Path) -> KitResult<PathBuf> {
    let input = input.trim();
    if input.is_empty() {
        return Err(KitError::validation("path", "Install path cannot be empty"));
    }

    let path = cwd.join(input);

    if !path.exists() {
        return Ok(path);
    }
    if !path.is_dir() {
        return Err(KitError::validation(
            "path",
            format!("{} must be a folder", path.display()),
        ));
    }

    let mut entries = fs::read_dir(&path).map_err(|e| KitError::fs(&path, e))?;
    if entries.next().is_some() {
        return Err(KitError::validation(
            "path",
            format!("{} must be empty", path.display()),
        ));
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_name_with_space_fails() {
        assert!(validate_name("My App").is_err());
        assert!(validate_name("my-app").is_ok());
    }

    #[test]
    fn test_name_separators() {
        assert!(validate_name("my_app2").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name("my--app").is_err());
        assert!(validate_name("-app").is_err());
        assert!(validate_name("app_").is_err());
        assert!(validate_name("my-_app").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_name_length() {
        assert!(validate_name(&"a".repeat(32)).is_ok());
        assert!(validate_name(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_description_length() {
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"x".repeat(64)).is_ok());
        assert!(validate_description(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_license() {
        assert!(validate_license("banana").is_err());
        assert_eq!(validate_license("MIT").unwrap(), "MIT");
        assert_eq!(validate_license("None").unwrap(), "None");
    }

    #[test]
    fn test_path_to_existing_file_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("taken"), "hi").unwrap();

        let err = validate_install_path("taken", dir.path()).unwrap_err();
        assert!(err.to_string().contains("must be a folder"));
    }

    #[test]
    fn test_path_non_empty_dir_fails() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("full")).unwrap();
        fs::write(dir.path().join("full/file.txt"), "hi").unwrap();

        let err = validate_install_path("full", dir.path()).unwrap_err();
        assert!(err.to_string().contains("must be empty"));
    }

    #[test]
    fn test_path_empty_or_missing_dir_passes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        assert_eq!(
            validate_install_path("empty", dir.path()).unwrap(),
            dir.path().join("empty")
        );
        assert_eq!(
            validate_install_path("new-app", dir.path()).unwrap(),
            dir.path().join("new-app")
        );
        assert!(validate_install_path("  ", dir.path()).is_err());
    }
}
