use crate::error::{KitError, KitResult};
use crate::project::ProjectMetadata;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Writes the project metadata into the manifest at `path`.
///
/// `name`, `description` and `license` are overwritten in place; every other
/// key keeps its value and its position. Keys that were missing get appended.
pub fn patch_manifest(path: &Path, metadata: &ProjectMetadata) -> KitResult<()> {
    let content = fs::read_to_string(path)
        .map_err(|e| KitError::Manifest(format!("could not read {}: {}", path.display(), e)))?;

    let patched = patch_str(&content, metadata)
        .map_err(|e| KitError::Manifest(format!("{}: {}", path.display(), e)))?;

    fs::write(path, patched).map_err(|e| KitError::fs(path, e))?;
    log::debug!("patched {}", path.display());
    Ok(())
}

fn patch_str(content: &str, metadata: &ProjectMetadata) -> Result<String, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let Value::Object(mut manifest) = value else {
        return Err("expected a JSON object at the top level".to_string());
    };

    apply(&mut manifest, metadata);

    let mut out = serde_json::to_string_pretty(&Value::Object(manifest)).map_err(|e| e.to_string())?;
    out.push('\n');
    Ok(out)
}

fn apply(manifest: &mut Map<String, Value>, metadata: &ProjectMetadata) {
    manifest.insert("name".to_string(), Value::String(metadata.name.clone()));
    manifest.insert(
        "description".to_string(),
        Value::String(metadata.description.clone()),
    );
    manifest.insert("license".to_string(), Value::String(metadata.license.clone()));
}
