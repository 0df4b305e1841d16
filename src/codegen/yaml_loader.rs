//! Entity descriptor loader.
//!
//! Reads descriptor documents (YAML or JSON) describing the entities of a
//! data-access layer. Supports a single file or a directory of files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::codegen::types::{DescriptorDocument, EntityDescriptor};
use crate::error::{CodegenError, Result};

/// Load descriptors from a file or from every descriptor file in a directory
pub fn load_descriptors<P: AsRef<Path>>(path: P) -> Result<Vec<EntityDescriptor>> {
    let path = path.as_ref();

    if path.is_dir() {
        load_descriptors_dir(path)
    } else {
        load_descriptor_file(path)
    }
}

/// Load every `.yaml`, `.yml` and `.json` file in `dir`, in file-name order
pub fn load_descriptors_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<EntityDescriptor>> {
    let dir_path = dir.as_ref();

    if !dir_path.is_dir() {
        return Err(CodegenError::Config(format!(
            "Path is not a directory: {}",
            dir_path.display()
        )));
    }

    let read_dir = fs::read_dir(dir_path).map_err(|e| CodegenError::io(dir_path, e))?;

    let mut paths = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| CodegenError::io(dir_path, e))?;
        let path = entry.path();
        if is_descriptor_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut entities = Vec::new();
    for path in paths {
        entities.extend(load_descriptor_file(&path)?);
    }

    tracing::debug!("Loaded {} entities from {}", entities.len(), dir_path.display());
    Ok(entities)
}

/// Load a single descriptor document
pub fn load_descriptor_file<P: AsRef<Path>>(path: P) -> Result<Vec<EntityDescriptor>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;

    let document = if has_extension(path, &["json"]) {
        serde_json::from_str::<DescriptorDocument>(&content).map_err(|e| parse_error(path, e))?
    } else {
        serde_yaml::from_str::<DescriptorDocument>(&content).map_err(|e| parse_error(path, e))?
    };

    for entity in &document.entities {
        if entity.name.is_empty() {
            return Err(CodegenError::Parse {
                path: path.to_path_buf(),
                message: "Entity name cannot be empty".to_string(),
            });
        }
    }

    Ok(document.entities)
}

fn is_descriptor_file(path: &Path) -> bool {
    path.is_file() && has_extension(path, &["yaml", "yml", "json"])
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn parse_error(path: &Path, e: impl std::fmt::Display) -> CodegenError {
    CodegenError::Parse {
        path: PathBuf::from(path),
        message: e.to_string(),
    }
}
