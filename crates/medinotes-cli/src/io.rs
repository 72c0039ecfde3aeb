use medinotes_engine::editing::{Document, SchemaError, apply_schema, to_json};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Document in {path} could not be loaded: {source}")]
    Schema { path: PathBuf, source: SchemaError },
}

/// Read and validate a JSON notebook
pub fn read_document(path: &Path) -> Result<Document, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    apply_schema(&value).map_err(|source| LoadError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a notebook as pretty-printed JSON
pub fn write_document(path: &Path, doc: &Document) -> Result<(), LoadError> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = serde_json::to_string_pretty(&to_json(doc)).map_err(|source| {
        LoadError::Json {
            path: path.to_path_buf(),
            source,
        }
    })?;
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}
