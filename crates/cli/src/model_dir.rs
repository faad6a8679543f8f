//! Model discovery on disk.
//!
//! A model `people` is a `people.model` file with its entities in the
//! sibling directory `people_model/`, one `<Entity>.entity` file per entity.
//! The path given on the command line may be the `.model` file or the
//! entities directory itself.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use entity_dsl_core::EntitySource;

pub(crate) const MODEL_EXTENSION: &str = "model";
pub(crate) const ENTITY_EXTENSION: &str = "entity";
pub(crate) const MODEL_DIR_SUFFIX: &str = "_model";

#[derive(Debug, thiserror::Error)]
pub(crate) enum LoadError {
    #[error("model not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("not a model file (.model expected): {}", .0.display())]
    NotAModel(PathBuf),
    #[error("entities directory not found: {}", .0.display())]
    MissingEntityDir(PathBuf),
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A model name and the texts of its entities, sorted by entity name.
#[derive(Debug)]
pub(crate) struct LoadedModel {
    pub name: String,
    pub sources: Vec<EntitySource>,
}

pub(crate) fn load_model(path: &Path) -> Result<LoadedModel, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_owned()));
    }
    let (name, dir) = if path.is_dir() {
        (model_name_of_dir(path), path.to_owned())
    } else {
        if path.extension().and_then(|e| e.to_str()) != Some(MODEL_EXTENSION) {
            return Err(LoadError::NotAModel(path.to_owned()));
        }
        let name = file_stem(path);
        let dir = path
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!("{}{}", name, MODEL_DIR_SUFFIX));
        if !dir.is_dir() {
            return Err(LoadError::MissingEntityDir(dir));
        }
        (name, dir)
    };

    let sources = read_entities(&dir)?;
    tracing::debug!(model = %name, dir = %dir.display(), entities = sources.len(), "model loaded");
    Ok(LoadedModel { name, sources })
}

fn read_entities(dir: &Path) -> Result<Vec<EntitySource>, LoadError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_error(dir))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ENTITY_EXTENSION))
        .collect();
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(&path).map_err(io_error(&path))?;
        sources.push(EntitySource::new(file_stem(&path), content));
    }
    Ok(sources)
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> LoadError {
    let path = path.to_owned();
    move |source| LoadError::Io { path, source }
}

/// `people_model` -> `people`; any other directory keeps its name.
fn model_name_of_dir(dir: &Path) -> String {
    let name = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| dir.to_string_lossy().to_string());
    match name.strip_suffix(MODEL_DIR_SUFFIX) {
        Some(stem) if !stem.is_empty() => stem.to_owned(),
        _ => name,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
