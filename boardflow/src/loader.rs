//! Loader contract: turn a URL-like string into a descriptor.
//!
//! Used at run start and for graph-valued handler types. URL-likeness is
//! decided by prefix rules only; the loader itself decides how to fetch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::descriptor::GraphDescriptor;
use crate::error::RunError;

/// Resolves URL-like strings to descriptors. `Ok(None)` means the loader
/// does not know the URL; the caller decides whether that is fatal.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(
        &self,
        url_like: &str,
        base: Option<&str>,
    ) -> Result<Option<GraphDescriptor>, RunError>;
}

/// Prefix rules for treating a node type as a graph URL rather than a kit
/// handler name: absolute URL, file URL, relative path, or a `.json` path.
pub fn is_url_like(s: &str) -> bool {
    s.contains("://")
        || s.starts_with("file:")
        || s.starts_with("./")
        || s.starts_with("../")
        || s.starts_with('/')
        || s.ends_with(".json")
}

/// In-memory loader: a fixed url -> descriptor map. For kits and tests.
#[derive(Default)]
pub struct MapLoader {
    boards: HashMap<String, GraphDescriptor>,
}

impl MapLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under `url` (builder style).
    pub fn with_board(mut self, url: impl Into<String>, graph: GraphDescriptor) -> Self {
        let url = url.into();
        let mut graph = graph;
        graph.url = Some(url.clone());
        self.boards.insert(url, graph);
        self
    }
}

#[async_trait]
impl Loader for MapLoader {
    async fn load(
        &self,
        url_like: &str,
        _base: Option<&str>,
    ) -> Result<Option<GraphDescriptor>, RunError> {
        Ok(self.boards.get(url_like).cloned())
    }
}

/// Loads descriptor JSON from the filesystem. Relative paths resolve
/// against `base` (itself a file path or `file:` URL).
#[derive(Default)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }

    fn resolve(url_like: &str, base: Option<&str>) -> PathBuf {
        let strip = |s: &str| s.trim_start_matches("file://").to_string();
        let target = strip(url_like);
        let target = Path::new(&target);
        if target.is_absolute() {
            return target.to_path_buf();
        }
        match base {
            Some(base) => {
                let base = strip(base);
                let base = Path::new(&base);
                let dir = if base.extension().is_some() {
                    base.parent().unwrap_or(Path::new("."))
                } else {
                    base
                };
                dir.join(target)
            }
            None => target.to_path_buf(),
        }
    }
}

#[async_trait]
impl Loader for FileLoader {
    async fn load(
        &self,
        url_like: &str,
        base: Option<&str>,
    ) -> Result<Option<GraphDescriptor>, RunError> {
        let path = Self::resolve(url_like, base);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(RunError::Load(format!("{}: {err}", path.display()))),
        };
        let mut graph: GraphDescriptor = serde_json::from_slice(&bytes)
            .map_err(|err| RunError::Load(format!("{}: {err}", path.display())))?;
        graph.url = Some(format!("file://{}", path.display()));
        Ok(Some(graph))
    }
}
