//! Graph construction from a directory of model files

use crate::extract::extract_refs;
use crate::graph::{Graph, GraphError};
use crate::node::{ModelNode, NodeKind};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recognized model source extension (matched case-insensitively)
pub const MODEL_EXTENSION: &str = "sql";

/// Errors raised while building a graph from disk
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot access model directory {path}: {source}")]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("failed to read model file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn is_model_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(MODEL_EXTENSION))
        .unwrap_or(false)
}

/// Build a dependency graph from every model file under `path`
///
/// Each `.sql` file becomes one node named after its file stem. Nodes are
/// inserted as they are discovered, so two files sharing a stem abort the
/// build with a duplicate-identifier error. Edges are wired in a second
/// pass, and only for dependencies that resolved to a node; unresolved
/// references are deliberately left for the validator so every missing
/// dependency can be reported from one place.
pub fn build_from_dir(path: &Path) -> Result<Graph, BuildError> {
    let meta = std::fs::metadata(path).map_err(|source| BuildError::DirectoryAccess {
        path: path.to_path_buf(),
        source,
    })?;

    if !meta.is_dir() {
        return Err(BuildError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    let mut graph = Graph::new();

    // First pass: one node per model file.
    for entry in WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() || !is_model_file(entry.path()) {
            continue;
        }

        let file_path = entry.path();
        let raw_sql =
            std::fs::read_to_string(file_path).map_err(|source| BuildError::FileRead {
                path: file_path.to_path_buf(),
                source,
            })?;

        let name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let depends_on = extract_refs(&raw_sql)
            .into_iter()
            .map(|dep| NodeKind::Model.node_id(&dep))
            .collect();

        let node = ModelNode::new(NodeKind::Model, name)
            .with_depends_on(depends_on)
            .with_source_path(file_path)
            .with_raw_sql(raw_sql);

        graph.add_node(node)?;
    }

    // Second pass: wire edges for dependencies that exist. Missing ones are
    // the validator's to report.
    let node_ids: Vec<String> = graph.node_ids().cloned().collect();
    for id in node_ids {
        let deps = graph
            .get_node(&id)
            .map(|n| n.depends_on.clone())
            .unwrap_or_default();

        for dep in deps {
            if graph.get_node(&dep).is_some() {
                graph.add_edge(&id, &dep)?;
            }
        }
    }

    Ok(graph)
}
