use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::{
    compiler::{self, CompileError},
    config::Config,
    schema::{DocumentError, SchemaError, SchemaModel, SchemaTree},
};

/// The on-disk formats a schema can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
    Text,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Text,
        }
    }
}

/// Errors raised while reading a schema from disk.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("failed to read schema '{}'", path.display())]
    Io {
        /// The schema file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The canonical document is malformed.
    #[error("invalid schema document")]
    Document(#[from] DocumentError),
    /// The text schema does not compile.
    #[error("failed to compile text schema")]
    Compile(#[from] CompileError),
    /// The tree cannot be loaded.
    #[error("invalid schema")]
    Schema(#[from] SchemaError),
}

/// A schema read from a file.
#[derive(Debug, Clone)]
pub struct SchemaSource {
    path: PathBuf,
    tree: SchemaTree,
}

impl SchemaSource {
    /// Reads a schema, choosing the format by extension: `.json` and
    /// `.yaml`/`.yml` are canonical documents, anything else is the text
    /// format.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let tree = match Format::of(path) {
            Format::Json => SchemaTree::from_json(&content)?,
            Format::Yaml => SchemaTree::from_yaml(&content)?,
            Format::Text => compiler::compile(content.lines())?,
        };

        Ok(Self {
            path: path.to_path_buf(),
            tree,
        })
    }

    /// The file the schema was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed tree.
    #[must_use]
    pub const fn tree(&self) -> &SchemaTree {
        &self.tree
    }

    /// Loads the tree into a model, applying `leaf_extension_allowed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree is not a valid schema.
    pub fn load(&self, config: &Config) -> Result<SchemaModel, SourceError> {
        let mut model = SchemaModel::load(&self.tree)?;
        if config.leaf_extension_allowed {
            model.allow_leaf_extension();
        }
        Ok(model)
    }
}
