//! Schema loading
//!
//! This module loads a root XSD document and every document it includes,
//! imports or redefines, merging their components into one [`SchemaSet`].

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorHandler, ParseError, Result, Severity};
use crate::xsd::{parse_document, ReferenceKind, SchemaSet};

/// Where a pending document comes from
#[derive(Debug)]
enum SchemaSource {
    Path(PathBuf),
    Text {
        text: String,
        system_id: String,
        base_dir: Option<PathBuf>,
    },
}

/// Pending schema work item for iterative processing
#[derive(Debug)]
struct PendingSchemaWork {
    source: SchemaSource,
    /// Parent namespace (for chameleon include handling)
    parent_namespace: Option<String>,
    /// Namespace an import expects the document to declare
    expected_namespace: Option<String>,
}

/// Loader for XSD documents and the documents they reference
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    allow_dtd: bool,
}

impl SchemaLoader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether documents may carry a DOCTYPE
    pub fn with_allow_dtd(mut self, allow: bool) -> Self {
        self.allow_dtd = allow;
        self
    }

    /// Load a schema file and everything it references
    pub fn load_file(&self, path: impl AsRef<Path>, handler: &mut dyn ErrorHandler) -> Result<SchemaSet> {
        self.load(
            PendingSchemaWork {
                source: SchemaSource::Path(path.as_ref().to_path_buf()),
                parent_namespace: None,
                expected_namespace: None,
            },
            handler,
        )
    }

    /// Load a schema from a string; relative references resolve against `base_dir`
    pub fn load_str(
        &self,
        text: &str,
        base_dir: Option<&Path>,
        handler: &mut dyn ErrorHandler,
    ) -> Result<SchemaSet> {
        self.load(
            PendingSchemaWork {
                source: SchemaSource::Text {
                    text: text.to_string(),
                    system_id: "<string>".to_string(),
                    base_dir: base_dir.map(Path::to_path_buf),
                },
                parent_namespace: None,
                expected_namespace: None,
            },
            handler,
        )
    }

    /// Iterative worklist over the document graph; avoids deep recursion on
    /// long include chains and visits each file once.
    fn load(&self, root: PendingSchemaWork, handler: &mut dyn ErrorHandler) -> Result<SchemaSet> {
        let mut set = SchemaSet::new();
        let mut loaded_paths: HashSet<PathBuf> = HashSet::new();
        let mut pending: VecDeque<PendingSchemaWork> = VecDeque::new();
        pending.push_back(root);
        let mut is_root = true;

        while let Some(work) = pending.pop_front() {
            let (text, system_id, base_dir) = match work.source {
                SchemaSource::Text {
                    text,
                    system_id,
                    base_dir,
                } => (text, system_id, base_dir),
                SchemaSource::Path(path) => {
                    let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
                    if !loaded_paths.insert(canonical) {
                        continue;
                    }
                    match fs::read_to_string(&path) {
                        Ok(text) => {
                            let base_dir = path.parent().map(Path::to_path_buf);
                            (text, path.display().to_string(), base_dir)
                        }
                        Err(e) if is_root => {
                            return Err(Error::Resource(format!(
                                "Failed to read schema '{}': {}",
                                path.display(),
                                e
                            )));
                        }
                        Err(e) => {
                            handler.error(&ParseError::new(format!(
                                "Failed to read referenced schema '{}': {}",
                                path.display(),
                                e
                            )));
                            continue;
                        }
                    }
                }
            };
            let root_document = std::mem::replace(&mut is_root, false);

            tracing::debug!("loading schema {}", system_id);
            let parsed = match parse_document(
                &text,
                &system_id,
                work.parent_namespace.as_deref(),
                self.allow_dtd,
                &mut set,
                handler,
            ) {
                Ok(parsed) => parsed,
                Err(e) if root_document => return Err(e),
                // Already reported to the handler
                Err(e) => {
                    tracing::warn!("skipping referenced schema {}: {}", system_id, e);
                    continue;
                }
            };

            if let Some(expected) = work.expected_namespace {
                if parsed.schema.target_namespace.as_deref() != Some(expected.as_str()) {
                    handler.warning(
                        &ParseError::new(format!(
                            "Imported schema declares namespace {:?}, expected '{}'",
                            parsed.schema.target_namespace, expected
                        ))
                        .with_system_id(system_id.as_str())
                        .with_severity(Severity::Warning),
                    );
                }
            }

            for reference in &parsed.references {
                let Some(location) = reference.location.as_deref() else {
                    tracing::debug!(
                        "import of {:?} without schemaLocation skipped",
                        reference.namespace
                    );
                    continue;
                };
                let path = match resolve_schema_location(location, base_dir.as_deref()) {
                    Ok(path) => path,
                    Err(e) => {
                        handler.error(&ParseError::new(e.to_string()).with_system_id(system_id.as_str()));
                        continue;
                    }
                };
                let (parent_namespace, expected_namespace) = match reference.kind {
                    ReferenceKind::Include | ReferenceKind::Redefine => {
                        (parsed.schema.target_namespace.clone(), None)
                    }
                    ReferenceKind::Import => (None, reference.namespace.clone()),
                };
                pending.push_back(PendingSchemaWork {
                    source: SchemaSource::Path(path),
                    parent_namespace,
                    expected_namespace,
                });
            }

            set.schemas.push(parsed.schema);
        }

        Ok(set)
    }
}

/// Resolve a schemaLocation relative to the referencing document
///
/// Remote locations are not fetched.
pub fn resolve_schema_location(location: &str, base_dir: Option<&Path>) -> Result<PathBuf> {
    if location.contains("://") && !location.starts_with("file://") {
        return Err(Error::Resource(format!(
            "Remote schema location '{}' is not supported",
            location
        )));
    }

    let location = location.strip_prefix("file://").unwrap_or(location);
    let location_path = Path::new(location);

    if location_path.is_absolute() {
        return Ok(location_path.to_path_buf());
    }

    match base_dir {
        Some(base) => Ok(base.join(location_path)),
        None => Ok(location_path.to_path_buf()),
    }
}
