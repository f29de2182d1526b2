//! End-to-end translation pipeline
//!
//! load → lower → emit → render. Nothing is written to disk until the caller
//! asks for it, so a failed translation leaves no partial output behind.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::config::Options;
use crate::emitter::Emitter;
use crate::error::{LoggingErrorHandler, Result};
use crate::loaders::SchemaLoader;
use crate::lowering::lower;
use crate::namespaces::{namespace_to_package, NamespaceMapper};
use crate::output::{write_files, OutputLayout, OutputWriter};
use crate::registry::TypeRegistry;
use crate::xsd::SchemaSet;

/// Stem used for the single output file when the input has no usable name
const DEFAULT_STEM: &str = "schema";

/// Result of a translation
#[derive(Debug, Clone)]
pub struct Translation {
    /// Rendered files, keyed by file name
    pub files: IndexMap<String, String>,
    /// The lowered registry
    pub registry: TypeRegistry,
}

impl Translation {
    /// Write every file under `dir`
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        write_files(&self.files, dir.as_ref())
    }

    /// Contents of one rendered file
    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// The registry as pretty-printed JSON
    pub fn registry_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.registry)?)
    }
}

/// XSD to Protocol Buffers translator
#[derive(Debug, Clone, Default)]
pub struct Translator {
    options: Options,
}

impl Translator {
    /// Create a translator
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// The translation options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Translate a schema file and everything it references
    pub fn translate_file(&self, path: impl AsRef<Path>) -> Result<Translation> {
        let path = path.as_ref();
        let mut handler = LoggingErrorHandler::new();
        let set = self.loader().load_file(path, &mut handler)?;
        report_diagnostics(&handler);

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(DEFAULT_STEM);
        self.translate_set(&set, stem)
    }

    /// Translate schema text; relative references resolve against `base_dir`
    pub fn translate_str(&self, text: &str, base_dir: Option<&Path>) -> Result<Translation> {
        let mut handler = LoggingErrorHandler::new();
        let set = self.loader().load_str(text, base_dir, &mut handler)?;
        report_diagnostics(&handler);
        self.translate_set(&set, DEFAULT_STEM)
    }

    /// Translate an already loaded schema set
    pub fn translate_set(&self, set: &SchemaSet, stem: &str) -> Result<Translation> {
        let mut marshaller = self.options.marshaller()?;

        let (mapper, layout) = if self.options.split_by_namespace {
            (NamespaceMapper::new(), OutputLayout::SplitByNamespace)
        } else {
            let package = self
                .options
                .package
                .clone()
                .unwrap_or_else(|| namespace_to_package(set.root_namespace()));
            let filename = self
                .options
                .filename
                .clone()
                .unwrap_or_else(|| format!("{}.proto", stem));
            (
                NamespaceMapper::new().with_fixed_package(package),
                OutputLayout::Single { filename },
            )
        };

        tracing::info!("lowering {} schema documents", set.schemas.len());
        let mut registry = lower(set, &mapper);
        tracing::info!(
            "lowered {} messages, {} enumerations",
            registry.messages().count(),
            registry.enums().count()
        );

        let mut writer = OutputWriter::new(layout);
        Emitter::new(&mut registry, &mut marshaller, &mut writer, &self.options).emit()?;
        let files = writer.render(&marshaller);

        Ok(Translation { files, registry })
    }

    fn loader(&self) -> SchemaLoader {
        SchemaLoader::new().with_allow_dtd(self.options.allow_dtd)
    }
}

fn report_diagnostics(handler: &LoggingErrorHandler) {
    if handler.warning_count() > 0 || handler.error_count() > 0 {
        tracing::info!(
            "schema loaded with {} warnings and {} errors",
            handler.warning_count(),
            handler.error_count()
        );
    }
}
