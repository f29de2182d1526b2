//! Output file sink
//!
//! Every package gets its own in-memory stream. Cross-package references and
//! well-known imports are recorded while the body is written; the import
//! lines are only known once emission is complete, so files are assembled
//! and written at the very end.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::Result;
use crate::marshal::Marshaller;

/// File name used for the unnamed package in split mode
pub const DEFAULT_PACKAGE_FILE: &str = "default.proto";

/// How packages map to files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLayout {
    /// Everything goes into one file
    Single {
        /// Output file name
        filename: String,
    },
    /// One file per package, named after the package
    SplitByNamespace,
}

/// Buffered per-package output streams
#[derive(Debug, Clone)]
pub struct OutputWriter {
    layout: OutputLayout,
    streams: IndexMap<String, String>,
    inclusions: BTreeMap<String, BTreeSet<String>>,
    imports: BTreeMap<String, BTreeSet<String>>,
}

impl OutputWriter {
    /// Create an empty writer
    pub fn new(layout: OutputLayout) -> Self {
        Self {
            layout,
            streams: IndexMap::new(),
            inclusions: BTreeMap::new(),
            imports: BTreeMap::new(),
        }
    }

    /// Stream for a package, opened on first use
    pub fn stream(&mut self, package: &str) -> &mut String {
        self.streams.entry(package.to_string()).or_default()
    }

    /// Record that `from` refers to types of `to`
    pub fn add_inclusion(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        tracing::debug!("package '{}' includes '{}'", from, to);
        self.inclusions
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Record a direct import for a package
    pub fn add_import(&mut self, package: &str, path: &str) {
        self.imports
            .entry(package.to_string())
            .or_default()
            .insert(path.to_string());
    }

    /// File that holds a package
    pub fn file_name(&self, package: &str) -> String {
        match &self.layout {
            OutputLayout::Single { filename } => filename.clone(),
            OutputLayout::SplitByNamespace if package.is_empty() => DEFAULT_PACKAGE_FILE.to_string(),
            OutputLayout::SplitByNamespace => format!("{}.proto", package),
        }
    }

    /// Assemble header, imports and body of every file
    pub fn render(&self, marshaller: &dyn Marshaller) -> IndexMap<String, String> {
        let mut files: IndexMap<String, String> = IndexMap::new();
        for (package, body) in &self.streams {
            let file_name = self.file_name(package);

            let mut imports: BTreeSet<String> = self
                .imports
                .get(package)
                .map(|paths| paths.iter().cloned().collect())
                .unwrap_or_default();
            if let Some(included) = self.inclusions.get(package) {
                imports.extend(
                    included
                        .iter()
                        .map(|to| self.file_name(to))
                        .filter(|to| *to != file_name),
                );
            }

            let mut contents = marshaller.write_header(package);
            for import in &imports {
                contents.push_str(&marshaller.write_include(import));
            }
            if !imports.is_empty() {
                contents.push('\n');
            }
            contents.push_str(body.trim_end());
            contents.push('\n');

            match files.get_mut(&file_name) {
                // Only reachable in single-file mode with several packages
                Some(existing) => existing.push_str(&contents),
                None => {
                    files.insert(file_name, contents);
                }
            }
        }
        files
    }
}

/// Write rendered files under `dir`, creating it if needed
pub fn write_files(files: &IndexMap<String, String>, dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = dir.join(name);
        fs::write(&path, contents)?;
        tracing::info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::ProtobufMarshaller;
    use tempfile::TempDir;

    #[test]
    fn test_split_layout_with_inclusions() {
        let mut writer = OutputWriter::new(OutputLayout::SplitByNamespace);
        writer.stream("com.example.orders").push_str("message Order {\n}\n\n");
        writer.stream("com.example.common").push_str("message Address {\n}\n\n");
        writer.add_inclusion("com.example.orders", "com.example.common");
        writer.add_inclusion("com.example.orders", "com.example.orders");
        writer.add_import("com.example.orders", "google/protobuf/timestamp.proto");

        let files = writer.render(&ProtobufMarshaller::default());
        let names: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["com.example.orders.proto", "com.example.common.proto"]);
        assert_eq!(
            files["com.example.orders.proto"],
            "syntax = \"proto2\";\n\npackage com.example.orders;\n\n\
             import \"com.example.common.proto\";\n\
             import \"google/protobuf/timestamp.proto\";\n\n\
             message Order {\n}\n"
        );
        assert_eq!(
            files["com.example.common.proto"],
            "syntax = \"proto2\";\n\npackage com.example.common;\n\nmessage Address {\n}\n"
        );
    }

    #[test]
    fn test_single_layout() {
        let mut writer = OutputWriter::new(OutputLayout::Single {
            filename: "all.proto".to_string(),
        });
        writer.stream("ex").push_str("message A {\n}\n\n");
        assert_eq!(writer.file_name("anything"), "all.proto");
        let files = writer.render(&ProtobufMarshaller::default());
        assert_eq!(files.len(), 1);
        assert!(files["all.proto"].ends_with("message A {\n}\n"));
    }

    #[test]
    fn test_unnamed_package_file() {
        let writer = OutputWriter::new(OutputLayout::SplitByNamespace);
        assert_eq!(writer.file_name(""), DEFAULT_PACKAGE_FILE);
    }

    #[test]
    fn test_write_files_creates_dir() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested");
        let mut writer = OutputWriter::new(OutputLayout::SplitByNamespace);
        writer.stream("ex").push_str("message A {\n}\n\n");

        let written = write_files(&writer.render(&ProtobufMarshaller::default()), &out).unwrap();
        assert_eq!(written, vec![out.join("ex.proto")]);
        let contents = fs::read_to_string(out.join("ex.proto")).unwrap();
        assert!(contents.starts_with("syntax = \"proto2\";"));
    }
}
