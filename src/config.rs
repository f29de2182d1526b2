//! Translation options
//!
//! Options can be read from a TOML file with kebab-case keys; every key is
//! optional. Command line flags override the file.
//!
//! ```toml
//! protobuf-version = 3
//! nest-enums = false
//! enum-order-start = 0
//!
//! [type-mappings]
//! dateTime = "google.protobuf.Timestamp"
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::marshal::{ProtobufMarshaller, ProtobufVersion, RegexMappings};

/// Options controlling a translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    /// Protocol Buffers syntax version
    pub protobuf_version: ProtobufVersion,
    /// Emit enumerations inside the messages that use them
    pub nest_enums: bool,
    /// Number of the first enumeration value
    pub enum_order_start: u32,
    /// Prefix enumeration values with the enumeration name
    pub type_in_enums: bool,
    /// Emit message and enumeration documentation blocks
    pub include_message_docs: bool,
    /// Emit trailing field documentation comments
    pub include_field_docs: bool,
    /// Write one file per package instead of a single file
    pub split_by_namespace: bool,
    /// Package of the single output file (defaults to the root namespace's)
    pub package: Option<String>,
    /// Name of the single output file (defaults to the input's stem)
    pub filename: Option<String>,
    /// Accept schema documents that carry a DOCTYPE
    pub allow_dtd: bool,
    /// Custom type mappings, regex to target type, tried before the defaults
    pub type_mappings: IndexMap<String, String>,
    /// Renames of message, field and type names, regex to replacement
    pub name_mappings: IndexMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            protobuf_version: ProtobufVersion::Proto2,
            nest_enums: true,
            enum_order_start: 1,
            type_in_enums: true,
            include_message_docs: true,
            include_field_docs: true,
            split_by_namespace: false,
            package: None,
            filename: None,
            allow_dtd: false,
            type_mappings: IndexMap::new(),
            name_mappings: IndexMap::new(),
        }
    }
}

impl Options {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Compiled custom type mappings
    pub fn type_mapping_table(&self) -> Result<RegexMappings> {
        RegexMappings::from_pairs(
            self.type_mappings
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    /// Compiled name mappings
    pub fn name_mapping_table(&self) -> Result<RegexMappings> {
        RegexMappings::from_pairs(
            self.name_mappings
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    /// Build the marshaller these options describe
    pub fn marshaller(&self) -> Result<ProtobufMarshaller> {
        Ok(ProtobufMarshaller::new(self.protobuf_version)
            .with_custom_type_mappings(self.type_mapping_table()?)
            .with_name_mappings(self.name_mapping_table()?))
    }
}
