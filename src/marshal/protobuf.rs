//! Protocol Buffers marshaller (proto2 and proto3)

use std::fmt;

use serde::{Deserialize, Serialize};

use super::mappings::RegexMappings;
use super::Marshaller;
use crate::error::{Error, Result};
use crate::names::{to_enum_value, to_field_name};

const INDENT: &str = "  ";

/// Protocol Buffers syntax version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProtobufVersion {
    /// proto2: every singular field is `required` or `optional`
    #[default]
    Proto2,
    /// proto3: only `repeated` is spelled out
    Proto3,
}

impl TryFrom<u8> for ProtobufVersion {
    type Error = Error;

    fn try_from(version: u8) -> Result<Self> {
        match version {
            2 => Ok(ProtobufVersion::Proto2),
            3 => Ok(ProtobufVersion::Proto3),
            other => Err(Error::Config(format!(
                "unsupported protobuf version {}, expected 2 or 3",
                other
            ))),
        }
    }
}

impl From<ProtobufVersion> for u8 {
    fn from(version: ProtobufVersion) -> u8 {
        match version {
            ProtobufVersion::Proto2 => 2,
            ProtobufVersion::Proto3 => 3,
        }
    }
}

impl fmt::Display for ProtobufVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtobufVersion::Proto2 => write!(f, "proto2"),
            ProtobufVersion::Proto3 => write!(f, "proto3"),
        }
    }
}

/// Marshaller producing `.proto` text
#[derive(Debug, Clone)]
pub struct ProtobufMarshaller {
    version: ProtobufVersion,
    type_mappings: RegexMappings,
    name_mappings: RegexMappings,
    depth: usize,
}

impl Default for ProtobufMarshaller {
    fn default() -> Self {
        Self::new(ProtobufVersion::default())
    }
}

impl ProtobufMarshaller {
    /// Create a marshaller with the default type table
    pub fn new(version: ProtobufVersion) -> Self {
        Self {
            version,
            type_mappings: RegexMappings::default_types(),
            name_mappings: RegexMappings::new(),
            depth: 0,
        }
    }

    /// Put custom type mappings ahead of the default table
    pub fn with_custom_type_mappings(mut self, custom: RegexMappings) -> Self {
        let mut mappings = custom;
        mappings.extend(&self.type_mappings);
        self.type_mappings = mappings;
        self
    }

    /// Set the name mapping table
    pub fn with_name_mappings(mut self, mappings: RegexMappings) -> Self {
        self.name_mappings = mappings;
        self
    }

    fn indent(&self) -> String {
        INDENT.repeat(self.depth)
    }

    fn modifier(&self, required: bool, repeated: bool) -> &'static str {
        match (self.version, repeated, required) {
            (_, true, _) => "repeated ",
            (ProtobufVersion::Proto2, false, true) => "required ",
            (ProtobufVersion::Proto2, false, false) => "optional ",
            (ProtobufVersion::Proto3, false, _) => "",
        }
    }
}

impl Marshaller for ProtobufMarshaller {
    fn write_header(&self, package: &str) -> String {
        let mut header = format!("syntax = \"{}\";\n\n", self.version);
        if !package.is_empty() {
            header.push_str(&format!("package {};\n\n", package));
        }
        header
    }

    fn write_include(&self, file: &str) -> String {
        format!("import \"{}\";\n", file)
    }

    fn write_struct_header(&mut self, name: &str) -> String {
        let header = format!("{}message {} {{\n", self.indent(), name);
        self.depth += 1;
        header
    }

    fn write_struct_parameter(
        &self,
        order: u32,
        required: bool,
        repeated: bool,
        name: &str,
        type_name: &str,
        documentation: Option<&str>,
    ) -> String {
        let mut line = format!(
            "{}{}{} {} = {};",
            self.indent(),
            self.modifier(required, repeated),
            type_name,
            self.field_identifier(name),
            order
        );
        if let Some(doc) = documentation {
            let doc: Vec<&str> = doc.split_whitespace().collect();
            if !doc.is_empty() {
                line.push_str(" // ");
                line.push_str(&doc.join(" "));
            }
        }
        line.push('\n');
        line
    }

    fn write_struct_footer(&mut self) -> String {
        self.depth = self.depth.saturating_sub(1);
        format!("{}}}\n\n", self.indent())
    }

    fn write_enum_header(&mut self, name: &str) -> String {
        let header = format!("{}enum {} {{\n", self.indent(), name);
        self.depth += 1;
        header
    }

    fn write_enum_value(&self, order: u32, value: &str) -> String {
        format!("{}{} = {};\n", self.indent(), self.enum_value_identifier(value), order)
    }

    fn write_enum_footer(&mut self) -> String {
        self.depth = self.depth.saturating_sub(1);
        format!("{}}}\n", self.indent())
    }

    fn write_comment(&self, documentation: &str) -> String {
        let indent = self.indent();
        let mut comment = format!("{}/*\n", indent);
        for line in documentation.trim().lines() {
            let line = line.trim();
            if line.is_empty() {
                comment.push_str(&format!("{} *\n", indent));
            } else {
                comment.push_str(&format!("{} * {}\n", indent, line));
            }
        }
        comment.push_str(&format!("{} */\n", indent));
        comment
    }

    fn type_mapping(&self, xsd_type: &str) -> Option<String> {
        self.type_mappings.apply(xsd_type)
    }

    fn name_mapping(&self, name: &str) -> Option<String> {
        self.name_mappings.apply(name)
    }

    fn field_identifier(&self, name: &str) -> String {
        to_field_name(name)
    }

    fn enum_value_identifier(&self, value: &str) -> String {
        to_enum_value(value)
    }

    fn is_nested_enums(&self) -> bool {
        true
    }

    fn is_circular_dependency_supported(&self) -> bool {
        true
    }
}
