//! Target syntax marshallers
//!
//! A marshaller renders the pieces of a message or enumeration as target
//! schema text. The emitter decides what to write and in which order; the
//! marshaller only decides how it looks.

mod mappings;
mod protobuf;

pub use mappings::{
    import_for_mapped, parse_mapping, RegexMappings, DEFAULT_TYPE_MAPPINGS, WELL_KNOWN_IMPORTS,
};
pub use protobuf::{ProtobufMarshaller, ProtobufVersion};

/// Renderer of target schema text
pub trait Marshaller {
    /// File preamble: syntax and package directives
    fn write_header(&self, package: &str) -> String;

    /// One import line for a file
    fn write_include(&self, file: &str) -> String;

    /// Open a message
    fn write_struct_header(&mut self, name: &str) -> String;

    /// One message field
    fn write_struct_parameter(
        &self,
        order: u32,
        required: bool,
        repeated: bool,
        name: &str,
        type_name: &str,
        documentation: Option<&str>,
    ) -> String;

    /// Close a message
    fn write_struct_footer(&mut self) -> String;

    /// Open an enumeration
    fn write_enum_header(&mut self, name: &str) -> String;

    /// One enumeration value
    fn write_enum_value(&self, order: u32, value: &str) -> String;

    /// Close an enumeration
    fn write_enum_footer(&mut self) -> String;

    /// Documentation block preceding a message or enumeration
    fn write_comment(&self, documentation: &str) -> String;

    /// Target type for an XSD type name, if one is mapped
    fn type_mapping(&self, xsd_type: &str) -> Option<String>;

    /// User rename for a message, field or type name
    fn name_mapping(&self, name: &str) -> Option<String>;

    /// Import required by the mapped form of an XSD type
    fn import_for(&self, xsd_type: &str) -> Option<&'static str> {
        self.type_mapping(xsd_type)
            .and_then(|mapped| import_for_mapped(&mapped))
    }

    /// Identifier a field name is written as
    fn field_identifier(&self, name: &str) -> String {
        name.to_string()
    }

    /// Identifier an enumeration value is written as
    fn enum_value_identifier(&self, value: &str) -> String {
        value.to_string()
    }

    /// Whether enumerations may be nested inside messages
    fn is_nested_enums(&self) -> bool;

    /// Whether mutually dependent messages can be expressed
    fn is_circular_dependency_supported(&self) -> bool;
}
