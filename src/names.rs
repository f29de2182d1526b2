//! Identifier sanitising and case conversion
//!
//! XSD names are far more permissive than Protocol Buffers identifiers. This
//! module rewrites them into legal identifiers and converts them to the case
//! conventions of the generated schema.

use crate::xsd::builtins::is_basic_type;
use heck::{ToShoutySnakeCase, ToSnakeCase};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_IDENTIFIER_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_]").expect("valid identifier regex"));

/// Words that may not be used as generated identifiers
pub const RESERVED_WORDS: &[&str] = &[
    "interface",
    "is",
    "class",
    "optional",
    "yield",
    "abstract",
    "required",
    "volatile",
    "transient",
    "service",
    "else",
];

/// Check if a character may start an identifier
pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character may appear inside an identifier
pub fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Check if a name is a reserved word
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Check if a string is already a legal identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => is_identifier_start(first) && chars.all(is_identifier_part),
        None => false,
    }
}

/// Rewrite a type name into a legal identifier
///
/// Illegal characters become `_`, a name that cannot start an identifier is
/// prefixed with `_`, and so is a reserved word.
pub fn escape_type(name: &str) -> String {
    let mut escaped = NON_IDENTIFIER_CHAR.replace_all(name, "_").into_owned();

    match escaped.chars().next() {
        Some(first) if is_identifier_start(first) => {}
        _ => escaped.insert(0, '_'),
    }

    if is_reserved_word(&escaped) {
        escaped.insert(0, '_');
    }
    escaped
}

/// Rewrite a field or value name into a legal identifier
///
/// Same as [`escape_type`], and additionally keeps the name clear of the
/// basic type names.
pub fn escape(name: &str) -> String {
    let mut escaped = escape_type(name);
    if is_basic_type(&escaped) {
        escaped.insert(0, '_');
    }
    escaped
}

/// Convert a name to field case (`baseObjectType` -> `base_object_type`)
pub fn to_field_name(name: &str) -> String {
    convert_case(name, |s| s.to_snake_case())
}

/// Convert a name to enum value case (`Color_notSet` -> `COLOR_NOT_SET`)
pub fn to_enum_value(name: &str) -> String {
    convert_case(name, |s| s.to_shouty_snake_case())
}

fn convert_case(name: &str, convert: impl Fn(&str) -> String) -> String {
    let trimmed = name.trim_start_matches('_');
    let prefix = &name[..name.len() - trimmed.len()];
    let converted = format!("{}{}", prefix, convert(trimmed));

    match converted.chars().next() {
        Some(first) if is_identifier_start(first) => converted,
        _ => format!("_{}", converted),
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_type_replaces_illegal_chars() {
        assert_eq!(escape_type("my-element"), "my_element");
        assert_eq!(escape_type("a.b c"), "a_b_c");
        assert_eq!(escape_type("Person"), "Person");
    }

    #[test]
    fn test_escape_type_bad_start() {
        assert_eq!(escape_type("1st"), "_1st");
        assert_eq!(escape_type("-x"), "_x");
        assert_eq!(escape_type(""), "_");
    }

    #[test]
    fn test_escape_type_reserved() {
        assert_eq!(escape_type("class"), "_class");
        assert_eq!(escape_type("required"), "_required");
        assert_eq!(escape_type("Class"), "Class");
    }

    #[test]
    fn test_escape_basic_types() {
        assert_eq!(escape("string"), "_string");
        assert_eq!(escape("Name"), "_Name");
        assert_eq!(escape("name"), "name");
        assert_eq!(escape_type("string"), "string");
    }

    #[test]
    fn test_escape_idempotent() {
        for name in ["class", "string", "9lives", "a-b", "plain", ""] {
            let once = escape(name);
            assert_eq!(escape(&once), once);
            let once = escape_type(name);
            assert_eq!(escape_type(&once), once);
        }
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("element"));
        assert!(is_valid_identifier("_element"));
        assert!(is_valid_identifier("élan"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("123element"));
        assert!(!is_valid_identifier("my-element"));
    }

    #[test]
    fn test_field_case() {
        assert_eq!(to_field_name("baseObjectType"), "base_object_type");
        assert_eq!(to_field_name("Name"), "name");
        assert_eq!(to_field_name("_Name"), "_name");
        assert_eq!(to_field_name("object"), "object");
    }

    #[test]
    fn test_enum_value_case() {
        assert_eq!(to_enum_value("Color_notSet"), "COLOR_NOT_SET");
        assert_eq!(to_enum_value("Color_RED"), "COLOR_RED");
        assert_eq!(to_enum_value("notSet"), "NOT_SET");
        assert_eq!(to_enum_value("_string"), "_STRING");
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("element"), (None, "element"));
        assert_eq!(split_qname("xs:element"), (Some("xs"), "element"));
    }
}
