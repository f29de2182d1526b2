//! XSD built-in types
//!
//! The basic types are the built-ins the marshaller maps directly. Every other
//! built-in is aliased to its nearest basic ancestor.

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};

/// XSD namespace URI
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Suffix identifying any revision of the XML Schema meta-namespace
pub const XSD_NAMESPACE_SUFFIX: &str = "/XMLSchema";

/// xs:anyType
pub const XSD_ANY_TYPE: &str = "anyType";
/// xs:anySimpleType
pub const XSD_ANY_SIMPLE_TYPE: &str = "anySimpleType";
/// xs:string
pub const XSD_STRING: &str = "string";

/// Placeholder for unresolvable types; not a real XSD built-in
pub const BINARY: &str = "binary";

/// Built-in names the marshaller maps directly
pub const BASIC_TYPES: &[&str] = &[
    "string",
    "normalizedString",
    "anyType",
    "anyURI",
    "anySimpleType",
    "integer",
    "positiveInteger",
    "nonPositiveInteger",
    "negativeInteger",
    "nonNegativeInteger",
    "unsignedLong",
    "unsignedInt",
    "unsignedShort",
    "unsignedByte",
    "base64Binary",
    "hexBinary",
    BINARY,
    "boolean",
    "date",
    "dateTime",
    "time",
    "duration",
    "decimal",
    "float",
    "double",
    "byte",
    "short",
    "long",
    "int",
    "ID",
    "IDREF",
    "NMTOKEN",
    "NMTOKENS",
    "Name",
];

/// Base of every built-in outside the basic set
const DERIVED_BUILTINS: &[(&str, &str)] = &[
    ("token", "normalizedString"),
    ("language", "token"),
    ("NCName", "Name"),
    ("ENTITY", "NCName"),
    ("ENTITIES", "ENTITY"),
    ("IDREFS", "IDREF"),
    ("QName", "string"),
    ("NOTATION", "string"),
    ("gYearMonth", "string"),
    ("gYear", "string"),
    ("gMonthDay", "string"),
    ("gDay", "string"),
    ("gMonth", "string"),
    ("anyAtomicType", "anySimpleType"),
    ("dateTimeStamp", "dateTime"),
    ("dayTimeDuration", "duration"),
    ("yearMonthDuration", "duration"),
];

static BASIC_SET: Lazy<BTreeSet<&'static str>> = Lazy::new(|| BASIC_TYPES.iter().copied().collect());

static DERIVED_MAP: Lazy<BTreeMap<&'static str, &'static str>> =
    Lazy::new(|| DERIVED_BUILTINS.iter().copied().collect());

/// Check if a namespace is the XML Schema meta-namespace (any revision)
pub fn is_xsd_namespace(namespace: Option<&str>) -> bool {
    namespace
        .map(|ns| ns == XSD_NAMESPACE || ns.ends_with(XSD_NAMESPACE_SUFFIX))
        .unwrap_or(false)
}

/// Check if a local name is one of the basic types
pub fn is_basic_type(name: &str) -> bool {
    BASIC_SET.contains(name)
}

/// Nearest basic ancestor of a built-in, or `None` for unknown names
pub fn nearest_basic(name: &str) -> Option<&'static str> {
    if let Some(basic) = BASIC_SET.get(name) {
        return Some(*basic);
    }
    let mut current = DERIVED_MAP.get(name).copied()?;
    // The table is acyclic and shallow
    while !is_basic_type(current) {
        current = DERIVED_MAP.get(current).copied()?;
    }
    Some(current)
}
