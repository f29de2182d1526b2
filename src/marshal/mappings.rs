//! Regex-keyed mapping tables
//!
//! Type and name mappings are ordered lists of `(pattern, replacement)`
//! pairs. Patterns match whole names; the first matching entry wins and its
//! replacement may refer to capture groups (`$1`, `${name}`).

use regex::Regex;

use crate::error::{Error, Result};

/// Default XSD-to-Protobuf type table
pub const DEFAULT_TYPE_MAPPINGS: &[(&str, &str)] = &[
    ("positiveInteger", "int64"),
    ("nonNegativeInteger", "int64"),
    ("integer", "int64"),
    ("long", "int64"),
    ("int", "int32"),
    ("short", "int32"),
    ("nonPositiveInteger", "sint64"),
    ("negativeInteger", "sint64"),
    ("unsignedLong", "uint64"),
    ("unsignedInt", "uint32"),
    ("unsignedShort", "uint32"),
    ("unsignedByte", "uint32"),
    ("decimal", "double"),
    ("double", "double"),
    ("float", "float"),
    ("boolean", "bool"),
    // Days since 1970-01-01
    ("date", "int32"),
    // Milliseconds since 1970-01-01T00:00:00Z
    ("dateTime", "int64"),
    ("time", "google.protobuf.Timestamp"),
    ("duration", "google.protobuf.Duration"),
    ("string", "string"),
    ("normalizedString", "string"),
    ("anyURI", "string"),
    ("ID", "string"),
    ("IDREF", "string"),
    ("Name", "string"),
    ("NMTOKEN", "string"),
    ("NMTOKENS", "string"),
    ("anyType", "UnspecifiedType"),
    ("anySimpleType", "UnspecifiedType"),
    ("base64Binary", "bytes"),
    ("hexBinary", "bytes"),
    ("byte", "bytes"),
    ("binary", "bytes"),
];

/// Well-known types and the files that define them
pub const WELL_KNOWN_IMPORTS: &[(&str, &str)] = &[
    ("google.protobuf.Timestamp", "google/protobuf/timestamp.proto"),
    ("google.protobuf.Duration", "google/protobuf/duration.proto"),
];

#[derive(Debug, Clone)]
struct MappingEntry {
    regex: Regex,
    replacement: String,
}

/// Ordered regex mapping table
#[derive(Debug, Clone, Default)]
pub struct RegexMappings {
    entries: Vec<MappingEntry>,
}

impl RegexMappings {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The default type table, with each name matched literally
    pub fn default_types() -> Self {
        let entries = DEFAULT_TYPE_MAPPINGS
            .iter()
            .filter_map(|(name, target)| {
                let regex = Regex::new(&format!("^{}$", regex::escape(name))).ok()?;
                Some(MappingEntry {
                    regex,
                    replacement: target.to_string(),
                })
            })
            .collect();
        Self { entries }
    }

    /// Build a table from `(pattern, replacement)` pairs, keeping their order
    pub fn from_pairs<'p, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'p str, &'p str)>,
    {
        let mut mappings = Self::new();
        for (pattern, replacement) in pairs {
            mappings.insert(pattern, replacement)?;
        }
        Ok(mappings)
    }

    /// Append an entry; the pattern must match the whole name
    pub fn insert(&mut self, pattern: &str, replacement: &str) -> Result<()> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        self.entries.push(MappingEntry {
            regex,
            replacement: replacement.to_string(),
        });
        Ok(())
    }

    /// Append every entry of another table after the entries of this one
    pub fn extend(&mut self, other: &RegexMappings) {
        self.entries.extend(other.entries.iter().cloned());
    }

    /// Replacement for a name, from the first matching entry
    pub fn apply(&self, name: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|entry| entry.regex.is_match(name))
            .map(|entry| {
                entry
                    .regex
                    .replace(name, entry.replacement.as_str())
                    .into_owned()
            })
    }
}

/// Split a `PATTERN=REPLACEMENT` argument
pub fn parse_mapping(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((pattern, replacement)) if !pattern.is_empty() => {
            Ok((pattern.to_string(), replacement.to_string()))
        }
        _ => Err(Error::Mapping(format!(
            "expected PATTERN=REPLACEMENT, got '{}'",
            arg
        ))),
    }
}

/// Import path for a mapped type
pub fn import_for_mapped(mapped: &str) -> Option<&'static str> {
    WELL_KNOWN_IMPORTS
        .iter()
        .find(|(name, _)| *name == mapped)
        .map(|(_, path)| *path)
}
