//! XML namespace handling
//!
//! This module provides qualified names (QNames) for schema components and
//! the mapping from XML target namespaces to dotted package identifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Namespace as a string slice
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

const SCHEMES: &[&str] = &["http://", "https://", "urn:"];

static NON_PACKAGE_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_.]").expect("valid package regex"));

static DIGIT_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(\p{Nd})").expect("valid segment regex"));

/// Convert a namespace URI into a dotted package identifier
///
/// `http://www.example.com/schemas/v2` becomes `com.example.www.schemas.v2`,
/// `urn:ex` becomes `ex`. A missing or empty namespace maps to the empty
/// (default) package.
pub fn namespace_to_package(uri: Option<&str>) -> String {
    let uri = match uri.map(str::trim) {
        Some(uri) if !uri.is_empty() => uri,
        _ => return String::new(),
    };

    let stripped = SCHEMES
        .iter()
        .find_map(|scheme| uri.strip_prefix(scheme))
        .unwrap_or(uri);

    let mut segments = stripped.split(['/', ':']).filter(|s| !s.is_empty());
    let mut parts: Vec<&str> = Vec::new();
    if let Some(host) = segments.next() {
        parts.extend(host.split('.').rev().filter(|s| !s.is_empty()));
    }
    parts.extend(segments);

    let joined = parts.join(".");
    let sanitized = NON_PACKAGE_CHAR.replace_all(&joined, "_");
    let mut package = DIGIT_SEGMENT.replace_all(&sanitized, "_${1}").into_owned();

    if package.chars().next().map_or(false, |c| c.is_numeric()) {
        package.insert(0, '_');
    }
    package
}

/// Maps target namespaces to packages
///
/// When output goes to a single file every namespace shares one fixed
/// package.
#[derive(Debug, Clone, Default)]
pub struct NamespaceMapper {
    fixed_package: Option<String>,
}

impl NamespaceMapper {
    /// Create a mapper deriving one package per namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every namespace to the same package
    pub fn with_fixed_package(mut self, package: impl Into<String>) -> Self {
        self.fixed_package = Some(package.into());
        self
    }

    /// The fixed package, if any
    pub fn fixed_package(&self) -> Option<&str> {
        self.fixed_package.as_deref()
    }

    /// Package for a namespace URI
    pub fn map(&self, uri: Option<&str>) -> String {
        match &self.fixed_package {
            Some(package) => package.clone(),
            None => namespace_to_package(uri),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_creation() {
        let qname = QName::namespaced("http://example.com", "element");
        assert_eq!(qname.namespace(), Some("http://example.com"));
        assert_eq!(qname.local_name, "element");
    }

    #[test]
    fn test_qname_display() {
        let qname = QName::namespaced("http://example.com", "element");
        assert_eq!(qname.to_string(), "{http://example.com}element");

        let qname_local = QName::local("element");
        assert_eq!(qname_local.to_string(), "element");
    }

    #[test]
    fn test_package_from_urn() {
        assert_eq!(namespace_to_package(Some("urn:ex")), "ex");
        assert_eq!(
            namespace_to_package(Some("urn:oasis:names:tc")),
            "oasis.names.tc"
        );
    }

    #[test]
    fn test_package_from_http() {
        assert_eq!(
            namespace_to_package(Some("http://www.example.com/schemas/order")),
            "com.example.www.schemas.order"
        );
        assert_eq!(
            namespace_to_package(Some("https://example.org/")),
            "org.example"
        );
    }

    #[test]
    fn test_package_digit_segments() {
        assert_eq!(
            namespace_to_package(Some("http://example.com/2020/types")),
            "com.example_2020.types"
        );
        assert_eq!(namespace_to_package(Some("urn:1ex")), "_1ex");
    }

    #[test]
    fn test_package_illegal_chars() {
        assert_eq!(
            namespace_to_package(Some("http://my-site.org/a b")),
            "org.my_site.a_b"
        );
    }

    #[test]
    fn test_package_empty() {
        assert_eq!(namespace_to_package(None), "");
        assert_eq!(namespace_to_package(Some("")), "");
        assert_eq!(namespace_to_package(Some("  ")), "");
    }

    #[test]
    fn test_mapper_fixed_package() {
        let mapper = NamespaceMapper::new().with_fixed_package("all");
        assert_eq!(mapper.map(Some("urn:ex")), "all");
        assert_eq!(mapper.map(None), "all");

        let mapper = NamespaceMapper::new();
        assert_eq!(mapper.map(Some("urn:ex")), "ex");
    }
}
