//! Type registry
//!
//! The in-memory result of lowering: messages, enumerations and simple type
//! aliases keyed by name. Messages reference each other by name only, so a
//! cyclic schema never forms a cyclic data structure here.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexSet;
use serde::Serialize;

use crate::xsd::builtins::{is_basic_type, BASIC_TYPES, BINARY, XSD_STRING};

/// Name of the fallback message carrying `anyType` content
pub const UNSPECIFIED_TYPE: &str = "UnspecifiedType";

/// A message field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Field name (unsanitised)
    pub name: String,
    /// Declared type name
    pub type_name: String,
    /// Package of the declared type; None means the message's own package
    pub type_namespace: Option<String>,
    /// Whether the field is required
    pub required: bool,
    /// Whether the field repeats
    pub repeated: bool,
    /// Fixed value constraint from the schema
    pub fixed_value: Option<String>,
    /// Documentation text
    pub documentation: Option<String>,
}

impl Field {
    /// Create a singular optional field
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            type_namespace: None,
            required: false,
            repeated: false,
            fixed_value: None,
            documentation: None,
        }
    }

    /// Set the required flag
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the repeated flag
    pub fn repeated(mut self, repeated: bool) -> Self {
        self.repeated = repeated;
        self
    }

    /// Set the package of the declared type
    pub fn with_type_namespace(mut self, namespace: Option<String>) -> Self {
        self.type_namespace = namespace;
        self
    }

    /// Set the fixed value
    pub fn with_fixed_value(mut self, fixed: Option<String>) -> Self {
        self.fixed_value = fixed;
        self
    }

    /// Set the documentation
    pub fn with_documentation(mut self, documentation: Option<String>) -> Self {
        self.documentation = documentation;
        self
    }
}

/// A message produced from a complex type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Message name (unsanitised)
    pub name: String,
    /// Package the message belongs to
    pub namespace: String,
    fields: Vec<Field>,
    /// Name of the base type, informational
    pub parent: Option<String>,
    /// Documentation text
    pub documentation: Option<String>,
}

impl Message {
    /// Create an empty message
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            fields: Vec::new(),
            parent: None,
            documentation: None,
        }
    }

    /// Append a field; a field whose name is already present is dropped
    pub fn add_field(&mut self, field: Field) -> bool {
        if self.has_field(&field.name) {
            tracing::trace!("{}: field '{}' already present", self.name, field.name);
            return false;
        }
        self.fields.push(field);
        true
    }

    /// Whether a field with this name exists
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Fields in insertion order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields in emission order (lexicographic by name)
    pub fn sorted_fields(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.iter().collect();
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        fields
    }

    /// Names of every type the fields refer to
    pub fn type_names(&self) -> BTreeSet<String> {
        self.fields.iter().map(|f| f.type_name.clone()).collect()
    }
}

/// An enumeration produced from a simple type with enumeration facets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enumeration {
    /// Enumeration name (unsanitised)
    pub name: String,
    /// Package the enumeration belongs to
    pub namespace: String,
    values: IndexSet<String>,
    /// Documentation text
    pub documentation: Option<String>,
}

impl Enumeration {
    /// Create an empty enumeration
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            values: IndexSet::new(),
            documentation: None,
        }
    }

    /// Add a value; duplicates keep their first position
    pub fn add_value(&mut self, value: impl Into<String>) -> bool {
        self.values.insert(value.into())
    }

    /// Values in declaration order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Whether the enumeration has no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Generator of synthetic names for anonymous types
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnonymousCounter {
    next: u32,
}

impl AnonymousCounter {
    /// The next name: `Anonymous001`, `Anonymous002`, ...
    pub fn next_name(&mut self) -> String {
        self.next += 1;
        format!("Anonymous{:03}", self.next)
    }
}

/// The lowered schema
///
/// Messages, enumerations and aliases share one namespace; the first
/// definition of a name wins.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeRegistry {
    messages: BTreeMap<String, Message>,
    enums: BTreeMap<String, Enumeration>,
    aliases: BTreeMap<String, String>,
    documentation: BTreeMap<String, String>,
    #[serde(skip)]
    anonymous: AnonymousCounter,
    #[serde(skip)]
    declared: BTreeSet<String>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The fallback message for `anyType` content
    pub fn unspecified_type(namespace: impl Into<String>) -> Message {
        let mut message = Message::new(UNSPECIFIED_TYPE, namespace);
        message.add_field(Field::new("baseObjectType", XSD_STRING).required(true));
        message.add_field(Field::new("object", BINARY).required(true));
        message
    }

    /// Whether a message, enum or alias has this name
    pub fn contains_name(&self, name: &str) -> bool {
        self.messages.contains_key(name)
            || self.enums.contains_key(name)
            || self.aliases.contains_key(name)
    }

    /// Register a message; false if the name is taken
    pub fn insert_message(&mut self, message: Message) -> bool {
        if self.contains_name(&message.name) {
            return false;
        }
        self.messages.insert(message.name.clone(), message);
        true
    }

    /// Register an enumeration; false if the name is taken
    pub fn insert_enum(&mut self, enumeration: Enumeration) -> bool {
        if self.contains_name(&enumeration.name) {
            return false;
        }
        self.enums.insert(enumeration.name.clone(), enumeration);
        true
    }

    /// Register an alias of a basic type; false if the name is taken
    pub fn insert_alias(&mut self, name: impl Into<String>, basic: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains_name(&name) {
            return false;
        }
        self.aliases.insert(name, basic.into());
        true
    }

    /// Record documentation for a name; the first text wins
    pub fn add_documentation(&mut self, name: &str, documentation: Option<&str>) {
        if let Some(doc) = documentation {
            self.documentation
                .entry(name.to_string())
                .or_insert_with(|| doc.to_string());
        }
    }

    /// Documentation recorded for a name
    pub fn documentation(&self, name: &str) -> Option<&str> {
        self.documentation.get(name).map(String::as_str)
    }

    /// Message by name
    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.get(name)
    }

    /// Mutable message by name
    pub fn message_mut(&mut self, name: &str) -> Option<&mut Message> {
        self.messages.get_mut(name)
    }

    /// Enumeration by name
    pub fn enumeration(&self, name: &str) -> Option<&Enumeration> {
        self.enums.get(name)
    }

    /// Basic type an alias resolves to
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Whether a name is a message
    pub fn is_message(&self, name: &str) -> bool {
        self.messages.contains_key(name)
    }

    /// Whether a name is an enumeration
    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    /// Package of a message or enumeration
    pub fn namespace_of(&self, name: &str) -> Option<&str> {
        self.messages
            .get(name)
            .map(|m| m.namespace.as_str())
            .or_else(|| self.enums.get(name).map(|e| e.namespace.as_str()))
    }

    /// Messages in name order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Enumerations in name order
    pub fn enums(&self) -> impl Iterator<Item = &Enumeration> {
        self.enums.values()
    }

    /// Aliases in name order
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A fresh synthetic name for an anonymous type
    pub fn next_anonymous_name(&mut self) -> String {
        self.anonymous.next_name()
    }

    /// Mark a message as written during emission
    pub fn mark_declared(&mut self, name: &str) {
        self.declared.insert(name.to_string());
    }

    /// Whether a message has been written
    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    /// Whether a type name can be referenced by an emitted field: a written
    /// message, a basic type, an enumeration or an alias
    pub fn is_available(&self, name: &str) -> bool {
        self.declared.contains(name)
            || is_basic_type(name)
            || self.enums.contains_key(name)
            || self.aliases.contains_key(name)
    }

    /// Every name that counts as declared for dependency resolution
    pub fn declared_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self.declared.clone();
        names.extend(BASIC_TYPES.iter().map(|s| s.to_string()));
        names.extend(self.enums.keys().cloned());
        names.extend(self.aliases.keys().cloned());
        names
    }

    /// Messages not yet written, in name order
    pub fn undeclared_messages(&self) -> Vec<&Message> {
        self.messages
            .values()
            .filter(|m| !self.declared.contains(&m.name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_field_first_writer_wins() {
        let mut message = Message::new("Person", "ex");
        assert!(message.add_field(Field::new("name", "string").required(true)));
        assert!(!message.add_field(Field::new("name", "int")));
        assert_eq!(message.fields().len(), 1);
        assert_eq!(message.fields()[0].type_name, "string");
        assert!(message.fields()[0].required);
    }

    #[test]
    fn test_sorted_fields() {
        let mut message = Message::new("M", "");
        message.add_field(Field::new("zeta", "string"));
        message.add_field(Field::new("alpha", "int"));
        message.add_field(Field::new("Beta", "int"));
        let names: Vec<&str> = message.sorted_fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "alpha", "zeta"]);
    }

    #[test]
    fn test_enum_values_deduplicated() {
        let mut colors = Enumeration::new("Color", "ex");
        colors.add_value("RED");
        colors.add_value("GREEN");
        assert!(!colors.add_value("RED"));
        assert_eq!(colors.values().collect::<Vec<_>>(), vec!["RED", "GREEN"]);
    }

    #[test]
    fn test_anonymous_names() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.next_anonymous_name(), "Anonymous001");
        assert_eq!(registry.next_anonymous_name(), "Anonymous002");
    }

    #[test]
    fn test_shared_namespace() {
        let mut registry = TypeRegistry::new();
        assert!(registry.insert_enum(Enumeration::new("Color", "ex")));
        assert!(!registry.insert_message(Message::new("Color", "ex")));
        assert!(!registry.insert_alias("Color", "string"));
        assert!(registry.insert_alias("Token", "normalizedString"));
        assert!(!registry.insert_message(Message::new("Token", "ex")));
        assert!(registry.insert_message(Message::new("Person", "ex")));
        assert!(!registry.insert_message(Message::new("Person", "other")));
        assert_eq!(registry.namespace_of("Person"), Some("ex"));
    }

    #[test]
    fn test_unspecified_type() {
        let message = TypeRegistry::unspecified_type("ex");
        assert_eq!(message.name, UNSPECIFIED_TYPE);
        let fields = message.sorted_fields();
        assert_eq!(fields[0].name, "baseObjectType");
        assert_eq!(fields[1].type_name, BINARY);
        assert!(fields.iter().all(|f| f.required));
    }

    #[test]
    fn test_declared_tracking() {
        let mut registry = TypeRegistry::new();
        registry.insert_message(Message::new("A", ""));
        registry.insert_message(Message::new("B", ""));
        registry.insert_alias("Code", "string");
        assert!(registry.is_available("string"));
        assert!(registry.is_available("Code"));
        assert!(!registry.is_available("A"));

        registry.mark_declared("A");
        assert!(registry.is_available("A"));
        let undeclared: Vec<&str> = registry
            .undeclared_messages()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(undeclared, vec!["B"]);
    }

    #[test]
    fn test_documentation_first_wins() {
        let mut registry = TypeRegistry::new();
        registry.add_documentation("A", Some("first"));
        registry.add_documentation("A", Some("second"));
        registry.add_documentation("B", None);
        assert_eq!(registry.documentation("A"), Some("first"));
        assert_eq!(registry.documentation("B"), None);
    }
}
