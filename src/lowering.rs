//! Schema lowering
//!
//! Walks a [`SchemaSet`] and folds particles, attributes, attribute groups
//! and inheritance chains into the flat messages of a [`TypeRegistry`].
//!
//! Protocol Buffers has no subtype polymorphism, so every message is the
//! union of its type, its ancestors (whose fields keep their modality) and
//! its descendants (whose fields are forced optional).

use std::collections::{BTreeSet, HashMap};

use crate::names::to_field_name;
use crate::namespaces::{NamespaceMapper, QName};
use crate::registry::{Enumeration, Field, Message, TypeRegistry};
use crate::xsd::builtins::{
    is_basic_type, is_xsd_namespace, nearest_basic, XSD_ANY_SIMPLE_TYPE, XSD_ANY_TYPE, XSD_STRING,
};
use crate::xsd::{
    AttributeDecl, AttributeTerm, AttributeUse, ComplexType, Compositor, ContentType, ElementDecl,
    ModelGroup, Particle, SchemaSet, SimpleType, SimpleVariety, Term, TypeDefinition, TypeRef,
};

/// Restriction chains deeper than this are treated as cyclic
const MAX_DERIVATION_DEPTH: usize = 64;

/// Resolved type of a field
#[derive(Debug, Clone)]
struct TypeUse {
    name: String,
    namespace: Option<String>,
    repeated: bool,
}

impl TypeUse {
    fn basic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            repeated: false,
        }
    }
}

/// Lower a schema set into a type registry
pub fn lower(set: &SchemaSet, mapper: &NamespaceMapper) -> TypeRegistry {
    let mut lowering = Lowering::new(set, mapper);
    lowering.run();
    lowering.into_registry()
}

/// Lowering state for one translation
pub struct Lowering<'a> {
    set: &'a SchemaSet,
    mapper: &'a NamespaceMapper,
    registry: TypeRegistry,
    /// Names given to anonymous definitions, keyed by their address in the
    /// (immutable) schema set
    anonymous: HashMap<usize, String>,
    group_stack: Vec<QName>,
}

impl<'a> Lowering<'a> {
    /// Create a lowering over a schema set
    pub fn new(set: &'a SchemaSet, mapper: &'a NamespaceMapper) -> Self {
        Self {
            set,
            mapper,
            registry: TypeRegistry::new(),
            anonymous: HashMap::new(),
            group_stack: Vec::new(),
        }
    }

    /// Consume the lowering, returning the registry
    pub fn into_registry(self) -> TypeRegistry {
        self.registry
    }

    /// Process every top-level component of every non-XSD schema
    ///
    /// Named types go first, so a global type always owns its name over a
    /// simple-typed element wrapper of the same name.
    pub fn run(&mut self) {
        let set = self.set;
        let root_package = self.package_of(set.root_namespace());
        self.registry
            .insert_message(TypeRegistry::unspecified_type(root_package));

        let schemas: Vec<_> = set
            .schemas
            .iter()
            .filter(|s| !is_xsd_namespace(s.target_namespace.as_deref()))
            .collect();
        for schema in &schemas {
            tracing::debug!("lowering types of {}", schema.system_id);
            for name in &schema.complex_types {
                if let Some(TypeDefinition::Complex(ct)) = set.types.get(name) {
                    self.process_complex_type(ct, None);
                }
            }
            for name in &schema.simple_types {
                if let Some(TypeDefinition::Simple(st)) = set.types.get(name) {
                    self.process_simple_type(st, None);
                }
            }
        }
        for schema in &schemas {
            tracing::debug!("lowering elements of {}", schema.system_id);
            for name in &schema.elements {
                if let Some(element) = set.elements.get(name) {
                    self.process_element(element);
                }
            }
        }
    }

    fn package_of(&self, namespace: Option<&str>) -> String {
        self.mapper.map(namespace)
    }

    /// Lower a top-level element
    pub fn process_element(&mut self, element: &'a ElementDecl) {
        let set = self.set;
        let hint = element.name.local_name.as_str();
        match &element.type_ref {
            TypeRef::Anonymous(def) => match def.as_ref() {
                TypeDefinition::Complex(ct) => {
                    self.process_complex_type(ct, Some(hint));
                }
                TypeDefinition::Simple(st) => {
                    let type_use = self.simple_type_use(st, Some(hint));
                    self.wrap_simple_element(element, type_use);
                }
            },
            TypeRef::Named(name) if is_xsd_namespace(name.namespace()) => {
                if name.local_name == XSD_ANY_TYPE || name.local_name == XSD_ANY_SIMPLE_TYPE {
                    return;
                }
                let type_use = self.builtin_type_use(&name.local_name);
                self.wrap_simple_element(element, type_use);
            }
            TypeRef::Named(name) => match set.type_definition(name) {
                Some(TypeDefinition::Complex(ct)) => {
                    self.process_complex_type(ct, Some(hint));
                }
                Some(TypeDefinition::Simple(st)) => {
                    let type_use = self.simple_type_use(st, Some(hint));
                    self.wrap_simple_element(element, type_use);
                }
                None => {
                    tracing::warn!("element '{}' has unknown type '{}'", element.name, name);
                }
            },
        }
    }

    /// A simple-typed top-level element becomes a message with one field
    fn wrap_simple_element(&mut self, element: &ElementDecl, type_use: TypeUse) {
        let name = &element.name.local_name;
        if self.registry.contains_name(name) {
            tracing::debug!("element {} shares its name with a type, not wrapped", name);
            return;
        }
        let mut message = Message::new(name.clone(), self.package_of(element.name.namespace()));
        message.documentation = element.documentation.clone();
        message.add_field(
            Field::new(to_field_name(name), type_use.name)
                .required(true)
                .repeated(type_use.repeated)
                .with_type_namespace(type_use.namespace)
                .with_fixed_value(element.fixed.clone())
                .with_documentation(element.documentation.clone()),
        );
        tracing::debug!("message {} wraps a simple-typed element", name);
        self.registry
            .add_documentation(name, element.documentation.as_deref());
        self.registry.insert_message(message);
    }

    /// Lower a complex type, returning the name of its message
    pub fn process_complex_type(&mut self, ct: &'a ComplexType, hint: Option<&str>) -> String {
        let key = ct as *const ComplexType as usize;
        let type_name = match (&ct.name, hint) {
            (Some(name), _) => name.local_name.clone(),
            (None, Some(hint)) => format!("{}Type", hint),
            (None, None) => match self.anonymous.get(&key) {
                Some(name) => return name.clone(),
                None => {
                    let name = self.registry.next_anonymous_name();
                    self.anonymous.insert(key, name.clone());
                    name
                }
            },
        };

        if self.registry.contains_name(&type_name) {
            return type_name;
        }

        let namespace = ct
            .name
            .as_ref()
            .and_then(|n| n.namespace())
            .or(ct.target_namespace.as_deref());
        let mut message = Message::new(type_name.clone(), self.package_of(namespace));
        message.documentation = ct.documentation.clone();
        self.registry
            .add_documentation(&type_name, ct.documentation.as_deref());
        self.registry.insert_message(message);
        tracing::debug!("message {} from complex type", type_name);

        // Ancestors, starting with the type itself
        let mut visited = BTreeSet::new();
        let mut current = Some(ct);
        while let Some(c) = current {
            self.write_complex_content(&type_name, c, true);
            current = self.base_complex_type(c, &mut visited);
        }

        self.process_inheritance(&type_name, ct, &mut BTreeSet::new());

        let parent = if ct.has_base() {
            ct.base.as_ref().map(|b| b.local_name.clone())
        } else {
            None
        };
        if let Some(message) = self.registry.message_mut(&type_name) {
            message.parent = parent;
        }
        type_name
    }

    fn base_complex_type(
        &self,
        ct: &'a ComplexType,
        visited: &mut BTreeSet<QName>,
    ) -> Option<&'a ComplexType> {
        if !ct.has_base() {
            return None;
        }
        let base = ct.base.as_ref()?;
        if is_xsd_namespace(base.namespace()) || !visited.insert(base.clone()) {
            return None;
        }
        match self.set.type_definition(base) {
            Some(TypeDefinition::Complex(base_type)) => Some(base_type),
            Some(TypeDefinition::Simple(_)) => None,
            None => {
                tracing::warn!("unknown base type '{}'", base);
                None
            }
        }
    }

    /// Fold every descendant of `ct` into the message, forced optional
    fn process_inheritance(
        &mut self,
        type_name: &str,
        ct: &'a ComplexType,
        visited: &mut BTreeSet<QName>,
    ) {
        let set = self.set;
        let Some(name) = &ct.name else {
            return;
        };
        if !visited.insert(name.clone()) {
            return;
        }
        for derived in set.derived_types(name) {
            tracing::trace!("{}: folding descendant {:?}", type_name, derived.name);
            self.write_complex_content(type_name, derived, false);
            self.process_inheritance(type_name, derived, visited);
        }
    }

    fn add_field(&mut self, type_name: &str, field: Field) {
        if let Some(message) = self.registry.message_mut(type_name) {
            message.add_field(field);
        }
    }

    /// Fold the content and attributes of `ct` into a message
    pub fn write_complex_content(&mut self, type_name: &str, ct: &'a ComplexType, going_up: bool) {
        match &ct.content {
            ContentType::Particle(particle) => self.write_particle(type_name, particle, going_up, false),
            ContentType::Simple(base) => self.write_simple_content(type_name, base, going_up),
            ContentType::Empty => {}
        }

        let mut visited = BTreeSet::new();
        for group in &ct.attribute_groups {
            self.write_att_group(type_name, group, going_up, &mut visited);
        }
        for att in &ct.attribute_uses {
            self.write_attribute(type_name, att, going_up);
        }
    }

    fn write_simple_content(&mut self, type_name: &str, base: &'a TypeRef, going_up: bool) {
        let set = self.set;
        let type_use = match base {
            TypeRef::Named(name) if is_xsd_namespace(name.namespace()) => {
                self.builtin_type_use(&name.local_name)
            }
            TypeRef::Named(name) => match set.type_definition(name) {
                Some(TypeDefinition::Simple(st)) => self.simple_type_use(st, None),
                // Complex bases carry their own value field
                Some(TypeDefinition::Complex(_)) => return,
                None => {
                    tracing::warn!("{}: unknown simple content base '{}'", type_name, name);
                    return;
                }
            },
            TypeRef::Anonymous(def) => match def.as_ref() {
                TypeDefinition::Simple(st) => self.simple_type_use(st, Some(type_name)),
                TypeDefinition::Complex(_) => return,
            },
        };
        self.add_field(
            type_name,
            Field::new("value", type_use.name)
                .required(going_up)
                .repeated(type_use.repeated)
                .with_type_namespace(type_use.namespace),
        );
    }

    fn write_particle(&mut self, type_name: &str, particle: &'a Particle, going_up: bool, repeated: bool) {
        let going_up = going_up && !particle.occurs.is_optional();
        let repeated = repeated || particle.occurs.is_multiple();
        let set = self.set;

        match &particle.term {
            Term::Element(decl) => self.write_element(type_name, decl, going_up, repeated),
            Term::ElementRef(name) => match set.element(name) {
                Some(decl) => self.write_element(type_name, decl, going_up, repeated),
                None => tracing::warn!("{}: reference to unknown element '{}'", type_name, name),
            },
            Term::ModelGroup(group) => self.write_term(type_name, group, going_up, repeated),
            Term::GroupRef(name) => {
                let Some(group) = set.group(name) else {
                    tracing::warn!("{}: reference to unknown group '{}'", type_name, name);
                    return;
                };
                if self.group_stack.contains(name) {
                    tracing::warn!("{}: recursive group '{}' ignored", type_name, name);
                    return;
                }
                self.group_stack.push(name.clone());
                self.write_term(type_name, group, going_up, repeated);
                self.group_stack.pop();
            }
            Term::Wildcard => tracing::debug!("{}: element wildcard ignored", type_name),
        }
    }

    /// Fold a model group; a choice makes every alternative optional
    pub fn write_term(&mut self, type_name: &str, group: &'a ModelGroup, going_up: bool, repeated: bool) {
        let going_up = going_up && group.compositor != Compositor::Choice;
        for particle in &group.particles {
            self.write_particle(type_name, particle, going_up, repeated);
        }
    }

    fn write_element(&mut self, type_name: &str, decl: &'a ElementDecl, required: bool, repeated: bool) {
        let field_name = decl.name.local_name.as_str();
        let type_use = match &decl.type_ref {
            TypeRef::Anonymous(def) => self.process_type(def, field_name),
            TypeRef::Named(name) => self.named_type_use(name),
        };
        self.add_field(
            type_name,
            Field::new(field_name, type_use.name)
                .required(required)
                .repeated(repeated || type_use.repeated)
                .with_type_namespace(type_use.namespace)
                .with_fixed_value(decl.fixed.clone())
                .with_documentation(decl.documentation.clone()),
        );
    }

    fn write_attribute(&mut self, type_name: &str, att: &'a AttributeUse, going_up: bool) {
        let set = self.set;
        let decl: &'a AttributeDecl = match &att.term {
            AttributeTerm::Decl(decl) => decl,
            AttributeTerm::Ref(name) => match set.attribute(name) {
                Some(decl) => decl,
                None => {
                    tracing::warn!("{}: reference to unknown attribute '{}'", type_name, name);
                    return;
                }
            },
        };

        let type_use = match &decl.type_ref {
            TypeRef::Named(name) => self.named_type_use(name),
            TypeRef::Anonymous(def) => match def.as_ref() {
                TypeDefinition::Simple(st) => self.simple_type_use(st, Some(decl.name.local_name.as_str())),
                TypeDefinition::Complex(_) => TypeUse::basic(XSD_ANY_SIMPLE_TYPE),
            },
        };

        self.add_field(
            type_name,
            Field::new(decl.name.local_name.clone(), type_use.name)
                .required(going_up && att.required)
                .repeated(type_use.repeated)
                .with_type_namespace(type_use.namespace)
                .with_fixed_value(decl.fixed.clone())
                .with_documentation(decl.documentation.clone()),
        );
    }

    fn write_att_group(
        &mut self,
        type_name: &str,
        name: &QName,
        going_up: bool,
        visited: &mut BTreeSet<QName>,
    ) {
        if !visited.insert(name.clone()) {
            return;
        }
        let set = self.set;
        let Some(group) = set.attribute_group(name) else {
            tracing::warn!("{}: reference to unknown attribute group '{}'", type_name, name);
            return;
        };
        for nested in &group.attribute_groups {
            self.write_att_group(type_name, nested, going_up, visited);
        }
        for att in &group.attribute_uses {
            self.write_attribute(type_name, att, going_up);
        }
    }

    /// Lower an anonymous type definition
    fn process_type(&mut self, def: &'a TypeDefinition, hint: &str) -> TypeUse {
        match def {
            TypeDefinition::Complex(ct) => {
                let name = self.process_complex_type(ct, Some(hint));
                TypeUse {
                    namespace: self.registry.namespace_of(&name).map(str::to_string),
                    name,
                    repeated: false,
                }
            }
            TypeDefinition::Simple(st) => self.simple_type_use(st, Some(hint)),
        }
    }

    /// Type of a field declared with a named type
    fn named_type_use(&mut self, name: &QName) -> TypeUse {
        if is_xsd_namespace(name.namespace()) {
            return self.builtin_type_use(&name.local_name);
        }
        let set = self.set;
        match set.type_definition(name) {
            Some(TypeDefinition::Simple(st)) => self.simple_type_use(st, None),
            // Complex types are lowered on their own; missing ones surface at emission
            _ => TypeUse {
                name: name.local_name.clone(),
                namespace: Some(self.package_of(name.namespace())),
                repeated: false,
            },
        }
    }

    /// Type of a field declared with an XSD built-in
    fn builtin_type_use(&mut self, local_name: &str) -> TypeUse {
        if !is_basic_type(local_name) {
            let basic = nearest_basic(local_name).unwrap_or_else(|| {
                tracing::warn!("unknown XSD built-in '{}' treated as string", local_name);
                XSD_STRING
            });
            if self.registry.insert_alias(local_name, basic) {
                tracing::debug!("alias {} -> {}", local_name, basic);
            }
        }
        TypeUse::basic(local_name)
    }

    /// Type of a field declared with a simple type; lists repeat their item
    fn simple_type_use(&mut self, st: &'a SimpleType, hint: Option<&str>) -> TypeUse {
        if let SimpleVariety::List(item) = &st.variety {
            // Register the list type itself for completeness
            self.process_simple_type(st, hint);
            let mut type_use = match item {
                TypeRef::Named(name) => self.named_type_use(name),
                TypeRef::Anonymous(def) => match def.as_ref() {
                    TypeDefinition::Simple(item_type) => self.simple_type_use(item_type, hint),
                    TypeDefinition::Complex(_) => TypeUse::basic(XSD_ANY_SIMPLE_TYPE),
                },
            };
            type_use.repeated = true;
            return type_use;
        }

        let name = self.process_simple_type(st, hint);
        TypeUse {
            namespace: self.registry.namespace_of(&name).map(str::to_string),
            name,
            repeated: false,
        }
    }

    /// Lower a simple type into an enumeration or an alias of a basic type
    pub fn process_simple_type(&mut self, st: &'a SimpleType, hint: Option<&str>) -> String {
        let key = st as *const SimpleType as usize;
        let namespace = st
            .name
            .as_ref()
            .and_then(|n| n.namespace())
            .or(st.target_namespace.as_deref());

        let values = self.enumeration_values(st, 0);
        if !values.is_empty() {
            let type_name = match (&st.name, hint) {
                (Some(name), _) => name.local_name.clone(),
                (None, Some(hint)) => format!("{}Type", hint),
                (None, None) => self.anonymous_name(key),
            };
            if self.registry.contains_name(&type_name) {
                return type_name;
            }
            let mut enumeration = Enumeration::new(type_name.clone(), self.package_of(namespace));
            for value in values {
                enumeration.add_value(value);
            }
            enumeration.documentation = st.documentation.clone();
            self.registry
                .add_documentation(&type_name, st.documentation.as_deref());
            self.registry.insert_enum(enumeration);
            tracing::debug!("enum {} from simple type", type_name);
            return type_name;
        }

        let type_name = match &st.name {
            Some(name) => name.local_name.clone(),
            None => self.anonymous_name(key),
        };
        if self.registry.contains_name(&type_name) {
            return type_name;
        }
        let basic = self.basic_of_simple(st, 0);
        self.registry.insert_alias(type_name.clone(), basic);
        self.registry
            .add_documentation(&type_name, st.documentation.as_deref());
        tracing::debug!("alias {} -> {}", type_name, basic);
        type_name
    }

    fn anonymous_name(&mut self, key: usize) -> String {
        if let Some(name) = self.anonymous.get(&key) {
            return name.clone();
        }
        let name = self.registry.next_anonymous_name();
        self.anonymous.insert(key, name.clone());
        name
    }

    /// Declared enumeration values, else those of the nearest restricted ancestor
    fn enumeration_values(&self, st: &'a SimpleType, depth: usize) -> Vec<&'a str> {
        let own = st.enumeration_values();
        if !own.is_empty() || depth > MAX_DERIVATION_DEPTH {
            return own;
        }
        match &st.variety {
            SimpleVariety::Restriction(TypeRef::Named(name)) if !is_xsd_namespace(name.namespace()) => {
                match self.set.simple_type(name) {
                    Some(base) => self.enumeration_values(base, depth + 1),
                    None => Vec::new(),
                }
            }
            SimpleVariety::Restriction(TypeRef::Anonymous(def)) => match def.as_ref() {
                TypeDefinition::Simple(base) => self.enumeration_values(base, depth + 1),
                TypeDefinition::Complex(_) => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Nearest basic built-in a simple type derives from
    fn basic_of_simple(&self, st: &'a SimpleType, depth: usize) -> &'static str {
        match &st.variety {
            SimpleVariety::Restriction(base) | SimpleVariety::List(base) => self.basic_of(base, depth),
            SimpleVariety::Union(_) => XSD_STRING,
        }
    }

    fn basic_of(&self, type_ref: &'a TypeRef, depth: usize) -> &'static str {
        if depth > MAX_DERIVATION_DEPTH {
            tracing::warn!("restriction chain too deep, treating as string");
            return XSD_STRING;
        }
        match type_ref {
            TypeRef::Named(name) if is_xsd_namespace(name.namespace()) => {
                nearest_basic(&name.local_name).unwrap_or(XSD_STRING)
            }
            TypeRef::Named(name) => match self.set.simple_type(name) {
                Some(base) => self.basic_of_simple(base, depth + 1),
                None => XSD_STRING,
            },
            TypeRef::Anonymous(def) => match def.as_ref() {
                TypeDefinition::Simple(base) => self.basic_of_simple(base, depth + 1),
                TypeDefinition::Complex(_) => XSD_STRING,
            },
        }
    }
}
