//! Schema object graph
//!
//! Components are owned by the [`SchemaSet`] and reference each other by
//! [`QName`]; anonymous types are owned inline by the declaration that
//! introduces them.

use indexmap::IndexMap;

use super::builtins::{is_xsd_namespace, XSD_ANY_SIMPLE_TYPE, XSD_ANY_TYPE, XSD_NAMESPACE};
use crate::namespaces::QName;

/// Occurrence constraints (minOccurs/maxOccurs)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum occurrences
    pub min: u32,
    /// Maximum occurrences (None = unbounded)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create a new Occurs
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Exactly once (1..1)
    pub fn once() -> Self {
        Self::new(1, Some(1))
    }

    /// Optional (0..1)
    pub fn optional() -> Self {
        Self::new(0, Some(1))
    }

    /// Whether the particle may be absent
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// Whether the particle may appear more than once
    pub fn is_multiple(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

/// Model group compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compositor {
    /// xs:sequence
    Sequence,
    /// xs:choice
    Choice,
    /// xs:all
    All,
}

impl Compositor {
    /// Compositor from an XSD tag local name
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(Compositor::Sequence),
            "choice" => Some(Compositor::Choice),
            "all" => Some(Compositor::All),
            _ => None,
        }
    }
}

/// Reference to a type, either by name or inline
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// Named global type (built-in or user-defined)
    Named(QName),
    /// Anonymous type declared inline
    Anonymous(Box<TypeDefinition>),
}

impl TypeRef {
    /// `xs:anyType`
    pub fn any_type() -> Self {
        TypeRef::Named(QName::namespaced(XSD_NAMESPACE, XSD_ANY_TYPE))
    }

    /// `xs:anySimpleType`
    pub fn any_simple_type() -> Self {
        TypeRef::Named(QName::namespaced(XSD_NAMESPACE, XSD_ANY_SIMPLE_TYPE))
    }

    /// The referenced name, for named types
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeRef::Named(name) => Some(name),
            TypeRef::Anonymous(_) => None,
        }
    }
}

/// A type definition
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    /// Complex type
    Complex(ComplexType),
    /// Simple type
    Simple(SimpleType),
}

impl TypeDefinition {
    /// Declared name, if any
    pub fn name(&self) -> Option<&QName> {
        match self {
            TypeDefinition::Complex(ct) => ct.name.as_ref(),
            TypeDefinition::Simple(st) => st.name.as_ref(),
        }
    }
}

/// Content of a complex type
#[derive(Debug, Clone)]
pub enum ContentType {
    /// No element content
    Empty,
    /// Element content
    Particle(Particle),
    /// Simple content derived from the given base
    Simple(TypeRef),
}

/// A complex type definition
#[derive(Debug, Clone)]
pub struct ComplexType {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Target namespace of the declaring schema
    pub target_namespace: Option<String>,
    /// Base type (None means xs:anyType)
    pub base: Option<QName>,
    /// Content type
    pub content: ContentType,
    /// Attribute uses declared directly on the type
    pub attribute_uses: Vec<AttributeUse>,
    /// Referenced attribute groups
    pub attribute_groups: Vec<QName>,
    /// Documentation text
    pub documentation: Option<String>,
}

impl ComplexType {
    /// Create an empty complex type
    pub fn new(name: Option<QName>, target_namespace: Option<String>) -> Self {
        Self {
            name,
            target_namespace,
            base: None,
            content: ContentType::Empty,
            attribute_uses: Vec::new(),
            attribute_groups: Vec::new(),
            documentation: None,
        }
    }

    /// Whether the type derives from anything other than xs:anyType
    pub fn has_base(&self) -> bool {
        match &self.base {
            Some(base) => !(is_xsd_namespace(base.namespace()) && base.local_name == XSD_ANY_TYPE),
            None => false,
        }
    }
}

/// Variety of a simple type
#[derive(Debug, Clone)]
pub enum SimpleVariety {
    /// Restriction of a base type
    Restriction(TypeRef),
    /// Whitespace separated list of an item type
    List(TypeRef),
    /// Union of member types
    Union(Vec<TypeRef>),
}

/// A constraining facet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    /// Facet kind (`enumeration`, `pattern`, ...)
    pub kind: String,
    /// Facet value
    pub value: String,
}

/// A simple type definition
#[derive(Debug, Clone)]
pub struct SimpleType {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Target namespace of the declaring schema
    pub target_namespace: Option<String>,
    /// Variety
    pub variety: SimpleVariety,
    /// Declared facets, in document order
    pub facets: Vec<Facet>,
    /// Documentation text
    pub documentation: Option<String>,
}

impl SimpleType {
    /// Values of the declared enumeration facets, in document order
    pub fn enumeration_values(&self) -> Vec<&str> {
        self.facets
            .iter()
            .filter(|f| f.kind == "enumeration")
            .map(|f| f.value.as_str())
            .collect()
    }
}

/// An element declaration
#[derive(Debug, Clone)]
pub struct ElementDecl {
    /// Element name
    pub name: QName,
    /// Element type
    pub type_ref: TypeRef,
    /// Fixed value constraint
    pub fixed: Option<String>,
    /// Documentation text
    pub documentation: Option<String>,
}

/// The term of a particle
#[derive(Debug, Clone)]
pub enum Term {
    /// Local element declaration
    Element(Box<ElementDecl>),
    /// Reference to a global element
    ElementRef(QName),
    /// Nested model group
    ModelGroup(ModelGroup),
    /// Reference to a named model group
    GroupRef(QName),
    /// Element wildcard (xs:any)
    Wildcard,
}

/// A particle: a term with occurrence bounds
#[derive(Debug, Clone)]
pub struct Particle {
    /// Occurrence bounds
    pub occurs: Occurs,
    /// The term
    pub term: Term,
}

/// A model group
#[derive(Debug, Clone)]
pub struct ModelGroup {
    /// Compositor
    pub compositor: Compositor,
    /// Child particles, in document order
    pub particles: Vec<Particle>,
}

impl ModelGroup {
    /// Create an empty model group
    pub fn new(compositor: Compositor) -> Self {
        Self {
            compositor,
            particles: Vec::new(),
        }
    }
}

/// An attribute declaration
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    /// Attribute name
    pub name: QName,
    /// Attribute type
    pub type_ref: TypeRef,
    /// Fixed value constraint
    pub fixed: Option<String>,
    /// Documentation text
    pub documentation: Option<String>,
}

/// Either a local attribute declaration or a reference to a global one
#[derive(Debug, Clone)]
pub enum AttributeTerm {
    /// Local declaration
    Decl(AttributeDecl),
    /// Reference to a global attribute
    Ref(QName),
}

/// An attribute use
#[derive(Debug, Clone)]
pub struct AttributeUse {
    /// Whether `use="required"`
    pub required: bool,
    /// The declaration
    pub term: AttributeTerm,
}

/// A named attribute group
#[derive(Debug, Clone)]
pub struct AttributeGroup {
    /// Group name
    pub name: QName,
    /// Attribute uses
    pub attribute_uses: Vec<AttributeUse>,
    /// Nested attribute group references
    pub attribute_groups: Vec<QName>,
}

/// One parsed schema document
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Location the document was loaded from
    pub system_id: String,
    /// Target namespace
    pub target_namespace: Option<String>,
    /// Global elements, in document order
    pub elements: Vec<QName>,
    /// Global complex types, in document order
    pub complex_types: Vec<QName>,
    /// Global simple types, in document order
    pub simple_types: Vec<QName>,
}

/// All schema documents of one translation and their global components
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    /// Loaded schema documents, root first
    pub schemas: Vec<Schema>,
    /// Global element declarations
    pub elements: IndexMap<QName, ElementDecl>,
    /// Global type definitions
    pub types: IndexMap<QName, TypeDefinition>,
    /// Global attribute declarations
    pub attributes: IndexMap<QName, AttributeDecl>,
    /// Global attribute groups
    pub attribute_groups: IndexMap<QName, AttributeGroup>,
    /// Global model groups
    pub groups: IndexMap<QName, ModelGroup>,
}

/// Look up a component, falling back to the local name for unqualified references
fn lookup<'a, T>(map: &'a IndexMap<QName, T>, name: &QName) -> Option<&'a T> {
    map.get(name).or_else(|| {
        if name.namespace.is_some() {
            return None;
        }
        map.iter()
            .find(|(key, _)| key.local_name == name.local_name)
            .map(|(_, value)| value)
    })
}

impl SchemaSet {
    /// Create an empty schema set
    pub fn new() -> Self {
        Self::default()
    }

    /// Target namespace of the root schema
    pub fn root_namespace(&self) -> Option<&str> {
        self.schemas
            .iter()
            .find(|s| !is_xsd_namespace(s.target_namespace.as_deref()))
            .and_then(|s| s.target_namespace.as_deref())
    }

    /// Global element by name
    pub fn element(&self, name: &QName) -> Option<&ElementDecl> {
        lookup(&self.elements, name)
    }

    /// Global type by name
    pub fn type_definition(&self, name: &QName) -> Option<&TypeDefinition> {
        lookup(&self.types, name)
    }

    /// Global complex type by name
    pub fn complex_type(&self, name: &QName) -> Option<&ComplexType> {
        match self.type_definition(name) {
            Some(TypeDefinition::Complex(ct)) => Some(ct),
            _ => None,
        }
    }

    /// Global simple type by name
    pub fn simple_type(&self, name: &QName) -> Option<&SimpleType> {
        match self.type_definition(name) {
            Some(TypeDefinition::Simple(st)) => Some(st),
            _ => None,
        }
    }

    /// Global attribute by name
    pub fn attribute(&self, name: &QName) -> Option<&AttributeDecl> {
        lookup(&self.attributes, name)
    }

    /// Global attribute group by name
    pub fn attribute_group(&self, name: &QName) -> Option<&AttributeGroup> {
        lookup(&self.attribute_groups, name)
    }

    /// Global model group by name
    pub fn group(&self, name: &QName) -> Option<&ModelGroup> {
        lookup(&self.groups, name)
    }

    /// Global complex types directly derived from `base`, in load order
    pub fn derived_types<'a>(&'a self, base: &'a QName) -> impl Iterator<Item = &'a ComplexType> + 'a {
        self.types.values().filter_map(move |def| match def {
            TypeDefinition::Complex(ct)
                if ct.base.as_ref().map_or(false, |b| same_component(b, base)) =>
            {
                Some(ct)
            }
            _ => None,
        })
    }
}

/// Whether two names denote the same component, tolerating unqualified references
fn same_component(a: &QName, b: &QName) -> bool {
    a.local_name == b.local_name
        && (a.namespace == b.namespace || a.namespace.is_none() || b.namespace.is_none())
}
