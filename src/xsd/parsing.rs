//! XSD Document Parsing
//!
//! This module turns one XSD document into schema components, registering
//! the globals in a [`SchemaSet`]. Includes and imports are not followed
//! here; they are returned as [`SchemaReference`]s for the loader.

use roxmltree::{Document, Node, ParsingOptions};

use super::builtins::is_xsd_namespace;
use super::model::{
    AttributeDecl, AttributeGroup, AttributeTerm, AttributeUse, Compositor, ComplexType,
    ContentType, ElementDecl, Facet, ModelGroup, Occurs, Particle, Schema, SchemaSet,
    SimpleType, SimpleVariety, Term, TypeDefinition, TypeRef,
};
use crate::error::{Error, ErrorHandler, ParseError, Result, Severity};
use crate::names::split_qname;
use crate::namespaces::QName;

/// XSD element local names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const GROUP: &str = "group";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const ANNOTATION: &str = "annotation";
    pub const DOCUMENTATION: &str = "documentation";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const REDEFINE: &str = "redefine";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const ANY: &str = "any";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const NOTATION: &str = "notation";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const FIXED: &str = "fixed";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const NAMESPACE: &str = "namespace";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const USE: &str = "use";
}

/// Kind of a reference to another schema document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// xs:include
    Include,
    /// xs:import
    Import,
    /// xs:redefine
    Redefine,
}

/// A reference to another schema document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReference {
    /// Kind of reference
    pub kind: ReferenceKind,
    /// The schemaLocation, if given
    pub location: Option<String>,
    /// The imported namespace (imports only)
    pub namespace: Option<String>,
}

/// Result of parsing one document
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// The schema document summary
    pub schema: Schema,
    /// Referenced schema documents, in document order
    pub references: Vec<SchemaReference>,
}

/// Parse one XSD document into `set`
///
/// `chameleon_namespace` is the including schema's namespace, adopted when
/// the document declares none. Fatal diagnostics are reported to `handler`
/// and returned as errors.
pub fn parse_document(
    text: &str,
    system_id: &str,
    chameleon_namespace: Option<&str>,
    allow_dtd: bool,
    set: &mut SchemaSet,
    handler: &mut dyn ErrorHandler,
) -> Result<ParsedDocument> {
    let options = ParsingOptions {
        allow_dtd,
        ..ParsingOptions::default()
    };

    let doc = match Document::parse_with_options(text, options) {
        Ok(doc) => doc,
        Err(e) => {
            let err = ParseError::new(format!("XML not well-formed: {}", e))
                .with_system_id(system_id)
                .with_severity(Severity::Fatal);
            handler.fatal_error(&err);
            return Err(Error::Parse(err));
        }
    };

    let root = doc.root_element();
    if root.tag_name().name() != xsd_elements::SCHEMA || !is_xsd_namespace(root.tag_name().namespace()) {
        let err = ParseError::new(format!(
            "Expected xs:schema root element, got {}",
            root.tag_name().name()
        ))
        .with_system_id(system_id)
        .with_location(location(root))
        .with_severity(Severity::Fatal);
        handler.fatal_error(&err);
        return Err(Error::Parse(err));
    }

    let declared_namespace = root
        .attribute(xsd_attrs::TARGET_NAMESPACE)
        .filter(|ns| !ns.is_empty())
        .map(str::to_string);
    let chameleon = declared_namespace.is_none() && chameleon_namespace.is_some();
    let target_namespace = declared_namespace.or_else(|| chameleon_namespace.map(str::to_string));

    let mut parser = SchemaParser {
        system_id,
        target_namespace: target_namespace.clone(),
        chameleon,
        set,
        handler,
        schema: Schema {
            system_id: system_id.to_string(),
            target_namespace,
            ..Schema::default()
        },
        references: Vec::new(),
    };

    for child in xsd_children(root) {
        parser.parse_schema_child(child);
    }

    Ok(ParsedDocument {
        schema: parser.schema,
        references: parser.references,
    })
}

/// Element children in the XSD namespace
fn xsd_children<'a, 'input: 'a>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && is_xsd_namespace(n.tag_name().namespace()))
}

/// First XSD child with the given local name
fn find_child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    xsd_children(node).find(|n| n.tag_name().name() == name)
}

/// `line:column` of a node
fn location(node: Node<'_, '_>) -> String {
    let pos = node.document().text_pos_at(node.range().start);
    format!("{}:{}", pos.row, pos.col)
}

/// Text of the first documentation child of the annotation
fn documentation(node: Node<'_, '_>) -> Option<String> {
    let annotation = find_child(node, xsd_elements::ANNOTATION)?;
    let doc = find_child(annotation, xsd_elements::DOCUMENTATION)?;
    doc.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// Parse minOccurs and maxOccurs attributes into an Occurs
fn parse_occurs(node: Node<'_, '_>) -> Occurs {
    let min = node
        .attribute(xsd_attrs::MIN_OCCURS)
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(1);

    let max = match node.attribute(xsd_attrs::MAX_OCCURS).map(str::trim) {
        Some("unbounded") => None,
        Some(s) => s.parse::<u32>().ok().or(Some(1)),
        None => Some(1),
    };

    Occurs::new(min, max)
}

struct SchemaParser<'a> {
    system_id: &'a str,
    target_namespace: Option<String>,
    chameleon: bool,
    set: &'a mut SchemaSet,
    handler: &'a mut dyn ErrorHandler,
    schema: Schema,
    references: Vec<SchemaReference>,
}

impl<'a> SchemaParser<'a> {
    fn diagnostic(&mut self, node: Node<'_, '_>, severity: Severity, message: String) {
        let err = ParseError::new(message)
            .with_system_id(self.system_id)
            .with_location(location(node))
            .with_severity(severity);
        self.handler.report(&err);
    }

    fn warning(&mut self, node: Node<'_, '_>, message: String) {
        self.diagnostic(node, Severity::Warning, message);
    }

    fn error(&mut self, node: Node<'_, '_>, message: String) {
        self.diagnostic(node, Severity::Error, message);
    }

    /// Make a QName in the target namespace
    fn make_qname(&self, local_name: &str) -> QName {
        QName::new(self.target_namespace.clone(), local_name)
    }

    /// Resolve a QName-valued attribute against the namespaces in scope
    fn resolve_qname(&mut self, node: Node<'_, '_>, value: &str) -> QName {
        let (prefix, local) = split_qname(value.trim());
        match prefix {
            Some(prefix) => match node.lookup_namespace_uri(Some(prefix)) {
                Some(ns) => QName::namespaced(ns, local),
                None => {
                    self.warning(
                        node,
                        format!("Undeclared namespace prefix '{}' in '{}'", prefix, value),
                    );
                    QName::local(local)
                }
            },
            None => match node.lookup_namespace_uri(None).filter(|ns| !ns.is_empty()) {
                Some(ns) => QName::namespaced(ns, local),
                None if self.chameleon => self.make_qname(local),
                None => QName::local(local),
            },
        }
    }

    /// Required `name` attribute of a global component
    fn component_name(&mut self, node: Node<'_, '_>) -> Option<QName> {
        match node.attribute(xsd_attrs::NAME) {
            Some(name) if !name.trim().is_empty() => Some(self.make_qname(name.trim())),
            _ => {
                self.error(
                    node,
                    format!("{} declaration without a name is ignored", node.tag_name().name()),
                );
                None
            }
        }
    }

    fn parse_schema_child(&mut self, node: Node<'_, '_>) {
        match node.tag_name().name() {
            xsd_elements::ELEMENT => self.parse_global_element(node),
            xsd_elements::COMPLEX_TYPE => self.parse_global_complex_type(node),
            xsd_elements::SIMPLE_TYPE => self.parse_global_simple_type(node),
            xsd_elements::ATTRIBUTE => self.parse_global_attribute(node),
            xsd_elements::ATTRIBUTE_GROUP => self.parse_attribute_group(node),
            xsd_elements::GROUP => self.parse_group(node),
            xsd_elements::INCLUDE => self.parse_reference(node, ReferenceKind::Include),
            xsd_elements::IMPORT => self.parse_reference(node, ReferenceKind::Import),
            xsd_elements::REDEFINE => {
                self.parse_reference(node, ReferenceKind::Redefine);
                // Redefinitions are registered before the redefined document loads
                for child in xsd_children(node) {
                    self.parse_schema_child(child);
                }
            }
            xsd_elements::ANNOTATION | xsd_elements::NOTATION => {}
            other => {
                self.warning(node, format!("Unsupported top-level component '{}' ignored", other))
            }
        }
    }

    fn parse_reference(&mut self, node: Node<'_, '_>, kind: ReferenceKind) {
        let location = node
            .attribute(xsd_attrs::SCHEMA_LOCATION)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let namespace = node.attribute(xsd_attrs::NAMESPACE).map(str::to_string);

        if location.is_none() && kind != ReferenceKind::Import {
            self.error(node, format!("{} without schemaLocation", node.tag_name().name()));
            return;
        }

        self.references.push(SchemaReference {
            kind,
            location,
            namespace,
        });
    }

    fn parse_global_element(&mut self, node: Node<'_, '_>) {
        let Some(decl) = self.parse_element_decl(node) else {
            return;
        };
        let name = decl.name.clone();
        if self.set.elements.contains_key(&name) {
            self.warning(node, format!("Duplicate element declaration '{}' ignored", name));
            return;
        }
        self.schema.elements.push(name.clone());
        self.set.elements.insert(name, decl);
    }

    fn parse_global_complex_type(&mut self, node: Node<'_, '_>) {
        let Some(name) = self.component_name(node) else {
            return;
        };
        let ct = self.parse_complex_type(node, Some(name.clone()));
        if self.insert_type(node, &name, TypeDefinition::Complex(ct)) {
            self.schema.complex_types.push(name);
        }
    }

    fn parse_global_simple_type(&mut self, node: Node<'_, '_>) {
        let Some(name) = self.component_name(node) else {
            return;
        };
        let st = self.parse_simple_type(node, Some(name.clone()));
        if self.insert_type(node, &name, TypeDefinition::Simple(st)) {
            self.schema.simple_types.push(name);
        }
    }

    fn insert_type(&mut self, node: Node<'_, '_>, name: &QName, def: TypeDefinition) -> bool {
        if self.set.types.contains_key(name) {
            self.warning(node, format!("Duplicate type definition '{}' ignored", name));
            return false;
        }
        self.set.types.insert(name.clone(), def);
        true
    }

    fn parse_global_attribute(&mut self, node: Node<'_, '_>) {
        let Some(decl) = self.parse_attribute_decl(node) else {
            return;
        };
        if self.set.attributes.contains_key(&decl.name) {
            self.warning(node, format!("Duplicate attribute declaration '{}' ignored", decl.name));
            return;
        }
        self.set.attributes.insert(decl.name.clone(), decl);
    }

    fn parse_attribute_group(&mut self, node: Node<'_, '_>) {
        let Some(name) = self.component_name(node) else {
            return;
        };
        let mut group = AttributeGroup {
            name: name.clone(),
            attribute_uses: Vec::new(),
            attribute_groups: Vec::new(),
        };
        for child in xsd_children(node) {
            match child.tag_name().name() {
                xsd_elements::ATTRIBUTE => {
                    if let Some(att) = self.parse_attribute_use(child) {
                        group.attribute_uses.push(att);
                    }
                }
                xsd_elements::ATTRIBUTE_GROUP => {
                    if let Some(r) = child.attribute(xsd_attrs::REF) {
                        let qname = self.resolve_qname(child, r);
                        group.attribute_groups.push(qname);
                    }
                }
                _ => {}
            }
        }
        if self.set.attribute_groups.contains_key(&name) {
            self.warning(node, format!("Duplicate attribute group '{}' ignored", name));
            return;
        }
        self.set.attribute_groups.insert(name, group);
    }

    fn parse_group(&mut self, node: Node<'_, '_>) {
        let Some(name) = self.component_name(node) else {
            return;
        };
        let model = xsd_children(node)
            .find_map(|child| Compositor::from_tag(child.tag_name().name()).map(|c| (child, c)));
        let Some((child, compositor)) = model else {
            self.error(node, format!("Model group '{}' has no compositor", name));
            return;
        };
        let group = self.parse_model_group(child, compositor);
        if self.set.groups.contains_key(&name) {
            self.warning(node, format!("Duplicate model group '{}' ignored", name));
            return;
        }
        self.set.groups.insert(name, group);
    }

    fn parse_element_decl(&mut self, node: Node<'_, '_>) -> Option<ElementDecl> {
        let name = self.component_name(node)?;
        let type_ref = self.parse_type_ref(node, TypeRef::any_type());
        Some(ElementDecl {
            name,
            type_ref,
            fixed: node.attribute(xsd_attrs::FIXED).map(str::to_string),
            documentation: documentation(node),
        })
    }

    fn parse_attribute_decl(&mut self, node: Node<'_, '_>) -> Option<AttributeDecl> {
        let name = self.component_name(node)?;
        let type_ref = self.parse_type_ref(node, TypeRef::any_simple_type());
        Some(AttributeDecl {
            name,
            type_ref,
            fixed: node.attribute(xsd_attrs::FIXED).map(str::to_string),
            documentation: documentation(node),
        })
    }

    fn parse_attribute_use(&mut self, node: Node<'_, '_>) -> Option<AttributeUse> {
        let usage = node.attribute(xsd_attrs::USE).map(str::trim);
        if usage == Some("prohibited") {
            return None;
        }
        let term = match node.attribute(xsd_attrs::REF) {
            Some(r) => AttributeTerm::Ref(self.resolve_qname(node, r)),
            None => AttributeTerm::Decl(self.parse_attribute_decl(node)?),
        };
        Some(AttributeUse {
            required: usage == Some("required"),
            term,
        })
    }

    /// Type of an element or attribute: `type` attribute or inline definition
    fn parse_type_ref(&mut self, node: Node<'_, '_>, default: TypeRef) -> TypeRef {
        if let Some(type_name) = node.attribute(xsd_attrs::TYPE) {
            return TypeRef::Named(self.resolve_qname(node, type_name));
        }
        for child in xsd_children(node) {
            match child.tag_name().name() {
                xsd_elements::COMPLEX_TYPE => {
                    let ct = self.parse_complex_type(child, None);
                    return TypeRef::Anonymous(Box::new(TypeDefinition::Complex(ct)));
                }
                xsd_elements::SIMPLE_TYPE => {
                    let st = self.parse_simple_type(child, None);
                    return TypeRef::Anonymous(Box::new(TypeDefinition::Simple(st)));
                }
                _ => {}
            }
        }
        default
    }

    fn parse_complex_type(&mut self, node: Node<'_, '_>, name: Option<QName>) -> ComplexType {
        let mut ct = ComplexType::new(name, self.target_namespace.clone());
        ct.documentation = documentation(node);

        for child in xsd_children(node) {
            match child.tag_name().name() {
                xsd_elements::COMPLEX_CONTENT => {
                    if let Some(derivation_node) = find_derivation(child) {
                        ct.base = derivation_node
                            .attribute(xsd_attrs::BASE)
                            .map(|b| self.resolve_qname(derivation_node, b));
                        self.parse_complex_body(derivation_node, &mut ct);
                    }
                }
                xsd_elements::SIMPLE_CONTENT => {
                    if let Some(derivation_node) = find_derivation(child) {
                        ct.base = derivation_node
                            .attribute(xsd_attrs::BASE)
                            .map(|b| self.resolve_qname(derivation_node, b));
                        let content = match find_child(derivation_node, xsd_elements::SIMPLE_TYPE) {
                            Some(inline) => {
                                let st = self.parse_simple_type(inline, None);
                                TypeRef::Anonymous(Box::new(TypeDefinition::Simple(st)))
                            }
                            None => ct
                                .base
                                .clone()
                                .map(TypeRef::Named)
                                .unwrap_or_else(TypeRef::any_simple_type),
                        };
                        ct.content = ContentType::Simple(content);
                        self.parse_complex_body(derivation_node, &mut ct);
                    }
                }
                _ => {}
            }
        }
        self.parse_complex_body(node, &mut ct);
        ct
    }

    /// Content model and attributes directly under `node`
    fn parse_complex_body(&mut self, node: Node<'_, '_>, ct: &mut ComplexType) {
        for child in xsd_children(node) {
            match child.tag_name().name() {
                xsd_elements::SEQUENCE | xsd_elements::CHOICE | xsd_elements::ALL | xsd_elements::GROUP => {
                    if let Some(particle) = self.parse_particle(child) {
                        ct.content = ContentType::Particle(particle);
                    }
                }
                xsd_elements::ATTRIBUTE => {
                    if let Some(att) = self.parse_attribute_use(child) {
                        ct.attribute_uses.push(att);
                    }
                }
                xsd_elements::ATTRIBUTE_GROUP => {
                    if let Some(r) = child.attribute(xsd_attrs::REF) {
                        let qname = self.resolve_qname(child, r);
                        ct.attribute_groups.push(qname);
                    }
                }
                xsd_elements::ANY_ATTRIBUTE => {
                    tracing::debug!("attribute wildcard ignored at {}", location(child));
                }
                _ => {}
            }
        }
    }

    fn parse_particle(&mut self, node: Node<'_, '_>) -> Option<Particle> {
        let occurs = parse_occurs(node);
        let tag = node.tag_name().name();
        let term = match tag {
            xsd_elements::ELEMENT => match node.attribute(xsd_attrs::REF) {
                Some(r) => Term::ElementRef(self.resolve_qname(node, r)),
                None => Term::Element(Box::new(self.parse_element_decl(node)?)),
            },
            xsd_elements::SEQUENCE | xsd_elements::CHOICE | xsd_elements::ALL => {
                let compositor = Compositor::from_tag(tag)?;
                Term::ModelGroup(self.parse_model_group(node, compositor))
            }
            xsd_elements::GROUP => match node.attribute(xsd_attrs::REF) {
                Some(r) => Term::GroupRef(self.resolve_qname(node, r)),
                None => {
                    self.error(node, "Group particle without a ref".to_string());
                    return None;
                }
            },
            xsd_elements::ANY => Term::Wildcard,
            _ => return None,
        };
        Some(Particle { occurs, term })
    }

    fn parse_model_group(&mut self, node: Node<'_, '_>, compositor: Compositor) -> ModelGroup {
        let mut group = ModelGroup::new(compositor);
        for child in xsd_children(node) {
            if let Some(particle) = self.parse_particle(child) {
                group.particles.push(particle);
            }
        }
        group
    }

    fn parse_simple_type(&mut self, node: Node<'_, '_>, name: Option<QName>) -> SimpleType {
        let mut st = SimpleType {
            name,
            target_namespace: self.target_namespace.clone(),
            variety: SimpleVariety::Restriction(TypeRef::any_simple_type()),
            facets: Vec::new(),
            documentation: documentation(node),
        };

        for child in xsd_children(node) {
            match child.tag_name().name() {
                xsd_elements::RESTRICTION => {
                    let base = match child.attribute(xsd_attrs::BASE) {
                        Some(b) => TypeRef::Named(self.resolve_qname(child, b)),
                        None => self.parse_inline_simple_type(child),
                    };
                    st.variety = SimpleVariety::Restriction(base);
                    st.facets = xsd_children(child)
                        .filter(|f| {
                            !matches!(
                                f.tag_name().name(),
                                xsd_elements::SIMPLE_TYPE | xsd_elements::ANNOTATION
                            )
                        })
                        .filter_map(|f| {
                            f.attribute(xsd_attrs::VALUE).map(|value| Facet {
                                kind: f.tag_name().name().to_string(),
                                value: value.to_string(),
                            })
                        })
                        .collect();
                }
                xsd_elements::LIST => {
                    let item = match child.attribute(xsd_attrs::ITEM_TYPE) {
                        Some(t) => TypeRef::Named(self.resolve_qname(child, t)),
                        None => self.parse_inline_simple_type(child),
                    };
                    st.variety = SimpleVariety::List(item);
                }
                xsd_elements::UNION => {
                    let mut members: Vec<TypeRef> = child
                        .attribute(xsd_attrs::MEMBER_TYPES)
                        .map(|m| m.split_whitespace().map(str::to_string).collect::<Vec<_>>())
                        .unwrap_or_default()
                        .iter()
                        .map(|m| TypeRef::Named(self.resolve_qname(child, m)))
                        .collect();
                    for inline in xsd_children(child)
                        .filter(|n| n.tag_name().name() == xsd_elements::SIMPLE_TYPE)
                    {
                        let member = self.parse_simple_type(inline, None);
                        members.push(TypeRef::Anonymous(Box::new(TypeDefinition::Simple(member))));
                    }
                    st.variety = SimpleVariety::Union(members);
                }
                _ => {}
            }
        }
        st
    }

    fn parse_inline_simple_type(&mut self, node: Node<'_, '_>) -> TypeRef {
        match find_child(node, xsd_elements::SIMPLE_TYPE) {
            Some(inline) => {
                let st = self.parse_simple_type(inline, None);
                TypeRef::Anonymous(Box::new(TypeDefinition::Simple(st)))
            }
            None => TypeRef::any_simple_type(),
        }
    }
}

/// The restriction or extension child of a content element
fn find_derivation<'a, 'input: 'a>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    xsd_children(node).find(|child| {
        matches!(
            child.tag_name().name(),
            xsd_elements::EXTENSION | xsd_elements::RESTRICTION
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoggingErrorHandler;

    const NS: &str = "http://example.com/test";

    fn parse(xsd: &str) -> (SchemaSet, ParsedDocument) {
        let mut set = SchemaSet::new();
        let mut handler = LoggingErrorHandler::new();
        let doc = parse_document(xsd, "test.xsd", None, false, &mut set, &mut handler)
            .expect("schema should parse");
        (set, doc)
    }

    fn qname(local: &str) -> QName {
        QName::namespaced(NS, local)
    }

    #[test]
    fn test_parse_not_well_formed_is_fatal() {
        let mut set = SchemaSet::new();
        let mut handler = LoggingErrorHandler::new();
        let result = parse_document("<xs:schema", "bad.xsd", None, false, &mut set, &mut handler);
        match result {
            Err(Error::Parse(err)) => assert_eq!(err.severity, Severity::Fatal),
            other => panic!("expected fatal parse error, got {:?}", other),
        }
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_parse_non_schema_root_fails() {
        let mut set = SchemaSet::new();
        let mut handler = LoggingErrorHandler::new();
        let result = parse_document("<root/>", "bad.xsd", None, false, &mut set, &mut handler);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_global_components_in_document_order() {
        let (set, doc) = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                         targetNamespace="http://example.com/test"
                         xmlns:tns="http://example.com/test">
                <xs:complexType name="B"><xs:sequence/></xs:complexType>
                <xs:simpleType name="S"><xs:restriction base="xs:string"/></xs:simpleType>
                <xs:complexType name="A"><xs:sequence/></xs:complexType>
                <xs:element name="root" type="tns:A"/>
            </xs:schema>"#,
        );

        assert_eq!(doc.schema.target_namespace.as_deref(), Some(NS));
        assert_eq!(doc.schema.complex_types, vec![qname("B"), qname("A")]);
        assert_eq!(doc.schema.simple_types, vec![qname("S")]);
        assert_eq!(doc.schema.elements, vec![qname("root")]);

        let root = set.element(&qname("root")).expect("root element");
        assert_eq!(root.type_ref.name(), Some(&qname("A")));
    }

    #[test]
    fn test_parse_enumeration_and_documentation() {
        let (set, _) = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="http://example.com/test">
                <xs:simpleType name="Color">
                    <xs:annotation><xs:documentation>  A colour. </xs:documentation></xs:annotation>
                    <xs:restriction base="xs:string">
                        <xs:enumeration value="RED"/>
                        <xs:enumeration value="GREEN"/>
                        <xs:pattern value="[A-Z]+"/>
                    </xs:restriction>
                </xs:simpleType>
            </xs:schema>"#,
        );

        let color = set.simple_type(&qname("Color")).expect("Color");
        assert_eq!(color.enumeration_values(), vec!["RED", "GREEN"]);
        assert_eq!(color.facets.len(), 3);
        assert_eq!(color.documentation.as_deref(), Some("A colour."));
        match &color.variety {
            SimpleVariety::Restriction(TypeRef::Named(base)) => assert_eq!(base.local_name, "string"),
            other => panic!("unexpected variety {:?}", other),
        }
    }

    #[test]
    fn test_parse_complex_content_extension() {
        let (set, _) = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                         targetNamespace="http://example.com/test"
                         xmlns:tns="http://example.com/test">
                <xs:complexType name="Dog">
                    <xs:complexContent>
                        <xs:extension base="tns:Animal">
                            <xs:sequence>
                                <xs:element name="breed" type="xs:string" minOccurs="0" maxOccurs="unbounded"/>
                            </xs:sequence>
                            <xs:attribute name="id" type="xs:ID" use="required"/>
                        </xs:extension>
                    </xs:complexContent>
                </xs:complexType>
            </xs:schema>"#,
        );

        let dog = set.complex_type(&qname("Dog")).expect("Dog");
        assert_eq!(dog.base, Some(qname("Animal")));
        assert_eq!(dog.attribute_uses.len(), 1);
        assert!(dog.attribute_uses[0].required);

        let ContentType::Particle(particle) = &dog.content else {
            panic!("expected particle content");
        };
        let Term::ModelGroup(group) = &particle.term else {
            panic!("expected model group");
        };
        assert_eq!(group.compositor, Compositor::Sequence);
        assert_eq!(group.particles[0].occurs, Occurs::new(0, None));
    }

    #[test]
    fn test_parse_simple_content() {
        let (set, _) = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="http://example.com/test">
                <xs:complexType name="Price">
                    <xs:simpleContent>
                        <xs:extension base="xs:decimal">
                            <xs:attribute name="currency" type="xs:string"/>
                        </xs:extension>
                    </xs:simpleContent>
                </xs:complexType>
            </xs:schema>"#,
        );

        let price = set.complex_type(&qname("Price")).expect("Price");
        match &price.content {
            ContentType::Simple(TypeRef::Named(base)) => assert_eq!(base.local_name, "decimal"),
            other => panic!("unexpected content {:?}", other),
        }
        assert_eq!(price.attribute_uses.len(), 1);
    }

    #[test]
    fn test_parse_references_and_groups() {
        let (set, doc) = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                         targetNamespace="http://example.com/test"
                         xmlns:tns="http://example.com/test">
                <xs:include schemaLocation="types.xsd"/>
                <xs:import namespace="urn:other" schemaLocation="other.xsd"/>
                <xs:group name="G"><xs:choice><xs:element name="a" type="xs:int"/></xs:choice></xs:group>
                <xs:attributeGroup name="AG"><xs:attribute name="lang" type="xs:language"/></xs:attributeGroup>
                <xs:complexType name="T">
                    <xs:group ref="tns:G"/>
                    <xs:attributeGroup ref="tns:AG"/>
                </xs:complexType>
            </xs:schema>"#,
        );

        assert_eq!(doc.references.len(), 2);
        assert_eq!(doc.references[0].kind, ReferenceKind::Include);
        assert_eq!(doc.references[1].namespace.as_deref(), Some("urn:other"));
        assert!(set.group(&qname("G")).is_some());
        assert!(set.attribute_group(&qname("AG")).is_some());

        let t = set.complex_type(&qname("T")).expect("T");
        assert_eq!(t.attribute_groups, vec![qname("AG")]);
        let ContentType::Particle(particle) = &t.content else {
            panic!("expected particle content");
        };
        assert!(matches!(&particle.term, Term::GroupRef(name) if *name == qname("G")));
    }

    #[test]
    fn test_chameleon_namespace_adoption() {
        let mut set = SchemaSet::new();
        let mut handler = LoggingErrorHandler::new();
        let doc = parse_document(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="Person">
                    <xs:sequence><xs:element name="address" type="Address"/></xs:sequence>
                </xs:complexType>
            </xs:schema>"#,
            "types.xsd",
            Some(NS),
            false,
            &mut set,
            &mut handler,
        )
        .expect("schema should parse");

        assert_eq!(doc.schema.target_namespace.as_deref(), Some(NS));
        let person = set.complex_type(&qname("Person")).expect("Person");
        let ContentType::Particle(particle) = &person.content else {
            panic!("expected particle content");
        };
        let Term::ModelGroup(group) = &particle.term else {
            panic!("expected model group");
        };
        let Term::Element(address) = &group.particles[0].term else {
            panic!("expected element");
        };
        assert_eq!(address.type_ref.name(), Some(&qname("Address")));
    }

    #[test]
    fn test_duplicate_definition_warns() {
        let mut set = SchemaSet::new();
        let mut handler = LoggingErrorHandler::new();
        parse_document(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:complexType name="A"/>
                <xs:complexType name="A"/>
                <xs:complexType/>
            </xs:schema>"#,
            "dup.xsd",
            None,
            false,
            &mut set,
            &mut handler,
        )
        .expect("schema should parse");

        assert_eq!(set.types.len(), 1);
        assert_eq!(handler.warning_count(), 1);
        assert_eq!(handler.error_count(), 1);
    }
}
