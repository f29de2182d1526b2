//! XSD schema model and document parsing
//!
//! The parser produces a name-keyed [`SchemaSet`] that the lowering engine
//! walks. Only the parts of XSD with a Protocol Buffers counterpart are
//! modelled in detail.

pub mod builtins;
pub mod model;
pub mod parsing;

pub use builtins::{is_basic_type, is_xsd_namespace, XSD_NAMESPACE};
pub use model::{
    AttributeDecl, AttributeGroup, AttributeTerm, AttributeUse, ComplexType, Compositor,
    ContentType, ElementDecl, Facet, ModelGroup, Occurs, Particle, Schema, SchemaSet,
    SimpleType, SimpleVariety, Term, TypeDefinition, TypeRef,
};
pub use parsing::{parse_document, ParsedDocument, ReferenceKind, SchemaReference};
