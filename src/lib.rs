//! # xsd2proto
//!
//! Translate XML Schema (XSD) documents into Protocol Buffers schemas.
//!
//! The pipeline loads a root schema with everything it includes or imports,
//! lowers the XSD type graph into a flat registry of messages, enumerations
//! and aliases, and emits them in dependency order as `.proto` text.
//!
//! ## Features
//!
//! - proto2 and proto3 output
//! - Inheritance flattened into self-contained messages
//! - Nested or package-level enumerations
//! - One file per namespace, or a single file with a fixed package
//! - Regex type and name mapping tables
//!
//! ## Example
//!
//! ```rust,no_run
//! use xsd2proto::{Options, Translator};
//!
//! let translation = Translator::new(Options::default()).translate_file("orders.xsd")?;
//! translation.write_to("out")?;
//! # Ok::<(), xsd2proto::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod names;
pub mod namespaces;

// Schema input
pub mod loaders;
pub mod xsd;

// Lowering and emission
pub mod emitter;
pub mod lowering;
pub mod marshal;
pub mod output;
pub mod registry;
pub mod resolver;

// Pipeline
pub mod config;
pub mod translator;

// Re-exports for convenience
pub use config::Options;
pub use error::{Error, ErrorHandler, InvalidSchemaError, ParseError, Result, Severity};
pub use marshal::{Marshaller, ProtobufMarshaller, ProtobufVersion};
pub use registry::TypeRegistry;
pub use translator::{Translation, Translator};

/// Version of the xsd2proto library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
