//! Dependency resolution for messages the emitter could not order
//!
//! Whatever is left after the topological pass either forms a cycle (every
//! unresolved reference points back into the residue) or depends on types
//! that were never defined.

use std::collections::BTreeSet;

use crate::error::{CulpritMap, InvalidSchemaError, Result};
use crate::marshal::Marshaller;
use crate::registry::TypeRegistry;

/// Outcome of resolving the residue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing was left over
    Complete,
    /// Mutually dependent messages to write as they are, in name order
    DumpCycle(Vec<String>),
}

/// Classify the messages not yet written
pub fn resolve(registry: &TypeRegistry, marshaller: &dyn Marshaller) -> Result<Resolution> {
    let residue = registry.undeclared_messages();
    if residue.is_empty() {
        return Ok(Resolution::Complete);
    }

    let names: BTreeSet<String> = residue.iter().map(|m| m.name.clone()).collect();
    let declared = registry.declared_names();
    let required: BTreeSet<String> = residue
        .iter()
        .flat_map(|m| m.type_names())
        .filter(|t| !declared.contains(t) && !names.contains(t))
        .collect();

    if required.is_empty() {
        if marshaller.is_circular_dependency_supported() {
            tracing::info!("{} mutually dependent messages written as a group", names.len());
            return Ok(Resolution::DumpCycle(names.into_iter().collect()));
        }

        tracing::error!(
            "source schema contains circular dependencies and the target marshaller does not support them; reduced dependency graph follows"
        );
        let mut culprits = CulpritMap::new();
        for message in &residue {
            let deps: BTreeSet<String> = message
                .type_names()
                .into_iter()
                .filter(|t| !declared.contains(t))
                .collect();
            tracing::error!("{}: {:?}", message.name, deps);
            culprits.insert(message.name.clone(), deps);
        }
        return Err(InvalidSchemaError::Cycle(culprits).into());
    }

    tracing::error!("source schema contains references to missing types");
    let mut culprits = CulpritMap::new();
    for message in &residue {
        let missing: BTreeSet<String> = message
            .type_names()
            .into_iter()
            .filter(|t| required.contains(t))
            .collect();
        if !missing.is_empty() {
            tracing::error!("{}: {:?}", message.name, missing);
            culprits.insert(message.name.clone(), missing);
        }
    }
    Err(InvalidSchemaError::MissingTypes(culprits).into())
}
