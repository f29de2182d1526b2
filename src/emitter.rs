//! Topological emission of a lowered registry
//!
//! A message is written once every type its fields refer to is available:
//! a message already written, a basic type, an enumeration or an alias.
//! Whatever cannot be ordered this way is handed to the [`resolver`].
//!
//! [`resolver`]: crate::resolver

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Options;
use crate::error::Result;
use crate::marshal::{import_for_mapped, Marshaller};
use crate::names::{escape, escape_type};
use crate::output::OutputWriter;
use crate::registry::{TypeRegistry, UNSPECIFIED_TYPE};
use crate::resolver::{resolve, Resolution};
use crate::xsd::builtins::{is_basic_type, BINARY};

/// Writes messages and enumerations through a marshaller into an output sink
pub struct Emitter<'a> {
    registry: &'a mut TypeRegistry,
    marshaller: &'a mut dyn Marshaller,
    writer: &'a mut OutputWriter,
    options: &'a Options,
    /// Enumerations written at package scope
    top_level_enums: BTreeSet<String>,
}

impl<'a> Emitter<'a> {
    /// Create an emitter
    pub fn new(
        registry: &'a mut TypeRegistry,
        marshaller: &'a mut dyn Marshaller,
        writer: &'a mut OutputWriter,
        options: &'a Options,
    ) -> Self {
        Self {
            registry,
            marshaller,
            writer,
            options,
            top_level_enums: BTreeSet::new(),
        }
    }

    fn nest_enums(&self) -> bool {
        self.options.nest_enums && self.marshaller.is_nested_enums()
    }

    /// Emit the whole registry
    pub fn emit(&mut self) -> Result<()> {
        self.write_prelude();
        self.write_top_level_enums();

        let mut progressed = true;
        while progressed {
            progressed = false;
            let pending: Vec<String> = self
                .registry
                .undeclared_messages()
                .iter()
                .map(|m| m.name.clone())
                .collect();
            for name in pending {
                let ready = self.registry.message(&name).map_or(false, |m| {
                    m.type_names().iter().all(|t| self.registry.is_available(t))
                });
                if ready {
                    self.write_struct(&name);
                    progressed = true;
                }
            }
        }

        match resolve(&*self.registry, &*self.marshaller)? {
            Resolution::Complete => {}
            Resolution::DumpCycle(names) => {
                for name in names {
                    self.write_struct(&name);
                }
            }
        }
        Ok(())
    }

    /// Imports for well-known types, then the fallback message
    fn write_prelude(&mut self) {
        let mut imports: BTreeSet<(String, &'static str)> = BTreeSet::new();
        for message in self.registry.messages() {
            for type_name in message.type_names() {
                let resolved = self.registry.alias(&type_name).unwrap_or(type_name.as_str());
                if let Some(path) = self.marshaller.import_for(resolved) {
                    imports.insert((message.namespace.clone(), path));
                }
            }
        }
        for (package, path) in imports {
            self.writer.add_import(&package, path);
        }

        if self.registry.message(UNSPECIFIED_TYPE).is_some() {
            self.write_struct(UNSPECIFIED_TYPE);
        }
    }

    /// Enumerations that cannot be nested go to package scope
    fn write_top_level_enums(&mut self) {
        let nest = self.nest_enums();
        let mut referenced_from: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for message in self.registry.messages() {
            for field in message.fields() {
                referenced_from
                    .entry(field.type_name.as_str())
                    .or_default()
                    .insert(message.namespace.as_str());
            }
        }

        let top_level: Vec<String> = self
            .registry
            .enums()
            .filter(|e| {
                !nest
                    || match referenced_from.get(e.name.as_str()) {
                        // Orphans, and enumerations used across packages
                        None => true,
                        Some(packages) => packages.iter().any(|p| *p != e.namespace),
                    }
            })
            .map(|e| e.name.clone())
            .collect();

        for name in top_level {
            let package = self
                .registry
                .namespace_of(&name)
                .unwrap_or_default()
                .to_string();
            self.write_enum(&name, &package);
            self.writer.stream(&package).push('\n');
            self.top_level_enums.insert(name);
        }
    }

    fn write_struct(&mut self, name: &str) {
        if self.registry.is_declared(name) {
            return;
        }
        let Some(message) = self.registry.message(name).cloned() else {
            return;
        };
        let package = message.namespace.clone();

        if self.options.include_message_docs {
            if let Some(doc) = self.registry.documentation(name) {
                let comment = self.marshaller.write_comment(doc);
                self.writer.stream(&package).push_str(&comment);
            }
        }

        let message_name = self.marshaller.name_mapping(name).unwrap_or_else(|| name.to_string());
        let header = self.marshaller.write_struct_header(&escape_type(&message_name));
        self.writer.stream(&package).push_str(&header);

        let mut nested_enums: BTreeSet<String> = BTreeSet::new();
        let mut identifiers: BTreeSet<String> = BTreeSet::new();
        for (index, field) in message.sorted_fields().into_iter().enumerate() {
            let order = index as u32 + 1;
            let mut field_name = self
                .marshaller
                .name_mapping(&field.name)
                .unwrap_or_else(|| field.name.clone());
            let mut type_name = field.type_name.clone();

            if self.nest_enums()
                && self.registry.is_enum(&type_name)
                && !self.top_level_enums.contains(&type_name)
                && nested_enums.insert(type_name.clone())
            {
                self.write_enum(&type_name, &package);
            }

            if let Some(basic) = self.registry.alias(&type_name) {
                type_name = basic.to_string();
            }
            if !self.registry.is_message(&type_name)
                && !is_basic_type(&type_name)
                && !self.registry.is_enum(&type_name)
            {
                tracing::warn!("{}.{}: unknown type '{}' written as {}", name, field.name, type_name, BINARY);
                type_name = BINARY.to_string();
            }
            if type_name == field_name {
                field_name = format!("_{}", field_name);
            }

            let (mut local, qualifier) = match self.marshaller.type_mapping(&type_name) {
                Some(mapped) => {
                    let split = mapped
                        .rsplit_once('.')
                        .map(|(p, l)| (p.to_string(), l.to_string()));
                    match split {
                        Some((target_package, local)) => {
                            if import_for_mapped(&mapped).is_none() {
                                self.writer.add_inclusion(&package, &target_package);
                            }
                            (local, format!("{}.", target_package))
                        }
                        None => {
                            let qualifier = self.qualifier_for(&mapped, &package);
                            (mapped, qualifier)
                        }
                    }
                }
                None => {
                    let qualifier = self.qualifier_for(&type_name, &package);
                    (type_name, qualifier)
                }
            };
            if let Some(renamed) = self.marshaller.name_mapping(&local) {
                local = renamed;
            }
            let field_type = format!("{}{}", qualifier, escape_type(&local));

            let documentation = if self.options.include_field_docs {
                field
                    .documentation
                    .clone()
                    .or_else(|| self.registry.documentation(&field.type_name).map(str::to_string))
            } else {
                None
            };

            let identifier = unique_identifier(
                &mut identifiers,
                self.marshaller.field_identifier(&escape(&field_name)),
                name,
            );
            let line = self.marshaller.write_struct_parameter(
                order,
                field.required,
                field.repeated,
                &identifier,
                &field_type,
                documentation.as_deref(),
            );
            self.writer.stream(&package).push_str(&line);
        }

        let footer = self.marshaller.write_struct_footer();
        self.writer.stream(&package).push_str(&footer);
        self.registry.mark_declared(name);
        tracing::debug!("wrote message {}", name);
    }

    /// Package prefix for a message or enumeration outside `package`
    fn qualifier_for(&mut self, type_name: &str, package: &str) -> String {
        if is_basic_type(type_name) {
            return String::new();
        }
        match self.registry.namespace_of(type_name) {
            Some(target) if target != package => {
                let target = target.to_string();
                self.writer.add_inclusion(package, &target);
                if target.is_empty() {
                    ".".to_string()
                } else {
                    format!("{}.", target)
                }
            }
            _ => String::new(),
        }
    }

    fn write_enum(&mut self, name: &str, package: &str) {
        let Some(enumeration) = self.registry.enumeration(name).cloned() else {
            return;
        };

        if self.options.include_message_docs {
            if let Some(doc) = self.registry.documentation(name) {
                let comment = self.marshaller.write_comment(doc);
                self.writer.stream(package).push_str(&comment);
            }
        }

        let enum_name = self.marshaller.name_mapping(name).unwrap_or_else(|| name.to_string());
        let mut out = self.marshaller.write_enum_header(&escape_type(&enum_name));

        let prefix = if self.options.type_in_enums {
            format!("{}_", enumeration.name)
        } else {
            String::new()
        };

        let mut values = vec![format!("{}notSet", prefix)];
        values.extend(enumeration.values().map(|v| format!("{}{}", prefix, v)));
        if enumeration.is_empty() {
            values.push(format!("{}UnspecifiedValue", prefix));
        }

        let mut identifiers: BTreeSet<String> = BTreeSet::new();
        for (order, value) in (self.options.enum_order_start..).zip(values) {
            let identifier = unique_identifier(
                &mut identifiers,
                self.marshaller.enum_value_identifier(&escape(&value)),
                name,
            );
            out.push_str(&self.marshaller.write_enum_value(order, &identifier));
        }
        out.push_str(&self.marshaller.write_enum_footer());

        self.writer.stream(package).push_str(&out);
        tracing::debug!("wrote enum {}", name);
    }
}

/// Suffix `identifier` with `_2`, `_3`, ... until it is unused in its scope
fn unique_identifier(used: &mut BTreeSet<String>, identifier: String, scope: &str) -> String {
    if used.insert(identifier.clone()) {
        return identifier;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{}_{}", identifier, suffix);
        if used.insert(candidate.clone()) {
            tracing::warn!("{}: duplicate identifier '{}' written as '{}'", scope, identifier, candidate);
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::ProtobufMarshaller;
    use crate::output::OutputLayout;
    use crate::registry::{Enumeration, Field, Message};

    fn emit(registry: &mut TypeRegistry, options: &Options) -> Result<String> {
        let mut marshaller = options.marshaller()?;
        let mut writer = OutputWriter::new(OutputLayout::Single {
            filename: "out.proto".to_string(),
        });
        Emitter::new(registry, &mut marshaller, &mut writer, options).emit()?;
        let files = writer.render(&marshaller);
        Ok(files["out.proto"].clone())
    }

    fn registry_with_fallback() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.insert_message(TypeRegistry::unspecified_type("ex"));
        registry
    }

    #[test]
    fn test_dependencies_written_first() {
        let mut registry = registry_with_fallback();
        let mut order = Message::new("Order", "ex");
        order.add_field(Field::new("customer", "Customer").required(true));
        let mut customer = Message::new("Customer", "ex");
        customer.add_field(Field::new("name", "string").required(true));
        registry.insert_message(order);
        registry.insert_message(customer);

        let out = emit(&mut registry, &Options::default()).unwrap();
        let customer_at = out.find("message Customer").unwrap();
        let order_at = out.find("message Order").unwrap();
        assert!(customer_at < order_at);
        assert!(out.find("message UnspecifiedType").unwrap() < customer_at);
        assert!(out.contains("  required Customer customer = 1;\n"));
    }

    #[test]
    fn test_nested_and_orphan_enums() {
        let mut registry = registry_with_fallback();
        let mut color = Enumeration::new("Color", "ex");
        color.add_value("RED");
        registry.insert_enum(color);
        registry.insert_enum(Enumeration::new("Unused", "ex"));
        let mut shirt = Message::new("Shirt", "ex");
        shirt.add_field(Field::new("color", "Color"));
        registry.insert_message(shirt);

        let out = emit(&mut registry, &Options::default()).unwrap();
        assert!(out.contains(
            "message Shirt {\n  enum Color {\n    COLOR_NOT_SET = 1;\n    COLOR_RED = 2;\n  }\n  optional Color color = 1;\n}\n"
        ));
        assert!(out.contains(
            "enum Unused {\n  UNUSED_NOT_SET = 1;\n  UNUSED_UNSPECIFIED_VALUE = 2;\n}\n"
        ));
    }

    #[test]
    fn test_enum_options() {
        let mut registry = registry_with_fallback();
        let mut color = Enumeration::new("Color", "ex");
        color.add_value("RED");
        registry.insert_enum(color);

        let options = Options {
            nest_enums: false,
            type_in_enums: false,
            enum_order_start: 0,
            ..Options::default()
        };
        let out = emit(&mut registry, &options).unwrap();
        assert!(out.contains("enum Color {\n  NOT_SET = 0;\n  RED = 1;\n}\n"));
    }

    #[test]
    fn test_alias_mapping_and_escaping() {
        let mut registry = registry_with_fallback();
        registry.insert_alias("Code", "normalizedString");
        let mut item = Message::new("Item", "ex");
        item.add_field(Field::new("code", "Code"));
        item.add_field(Field::new("int", "int"));
        item.add_field(Field::new("at", "time"));
        item.add_field(Field::new("extra", "anyType"));
        registry.insert_message(item);

        let out = emit(&mut registry, &Options::default()).unwrap();
        assert!(out.contains("import \"google/protobuf/timestamp.proto\";\n"));
        assert!(out.contains("  optional google.protobuf.Timestamp at = 1;\n"));
        assert!(out.contains("  optional string code = 2;\n"));
        assert!(out.contains("  optional UnspecifiedType extra = 3;\n"));
        assert!(out.contains("  optional int32 _int = 4;\n"));
    }

    #[test]
    fn test_documentation() {
        let mut registry = registry_with_fallback();
        let mut person = Message::new("Person", "ex");
        person.add_field(Field::new("name", "string").with_documentation(Some("Full name".into())));
        registry.insert_message(person);
        registry.add_documentation("Person", Some("A person"));

        let out = emit(&mut registry, &Options::default()).unwrap();
        assert!(out.contains("/*\n * A person\n */\nmessage Person {\n"));
        assert!(out.contains("optional string name = 1; // Full name\n"));

        let mut registry = registry_with_fallback();
        let mut person = Message::new("Person", "ex");
        person.add_field(Field::new("name", "string").with_documentation(Some("Full name".into())));
        registry.insert_message(person);
        registry.add_documentation("Person", Some("A person"));
        let options = Options {
            include_message_docs: false,
            include_field_docs: false,
            ..Options::default()
        };
        let out = emit(&mut registry, &options).unwrap();
        assert!(!out.contains("A person"));
        assert!(!out.contains("Full name"));
    }

    #[test]
    fn test_cross_package_reference() {
        let mut registry = registry_with_fallback();
        registry.insert_message(Message::new("Address", "com.example.common"));
        let mut order = Message::new("Order", "ex");
        order.add_field(Field::new("ship_to", "Address"));
        registry.insert_message(order);

        let options = Options {
            split_by_namespace: true,
            ..Options::default()
        };
        let mut marshaller = options.marshaller().unwrap();
        let mut writer = OutputWriter::new(OutputLayout::SplitByNamespace);
        Emitter::new(&mut registry, &mut marshaller, &mut writer, &options)
            .emit()
            .unwrap();
        let files = writer.render(&marshaller);
        let ex = &files["ex.proto"];
        assert!(ex.contains("import \"com.example.common.proto\";\n"));
        assert!(ex.contains("optional com.example.common.Address ship_to = 1;\n"));
    }

    #[test]
    fn test_missing_type_fails() {
        let mut registry = registry_with_fallback();
        let mut holder = Message::new("Holder", "ex");
        holder.add_field(Field::new("g", "Ghost"));
        registry.insert_message(holder);

        let err = emit(&mut registry, &Options::default()).unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn test_name_mapping() {
        let mut registry = registry_with_fallback();
        let mut person = Message::new("LegacyPerson", "ex");
        person.add_field(Field::new("name", "string"));
        let mut team = Message::new("Team", "ex");
        team.add_field(Field::new("lead", "LegacyPerson"));
        registry.insert_message(person);
        registry.insert_message(team);

        let mut options = Options::default();
        options
            .name_mappings
            .insert("Legacy(.*)".to_string(), "$1".to_string());
        let out = emit(&mut registry, &options).unwrap();
        assert!(out.contains("message Person {\n"));
        assert!(out.contains("optional Person lead = 1;\n"));
    }

    #[test]
    fn test_colliding_field_identifiers_suffixed() {
        let mut registry = registry_with_fallback();
        let mut item = Message::new("Item", "ex");
        item.add_field(Field::new("fooBar", "string"));
        item.add_field(Field::new("foo_bar", "int"));
        registry.insert_message(item);

        let out = emit(&mut registry, &Options::default()).unwrap();
        assert!(out.contains("  optional string foo_bar = 1;\n  optional int32 foo_bar_2 = 2;\n"));
    }

    #[test]
    fn test_colliding_enum_values_suffixed() {
        let mut registry = registry_with_fallback();
        let mut sign = Enumeration::new("Sign", "ex");
        sign.add_value("+1");
        sign.add_value("-1");
        registry.insert_enum(sign);

        let out = emit(&mut registry, &Options::default()).unwrap();
        assert!(out.contains(
            "enum Sign {\n  SIGN_NOT_SET = 1;\n  SIGN_1 = 2;\n  SIGN_1_2 = 3;\n}\n"
        ));
    }

    #[test]
    fn test_message_written_once() {
        let mut registry = registry_with_fallback();
        registry.insert_message(Message::new("Empty", "ex"));

        let out = emit(&mut registry, &Options::default()).unwrap();
        assert_eq!(out.matches("message Empty {").count(), 1);
        assert_eq!(out.matches("message UnspecifiedType {").count(), 1);
    }
}
