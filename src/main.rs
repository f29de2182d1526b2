//! Command-line interface for xsd2proto

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use xsd2proto::marshal::parse_mapping;
#[cfg(feature = "cli")]
use xsd2proto::{Options, ProtobufVersion, Translator};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsd2proto")]
#[command(author, version, about = "Translate XML Schema documents into Protocol Buffers", long_about = None)]
struct Cli {
    /// Path to the root XSD schema
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Name of the single output file (defaults to the input's stem)
    #[arg(long, value_name = "NAME")]
    filename: Option<String>,

    /// Write one file per namespace
    #[arg(long)]
    split_by_namespace: bool,

    /// Package of the single output file
    #[arg(long, value_name = "PKG")]
    package: Option<String>,

    /// Protocol Buffers syntax version: 2 or 3
    #[arg(long, value_name = "VERSION")]
    protobuf_version: Option<u8>,

    /// Emit enumerations inside the messages that use them
    #[arg(long, value_name = "BOOL")]
    nest_enums: Option<bool>,

    /// Number of the first enumeration value
    #[arg(long = "enum-start", value_name = "N")]
    enum_order_start: Option<u32>,

    /// Prefix enumeration values with the enumeration name
    #[arg(long, value_name = "BOOL")]
    type_in_enums: Option<bool>,

    /// Emit message documentation
    #[arg(long = "message-docs", value_name = "BOOL")]
    include_message_docs: Option<bool>,

    /// Emit field documentation
    #[arg(long = "field-docs", value_name = "BOOL")]
    include_field_docs: Option<bool>,

    /// Custom type mapping, tried before the defaults (repeatable)
    #[arg(long = "type-mapping", value_name = "RE=REPL")]
    type_mappings: Vec<String>,

    /// Rename messages, fields and types (repeatable)
    #[arg(long = "name-mapping", value_name = "RE=REPL")]
    name_mappings: Vec<String>,

    /// TOML file with translation options
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Accept schemas that carry a DOCTYPE
    #[arg(long)]
    allow_dtd: bool,

    /// Write the lowered registry as JSON
    #[arg(long, value_name = "FILE")]
    dump_registry: Option<PathBuf>,
}

#[cfg(feature = "cli")]
impl Cli {
    /// Options from the config file, overridden by flags
    fn options(&self) -> xsd2proto::Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::from_file(path)?,
            None => Options::default(),
        };

        if let Some(version) = self.protobuf_version {
            options.protobuf_version = ProtobufVersion::try_from(version)?;
        }
        if let Some(nest) = self.nest_enums {
            options.nest_enums = nest;
        }
        if let Some(start) = self.enum_order_start {
            options.enum_order_start = start;
        }
        if let Some(prefix) = self.type_in_enums {
            options.type_in_enums = prefix;
        }
        if let Some(docs) = self.include_message_docs {
            options.include_message_docs = docs;
        }
        if let Some(docs) = self.include_field_docs {
            options.include_field_docs = docs;
        }
        if self.split_by_namespace {
            options.split_by_namespace = true;
        }
        if self.allow_dtd {
            options.allow_dtd = true;
        }
        if self.package.is_some() {
            options.package = self.package.clone();
        }
        if self.filename.is_some() {
            options.filename = self.filename.clone();
        }

        // Flag mappings go ahead of those from the config file
        let mut type_mappings = indexmap_from_args(&self.type_mappings)?;
        for (k, v) in options.type_mappings.drain(..) {
            type_mappings.entry(k).or_insert(v);
        }
        options.type_mappings = type_mappings;

        let mut name_mappings = indexmap_from_args(&self.name_mappings)?;
        for (k, v) in options.name_mappings.drain(..) {
            name_mappings.entry(k).or_insert(v);
        }
        options.name_mappings = name_mappings;

        Ok(options)
    }
}

#[cfg(feature = "cli")]
fn indexmap_from_args(args: &[String]) -> xsd2proto::Result<indexmap::IndexMap<String, String>> {
    let mut map = indexmap::IndexMap::new();
    for arg in args {
        let (pattern, replacement) = parse_mapping(arg)?;
        map.insert(pattern, replacement);
    }
    Ok(map)
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn run(cli: &Cli) -> xsd2proto::Result<()> {
    let options = cli.options()?;
    let translation = Translator::new(options).translate_file(&cli.input)?;

    if let Some(path) = &cli.dump_registry {
        fs::write(path, translation.registry_json()?)?;
    }

    for path in translation.write_to(&cli.output)? {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
