//! # Forms Subcommand
//!
//! Lists the forms declared in a schema document.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;
use formwork_schema::{ExtraFields, FieldKind, SchemaRegistry};

/// Arguments for the forms subcommand.
#[derive(Args, Debug)]
pub struct FormsArgs {
    /// Schema document declaring the forms (YAML or JSON).
    #[arg(long, short)]
    pub schema: PathBuf,
}

/// Run the forms subcommand.
///
/// # Errors
///
/// Fails if the schema document cannot be loaded.
pub fn run(args: &FormsArgs) -> anyhow::Result<()> {
    let registry = SchemaRegistry::load(&args.schema)?;
    print!("{}", describe(&registry));
    Ok(())
}

/// One block per form: its name and unknown-field policy, then one line
/// per field with its type, flags and default.
pub fn describe(registry: &SchemaRegistry) -> String {
    let mut out = String::new();
    for schema in registry.schemas() {
        let extra = match &schema.options().extra {
            ExtraFields::Reject => "reject".to_string(),
            ExtraFields::Allow => "allow".to_string(),
            ExtraFields::Only(names) => format!("only {}", names.iter().cloned().collect::<Vec<_>>().join(",")),
        };
        let _ = writeln!(out, "{} (extra: {extra})", schema.name());
        for field in schema.fields() {
            let _ = write!(out, "  {}: {}", field.name(), field.kind().describe());
            if field.is_required() {
                out.push_str(" required");
            }
            if field.has_default() && !matches!(field.kind(), FieldKind::Form(_)) {
                let _ = write!(out, " = {}", field.resolve_default().to_value());
            }
            out.push('\n');
        }
    }
    out
}
