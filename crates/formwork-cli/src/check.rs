//! # Check Subcommand
//!
//! Decodes a JSON or YAML document with a form declared in a schema
//! document and prints the encoded result as JSON.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, ValueEnum};
use formwork_core::ValidationError;
use formwork_schema::{DecodeOptions, EncodeOptions, ExtraFields, Form, Schema, SchemaRegistry};
use serde_json::{Map, Value};

/// Unknown-field policy selectable on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtraPolicy {
    /// Unknown fields are errors.
    Reject,
    /// Unknown fields are accepted and dropped from the output.
    Allow,
}

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema document declaring the forms (YAML or JSON).
    #[arg(long, short)]
    pub schema: PathBuf,

    /// Name of the form to decode with.
    #[arg(long, short)]
    pub form: String,

    /// Document to check (YAML or JSON).
    pub document: PathBuf,

    /// Skip business-rule checks; structural checks still apply.
    #[arg(long)]
    pub no_validate: bool,

    /// Unknown-field policy, overriding the form's own option.
    #[arg(long, value_enum)]
    pub extra: Option<ExtraPolicy>,

    /// Accept only these unknown fields (comma separated).
    #[arg(long, value_delimiter = ',', conflicts_with = "extra")]
    pub allow_extra: Vec<String>,

    /// Emit null-valued fields instead of omitting them.
    #[arg(long)]
    pub include_none: bool,
}

impl CheckArgs {
    /// Decode options selected by the flags.
    pub fn decode_options(&self) -> DecodeOptions {
        let options = DecodeOptions::default().with_validation(!self.no_validate);
        if !self.allow_extra.is_empty() {
            return options.with_extra(ExtraFields::only(self.allow_extra.iter().cloned()));
        }
        match self.extra {
            Some(ExtraPolicy::Reject) => options.with_extra(ExtraFields::Reject),
            Some(ExtraPolicy::Allow) => options.with_extra(ExtraFields::Allow),
            None => options,
        }
    }

    /// Encode options selected by the flags.
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions::default().with_include_none(self.include_none)
    }
}

/// Run the check subcommand.
///
/// # Errors
///
/// Fails if either document cannot be loaded, the form is not declared,
/// or the document does not decode.
pub fn run(args: &CheckArgs) -> anyhow::Result<()> {
    let registry = SchemaRegistry::load(&args.schema)?;
    let Some(schema) = registry.get(&args.form) else {
        bail!(
            "form '{}' is not declared in {} (available: {})",
            args.form,
            args.schema.display(),
            registry.names().join(", ")
        );
    };
    let data = load_document(&args.document)?;

    tracing::info!(form = %args.form, document = %args.document.display(), "checking document");
    let encoded = check_document(schema, &data, &args.decode_options(), &args.encode_options())?;
    println!("{}", serde_json::to_string_pretty(&Value::Object(encoded))?);
    Ok(())
}

/// Decode `data` with `schema` and encode the result.
///
/// # Errors
///
/// Returns the aggregated [`ValidationError`] listing every failing field.
pub fn check_document(
    schema: &'static Schema,
    data: &Map<String, Value>,
    decode: &DecodeOptions,
    encode: &EncodeOptions,
) -> Result<Map<String, Value>, ValidationError> {
    Form::decode(schema, data, decode)?.encode_with(encode)
}

/// Read a data document; `.yaml`/`.yml` is read as YAML, anything else as
/// JSON. The top level must be a mapping.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, or is not a mapping.
pub fn load_document(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read document '{}'", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    parse_document(&content, matches!(ext, "yaml" | "yml"))
        .with_context(|| format!("cannot load document '{}'", path.display()))
}

fn parse_document(content: &str, yaml: bool) -> anyhow::Result<Map<String, Value>> {
    let value: Value = if yaml {
        serde_yaml::from_str(content).context("invalid YAML")?
    } else {
        serde_json::from_str(content).context("invalid JSON")?
    };
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("top level must be a mapping, found {}", kind_name(&other)),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use formwork_core::Reason;
    use serde_json::json;

    const SCHEMA: &str = r#"
forms:
  - name: Item
    fields:
      - { name: index, type: int, required: true, min: 0 }
      - { name: name, type: str, required: true }
      - { name: note, type: str }
"#;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CheckArgs,
    }

    fn args(extra: &[&str]) -> CheckArgs {
        let mut argv = vec!["check", "--schema", "forms.yaml", "--form", "Item", "doc.json"];
        argv.extend_from_slice(extra);
        TestCli::parse_from(argv).args
    }

    fn item() -> &'static Schema {
        let registry = SchemaRegistry::from_yaml_str(SCHEMA).unwrap();
        registry.get("Item").unwrap()
    }

    #[test]
    fn test_flags_select_options() {
        let defaults = args(&[]);
        assert_eq!(defaults.decode_options(), DecodeOptions::default());
        assert!(!defaults.encode_options().include_none);

        let relaxed = args(&["--no-validate", "--extra", "allow", "--include-none"]);
        assert!(!relaxed.decode_options().validate);
        assert_eq!(relaxed.decode_options().extra, Some(ExtraFields::Allow));
        assert!(relaxed.encode_options().include_none);

        let listed = args(&["--allow-extra", "a,b"]);
        assert_eq!(listed.decode_options().extra, Some(ExtraFields::only(["a", "b"])));
    }

    #[test]
    fn test_check_document_encodes() {
        let data = parse_document(r#"{"index": "4", "name": "four"}"#, false).unwrap();
        let encoded = check_document(item(), &data, &DecodeOptions::default(), &EncodeOptions::default()).unwrap();
        assert_eq!(Value::Object(encoded), json!({"index": 4, "name": "four"}));

        let encoded = check_document(
            item(),
            &data,
            &DecodeOptions::default(),
            &EncodeOptions::default().with_include_none(true),
        )
        .unwrap();
        assert_eq!(Value::Object(encoded), json!({"index": 4, "name": "four", "note": null}));
    }

    #[test]
    fn test_check_document_lists_every_failure() {
        let data = parse_document("index: -1\nbogus: true\n", true).unwrap();
        let err = check_document(item(), &data, &DecodeOptions::default(), &EncodeOptions::default()).unwrap_err();
        assert_eq!(err.errors().fields(), vec!["index", "name", "bogus"]);
        assert_eq!(err.errors().reasons("bogus"), vec![&Reason::UnexpectedField]);
    }

    #[test]
    fn test_parse_document_requires_mapping() {
        let err = parse_document("[1, 2]", false).unwrap_err();
        assert!(err.to_string().contains("found array"));
        assert!(parse_document("{not json", false).is_err());
    }
}
