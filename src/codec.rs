//! Document parsing and serialization
//!
//! Everything in this crate works on [`serde_yaml::Value`]. This module turns
//! text into that tree and back, for each supported [`Format`]. YAML itself can
//! be handled by two libraries ([`YamlBackend`]); the batch interpreter can
//! switch between them mid-script.
//!
//! Inline content given on a command line is tried in a fixed order by
//! [`parse_inline`]: JSON, then `key=value` properties, then YAML, and finally
//! a plain string scalar.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::warn;
use serde_yaml::{Mapping, Value};
use yaml_rust2::{Yaml, YamlEmitter, YamlLoader};

use crate::error::{Error, Result};
use crate::tree::{scalar_text, type_name};

/// The library used to read and write YAML text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum YamlBackend {
    #[default]
    SerdeYaml,
    YamlRust2,
}

impl FromStr for YamlBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serde_yaml" | "serde-yaml" | "serde" => Ok(YamlBackend::SerdeYaml),
            "yaml-rust2" | "yaml_rust2" | "yaml-rust" => Ok(YamlBackend::YamlRust2),
            other => Err(format!(
                "unknown YAML library '{}' (expected serde_yaml or yaml-rust2)",
                other
            )),
        }
    }
}

impl fmt::Display for YamlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YamlBackend::SerdeYaml => write!(f, "serde_yaml"),
            YamlBackend::YamlRust2 => write!(f, "yaml-rust2"),
        }
    }
}

/// File formats a document can be read from or written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Properties,
    Toml,
}

impl Format {
    /// Pick a format from a file extension; anything unknown is YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Format::Json,
            Some("properties") | Some("props") => Format::Properties,
            Some("toml") => Format::Toml,
            _ => Format::Yaml,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Format::Yaml => "YAML",
            Format::Json => "JSON",
            Format::Properties => "Properties",
            Format::Toml => "TOML",
        }
    }
}

/// Parse text in the given format.
pub fn parse(text: &str, format: Format, backend: YamlBackend) -> Result<Value> {
    match format {
        Format::Yaml => parse_yaml(text, backend),
        Format::Json => parse_json(text),
        Format::Properties => parse_properties(text),
        Format::Toml => parse_toml(text),
    }
}

/// Serialize a document in the given format. The result always ends with a
/// newline.
pub fn to_string(value: &Value, format: Format, backend: YamlBackend) -> Result<String> {
    let text = match format {
        Format::Yaml => yaml_to_string(value, backend)?,
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Properties => properties_to_string(value)?,
        Format::Toml => toml::to_string(value).map_err(|err| Error::Format {
            format: Format::Toml.name().to_string(),
            message: err.to_string(),
        })?,
    };
    Ok(ensure_trailing_newline(text))
}

/// Parse inline content: JSON, then properties, then YAML, then a raw string.
pub fn parse_inline(text: &str, backend: YamlBackend) -> Value {
    if let Ok(value) = parse_json(text) {
        return value;
    }
    if looks_like_properties(text) {
        if let Ok(value) = parse_properties(text) {
            return value;
        }
    }
    match parse_yaml(text, backend) {
        Ok(value) => value,
        Err(_) => Value::String(text.to_string()),
    }
}

/// Read and parse a file, choosing the format from its extension.
pub fn read_file<P: AsRef<Path>>(path: P, backend: YamlBackend) -> Result<Value> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|err| Error::Resource {
        reference: path.display().to_string(),
        message: err.to_string(),
    })?;
    parse(&text, Format::from_path(path), backend)
}

/// Serialize a document into a file, choosing the format from its extension.
pub fn write_file<P: AsRef<Path>>(path: P, value: &Value, backend: YamlBackend) -> Result<()> {
    let path = path.as_ref();
    let text = to_string(value, Format::from_path(path), backend)?;
    std::fs::write(path, text).map_err(|err| Error::Resource {
        reference: path.display().to_string(),
        message: err.to_string(),
    })
}

// YAML

fn parse_yaml(text: &str, backend: YamlBackend) -> Result<Value> {
    match backend {
        YamlBackend::SerdeYaml => Ok(serde_yaml::from_str(text)?),
        YamlBackend::YamlRust2 => {
            let mut docs = YamlLoader::load_from_str(text).map_err(|err| Error::Format {
                format: Format::Yaml.name().to_string(),
                message: err.to_string(),
            })?;
            if docs.len() > 1 {
                return Err(Error::Format {
                    format: Format::Yaml.name().to_string(),
                    message: format!("expected one document, found {}", docs.len()),
                });
            }
            Ok(docs.pop().map(from_yaml_rust).unwrap_or(Value::Null))
        }
    }
}

fn yaml_to_string(value: &Value, backend: YamlBackend) -> Result<String> {
    match backend {
        YamlBackend::SerdeYaml => Ok(serde_yaml::to_string(value)?),
        YamlBackend::YamlRust2 => {
            let yaml = to_yaml_rust(value);
            let mut out = String::new();
            YamlEmitter::new(&mut out)
                .dump(&yaml)
                .map_err(|err| Error::Format {
                    format: Format::Yaml.name().to_string(),
                    message: format!("{:?}", err),
                })?;
            // the emitter always opens with a document marker
            let body = out.strip_prefix("---\n").unwrap_or(&out).to_string();
            Ok(body)
        }
    }
}

fn from_yaml_rust(yaml: Yaml) -> Value {
    match yaml {
        Yaml::Real(text) => match text.parse::<f64>() {
            Ok(number) => Value::Number(number.into()),
            Err(_) => Value::String(text),
        },
        Yaml::Integer(number) => Value::Number(number.into()),
        Yaml::String(text) => Value::String(text),
        Yaml::Boolean(flag) => Value::Bool(flag),
        Yaml::Array(items) => Value::Sequence(items.into_iter().map(from_yaml_rust).collect()),
        Yaml::Hash(hash) => Value::Mapping(
            hash.into_iter()
                .map(|(key, value)| (from_yaml_rust(key), from_yaml_rust(value)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn to_yaml_rust(value: &Value) -> Yaml {
    match value {
        Value::Null => Yaml::Null,
        Value::Bool(flag) => Yaml::Boolean(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => Yaml::Integer(int),
            None => Yaml::Real(number.to_string()),
        },
        Value::String(text) => Yaml::String(text.clone()),
        Value::Sequence(items) => Yaml::Array(items.iter().map(to_yaml_rust).collect()),
        Value::Mapping(map) => {
            let mut hash = yaml_rust2::yaml::Hash::new();
            for (key, value) in map {
                hash.insert(to_yaml_rust(key), to_yaml_rust(value));
            }
            Yaml::Hash(hash)
        }
        Value::Tagged(tagged) => {
            warn!("yaml-rust2 cannot emit tags; dropping tag {}", tagged.tag);
            to_yaml_rust(&tagged.value)
        }
    }
}

// JSON / TOML

fn parse_json(text: &str) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Ok(serde_yaml::to_value(json)?)
}

fn parse_toml(text: &str) -> Result<Value> {
    let parsed: toml::Value = toml::from_str(text).map_err(|err| Error::Format {
        format: Format::Toml.name().to_string(),
        message: err.to_string(),
    })?;
    Ok(serde_yaml::to_value(parsed)?)
}

// Properties

/// Every meaningful line has a `key=value` shape.
fn looks_like_properties(text: &str) -> bool {
    let mut saw_entry = false;
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        match line.split_once('=') {
            Some((key, _)) if !key.trim().is_empty() && !key.contains(':') => saw_entry = true,
            _ => return false,
        }
    }
    saw_entry
}

/// Parse a properties file. Keys are kept flat; `[section]` headers, when
/// present, become nested mappings.
fn parse_properties(text: &str) -> Result<Value> {
    let ini = ini::Ini::load_from_str(text).map_err(|err| Error::Format {
        format: Format::Properties.name().to_string(),
        message: err.to_string(),
    })?;

    let mut root = Mapping::new();
    for (section, properties) in ini.iter() {
        let mut entries = Mapping::new();
        for (key, value) in properties.iter() {
            entries.insert(
                Value::String(key.to_string()),
                Value::String(value.to_string()),
            );
        }
        match section {
            None => root.extend(entries),
            Some(name) => {
                root.insert(Value::String(name.to_string()), Value::Mapping(entries));
            }
        }
    }
    Ok(Value::Mapping(root))
}

fn properties_to_string(value: &Value) -> Result<String> {
    let Value::Mapping(map) = value else {
        return Err(Error::Format {
            format: Format::Properties.name().to_string(),
            message: format!("expected a Mapping, found {}", type_name(value)),
        });
    };
    let mut out = String::new();
    for (key, value) in map {
        match (scalar_text(key), scalar_text(value)) {
            (Some(key), Some(value)) => out.push_str(&format!("{}={}\n", key, value)),
            _ => {
                return Err(Error::Format {
                    format: Format::Properties.name().to_string(),
                    message: "only scalar keys and values can be written".to_string(),
                })
            }
        }
    }
    Ok(out)
}

fn ensure_trailing_newline(mut content: String) -> String {
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("a.json"), Format::Json);
        assert_eq!(Format::from_path("a.JSON"), Format::Json);
        assert_eq!(Format::from_path("a.properties"), Format::Properties);
        assert_eq!(Format::from_path("a.toml"), Format::Toml);
        assert_eq!(Format::from_path("a.yml"), Format::Yaml);
        assert_eq!(Format::from_path("noext"), Format::Yaml);
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("serde_yaml".parse::<YamlBackend>(), Ok(YamlBackend::SerdeYaml));
        assert_eq!("yaml-rust2".parse::<YamlBackend>(), Ok(YamlBackend::YamlRust2));
        assert!("snakeyaml".parse::<YamlBackend>().is_err());
    }

    #[test]
    fn test_json_preserves_key_order() {
        let value = parse(r#"{"z": 1, "a": 2}"#, Format::Json, YamlBackend::default()).unwrap();
        let keys: Vec<_> = value
            .as_mapping()
            .unwrap()
            .keys()
            .map(|k| k.as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_parse_properties() {
        let value = parse(
            "# comment\nname=demo\nversion = 1.0\n",
            Format::Properties,
            YamlBackend::default(),
        )
        .unwrap();
        assert_eq!(value["name"], Value::String("demo".into()));
        assert_eq!(value["version"], Value::String("1.0".into()));
    }

    #[test]
    fn test_parse_inline_format_order() {
        let backend = YamlBackend::default();
        assert_eq!(parse_inline("[1, 2]", backend), serde_yaml::from_str::<Value>("[1, 2]").unwrap());
        assert_eq!(parse_inline("k=v", backend)["k"], Value::String("v".into()));
        assert_eq!(parse_inline("a: 1", backend)["a"], Value::Number(1.into()));
        assert_eq!(parse_inline("plain words", backend), Value::String("plain words".into()));
        assert_eq!(parse_inline("a: b: c", backend), Value::String("a: b: c".into()));
    }

    #[test]
    fn test_yaml_rust2_round_trip() {
        let text = "name: demo\nitems:\n  - 1\n  - 2.5\n  - true\n";
        let value = parse(text, Format::Yaml, YamlBackend::YamlRust2).unwrap();
        let expected: Value = serde_yaml::from_str(text).unwrap();
        assert_eq!(value, expected);

        let emitted = to_string(&value, Format::Yaml, YamlBackend::YamlRust2).unwrap();
        assert!(!emitted.starts_with("---"));
        let reparsed: Value = serde_yaml::from_str(&emitted).unwrap();
        assert_eq!(reparsed, expected);
    }

    #[test]
    fn test_multiple_documents_rejected() {
        assert!(parse("a: 1\n---\nb: 2\n", Format::Yaml, YamlBackend::SerdeYaml).is_err());
        assert!(parse("a: 1\n---\nb: 2\n", Format::Yaml, YamlBackend::YamlRust2).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let value = parse("[server]\nport = 8080\n", Format::Toml, YamlBackend::default()).unwrap();
        assert_eq!(value["server"]["port"], Value::Number(8080.into()));
        let text = to_string(&value, Format::Toml, YamlBackend::default()).unwrap();
        assert!(text.contains("port = 8080"));
    }

    #[test]
    fn test_properties_output_requires_scalars() {
        let value: Value = serde_yaml::from_str("a: 1\nb: x").unwrap();
        assert_eq!(
            to_string(&value, Format::Properties, YamlBackend::default()).unwrap(),
            "a=1\nb=x\n"
        );
        let nested: Value = serde_yaml::from_str("a: {b: 1}").unwrap();
        assert!(to_string(&nested, Format::Properties, YamlBackend::default()).is_err());
    }

    #[test]
    fn test_read_and_write_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.json");
        let value: Value = serde_yaml::from_str("a: [1, 2]").unwrap();
        write_file(&path, &value, YamlBackend::default()).unwrap();
        assert_eq!(read_file(&path, YamlBackend::default()).unwrap(), value);
    }

    #[test]
    fn test_read_missing_file_is_resource_error() {
        let err = read_file("/nonexistent/file.yaml", YamlBackend::default()).unwrap_err();
        assert!(matches!(err, Error::Resource { .. }));
    }
}
