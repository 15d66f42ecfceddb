//! Execution context for batch runs
//!
//! The context carries everything that outlives a single command:
//!
//! - **Loop scope**: `index`, `index+1`, `key` and `value` of the innermost
//!   running `foreach`. The loop runner saves and restores it around each
//!   nested loop.
//! - **Global scope**: values set with `setProperty`.
//! - **Property sets**: files loaded with `property <ns>=<file>`, addressed as
//!   `${ns::key}`.
//! - **Environment**: the process environment, read only.
//! - **Store**: named documents saved with `saveAs !name`.
//!
//! It also resolves document references (`@file`, `@?file`, `!name`,
//! `!?name`, or inline text) through [`Context::load`] and [`Context::save`].

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;
use serde_yaml::Value;

use crate::codec::{self, YamlBackend};
use crate::error::{Error, Result};
use crate::macros::Scope;
use crate::tree::scalar_text;

/// Default separator between path pattern segments
pub const DEFAULT_DELIMITER: &str = ".";

/// Default separator between the steps of a `list` label
pub const DEFAULT_LIST_DELIMITER: &str = ",";

/// Macro namespace for loop variables, globals and then the environment
pub const BATCH_NAMESPACE: &str = "BATCH";

/// Macro namespace for the environment only
pub const ENV_NAMESPACE: &str = "ENV";

/// Variables of the innermost loop.
pub type LoopScope = IndexMap<String, String>;

/// Settings shared by every command of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchOptions {
    pub delimiter: String,
    pub list_delimiter: String,
    pub backend: YamlBackend,
    /// Directory that relative file references resolve against
    pub base_dir: PathBuf,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            list_delimiter: DEFAULT_LIST_DELIMITER.to_string(),
            backend: YamlBackend::default(),
            base_dir: PathBuf::new(),
        }
    }
}

/// Where a document comes from or goes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// `@path`, or `@?path` when a missing file is allowed
    File { path: String, optional: bool },
    /// `!name`, or `!?name` when a missing value is allowed
    Stored { name: String, optional: bool },
    /// Anything else
    Inline(String),
}

impl Reference {
    pub fn parse(text: &str) -> Self {
        if let Some(path) = text.strip_prefix("@?") {
            Reference::File {
                path: path.to_string(),
                optional: true,
            }
        } else if let Some(path) = text.strip_prefix('@') {
            Reference::File {
                path: path.to_string(),
                optional: false,
            }
        } else if let Some(name) = text.strip_prefix("!?") {
            Reference::Stored {
                name: name.to_string(),
                optional: true,
            }
        } else if let Some(name) = text.strip_prefix('!') {
            Reference::Stored {
                name: name.to_string(),
                optional: false,
            }
        } else {
            Reference::Inline(text.to_string())
        }
    }
}

#[derive(Debug, Default)]
pub struct Context {
    pub options: BatchOptions,
    loop_scope: LoopScope,
    globals: IndexMap<String, String>,
    namespaces: IndexMap<String, IndexMap<String, String>>,
    store: IndexMap<String, Value>,
}

impl Context {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    // Loop scope

    /// Set the loop variables for one iteration.
    pub fn enter_iteration(&mut self, index: usize, key: &str, value: &str) {
        self.loop_scope = LoopScope::from([
            ("index".to_string(), index.to_string()),
            ("index+1".to_string(), (index + 1).to_string()),
            ("key".to_string(), key.to_string()),
            ("value".to_string(), value.to_string()),
        ]);
    }

    /// Swap in a new loop scope, returning the one it replaces.
    pub fn replace_loop_scope(&mut self, scope: LoopScope) -> LoopScope {
        std::mem::replace(&mut self.loop_scope, scope)
    }

    pub fn loop_var(&self, name: &str) -> Option<&str> {
        self.loop_scope.get(name).map(String::as_str)
    }

    // Global scope and property sets

    pub fn set_global(&mut self, key: &str, value: &str) {
        self.globals.insert(key.to_string(), value.to_string());
    }

    pub fn global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(String::as_str)
    }

    /// Register a property set under `namespace`. Nested mappings are
    /// flattened into dotted keys.
    pub fn load_properties(&mut self, namespace: &str, properties: &Value) -> Result<()> {
        let Value::Mapping(_) = properties else {
            return Err(Error::Resource {
                reference: namespace.to_string(),
                message: "property file must contain key/value pairs".to_string(),
            });
        };
        let mut flat = IndexMap::new();
        flatten("", properties, &mut flat)?;
        debug!("Loaded {} properties into namespace '{}'", flat.len(), namespace);
        self.namespaces.insert(namespace.to_string(), flat);
        Ok(())
    }

    // Store

    pub fn store_value(&mut self, name: &str, value: Value) {
        self.store.insert(name.to_string(), value);
    }

    pub fn stored(&self, name: &str) -> Option<&Value> {
        self.store.get(name)
    }

    // References

    /// Resolve a file reference against the base directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.options.base_dir.join(path)
        }
    }

    /// Load the document a reference points to.
    pub fn load(&self, reference: &str) -> Result<Value> {
        match Reference::parse(reference) {
            Reference::File { path, optional } => {
                let resolved = self.resolve_path(&path);
                if optional && !resolved.exists() {
                    debug!("Optional file '{}' not found", resolved.display());
                    return Ok(Value::Null);
                }
                codec::read_file(&resolved, self.options.backend)
            }
            Reference::Stored { name, optional } => match self.stored(&name) {
                Some(value) => Ok(value.clone()),
                None if optional => Ok(Value::Null),
                None => Err(Error::Resource {
                    reference: format!("!{}", name),
                    message: "no value stored under this name".to_string(),
                }),
            },
            Reference::Inline(text) => Ok(codec::parse_inline(&text, self.options.backend)),
        }
    }

    /// Write a document to a file reference or keep it in the store.
    pub fn save(&mut self, reference: &str, value: &Value) -> Result<()> {
        match Reference::parse(reference) {
            Reference::File { path, .. } => {
                let resolved = self.resolve_path(&path);
                debug!("Saving document to '{}'", resolved.display());
                codec::write_file(&resolved, value, self.options.backend)
            }
            Reference::Stored { name, .. } => {
                self.store_value(&name, value.clone());
                Ok(())
            }
            Reference::Inline(text) => Err(Error::Resource {
                reference: text,
                message: "expected an @file or !name reference".to_string(),
            }),
        }
    }
}

impl Scope for Context {
    fn lookup(&self, namespace: &str, key: &str) -> Option<String> {
        match namespace {
            BATCH_NAMESPACE => self
                .loop_var(key)
                .or_else(|| self.global(key))
                .map(str::to_string)
                .or_else(|| std::env::var(key).ok()),
            ENV_NAMESPACE => std::env::var(key).ok(),
            other => self.namespaces.get(other)?.get(key).cloned(),
        }
    }
}

fn flatten(prefix: &str, value: &Value, out: &mut IndexMap<String, String>) -> Result<()> {
    match value {
        Value::Mapping(map) => {
            for (key, item) in map {
                let Some(key) = scalar_text(key) else { continue };
                let name = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&name, item, out)?;
            }
        }
        other => {
            let text = match scalar_text(other) {
                Some(text) => text,
                None => serde_json::to_string(other)?,
            };
            out.insert(prefix.to_string(), text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_reference_parse() {
        assert_eq!(
            Reference::parse("@?a.yaml"),
            Reference::File {
                path: "a.yaml".to_string(),
                optional: true
            }
        );
        assert_eq!(
            Reference::parse("!saved"),
            Reference::Stored {
                name: "saved".to_string(),
                optional: false
            }
        );
        assert_eq!(Reference::parse("a: 1"), Reference::Inline("a: 1".to_string()));
    }

    #[test]
    fn test_loop_scope_replace_restores() {
        let mut ctx = Context::default();
        ctx.enter_iteration(0, "outer", "x");
        let saved = ctx.replace_loop_scope(LoopScope::new());
        ctx.enter_iteration(3, "inner", "y");
        assert_eq!(ctx.loop_var("index+1"), Some("4"));
        ctx.replace_loop_scope(saved);
        assert_eq!(ctx.loop_var("key"), Some("outer"));
        assert_eq!(ctx.loop_var("index"), Some("0"));
    }

    #[test]
    #[serial]
    fn test_batch_namespace_lookup_order() {
        env::set_var("YAMLBATCH_TEST_VAR", "from-env");
        let mut ctx = Context::default();
        assert_eq!(
            ctx.lookup(BATCH_NAMESPACE, "YAMLBATCH_TEST_VAR"),
            Some("from-env".to_string())
        );
        ctx.set_global("YAMLBATCH_TEST_VAR", "from-global");
        assert_eq!(
            ctx.lookup(BATCH_NAMESPACE, "YAMLBATCH_TEST_VAR"),
            Some("from-global".to_string())
        );
        assert_eq!(
            ctx.lookup(ENV_NAMESPACE, "YAMLBATCH_TEST_VAR"),
            Some("from-env".to_string())
        );
        env::remove_var("YAMLBATCH_TEST_VAR");
    }

    #[test]
    fn test_loop_scope_shadows_globals() {
        let mut ctx = Context::default();
        ctx.set_global("key", "global");
        ctx.enter_iteration(1, "loop", "v");
        assert_eq!(ctx.lookup(BATCH_NAMESPACE, "key"), Some("loop".to_string()));
    }

    #[test]
    fn test_property_namespace_flattens() {
        let mut ctx = Context::default();
        let props: Value = serde_yaml::from_str("host: db\nlimits:\n  max: 5").unwrap();
        ctx.load_properties("app", &props).unwrap();
        assert_eq!(ctx.lookup("app", "host"), Some("db".to_string()));
        assert_eq!(ctx.lookup("app", "limits.max"), Some("5".to_string()));
        assert_eq!(ctx.lookup("other", "host"), None);
        assert!(ctx.load_properties("bad", &Value::Null).is_err());
    }

    #[test]
    fn test_property_value_without_json_form_fails() {
        let mut ctx = Context::default();
        let mut odd = serde_yaml::Mapping::new();
        odd.insert(serde_yaml::from_str("[1, 2]").unwrap(), Value::from("x"));
        let mut props = serde_yaml::Mapping::new();
        props.insert(Value::from("hosts"), Value::Sequence(vec![Value::Mapping(odd)]));

        let err = ctx.load_properties("app", &Value::Mapping(props)).unwrap_err();
        assert!(matches!(err, Error::Json(_)), "got {err:?}");
        assert_eq!(ctx.lookup("app", "hosts"), None);
    }

    #[test]
    fn test_load_and_save_references() {
        let temp = TempDir::new().unwrap();
        let mut ctx = Context::new(BatchOptions {
            base_dir: temp.path().to_path_buf(),
            ..Default::default()
        });
        let value: Value = serde_yaml::from_str("a: 1").unwrap();

        ctx.save("@out.yaml", &value).unwrap();
        assert_eq!(ctx.load("@out.yaml").unwrap(), value);

        ctx.save("!kept", &value).unwrap();
        assert_eq!(ctx.load("!kept").unwrap(), value);

        assert_eq!(ctx.load("@?missing.yaml").unwrap(), Value::Null);
        assert_eq!(ctx.load("!?missing").unwrap(), Value::Null);
        assert!(matches!(ctx.load("@missing.yaml"), Err(Error::Resource { .. })));
        assert!(matches!(ctx.load("!missing"), Err(Error::Resource { .. })));
        assert!(ctx.save("inline", &value).is_err());
    }
}
