//! `${NAMESPACE::KEY}` macro expansion
//!
//! A macro names a namespace and a key. `${?NAMESPACE::KEY}` is the optional
//! form: when nothing resolves it expands to the empty string instead of
//! failing. How namespaces resolve is up to the [`Scope`] being used; the batch
//! interpreter's [`Context`](crate::context::Context) is the main one.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

static MACRO: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\$\{(\?)?([A-Za-z0-9_.\-]+)::([^}]+)\}"));

/// Something macros can be resolved against.
pub trait Scope {
    fn lookup(&self, namespace: &str, key: &str) -> Option<String>;
}

/// Expand every macro in `text`.
pub fn expand<S: Scope + ?Sized>(text: &str, scope: &S) -> Result<String> {
    if !text.contains("${") {
        return Ok(text.to_string());
    }
    let pattern = MACRO.as_ref().map_err(|err| Error::Regex(err.clone()))?;
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let Some(token) = caps.get(0) else { continue };
        out.push_str(&text[last..token.start()]);
        out.push_str(&resolve(&caps, scope)?);
        last = token.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn resolve<S: Scope + ?Sized>(caps: &Captures<'_>, scope: &S) -> Result<String> {
    let optional = caps.get(1).is_some();
    let namespace = &caps[2];
    let key = caps[3].trim();
    match scope.lookup(namespace, key) {
        Some(value) => Ok(value),
        None if optional => Ok(String::new()),
        None => Err(Error::UnresolvedMacro {
            token: caps[0].to_string(),
        }),
    }
}

/// Rebuild `value` with every mapping key, string scalar and tag expanded.
pub fn expand_tree<S: Scope + ?Sized>(value: &Value, scope: &S) -> Result<Value> {
    Ok(match value {
        Value::String(text) => Value::String(expand(text, scope)?),
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| expand_tree(item, scope))
                .collect::<Result<_>>()?,
        ),
        Value::Mapping(map) => {
            let mut rebuilt = Mapping::with_capacity(map.len());
            for (key, item) in map {
                rebuilt.insert(expand_tree(key, scope)?, expand_tree(item, scope)?);
            }
            Value::Mapping(rebuilt)
        }
        Value::Tagged(tagged) => {
            let tag = expand(&tagged.tag.to_string(), scope)?;
            let value = expand_tree(&tagged.value, scope)?;
            // a tag that expands to nothing is dropped
            if tag.trim_start_matches('!').is_empty() {
                value
            } else {
                Value::Tagged(Box::new(TaggedValue {
                    tag: Tag::new(tag),
                    value,
                }))
            }
        }
        scalar => scalar.clone(),
    })
}
