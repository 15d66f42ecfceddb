//! Command handlers
//!
//! Each handler is a [`MatchVisitor`] living in its own module. [`apply`]
//! runs the handler for a [`Verb`] over an already compiled pattern and
//! returns the resulting tree.
//!
//! Read, list and table return a new sequence and leave the input alone.
//! Delete, insert and replace return the modified input.

use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::matcher::{search_path, MatchVisitor};
use crate::path::YamlPath;
use crate::planner::{Insert, Replace};
use crate::tree::{child_location, describe, is_scalar, type_name, untag, Step, Trail};

/// What to do with the matches of a pattern.
#[derive(Clone, Debug, PartialEq)]
pub enum Verb {
    Read,
    List,
    Delete,
    Insert(Value),
    Replace(Value),
    Table(Vec<String>),
}

impl Verb {
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Read => "read",
            Verb::List => "list",
            Verb::Delete => "delete",
            Verb::Insert(_) => "insert",
            Verb::Replace(_) => "replace",
            Verb::Table(_) => "table",
        }
    }
}

/// Run `verb` over `document` for every match of `path`.
///
/// `list_delimiter` joins the steps of the labels produced by [`Verb::List`].
pub fn apply(mut document: Value, verb: Verb, path: &YamlPath, list_delimiter: &str) -> Result<Value> {
    log::debug!("yaml {} --yamlpath '{}'", verb.name(), path);
    match verb {
        Verb::Read => {
            let mut visitor = read::Read::default();
            search_path(&mut document, path, &mut visitor)?;
            Ok(visitor.into_value())
        }
        Verb::List => {
            let mut visitor = list::List::new(list_delimiter);
            search_path(&mut document, path, &mut visitor)?;
            Ok(visitor.into_value())
        }
        Verb::Delete => {
            let mut visitor = delete::Delete::default();
            search_path(&mut document, path, &mut visitor)?;
            Ok(document)
        }
        Verb::Insert(content) => {
            let mut visitor = Insert::new(content);
            search_path(&mut document, path, &mut visitor)?;
            Ok(document)
        }
        Verb::Replace(content) => {
            let mut visitor = Replace::new(content);
            search_path(&mut document, path, &mut visitor)?;
            Ok(document)
        }
        Verb::Table(columns) => {
            let mut visitor = table::Table::new(columns);
            search_path(&mut document, path, &mut visitor)?;
            Ok(visitor.into_value())
        }
    }
}

/// Split a comma-separated column list.
pub fn columns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read handler - collects a copy of every matched subtree
pub mod read {
    use super::*;

    #[derive(Debug, Default)]
    pub struct Read {
        matches: Vec<Value>,
    }

    impl Read {
        pub fn into_value(self) -> Value {
            Value::Sequence(self.matches)
        }
    }

    impl MatchVisitor for Read {
        fn on_end_to_end_match(
            &mut self,
            _path: &YamlPath,
            _key: &Step,
            value: &Value,
            _trail: &[Step],
        ) -> Result<bool> {
            self.matches.push(value.clone());
            Ok(true)
        }

        fn at_end_of_input(&mut self, root: &mut Value, path: &YamlPath) -> Result<()> {
            if path.is_root() {
                self.matches.push(root.clone());
            }
            Ok(())
        }
    }
}

/// List handler - collects the parent path of every match as a label
pub mod list {
    use super::*;

    #[derive(Debug)]
    pub struct List {
        delimiter: String,
        labels: Vec<Value>,
    }

    impl List {
        pub fn new(delimiter: &str) -> Self {
            Self {
                delimiter: delimiter.to_string(),
                labels: Vec::new(),
            }
        }

        pub fn into_value(self) -> Value {
            Value::Sequence(self.labels)
        }
    }

    impl MatchVisitor for List {
        fn on_end_to_end_match(
            &mut self,
            _path: &YamlPath,
            _key: &Step,
            _value: &Value,
            trail: &[Step],
        ) -> Result<bool> {
            self.labels
                .push(Value::String(describe(trail, &self.delimiter)));
            Ok(true)
        }

        fn at_end_of_input(&mut self, _root: &mut Value, path: &YamlPath) -> Result<()> {
            if path.is_root() {
                self.labels.push(Value::String(crate::path::ROOT.to_string()));
            }
            Ok(())
        }
    }
}

/// Delete handler - removes every match once the walk is over
pub mod delete {
    use super::*;
    use crate::tree::remove_at;

    #[derive(Debug, Default)]
    pub struct Delete {
        locations: Vec<Trail>,
    }

    impl MatchVisitor for Delete {
        fn on_end_to_end_match(
            &mut self,
            _path: &YamlPath,
            key: &Step,
            _value: &Value,
            trail: &[Step],
        ) -> Result<bool> {
            self.locations.push(child_location(trail, key));
            Ok(true)
        }

        fn at_end_of_input(&mut self, root: &mut Value, path: &YamlPath) -> Result<()> {
            if path.is_root() {
                *root = Value::Null;
                return Ok(());
            }
            // last match first, so earlier sequence indices stay valid
            let mut removed = 0;
            for location in self.locations.iter().rev() {
                if remove_at(root, location).is_some() {
                    removed += 1;
                }
            }
            log::debug!("Deleted {} node(s) matching '{}'", removed, path);
            Ok(())
        }
    }
}

/// Table handler - projects mappings onto a fixed list of columns
pub mod table {
    use super::*;
    use serde_yaml::Mapping;

    #[derive(Debug)]
    pub struct Table {
        columns: Vec<String>,
        rows: Vec<Value>,
    }

    impl Table {
        pub fn new(columns: Vec<String>) -> Self {
            Self {
                columns,
                rows: Vec::new(),
            }
        }

        pub fn into_value(self) -> Value {
            Value::Sequence(self.rows)
        }

        fn add_rows(&mut self, value: &Value, location: &str) -> Result<()> {
            match untag(value) {
                Value::Mapping(map) => {
                    let row = self.row(map, location)?;
                    self.rows.push(row);
                }
                Value::Sequence(items) => {
                    for (idx, item) in items.iter().enumerate() {
                        let Value::Mapping(map) = untag(item) else {
                            return Err(Error::MatchSemantic {
                                message: format!(
                                    "table row '{}[{}]' is a {}, not a Mapping",
                                    location,
                                    idx,
                                    type_name(item)
                                ),
                            });
                        };
                        let row = self.row(map, location)?;
                        self.rows.push(row);
                    }
                }
                other => {
                    return Err(Error::MatchSemantic {
                        message: format!(
                            "table source '{}' is a {}, not a Mapping or Sequence of Mappings",
                            location,
                            type_name(other)
                        ),
                    })
                }
            }
            Ok(())
        }

        fn row(&self, map: &Mapping, location: &str) -> Result<Value> {
            let mut row = Mapping::new();
            for column in &self.columns {
                let value = map.get(column.as_str()).ok_or_else(|| Error::MatchSemantic {
                    message: format!("column '{}' is missing at '{}'", column, location),
                })?;
                if !is_scalar(value) {
                    return Err(Error::MatchSemantic {
                        message: format!(
                            "column '{}' at '{}' is a {}, not a scalar",
                            column,
                            location,
                            type_name(value)
                        ),
                    });
                }
                row.insert(Value::String(column.clone()), value.clone());
            }
            Ok(Value::Mapping(row))
        }
    }

    impl MatchVisitor for Table {
        fn on_end_to_end_match(
            &mut self,
            path: &YamlPath,
            key: &Step,
            value: &Value,
            trail: &[Step],
        ) -> Result<bool> {
            let location = describe(&child_location(trail, key), path.delimiter());
            self.add_rows(value, &location)?;
            Ok(true)
        }

        fn at_end_of_input(&mut self, root: &mut Value, path: &YamlPath) -> Result<()> {
            if path.is_root() {
                self.add_rows(root, crate::path::ROOT)?;
            }
            Ok(())
        }
    }
}
