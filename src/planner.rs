//! Insert and replace planning
//!
//! [`Insert`] and [`Replace`] are [`MatchVisitor`]s. During the walk they only
//! record what they saw; every change is applied in `at_end_of_input`.
//!
//! ## Insert
//!
//! - **Root pattern** (`/`): an empty document becomes the content; mappings
//!   merge, sequences concatenate, a sequence absorbs any other value.
//! - **Existing targets**: content is merged into each end-to-end match. A
//!   non-blank scalar is never overwritten.
//! - **mkdir -p**: with no existing target, missing structure is synthesized
//!   from the deepest points the pattern reached, one single-entry mapping per
//!   literal segment and one sequence per `[n]` segment.
//! - **Index extension**: `[n]` past the end of a sequence pads it with `null`
//!   placeholders and appends the content at `n`.
//!
//! ## Replace
//!
//! Replace wraps an [`Insert`] and reuses its target bookkeeping, but ignores
//! match failures and substitutes instead of merging.

use log::{debug, warn};
use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::matcher::{MatchFail, MatchVisitor};
use crate::path::{Cursor, Segment, YamlPath};
use crate::tree::{
    child_location, describe, get_at_mut, is_blank, placeholder, single_entry, type_name,
    untag, untag_mut, Step, Trail,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Insert,
    Replace,
}

/// A point where the pattern could not continue.
#[derive(Debug)]
struct Stub {
    location: Trail,
    cursor: Cursor,
}

/// Inserts content at every match of a pattern, creating missing structure.
#[derive(Debug)]
pub struct Insert {
    content: Value,
    targets: Vec<Trail>,
    stubs: Vec<Stub>,
    extensions: Vec<Stub>,
}

impl Insert {
    pub fn new(content: Value) -> Self {
        Self {
            content,
            targets: Vec::new(),
            stubs: Vec::new(),
            extensions: Vec::new(),
        }
    }

    fn record_target(&mut self, key: &Step, trail: &[Step]) {
        self.targets.push(child_location(trail, key));
    }

    /// Apply the content at every recorded target, last match first so that
    /// sequence indices recorded earlier stay valid.
    fn apply_targets(&self, root: &mut Value, path: &YamlPath, mode: Mode) -> Result<usize> {
        let delimiter = path.delimiter();
        for location in self.targets.iter().rev() {
            let label = describe(location, delimiter);
            let Some((last, parent_steps)) = location.split_last() else {
                continue;
            };
            let parent = get_at_mut(root, parent_steps).ok_or_else(|| Error::StructuralConflict {
                location: label.clone(),
                message: "target disappeared before it could be updated".to_string(),
            })?;
            match (untag_mut(parent), last, mode) {
                (Value::Sequence(seq), Step::Index(idx), Mode::Insert) if *idx <= seq.len() => {
                    seq.insert(*idx, self.content.clone());
                }
                (Value::Sequence(seq), Step::Index(idx), Mode::Replace) if *idx < seq.len() => {
                    seq[*idx] = self.content.clone();
                }
                (Value::Mapping(map), Step::Key(key), mode) => match map.get_mut(key) {
                    Some(existing) if mode == Mode::Replace => *existing = self.content.clone(),
                    Some(existing) => merge(existing, self.content.clone(), &label)?,
                    None => {
                        map.insert(key.clone(), self.content.clone());
                    }
                },
                (parent, _, _) => {
                    return Err(Error::StructuralConflict {
                        location: label,
                        message: format!("cannot update a child of a {}", type_name(parent)),
                    })
                }
            }
            debug!("{:?} at '{}'", mode, label);
        }
        Ok(self.targets.len())
    }

    /// Pad sequences that a `[n]` segment overran, then append the content.
    fn apply_extensions(&self, root: &mut Value, path: &YamlPath) -> Result<usize> {
        let mut applied = 0;
        for (idx, ext) in self.extensions.iter().enumerate().rev() {
            let duplicate = self.extensions[..idx].iter().any(|earlier| {
                earlier.location == ext.location && path.is_equivalent(earlier.cursor, ext.cursor)
            });
            if duplicate {
                continue;
            }
            self.grow(root, path, ext)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// mkdir -p: build the missing tail of the pattern at the deepest stubs.
    fn synthesize(&self, root: &mut Value, path: &YamlPath) -> Result<usize> {
        let Some(depth) = self.stubs.iter().map(|stub| path.depth(stub.cursor)).max() else {
            return Ok(0);
        };

        let mut deepest: Vec<&Stub> = Vec::new();
        let mut greedy = 0;
        for stub in self.stubs.iter().filter(|stub| path.depth(stub.cursor) == depth) {
            if stub.cursor.greedy {
                greedy += 1;
                continue;
            }
            let same = |other: &&Stub| {
                other.location == stub.location && path.is_equivalent(other.cursor, stub.cursor)
            };
            if self.extensions.iter().any(|ext| same(&ext)) || deepest.iter().any(same) {
                continue;
            }
            deepest.push(stub);
        }
        if greedy > 0 {
            warn!(
                "Not creating structure for '{}' below an unanchored '**' ({} location(s) skipped)",
                path, greedy
            );
        }

        for stub in &deepest {
            self.grow(root, path, stub)?;
        }
        Ok(deepest.len())
    }

    /// Attach the chain for the remaining segments of `stub` at its node.
    fn grow(&self, root: &mut Value, path: &YamlPath, stub: &Stub) -> Result<()> {
        let label = describe(&stub.location, path.delimiter());
        let remaining = path.remaining(stub.cursor);
        let Some((head, tail)) = remaining.split_first() else {
            return Ok(());
        };
        let chain = build_chain(tail, self.content.clone(), &label)?;
        let node = get_at_mut(root, &stub.location).ok_or_else(|| Error::StructuralConflict {
            location: label.clone(),
            message: "location disappeared before it could be extended".to_string(),
        })?;
        debug!("Creating '{}' under '{}'", path.remaining_text(stub.cursor), label);
        attach(node, head, chain, &label)
    }
}

impl MatchVisitor for Insert {
    fn on_end_to_end_match(
        &mut self,
        _path: &YamlPath,
        key: &Step,
        _value: &Value,
        trail: &[Step],
    ) -> Result<bool> {
        self.record_target(key, trail);
        Ok(true)
    }

    fn on_match_fail(&mut self, path: &YamlPath, fail: &MatchFail<'_>) -> Result<()> {
        let stub = Stub {
            location: fail.location.to_vec(),
            cursor: fail.cursor,
        };
        let overran = match (untag(fail.node), path.segment(fail.cursor)) {
            (Value::Sequence(seq), Some(Segment::Index(n))) => *n >= seq.len(),
            _ => false,
        };
        if overran && fail.unmatched.is_none() && !fail.cursor.greedy {
            self.extensions.push(Stub {
                location: stub.location.clone(),
                cursor: stub.cursor,
            });
        }
        self.stubs.push(stub);
        Ok(())
    }

    fn at_end_of_input(&mut self, root: &mut Value, path: &YamlPath) -> Result<()> {
        if path.is_root() {
            return merge(root, self.content.clone(), crate::path::ROOT);
        }
        let extended = self.apply_extensions(root, path)?;
        let updated = self.apply_targets(root, path, Mode::Insert)?;
        let created = if updated == 0 {
            self.synthesize(root, path)?
        } else {
            0
        };
        debug!(
            "Insert '{}': {} target(s) updated, {} sequence(s) extended, {} location(s) created",
            path, updated, extended, created
        );
        if updated + extended + created == 0 {
            warn!("Insert '{}' changed nothing", path);
        }
        Ok(())
    }
}

/// Replaces every match of a pattern. Unmatched patterns leave the document
/// untouched.
#[derive(Debug)]
pub struct Replace {
    insert: Insert,
}

impl Replace {
    pub fn new(content: Value) -> Self {
        Self {
            insert: Insert::new(content),
        }
    }
}

impl MatchVisitor for Replace {
    fn on_end_to_end_match(
        &mut self,
        path: &YamlPath,
        key: &Step,
        value: &Value,
        trail: &[Step],
    ) -> Result<bool> {
        self.insert.on_end_to_end_match(path, key, value, trail)
    }

    fn at_end_of_input(&mut self, root: &mut Value, path: &YamlPath) -> Result<()> {
        if path.is_root() {
            *root = self.insert.content.clone();
            return Ok(());
        }
        let replaced = self.insert.apply_targets(root, path, Mode::Replace)?;
        debug!("Replace '{}': {} target(s)", path, replaced);
        Ok(())
    }
}

/// Merge `content` into `existing`.
///
/// Blank scalars are substituted, mappings take the new entries (overwriting
/// keys they share), sequences concatenate another sequence or append any
/// other value. Everything else would lose data and is refused.
pub fn merge(existing: &mut Value, content: Value, location: &str) -> Result<()> {
    if is_blank(existing) {
        *existing = content;
        return Ok(());
    }
    match (untag_mut(existing), content) {
        (Value::Mapping(map), Value::Mapping(entries)) => {
            for (key, value) in entries {
                map.insert(key, value);
            }
            Ok(())
        }
        (Value::Sequence(seq), Value::Sequence(items)) => {
            seq.extend(items);
            Ok(())
        }
        (Value::Sequence(seq), other) => {
            seq.push(other);
            Ok(())
        }
        (existing, content) => Err(Error::StructuralConflict {
            location: location.to_string(),
            message: format!(
                "cannot insert a {} into an existing {}",
                type_name(&content),
                type_name(existing)
            ),
        }),
    }
}

/// Wrap `content` in one container per segment, innermost segment last.
fn build_chain(segments: &[Segment], content: Value, location: &str) -> Result<Value> {
    segments.iter().rev().try_fold(content, |inner, segment| match segment {
        Segment::Literal { text, .. } => Ok(single_entry(text, inner)),
        Segment::Index(n) => {
            let mut items = vec![placeholder(); *n];
            items.push(inner);
            Ok(Value::Sequence(items))
        }
        Segment::Wildcard | Segment::Greedy => Err(unsynthesizable(segment, location)),
    })
}

/// Hang `chain` below `node` at `head`.
fn attach(node: &mut Value, head: &Segment, chain: Value, location: &str) -> Result<()> {
    let node = untag_mut(node);
    if is_blank(node) {
        *node = match head {
            Segment::Literal { text, .. } => single_entry(text, chain),
            Segment::Index(n) => {
                let mut items = vec![placeholder(); *n];
                items.push(chain);
                Value::Sequence(items)
            }
            Segment::Wildcard | Segment::Greedy => return Err(unsynthesizable(head, location)),
        };
        return Ok(());
    }
    match (&mut *node, head) {
        (Value::Mapping(map), Segment::Literal { text, .. }) => {
            let key = Value::String(text.clone());
            match map.get_mut(&key) {
                Some(existing) => merge(existing, chain, location),
                None => {
                    map.insert(key, chain);
                    Ok(())
                }
            }
        }
        (Value::Sequence(seq), Segment::Index(n)) if *n >= seq.len() => {
            seq.resize(*n, placeholder());
            seq.push(chain);
            Ok(())
        }
        (_, Segment::Wildcard | Segment::Greedy) => Err(unsynthesizable(head, location)),
        (node, head) => Err(Error::StructuralConflict {
            location: location.to_string(),
            message: format!("cannot create '{}' inside a {}", head, type_name(node)),
        }),
    }
}

fn unsynthesizable(segment: &Segment, location: &str) -> Error {
    Error::StructuralConflict {
        location: location.to_string(),
        message: format!("cannot create structure for wildcard segment '{}'", segment),
    }
}
