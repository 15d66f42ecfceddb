//! Recursive path matching
//!
//! [`search`] walks a document against a compiled [`YamlPath`] and reports
//! what it finds to a [`MatchVisitor`]:
//!
//! - a *partial match* when a segment matched but more remain,
//! - an *end-to-end match* when the whole pattern was consumed,
//! - a *match failure* wherever the pattern could not continue,
//! - and finally *end of input*, with mutable access to the document.
//!
//! The walk itself only borrows the document immutably. Visitors that mutate
//! record locations during the walk and apply their changes in
//! `at_end_of_input`, so no collection is modified while it is being iterated.
//!
//! ## Greedy wildcards
//!
//! A `**` is "sticky": once passed, every key at every level keeps the walk
//! going with the cursor held in place, until a key literally matches the
//! segment after the `**`. That hit advances the cursor and anchors the match.

use log::debug;
use serde_yaml::Value;

use crate::error::{Error, Result};
use crate::path::{Cursor, Segment, YamlPath};
use crate::tree::{child_location, scalar_text, untag, Step, Trail};

/// Context for a failed match.
#[derive(Debug)]
pub struct MatchFail<'a> {
    /// Cursor at the segment that could not be matched
    pub cursor: Cursor,
    /// Node whose children (or whose own value) did not match
    pub node: &'a Value,
    /// Location of `node`
    pub location: &'a [Step],
    /// The entry that did not match, `None` when `node` failed as a whole
    pub unmatched: Option<&'a Step>,
}

/// Callbacks driven by [`search`].
pub trait MatchVisitor {
    /// A segment matched at `key` under `trail` but more segments remain.
    ///
    /// Returning `false` skips recursion into `node`; siblings are still
    /// visited.
    fn on_partial_match(
        &mut self,
        _node: &Value,
        _path: &YamlPath,
        _cursor: Cursor,
        _key: &Step,
        _trail: &[Step],
    ) -> Result<bool> {
        Ok(true)
    }

    /// The whole pattern matched `value`, found at `key` under `trail`.
    ///
    /// Returns whether the match is accepted.
    fn on_end_to_end_match(
        &mut self,
        path: &YamlPath,
        key: &Step,
        value: &Value,
        trail: &[Step],
    ) -> Result<bool>;

    /// The pattern could not continue. Fires for every unmatched entry and
    /// once more for any node under which nothing matched end-to-end.
    fn on_match_fail(&mut self, _path: &YamlPath, _fail: &MatchFail<'_>) -> Result<()> {
        Ok(())
    }

    /// The walk is complete.
    fn at_end_of_input(&mut self, root: &mut Value, path: &YamlPath) -> Result<()>;
}

/// Compile `pattern` and run `visitor` over `root`.
pub fn search<V: MatchVisitor + ?Sized>(
    root: &mut Value,
    pattern: &str,
    delimiter: &str,
    visitor: &mut V,
) -> Result<()> {
    let path = YamlPath::compile(pattern, delimiter)?;
    search_path(root, &path, visitor)
}

/// Run `visitor` over `root` with an already compiled pattern.
///
/// The root pattern (`/`) skips traversal and goes straight to end of input.
pub fn search_path<V: MatchVisitor + ?Sized>(
    root: &mut Value,
    path: &YamlPath,
    visitor: &mut V,
) -> Result<()> {
    if !path.is_root() {
        let mut walker = Walker {
            path,
            visitor: &mut *visitor,
        };
        let matched = walker.walk(root, path.start(), &Trail::new())?;
        if !matched {
            debug!("No end-to-end match for pattern '{}'", path);
        }
    }
    visitor.at_end_of_input(root, path)
}

struct Walker<'a, V: ?Sized> {
    path: &'a YamlPath,
    visitor: &'a mut V,
}

impl<V: MatchVisitor + ?Sized> Walker<'_, V> {
    /// Returns whether anything matched end-to-end at or below `node`.
    fn walk(&mut self, node: &Value, cursor: Cursor, location: &[Step]) -> Result<bool> {
        let path = self.path;
        let Some(segment) = path.segment(cursor) else {
            return Ok(true);
        };

        let matched = match untag(node) {
            Value::Mapping(map) => {
                let mut matched = false;
                for (key, value) in map {
                    let step = Step::Key(key.clone());
                    let literal = match scalar_text(key) {
                        Some(text) => segment.matches_text(&text),
                        None => matches!(segment, Segment::Wildcard),
                    };
                    let next = if literal {
                        path.advance(cursor)
                    } else if cursor.greedy {
                        cursor
                    } else {
                        let fail = MatchFail {
                            cursor,
                            node,
                            location,
                            unmatched: Some(&step),
                        };
                        self.visitor.on_match_fail(path, &fail)?;
                        continue;
                    };
                    matched |= self.visit_child(value, next, location, step)?;
                }
                matched
            }
            Value::Sequence(seq) => {
                let iterate = matches!(segment, Segment::Index(_) | Segment::Wildcard);
                let mut matched = false;
                if iterate || cursor.greedy {
                    for (idx, item) in seq.iter().enumerate() {
                        let next = if segment.matches_index(idx) {
                            path.advance(cursor)
                        } else if cursor.greedy {
                            if matches!(untag(item), Value::Sequence(_)) {
                                return Err(Error::Unsupported {
                                    feature: format!(
                                        "nested sequences under '**' in pattern '{}'",
                                        path
                                    ),
                                });
                            }
                            cursor
                        } else {
                            continue;
                        };
                        matched |= self.visit_child(item, next, location, Step::Index(idx))?;
                    }
                }
                matched
            }
            _ => self.match_scalar(node, cursor, location)?,
        };

        if !matched {
            let fail = MatchFail {
                cursor,
                node,
                location,
                unmatched: None,
            };
            self.visitor.on_match_fail(path, &fail)?;
        }
        Ok(matched)
    }

    fn visit_child(
        &mut self,
        value: &Value,
        next: Cursor,
        location: &[Step],
        step: Step,
    ) -> Result<bool> {
        if self.path.is_exhausted(next) {
            return self
                .visitor
                .on_end_to_end_match(self.path, &step, value, location);
        }
        if !self
            .visitor
            .on_partial_match(value, self.path, next, &step, location)?
        {
            return Ok(false);
        }
        let child = child_location(location, &step);
        self.walk(value, next, &child)
    }

    /// A scalar under a key matches itself when the one remaining literal
    /// segment matches its text. Never while a `**` is pending.
    fn match_scalar(&mut self, node: &Value, cursor: Cursor, location: &[Step]) -> Result<bool> {
        if cursor.greedy {
            return Ok(false);
        }
        let Some((key, parent)) = location.split_last() else {
            return Ok(false);
        };
        let remaining = self.path.remaining(cursor);
        let hit = match (remaining, scalar_text(node)) {
            ([segment @ Segment::Literal { .. }], Some(text)) => segment.matches_text(&text),
            _ => false,
        };
        if !hit {
            return Ok(false);
        }
        self.visitor
            .on_end_to_end_match(self.path, key, node, parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::describe;

    /// Records every callback as a readable line.
    #[derive(Default)]
    struct Recorder {
        matches: Vec<String>,
        fails: Vec<String>,
        partials: usize,
        ended: bool,
        skip_partials: bool,
    }

    impl MatchVisitor for Recorder {
        fn on_partial_match(
            &mut self,
            _node: &Value,
            _path: &YamlPath,
            _cursor: Cursor,
            _key: &Step,
            _trail: &[Step],
        ) -> Result<bool> {
            self.partials += 1;
            Ok(!self.skip_partials)
        }

        fn on_end_to_end_match(
            &mut self,
            _path: &YamlPath,
            key: &Step,
            _value: &Value,
            trail: &[Step],
        ) -> Result<bool> {
            let mut location = trail.to_vec();
            location.push(key.clone());
            self.matches.push(describe(&location, "."));
            Ok(true)
        }

        fn on_match_fail(&mut self, path: &YamlPath, fail: &MatchFail<'_>) -> Result<()> {
            self.fails.push(format!(
                "{}|{}",
                describe(fail.location, "."),
                path.remaining_text(fail.cursor)
            ));
            Ok(())
        }

        fn at_end_of_input(&mut self, _root: &mut Value, _path: &YamlPath) -> Result<()> {
            self.ended = true;
            Ok(())
        }
    }

    fn run(doc: &str, pattern: &str) -> Recorder {
        let mut value: Value = serde_yaml::from_str(doc).unwrap();
        let mut recorder = Recorder::default();
        search(&mut value, pattern, ".", &mut recorder).unwrap();
        recorder
    }

    #[test]
    fn test_literal_path() {
        let rec = run("a:\n  b:\n    c: 1\n  d: 2", "a.b.c");
        assert_eq!(rec.matches, vec!["a.b.c"]);
        assert!(rec.ended);
    }

    #[test]
    fn test_single_wildcard_is_one_level() {
        let rec = run("a:\n  x: {z: 1}\n  y: {z: 2}\n  w: {q: {z: 3}}", "a.*.z");
        assert_eq!(rec.matches, vec!["a.x.z", "a.y.z"]);
    }

    #[test]
    fn test_greedy_matches_any_depth() {
        let doc = "a:\n  z: 0\n  x:\n    y:\n      z: 1\n    x:\n      x:\n        z: 2";
        let rec = run(doc, "a.**.z");
        assert_eq!(rec.matches, vec!["a.z", "a.x.y.z", "a.x.x.x.z"]);
    }

    #[test]
    fn test_greedy_requires_anchor() {
        let rec = run("a:\n  x:\n    y: 1", "a.**.z");
        assert!(rec.matches.is_empty());
    }

    #[test]
    fn test_greedy_anchors_on_first_hit() {
        // once `z` matched, the cursor is past `**` and nothing below is visited
        let rec = run("a:\n  z:\n    z: 1", "a.**.z");
        assert_eq!(rec.matches, vec!["a.z"]);
    }

    #[test]
    fn test_sequence_index_and_wildcard() {
        let doc = "items:\n  - name: a\n  - name: b\n  - other: c";
        assert_eq!(run(doc, "items.[1].name").matches, vec!["items.[1].name"]);
        assert_eq!(
            run(doc, "items.*.name").matches,
            vec!["items.[0].name", "items.[1].name"]
        );
    }

    #[test]
    fn test_sequence_literal_segment_short_circuits() {
        let rec = run("items:\n  - name: a", "items.name");
        assert!(rec.matches.is_empty());
        assert!(rec.fails.contains(&"items|name".to_string()));
    }

    #[test]
    fn test_sequence_index_out_of_range_fails_whole_node() {
        let rec = run("items: [a, b]", "items.[5]");
        assert!(rec.matches.is_empty());
        assert!(rec.fails.contains(&"items|[5]".to_string()));
    }

    #[test]
    fn test_scalar_matches_itself() {
        let rec = run("tags: [alpha, beta]", "tags.*.beta");
        assert_eq!(rec.matches, vec!["tags.[1]"]);
    }

    #[test]
    fn test_regex_segment() {
        let rec = run("get: 1\npost: 2\nput: 3", "get|post");
        assert_eq!(rec.matches, vec!["get", "post"]);
    }

    #[test]
    fn test_numeric_keys_match_text() {
        let rec = run("responses:\n  200: {description: ok}\n  404: {}", "responses.200");
        assert_eq!(rec.matches, vec!["responses.200"]);
    }

    #[test]
    fn test_match_fail_reports_each_unmatched_entry_and_node() {
        let rec = run("a: 1\nb: 2", "c");
        assert_eq!(rec.fails, vec!["|c", "|c", "|c"]);
    }

    #[test]
    fn test_partial_match_can_prune() {
        let mut value: Value = serde_yaml::from_str("a:\n  b: 1").unwrap();
        let mut rec = Recorder {
            skip_partials: true,
            ..Default::default()
        };
        search(&mut value, "a.b", ".", &mut rec).unwrap();
        assert_eq!(rec.partials, 1);
        assert!(rec.matches.is_empty());
    }

    #[test]
    fn test_root_pattern_skips_traversal() {
        let rec = run("a: 1", "/");
        assert!(rec.matches.is_empty());
        assert!(rec.fails.is_empty());
        assert!(rec.ended);
    }

    #[test]
    fn test_nested_sequences_under_greedy_unsupported() {
        let mut value: Value = serde_yaml::from_str("a:\n  - [1, 2]").unwrap();
        let mut rec = Recorder::default();
        let err = search(&mut value, "a.**.z", ".", &mut rec).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let mut value = Value::Null;
        let mut rec = Recorder::default();
        let err = search(&mut value, "a.(", ".", &mut rec).unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
        assert!(!rec.ended);
    }
}
