//! Path pattern compilation
//!
//! A path pattern is a delimiter-separated list of segments, e.g.
//! `paths.*.*.responses.200`:
//!
//! - `*` matches exactly one mapping key or sequence index
//! - `**` matches zero or more levels
//! - `[n]` selects sequence item `n`
//! - anything else is a regular expression tested against the whole key text
//!
//! The single pattern `/` denotes the whole document.
//!
//! A compiled [`YamlPath`] is immutable. Walking it uses [`Cursor`]s, which are
//! `Copy`, so every recursion branch can advance its own cursor without
//! disturbing its siblings or the caller.

use regex::Regex;

use crate::error::{Error, Result};

/// The pattern that selects the whole document without traversal.
pub const ROOT: &str = "/";

const WILDCARD: &str = "*";
const GREEDY: &str = "**";

/// One compiled pattern segment.
#[derive(Clone, Debug)]
pub enum Segment {
    /// A key matcher: exact text, or an anchored regex over the key text
    Literal { text: String, regex: Regex },
    /// `*`
    Wildcard,
    /// `**`
    Greedy,
    /// `[n]`
    Index(usize),
}

impl Segment {
    fn parse(pattern: &str, text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(Error::Pattern {
                pattern: pattern.to_string(),
                message: "empty segment".to_string(),
            });
        }
        if text == GREEDY {
            return Ok(Segment::Greedy);
        }
        if text == WILDCARD {
            return Ok(Segment::Wildcard);
        }
        if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            if let Ok(idx) = inner.trim().parse::<usize>() {
                return Ok(Segment::Index(idx));
            }
        }
        let regex = Regex::new(&format!("^(?:{})$", text)).map_err(|err| Error::Pattern {
            pattern: pattern.to_string(),
            message: format!("segment '{}' is not a valid regex: {}", text, err),
        })?;
        Ok(Segment::Literal {
            text: text.to_string(),
            regex,
        })
    }

    /// Whether this segment literally matches a key's text.
    ///
    /// `**` never matches literally; it only lets traversal continue.
    pub fn matches_text(&self, key: &str) -> bool {
        match self {
            Segment::Literal { text, regex } => text == key || regex.is_match(key),
            Segment::Wildcard => true,
            Segment::Greedy => false,
            Segment::Index(idx) => key == format!("[{}]", idx),
        }
    }

    /// Whether this segment selects sequence item `idx`.
    pub fn matches_index(&self, idx: usize) -> bool {
        match self {
            Segment::Index(n) => *n == idx,
            Segment::Wildcard => true,
            Segment::Literal { .. } | Segment::Greedy => false,
        }
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Segment::Literal { text: a, .. }, Segment::Literal { text: b, .. }) => a == b,
            (Segment::Wildcard, Segment::Wildcard) => true,
            (Segment::Greedy, Segment::Greedy) => true,
            (Segment::Index(a), Segment::Index(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Literal { text, .. } => write!(f, "{}", text),
            Segment::Wildcard => write!(f, "{}", WILDCARD),
            Segment::Greedy => write!(f, "{}", GREEDY),
            Segment::Index(idx) => write!(f, "[{}]", idx),
        }
    }
}

/// A position inside a compiled pattern.
///
/// `greedy` records that a `**` was passed on the way to `pos` and has not yet
/// been anchored by a literal hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub pos: usize,
    pub greedy: bool,
}

/// A compiled path pattern.
#[derive(Clone, Debug)]
pub struct YamlPath {
    raw: String,
    delimiter: String,
    segments: Vec<Segment>,
    root: bool,
}

impl YamlPath {
    /// Compile `raw`, splitting it on `delimiter` (any non-empty string).
    pub fn compile(raw: &str, delimiter: &str) -> Result<Self> {
        if delimiter.is_empty() {
            return Err(Error::Pattern {
                pattern: raw.to_string(),
                message: "delimiter must not be empty".to_string(),
            });
        }
        let trimmed = raw.trim();
        if trimmed == ROOT {
            return Ok(Self {
                raw: trimmed.to_string(),
                delimiter: delimiter.to_string(),
                segments: Vec::new(),
                root: true,
            });
        }
        if trimmed.is_empty() {
            return Err(Error::Pattern {
                pattern: raw.to_string(),
                message: "pattern is empty".to_string(),
            });
        }

        let segments = trimmed
            .split(delimiter)
            .map(|text| Segment::parse(trimmed, text))
            .collect::<Result<Vec<_>>>()?;
        // zero or more levels with nothing after them matches the document itself
        let root = segments.iter().all(|segment| matches!(segment, Segment::Greedy));

        Ok(Self {
            raw: trimmed.to_string(),
            delimiter: delimiter.to_string(),
            segments,
            root,
        })
    }

    /// The pattern text as given.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Whether this is the whole-document pattern.
    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Cursor at the first segment, with leading `**` folded into the flag.
    pub fn start(&self) -> Cursor {
        self.skip_greedy(Cursor {
            pos: 0,
            greedy: false,
        })
    }

    /// The segment under the cursor, `None` once exhausted.
    pub fn segment(&self, cursor: Cursor) -> Option<&Segment> {
        self.segments.get(cursor.pos)
    }

    /// Move past the current segment after a literal hit.
    ///
    /// A literal hit anchors any pending `**`, so the flag is cleared unless
    /// the next segment is itself a `**`.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        self.skip_greedy(Cursor {
            pos: cursor.pos + 1,
            greedy: false,
        })
    }

    fn skip_greedy(&self, mut cursor: Cursor) -> Cursor {
        while let Some(Segment::Greedy) = self.segments.get(cursor.pos) {
            cursor.pos += 1;
            cursor.greedy = true;
        }
        cursor
    }

    /// Whether every segment has been consumed.
    pub fn is_exhausted(&self, cursor: Cursor) -> bool {
        cursor.pos >= self.segments.len()
    }

    /// Segments not yet consumed.
    pub fn remaining(&self, cursor: Cursor) -> &[Segment] {
        let pos = cursor.pos.min(self.segments.len());
        &self.segments[pos..]
    }

    /// Number of segments consumed so far.
    pub fn depth(&self, cursor: Cursor) -> usize {
        cursor.pos
    }

    /// Two cursors are equivalent when what is left to match is identical.
    pub fn is_equivalent(&self, a: Cursor, b: Cursor) -> bool {
        a.greedy == b.greedy && self.remaining(a) == self.remaining(b)
    }

    /// Render the remaining segments back into pattern text.
    pub fn remaining_text(&self, cursor: Cursor) -> String {
        self.remaining(cursor)
            .iter()
            .map(|segment| segment.to_string())
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }
}

impl std::fmt::Display for YamlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
