//! Batch script reading and command grammar
//!
//! A script is a list of lines, one command per line. Blank lines and lines
//! starting with `#` are dropped when the script is read; every remaining line
//! keeps its 1-based line number for error reporting.
//!
//! Words are split with POSIX shell rules: whitespace separates them,
//! `'single'` or `"double"` quotes group them and a bare backslash escapes the
//! next character. Regex escapes in path patterns therefore belong in single
//! quotes (`--yamlpath 'responses.2\d\d'`). A word starting with `#` ends
//! the line.

use std::path::Path;
use std::time::Duration;

use crate::codec::YamlBackend;
use crate::error::{Error, Result};

/// Every command keyword the interpreter understands.
pub const KEYWORDS: &[&str] = &[
    "makeNewRoot",
    "batch",
    "property",
    "foreach",
    "end",
    "saveTo",
    "saveAs",
    "useAsInput",
    "setProperty",
    "print",
    "useYamlLibrary",
    "verbose",
    "sleep",
    "expandTree",
    "yaml",
];

/// One meaningful script line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

impl Line {
    /// First word of the line, before macro expansion.
    pub fn keyword(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or_default()
    }

    fn is_foreach(&self) -> bool {
        self.keyword() == "foreach"
    }

    fn is_end(&self) -> bool {
        self.keyword() == "end"
    }
}

/// A parsed, balance-checked script.
#[derive(Clone, Debug, Default)]
pub struct Script {
    lines: Vec<Line>,
}

impl Script {
    /// Read a script from text. Fails on unknown commands or unbalanced
    /// `foreach`/`end` before anything runs.
    pub fn parse(text: &str) -> Result<Self> {
        let lines: Vec<Line> = text
            .lines()
            .enumerate()
            .map(|(idx, raw)| Line {
                number: idx + 1,
                text: raw.trim().to_string(),
            })
            .filter(|line| !line.text.is_empty() && !line.text.starts_with('#'))
            .collect();

        for line in &lines {
            let keyword = line.keyword();
            // a keyword produced by a macro can only be checked once expanded
            if !KEYWORDS.contains(&keyword) && !keyword.contains("${") {
                return Err(Error::BatchGrammar {
                    line: line.number,
                    message: format!("unknown command '{}'", keyword),
                });
            }
        }
        check_balance(&lines)?;
        Ok(Self { lines })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| Error::Resource {
            reference: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::parse(&text)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn check_balance(lines: &[Line]) -> Result<()> {
    let mut open: Vec<usize> = Vec::new();
    for line in lines {
        if line.is_foreach() {
            open.push(line.number);
        } else if line.is_end() && open.pop().is_none() {
            return Err(Error::BatchGrammar {
                line: line.number,
                message: "'end' without a matching 'foreach'".to_string(),
            });
        }
    }
    match open.last() {
        Some(number) => Err(Error::BatchGrammar {
            line: *number,
            message: "'foreach' without a matching 'end'".to_string(),
        }),
        None => Ok(()),
    }
}

/// Index of the `end` closing the `foreach` at `lines[start]`.
pub fn find_matching_end(lines: &[Line], start: usize) -> Result<usize> {
    let number = lines.get(start).map(|line| line.number).unwrap_or(0);
    let mut depth = 0usize;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        if line.is_foreach() {
            depth += 1;
        } else if line.is_end() {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Ok(idx);
            }
        }
        if idx == start && depth == 0 {
            break;
        }
    }
    Err(Error::BatchGrammar {
        line: number,
        message: "'foreach' without a matching 'end'".to_string(),
    })
}

/// A `yaml <verb>` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YamlCommand {
    pub verb: String,
    pub pattern: String,
    pub delimiter: Option<String>,
    /// Content reference for insert/replace, column list for table
    pub argument: Option<String>,
}

/// A parsed script command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    MakeRoot(Option<String>),
    SubBatch(String),
    LoadProperties { namespace: String, reference: String },
    Foreach,
    End,
    SaveTo(String),
    UseAsInput(String),
    SetProperty { key: String, value: String },
    Print(String),
    UseYamlLibrary(YamlBackend),
    Verbose(bool),
    Sleep(Duration),
    ExpandTree,
    Yaml(YamlCommand),
}

impl Command {
    /// Parse an already macro-expanded line.
    pub fn parse(text: &str, line: usize) -> Result<Self> {
        // print keeps its text verbatim, quotes and spacing included
        if let Some(rest) = text.trim_start().strip_prefix("print") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Ok(Command::Print(rest.trim().to_string()));
            }
        }
        Self::from_words(&tokenize(text, line)?, line)
    }

    /// Build a command from already split words. The first word is the
    /// keyword.
    pub fn from_words(words: &[String], line: usize) -> Result<Self> {
        let grammar = |message: String| Error::BatchGrammar { line, message };
        let Some((keyword, args)) = words.split_first() else {
            return Err(grammar("empty command".to_string()));
        };

        let single = |what: &str| -> Result<String> {
            match args {
                [arg] => Ok(arg.clone()),
                _ => Err(grammar(format!(
                    "'{}' expects exactly one {}",
                    keyword, what
                ))),
            }
        };
        let assignment = |what: &str| -> Result<(String, String)> {
            let joined = args.join(" ");
            match joined.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    Ok((key.trim().to_string(), value.trim().to_string()))
                }
                _ => Err(grammar(format!("'{}' expects {}", keyword, what))),
            }
        };

        let command = match keyword.as_str() {
            "makeNewRoot" => match args {
                [] => Command::MakeRoot(None),
                _ => Command::MakeRoot(Some(single("reference")?)),
            },
            "batch" => Command::SubBatch(single("script reference")?),
            "property" => {
                let (namespace, reference) = assignment("<namespace>=<file>")?;
                Command::LoadProperties {
                    namespace,
                    reference,
                }
            }
            "foreach" => Command::Foreach,
            "end" => Command::End,
            "saveTo" | "saveAs" => Command::SaveTo(single("reference")?),
            "useAsInput" => Command::UseAsInput(single("reference")?),
            "setProperty" => {
                let (key, value) = assignment("<key>=<value>")?;
                Command::SetProperty { key, value }
            }
            "useYamlLibrary" => Command::UseYamlLibrary(single("library name")?.parse().map_err(grammar)?),
            "verbose" => match single("of on|off")?.to_ascii_lowercase().as_str() {
                "on" | "true" => Command::Verbose(true),
                "off" | "false" => Command::Verbose(false),
                other => return Err(grammar(format!("'verbose' expects on or off, not '{}'", other))),
            },
            "sleep" => {
                let seconds = single("number of seconds")?;
                match seconds.parse::<f64>() {
                    Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                        Command::Sleep(Duration::from_secs_f64(secs))
                    }
                    _ => return Err(grammar(format!("invalid sleep duration '{}'", seconds))),
                }
            }
            "expandTree" => Command::ExpandTree,
            "yaml" => Command::Yaml(parse_yaml(args, line)?),
            other => return Err(grammar(format!("unknown command '{}'", other))),
        };
        Ok(command)
    }
}

fn parse_yaml(args: &[String], line: usize) -> Result<YamlCommand> {
    let grammar = |message: String| Error::BatchGrammar { line, message };
    let Some((verb, rest)) = args.split_first() else {
        return Err(grammar("'yaml' expects a verb".to_string()));
    };

    let mut pattern = None;
    let mut delimiter = None;
    let mut positional = Vec::new();
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--yamlpath=") {
            pattern = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("--delimiter=") {
            delimiter = Some(value.to_string());
        } else if arg == "--yamlpath" || arg == "--delimiter" {
            let value = iter
                .next()
                .ok_or_else(|| grammar(format!("'{}' expects a value", arg)))?;
            if arg == "--yamlpath" {
                pattern = Some(value.clone());
            } else {
                delimiter = Some(value.clone());
            }
        } else {
            positional.push(arg.clone());
        }
    }

    let pattern = pattern.ok_or_else(|| grammar(format!("'yaml {}' needs --yamlpath", verb)))?;
    let argument = match (verb.as_str(), positional.as_slice()) {
        ("read" | "list" | "delete", []) => None,
        ("read" | "list" | "delete", _) => {
            return Err(grammar(format!("'yaml {}' takes no argument", verb)))
        }
        ("insert" | "replace" | "table", [arg]) => Some(arg.clone()),
        ("insert" | "replace" | "table", _) => {
            return Err(grammar(format!("'yaml {}' expects exactly one argument", verb)))
        }
        (other, _) => return Err(grammar(format!("unknown yaml verb '{}'", other))),
    };

    Ok(YamlCommand {
        verb: verb.clone(),
        pattern,
        delimiter,
        argument,
    })
}

/// Split a line into shell words.
pub fn tokenize(text: &str, line: usize) -> Result<Vec<String>> {
    shlex::split(text).ok_or_else(|| Error::BatchGrammar {
        line,
        message: "unbalanced quotes or trailing backslash".to_string(),
    })
}
