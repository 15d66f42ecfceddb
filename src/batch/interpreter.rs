//! Batch interpreter
//!
//! Runs script lines in order, threading one document through them: every
//! command receives the current input and its result becomes the next input.
//! Each line is split into words and every word is macro-expanded against the
//! [`Context`] right before the command is built, so loop variables always
//! reflect the running iteration and a substituted value stays one word.

use std::io::Write;

use log::{debug, info, LevelFilter};
use serde_yaml::{Mapping, Value};

use super::script::{find_matching_end, tokenize, Command, Line, Script, YamlCommand};
use crate::codec::{self, Format};
use crate::context::{Context, LoopScope};
use crate::error::{Error, Result};
use crate::macros::{expand, expand_tree};
use crate::operators::{self, columns, Verb};
use crate::path::YamlPath;
use crate::tree::{scalar_text, type_name};

pub struct Interpreter<'a> {
    ctx: &'a mut Context,
    out: &'a mut dyn Write,
    /// Log level to return to after `verbose off`
    base_level: LevelFilter,
}

impl<'a> Interpreter<'a> {
    pub fn new(ctx: &'a mut Context, out: &'a mut dyn Write) -> Self {
        Self {
            ctx,
            out,
            base_level: log::max_level(),
        }
    }

    /// Run a whole script against `input` and return the final document.
    pub fn run(&mut self, script: &Script, input: Value) -> Result<Value> {
        info!("Running batch script ({} commands)", script.len());
        let result = self.run_lines(script.lines(), input);
        if log::max_level() != self.base_level {
            log::set_max_level(self.base_level);
        }
        result
    }

    fn run_lines(&mut self, lines: &[Line], mut input: Value) -> Result<Value> {
        let mut idx = 0;
        while idx < lines.len() {
            let line = &lines[idx];
            let wrap = |source: Error| Error::Batch {
                line: line.number,
                command: line.text.clone(),
                source: Box::new(source),
            };

            let command = self.parse_line(line).map_err(wrap)?;

            match command {
                Command::Foreach => {
                    let end = find_matching_end(lines, idx).map_err(wrap)?;
                    input = self.run_foreach(&lines[idx + 1..end], input).map_err(wrap)?;
                    idx = end + 1;
                }
                Command::End => {
                    return Err(wrap(Error::BatchGrammar {
                        line: line.number,
                        message: "'end' without a matching 'foreach'".to_string(),
                    }));
                }
                other => {
                    input = self.execute(other, input).map_err(wrap)?;
                    idx += 1;
                }
            }
        }
        Ok(input)
    }

    fn parse_line(&self, line: &Line) -> Result<Command> {
        let keyword = line.keyword();
        // print takes its text whole, and a macro keyword may expand to several words
        if keyword == "print" || keyword.contains("${") {
            let expanded = expand(&line.text, &*self.ctx)?;
            debug!("[{}] {}", line.number, expanded);
            return Command::parse(&expanded, line.number);
        }
        let words = tokenize(&line.text, line.number)?
            .iter()
            .map(|word| expand(word, &*self.ctx))
            .collect::<Result<Vec<_>>>()?;
        debug!("[{}] {}", line.number, words.join(" "));
        Command::from_words(&words, line.number)
    }

    /// Run `body` once per item of `input`, collecting the results.
    ///
    /// The enclosing loop's variables are put back afterwards, whether the
    /// body succeeded or not.
    fn run_foreach(&mut self, body: &[Line], input: Value) -> Result<Value> {
        let items: Vec<(String, Value)> = match untagged(input) {
            Value::Sequence(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| (idx.to_string(), item))
                .collect(),
            Value::Mapping(map) => map
                .into_iter()
                .map(|(key, item)| Ok((text_of(&key)?, item)))
                .collect::<Result<_>>()?,
            other => {
                return Err(Error::MatchSemantic {
                    message: format!("cannot loop over a {}", type_name(&other)),
                })
            }
        };

        let saved = self.ctx.replace_loop_scope(LoopScope::new());
        let results = self.iterate(body, items);
        self.ctx.replace_loop_scope(saved);
        Ok(Value::Sequence(results?))
    }

    fn iterate(&mut self, body: &[Line], items: Vec<(String, Value)>) -> Result<Vec<Value>> {
        let mut results = Vec::with_capacity(items.len());
        for (index, (key, item)) in items.into_iter().enumerate() {
            self.ctx.enter_iteration(index, &key, &text_of(&item)?);
            results.push(self.run_lines(body, item)?);
        }
        Ok(results)
    }

    fn execute(&mut self, command: Command, input: Value) -> Result<Value> {
        match command {
            Command::MakeRoot(None) => Ok(Value::Mapping(Mapping::new())),
            Command::MakeRoot(Some(reference)) | Command::UseAsInput(reference) => {
                self.ctx.load(&reference)
            }
            Command::SubBatch(reference) => self.run_sub_batch(&reference, input),
            Command::LoadProperties {
                namespace,
                reference,
            } => {
                let properties = self.ctx.load(&reference)?;
                self.ctx.load_properties(&namespace, &properties)?;
                Ok(input)
            }
            Command::SaveTo(reference) => {
                self.ctx.save(&reference, &input)?;
                Ok(input)
            }
            Command::SetProperty { key, value } => {
                self.ctx.set_global(&key, &value);
                Ok(input)
            }
            Command::Print(text) => {
                if text == "-" {
                    let rendered =
                        codec::to_string(&input, Format::Yaml, self.ctx.options.backend)?;
                    self.out.write_all(rendered.as_bytes())?;
                } else {
                    writeln!(self.out, "{}", text)?;
                }
                Ok(input)
            }
            Command::UseYamlLibrary(backend) => {
                debug!("Switching YAML library to {}", backend);
                self.ctx.options.backend = backend;
                Ok(input)
            }
            Command::Verbose(on) => {
                log::set_max_level(if on {
                    LevelFilter::Debug.max(self.base_level)
                } else {
                    self.base_level
                });
                Ok(input)
            }
            Command::Sleep(duration) => {
                debug!("Sleeping for {:?}", duration);
                std::thread::sleep(duration);
                Ok(input)
            }
            Command::ExpandTree => expand_tree(&input, &*self.ctx),
            Command::Yaml(yaml) => self.run_yaml(yaml, input),
            Command::Foreach | Command::End => Err(Error::BatchGrammar {
                line: 0,
                message: "loop commands cannot be executed on their own".to_string(),
            }),
        }
    }

    /// Run another script file on the current input. Its relative references
    /// resolve against its own directory.
    fn run_sub_batch(&mut self, reference: &str, input: Value) -> Result<Value> {
        let path = reference.strip_prefix('@').unwrap_or(reference);
        let resolved = self.ctx.resolve_path(path);
        let script = Script::load(&resolved)?;
        info!("Running sub-script '{}'", resolved.display());

        let base_dir = resolved.parent().map(|dir| dir.to_path_buf()).unwrap_or_default();
        let saved = std::mem::replace(&mut self.ctx.options.base_dir, base_dir);
        let result = self.run_lines(script.lines(), input);
        self.ctx.options.base_dir = saved;
        result
    }

    fn run_yaml(&mut self, yaml: YamlCommand, input: Value) -> Result<Value> {
        let delimiter = yaml
            .delimiter
            .unwrap_or_else(|| self.ctx.options.delimiter.clone());
        let path = YamlPath::compile(&yaml.pattern, &delimiter)?;
        let argument = yaml.argument.unwrap_or_default();
        let verb = match yaml.verb.as_str() {
            "read" => Verb::Read,
            "list" => Verb::List,
            "delete" => Verb::Delete,
            "insert" => Verb::Insert(self.ctx.load(&argument)?),
            "replace" => Verb::Replace(self.ctx.load(&argument)?),
            "table" => {
                let columns = columns(&argument);
                if columns.is_empty() {
                    return Err(Error::BatchGrammar {
                        line: 0,
                        message: "'yaml table' needs at least one column".to_string(),
                    });
                }
                Verb::Table(columns)
            }
            other => {
                return Err(Error::BatchGrammar {
                    line: 0,
                    message: format!("unknown yaml verb '{}'", other),
                })
            }
        };
        operators::apply(input, verb, &path, &self.ctx.options.list_delimiter)
    }
}

fn untagged(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => untagged(tagged.value),
        other => other,
    }
}

/// Scalar text, or compact JSON for collections.
fn text_of(value: &Value) -> Result<String> {
    match scalar_text(value) {
        Some(text) => Ok(text),
        None => Ok(serde_json::to_string(value)?),
    }
}
