//! Batch scripts
//!
//! A batch script strings document operations together:
//!
//! ```text
//! useAsInput @openapi.yaml
//! yaml delete --yamlpath paths.**.responses.*.headers
//! saveAs !clean
//! yaml list --yamlpath paths.*.*.operationId
//! foreach
//! print ${BATCH::index}: ${BATCH::value}
//! end
//! useAsInput !clean
//! saveTo @clean.yaml
//! ```
//!
//! [`script`] reads and parses the text, [`interpreter`] runs it.

pub mod interpreter;
pub mod script;

pub use interpreter::Interpreter;
pub use script::{find_matching_end, Command, Line, Script};

use serde_yaml::Value;

use crate::context::Context;
use crate::error::Result;

/// Run `script` on `input`, printing to standard output.
pub fn run(script: &Script, input: Value, ctx: &mut Context) -> Result<Value> {
    let mut stdout = std::io::stdout().lock();
    Interpreter::new(ctx, &mut stdout).run(script, input)
}
