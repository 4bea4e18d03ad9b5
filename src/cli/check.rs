//! Run fql commands against a query definition

use serde_json::json;
use tracing::debug;

use super::CliError;
use crate::definition::load_query;

/// What to do with a loaded definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print the canonical text of the query
    Render,
    /// Print left / op / right of every leaf constraint
    Decompose,
    /// Only validate the definition
    Check,
}

/// Options for a command
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// JSON definition text
    pub input: Option<String>,
    /// Pretty-print JSON output
    pub pretty: bool,
}

/// Execute a command and return the text to print
pub fn execute(command: Command, options: &CommandOptions) -> Result<String, CliError> {
    let input = options.input.as_ref().ok_or(CliError::NoInput)?;
    let query = load_query(input)?;
    debug!(?command, "loaded definition");

    match command {
        Command::Check => Ok("Query is valid".to_string()),
        Command::Render => Ok(query.to_canonical()?),
        Command::Decompose => {
            let mut lines = Vec::new();
            for id in query.leaves(query.root())? {
                let parts = query.decompose(id)?.ok_or_else(|| {
                    crate::QueryError::unsupported("decomposition", "constraint set")
                })?;
                let entry = json!({
                    "constraint": parts.to_string(),
                    "left": parts.left(),
                    "op": parts.op(),
                    "right": parts.right(),
                });
                lines.push(if options.pretty {
                    serde_json::to_string_pretty(&entry)?
                } else {
                    serde_json::to_string(&entry)?
                });
            }
            Ok(lines.join("\n"))
        }
    }
}
