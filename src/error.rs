use std::{io, path::PathBuf};

use thiserror::Error;

use crate::ModuleId;

/// Failure while rewriting a single module's source text.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("syntax error: {}", .messages.join("; "))]
    Parse { messages: Vec<String> },

    #[error("line {line}: `require` expects a single string literal argument, found `{found}`")]
    ArgumentShape { line: usize, found: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read module {}", .path.display())]
    Resolution {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("in {}: {source}", .path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: RewriteError,
    },

    #[error("dependency cycle: {}", .chain.join(" -> "))]
    Cycle { chain: Vec<ModuleId> },

    #[error("failed to read config at {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config at {}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config at {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("bundle template is invalid")]
    Template(#[from] handlebars::TemplateError),

    #[error("failed to render bundle")]
    Render(#[from] handlebars::RenderError),

    #[error("failed to write bundle to {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
