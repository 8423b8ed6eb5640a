//! Sable flow-sensitive type checker
//!
//! [`analyze_file`] walks one file's statements in order, tracking what is
//! known about every variable in a [`Context`]. Function, method and closure
//! bodies are checked in their own contexts and their returns are compared
//! with their declared return types.

mod algebra;
mod analyzer;
mod block;
mod context;
mod expr;
mod function;
mod return_type;
#[cfg(test)]
mod test_utils;
mod var_id;

pub use algebra::{Assertion, Clause};
pub use analyzer::{AnalysisStats, AnalysisStop, NodeTypes};
pub use context::Context;
use indexmap::IndexMap;
use sable_ast::File;
use sable_diagnostics::IssueSink;
use tracing::{debug, debug_span};

use self::{analyzer::Analyzer, block::analyze_stmts};
use crate::{codebase::Codebase, config::AnalysisConfig};

/// What checking one file found, besides the diagnostics sent to the sink
#[derive(Debug)]
pub struct FileAnalysis {
    /// The inferred type of every checked expression
    pub node_types: NodeTypes,
    /// The context at the end of the file's top-level code
    pub context: Context,
    /// The context at the end of every function-like body, by display name
    pub function_contexts: IndexMap<String, Context>,
    /// How precisely expressions were typed
    pub stats: AnalysisStats,
    /// Whether a hard stop abandoned part of the file
    pub stopped: bool,
}

/// Type check `file` against `codebase`, reporting issues to `sink`
///
/// `codebase` must already hold the file's own declarations; see
/// [`crate::codebase::scan_file`]. A hard stop abandons the function body or
/// top-level code it happened in and the rest of the file is still checked.
pub fn analyze_file(
    file: &File,
    codebase: &Codebase,
    config: &AnalysisConfig,
    sink: &mut dyn IssueSink,
) -> FileAnalysis {
    let _span = debug_span!("analyze_file", path = %file.path).entered();

    let mut analyzer = Analyzer::new(codebase, config, &file.path, sink);
    let mut context = Context::new(None);
    context.check_variables = config.check_variables;
    if analyze_stmts(&mut analyzer, &mut context, &file.stmts).is_err() {
        debug!(path = %file.path, "top-level code abandoned after hard stop");
        analyzer.stopped = true;
    }

    FileAnalysis {
        node_types: analyzer.node_types,
        context,
        function_contexts: analyzer.function_contexts,
        stats: analyzer.stats,
        stopped: analyzer.stopped,
    }
}
