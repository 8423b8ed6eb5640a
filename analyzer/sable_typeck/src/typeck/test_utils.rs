//! Shorthands for checking hand-built statements in tests

use indexmap::IndexMap;
use sable_ast::stmt::Stmt;
use sable_diagnostics::{Diagnostic, IssueBuffer};

use super::{analyzer::Analyzer, block::analyze_stmts, context::Context};
use crate::{
    codebase::{scan_stmts, Codebase},
    config::AnalysisConfig,
};

/// What checking some statements found
pub struct Checked {
    /// The top-level context afterwards
    pub context: Context,
    /// The final context of every function-like body, by display name
    pub function_contexts: IndexMap<String, Context>,
    /// Every reported diagnostic
    pub diagnostics: Vec<Diagnostic>,
}

impl Checked {
    /// The names of the reported issues, in report order
    pub fn issues(&self) -> Vec<&'static str> {
        self.diagnostics.iter().map(Diagnostic::name).collect()
    }

    /// The rendered type of a top-level variable
    pub fn type_of(&self, var_id: &str) -> Option<String> {
        self.context.get(var_id).map(ToString::to_string)
    }

    /// The rendered type of a variable at the end of a function-like body
    pub fn type_in(&self, function: &str, var_id: &str) -> Option<String> {
        self.function_contexts
            .get(function)
            .and_then(|context| context.get(var_id))
            .map(ToString::to_string)
    }
}

/// Scan `stmts` on top of the builtins, then check them as a file body.
/// Issues never stop the check.
pub fn check(stmts: &[Stmt]) -> Checked {
    check_with_config(stmts, &AnalysisConfig::default())
}

/// [`check`] with non-default toggles
pub fn check_with_config(stmts: &[Stmt], config: &AnalysisConfig) -> Checked {
    let mut codebase = Codebase::new();
    let mut buffer = IssueBuffer::new().with_hard_stop_on_error(false);
    scan_stmts(stmts, "test.php", &mut codebase, config, &mut buffer);

    let mut analyzer = Analyzer::new(&codebase, config, "test.php", &mut buffer);
    let mut context = Context::new(None);
    analyze_stmts(&mut analyzer, &mut context, stmts).expect("hard stops are disabled");
    let function_contexts = std::mem::take(&mut analyzer.function_contexts);
    drop(analyzer);

    Checked {
        context,
        function_contexts,
        diagnostics: buffer.into_diagnostics(),
    }
}
