//! State shared by the expression and statement checkers while one file is
//! analyzed

use indexmap::IndexMap;
use sable_ast::{expr::Expr, NodeId};
use sable_diagnostics::{IssueKind, IssueSink};
use sable_utils::span::{Span, Spanned};
use thiserror::Error;
use tracing::debug;

use super::{algebra::FormulaBuilder, context::Context};
use crate::{
    codebase::{Codebase, FunctionLikeStorage},
    config::AnalysisConfig,
    types::{ExpandContext, Union},
};

/// The issue sink asked for the current check to stop
///
/// Returned up the call chain with `?` until the enclosing function body or
/// the file's top-level code gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("analysis stopped by a hard-stop diagnostic")]
pub struct AnalysisStop;

/// The result of a check that a hard-stop diagnostic may abandon
pub type AnalysisResult<T = ()> = Result<T, AnalysisStop>;

/// The inferred type of every analyzed expression, keyed by node id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTypes {
    /// Types by node
    types: IndexMap<NodeId, Union>,
}

impl NodeTypes {
    /// The type inferred for a node, if it was analyzed
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Union> {
        self.types.get(&id)
    }

    /// Record the type inferred for a node. A node analyzed more than once
    /// (in a loop, or in both branches of a merge) keeps the latest type.
    pub fn set(&mut self, id: NodeId, ty: Union) {
        self.types.insert(id, ty);
    }

    /// How many nodes have a type
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no node has a type
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Counts of how precisely expressions were typed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    /// Expressions inferred as `mixed`
    pub mixed_count: usize,
    /// Expressions with a more precise type
    pub non_mixed_count: usize,
}

/// What a `break` or `continue` leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakTarget {
    /// A loop; `continue` goes to the next iteration
    Loop,
    /// A `switch`; `continue` acts like `break`
    Switch,
}

/// The contexts that left a loop or switch early
#[derive(Debug)]
pub struct BreakScope {
    /// What the scope is
    pub target: BreakTarget,
    /// The state at every `break` targeting this scope
    pub break_contexts: Vec<Context>,
    /// The state at every `continue` targeting this scope
    pub continue_contexts: Vec<Context>,
}

impl BreakScope {
    /// A scope nothing has left yet
    #[must_use]
    pub const fn new(target: BreakTarget) -> Self {
        Self {
            target,
            break_contexts: vec![],
            continue_contexts: vec![],
        }
    }
}

/// The function-like body currently being analyzed
#[derive(Debug, Clone)]
pub struct FunctionScope {
    /// Its signature
    pub storage: FunctionLikeStorage,
    /// The type and location of every `return`
    pub returns: Vec<(Union, Span)>,
    /// The key and value type of every `yield`
    pub yields: Vec<(Union, Union)>,
}

impl FunctionScope {
    /// A body nothing has been found in yet
    #[must_use]
    pub const fn new(storage: FunctionLikeStorage) -> Self {
        Self {
            storage,
            returns: vec![],
            yields: vec![],
        }
    }
}

/// The checker state for one file
pub struct Analyzer<'a> {
    /// Declared symbols
    pub codebase: &'a Codebase,
    /// Analysis toggles
    pub config: &'a AnalysisConfig,
    /// The path of the file being analyzed
    pub file_path: &'a str,
    /// Where issues go
    sink: &'a mut dyn IssueSink,
    /// Inferred expression types
    pub node_types: NodeTypes,
    /// Precision counts
    pub stats: AnalysisStats,
    /// The function-like body being analyzed, if any
    pub function: Option<FunctionScope>,
    /// The loops and switches enclosing the current statement, innermost last
    pub break_scopes: Vec<BreakScope>,
    /// The context at the end of every analyzed function-like body, keyed by
    /// display name
    pub function_contexts: IndexMap<String, Context>,
    /// Whether a hard stop abandoned part of the file
    pub stopped: bool,
    /// While non-zero, issues are dropped: the code is being walked only to
    /// find a loop's fixed point
    muted: usize,
}

impl<'a> Analyzer<'a> {
    /// A fresh analyzer for one file
    pub fn new(
        codebase: &'a Codebase,
        config: &'a AnalysisConfig,
        file_path: &'a str,
        sink: &'a mut dyn IssueSink,
    ) -> Self {
        Self {
            codebase,
            config,
            file_path,
            sink,
            node_types: NodeTypes::default(),
            stats: AnalysisStats::default(),
            function: None,
            break_scopes: vec![],
            function_contexts: IndexMap::new(),
            stopped: false,
            muted: 0,
        }
    }

    /// Report an issue found at `span`
    ///
    /// # Errors
    /// Returns [`AnalysisStop`] when the sink asks for a hard stop.
    pub fn report(&mut self, issue: IssueKind, span: Span) -> AnalysisResult {
        if self.muted > 0 {
            return Ok(());
        }
        if self
            .function
            .as_ref()
            .is_some_and(|function| function.storage.suppresses(issue.name()))
        {
            return Ok(());
        }
        let name = issue.name();
        if self.sink.report(issue.at(span), self.file_path) {
            debug!(issue = name, line = span.line(), "hard stop");
            return Err(AnalysisStop);
        }
        Ok(())
    }

    /// Report issues that carry their own locations
    ///
    /// # Errors
    /// Returns [`AnalysisStop`] when the sink asks for a hard stop.
    pub fn report_all(&mut self, issues: Vec<Spanned<IssueKind>>) -> AnalysisResult {
        for issue in issues {
            let span = issue.span();
            self.report(issue.into_value(), span)?;
        }
        Ok(())
    }

    /// Run `check` with reporting turned off
    pub fn muted<T>(&mut self, check: impl FnOnce(&mut Self) -> T) -> T {
        self.muted += 1;
        let result = check(self);
        self.muted -= 1;
        result
    }

    /// Record the type inferred for `expr`
    pub fn set_expr_type(&mut self, expr: &Expr, ty: &Union) {
        if !self.is_muted() {
            if ty.is_mixed() {
                self.stats.mixed_count += 1;
            } else {
                self.stats.non_mixed_count += 1;
            }
        }
        self.node_types.set(expr.id, ty.clone());
    }

    /// The type already inferred for `expr`
    #[must_use]
    pub fn expr_type(&self, expr: &Expr) -> Option<&Union> {
        self.node_types.get(expr.id)
    }

    /// Whether issues are currently dropped
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted > 0
    }

    /// Derives formulas for conditions analyzed in `context`
    #[must_use]
    pub fn formula_builder<'s>(&'s self, context: &'s Context) -> FormulaBuilder<'s> {
        FormulaBuilder {
            codebase: self.codebase,
            node_types: &self.node_types,
            self_class: context.self_class.as_deref(),
            parent_class: context.parent_class.as_deref(),
            memoize_method_calls: self.config.memoize_method_calls,
        }
    }
}

/// What `self`, `static` and `parent` mean in `context`
#[must_use]
pub fn expand_context(context: &Context) -> ExpandContext<'_> {
    ExpandContext {
        self_class: context.self_class.as_deref(),
        static_class: context.static_class.as_deref(),
        parent_class: context.parent_class.as_deref(),
        templates: None,
    }
}

#[cfg(test)]
mod tests {
    use sable_diagnostics::IssueBuffer;
    use sable_utils::span::Span;

    use super::*;

    #[test]
    fn muted_issues_are_dropped() {
        let codebase = Codebase::new_empty();
        let config = AnalysisConfig::default();
        let mut buffer = IssueBuffer::new();
        let mut analyzer = Analyzer::new(&codebase, &config, "a.php", &mut buffer);
        let span = Span::from_positions(0, 2);

        let muted = analyzer.muted(|analyzer| {
            analyzer.report(IssueKind::UndefinedVariable("$a".to_string()), span)
        });
        assert_eq!(muted, Ok(()));
        assert_eq!(
            analyzer.report(IssueKind::UndefinedVariable("$a".to_string()), span),
            Err(AnalysisStop)
        );
        drop(analyzer);
        assert_eq!(buffer.names(), vec!["UndefinedVariable"]);
    }

    #[test]
    fn suppressed_issues_stay_out_of_the_sink() {
        let codebase = Codebase::new_empty();
        let config = AnalysisConfig::default();
        let mut buffer = IssueBuffer::new();
        let mut analyzer = Analyzer::new(&codebase, &config, "a.php", &mut buffer);
        let span = Span::from_positions(0, 2);
        let mut storage = FunctionLikeStorage::new("f", span);
        storage.suppressed_issues.push("UndefinedVariable".to_string());
        analyzer.function = Some(FunctionScope::new(storage));

        assert_eq!(
            analyzer.report(IssueKind::UndefinedVariable("$a".to_string()), span),
            Ok(())
        );
        drop(analyzer);
        assert!(buffer.diagnostics().is_empty());
    }
}
