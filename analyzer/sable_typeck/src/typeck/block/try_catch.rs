//! for `try`/`catch`/`finally`

use sable_ast::stmt::{Catch, Stmt};
use sable_diagnostics::IssueKind;
use sable_utils::names::strip_leading_separator;

use super::{analyze_stmts, can_fall_through};
use crate::{
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
    },
    types::{combine_atomics, Atomic},
};

/// `try { body } catch (...) { ... } finally { ... }`
///
/// Any statement of the body may throw, so a catch block starts from the
/// state before the `try` with everything the body assigned folded in as
/// possibly assigned. The `finally` block is checked in the merge of every
/// block that falls through, or in the catch entry state when none does.
pub fn analyze_try(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    body: &[Stmt],
    catches: &[Catch],
    finally: Option<&[Stmt]>,
) -> AnalysisResult {
    let pre = context.clone();

    let mut try_context = context.fork();
    try_context.assigned_var_ids.clear();
    analyze_stmts(analyzer, &mut try_context, body)?;

    let mut catch_entry = pre.clone();
    catch_entry.absorb_possible_path(&try_context);

    let mut exits = vec![];
    if can_fall_through(body) {
        exits.push(try_context);
    }

    for catch in catches {
        let mut catch_context = catch_entry.clone();
        let mut caught = vec![];
        for class in &catch.types {
            let name = strip_leading_separator(class.value());
            match analyzer.codebase.get_class(name) {
                Some(storage) => caught.push(Atomic::named(&storage.name)),
                None => {
                    analyzer.report(IssueKind::UndefinedClass(name.to_string()), class.span())?;
                    caught.push(Atomic::named(name));
                }
            }
        }
        if let Some(var) = &catch.var {
            catch_context.set(&format!("${}", var.value()), combine_atomics(caught));
        }

        analyze_stmts(analyzer, &mut catch_context, &catch.body)?;
        if can_fall_through(&catch.body) {
            exits.push(catch_context);
        }
    }

    let mut after = if exits.is_empty() {
        catch_entry
    } else {
        Context::merge_branches(&pre, &exits.iter().collect::<Vec<_>>())
    };
    if let Some(finally) = finally {
        analyze_stmts(analyzer, &mut after, finally)?;
    }
    *context = after;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sable_ast::AstBuilder;
    use sable_diagnostics::IssueBuffer;

    use super::*;
    use crate::{codebase::Codebase, config::AnalysisConfig, types::Union};

    fn run(context: &mut Context, stmts: &[Stmt]) -> Vec<&'static str> {
        let codebase = Codebase::new();
        let config = AnalysisConfig::default();
        let mut buffer = IssueBuffer::new().with_hard_stop_on_error(false);
        let mut analyzer = Analyzer::new(&codebase, &config, "test.php", &mut buffer);
        analyze_stmts(&mut analyzer, context, stmts).expect("no hard stops");
        drop(analyzer);
        buffer.names()
    }

    #[test]
    fn assignments_in_the_body_are_possible_in_catch_blocks() {
        let b = AstBuilder::new();
        let mut context = Context::new(None);
        let stmts = vec![b.try_catch(
            vec![b.assign_stmt(b.var("a"), b.int(1))],
            vec![b.catch(
                &["Exception"],
                Some("e"),
                vec![b.assign_stmt(b.var("m"), b.method_call(b.var("e"), "getMessage", vec![]))],
            )],
            None,
        )];
        assert!(run(&mut context, &stmts).is_empty());
        assert!(context.get("$a").is_some_and(|ty| ty.possibly_undefined));
        assert!(context.get("$m").is_some_and(|ty| ty.possibly_undefined && ty.is_string()));
    }

    #[test]
    fn catch_blocks_that_rethrow_do_not_merge() {
        let b = AstBuilder::new();
        let mut context = Context::new(None);
        let stmts = vec![b.try_catch(
            vec![b.assign_stmt(b.var("a"), b.int(1))],
            vec![b.catch(&["Exception"], Some("e"), vec![b.throw(b.var("e"))])],
            Some(vec![b.assign_stmt(b.var("f"), b.bool(true))]),
        )];
        assert!(run(&mut context, &stmts).is_empty());
        assert_eq!(context.get("$a"), Some(&Union::from(Atomic::LiteralInt(1))));
        assert!(context.has_variable("$f"));
    }

    #[test]
    fn unknown_catch_types_are_reported() {
        let b = AstBuilder::new();
        let mut context = Context::new(None);
        let stmts = vec![b.try_catch(
            vec![],
            vec![b.catch(&["NoSuchException"], None, vec![])],
            None,
        )];
        assert_eq!(run(&mut context, &stmts), vec!["UndefinedClass"]);
    }
}
