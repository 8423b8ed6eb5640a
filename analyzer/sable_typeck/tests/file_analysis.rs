use indoc::indoc;
use insta::assert_snapshot;
use sable_ast::{expr::Comparison, stmt::Stmt, AstBuilder};
use sable_diagnostics::{IssueBuffer, ReportLevel};
use sable_typeck::{
    codebase::{scan_file, Codebase},
    config::AnalysisConfig,
    typeck::{analyze_file, FileAnalysis},
};

/// Print analyzer traces when `RUST_LOG` asks for them
fn init_tracing() {
    drop(
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init(),
    );
}

/// Scan and check `stmts` as one file, reporting into `buffer`
fn analyze(stmts: Vec<Stmt>, buffer: &mut IssueBuffer) -> FileAnalysis {
    init_tracing();
    let b = AstBuilder::new();
    let file = b.file("index.php", stmts);
    let config = AnalysisConfig::default();
    let mut codebase = Codebase::new();
    scan_file(&file, &mut codebase, &config, buffer);
    analyze_file(&file, &codebase, &config, buffer)
}

/// The rendered type of `var_id` at the end of `function`
fn type_in(analysis: &FileAnalysis, function: &str, var_id: &str) -> Option<String> {
    analysis
        .function_contexts
        .get(function)
        .and_then(|context| context.get(var_id))
        .map(ToString::to_string)
}

#[test]
fn branches_and_loops_flow_into_functions() {
    let b = AstBuilder::new();
    let f = b
        .function("f")
        .with_param(b.param("flag").typed("bool"))
        .with_param(b.param("maybe").typed("?stdClass"))
        .returning("void")
        .with_body(vec![
            b.if_(
                b.var("flag"),
                vec![b.assign_stmt(b.var("x"), b.int(1))],
                Some(vec![b.assign_stmt(b.var("x"), b.string("a"))]),
            ),
            b.for_(
                vec![b.assign(b.var("i"), b.int(0))],
                vec![b.compare(Comparison::Lt, b.var("i"), b.int(10))],
                vec![b.post_inc(b.var("i"))],
                vec![b.assign_stmt(b.var("y"), b.var("i"))],
            ),
            b.if_(
                b.isset(vec![b.var("maybe")]),
                vec![b.assign_stmt(b.var("known"), b.var("maybe"))],
                None,
            ),
        ]);
    let mut buffer = IssueBuffer::new().with_hard_stop_on_error(false);
    let analysis = analyze(vec![b.function_stmt(f)], &mut buffer);

    assert!(buffer.names().is_empty(), "{:?}", buffer.names());
    assert!(!analysis.stopped);
    assert_eq!(type_in(&analysis, "f", "$x").as_deref(), Some("int(1)|string(a)"));
    assert_eq!(type_in(&analysis, "f", "$known").as_deref(), Some("stdClass"));

    let context = &analysis.function_contexts["f"];
    let x = context.get("$x").expect("$x is bound in both branches");
    assert_eq!(x.generalize_literals().to_string(), "int|string");
    assert!(!x.possibly_undefined);
    let y = context.get("$y").expect("$y may be bound by the loop");
    assert!(y.has_int());
    assert!(y.possibly_undefined);
    assert!(context.get("$known").is_some_and(|ty| ty.possibly_undefined));
}

#[test]
fn top_level_code_is_checked_in_order() {
    let b = AstBuilder::new();
    let stmts = vec![
        b.assign_stmt(
            b.var("arr"),
            b.shape(vec![("x", b.int(1)), ("y", b.string("s"))]),
        ),
        b.assign_stmt(b.var("v"), b.dim(b.var("arr"), b.string("x"))),
        b.assign_stmt(b.var("w"), b.dim(b.var("arr"), b.string("z"))),
    ];
    let mut buffer = IssueBuffer::new().with_hard_stop_on_error(false);
    let analysis = analyze(stmts, &mut buffer);

    assert_eq!(buffer.names(), vec!["UndefinedArrayOffset"]);
    assert_eq!(
        analysis.context.get("$v").map(ToString::to_string).as_deref(),
        Some("int(1)")
    );
    assert!(analysis.stats.non_mixed_count > 0);
}

#[test]
fn hard_stops_leave_the_rest_of_the_file_checked() {
    let b = AstBuilder::new();
    let broken = b
        .function("broken")
        .with_body(vec![b.expr_stmt(b.var("nope"))]);
    let fine = b
        .function("fine")
        .returning("int")
        .with_body(vec![b.ret(Some(b.string("one")))]);
    let mut buffer = IssueBuffer::new();
    let analysis = analyze(
        vec![b.function_stmt(broken), b.function_stmt(fine)],
        &mut buffer,
    );

    assert!(analysis.stopped);
    assert!(buffer.has_errors());
    assert_eq!(buffer.names(), vec!["UndefinedVariable", "InvalidReturnType"]);
}

#[test]
fn report_levels_filter_issues() {
    let b = AstBuilder::new();
    let stmts = vec![
        b.expr_stmt(b.var("nope")),
        b.expr_stmt(b.call("missing", vec![])),
    ];
    let mut buffer = IssueBuffer::new()
        .with_level("UndefinedVariable", ReportLevel::Suppress)
        .with_level("UndefinedFunction", ReportLevel::Info);
    let analysis = analyze(stmts, &mut buffer);

    assert!(!analysis.stopped);
    assert!(!buffer.has_errors());
    assert_eq!(buffer.names(), vec!["UndefinedFunction"]);
}

#[test]
fn diagnostics_name_the_types_involved() {
    let b = AstBuilder::new();
    let wrong = b
        .function("wrong")
        .returning("string")
        .with_body(vec![b.ret(Some(b.int(1)))]);
    let nullable = b
        .function("nullable")
        .returning("stdClass")
        .with_body(vec![b.ret(Some(b.null()))]);
    let mut buffer = IssueBuffer::new().with_hard_stop_on_error(false);
    analyze(
        vec![
            b.function_stmt(wrong),
            b.function_stmt(nullable),
            b.echo(vec![b.var("nope")]),
        ],
        &mut buffer,
    );

    let rendered = buffer
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    assert_eq!(
        rendered,
        indoc! {"
            error[InvalidReturnType]: the declared return type `string` for `wrong` is incorrect, got `int(1)`
            error[NullableReturnStatement]: the declared return type `stdClass` for `nullable` is not nullable, but the inferred type `null` is
            error[UndefinedVariable]: cannot find referenced variable `$nope`"}
    );
    assert_snapshot!(&buffer.diagnostics()[2].file_path, @"index.php");
}
