//! for variable reads, array offsets, `isset` and `empty`

use sable_ast::expr::Expr;
use sable_diagnostics::IssueKind;
use sable_utils::{names::is_superglobal, span::Span};

use super::{
    analyze_expr,
    helpers::{describe, var_id_of},
    superglobal_type,
};
use crate::{
    typeck::{
        analyzer::{AnalysisResult, Analyzer},
        context::Context,
    },
    types::{
        combine_many, comparator::is_contained_by, generalize_shape,
        template::get_ancestor_type_params, Atomic, ShapeKey, Union,
    },
};

/// `$name`
pub fn analyze_variable(
    analyzer: &mut Analyzer<'_>,
    context: &Context,
    span: Span,
    name: &str,
) -> AnalysisResult<Union> {
    if name == "this" && (context.self_class.is_none() || context.is_static) {
        let where_ = if context.is_static { "static" } else { "non-class" };
        analyzer.report(IssueKind::InvalidScope(where_.to_string()), span)?;
        return Ok(Union::mixed());
    }
    if is_superglobal(name) {
        return Ok(superglobal_type(name));
    }

    let var_id = format!("${name}");
    match context.get(&var_id) {
        Some(ty) => {
            if ty.possibly_undefined && !context.inside_isset {
                analyzer.report(IssueKind::PossiblyUndefinedVariable(var_id), span)?;
            }
            Ok(ty.clone().possibly_undefined(false))
        }
        None if context.inside_isset => Ok(Union::null()),
        None if !context.check_variables || !analyzer.config.check_variables => {
            Ok(Union::mixed())
        }
        None => {
            analyzer.report(IssueKind::UndefinedVariable(var_id), span)?;
            Ok(Union::mixed())
        }
    }
}

/// The shape key a literal offset type names
pub fn literal_key(offset: &Union) -> Option<ShapeKey> {
    offset
        .get_single_literal_int()
        .map(ShapeKey::Int)
        .or_else(|| offset.get_single_literal_string().map(ShapeKey::from_string))
}

/// `$a[$k]`
///
/// Each alternative of the container type is accessed on its own and the
/// results are combined. A location already narrowed in `context` keeps
/// its narrowed type.
pub fn analyze_array_fetch(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    expr: &Expr,
    base: &Expr,
    dim: Option<&Expr>,
) -> AnalysisResult<Union> {
    let base_type = analyze_expr(analyzer, context, base)?;
    let Some(dim) = dim else {
        return Ok(Union::mixed());
    };
    let was_inside_isset = context.inside_isset;
    context.inside_isset = false;
    let dim_type = analyze_expr(analyzer, context, dim);
    context.inside_isset = was_inside_isset;
    let dim_type = dim_type?;

    if let Some(cached) = var_id_of(analyzer, context, expr).and_then(|id| context.get(&id)) {
        return Ok(cached.clone().possibly_undefined(false));
    }

    let fetch = ArrayFetch {
        container: describe(analyzer, context, base),
        offset: &dim_type,
        key: literal_key(&dim_type),
        span: expr.span(),
        inside_isset: context.inside_isset,
    };
    let mut results = vec![];
    for atomic in base_type.atomics() {
        if let Some(ty) = fetch.fetch_from(analyzer, atomic)? {
            results.push(ty);
        }
    }

    if base_type.is_nullable() && !context.inside_isset {
        let issue = if base_type.is_null() {
            IssueKind::NullArrayAccess(fetch.container.clone())
        } else {
            IssueKind::PossiblyNullArrayAccess(fetch.container.clone())
        };
        analyzer.report(issue, base.span())?;
    }

    Ok(if results.is_empty() {
        Union::mixed()
    } else {
        combine_many(&results)
    })
}

/// One array read, applied to each alternative of the container
struct ArrayFetch<'a> {
    /// How the container is named in diagnostics
    container: String,
    /// The offset type
    offset: &'a Union,
    /// The offset, when it is a single literal
    key: Option<ShapeKey>,
    /// The whole access
    span: Span,
    /// Whether a missing offset is expected
    inside_isset: bool,
}

impl ArrayFetch<'_> {
    /// The value read from one container alternative. `None` contributes
    /// nothing to the result.
    fn fetch_from(&self, analyzer: &mut Analyzer<'_>, atomic: &Atomic) -> AnalysisResult<Option<Union>> {
        Ok(Some(match atomic {
            Atomic::Null => Union::null(),
            Atomic::Empty => return Ok(None),
            Atomic::Mixed => {
                if !self.inside_isset {
                    analyzer.report(IssueKind::MixedArrayAccess(self.container.clone()), self.span)?;
                }
                Union::mixed()
            }
            Atomic::GenericParam { .. } => Union::mixed(),
            Atomic::Array { key, value, .. } => {
                if key.is_empty_type() {
                    self.report_missing_offset(analyzer)?;
                    return Ok(Some(Union::null()));
                }
                self.check_offset(analyzer, key)?;
                let mut value = (**value).clone();
                if self.inside_isset {
                    value.add(Atomic::Null);
                }
                value
            }
            Atomic::ObjectShape { properties, sealed } => match &self.key {
                Some(key) => match properties.get(key) {
                    Some(value) => {
                        if value.possibly_undefined && !self.inside_isset {
                            analyzer.report(
                                IssueKind::PossiblyUndefinedArrayOffset(format!(
                                    "{}[{}]",
                                    self.container,
                                    offset_display(key)
                                )),
                                self.span,
                            )?;
                        }
                        value.clone().possibly_undefined(false)
                    }
                    None if *sealed => {
                        self.report_missing_offset(analyzer)?;
                        Union::null()
                    }
                    None => Union::mixed(),
                },
                None => return self.fetch_from(analyzer, &generalize_shape(atomic)),
            },
            atomic if atomic.is_string() => self.fetch_from_string(analyzer, atomic)?,
            Atomic::NamedObject { name, .. } => {
                match get_ancestor_type_params(analyzer.codebase, atomic, "ArrayAccess") {
                    Some(params) if params.len() == 2 => params[1].clone(),
                    _ => {
                        analyzer.report(IssueKind::InvalidArrayAccess(name.clone()), self.span)?;
                        Union::mixed()
                    }
                }
            }
            Atomic::False => Union::null(),
            other => {
                analyzer.report(IssueKind::InvalidArrayAccess(other.get_id()), self.span)?;
                Union::null()
            }
        }))
    }

    /// `'abc'[1]`: strings are indexed by integer offsets, one character at
    /// a time
    fn fetch_from_string(&self, analyzer: &mut Analyzer<'_>, atomic: &Atomic) -> AnalysisResult<Union> {
        if self.offset.is_mixed() {
            return Ok(Atomic::SingleLetter.into());
        }
        if !self.offset.is_int() {
            analyzer.report(
                IssueKind::InvalidArrayOffset {
                    expected: "int".to_string(),
                    got: self.offset.get_id(),
                },
                self.span,
            )?;
            return Ok(Atomic::SingleLetter.into());
        }

        let (Atomic::LiteralString(value), Some(offset)) =
            (atomic, self.offset.get_single_literal_int())
        else {
            return Ok(Atomic::SingleLetter.into());
        };
        let chars = value.chars().collect::<Vec<_>>();
        let length = i64::try_from(chars.len()).unwrap_or(i64::MAX);
        let index = if offset < 0 { length + offset } else { offset };
        match usize::try_from(index).ok().and_then(|index| chars.get(index)) {
            Some(letter) => Ok(Atomic::LiteralString(letter.to_string()).into()),
            None => {
                let expected = (0..length)
                    .map(|index| format!("int({index})"))
                    .collect::<Vec<_>>();
                analyzer.report(
                    IssueKind::InvalidArrayOffset {
                        expected: if expected.is_empty() {
                            "empty".to_string()
                        } else {
                            expected.join("|")
                        },
                        got: self.offset.get_id(),
                    },
                    self.span,
                )?;
                Ok(Atomic::SingleLetter.into())
            }
        }
    }

    /// Check the offset against the key type of a general array. Offsets
    /// tested by `isset` are not checked.
    fn check_offset(&self, analyzer: &mut Analyzer<'_>, key: &Union) -> AnalysisResult {
        if self.inside_isset
            || self.offset.is_mixed()
            || key.is_mixed()
            || key.has(&Atomic::ArrayKey.get_id())
        {
            return Ok(());
        }
        let offset = normalize_offset(self.offset);
        let result = is_contained_by(analyzer.codebase, &offset, key, false, false);
        if result.is_contained {
            return Ok(());
        }
        let is_scalar_key = offset.atomics().all(|atomic| atomic.is_int() || atomic.is_string());
        let issue = if analyzer.config.allow_scalar_array_key_coercion && is_scalar_key {
            IssueKind::PossiblyInvalidArrayOffset {
                expected: key.get_id(),
                got: offset.get_id(),
            }
        } else {
            IssueKind::InvalidArrayOffset {
                expected: key.get_id(),
                got: offset.get_id(),
            }
        };
        analyzer.report(issue, self.span)
    }

    /// Report a literal offset missing from a container known to lack it
    fn report_missing_offset(&self, analyzer: &mut Analyzer<'_>) -> AnalysisResult {
        if self.inside_isset {
            return Ok(());
        }
        analyzer.report(
            IssueKind::UndefinedArrayOffset {
                container: self.container.clone(),
                offset: self
                    .key
                    .as_ref()
                    .map_or_else(|| self.offset.get_id(), offset_display),
            },
            self.span,
        )
    }
}

/// A literal offset as written in source
fn offset_display(key: &ShapeKey) -> String {
    match key {
        ShapeKey::Int(index) => index.to_string(),
        ShapeKey::String(key) => format!("'{key}'"),
    }
}

/// Numeric literal string offsets are integer offsets
fn normalize_offset(offset: &Union) -> Union {
    let atomics = offset
        .atomics()
        .map(|atomic| match atomic {
            Atomic::LiteralString(value) => ShapeKey::from_string(value).to_atomic(),
            other => other.clone(),
        })
        .collect();
    Union::new(atomics)
}

/// `isset($a, $b['k'])`
pub fn analyze_isset(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    exprs: &[Expr],
) -> AnalysisResult<Union> {
    let was_inside_isset = context.inside_isset;
    context.inside_isset = true;
    let result = exprs
        .iter()
        .try_for_each(|expr| analyze_expr(analyzer, context, expr).map(drop));
    context.inside_isset = was_inside_isset;
    result?;
    Ok(Union::bool())
}

/// `empty($a)`
pub fn analyze_empty(
    analyzer: &mut Analyzer<'_>,
    context: &mut Context,
    inner: &Expr,
) -> AnalysisResult<Union> {
    let was_inside_isset = context.inside_isset;
    context.inside_isset = true;
    let result = analyze_expr(analyzer, context, inner);
    context.inside_isset = was_inside_isset;
    result?;
    Ok(Union::bool())
}

#[cfg(test)]
mod tests {
    use sable_ast::{expr::ClassRef, AstBuilder};

    use crate::{config::AnalysisConfig, typeck::test_utils::{check, check_with_config}};

    #[test]
    fn undefined_and_possibly_undefined_variables() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.if_(b.var("c"), vec![b.assign_stmt(b.var("x"), b.int(1))], None),
            b.echo(vec![b.var("x")]),
        ]);
        assert_eq!(
            checked.issues(),
            vec!["UndefinedVariable", "PossiblyUndefinedVariable"]
        );
    }

    #[test]
    fn unchecked_variables_are_mixed() {
        let b = AstBuilder::new();
        let config = AnalysisConfig {
            check_variables: false,
            ..AnalysisConfig::default()
        };
        let checked = check_with_config(&[b.assign_stmt(b.var("a"), b.var("nope"))], &config);
        assert!(checked.issues().is_empty());
        assert_eq!(checked.type_of("$a").as_deref(), Some("mixed"));
    }

    #[test]
    fn this_outside_a_class() {
        let b = AstBuilder::new();
        let checked = check(&[b.echo(vec![b.var("this")])]);
        assert_eq!(checked.issues(), vec!["InvalidScope"]);
    }

    #[test]
    fn shape_offsets() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("arr"), b.shape(vec![("x", b.int(1)), ("y", b.string("s"))])),
            b.assign_stmt(b.var("v"), b.dim(b.var("arr"), b.string("x"))),
            b.assign_stmt(b.var("w"), b.dim(b.var("arr"), b.string("z"))),
        ]);
        assert_eq!(checked.type_of("$v").as_deref(), Some("int(1)"));
        assert_eq!(checked.issues(), vec!["UndefinedArrayOffset"]);
        let message = checked.diagnostics[0].kind.value().to_string();
        assert!(message.contains("$arr"), "{message}");
        assert!(message.contains("'z'"), "{message}");
    }

    #[test]
    fn isset_hides_missing_offsets_and_null_containers() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("arr"), b.shape(vec![("x", b.int(1))])),
            b.assign_stmt(b.var("n"), b.null()),
            b.assign_stmt(
                b.var("a"),
                b.isset(vec![b.dim(b.var("arr"), b.string("z")), b.dim(b.var("n"), b.int(0))]),
            ),
        ]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(checked.type_of("$a").as_deref(), Some("bool"));
    }

    #[test]
    fn null_and_scalar_containers() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("n"), b.null()),
            b.expr_stmt(b.dim(b.var("n"), b.int(0))),
            b.assign_stmt(b.var("i"), b.int(5)),
            b.expr_stmt(b.dim(b.var("i"), b.int(0))),
        ]);
        assert_eq!(checked.issues(), vec!["NullArrayAccess", "InvalidArrayAccess"]);
    }

    #[test]
    fn string_offsets() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("s"), b.string("abc")),
            b.assign_stmt(b.var("c"), b.dim(b.var("s"), b.int(1))),
            b.assign_stmt(b.var("d"), b.dim(b.var("s"), b.int(-1))),
            b.assign_stmt(b.var("e"), b.dim(b.var("s"), b.int(3))),
        ]);
        assert_eq!(checked.type_of("$c").as_deref(), Some("string(b)"));
        assert_eq!(checked.type_of("$d").as_deref(), Some("string(c)"));
        assert_eq!(checked.type_of("$e").as_deref(), Some("single-letter"));
        assert_eq!(checked.issues(), vec!["InvalidArrayOffset"]);
    }

    #[test]
    fn general_arrays_check_offset_types() {
        let b = AstBuilder::new();
        let checked = check(&[
            b.assign_stmt(b.var("list"), b.call("explode", vec![b.string(","), b.string("a,b")])),
            b.assign_stmt(b.var("first"), b.dim(b.var("list"), b.int(0))),
            b.assign_stmt(b.var("bad"), b.dim(b.var("list"), b.string("k"))),
        ]);
        assert_eq!(checked.type_of("$first").as_deref(), Some("string"));
        assert_eq!(checked.issues(), vec!["PossiblyInvalidArrayOffset"]);
    }

    #[test]
    fn isset_accepts_any_offset_into_constant_maps() {
        let b = AstBuilder::new();
        let class = b
            .class("K")
            .with_constant(b.class_constant("M", b.shape(vec![("a", b.int(1))])));
        let f = b
            .function("f")
            .with_param(b.param("k").typed("string"))
            .with_body(vec![
                b.assign_stmt(
                    b.var("known"),
                    b.isset(vec![b.dim(b.class_const(ClassRef::named("K"), "M"), b.var("k"))]),
                ),
                b.assign_stmt(
                    b.var("v"),
                    b.dim(b.class_const(ClassRef::named("K"), "M"), b.var("k")),
                ),
            ]);
        let checked = check(&[b.class_stmt(class), b.function_stmt(f)]);
        assert_eq!(checked.issues(), vec!["PossiblyInvalidArrayOffset"]);
        assert_eq!(checked.type_in("f", "$known").as_deref(), Some("bool"));
    }

    #[test]
    fn isset_on_constant_maps_narrows_the_key() {
        let b = AstBuilder::new();
        let f = b
            .function("f")
            .with_param(b.param("k").typed("string"))
            .with_body(vec![
                b.if_(
                    b.isset(vec![b.dim(b.constant("LABELS"), b.var("k"))]),
                    vec![b.assign_stmt(b.var("label"), b.var("k"))],
                    None,
                ),
                b.assign_stmt(b.var("after"), b.var("k")),
            ]);
        let checked = check(&[
            b.const_("LABELS", b.shape(vec![("a", b.string("A")), ("b", b.string("B"))])),
            b.function_stmt(f),
        ]);
        assert!(checked.issues().is_empty(), "{:?}", checked.issues());
        assert_eq!(checked.type_in("f", "$label").as_deref(), Some("string(a)|string(b)"));
        assert_eq!(checked.type_in("f", "$after").as_deref(), Some("string"));
    }
}
