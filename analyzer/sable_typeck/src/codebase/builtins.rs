//! Declarations of the builtin functions, classes and constants
//!
//! The declarations are written as signature stubs, turned into AST
//! declarations and registered through the [scanner](super::scan_stmts), so
//! they go through the same docblock handling as user code. Template
//! parameters are written `name<T of Bound>`, docblock tags follow the
//! signature after ` ; `.

use sable_ast::{
    decl::{ClassDecl, FunctionDecl, Param},
    AstBuilder,
};
use sable_diagnostics::IssueBuffer;
use tracing::warn;

use super::{scan_stmts, Codebase};
use crate::{config::AnalysisConfig, types::parse_type};

/// Builtin functions
const FUNCTIONS: &[&str] = &[
    "is_int(mixed $value): bool ; @psalm-assert-if-true int $value",
    "is_integer(mixed $value): bool ; @psalm-assert-if-true int $value",
    "is_long(mixed $value): bool ; @psalm-assert-if-true int $value",
    "is_float(mixed $value): bool ; @psalm-assert-if-true float $value",
    "is_double(mixed $value): bool ; @psalm-assert-if-true float $value",
    "is_string(mixed $value): bool ; @psalm-assert-if-true string $value",
    "is_bool(mixed $value): bool ; @psalm-assert-if-true bool $value",
    "is_array(mixed $value): bool ; @psalm-assert-if-true array $value",
    "is_object(mixed $value): bool ; @psalm-assert-if-true object $value",
    "is_null(mixed $value): bool ; @psalm-assert-if-true null $value",
    "is_numeric(mixed $value): bool ; @psalm-assert-if-true numeric $value",
    "is_scalar(mixed $value): bool ; @psalm-assert-if-true scalar $value",
    "is_callable(mixed $value, bool $syntax_only = false): bool ; @psalm-assert-if-true callable $value",
    "is_iterable(mixed $value): bool ; @psalm-assert-if-true iterable $value",
    "is_resource(mixed $value): bool ; @psalm-assert-if-true resource $value",
    "assert(mixed $assertion, string $description = ''): bool",
    "count(Countable|array $value, int $mode = 0): int",
    "sizeof(Countable|array $value, int $mode = 0): int",
    "strlen(string $string): int",
    "strtolower(string $string): string",
    "strtoupper(string $string): string",
    "ucfirst(string $string): string",
    "trim(string $string, string $characters = ' '): string",
    "ltrim(string $string, string $characters = ' '): string",
    "rtrim(string $string, string $characters = ' '): string",
    "str_repeat(string $string, int $times): string",
    "str_pad(string $string, int $length, string $pad_string = ' ', int $pad_type = 1): string",
    "substr(string $string, int $offset, ?int $length = null): string",
    "strpos(string $haystack, string $needle, int $offset = 0): int|false",
    "str_contains(string $haystack, string $needle): bool",
    "str_starts_with(string $haystack, string $needle): bool",
    "str_ends_with(string $haystack, string $needle): bool",
    "str_replace(array|string $search, array|string $replace, string|array $subject, int &$count = null): string|array",
    "sprintf(string $format, mixed ...$values): string",
    "printf(string $format, mixed ...$values): int",
    "implode(string $separator, array $array): string",
    "explode(string $separator, string $string, int $limit = 0): list<string>",
    "preg_match(string $pattern, string $subject, array &$matches = null, int $flags = 0, int $offset = 0): int|false",
    "json_encode(mixed $value, int $flags = 0, int $depth = 512): string|false",
    "json_decode(string $json, ?bool $associative = null, int $depth = 512, int $flags = 0): mixed",
    "intval(mixed $value, int $base = 10): int",
    "floatval(mixed $value): float",
    "strval(mixed $value): string",
    "boolval(mixed $value): bool",
    "gettype(mixed $value): string",
    "get_class(object $object): class-string",
    "spl_object_id(object $object): int",
    "method_exists(object|string $object_or_class, string $method): bool",
    "property_exists(object|string $object_or_class, string $property): bool",
    "class_exists(string $class, bool $autoload = true): bool",
    "function_exists(string $function): bool",
    "is_a(mixed $object_or_class, string $class, bool $allow_string = false): bool",
    "define(string $constant_name, mixed $value, bool $case_insensitive = false): bool",
    "defined(string $constant_name): bool",
    "abs(int|float $num): int|float",
    "max(mixed $value, mixed ...$values): mixed",
    "min(mixed $value, mixed ...$values): mixed",
    "round(int|float $num, int $precision = 0): float",
    "floor(int|float $num): float",
    "ceil(int|float $num): float",
    "range(mixed $start, mixed $end, int|float $step = 1): list<int|float|string>",
    "time(): int",
    "microtime(bool $as_float = false): string|float",
    "var_dump(mixed $value, mixed ...$values): void",
    "print_r(mixed $value, bool $return = false): string|true",
    "func_get_args(): list<mixed>",
    "fopen(string $filename, string $mode): resource|false",
    "in_array(mixed $needle, array $haystack, bool $strict = false): bool",
    "array_key_exists(array-key $key, array $array): bool",
    "array_search(mixed $needle, array $haystack, bool $strict = false): int|string|false",
    "array_keys<TKey of array-key, TValue>(array<TKey, TValue> $array): list<TKey>",
    "array_values<TKey of array-key, TValue>(array<TKey, TValue> $array): list<TValue>",
    "array_key_first<TKey of array-key, TValue>(array<TKey, TValue> $array): TKey|null",
    "array_key_last<TKey of array-key, TValue>(array<TKey, TValue> $array): TKey|null",
    "array_flip<TKey of array-key, TValue of array-key>(array<TKey, TValue> $array): array<TValue, TKey>",
    "array_filter<TKey of array-key, TValue>(array<TKey, TValue> $array, ?callable $callback = null, int $mode = 0): array<TKey, TValue>",
    "array_slice<TKey of array-key, TValue>(array<TKey, TValue> $array, int $offset, ?int $length = null, bool $preserve_keys = false): array<TKey, TValue>",
    "array_reverse<TKey of array-key, TValue>(array<TKey, TValue> $array, bool $preserve_keys = false): array<TKey, TValue>",
    "array_unique<TKey of array-key, TValue>(array<TKey, TValue> $array, int $flags = 2): array<TKey, TValue>",
    "array_pop<TValue>(array<array-key, TValue> &$array): TValue|null",
    "array_shift<TValue>(array<array-key, TValue> &$array): TValue|null",
    "array_push(array &$array, mixed ...$values): int",
    "array_unshift(array &$array, mixed ...$values): int",
    "array_merge(array ...$arrays): array",
    "array_map(?callable $callback, array $array, array ...$arrays): array",
    "array_combine<TKey of array-key, TValue>(array<array-key, TKey> $keys, array<array-key, TValue> $values): array<TKey, TValue>",
    "array_fill<TValue>(int $start_index, int $count, TValue $value): array<int, TValue>",
    "array_sum(array $array): int|float",
    "sort(array &$array, int $flags = 0): bool",
    "usort(array &$array, callable $callback): bool",
    "end<TValue>(array<array-key, TValue> &$array): TValue|false",
    "reset<TValue>(array<array-key, TValue> &$array): TValue|false",
    "current<TValue>(array<array-key, TValue> $array): TValue|false",
    "key(array $array): int|string|null",
    "iterator_to_array(Traversable $iterator, bool $preserve_keys = true): array",
];

/// Builtin classes and interfaces. Indented lines are methods of the class
/// above them.
const CLASSES: &str = "
interface Traversable<TKey, TValue>
interface Iterator<TKey, TValue> extends Traversable<TKey, TValue>
  current(): TValue
  key(): TKey
  next(): void
  rewind(): void
  valid(): bool
interface IteratorAggregate<TKey, TValue> extends Traversable<TKey, TValue>
  getIterator(): Traversable<TKey, TValue>
interface ArrayAccess<TKey, TValue>
  offsetExists(TKey $offset): bool
  offsetGet(TKey $offset): TValue
  offsetSet(?TKey $offset, TValue $value): void
  offsetUnset(TKey $offset): void
interface Countable
  count(): int
interface Stringable
  __toString(): string
interface Throwable extends Stringable
  getMessage(): string
  getCode(): int
  getPrevious(): ?Throwable
  getFile(): string
  getLine(): int
  getTrace(): list<array<string, mixed>>
  getTraceAsString(): string
final class Generator<TKey, TValue, TSend, TReturn> implements Iterator<TKey, TValue>
  current(): TValue
  key(): TKey
  next(): void
  rewind(): void
  valid(): bool
  send(TSend $value): TValue
  getReturn(): TReturn
final class Closure
  static bind(Closure $closure, ?object $newThis, object|string|null $newScope = 'static'): ?Closure
  bindTo(?object $newThis, object|string|null $newScope = 'static'): ?Closure
  call(object $newThis, mixed ...$args): mixed
class stdClass
  __get(string $name): mixed
  __set(string $name, mixed $value): void
class ArrayIterator<TKey of array-key, TValue> implements Iterator<TKey, TValue>, ArrayAccess<TKey, TValue>, Countable
  __construct(array<TKey, TValue> $array = [])
  current(): TValue
  key(): TKey
  next(): void
  rewind(): void
  valid(): bool
  offsetExists(TKey $offset): bool
  offsetGet(TKey $offset): TValue
  offsetSet(?TKey $offset, TValue $value): void
  offsetUnset(TKey $offset): void
  count(): int
  getArrayCopy(): array<TKey, TValue>
class ArrayObject<TKey of array-key, TValue> implements IteratorAggregate<TKey, TValue>, ArrayAccess<TKey, TValue>, Countable
  __construct(array<TKey, TValue> $array = [])
  getIterator(): ArrayIterator<TKey, TValue>
  offsetExists(TKey $offset): bool
  offsetGet(TKey $offset): TValue
  offsetSet(?TKey $offset, TValue $value): void
  offsetUnset(TKey $offset): void
  count(): int
  getArrayCopy(): array<TKey, TValue>
class Exception implements Throwable
  __construct(string $message = '', int $code = 0, ?Throwable $previous = null)
  getMessage(): string
  getCode(): int
  getPrevious(): ?Throwable
  getFile(): string
  getLine(): int
  getTrace(): list<array<string, mixed>>
  getTraceAsString(): string
  __toString(): string
class Error implements Throwable
  __construct(string $message = '', int $code = 0, ?Throwable $previous = null)
  getMessage(): string
  getCode(): int
  getPrevious(): ?Throwable
  getFile(): string
  getLine(): int
  getTrace(): list<array<string, mixed>>
  getTraceAsString(): string
  __toString(): string
class ErrorException extends Exception
class RuntimeException extends Exception
class LogicException extends Exception
class InvalidArgumentException extends LogicException
class DomainException extends LogicException
class LengthException extends LogicException
class OutOfRangeException extends LogicException
class UnexpectedValueException extends RuntimeException
class OutOfBoundsException extends RuntimeException
class RangeException extends RuntimeException
class TypeError extends Error
class ValueError extends Error
class ArithmeticError extends Error
class DivisionByZeroError extends ArithmeticError
";

/// Builtin constants and their types
const CONSTANTS: &[(&str, &str)] = &[
    ("PHP_EOL", "string"),
    ("PHP_VERSION", "string"),
    ("PHP_OS", "string"),
    ("PHP_INT_MAX", "int"),
    ("PHP_INT_MIN", "int"),
    ("PHP_INT_SIZE", "int"),
    ("PHP_FLOAT_EPSILON", "float"),
    ("DIRECTORY_SEPARATOR", "string"),
    ("M_PI", "float"),
    ("E_ALL", "int"),
    ("E_ERROR", "int"),
    ("E_WARNING", "int"),
    ("E_NOTICE", "int"),
    ("COUNT_RECURSIVE", "int"),
    ("SORT_STRING", "int"),
    ("ARRAY_FILTER_USE_KEY", "int"),
    ("ARRAY_FILTER_USE_BOTH", "int"),
    ("JSON_THROW_ON_ERROR", "int"),
    ("JSON_PRETTY_PRINT", "int"),
];

/// Add every builtin to `codebase`
pub fn register(codebase: &mut Codebase) {
    let b = AstBuilder::new();
    let mut stmts = FUNCTIONS
        .iter()
        .map(|line| b.function_stmt(function_decl(&b, line)))
        .collect::<Vec<_>>();
    stmts.extend(class_decls(&b).into_iter().map(|class| b.class_stmt(class)));

    let mut issues = IssueBuffer::new();
    scan_stmts(
        &stmts,
        "<builtins>",
        codebase,
        &AnalysisConfig::default(),
        &mut issues,
    );
    for diagnostic in issues.diagnostics() {
        warn!(issue = %diagnostic.kind.value(), "invalid builtin stub");
    }

    for (name, ty) in CONSTANTS {
        match parse_type(ty, &[]) {
            Ok(ty) => codebase.add_constant(name, ty),
            Err(error) => warn!(constant = name, %error, "invalid builtin constant type"),
        }
    }
}

/// Split on commas outside any brackets
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = vec![];
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = input[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// `name<T, U of X>` into the name and the template declarations
fn split_templates(head: &str) -> (&str, Vec<&str>) {
    match head.split_once('<') {
        Some((name, rest)) => (
            name.trim(),
            split_top_level(rest.strip_suffix('>').unwrap_or(rest)),
        ),
        None => (head.trim(), vec![]),
    }
}

/// The byte index of the `)` closing the `(` at `open`
fn closing_paren(input: &str, open: usize) -> Option<usize> {
    let mut depth = 0_i32;
    for (i, c) in input[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// `[type] [&][...]$name [= default]`
fn param(b: &AstBuilder, input: &str) -> Param {
    let (declaration, default) = input
        .split_once(" = ")
        .map_or((input, None), |(declaration, default)| {
            (declaration, Some(default.trim()))
        });
    let dollar = declaration.rfind('$').unwrap_or(0);
    let mut param = b.param(declaration[dollar..].trim_start_matches('$'));

    let mut type_hint = declaration[..dollar].trim();
    if let Some(rest) = type_hint.strip_suffix("...") {
        param = param.variadic();
        type_hint = rest.trim();
    }
    if let Some(rest) = type_hint.strip_suffix('&') {
        param = param.by_ref();
        type_hint = rest.trim();
    }
    if !type_hint.is_empty() {
        param = param.typed(type_hint);
    }
    match default {
        Some("null") => param.with_default(b.null()),
        Some(default) => param.with_default(b.string(default)),
        None => param,
    }
}

/// `name<templates>(params): return ; @tag value ; ...`
fn function_decl(b: &AstBuilder, line: &str) -> FunctionDecl {
    let mut sections = line.split(" ; ");
    let signature = sections.next().unwrap_or_default().trim();
    let open = signature.find('(').unwrap_or(signature.len());
    let close = closing_paren(signature, open).unwrap_or(signature.len());

    let (name, templates) = split_templates(&signature[..open]);
    let mut decl = b.function(name);
    for template in templates {
        decl = decl.with_doc("template", template);
    }
    if open < close {
        for input in split_top_level(&signature[open + 1..close]) {
            decl = decl.with_param(param(b, input));
        }
    }
    if let Some(return_type) = signature
        .get(close + 1..)
        .and_then(|rest| rest.trim().strip_prefix(':'))
    {
        decl = decl.returning(return_type.trim());
    }
    for tag in sections {
        if let Some((name, value)) = tag.trim().trim_start_matches('@').split_once(' ') {
            decl = decl.with_doc(name, value.trim());
        }
    }
    decl
}

/// `[abstract|final] class|interface Name<T> [extends A<X>] [implements B, C]`
fn class_header(b: &AstBuilder, header: &str) -> ClassDecl {
    let (header, implements) = header
        .split_once(" implements ")
        .map_or((header, None), |(header, list)| (header, Some(list)));
    let (header, extends) = header
        .split_once(" extends ")
        .map_or((header, None), |(header, list)| (header, Some(list)));

    let mut header = header.trim();
    let mut is_abstract = false;
    let mut is_final = false;
    if let Some(rest) = header.strip_prefix("abstract ") {
        is_abstract = true;
        header = rest;
    }
    if let Some(rest) = header.strip_prefix("final ") {
        is_final = true;
        header = rest;
    }
    let (is_interface, header) = header.strip_prefix("interface ").map_or_else(
        || (false, header.trim_start_matches("class ")),
        |rest| (true, rest),
    );

    let (name, templates) = split_templates(header);
    let mut class = b.class(name);
    class.is_final = is_final;
    if is_abstract {
        class = class.abstract_();
    }
    if is_interface {
        class = class.interface();
    }
    for template in templates {
        class = class.with_doc("template", template);
    }

    for parent in extends.map(split_top_level).unwrap_or_default() {
        let parent_name = parent.split_once('<').map_or(parent, |(name, _)| name);
        class = if is_interface {
            class.implements(parent_name)
        } else {
            class.extends(parent_name)
        };
        if parent.contains('<') {
            class = class.with_doc("template-extends", parent);
        }
    }
    for interface in implements.map(split_top_level).unwrap_or_default() {
        let interface_name = interface.split_once('<').map_or(interface, |(name, _)| name);
        class = class.implements(interface_name);
        if interface.contains('<') {
            class = class.with_doc("template-implements", interface);
        }
    }
    class
}

/// Every class declared in [`CLASSES`]
fn class_decls(b: &AstBuilder) -> Vec<ClassDecl> {
    let mut classes: Vec<ClassDecl> = vec![];
    for line in CLASSES.lines().filter(|line| !line.trim().is_empty()) {
        if let Some(member) = line.strip_prefix("  ") {
            let (is_static, member) = member
                .strip_prefix("static ")
                .map_or((false, member), |rest| (true, rest));
            let mut method = b.method(function_decl(b, member));
            if is_static {
                method = method.static_();
            }
            if let Some(class) = classes.pop() {
                classes.push(class.with_method(method));
            }
        } else {
            classes.push(class_header(b, line));
        }
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_signatures_are_parsed() {
        let b = AstBuilder::new();
        let decl = function_decl(
            &b,
            "array_pop<TValue>(array<array-key, TValue> &$array, mixed ...$rest): TValue|null ; @psalm-suppress MixedReturnStatement",
        );
        assert_eq!(decl.name.value(), "array_pop");
        assert_eq!(decl.params.len(), 2);
        assert!(decl.params[0].by_ref);
        assert_eq!(
            decl.params[0].type_hint.as_ref().map(|hint| hint.value().as_str()),
            Some("array<array-key, TValue>")
        );
        assert!(decl.params[1].variadic);
        assert_eq!(
            decl.return_type.as_ref().map(|hint| hint.value().as_str()),
            Some("TValue|null")
        );
        assert_eq!(decl.docblock.tags.len(), 2);
    }

    #[test]
    fn builtins_register_cleanly() {
        let codebase = Codebase::new();
        assert!(codebase.function_exists("strlen"));
        assert!(codebase.function_exists("\\Array_Keys"));
        assert!(codebase.interface_exists("Traversable"));
        assert!(codebase.class_extends_or_implements("InvalidArgumentException", "Throwable"));
        assert!(codebase.class_implements("ArrayIterator", "Countable"));
        assert_eq!(
            codebase.get_constant("PHP_EOL").map(ToString::to_string).as_deref(),
            Some("string")
        );

        let is_string = codebase.get_function("is_string").expect("is_string is builtin");
        assert_eq!(is_string.if_true_assertions.len(), 1);

        let generator = codebase.get_class("Generator").expect("Generator is builtin");
        assert!(generator.is_final);
        assert_eq!(generator.template_types.len(), 4);
        assert_eq!(
            generator
                .template_extends
                .get("iterator")
                .map(|params| params.len()),
            Some(2)
        );

        let bind = codebase
            .get_method("Closure", "BIND")
            .expect("Closure::bind is builtin");
        assert!(bind.is_static);
    }
}
