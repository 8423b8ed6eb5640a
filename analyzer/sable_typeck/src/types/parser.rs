//! Parsing type strings from signatures and docblocks
//!
//! Handles the vocabulary used in annotations: scalar names and their
//! refinements, `?T`, `A|B`, generic arrays and objects, shapes, literals,
//! `Foo::class`, `Foo::BAR` and template names in scope.

use indexmap::IndexMap;
use thiserror::Error;

use super::{template::TemplateType, Atomic, ShapeKey, Union};

/// An error raised while parsing a type string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum TypeParseError {
    #[error("empty type")]
    Empty,
    #[error("unexpected end of type `{0}`")]
    UnexpectedEnd(String),
    #[error("unexpected `{token}` in type `{input}`")]
    UnexpectedToken { token: String, input: String },
    #[error("unterminated string literal in type `{0}`")]
    UnterminatedString(String),
    #[error("`{name}` takes at most {max} type parameters")]
    TooManyTypeParams { name: String, max: usize },
    #[error("intersection types are not supported: `{0}`")]
    Intersection(String),
}

/// A token of a type string
#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// A name, keyword or `$this`
    Name(String),
    /// An integer literal
    Int(i64),
    /// A float literal
    Float(f64),
    /// A quoted string literal
    Str(String),
    /// `|`
    Pipe,
    /// `&`
    Amp,
    /// `?`
    Question,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `,`
    Comma,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `:`
    Colon,
    /// `::`
    DoubleColon,
    /// `...`
    Ellipsis,
}
impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Pipe => write!(f, "|"),
            Self::Amp => write!(f, "&"),
            Self::Question => write!(f, "?"),
            Self::Lt => write!(f, "<"),
            Self::Gt => write!(f, ">"),
            Self::Comma => write!(f, ","),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),
            Self::Colon => write!(f, ":"),
            Self::DoubleColon => write!(f, "::"),
            Self::Ellipsis => write!(f, "..."),
        }
    }
}

/// Split a type string into tokens
fn tokenize(input: &str) -> Result<Vec<Token>, TypeParseError> {
    let chars = input.chars().collect::<Vec<_>>();
    let mut tokens = vec![];
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '&' => {
                tokens.push(Token::Amp);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            '<' => {
                tokens.push(Token::Lt);
                i += 1;
            }
            '>' => {
                tokens.push(Token::Gt);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '{' => {
                tokens.push(Token::LBrace);
                i += 1;
            }
            '}' => {
                tokens.push(Token::RBrace);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                tokens.push(Token::DoubleColon);
                i += 2;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '.' if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') => {
                tokens.push(Token::Ellipsis);
                i += 3;
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let Some(len) = chars[start..].iter().position(|&c| c == quote) else {
                    return Err(TypeParseError::UnterminatedString(input.to_string()));
                };
                tokens.push(Token::Str(chars[start..start + len].iter().collect()));
                i = start + len + 1;
            }
            c if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let is_float = chars.get(i) == Some(&'.')
                    && chars.get(i + 1).is_some_and(char::is_ascii_digit);
                if is_float {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text = chars[start..i].iter().collect::<String>();
                let token = if is_float {
                    text.parse().ok().map(Token::Float)
                } else {
                    text.parse().ok().map(Token::Int)
                };
                tokens.push(token.ok_or_else(|| TypeParseError::UnexpectedToken {
                    token: text,
                    input: input.to_string(),
                })?);
            }
            c if c.is_alphabetic() || c == '_' || c == '\\' || c == '$' => {
                let start = i;
                i += 1;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || matches!(chars[i], '_' | '\\' | '-'))
                {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            other => {
                return Err(TypeParseError::UnexpectedToken {
                    token: other.to_string(),
                    input: input.to_string(),
                })
            }
        }
    }
    Ok(tokens)
}

/// Recursive-descent parser over the tokens of one type string
struct Parser<'a> {
    /// The original input, for error messages
    input: &'a str,
    /// The tokens
    tokens: Vec<Token>,
    /// The next token index
    pos: usize,
    /// Template parameters in scope
    templates: &'a [TemplateType],
}

impl Parser<'_> {
    /// Look at the token `offset` places ahead
    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    /// Look at the next token
    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    /// Consume the next token
    fn next(&mut self) -> Result<Token, TypeParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| TypeParseError::UnexpectedEnd(self.input.to_string()))?;
        self.pos += 1;
        Ok(token)
    }

    /// Consume the next token if it is `token`
    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// The error for an unexpected token
    fn unexpected(&self, token: &Token) -> TypeParseError {
        TypeParseError::UnexpectedToken {
            token: token.to_string(),
            input: self.input.to_string(),
        }
    }

    /// Consume `token` or fail
    fn expect(&mut self, token: &Token) -> Result<(), TypeParseError> {
        let next = self.next()?;
        if &next == token {
            Ok(())
        } else {
            Err(self.unexpected(&next))
        }
    }

    /// `union := atom ('|' atom)*`
    fn parse_union(&mut self) -> Result<Union, TypeParseError> {
        let mut atomics = self.parse_with_suffix()?;
        loop {
            if self.eat(&Token::Pipe) {
                atomics.extend(self.parse_with_suffix()?);
            } else if self.peek() == Some(&Token::Amp) {
                return Err(TypeParseError::Intersection(self.input.to_string()));
            } else {
                break;
            }
        }
        Ok(Union::new(atomics))
    }

    /// An atom followed by any number of `[]`
    fn parse_with_suffix(&mut self) -> Result<Vec<Atomic>, TypeParseError> {
        let mut atomics = self.parse_atom()?;
        while self.peek() == Some(&Token::LBracket) && self.peek_at(1) == Some(&Token::RBracket) {
            self.pos += 2;
            atomics = vec![Atomic::array(
                Union::from(Atomic::ArrayKey),
                Union::new(atomics),
            )];
        }
        Ok(atomics)
    }

    /// One atom, which for `?T` and `(A|B)` is more than one atomic
    fn parse_atom(&mut self) -> Result<Vec<Atomic>, TypeParseError> {
        match self.next()? {
            Token::Question => {
                let mut atomics = self.parse_atom()?;
                atomics.push(Atomic::Null);
                Ok(atomics)
            }
            Token::LParen => {
                let inner = self.parse_union()?;
                self.expect(&Token::RParen)?;
                Ok(inner.into_atomics())
            }
            Token::Int(n) => Ok(vec![Atomic::LiteralInt(n)]),
            Token::Float(n) => Ok(vec![Atomic::LiteralFloat(n)]),
            Token::Str(s) => Ok(vec![Atomic::LiteralString(s)]),
            Token::Name(name) => self.parse_named(&name),
            other => Err(self.unexpected(&other)),
        }
    }

    /// Parse `<A, B, ...>` if present
    fn parse_type_params(&mut self) -> Result<Option<Vec<Union>>, TypeParseError> {
        if !self.eat(&Token::Lt) {
            return Ok(None);
        }
        let mut params = vec![self.parse_union()?];
        while self.eat(&Token::Comma) {
            params.push(self.parse_union()?);
        }
        self.expect(&Token::Gt)?;
        Ok(Some(params))
    }

    /// Skip a `(params): ret` callable signature if present
    fn skip_callable_signature(&mut self) -> Result<(), TypeParseError> {
        if !self.eat(&Token::LParen) {
            return Ok(());
        }
        let mut depth = 1;
        while depth > 0 {
            match self.next()? {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                _ => {}
            }
        }
        if self.eat(&Token::Colon) {
            self.parse_with_suffix()?;
        }
        Ok(())
    }

    /// Parse what follows a name
    fn parse_named(&mut self, name: &str) -> Result<Vec<Atomic>, TypeParseError> {
        let name = sable_utils::names::strip_leading_separator(name);
        if self.eat(&Token::DoubleColon) {
            return match self.next()? {
                Token::Name(member) if member.eq_ignore_ascii_case("class") => {
                    Ok(vec![Atomic::LiteralClassString(name.to_string())])
                }
                Token::Name(member) => Ok(vec![Atomic::ScalarClassConstant {
                    class: name.to_string(),
                    name: member,
                }]),
                other => Err(self.unexpected(&other)),
            };
        }

        if let Some(template) = self.templates.iter().find(|t| t.name == name) {
            return Ok(vec![Atomic::GenericParam {
                name: template.name.clone(),
                defining_entity: template.defining_entity.clone(),
                as_type: Box::new(template.as_type.clone()),
            }]);
        }

        let lower = name.to_ascii_lowercase();
        let atomic = match lower.as_str() {
            "int" | "integer" | "positive-int" | "negative-int" | "non-negative-int"
            | "literal-int" => Atomic::Int,
            "float" | "double" => Atomic::Float,
            "string" | "non-empty-string" | "numeric-string" | "lowercase-string"
            | "callable-string" | "literal-string" | "trait-string" => Atomic::String,
            "class-string" | "interface-string" => match self.parse_type_params()? {
                None => Atomic::ClassString(None),
                Some(params) => {
                    let class = params
                        .first()
                        .and_then(Union::single)
                        .and_then(|atomic| match atomic {
                            Atomic::NamedObject { name, .. } => Some(name.clone()),
                            Atomic::GenericParam { as_type, .. } => {
                                as_type.single().and_then(|atomic| match atomic {
                                    Atomic::NamedObject { name, .. } => Some(name.clone()),
                                    _ => None,
                                })
                            }
                            _ => None,
                        });
                    Atomic::ClassString(class)
                }
            },
            "bool" | "boolean" => Atomic::Bool,
            "true" => Atomic::True,
            "false" => Atomic::False,
            "null" => Atomic::Null,
            "mixed" => Atomic::Mixed,
            "void" => Atomic::Void,
            "never" | "never-return" | "never-returns" | "no-return" | "empty" => Atomic::Empty,
            "resource" | "closed-resource" => Atomic::Resource,
            "object" => Atomic::Object,
            "callable" => {
                self.skip_callable_signature()?;
                Atomic::Callable
            }
            "scalar" => Atomic::Scalar,
            "numeric" => Atomic::Numeric,
            "array-key" => Atomic::ArrayKey,
            "iterable" => {
                let (key, value) = match self.parse_type_params()? {
                    None => (Union::from(Atomic::ArrayKey), Union::mixed()),
                    Some(mut params) if params.len() == 1 => {
                        (Union::from(Atomic::ArrayKey), params.remove(0))
                    }
                    Some(mut params) if params.len() == 2 => {
                        let value = params.remove(1);
                        (params.remove(0), value)
                    }
                    Some(_) => {
                        return Err(TypeParseError::TooManyTypeParams {
                            name: name.to_string(),
                            max: 2,
                        })
                    }
                };
                return Ok(vec![
                    Atomic::array(key.clone(), value.clone()),
                    Atomic::NamedObject {
                        name: "Traversable".to_string(),
                        type_params: Some(vec![key, value]),
                    },
                ]);
            }
            "array" | "non-empty-array" | "list" | "non-empty-list" | "associative-array" => {
                return self.parse_array(name, &lower).map(|atomic| vec![atomic]);
            }
            "self" | "static" | "$this" | "parent" => Atomic::named(&lower),
            _ => {
                if lower == "closure" {
                    self.skip_callable_signature()?;
                }
                Atomic::NamedObject {
                    name: name.to_string(),
                    type_params: self.parse_type_params()?,
                }
            }
        };
        Ok(vec![atomic])
    }

    /// Parse the arguments of an array keyword: `<V>`, `<K, V>` or a shape
    fn parse_array(&mut self, name: &str, lower: &str) -> Result<Atomic, TypeParseError> {
        let is_list = lower.ends_with("list");
        if self.eat(&Token::LBrace) {
            return self.parse_shape();
        }
        let default_key = if is_list {
            Union::int()
        } else {
            Union::from(Atomic::ArrayKey)
        };
        let (key, value) = match self.parse_type_params()? {
            None => (default_key, Union::mixed()),
            Some(mut params) if params.len() == 1 => (default_key, params.remove(0)),
            Some(mut params) if params.len() == 2 && !is_list => {
                let value = params.remove(1);
                (params.remove(0), value)
            }
            Some(_) => {
                return Err(TypeParseError::TooManyTypeParams {
                    name: name.to_string(),
                    max: if is_list { 1 } else { 2 },
                })
            }
        };
        Ok(Atomic::Array {
            key: Box::new(key),
            value: Box::new(value),
            count: lower.starts_with("non-empty").then_some(1),
        })
    }

    /// Parse shape entries after `{`
    fn parse_shape(&mut self) -> Result<Atomic, TypeParseError> {
        let mut properties = IndexMap::new();
        let mut sealed = true;
        let mut next_index = 0;
        loop {
            if self.eat(&Token::RBrace) {
                break;
            }
            if self.eat(&Token::Ellipsis) {
                sealed = false;
                self.expect(&Token::RBrace)?;
                break;
            }

            let keyed = matches!(
                self.peek(),
                Some(Token::Name(_) | Token::Int(_) | Token::Str(_))
            ) && (self.peek_at(1) == Some(&Token::Colon)
                || (self.peek_at(1) == Some(&Token::Question)
                    && self.peek_at(2) == Some(&Token::Colon)));

            let key = if keyed {
                let key = match self.next()? {
                    Token::Name(name) | Token::Str(name) => ShapeKey::from_string(&name),
                    Token::Int(n) => ShapeKey::Int(n),
                    other => return Err(self.unexpected(&other)),
                };
                let optional = self.eat(&Token::Question);
                self.expect(&Token::Colon)?;
                let value = self.parse_union()?.possibly_undefined(optional);
                if let ShapeKey::Int(n) = key {
                    next_index = next_index.max(n + 1);
                }
                properties.insert(key, value);
                None
            } else {
                Some(ShapeKey::Int(next_index))
            };
            if let Some(key) = key {
                next_index += 1;
                properties.insert(key, self.parse_union()?);
            }

            if !self.eat(&Token::Comma) {
                self.expect(&Token::RBrace)?;
                break;
            }
        }
        Ok(Atomic::ObjectShape { properties, sealed })
    }
}

/// Parse a type string with the given template parameters in scope
///
/// # Errors
/// Fails with a [`TypeParseError`] when the string is not a valid type.
pub fn parse_type(input: &str, templates: &[TemplateType]) -> Result<Union, TypeParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(TypeParseError::Empty);
    }
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        templates,
    };
    let ty = parser.parse_union()?;
    match parser.peek() {
        None => Ok(ty.from_declaration()),
        Some(token) => Err(parser.unexpected(token)),
    }
}

/// Split a docblock tag value into its leading type and the rest
///
/// Whitespace inside brackets, or around a `|`, `,` or `:`, does not end the
/// type: `array<int, string> $x` splits into `array<int, string>` and `$x`.
#[must_use]
pub fn split_docblock_type(value: &str) -> (&str, &str) {
    let value = value.trim();
    let mut depth = 0_i32;
    let mut quote = None;
    let mut last_significant = None;
    for (i, c) in value.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '<' | '{' | '(' | '[' => depth += 1,
            '>' | '}' | ')' | ']' => depth -= 1,
            c if c.is_whitespace() && depth <= 0 => {
                let next_significant = value[i..].trim_start().chars().next();
                let joined = matches!(last_significant, Some('|' | ',' | ':'))
                    || matches!(next_significant, Some('|'));
                if !joined {
                    return (&value[..i], value[i..].trim_start());
                }
            }
            _ => {}
        }
        if !c.is_whitespace() {
            last_significant = Some(c);
        }
    }
    (value, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> String {
        parse_type(input, &[]).expect("type should parse").to_string()
    }

    #[test]
    fn scalars_and_nullables() {
        assert_eq!(parse("int"), "int");
        assert_eq!(parse("?string"), "string|null");
        assert_eq!(parse("bool|null"), "bool|null");
        assert_eq!(parse("integer"), "int");
        assert_eq!(parse("\\Foo\\Bar"), "Foo\\Bar");
    }

    #[test]
    fn generic_arrays() {
        assert_eq!(parse("array<int, string>"), "array<int, string>");
        assert_eq!(parse("array<string>"), "array<array-key, string>");
        assert_eq!(parse("list<Foo>"), "array<int, Foo>");
        assert_eq!(parse("non-empty-array<int>"), "non-empty-array<array-key, int>");
        assert_eq!(parse("int[]"), "array<array-key, int>");
        assert_eq!(parse("array"), "array<array-key, mixed>");
    }

    #[test]
    fn shapes() {
        assert_eq!(
            parse("array{a: int, b?: string}"),
            "array{a: int, b?: string}"
        );
        assert_eq!(parse("array{int, string}"), "array{0: int, 1: string}");
        assert_eq!(parse("array{'x y': int, ...}"), "array{'x y': int, ...}");
    }

    #[test]
    fn literals_and_constants() {
        assert_eq!(parse("5|-3"), "int(5)|int(-3)");
        assert_eq!(parse("'a'|\"b\""), "string(a)|string(b)");
        assert_eq!(parse("Foo::class"), "Foo::class");
        assert_eq!(parse("Foo::BAR"), "Foo::BAR");
        assert_eq!(parse("1.5"), "float(1.5)");
    }

    #[test]
    fn generic_objects_and_templates() {
        let templates = [TemplateType {
            name: "T".to_string(),
            defining_entity: "box".to_string(),
            as_type: Union::mixed(),
        }];
        let ty = parse_type("Box<T>|T", &templates).expect("type should parse");
        assert_eq!(ty.to_string(), "Box<T>|T");
        assert!(matches!(
            ty.atomics().nth(1),
            Some(Atomic::GenericParam { .. })
        ));
        assert_eq!(parse("class-string<Foo>"), "class-string<Foo>");
    }

    #[test]
    fn parsed_types_are_declarations() {
        assert!(parse_type("int", &[]).expect("type should parse").from_declaration);
    }

    #[test]
    fn errors() {
        assert_eq!(parse_type("", &[]), Err(TypeParseError::Empty));
        assert!(matches!(
            parse_type("array<int", &[]),
            Err(TypeParseError::UnexpectedEnd(_))
        ));
        assert!(matches!(
            parse_type("array<int, string, bool>", &[]),
            Err(TypeParseError::TooManyTypeParams { max: 2, .. })
        ));
        assert!(matches!(
            parse_type("A&B", &[]),
            Err(TypeParseError::Intersection(_))
        ));
        assert!(matches!(
            parse_type("int)", &[]),
            Err(TypeParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn splitting_docblock_values() {
        assert_eq!(split_docblock_type("int $x"), ("int", "$x"));
        assert_eq!(
            split_docblock_type("array<int, string> $x the values"),
            ("array<int, string>", "$x the values")
        );
        assert_eq!(split_docblock_type("int | null $x"), ("int | null", "$x"));
        assert_eq!(split_docblock_type("array{a: int} $x"), ("array{a: int}", "$x"));
        assert_eq!(split_docblock_type("Foo"), ("Foo", ""));
    }
}
