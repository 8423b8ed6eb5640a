//! The atomic types: one concrete alternative of a [`Union`]

use std::fmt::Display;

use indexmap::IndexMap;

use super::Union;

/// A key of an [`Atomic::ObjectShape`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeKey {
    /// An integer key, including decimal strings like `"3"`
    Int(i64),
    /// Any other string key
    String(String),
}
impl ShapeKey {
    /// Build a key from a string the way the runtime does: canonical decimal
    /// strings become integer keys.
    #[must_use]
    pub fn from_string(key: &str) -> Self {
        sable_utils::names::integer_key_from_string(key)
            .map_or_else(|| Self::String(key.to_string()), Self::Int)
    }

    /// The literal atomic type of this key
    #[must_use]
    pub fn to_atomic(&self) -> Atomic {
        match self {
            Self::Int(n) => Atomic::LiteralInt(*n),
            Self::String(s) => Atomic::LiteralString(s.clone()),
        }
    }
}
impl Display for ShapeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s)
                if !s.is_empty()
                    && !s.starts_with(|c: char| c.is_ascii_digit())
                    && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') =>
            {
                write!(f, "{s}")
            }
            Self::String(s) => write!(f, "'{s}'"),
        }
    }
}

/// The possible atomic types
#[derive(Debug, Clone, PartialEq)]
pub enum Atomic {
    /// `null`
    Null,
    /// `void`, the absence of a return value
    Void,
    /// `mixed`, anything at all
    Mixed,
    /// The bottom type: no value. Also the key and value of `[]`.
    Empty,
    /// `resource`
    Resource,
    /// `bool`
    Bool,
    /// `true`
    True,
    /// `false`
    False,
    /// `int`
    Int,
    /// A known integer
    LiteralInt(i64),
    /// `float`
    Float,
    /// A known float
    LiteralFloat(f64),
    /// `string`
    String,
    /// A known string
    LiteralString(String),
    /// A string of exactly one character
    SingleLetter,
    /// `class-string`, or `class-string<Foo>`
    ClassString(Option<String>),
    /// `Foo::class`
    LiteralClassString(String),
    /// `array-key`: `int|string`
    ArrayKey,
    /// `numeric`: `int|float|numeric-string`
    Numeric,
    /// `scalar`: `bool|int|float|string`
    Scalar,
    /// `callable`
    Callable,
    /// `object`, any object
    Object,
    /// `array<K, V>`
    Array {
        /// The key type
        key: Box<Union>,
        /// The value type
        value: Box<Union>,
        /// The minimum number of elements, when known to be non-zero
        count: Option<usize>,
    },
    /// `array{a: int, b?: string}`
    ObjectShape {
        /// The known keys and their types. Optional keys have
        /// [`Union::possibly_undefined`] set.
        properties: IndexMap<ShapeKey, Union>,
        /// Whether keys other than the listed ones are known to be absent
        sealed: bool,
    },
    /// An instance of a class, with optional template arguments
    NamedObject {
        /// The class name, as declared
        name: String,
        /// The template arguments, in declaration order
        type_params: Option<Vec<Union>>,
    },
    /// An unbound template parameter
    GenericParam {
        /// The parameter name, e.g. `T`
        name: String,
        /// The class or function declaring it, lowercased
        defining_entity: String,
        /// The upper bound
        as_type: Box<Union>,
    },
    /// `Foo::BAR` used as a type, resolved against the codebase later
    ScalarClassConstant {
        /// The class name as written
        class: String,
        /// The constant name
        name: String,
    },
}

impl Atomic {
    /// `array<K, V>`
    #[must_use]
    pub fn array(key: Union, value: Union) -> Self {
        Self::Array {
            key: Box::new(key),
            value: Box::new(value),
            count: None,
        }
    }

    /// `array<array-key, mixed>`
    #[must_use]
    pub fn mixed_array() -> Self {
        Self::array(Union::from(Self::ArrayKey), Union::mixed())
    }

    /// `array<empty, empty>`, the type of `[]`
    #[must_use]
    pub fn empty_array() -> Self {
        Self::array(Union::empty(), Union::empty())
    }

    /// An instance of `name` without template arguments
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::NamedObject {
            name: name.to_string(),
            type_params: None,
        }
    }

    /// The stable, unique identifier of this type. Template parameters are
    /// qualified by their defining entity (`T:box`).
    #[must_use]
    pub fn get_id(&self) -> String {
        self.render(true)
    }

    /// The type as written, qualifying template parameters when
    /// `with_entities` is set
    fn render(&self, with_entities: bool) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Void => "void".to_string(),
            Self::Mixed => "mixed".to_string(),
            Self::Empty => "empty".to_string(),
            Self::Resource => "resource".to_string(),
            Self::Bool => "bool".to_string(),
            Self::True => "true".to_string(),
            Self::False => "false".to_string(),
            Self::Int => "int".to_string(),
            Self::LiteralInt(n) => format!("int({n})"),
            Self::Float => "float".to_string(),
            Self::LiteralFloat(n) => format!("float({n})"),
            Self::String => "string".to_string(),
            Self::LiteralString(s) => format!("string({s})"),
            Self::SingleLetter => "single-letter".to_string(),
            Self::ClassString(None) => "class-string".to_string(),
            Self::ClassString(Some(class)) => format!("class-string<{class}>"),
            Self::LiteralClassString(class) => format!("{class}::class"),
            Self::ArrayKey => "array-key".to_string(),
            Self::Numeric => "numeric".to_string(),
            Self::Scalar => "scalar".to_string(),
            Self::Callable => "callable".to_string(),
            Self::Object => "object".to_string(),
            Self::Array { key, value, count } => format!(
                "{}<{}, {}>",
                if count.is_some_and(|count| count > 0) {
                    "non-empty-array"
                } else {
                    "array"
                },
                render_union(key, with_entities),
                render_union(value, with_entities),
            ),
            Self::ObjectShape { properties, sealed } => {
                let mut entries = properties
                    .iter()
                    .map(|(key, value)| {
                        format!(
                            "{key}{}: {}",
                            if value.possibly_undefined { "?" } else { "" },
                            render_union(value, with_entities),
                        )
                    })
                    .collect::<Vec<_>>();
                if !sealed {
                    entries.push("...".to_string());
                }
                format!("array{{{}}}", entries.join(", "))
            }
            Self::NamedObject {
                name,
                type_params: None,
            } => name.clone(),
            Self::NamedObject {
                name,
                type_params: Some(params),
            } => format!(
                "{name}<{}>",
                params
                    .iter()
                    .map(|param| render_union(param, with_entities))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::GenericParam {
                name,
                defining_entity,
                ..
            } => {
                if with_entities {
                    format!("{name}:{defining_entity}")
                } else {
                    name.clone()
                }
            }
            Self::ScalarClassConstant { class, name } => format!("{class}::{name}"),
        }
    }

    /// Whether this is one of the scalar types
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::True
                | Self::False
                | Self::Int
                | Self::LiteralInt(_)
                | Self::Float
                | Self::LiteralFloat(_)
                | Self::String
                | Self::LiteralString(_)
                | Self::SingleLetter
                | Self::ClassString(_)
                | Self::LiteralClassString(_)
                | Self::ArrayKey
                | Self::Numeric
                | Self::Scalar
        )
    }

    /// Whether this is an integer type
    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int | Self::LiteralInt(_))
    }

    /// Whether this is a float type
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::LiteralFloat(_))
    }

    /// Whether this is a string type
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(
            self,
            Self::String
                | Self::LiteralString(_)
                | Self::SingleLetter
                | Self::ClassString(_)
                | Self::LiteralClassString(_)
        )
    }

    /// Whether this is `array<K, V>` or a shape
    #[must_use]
    pub const fn is_array_like(&self) -> bool {
        matches!(self, Self::Array { .. } | Self::ObjectShape { .. })
    }

    /// Whether this is an object type
    #[must_use]
    pub const fn is_object_type(&self) -> bool {
        matches!(self, Self::NamedObject { .. } | Self::Object)
    }

    /// Whether this is a literal value type
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::LiteralInt(_)
                | Self::LiteralFloat(_)
                | Self::LiteralString(_)
                | Self::LiteralClassString(_)
        )
    }

    /// The non-literal type this type widens to
    #[must_use]
    pub fn generalize(&self) -> Self {
        match self {
            Self::LiteralInt(_) => Self::Int,
            Self::LiteralFloat(_) => Self::Float,
            Self::LiteralString(_) | Self::SingleLetter => Self::String,
            Self::Array { key, value, count } => Self::Array {
                key: Box::new(key.generalize_literals()),
                value: Box::new(value.generalize_literals()),
                count: *count,
            },
            Self::ObjectShape { properties, sealed } => Self::ObjectShape {
                properties: properties
                    .iter()
                    .map(|(key, value)| (key.clone(), value.generalize_literals()))
                    .collect(),
                sealed: *sealed,
            },
            other => other.clone(),
        }
    }

    /// Whether every value of this type is truthy
    #[must_use]
    pub fn is_always_truthy(&self) -> bool {
        match self {
            Self::True
            | Self::NamedObject { .. }
            | Self::Object
            | Self::Resource
            | Self::Callable
            | Self::ClassString(_)
            | Self::LiteralClassString(_) => true,
            Self::LiteralInt(n) => *n != 0,
            Self::LiteralFloat(n) => *n != 0.0,
            Self::LiteralString(s) => !s.is_empty() && s != "0",
            Self::Array { count, .. } => count.is_some_and(|count| count > 0),
            Self::ObjectShape { properties, .. } => {
                properties.values().any(|value| !value.possibly_undefined)
            }
            _ => false,
        }
    }

    /// Whether every value of this type is falsy
    #[must_use]
    pub fn is_always_falsy(&self) -> bool {
        match self {
            Self::Null | Self::Void | Self::False => true,
            Self::LiteralInt(n) => *n == 0,
            Self::LiteralFloat(n) => *n == 0.0,
            Self::LiteralString(s) => s.is_empty() || s == "0",
            Self::Array { key, value, .. } => key.is_empty_type() && value.is_empty_type(),
            Self::ObjectShape { properties, .. } => properties.is_empty(),
            _ => false,
        }
    }
}

/// A nested union, as an id or as display text
fn render_union(ty: &Union, with_entities: bool) -> String {
    if with_entities {
        ty.get_id()
    } else {
        ty.to_string()
    }
}

impl Display for Atomic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_per_literal() {
        assert_eq!(Atomic::LiteralInt(5).get_id(), "int(5)");
        assert_eq!(Atomic::LiteralString("a".into()).get_id(), "string(a)");
        assert_ne!(Atomic::Int.get_id(), Atomic::LiteralInt(0).get_id());
    }

    #[test]
    fn template_ids_name_their_entity() {
        let param = |entity: &str| Atomic::GenericParam {
            name: "T".to_string(),
            defining_entity: entity.to_string(),
            as_type: Box::new(Union::mixed()),
        };
        assert_eq!(param("box").get_id(), "T:box");
        assert_eq!(param("box").to_string(), "T");

        let both = Union::new(vec![param("box"), param("f")]);
        assert_eq!(both.len(), 2);
        assert_eq!(both.get_id(), "T:box|T:f");

        let boxed = Atomic::NamedObject {
            name: "Box".to_string(),
            type_params: Some(vec![Union::from(param("box"))]),
        };
        assert_eq!(boxed.get_id(), "Box<T:box>");
        assert_eq!(boxed.to_string(), "Box<T>");
    }

    #[test]
    fn shape_ids_list_keys_in_order() {
        let mut optional = Union::string();
        optional.possibly_undefined = true;
        let shape = Atomic::ObjectShape {
            properties: IndexMap::from([
                (ShapeKey::String("a".into()), Union::int()),
                (ShapeKey::String("b c".into()), optional),
                (ShapeKey::Int(0), Union::null()),
            ]),
            sealed: true,
        };
        assert_eq!(shape.get_id(), "array{a: int, 'b c'?: string, 0: null}");
    }

    #[test]
    fn numeric_string_keys_become_ints() {
        assert_eq!(ShapeKey::from_string("3"), ShapeKey::Int(3));
        assert_eq!(ShapeKey::from_string("03"), ShapeKey::String("03".into()));
    }

    #[test]
    fn truthiness() {
        assert!(Atomic::LiteralString("a".into()).is_always_truthy());
        assert!(Atomic::LiteralString("0".into()).is_always_falsy());
        assert!(Atomic::empty_array().is_always_falsy());
        assert!(!Atomic::Int.is_always_truthy());
        assert!(!Atomic::Int.is_always_falsy());
    }
}
