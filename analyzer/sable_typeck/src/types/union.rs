//! The [`Union`] type container

use std::fmt::Display;

use indexmap::IndexMap;

use super::Atomic;

/// An ordered, id-deduplicated set of [`Atomic`] types: "exactly one of
/// these, unknown which"
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    /// The member types keyed by [`Atomic::get_id`], in insertion order
    types: IndexMap<String, Atomic>,
    /// Whether this came from an explicit annotation rather than inference
    pub from_declaration: bool,
    /// Whether the value this describes may not exist at all
    pub possibly_undefined: bool,
    /// Whether `null` members should not be reported at use sites
    pub ignore_nullable_issues: bool,
    /// Whether `false` members should not be reported at use sites
    pub ignore_falsable_issues: bool,
    /// Whether this describes a by-reference binding
    pub by_ref: bool,
    /// Whether a type check narrowed this from `mixed`
    pub from_mixed: bool,
}

impl Union {
    /// Build a union from a list of atomics, dropping duplicates. No
    /// structural merging happens; use [`super::combine`] for that.
    ///
    /// An empty list gives the bottom type.
    #[must_use]
    pub fn new(atomics: Vec<Atomic>) -> Self {
        if atomics.is_empty() {
            return Self::empty();
        }
        Self {
            types: atomics
                .into_iter()
                .map(|atomic| (atomic.get_id(), atomic))
                .collect(),
            from_declaration: false,
            possibly_undefined: false,
            ignore_nullable_issues: false,
            ignore_falsable_issues: false,
            by_ref: false,
            from_mixed: false,
        }
    }

    /// `mixed`
    #[must_use]
    pub fn mixed() -> Self {
        Self::from(Atomic::Mixed)
    }

    /// The bottom type
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: IndexMap::from([(Atomic::Empty.get_id(), Atomic::Empty)]),
            from_declaration: false,
            possibly_undefined: false,
            ignore_nullable_issues: false,
            ignore_falsable_issues: false,
            by_ref: false,
            from_mixed: false,
        }
    }

    /// `null`
    #[must_use]
    pub fn null() -> Self {
        Self::from(Atomic::Null)
    }

    /// `void`
    #[must_use]
    pub fn void() -> Self {
        Self::from(Atomic::Void)
    }

    /// `int`
    #[must_use]
    pub fn int() -> Self {
        Self::from(Atomic::Int)
    }

    /// `float`
    #[must_use]
    pub fn float() -> Self {
        Self::from(Atomic::Float)
    }

    /// `string`
    #[must_use]
    pub fn string() -> Self {
        Self::from(Atomic::String)
    }

    /// `bool`
    #[must_use]
    pub fn bool() -> Self {
        Self::from(Atomic::Bool)
    }

    /// `false`
    #[must_use]
    pub fn false_() -> Self {
        Self::from(Atomic::False)
    }

    /// `true`
    #[must_use]
    pub fn true_() -> Self {
        Self::from(Atomic::True)
    }

    /// An instance of `name`
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self::from(Atomic::named(name))
    }

    /// The member types, in order
    pub fn atomics(&self) -> impl Iterator<Item = &Atomic> + '_ {
        self.types.values()
    }

    /// The member types, consuming the union
    #[must_use]
    pub fn into_atomics(self) -> Vec<Atomic> {
        self.types.into_values().collect()
    }

    /// Look up a member by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Atomic> {
        self.types.get(id)
    }

    /// Whether a member with this id is present
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// The number of member types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always `false`: a union holds at least the bottom type. Provided for
    /// the `len`/`is_empty` pairing; see [`Self::is_empty_type`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Add one member, replacing any member with the same id
    pub fn add(&mut self, atomic: Atomic) {
        if self.is_empty_type() && atomic != Atomic::Empty {
            self.types.clear();
        }
        self.types.insert(atomic.get_id(), atomic);
    }

    /// Remove the member with this id
    pub fn remove(&mut self, id: &str) -> Option<Atomic> {
        let removed = self.types.shift_remove(id);
        if self.types.is_empty() {
            self.types.insert(Atomic::Empty.get_id(), Atomic::Empty);
        }
        removed
    }

    /// Keep only the members matching `keep`. Removing everything leaves the
    /// bottom type.
    pub fn retain(&mut self, mut keep: impl FnMut(&Atomic) -> bool) {
        self.types.retain(|_, atomic| keep(atomic));
        if self.types.is_empty() {
            self.types.insert(Atomic::Empty.get_id(), Atomic::Empty);
        }
    }

    /// Copy the metadata flags of `other` onto this union
    #[must_use]
    pub const fn with_flags_of(mut self, other: &Self) -> Self {
        self.from_declaration = other.from_declaration;
        self.possibly_undefined = other.possibly_undefined;
        self.ignore_nullable_issues = other.ignore_nullable_issues;
        self.ignore_falsable_issues = other.ignore_falsable_issues;
        self.by_ref = other.by_ref;
        self.from_mixed = other.from_mixed;
        self
    }

    /// Set [`Self::possibly_undefined`]
    #[must_use]
    pub const fn possibly_undefined(mut self, possibly_undefined: bool) -> Self {
        self.possibly_undefined = possibly_undefined;
        self
    }

    /// Set [`Self::from_declaration`]
    #[must_use]
    pub const fn from_declaration(mut self) -> Self {
        self.from_declaration = true;
        self
    }

    /// Set [`Self::from_mixed`]
    #[must_use]
    pub const fn from_mixed(mut self) -> Self {
        self.from_mixed = true;
        self
    }

    /// The stable identifier of the whole union
    #[must_use]
    pub fn get_id(&self) -> String {
        self.types.keys().cloned().collect::<Vec<_>>().join("|")
    }

    /// Whether `mixed` is a member
    #[must_use]
    pub fn is_mixed(&self) -> bool {
        self.types.values().any(|atomic| matches!(atomic, Atomic::Mixed))
    }

    /// Whether this is the bottom type
    #[must_use]
    pub fn is_empty_type(&self) -> bool {
        self.types.values().all(|atomic| matches!(atomic, Atomic::Empty))
    }

    /// Whether this is exactly `null`
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.types.len() == 1 && self.has("null")
    }

    /// Whether this is exactly `void`
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.types.len() == 1 && self.has("void")
    }

    /// Whether `null` is a member
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.has("null")
    }

    /// Whether `false` is a member
    #[must_use]
    pub fn is_falsable(&self) -> bool {
        self.has("false")
    }

    /// Whether there is exactly one member
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.types.len() == 1
    }

    /// The only member, if there is exactly one
    #[must_use]
    pub fn single(&self) -> Option<&Atomic> {
        if self.is_single() {
            self.types.values().next()
        } else {
            None
        }
    }

    /// Whether every member is an integer type
    #[must_use]
    pub fn is_int(&self) -> bool {
        self.types.values().all(Atomic::is_int)
    }

    /// Whether every member is a string type
    #[must_use]
    pub fn is_string(&self) -> bool {
        self.types.values().all(Atomic::is_string)
    }

    /// Whether some member is an integer type
    #[must_use]
    pub fn has_int(&self) -> bool {
        self.types.values().any(Atomic::is_int)
    }

    /// Whether some member is a float type
    #[must_use]
    pub fn has_float(&self) -> bool {
        self.types.values().any(Atomic::is_float)
    }

    /// Whether some member is a string type
    #[must_use]
    pub fn has_string(&self) -> bool {
        self.types.values().any(Atomic::is_string)
    }

    /// Whether some member is an array or shape
    #[must_use]
    pub fn has_array(&self) -> bool {
        self.types.values().any(Atomic::is_array_like)
    }

    /// Whether some member is an object type
    #[must_use]
    pub fn has_object_type(&self) -> bool {
        self.types.values().any(Atomic::is_object_type)
    }

    /// Whether every value of this type is truthy
    #[must_use]
    pub fn is_always_truthy(&self) -> bool {
        !self.possibly_undefined && self.types.values().all(Atomic::is_always_truthy)
    }

    /// Whether every value of this type is falsy
    #[must_use]
    pub fn is_always_falsy(&self) -> bool {
        self.types.values().all(Atomic::is_always_falsy)
    }

    /// The literal integer this holds, if it is exactly one
    #[must_use]
    pub fn get_single_literal_int(&self) -> Option<i64> {
        match self.single() {
            Some(Atomic::LiteralInt(n)) => Some(*n),
            _ => None,
        }
    }

    /// The literal string this holds, if it is exactly one
    #[must_use]
    pub fn get_single_literal_string(&self) -> Option<&str> {
        match self.single() {
            Some(Atomic::LiteralString(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether every member is a literal value
    #[must_use]
    pub fn all_literals(&self) -> bool {
        self.types.values().all(Atomic::is_literal)
    }

    /// The same union with every literal widened to its base type
    #[must_use]
    pub fn generalize_literals(&self) -> Self {
        Self::new(self.types.values().map(Atomic::generalize).collect()).with_flags_of(self)
    }

    /// The same union without `null`
    #[must_use]
    pub fn without_null(&self) -> Self {
        let mut ty = self.clone();
        ty.remove("null");
        ty
    }
}

impl From<Atomic> for Union {
    fn from(atomic: Atomic) -> Self {
        Self::new(vec![atomic])
    }
}

impl Display for Union {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.types
                .values()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("|")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_deduplicates_by_id() {
        let ty = Union::new(vec![Atomic::Int, Atomic::Null, Atomic::Int]);
        assert_eq!(ty.to_string(), "int|null");
        assert_eq!(ty.len(), 2);
    }

    #[test]
    fn removing_everything_leaves_bottom() {
        let mut ty = Union::null();
        ty.remove("null");
        assert!(ty.is_empty_type());
        ty.add(Atomic::Int);
        assert_eq!(ty.to_string(), "int");
    }

    #[test]
    fn generalize_keeps_flags() {
        let ty = Union::from(Atomic::LiteralInt(4)).possibly_undefined(true);
        let general = ty.generalize_literals();
        assert_eq!(general.to_string(), "int");
        assert!(general.possibly_undefined);
    }

    #[test]
    fn single_literals() {
        assert_eq!(Union::from(Atomic::LiteralInt(3)).get_single_literal_int(), Some(3));
        assert_eq!(Union::int().get_single_literal_int(), None);
        assert_eq!(
            Union::from(Atomic::LiteralString("k".into())).get_single_literal_string(),
            Some("k")
        );
    }
}
