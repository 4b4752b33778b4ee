//! Argument dictionaries.
//!
//! An [`ArgDict`] is where the composition engine looks up the value behind a
//! `$N` or `:name` placeholder. Positional lists answer ordinal lookups, maps
//! and structs answer named ones.

use crate::param::{Arg, IntoArg};
use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::ops::Range;

/// Which placeholder flavour a template uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// `$1`, `$2`, ...
    Ordinal,
    /// `:name`
    Named,
}

/// A source of composition arguments.
///
/// `by_ordinal` takes a 0-based index (`$1` looks up index `0`).
///
/// `ordinals` / `named_keys` enumerate every key the dictionary holds and are
/// only used to detect unused arguments. Sources that cannot enumerate their
/// keys return `None` and are skipped by that check.
pub trait ArgDict {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether lookups of `kind` are meaningful for this source.
    fn accepts(&self, kind: ParamKind) -> bool;

    fn by_ordinal(&self, _index: usize) -> Option<Arg> {
        None
    }

    fn by_named(&self, _key: &str) -> Option<Arg> {
        None
    }

    fn ordinals(&self) -> Option<Range<usize>> {
        None
    }

    fn named_keys(&self) -> Option<Vec<&str>> {
        None
    }
}

impl<D: ArgDict + ?Sized> ArgDict for &D {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn accepts(&self, kind: ParamKind) -> bool {
        (**self).accepts(kind)
    }

    fn by_ordinal(&self, index: usize) -> Option<Arg> {
        (**self).by_ordinal(index)
    }

    fn by_named(&self, key: &str) -> Option<Arg> {
        (**self).by_named(key)
    }

    fn ordinals(&self) -> Option<Range<usize>> {
        (**self).ordinals()
    }

    fn named_keys(&self) -> Option<Vec<&str>> {
        (**self).named_keys()
    }
}

// ==================== Positional ====================

impl ArgDict for [Arg] {
    fn len(&self) -> usize {
        <[Arg]>::len(self)
    }

    fn accepts(&self, kind: ParamKind) -> bool {
        kind == ParamKind::Ordinal
    }

    fn by_ordinal(&self, index: usize) -> Option<Arg> {
        self.get(index).cloned()
    }

    fn ordinals(&self) -> Option<Range<usize>> {
        Some(0..<[Arg]>::len(self))
    }
}

impl ArgDict for Vec<Arg> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn accepts(&self, kind: ParamKind) -> bool {
        self.as_slice().accepts(kind)
    }

    fn by_ordinal(&self, index: usize) -> Option<Arg> {
        self.as_slice().by_ordinal(index)
    }

    fn ordinals(&self) -> Option<Range<usize>> {
        self.as_slice().ordinals()
    }
}

/// Positional arguments for `$N` templates. Usually built with [`args!`](crate::args).
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Arg>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one argument; `$N` refers to the N-th pushed value.
    pub fn push(&mut self, value: impl IntoArg) -> &mut Self {
        self.0.push(value.into_arg());
        self
    }

    pub fn as_slice(&self) -> &[Arg] {
        &self.0
    }
}

impl From<Vec<Arg>> for Args {
    fn from(args: Vec<Arg>) -> Self {
        Self(args)
    }
}

impl ArgDict for Args {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn accepts(&self, kind: ParamKind) -> bool {
        kind == ParamKind::Ordinal
    }

    fn by_ordinal(&self, index: usize) -> Option<Arg> {
        self.0.get(index).cloned()
    }

    fn ordinals(&self) -> Option<Range<usize>> {
        Some(0..self.0.len())
    }
}

// ==================== Named ====================

/// Named arguments for `:name` templates. Usually built with [`named!`](crate::named).
#[derive(Debug, Clone, Default)]
pub struct NamedArgs(BTreeMap<String, Arg>);

impl NamedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the argument for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl IntoArg) -> &mut Self {
        self.0.insert(key.into(), value.into_arg());
        self
    }
}

impl ArgDict for NamedArgs {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn accepts(&self, kind: ParamKind) -> bool {
        kind == ParamKind::Named
    }

    fn by_named(&self, key: &str) -> Option<Arg> {
        self.0.get(key).cloned()
    }

    fn named_keys(&self) -> Option<Vec<&str>> {
        Some(self.0.keys().map(String::as_str).collect())
    }
}

impl<S: std::hash::BuildHasher> ArgDict for HashMap<String, Arg, S> {
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn accepts(&self, kind: ParamKind) -> bool {
        kind == ParamKind::Named
    }

    fn by_named(&self, key: &str) -> Option<Arg> {
        self.get(key).cloned()
    }

    fn named_keys(&self) -> Option<Vec<&str>> {
        Some(self.keys().map(String::as_str).collect())
    }
}

impl ArgDict for BTreeMap<String, Arg> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn accepts(&self, kind: ParamKind) -> bool {
        kind == ParamKind::Named
    }

    fn by_named(&self, key: &str) -> Option<Arg> {
        self.get(key).cloned()
    }

    fn named_keys(&self) -> Option<Vec<&str>> {
        Some(self.keys().map(String::as_str).collect())
    }
}

// ==================== Struct fields ====================

/// Field lookup for a struct used as a named argument source.
///
/// Implemented by `#[derive(FieldArgs)]`; each non-skipped field is reachable
/// under its external name.
pub trait FieldArgs {
    fn field_names() -> &'static [&'static str];

    fn field_arg(&self, name: &str) -> Option<Arg>;

    /// Borrow `self` as an [`ArgDict`].
    fn as_args(&self) -> StructArgs<'_, Self>
    where
        Self: Sized,
    {
        StructArgs::new(self)
    }
}

/// [`ArgDict`] view over a [`FieldArgs`] struct.
///
/// Struct sources are not enumerated for unused-argument validation: a
/// template may legitimately reference only some of the fields.
pub struct StructArgs<'a, T> {
    inner: &'a T,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: FieldArgs> StructArgs<'a, T> {
    pub fn new(inner: &'a T) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<T: FieldArgs> ArgDict for StructArgs<'_, T> {
    fn len(&self) -> usize {
        T::field_names().len()
    }

    fn accepts(&self, kind: ParamKind) -> bool {
        kind == ParamKind::Named
    }

    fn by_named(&self, key: &str) -> Option<Arg> {
        self.inner.field_arg(key)
    }
}

/// Build positional [`Args`](crate::Args).
///
/// ```ignore
/// let args = sqlweave::args![10, "x", sqlweave::sql("select 1")];
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Args::from(::std::vec![$($crate::IntoArg::into_arg($value)),+])
    };
}

/// Build [`NamedArgs`](crate::NamedArgs).
///
/// ```ignore
/// let args = sqlweave::named! { "id" => 42_i64, "name" => "x" };
/// ```
#[macro_export]
macro_rules! named {
    () => {
        $crate::NamedArgs::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut named = $crate::NamedArgs::new();
        $( named.insert($key, $value); )+
        named
    }};
}
