//! Named arguments handed to a registered function.

use std::ops::Index;

use indexmap::IndexMap;

/// Resolved parameter values for one invocation, in parameter order.
///
/// Indexing by a name the function did not declare panics, like indexing a
/// map with a missing key. Use [`Arguments::get`] to probe.
#[derive(Debug, Clone)]
pub struct Arguments<'a, V> {
    values: IndexMap<&'a str, V>,
}

impl<'a, V> Arguments<'a, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            values: IndexMap::with_capacity(capacity),
        }
    }

    pub(crate) fn insert(&mut self, name: &'a str, value: V) {
        self.values.insert(name, value);
    }

    /// Value of the named parameter.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// `(name, value)` pairs in parameter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<V> Index<&str> for Arguments<'_, V> {
    type Output = V;

    fn index(&self, name: &str) -> &V {
        match self.values.get(name) {
            Some(value) => value,
            None => panic!("no argument named `{name}`"),
        }
    }
}

impl<'a, V> FromIterator<(&'a str, V)> for Arguments<'a, V> {
    fn from_iter<I: IntoIterator<Item = (&'a str, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
