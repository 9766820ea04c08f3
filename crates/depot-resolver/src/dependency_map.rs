use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter};

/// Flat package name -> version selector table built during resolution.
///
/// Keys are never overwritten: the first selector recorded for a name is the
/// one that sticks. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    entries: IndexMap<String, String>,
}

impl DependencyMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name -> selector` unless `name` is already present.
    /// Returns whether the entry was inserted.
    pub fn insert_if_absent(&mut self, name: &str, selector: &str) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), selector.to_string());
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl IntoIterator for DependencyMap {
    type Item = (String, String);
    type IntoIter = IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a DependencyMap {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DependencyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, selector) in iter {
            let (name, selector): (String, String) = (name.into(), selector.into());
            map.insert_if_absent(&name, &selector);
        }
        map
    }
}
