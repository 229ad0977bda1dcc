use crate::util::escape_and_elide;
use core::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Header {
    pub name: String,
    pub value: String,
}
impl Header {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
impl Debug for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(
            f,
            "Header({}:{})",
            escape_and_elide(self.name.as_bytes(), 30),
            escape_and_elide(self.value.as_bytes(), 1000)
        )
    }
}
impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// An ordered, multi-valued header collection.
///
/// Keeps headers in the order they were added, including repeated names.
/// Lookups compare names case-insensitively.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct HeaderList(Vec<Header>);
impl HeaderList {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a header.
    ///
    /// You can call this multiple times to add multiple headers with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Header::new(name, value));
    }

    pub fn push(&mut self, header: Header) {
        self.0.push(header);
    }

    /// Searches for a header that matches `name`.
    /// Uses a case-insensitive comparison.
    ///
    /// Returns `None` when multiple headers matched or none matched.
    pub fn get_only(&self, name: impl AsRef<str>) -> Option<&str> {
        let mut value = None;
        for header in &self.0 {
            if header.name.eq_ignore_ascii_case(name.as_ref()) {
                if value.is_some() {
                    return None;
                }
                value = Some(header.value.as_str());
            }
        }
        value
    }

    /// Returns the values of all headers named `name`, in insertion order.
    pub fn get_all(&self, name: impl AsRef<str>) -> Vec<&str> {
        self.0
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case(name.as_ref()))
            .map(|h| h.value.as_str())
            .collect()
    }

    #[must_use]
    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.0
            .iter()
            .any(|h| h.name.eq_ignore_ascii_case(name.as_ref()))
    }

    /// Removes all headers with the specified `name`, keeping the order of the rest.
    ///
    /// Returns the removed values.
    pub fn remove_all(&mut self, name: impl AsRef<str>) -> Vec<String> {
        let mut values = Vec::new();
        self.0.retain(|h| {
            if h.name.eq_ignore_ascii_case(name.as_ref()) {
                values.push(h.value.clone());
                false
            } else {
                true
            }
        });
        values
    }
}
impl Debug for HeaderList {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        let strings: Vec<String> = self
            .iter()
            .map(|h| format!("{}: {:?}", h.name, h.value))
            .collect();
        write!(f, "{{{}}}", strings.join(", "))
    }
}
impl Deref for HeaderList {
    type Target = Vec<Header>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl<'x> IntoIterator for &'x HeaderList {
    type Item = &'x Header;
    type IntoIter = core::slice::Iter<'x, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(n, v)| Header::new(n, v)).collect())
    }
}
