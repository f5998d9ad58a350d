//! Attribute Lists
//!
//! Two storage strategies behind one capability trait:
//!
//! - [`AttributeView`] borrows the tokenizer's span array and scratch
//!   buffer. It exists only for the duration of a `start_element` callback;
//!   the borrow checker rejects any attempt to keep it.
//! - [`AttributeSnapshot`] owns its names and values and can be edited.
//!
//! Both keep document order. Lookups by name return the first match.

use std::fmt;

use crate::core::attributes::RawAttribute;

/// Read access shared by every attribute list
pub trait Attributes {
    /// Number of attributes
    fn len(&self) -> usize;

    /// Name of the attribute at `index`
    fn name_at(&self, index: usize) -> Option<&str>;

    /// Value of the attribute at `index`
    fn value_at(&self, index: usize) -> Option<&str>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the first attribute called `name`
    fn position(&self, name: &str) -> Option<usize> {
        (0..self.len()).find(|&i| self.name_at(i) == Some(name))
    }

    /// Value of the first attribute called `name`; `None` when absent
    fn value_of(&self, name: &str) -> Option<&str> {
        self.position(name).and_then(|i| self.value_at(i))
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// (name, value) pairs in document order
    fn iter(&self) -> Iter<'_, Self> {
        Iter { attrs: self, index: 0 }
    }

    /// Copy into an owned, editable list
    fn to_snapshot(&self) -> AttributeSnapshot {
        let mut snapshot = AttributeSnapshot::with_capacity(self.len());
        for i in 0..self.len() {
            if let (Some(name), Some(value)) = (self.name_at(i), self.value_at(i)) {
                snapshot.push(name, value);
            }
        }
        snapshot
    }
}

/// Iterator over (name, value) pairs of any [`Attributes`]
pub struct Iter<'s, A: ?Sized> {
    attrs: &'s A,
    index: usize,
}

impl<'s, A: Attributes + ?Sized> Iterator for Iter<'s, A> {
    type Item = (&'s str, &'s str);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.attrs.name_at(self.index)?;
        let value = self.attrs.value_at(self.index)?;
        self.index += 1;
        Some((name, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.attrs.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

/// Borrowed attributes of the start tag being reported.
///
/// Valid only inside the callback that receives it; call
/// [`Attributes::to_snapshot`] to keep the data.
#[derive(Clone, Copy)]
pub struct AttributeView<'a> {
    /// Tokenizer buffer holding names and undecoded values
    source: &'a str,
    /// Decoded values
    scratch: &'a str,
    raw: &'a [RawAttribute],
}

impl<'a> AttributeView<'a> {
    pub(crate) fn new(source: &'a str, scratch: &'a str, raw: &'a [RawAttribute]) -> Self {
        AttributeView { source, scratch, raw }
    }

    /// A view with no attributes
    pub fn empty() -> Self {
        AttributeView {
            source: "",
            scratch: "",
            raw: &[],
        }
    }
}

impl Attributes for AttributeView<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    fn name_at(&self, index: usize) -> Option<&str> {
        self.raw.get(index).map(|a| a.name(self.source))
    }

    #[inline]
    fn value_at(&self, index: usize) -> Option<&str> {
        self.raw.get(index).map(|a| a.value(self.source, self.scratch))
    }
}

impl fmt::Debug for AttributeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Owned, editable attribute list.
///
/// Names and values live in two parallel vectors in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSnapshot {
    names: Vec<String>,
    values: Vec<String>,
}

impl AttributeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        AttributeSnapshot {
            names: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append a pair without checking for an existing name
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.names.push(name.into());
        self.values.push(value.into());
    }

    /// Replace the value of the first attribute called `name`, or append a
    /// new attribute if there is none.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        match self.position(name) {
            Some(i) => self.values[i] = value.into(),
            None => self.push(name, value),
        }
    }

    /// Rename the attribute at `index` in place, returning the old name.
    ///
    /// Returns `None` and changes nothing when `index` is out of range.
    pub fn set_name(&mut self, index: usize, name: impl Into<String>) -> Option<String> {
        let slot = self.names.get_mut(index)?;
        Some(std::mem::replace(slot, name.into()))
    }

    /// Remove the first attribute called `name`, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let i = self.position(name)?;
        self.names.remove(i);
        Some(self.values.remove(i))
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.values.clear();
    }

    /// Consume into (name, value) pairs
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.names.into_iter().zip(self.values).collect()
    }
}

impl Attributes for AttributeSnapshot {
    fn len(&self) -> usize {
        self.names.len()
    }

    fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    fn value_at(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }
}

impl From<&AttributeView<'_>> for AttributeSnapshot {
    fn from(view: &AttributeView<'_>) -> Self {
        view.to_snapshot()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for AttributeSnapshot {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut snapshot = AttributeSnapshot::new();
        for (name, value) in iter {
            snapshot.push(name, value);
        }
        snapshot
    }
}
