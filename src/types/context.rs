use std::collections::HashMap;

use super::Value;

/// Attribute values of the subject being targeted.
///
/// Keys are attribute names exactly as criteria spell them (`"user.country"`
/// is one name, not a path). Each attribute holds one or more values; a
/// criterion matches a multi-valued attribute when any of its values does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    attributes: HashMap<String, Vec<Value>>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single-valued attribute, replacing any previous values.
    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Set a multi-valued attribute, replacing any previous values.
    #[must_use]
    pub fn set_list<V: Into<Value>>(mut self, name: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.attributes
            .insert(name.to_owned(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_owned(), vec![value]);
    }

    /// Append `value` to the attribute's values.
    pub fn push(&mut self, name: &str, value: Value) {
        self.attributes.entry(name.to_owned()).or_default().push(value);
    }

    /// The values of an attribute, or `None` if it was never set.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut ctx = Context::new();
        for (name, value) in iter {
            ctx.push(&name.into(), value.into());
        }
        ctx
    }
}
