//! Stored value wrapper

/// A value held by the dictionary
///
/// The payload is opaque to the dictionary; its ownership is the caller's
/// concern once handed back.
#[derive(Debug, Clone, PartialEq)]
pub struct Object<V> {
    pub value: V,
}

impl<V> Object<V> {
    /// Wrap a value
    pub fn new(value: V) -> Self {
        Object { value }
    }
}
