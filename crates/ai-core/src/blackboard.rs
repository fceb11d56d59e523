use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// Typed view over a string blackboard key.
///
/// The name is the identity: two keys with the same name address the same slot regardless of
/// `T`. Reading a slot through a key of the wrong type yields `None`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> BbKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

/// Untyped key/value scratch space scoped to one behavior tree.
///
/// Slots are created lazily on first write. Readers must tolerate absence: every accessor
/// returns `Option` and never panics, including on a type mismatch.
#[derive(Default)]
pub struct Blackboard {
    values: BTreeMap<String, Box<dyn Any>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns `true` if anything is stored under the key's name, whatever its type.
    pub fn contains<T: 'static>(&self, key: BbKey<T>) -> bool {
        self.values.contains_key(key.name)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set<T: 'static>(&mut self, key: BbKey<T>, value: T) {
        self.values.insert(key.name.to_owned(), Box::new(value));
    }

    /// Stores a value under a name only known at runtime.
    pub fn set_named<T: 'static>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Box::new(value));
    }

    pub fn get<T: 'static>(&self, key: BbKey<T>) -> Option<&T> {
        self.get_as(key.name)
    }

    pub fn get_as<T: 'static>(&self, name: &str) -> Option<&T> {
        let value = self.values.get(name)?;
        let typed = value.downcast_ref::<T>();
        if typed.is_none() {
            log_mismatch::<T>(name);
        }
        typed
    }

    pub fn get_mut<T: 'static>(&mut self, key: BbKey<T>) -> Option<&mut T> {
        let value = self.values.get_mut(key.name)?;
        let typed = value.downcast_mut::<T>();
        if typed.is_none() {
            log_mismatch::<T>(key.name);
        }
        typed
    }

    pub fn get_or<T: Clone + 'static>(&self, key: BbKey<T>, default: T) -> T {
        self.get(key).cloned().unwrap_or(default)
    }

    /// Reads a boolean flag; a missing or mistyped slot is `false`.
    pub fn flag(&self, key: BbKey<bool>) -> bool {
        self.get(key).copied().unwrap_or(false)
    }

    /// Removes and returns the value if it is stored with type `T`.
    ///
    /// A value stored under another type is left untouched.
    pub fn remove<T: 'static>(&mut self, key: BbKey<T>) -> Option<T> {
        if !self.values.get(key.name)?.is::<T>() {
            log_mismatch::<T>(key.name);
            return None;
        }
        let value = self.values.remove(key.name)?;
        value.downcast::<T>().ok().map(|b| *b)
    }

    /// Removes whatever is stored under `name`. Returns `true` if a slot existed.
    pub fn remove_name(&mut self, name: &str) -> bool {
        self.values.remove(name).is_some()
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blackboard")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn log_mismatch<T>(name: &str) {
    tracing::debug!(
        key = name,
        requested = type_name::<T>(),
        "blackboard type mismatch; treating slot as absent"
    );
}
