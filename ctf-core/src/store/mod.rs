//! Persistent named-value store.
//!
//! All event state lives here as flat integer entries. Richer values are
//! layered on top by [`StoreExt`]:
//!
//! | Value     | Encoding                                          | Missing key |
//! |-----------|---------------------------------------------------|-------------|
//! | integer   | as-is                                             | `0`         |
//! | boolean   | `1` / `0`, true iff exactly `1`                   | `false`     |
//! | enum      | ordinal                                           | first member|
//! | position  | three entries `name[x]`, `name[y]`, `name[z]`     | origin      |
//!
//! Missing keys never error, so a fresh world needs no migration. There is no
//! multi-key atomicity; callers that need it serialize above the store.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use tracing::warn;

use crate::error::Result;
use crate::types::Position;

/// Backing medium for integer entries.
///
/// Keys handed to these methods are already normalized by [`normalize_key`].
pub trait KeyValueStore: Send + Sync {
    /// Read an entry, `None` if it was never written.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn load(&self, key: &str) -> Result<Option<i32>>;

    /// Write (upsert) an entry.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn save(&self, key: &str, value: i32) -> Result<()>;

    /// Every written key that starts with `prefix`, in no particular order.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Add `amount` to an entry (missing counts as 0) and return the new value.
    ///
    /// The default is a plain read-modify-write; backends that can do it in
    /// one statement should override it.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn add(&self, key: &str, amount: i32) -> Result<i32> {
        let value = self.load(key)?.unwrap_or(0).saturating_add(amount);
        self.save(key, value)?;
        Ok(value)
    }
}

/// Lower-case a key and replace whitespace with underscores.
#[must_use]
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// A finite, ordered set of values that can be stored by ordinal.
pub trait Ordinal: Sized + Copy {
    /// Position of this member in declaration order.
    fn ordinal(&self) -> i32;
    /// Member at `ordinal`, if any.
    fn from_ordinal(ordinal: i32) -> Option<Self>;
    /// The first declared member, used for missing entries.
    fn first() -> Self;
}

/// Typed accessors over any [`KeyValueStore`].
pub trait StoreExt: KeyValueStore {
    /// Integer value, `0` if missing.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn get_int(&self, name: &str) -> Result<i32> {
        Ok(self.load(&normalize_key(name))?.unwrap_or(0))
    }

    /// Set an integer value.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn set_int(&self, name: &str, value: i32) -> Result<()> {
        self.save(&normalize_key(name), value)
    }

    /// Increment an integer value and return the post-increment value.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn increment(&self, name: &str, amount: i32) -> Result<i32> {
        self.add(&normalize_key(name), amount)
    }

    /// Boolean value, `false` if missing.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn get_bool(&self, name: &str) -> Result<bool> {
        Ok(self.get_int(name)? == 1)
    }

    /// Set a boolean value.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn set_bool(&self, name: &str, value: bool) -> Result<()> {
        self.set_int(name, i32::from(value))
    }

    /// Position value, the origin if missing.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn get_position(&self, name: &str) -> Result<Position> {
        Ok(Position::new(
            self.get_int(&format!("{name}[x]"))?,
            self.get_int(&format!("{name}[y]"))?,
            self.get_int(&format!("{name}[z]"))?,
        ))
    }

    /// Set a position value.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn set_position(&self, name: &str, pos: Position) -> Result<()> {
        self.set_int(&format!("{name}[x]"), pos.x)?;
        self.set_int(&format!("{name}[y]"), pos.y)?;
        self.set_int(&format!("{name}[z]"), pos.z)
    }

    /// Enum value, the first member if missing or out of range.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn get_enum<T: Ordinal>(&self, name: &str) -> Result<T> {
        let ordinal = self.get_int(name)?;
        Ok(T::from_ordinal(ordinal).unwrap_or_else(|| {
            warn!(key = name, ordinal, "Stored ordinal out of range, using first member");
            T::first()
        }))
    }

    /// Set an enum value.
    ///
    /// # Errors
    /// Returns an error if the backing medium fails.
    fn set_enum<T: Ordinal>(&self, name: &str, value: T) -> Result<()> {
        self.set_int(name, value.ordinal())
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}
