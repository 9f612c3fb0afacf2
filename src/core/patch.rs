//! Three-way field patches.
//!
//! `Patch<T>` distinguishes "leave the field alone" from "clear it" from
//! "set it", which `Option<T>` alone cannot do for nullable fields.

use serde::{Deserialize, Serialize};

/// Three-way patch for a single field.
///
/// - `Keep` - don't change the field
/// - `Clear` - set the field to None
/// - `Set(T)` - set the field to Some(T)
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    /// Don't change the field.
    #[default]
    Keep,
    /// Clear the field (set to None).
    Clear,
    /// Set the field to a new value.
    Set(T),
}

impl<T> Patch<T> {
    /// Whether applying this patch would leave the value untouched.
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// Apply the patch to the current value of a nullable field.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Keep => current,
            Patch::Clear => None,
            Patch::Set(v) => Some(v),
        }
    }

    /// Apply the patch in place to a non-nullable field (`Clear` is a keep).
    pub fn apply_required(self, target: &mut T) {
        if let Patch::Set(v) = self {
            *target = v;
        }
    }

    /// Borrowing view of the patched value, if this patch carries one.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(v) => Some(v),
            _ => None,
        }
    }
}

// Wire semantics: absent = Keep (via #[serde(default)] on the field),
// null = Clear, value = Set.
impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Patch::Keep | Patch::Clear => serializer.serialize_none(),
            Patch::Set(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let opt: Option<T> = Option::deserialize(deserializer)?;
        Ok(match opt {
            None => Patch::Clear,
            Some(v) => Patch::Set(v),
        })
    }
}
