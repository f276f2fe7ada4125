// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the typed, non-owning [`Handle`].

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A lightweight, copyable reference to a resource of type `T`.
///
/// A handle only carries the resource id. It never keeps the resource alive and
/// must be resolved through the owning [`ResourceManager`](super::ResourceManager)
/// every time it is dereferenced, so every resolution is fallible.
///
/// The id `0` is reserved for the null handle.
pub struct Handle<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The null handle. It never resolves.
    pub const NULL: Self = Self {
        id: 0,
        _marker: PhantomData,
    };

    /// Builds a handle from a raw id. An id of `0` yields the null handle.
    pub const fn from_raw(id: u64) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Returns the raw id carried by this handle.
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Returns `true` unless this is the null handle.
    ///
    /// A valid handle may still fail to resolve if its resource was removed.
    pub const fn is_valid(&self) -> bool {
        self.id != 0
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = std::any::type_name::<T>();
        let short = full.rsplit("::").next().unwrap_or(full);
        write!(f, "Handle<{short}>({})", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Dummy;

    #[test]
    fn null_handle_is_invalid() {
        let handle: Handle<Dummy> = Handle::NULL;
        assert!(!handle.is_valid());
        assert_eq!(handle, Handle::default());
        assert_eq!(handle.id(), 0);
    }

    #[test]
    fn handles_compare_by_id() {
        let a: Handle<Dummy> = Handle::from_raw(3);
        let b: Handle<Dummy> = Handle::from_raw(7);
        let a_again: Handle<Dummy> = Handle::from_raw(3);

        assert_eq!(a, a_again);
        assert_ne!(a, b);
        assert!(a < b);

        let set: HashSet<Handle<Dummy>> = [a, b, a_again].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn debug_output_names_the_type() {
        let handle: Handle<Dummy> = Handle::from_raw(42);
        assert_eq!(format!("{handle:?}"), "Handle<Dummy>(42)");
    }
}
