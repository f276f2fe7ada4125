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

//! Unique runtime identity for resources.

use super::Handle;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A unique, immutable id plus an optional mutable name.
///
/// Ids come from a process-wide counter starting at 1 and are never reused,
/// so `0` stays free for [`Handle::NULL`].
#[derive(Debug)]
pub struct Identity {
    id: u64,
    name: RwLock<Option<String>>,
}

impl Identity {
    /// Allocates a fresh identity without a name.
    pub fn new() -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            name: RwLock::new(None),
        }
    }

    /// Allocates a fresh identity with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        let identity = Self::new();
        *identity.name.write() = Some(name.into());
        identity
    }

    /// The unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// A copy of the current name, if any.
    pub fn name(&self) -> Option<String> {
        self.name.read().clone()
    }

    /// Replaces the name.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = Some(name.into());
    }

    /// Returns `true` if the current name equals `name`.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.read().as_deref() == Some(name)
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

/// Implemented by every resource that owns an [`Identity`].
pub trait Identifiable {
    /// The identity of this resource.
    fn identity(&self) -> &Identity;

    /// The unique id of this resource.
    fn id(&self) -> u64 {
        self.identity().id()
    }

    /// The current name of this resource, if any.
    fn name(&self) -> Option<String> {
        self.identity().name()
    }

    /// Renames this resource.
    fn set_name(&self, name: &str) {
        self.identity().set_name(name);
    }

    /// A handle pointing at this resource.
    fn handle(&self) -> Handle<Self>
    where
        Self: Sized,
    {
        Handle::from_raw(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(Identity);

    impl Identifiable for Named {
        fn identity(&self) -> &Identity {
            &self.0
        }
    }

    #[test]
    fn ids_are_unique_and_non_zero() {
        let a = Identity::new();
        let b = Identity::new();
        assert_ne!(a.id(), 0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn names_can_be_changed() {
        let named = Named(Identity::named("crate"));
        assert_eq!(named.name().as_deref(), Some("crate"));
        named.set_name("barrel");
        assert!(named.identity().has_name("barrel"));
        assert_eq!(named.handle().id(), named.id());
    }
}
