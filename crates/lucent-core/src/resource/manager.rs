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

//! Thread-safe canonical storage for one resource type.

use super::{Handle, Resource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Owns every live instance of `T`, keyed by handle.
///
/// The backing map is mutex-guarded so that a loader thread can register or
/// remove resources while the render thread resolves handles.
pub struct ResourceManager<T: Resource> {
    resources: Mutex<HashMap<Handle<T>, Arc<T>>>,
}

impl<T: Resource> ResourceManager<T> {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a resource and returns its handle.
    ///
    /// Returns `None` only when no resource is given. Adding an already
    /// registered resource returns the same handle again.
    pub fn add(&self, resource: impl Into<Option<Arc<T>>>) -> Option<Handle<T>> {
        let resource = resource.into()?;
        let handle = resource.handle();
        self.resources.lock().insert(handle, resource);
        Some(handle)
    }

    /// Resolves a handle. Unknown, null and removed handles give `None`.
    pub fn get(&self, handle: Handle<T>) -> Option<Arc<T>> {
        if !handle.is_valid() {
            return None;
        }
        self.resources.lock().get(&handle).cloned()
    }

    /// Resolves a raw id.
    pub fn get_by_id(&self, id: u64) -> Option<Arc<T>> {
        self.get(Handle::from_raw(id))
    }

    /// Returns the first resource carrying `name`.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<T>> {
        self.resources
            .lock()
            .values()
            .find(|resource| resource.identity().has_name(name))
            .cloned()
    }

    /// Returns every resource carrying `name`.
    pub fn get_all_with_name(&self, name: &str) -> Vec<Arc<T>> {
        self.resources
            .lock()
            .values()
            .filter(|resource| resource.identity().has_name(name))
            .cloned()
            .collect()
    }

    /// Returns `true` if the handle currently resolves.
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.resources.lock().contains_key(&handle)
    }

    /// Unregisters a resource. Every copy of `handle` stops resolving.
    pub fn remove(&self, handle: Handle<T>) -> Option<Arc<T>> {
        self.resources.lock().remove(&handle)
    }

    /// Unregisters everything.
    pub fn clear(&self) {
        self.resources.lock().clear();
    }

    /// Handles of every registered resource, in no particular order.
    pub fn all_handles(&self) -> Vec<Handle<T>> {
        self.resources.lock().keys().copied().collect()
    }

    /// Every registered resource, in no particular order.
    pub fn all(&self) -> Vec<Arc<T>> {
        self.resources.lock().values().cloned().collect()
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.lock().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.resources.lock().is_empty()
    }
}

impl<T: Resource> Default for ResourceManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Identifiable, Identity, Version, Versioned};

    struct Blob {
        identity: Identity,
        version: Version,
    }

    impl Blob {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                identity: Identity::named(name),
                version: Version::new(),
            })
        }
    }

    impl Identifiable for Blob {
        fn identity(&self) -> &Identity {
            &self.identity
        }
    }

    impl Versioned for Blob {
        fn version(&self) -> u64 {
            self.version.get()
        }
    }

    #[test]
    fn add_then_get_returns_same_object() {
        let manager = ResourceManager::new();
        let blob = Blob::new("a");
        let handle = manager.add(blob.clone()).unwrap();

        let resolved = manager.get(handle).unwrap();
        assert!(Arc::ptr_eq(&blob, &resolved));
        assert!(manager.contains(handle));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn adding_nothing_fails() {
        let manager: ResourceManager<Blob> = ResourceManager::new();
        assert!(manager.add(None::<Arc<Blob>>).is_none());
        assert!(manager.is_empty());
    }

    #[test]
    fn removed_handles_stop_resolving() {
        let manager = ResourceManager::new();
        let handle = manager.add(Blob::new("a")).unwrap();
        let copy = handle;

        assert!(manager.remove(handle).is_some());
        assert!(manager.get(handle).is_none());
        assert!(manager.get(copy).is_none());
        assert!(manager.remove(handle).is_none());
    }

    #[test]
    fn null_handle_never_resolves() {
        let manager: ResourceManager<Blob> = ResourceManager::new();
        manager.add(Blob::new("a"));
        assert!(manager.get(Handle::NULL).is_none());
    }

    #[test]
    fn lookup_by_name() {
        let manager = ResourceManager::new();
        manager.add(Blob::new("rock"));
        manager.add(Blob::new("rock"));
        manager.add(Blob::new("tree"));

        assert!(manager.get_by_name("tree").is_some());
        assert!(manager.get_by_name("sky").is_none());
        assert_eq!(manager.get_all_with_name("rock").len(), 2);
        assert_eq!(manager.all_handles().len(), 3);

        manager.clear();
        assert!(manager.all().is_empty());
    }
}
