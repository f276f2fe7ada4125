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

//! The explicit, typed resource registry.

use super::{Handle, Resource, ResourceManager};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Holds one [`ResourceManager`] per resource type.
///
/// The registry is created once per renderer and passed by reference to
/// everything that needs to resolve handles. Managers are created lazily on
/// first access and live as long as the registry.
#[derive(Default)]
pub struct ResourceRegistry {
    managers: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl ResourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the manager for `T`, creating it on first use.
    pub fn manager<T: Resource>(&self) -> Arc<ResourceManager<T>> {
        let type_id = TypeId::of::<T>();
        if let Some(manager) = self.lookup::<T>(type_id) {
            return manager;
        }

        let mut managers = self.managers.write();
        let entry = managers
            .entry(type_id)
            .or_insert_with(|| Box::new(Arc::new(ResourceManager::<T>::new())));
        match entry.downcast_ref::<Arc<ResourceManager<T>>>() {
            Some(manager) => manager.clone(),
            // The map is keyed by TypeId, so the downcast cannot miss.
            None => Arc::new(ResourceManager::new()),
        }
    }

    fn lookup<T: Resource>(&self, type_id: TypeId) -> Option<Arc<ResourceManager<T>>> {
        self.managers
            .read()
            .get(&type_id)
            .and_then(|entry| entry.downcast_ref::<Arc<ResourceManager<T>>>())
            .cloned()
    }

    /// Registers a resource with its manager.
    pub fn add<T: Resource>(&self, resource: Arc<T>) -> Handle<T> {
        let handle = resource.handle();
        self.manager::<T>().add(resource);
        handle
    }

    /// Resolves a handle.
    pub fn get<T: Resource>(&self, handle: Handle<T>) -> Option<Arc<T>> {
        self.lookup::<T>(TypeId::of::<T>())?.get(handle)
    }

    /// Unregisters a resource.
    pub fn remove<T: Resource>(&self, handle: Handle<T>) -> Option<Arc<T>> {
        self.lookup::<T>(TypeId::of::<T>())?.remove(handle)
    }

    /// Returns `true` if the handle currently resolves.
    pub fn contains<T: Resource>(&self, handle: Handle<T>) -> bool {
        self.lookup::<T>(TypeId::of::<T>())
            .is_some_and(|manager| manager.contains(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Identifiable, Identity, Version, Versioned};

    struct Leaf {
        identity: Identity,
        version: Version,
    }

    impl Leaf {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                identity: Identity::new(),
                version: Version::new(),
            })
        }
    }

    impl Identifiable for Leaf {
        fn identity(&self) -> &Identity {
            &self.identity
        }
    }

    impl Versioned for Leaf {
        fn version(&self) -> u64 {
            self.version.get()
        }
    }

    struct Branch {
        identity: Identity,
    }

    impl Identifiable for Branch {
        fn identity(&self) -> &Identity {
            &self.identity
        }
    }

    impl Versioned for Branch {
        fn version(&self) -> u64 {
            0
        }
    }

    #[test]
    fn managers_are_shared_per_type() {
        let registry = ResourceRegistry::new();
        let first = registry.manager::<Leaf>();
        let second = registry.manager::<Leaf>();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn types_are_kept_apart() {
        let registry = ResourceRegistry::new();
        let leaf = registry.add(Leaf::new());
        let branch = registry.add(Arc::new(Branch {
            identity: Identity::new(),
        }));

        assert!(registry.contains(leaf));
        assert!(registry.contains(branch));
        assert!(!registry.contains(Handle::<Branch>::from_raw(leaf.id())));
    }

    #[test]
    fn remove_through_registry() {
        let registry = ResourceRegistry::new();
        let leaf = Leaf::new();
        let handle = registry.add(leaf.clone());

        assert!(Arc::ptr_eq(&registry.get(handle).unwrap(), &leaf));
        registry.remove(handle);
        assert!(registry.get(handle).is_none());
    }

    #[test]
    fn unknown_type_resolves_nothing() {
        let registry = ResourceRegistry::new();
        assert!(registry.get(Handle::<Leaf>::from_raw(1)).is_none());
    }
}
