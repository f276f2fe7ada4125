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

//! Caching factories: the only place GPU mirrors of CPU resources are created.
//!
//! A factory keeps at most one product per CPU handle. Fetching from a
//! factory never syncs; callers pair every fetch with
//! [`GpuSyncable::sync_if_needed`] because a cache hit may be stale.

mod material;
mod mesh;
mod model;
mod texture;

pub use material::MaterialFactory;
pub use mesh::MeshFactory;
pub use model::ModelFactory;
pub use texture::TextureFactory;

use crate::context::GpuContext;
use crate::gpu::GpuSyncable;
use lucent_core::renderer::ResourceError;
use lucent_core::{Handle, Identifiable, Resource, ResourceRegistry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Why a factory could not produce a GPU object.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The handle does not resolve in the registry.
    #[error("{kind} handle {id} does not resolve")]
    UnresolvedHandle {
        /// Resource kind.
        kind: &'static str,
        /// Raw handle id.
        id: u64,
    },
    /// The source object was never added to the registry.
    #[error("{kind} {id} is not registered")]
    Unregistered {
        /// Resource kind.
        kind: &'static str,
        /// Id of the object.
        id: u64,
    },
    /// The shader is unknown or declares no material bind group.
    #[error("shader '{shader}' has no material bind group layout")]
    MissingLayout {
        /// The shader name.
        shader: String,
    },
    /// The device rejected an allocation.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Products of one factory, keyed by CPU handle.
pub struct FactoryCache<S, P> {
    entries: Mutex<HashMap<Handle<S>, Arc<P>>>,
}

impl<S, P> Default for FactoryCache<S, P> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<S, P> FactoryCache<S, P> {
    /// The product cached for `handle`.
    pub fn get(&self, handle: Handle<S>) -> Option<Arc<P>> {
        self.entries.lock().get(&handle).cloned()
    }

    /// Caches `product` unless an entry exists, and returns the cached entry.
    pub fn insert(&self, handle: Handle<S>, product: Arc<P>) -> Arc<P> {
        self.entries
            .lock()
            .entry(handle)
            .or_insert(product)
            .clone()
    }

    /// Drops the entry of `handle`.
    pub fn remove(&self, handle: Handle<S>) -> Option<Arc<P>> {
        self.entries.lock().remove(&handle)
    }

    /// Number of cached products.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Every cached handle.
    pub fn handles(&self) -> Vec<Handle<S>> {
        self.entries.lock().keys().copied().collect()
    }

    /// Removes every entry.
    pub fn drain(&self) -> Vec<Arc<P>> {
        self.entries.lock().drain().map(|(_, p)| p).collect()
    }
}

impl<S: Resource, P> FactoryCache<S, P> {
    /// Removes the entries whose handle no longer resolves in `registry`.
    pub fn drain_orphans(&self, registry: &ResourceRegistry) -> Vec<Arc<P>> {
        let mut orphans = Vec::new();
        self.entries.lock().retain(|handle, product| {
            let alive = registry.contains(*handle);
            if !alive {
                orphans.push(product.clone());
            }
            alive
        });
        orphans
    }
}

/// Creates and caches GPU mirrors of one CPU resource type.
pub trait GpuFactory {
    /// The CPU resource type.
    type Source: Resource;
    /// The GPU mirror.
    type Product: GpuSyncable<Cpu = Self::Source>;
    /// Resource kind, for diagnostics.
    const KIND: &'static str;

    /// The product cache.
    fn cache(&self) -> &FactoryCache<Self::Source, Self::Product>;

    /// Builds a new product. Called on cache misses only.
    fn create_product(
        &self,
        ctx: &GpuContext,
        source: &Self::Source,
    ) -> Result<Self::Product, FactoryError>;

    /// Returns the product of `handle`, creating it on first use.
    ///
    /// ## Errors
    /// * `FactoryError::UnresolvedHandle` - On a miss, if the handle does not resolve.
    fn create_from_handle(
        &self,
        ctx: &GpuContext,
        handle: Handle<Self::Source>,
    ) -> Result<Arc<Self::Product>, FactoryError> {
        if let Some(cached) = self.cache().get(handle) {
            return Ok(cached);
        }
        let source = ctx
            .registry()
            .get(handle)
            .ok_or(FactoryError::UnresolvedHandle {
                kind: Self::KIND,
                id: handle.id(),
            })?;
        let product = Arc::new(self.create_product(ctx, &source)?);
        let cached = self.cache().insert(handle, product.clone());
        if !Arc::ptr_eq(&cached, &product) {
            product.release(ctx);
        }
        log::trace!("{}Factory: created product for {handle:?}", Self::KIND);
        Ok(cached)
    }

    /// Returns the product of a registered `source`.
    ///
    /// ## Errors
    /// * `FactoryError::Unregistered` - If `source` was never added to the registry.
    fn create_from(
        &self,
        ctx: &GpuContext,
        source: &Self::Source,
    ) -> Result<Arc<Self::Product>, FactoryError> {
        let handle = source.handle();
        if !ctx.registry().contains(handle) {
            return Err(FactoryError::Unregistered {
                kind: Self::KIND,
                id: handle.id(),
            });
        }
        self.create_from_handle(ctx, handle)
    }

    /// The cached product of `handle`, without creating one.
    fn get(&self, handle: Handle<Self::Source>) -> Option<Arc<Self::Product>> {
        self.cache().get(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_context;
    use lucent_core::math::Vec3;
    use lucent_data::Mesh;

    #[test]
    fn repeated_fetch_returns_the_same_product() {
        let (device, ctx) = mock_context();
        let mesh = ctx
            .registry()
            .add(Arc::new(Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y])));
        let before = device.stats().buffers_created;

        let a = ctx.meshes().create_from_handle(&ctx, mesh).unwrap();
        let b = ctx.meshes().create_from_handle(&ctx, mesh).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(ctx.meshes().cache().len(), 1);
        assert_eq!(device.stats().buffers_created - before, 1);
    }

    #[test]
    fn unknown_handles_and_unregistered_sources_fail() {
        let (_, ctx) = mock_context();
        assert!(matches!(
            ctx.meshes().create_from_handle(&ctx, Handle::from_raw(u64::MAX)),
            Err(FactoryError::UnresolvedHandle { kind: "Mesh", .. })
        ));

        let loose = Mesh::new("loose", vec![Vec3::ZERO]);
        assert!(matches!(
            ctx.meshes().create_from(&ctx, &loose),
            Err(FactoryError::Unregistered { .. })
        ));
    }

    #[test]
    fn orphans_are_drained_once_their_source_is_removed() {
        let (_, ctx) = mock_context();
        let mesh = ctx
            .registry()
            .add(Arc::new(Mesh::new("gone", vec![Vec3::ZERO])));
        ctx.meshes().create_from_handle(&ctx, mesh).unwrap();

        assert!(ctx.meshes().cache().drain_orphans(ctx.registry()).is_empty());
        ctx.registry().remove(mesh);
        assert_eq!(ctx.meshes().cache().drain_orphans(ctx.registry()).len(), 1);
        assert!(ctx.meshes().cache().is_empty());
    }
}
