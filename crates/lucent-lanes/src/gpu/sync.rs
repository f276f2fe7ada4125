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

//! The CPU to GPU sync contract.
//!
//! A GPU object mirrors one CPU resource, referenced by handle. It remembers
//! the CPU version it last uploaded; `sync_if_needed` uploads again only when
//! the CPU side has moved on. Two calls with no CPU mutation in between cost
//! one version comparison and no upload.

use crate::context::GpuContext;
use lucent_core::renderer::ResourceError;
use lucent_core::{Handle, Resource, Versioned};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// What a call to [`GpuSyncable::sync_if_needed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The GPU copy was refreshed.
    Synced,
    /// The GPU copy already matched the CPU version.
    UpToDate,
    /// The CPU resource no longer resolves. The GPU copy is left untouched
    /// and is reclaimed by the next orphan sweep.
    Orphaned,
}

/// Bookkeeping shared by every GPU mirror.
#[derive(Debug)]
pub struct SyncState<T> {
    handle: Handle<T>,
    last_synced_version: AtomicU64,
    created_at: Instant,
    updated_at: Mutex<Instant>,
}

impl<T> SyncState<T> {
    /// Creates the state of an object whose data matches CPU `version`.
    pub fn new(handle: Handle<T>, version: u64) -> Self {
        let now = Instant::now();
        Self {
            handle,
            last_synced_version: AtomicU64::new(version),
            created_at: now,
            updated_at: Mutex::new(now),
        }
    }

    /// State for a GPU-only object with no CPU source, such as a render target.
    pub fn detached() -> Self {
        Self::new(Handle::NULL, 0)
    }

    /// The CPU resource mirrored.
    pub fn handle(&self) -> Handle<T> {
        self.handle
    }

    /// The CPU version last uploaded.
    pub fn last_synced_version(&self) -> u64 {
        self.last_synced_version.load(Ordering::Acquire)
    }

    /// Records a completed upload of CPU `version`.
    pub fn mark_synced(&self, version: u64) {
        self.last_synced_version.store(version, Ordering::Release);
        *self.updated_at.lock() = Instant::now();
    }

    /// When the GPU object was created.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the GPU object was last refreshed.
    pub fn updated_at(&self) -> Instant {
        *self.updated_at.lock()
    }
}

/// A GPU object kept in sync with a CPU resource.
pub trait GpuSyncable: Send + Sync {
    /// The CPU resource type mirrored.
    type Cpu: Resource;

    /// The sync bookkeeping of this object.
    fn sync_state(&self) -> &SyncState<Self::Cpu>;

    /// Whether the GPU copy is behind `cpu`.
    ///
    /// The default compares versions. Objects whose GPU state also depends on
    /// resources they merely reference widen the check.
    fn needs_sync(&self, cpu: &Self::Cpu, _ctx: &GpuContext) -> bool {
        cpu.version() > self.sync_state().last_synced_version()
    }

    /// Uploads the current CPU state.
    fn sync_from_cpu(&self, cpu: &Self::Cpu, ctx: &GpuContext) -> Result<(), ResourceError>;

    /// Frees the device resources. The object must not be drawn afterwards.
    fn release(&self, ctx: &GpuContext);

    /// The CPU resource mirrored.
    fn cpu_handle(&self) -> Handle<Self::Cpu> {
        self.sync_state().handle()
    }

    /// Uploads the CPU state if it changed since the last upload.
    ///
    /// The version is read before uploading, so a mutation racing with the
    /// upload is picked up by the next call.
    fn sync_if_needed(&self, ctx: &GpuContext) -> Result<SyncOutcome, ResourceError> {
        let state = self.sync_state();
        let Some(cpu) = ctx.registry().get(state.handle()) else {
            return Ok(SyncOutcome::Orphaned);
        };
        if !self.needs_sync(&cpu, ctx) {
            return Ok(SyncOutcome::UpToDate);
        }
        let version = cpu.version();
        self.sync_from_cpu(&cpu, ctx)?;
        state.mark_synced(version);
        Ok(SyncOutcome::Synced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_context;
    use lucent_core::{Identifiable, Identity, Version, Versioned};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Counter {
        identity: Identity,
        version: Version,
    }

    impl Identifiable for Counter {
        fn identity(&self) -> &Identity {
            &self.identity
        }
    }

    impl Versioned for Counter {
        fn version(&self) -> u64 {
            self.version.get()
        }
    }

    struct CountingMirror {
        state: SyncState<Counter>,
        uploads: AtomicUsize,
    }

    impl GpuSyncable for CountingMirror {
        type Cpu = Counter;

        fn sync_state(&self) -> &SyncState<Counter> {
            &self.state
        }

        fn sync_from_cpu(&self, _cpu: &Counter, _ctx: &GpuContext) -> Result<(), ResourceError> {
            self.uploads.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn release(&self, _ctx: &GpuContext) {}
    }

    fn setup() -> (GpuContext, Arc<Counter>, CountingMirror) {
        let (_, ctx) = mock_context();
        let counter = Arc::new(Counter {
            identity: Identity::new(),
            version: Version::new(),
        });
        let handle = ctx.registry().add(counter.clone());
        let mirror = CountingMirror {
            state: SyncState::new(handle, counter.version()),
            uploads: AtomicUsize::new(0),
        };
        (ctx, counter, mirror)
    }

    #[test]
    fn unchanged_resource_is_never_uploaded_twice() {
        let (ctx, _counter, mirror) = setup();
        for _ in 0..5 {
            assert_eq!(mirror.sync_if_needed(&ctx).unwrap(), SyncOutcome::UpToDate);
        }
        assert_eq!(mirror.uploads.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn version_bump_triggers_exactly_one_upload() {
        let (ctx, counter, mirror) = setup();
        counter.version.bump();

        assert_eq!(mirror.sync_if_needed(&ctx).unwrap(), SyncOutcome::Synced);
        assert_eq!(mirror.state.last_synced_version(), counter.version());
        assert_eq!(mirror.sync_if_needed(&ctx).unwrap(), SyncOutcome::UpToDate);
        assert_eq!(mirror.uploads.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn removed_resource_reports_orphaned() {
        let (ctx, counter, mirror) = setup();
        ctx.registry().remove(counter.handle());
        counter.version.bump();

        assert_eq!(mirror.sync_if_needed(&ctx).unwrap(), SyncOutcome::Orphaned);
        assert_eq!(mirror.uploads.load(Ordering::Relaxed), 0);
    }
}
