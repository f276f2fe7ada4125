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

//! Monotonic version counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// A mutation counter starting at 0.
///
/// The owning object calls [`Version::bump`] on every externally visible
/// change. The value never decreases.
#[derive(Debug, Default)]
pub struct Version(AtomicU64);

impl Version {
    /// Creates a counter at 0.
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// The current value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Increments the counter and returns the new value.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Implemented by resources whose GPU mirror tracks their changes.
pub trait Versioned {
    /// The current version of this resource.
    fn version(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_increments() {
        let version = Version::new();
        assert_eq!(version.get(), 0);
        assert_eq!(version.bump(), 1);
        assert_eq!(version.bump(), 2);
        assert_eq!(version.get(), 2);
    }
}
