//! The lowering registry.
//!
//! Built once through [`RegistryBuilder`] and immutable afterwards, so it can be shared
//! between threads without locking. The process-wide default lives in a `LazyLock`.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::core::DTypeSet;
use crate::dispatch::{AcceleratedLowering, KernelFamily, Lowering, Platform};
use crate::error::{CooError, Result};
use crate::primitive::PrimitiveKind;

static DEFAULT_REGISTRY: LazyLock<Arc<DispatchRegistry>> =
    LazyLock::new(|| Arc::new(DispatchRegistry::with_defaults()));

#[derive(Clone, Debug)]
pub struct DispatchRegistry {
    lowerings: HashMap<(PrimitiveKind, Platform), Lowering>,
}

impl DispatchRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Reference kernels everywhere, plus the segmented and threaded kernel families for
    /// inexact dtypes on their platforms.
    pub fn with_defaults() -> Self {
        let mut lowerings = reference_lowerings();
        for kind in PrimitiveKind::ALL {
            for (platform, family) in [
                (Platform::Segmented, KernelFamily::Segmented),
                (Platform::Threaded, KernelFamily::Threaded),
            ] {
                let lowering = Lowering::Accelerated(AcceleratedLowering {
                    family,
                    dtypes: DTypeSet::INEXACT,
                    requires_sorted: kind != PrimitiveKind::CooFromdense,
                });
                lowerings.insert((kind, platform), lowering);
            }
        }
        Self { lowerings }
    }

    /// The shared default registry.
    pub fn global() -> Arc<Self> {
        Arc::clone(&DEFAULT_REGISTRY)
    }

    pub fn get(&self, kind: PrimitiveKind, platform: Platform) -> Option<&Lowering> {
        self.lowerings.get(&(kind, platform))
    }

    /// Looks up `platform`, then falls through to [`Platform::Reference`].
    pub fn resolve(&self, kind: PrimitiveKind, platform: Platform) -> (Platform, &Lowering) {
        [platform, Platform::Reference]
            .into_iter()
            .find_map(|p| self.get(kind, p).map(|l| (p, l)))
            .unwrap_or((Platform::Reference, &Lowering::Reference))
    }

    /// Platforms with a lowering for `kind`, in sorted order.
    pub fn platforms(&self, kind: PrimitiveKind) -> Vec<Platform> {
        let mut out: Vec<Platform> = self
            .lowerings
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, p)| *p)
            .collect();
        out.sort();
        out
    }
}

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn reference_lowerings() -> HashMap<(PrimitiveKind, Platform), Lowering> {
    PrimitiveKind::ALL
        .into_iter()
        .map(|kind| ((kind, Platform::Reference), Lowering::Reference))
        .collect()
}

/// Collects lowerings; the reference kernels are pre-registered.
#[derive(Clone, Debug)]
pub struct RegistryBuilder {
    lowerings: HashMap<(PrimitiveKind, Platform), Lowering>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            lowerings: reference_lowerings(),
        }
    }

    /// Registers `lowering`; a pair can only be registered once.
    pub fn register(
        mut self,
        kind: PrimitiveKind,
        platform: Platform,
        lowering: Lowering,
    ) -> Result<Self> {
        if self.lowerings.contains_key(&(kind, platform)) {
            return Err(CooError::DuplicateLowering {
                primitive: kind.name(),
                platform: platform.name(),
            });
        }
        self.lowerings.insert((kind, platform), lowering);
        Ok(self)
    }

    pub fn build(self) -> DispatchRegistry {
        DispatchRegistry {
            lowerings: self.lowerings,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
