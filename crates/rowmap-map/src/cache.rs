//! Process-wide cache of compiled projectors keyed by [`Fingerprint`].
//!
//! Entries are type-erased (`Arc<dyn Any + Send + Sync>`) so one cache holds
//! projectors for every result type. Each fingerprint owns a slot with its
//! own compile lock: concurrent misses on the same key compile once, while
//! unrelated keys never wait on each other. A failed compile caches nothing
//! and the next caller compiles again. Entries are never evicted.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::compiler::{CompiledProjector, MappingCompiler};
use crate::error::{BoxError, CacheCompilationFailure, MappingError};
use crate::fingerprint::{CommandId, Fingerprint};
use crate::rule_set::MappingRuleSet;

type Erased = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct Slot {
    value: OnceLock<Erased>,
    compiling: Mutex<()>,
}

/// Fingerprint -> compiled projector, safe for concurrent use.
#[derive(Default)]
pub struct ProjectorCache {
    slots: RwLock<HashMap<Fingerprint, Arc<Slot>>>,
    compilations: AtomicUsize,
}

impl std::fmt::Debug for ProjectorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectorCache")
            .field("entries", &self.len())
            .field("compilations", &self.compilations())
            .finish()
    }
}

static GLOBAL: OnceLock<ProjectorCache> = OnceLock::new();

impl ProjectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> &'static ProjectorCache {
        GLOBAL.get_or_init(ProjectorCache::new)
    }

    /// Returns the cached value for `fingerprint`, running `compile` at most
    /// once across concurrent callers when it is missing.
    pub fn get_or_compile<V, F, E>(
        &self,
        fingerprint: &Fingerprint,
        compile: F,
    ) -> Result<Arc<V>, MappingError>
    where
        V: Any + Send + Sync,
        F: FnOnce() -> Result<V, E>,
        E: Into<BoxError>,
    {
        let slot = self.slot(fingerprint);
        if let Some(value) = slot.value.get() {
            return downcast(value, fingerprint);
        }

        let _guard = slot
            .compiling
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished while we waited for the lock.
        if let Some(value) = slot.value.get() {
            return downcast(value, fingerprint);
        }

        self.compilations.fetch_add(1, Ordering::Relaxed);
        match compile() {
            Ok(compiled) => {
                let erased: Erased = Arc::new(compiled);
                let value = slot.value.get_or_init(|| erased);
                debug!(
                    fingerprint = %fingerprint,
                    target_type = %fingerprint.type_name(),
                    "cached compiled projector"
                );
                downcast(value, fingerprint)
            }
            Err(source) => {
                let source = source.into();
                warn!(
                    fingerprint = %fingerprint,
                    target_type = %fingerprint.type_name(),
                    error = %source,
                    "projector compilation failed; nothing cached"
                );
                self.discard_if_unused(fingerprint, &slot);
                Err(CacheCompilationFailure {
                    fingerprint: fingerprint.to_hex(),
                    target_type: fingerprint.type_name().to_string(),
                    source,
                }
                .into())
            }
        }
    }

    /// Fingerprints `rules` for `command` and returns the matching projector,
    /// compiling it on first use.
    pub fn compile_or_fetch<T>(
        &self,
        rules: &MappingRuleSet<T>,
        command: &CommandId,
    ) -> Result<Arc<CompiledProjector<T>>, MappingError>
    where
        T: Send + Sync + 'static,
    {
        let fingerprint = Fingerprint::of(rules, command);
        self.get_or_compile(&fingerprint, || {
            MappingCompiler::compile(rules, fingerprint.clone())
        })
    }

    /// Number of fingerprints holding a compiled projector.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.value.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times a compile step has been invoked, failed ones included.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    fn slot(&self, fingerprint: &Fingerprint) -> Arc<Slot> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(fingerprint)
        {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(fingerprint.clone()).or_default())
    }

    /// Drops an empty slot after a failed compile unless other callers are
    /// already queued on it. Clones are only taken under the map lock, so the
    /// count check cannot race with a new lookup.
    fn discard_if_unused(&self, fingerprint: &Fingerprint, slot: &Arc<Slot>) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let unused = slots.get(fingerprint).is_some_and(|held| {
            Arc::ptr_eq(held, slot) && Arc::strong_count(slot) == 2 && slot.value.get().is_none()
        });
        if unused {
            slots.remove(fingerprint);
        }
    }
}

fn downcast<V: Any + Send + Sync>(
    value: &Erased,
    fingerprint: &Fingerprint,
) -> Result<Arc<V>, MappingError> {
    Arc::clone(value)
        .downcast::<V>()
        .map_err(|_| MappingError::CacheTypeMismatch {
            fingerprint: fingerprint.to_hex(),
        })
}

/// [`ProjectorCache::compile_or_fetch`] on the process-wide cache.
pub fn compile_or_fetch<T>(
    rules: &MappingRuleSet<T>,
    command: &CommandId,
) -> Result<Arc<CompiledProjector<T>>, MappingError>
where
    T: Send + Sync + 'static,
{
    ProjectorCache::global().compile_or_fetch(rules, command)
}
