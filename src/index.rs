//! Mapping of identifiers onto materialised files.

use crate::{
    error::{CacheError, CacheResult},
    materialize::LocalFile,
};
use dashmap::{mapref::entry::Entry, DashMap};
use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, trace};
use tracing_futures::Instrument;

/// A boxed, detachable load of a single asset.
pub(crate) type LoadFuture = BoxFuture<'static, CacheResult<LocalFile>>;

type PendingLoad = Shared<LoadFuture>;

/// Lifecycle state of one identifier within a cache.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntryState {
    /// Never requested, cleared, or last load failed.
    Absent,
    /// A fetch is in flight.
    Loading,
    /// A local file is recorded.
    Resident,
}

/// `claimed` is cleared only on slots created by a provisional load, until
/// any other request for the same identifier arrives.
enum Slot {
    Loading {
        generation: u64,
        pending: PendingLoad,
        claimed: bool,
    },
    Resident {
        file: LocalFile,
        generation: u64,
        claimed: bool,
    },
}

/// Identifier to file mapping, with at most one load in flight per identifier.
///
/// Each load runs as its own task: every concurrent caller for the same
/// identifier awaits that one task, and the task settles its slot even if all
/// callers go away. Slots are tagged with a generation so that a load which
/// finishes after its slot was cleared (or replaced) leaves the index untouched.
#[derive(Default)]
pub(crate) struct CacheIndex {
    slots: Arc<DashMap<String, Slot>>,
    generation: AtomicU64,
}

impl CacheIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self, id: &str) -> EntryState {
        match self.slots.get(id).as_deref() {
            None => EntryState::Absent,
            Some(Slot::Loading { .. }) => EntryState::Loading,
            Some(Slot::Resident { .. }) => EntryState::Resident,
        }
    }

    pub(crate) fn resident(&self) -> Vec<(String, LocalFile)> {
        self.slots
            .iter()
            .filter_map(|slot| match slot.value() {
                Slot::Resident { file, .. } => Some((slot.key().clone(), file.clone())),
                Slot::Loading { .. } => None,
            })
            .collect()
    }

    /// Returns the resident file for `id`, joining or starting a load otherwise.
    ///
    /// `make_load` is only invoked when `id` is absent.
    pub(crate) async fn get_or_load<F>(&self, id: &str, make_load: F) -> CacheResult<LocalFile>
    where
        F: FnOnce() -> LoadFuture,
    {
        self.load_slot(id, true, make_load).await.1
    }

    /// As [`get_or_load`], but a slot created by this call may later be
    /// [`discard`]ed, so long as no other request for `id` has arrived since.
    ///
    /// Returns the generation of the load this call started, if any.
    ///
    /// [`get_or_load`]: CacheIndex::get_or_load
    /// [`discard`]: CacheIndex::discard
    pub(crate) async fn get_or_load_provisional<F>(
        &self,
        id: &str,
        make_load: F,
    ) -> (Option<u64>, CacheResult<LocalFile>)
    where
        F: FnOnce() -> LoadFuture,
    {
        self.load_slot(id, false, make_load).await
    }

    async fn load_slot<F>(
        &self,
        id: &str,
        claim: bool,
        make_load: F,
    ) -> (Option<u64>, CacheResult<LocalFile>)
    where
        F: FnOnce() -> LoadFuture,
    {
        let (started, pending) = match self.slots.entry(id.to_string()) {
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Slot::Resident { file, claimed, .. } => {
                    trace!("Cache hit for {:?}.", id);
                    *claimed = true;
                    return (None, Ok(file.clone()));
                },
                Slot::Loading {
                    pending, claimed, ..
                } => {
                    debug!("Joining in-flight load of {:?}.", id);
                    *claimed = true;
                    (None, pending.clone())
                },
            },
            Entry::Vacant(slot) => {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let pending = self.spawn_load(id.to_string(), generation, make_load());

                slot.insert(Slot::Loading {
                    generation,
                    pending: pending.clone(),
                    claimed: claim,
                });

                (Some(generation), pending)
            },
        };

        (started, pending.await)
    }

    fn spawn_load(&self, id: String, generation: u64, load: LoadFuture) -> PendingLoad {
        let slots = Arc::clone(&self.slots);
        let span = tracing::debug_span!("load", id = %id);

        let task = {
            let slots = Arc::clone(&slots);
            let id = id.clone();
            tokio::spawn(
                async move {
                    let out = load.await;
                    settle(&slots, &id, generation, &out);
                    out
                }
                .instrument(span),
            )
        };

        async move {
            task.await.unwrap_or_else(|e| {
                debug!("Load task for {:?} did not complete: {}.", id, e);
                let out = Err(CacheError::Interrupted);
                settle(&slots, &id, generation, &out);
                out
            })
        }
        .boxed()
        .shared()
    }

    /// Removes `id`, returning whether it was present.
    pub(crate) fn remove(&self, id: &str) -> bool {
        self.slots.remove(id).is_some()
    }

    /// Removes `id` if it still holds the unclaimed slot of load `generation`.
    pub(crate) fn discard(&self, id: &str, generation: u64) -> bool {
        self.slots
            .remove_if(id, |_, slot| match slot {
                Slot::Loading {
                    generation: g,
                    claimed,
                    ..
                }
                | Slot::Resident {
                    generation: g,
                    claimed,
                    ..
                } => *g == generation && !*claimed,
            })
            .is_some()
    }

    pub(crate) fn clear(&self) {
        self.slots.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Moves a finished load's slot to resident (or absent, on failure), provided
/// the slot still belongs to that load.
fn settle(
    slots: &DashMap<String, Slot>,
    id: &str,
    generation: u64,
    out: &CacheResult<LocalFile>,
) {
    let owned = |slot: &Slot| matches!(slot, Slot::Loading { generation: g, .. } if *g == generation);

    match out {
        Ok(file) => {
            if let Some(mut slot) = slots.get_mut(id) {
                if let Slot::Loading {
                    generation: g,
                    claimed,
                    ..
                } = *slot
                {
                    if g == generation {
                        *slot = Slot::Resident {
                            file: file.clone(),
                            generation,
                            claimed,
                        };
                    }
                }
            }
        },
        Err(e) => {
            debug!("Load of {:?} failed: {}.", id, e);
            slots.remove_if(id, |_, slot| owned(slot));
        },
    }
}
