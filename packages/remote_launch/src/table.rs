use std::num::NonZero;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::WorkerId;
use crate::slot::WorkerSlot;

/// The process-lifetime table of worker slots.
///
/// Constructed exactly once per pool, then shared via `Arc` between the
/// dispatcher and every worker handle. It is never resized, so a worker
/// identifier handed out at construction stays valid for as long as any
/// handle exists.
#[derive(Debug)]
pub(crate) struct SlotTable {
    slots: Box<[WorkerSlot]>,

    /// The identifier reserved for the control thread. Its slot is only ever
    /// used for inline execution - no worker thread polls it.
    control_id: WorkerId,

    /// Raised when the dispatcher is dropped; idle workers observe it and
    /// exit their polling loops.
    shutdown: AtomicBool,
}

impl SlotTable {
    /// Creates a table with `slot_count` slots, all idle.
    ///
    /// # Panics
    ///
    /// Panics if `control_id` does not name one of the slots.
    pub(crate) fn new(slot_count: NonZero<u32>, control_id: WorkerId) -> Self {
        assert!(
            control_id < slot_count.get(),
            "control identifier {control_id} is outside the pool of {slot_count} slots"
        );

        let slots = (0..slot_count.get())
            .map(|_| WorkerSlot::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            slots,
            control_id,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Resolves an identifier to its slot.
    ///
    /// # Panics
    ///
    /// Panics if the identifier does not name a slot in this pool.
    pub(crate) fn slot(&self, id: WorkerId) -> &WorkerSlot {
        let index = usize::try_from(id).expect("WorkerId always fits in usize");

        self.slots
            .get(index)
            .expect("worker identifier does not name a slot in this pool")
    }

    pub(crate) fn control_id(&self) -> WorkerId {
        self.control_id
    }

    pub(crate) fn slot_count(&self) -> u32 {
        u32::try_from(self.slots.len()).expect("slot count was constructed from a u32")
    }

    /// Every non-control identifier, in ascending order.
    ///
    /// This is the deterministic order in which broadcast operations address
    /// the pool.
    pub(crate) fn worker_ids(&self) -> impl Iterator<Item = WorkerId> + '_ {
        (0..self.slot_count()).filter(|id| *id != self.control_id)
    }

    pub(crate) fn begin_shutdown(&self) {
        // Release pairs with the Acquire load in `is_shut_down()`: a worker
        // that observes the flag also observes every `Running` state the
        // control thread published before raising it. Without that edge a
        // worker could see the flag, re-read a stale `Waiting` for its own
        // slot and exit with a freshly dispatched job still in the mailbox.
        self.shutdown.store(true, Ordering::Release);
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn worker_ids_exclude_control_and_ascend() {
        let table = SlotTable::new(nz!(4), 1);

        assert_eq!(table.worker_ids().collect::<Vec<_>>(), vec![0, 2, 3]);
    }

    #[test]
    fn single_slot_pool_has_no_workers() {
        let table = SlotTable::new(nz!(1), 0);

        assert_eq!(table.worker_ids().count(), 0);
        assert_eq!(table.control_id(), 0);
    }

    #[test]
    #[should_panic]
    fn control_identifier_must_name_a_slot() {
        _ = SlotTable::new(nz!(2), 2);
    }

    #[test]
    #[should_panic]
    fn unknown_identifier_does_not_resolve() {
        let table = SlotTable::new(nz!(2), 1);

        _ = table.slot(5);
    }

    #[test]
    fn shutdown_flag_starts_lowered() {
        let table = SlotTable::new(nz!(2), 0);

        assert!(!table.is_shut_down());

        table.begin_shutdown();

        assert!(table.is_shut_down());
    }
}
