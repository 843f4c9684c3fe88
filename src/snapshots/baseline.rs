use crate::alloc::{Reservations, SequenceAllocator};
use crate::model::Registrant;
use crate::store::RecordStore;

/// Deep copy of the full state; restoring never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    registrants: Vec<Registrant>,
    reservations: Reservations,
}

impl Baseline {
    pub fn capture(store: &RecordStore, alloc: &SequenceAllocator) -> Self {
        Self {
            registrants: store.all_registrants(),
            reservations: alloc.reservations(),
        }
    }

    /// Overwrite `store` and `alloc` with copies of this baseline.
    pub fn restore_into(&self, store: &mut RecordStore, alloc: &mut SequenceAllocator) {
        store.replace_all(self.registrants.clone());
        alloc.replace_reservations(self.reservations.clone());
    }

    pub fn registrants(&self) -> &[Registrant] {
        &self.registrants
    }

    pub fn reservations(&self) -> &Reservations {
        &self.reservations
    }
}
