use std::collections::HashMap;
use uuid::Uuid;

/// Proof that a mutation was issued for one entity.
///
/// Only the most recently issued ticket per entity may reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationTicket {
    entity: Uuid,
    sequence: u64,
}

impl MutationTicket {
    /// Entity the mutation targets (provisional id for creates).
    pub fn entity(&self) -> Uuid {
        self.entity
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Issues monotonically increasing sequence numbers per entity.
#[derive(Debug, Default)]
pub(crate) struct SequenceTracker {
    next: u64,
    latest: HashMap<Uuid, u64>,
}

impl SequenceTracker {
    pub(crate) fn issue(&mut self, entity: Uuid) -> MutationTicket {
        // Global counter: sequences stay unique across resets and transfers.
        self.next += 1;
        self.latest.insert(entity, self.next);
        MutationTicket {
            entity,
            sequence: self.next,
        }
    }

    pub(crate) fn is_current(&self, ticket: &MutationTicket) -> bool {
        self.latest.get(&ticket.entity) == Some(&ticket.sequence)
    }

    /// Forgets the entity if `ticket` is still its latest mutation.
    pub(crate) fn retire(&mut self, ticket: &MutationTicket) {
        if self.is_current(ticket) {
            self.latest.remove(&ticket.entity);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.latest.clear();
    }
}
