//! Keep/suppress decisions, index-aligned with a candidate list.

/// One slot per candidate-list capacity entry.
///
/// A slot is `None` until the suppression pass decides it. Slots at or past
/// the real candidate count stay `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decisions {
    slots: Vec<Option<bool>>,
}

impl Decisions {
    /// All slots undecided.
    pub fn undecided(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Decision for `index`, `None` if undecided or out of range.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.slots.get(index).copied().flatten()
    }

    /// Whether `index` was decided as kept.
    pub fn is_kept(&self, index: usize) -> bool {
        self.get(index) == Some(true)
    }

    /// Number of decided slots.
    pub fn decided(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of slots decided as kept.
    pub fn kept(&self) -> usize {
        self.slots.iter().filter(|slot| **slot == Some(true)).count()
    }

    pub fn as_slice(&self) -> &[Option<bool>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<bool>] {
        &mut self.slots
    }
}
