//! Named and indexed registry of substances, with a discrete-only subset view.

use std::collections::HashMap;

use crate::substance::Substance;

/// Three simultaneous views over one collection of substances (spec §3):
///
/// - an ordered sequence addressable by 1-based position (`by_index`);
/// - a name → position map (`by_name`, `index_of`);
/// - a second ordered sequence enumerating only the `discrete` substances,
///   in primary-sequence order (`discrete_iter`).
///
/// Adding a substance whose name already exists replaces the prior entry in
/// place, preserving its primary position and reconciling discrete-view
/// membership.
#[derive(Debug, Default, Clone)]
pub struct SubstanceTable {
    substances: Vec<Substance>,
    by_name: HashMap<String, usize>,
    discrete_positions: Vec<usize>,
}

impl SubstanceTable {
    pub fn new() -> Self {
        SubstanceTable::default()
    }

    pub fn len(&self) -> usize {
        self.substances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }

    pub fn discrete_len(&self) -> usize {
        self.discrete_positions.len()
    }

    /// Adds `subst` under `name`. Replaces an existing entry of the same
    /// name in place (primary position preserved) and reconciles its
    /// membership in the discrete-only view.
    pub fn add(&mut self, name: impl Into<String>, subst: Substance) -> usize {
        let name = name.into();
        if let Some(&pos) = self.by_name.get(&name) {
            self.substances[pos] = subst;
            self.reconcile_discrete_membership(pos);
            pos
        } else {
            let pos = self.substances.len();
            self.substances.push(subst);
            self.by_name.insert(name, pos);
            if self.substances[pos].kind().is_discrete() {
                self.discrete_positions.push(pos);
            }
            pos
        }
    }

    fn reconcile_discrete_membership(&mut self, pos: usize) {
        let is_discrete = self.substances[pos].kind().is_discrete();
        let already_listed = self.discrete_positions.contains(&pos);
        if is_discrete && !already_listed {
            self.discrete_positions.push(pos);
        } else if !is_discrete && already_listed {
            self.discrete_positions.retain(|&p| p != pos);
        }
    }

    /// Looks up a substance by name.
    pub fn by_name(&self, name: &str) -> Option<&Substance> {
        self.by_name.get(name).map(|&pos| &self.substances[pos])
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Substance> {
        let pos = *self.by_name.get(name)?;
        Some(&mut self.substances[pos])
    }

    /// Looks up a substance by its 1-based primary position.
    pub fn by_index(&self, index: usize) -> Option<&Substance> {
        index.checked_sub(1).and_then(|i| self.substances.get(i))
    }

    /// Looks up a discrete substance by its 1-based position within the
    /// discrete-only view.
    pub fn by_discrete_index(&self, discrete_index: usize) -> Option<&Substance> {
        let pos = *self.discrete_positions.get(discrete_index.checked_sub(1)?)?;
        self.substances.get(pos)
    }

    /// Returns the 0-based primary position of `name`, if present.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Returns the 1-based primary index of `name`, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.position_of(name).map(|p| p + 1)
    }

    /// Iterates over all substances in primary-sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &Substance> {
        self.substances.iter()
    }

    /// Iterates over substance names in primary-sequence order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.substances.iter().map(|s| s.name())
    }

    /// Iterates over only the `discrete` substances, in primary-sequence
    /// order, paired with their 0-based primary position.
    pub fn discrete_iter(&self) -> impl Iterator<Item = (usize, &Substance)> {
        self.discrete_positions.iter().map(move |&pos| (pos, &self.substances[pos]))
    }

    /// Fetches a substance by its 0-based primary position, as used
    /// internally by `Reaction` and `Simulation`.
    pub fn get(&self, pos: usize) -> Option<&Substance> {
        self.substances.get(pos)
    }
}
