//! Provenance of derived facts
//!
//! A [`Premise`] records one branch decision taken at a case split. Every
//! equation and substitution carries the set of premises it depends on, so a
//! contradiction can be traced back to the decisions that produced it.

use eqsolve_symbolic::Symbol;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifies one case split (one multi-root isolation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SplitId(pub u32);

/// Hands out fresh split ids for one search
#[derive(Debug, Default)]
pub struct SplitAllocator {
    next: u32,
}

impl SplitAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> SplitId {
        let id = SplitId(self.next);
        self.next += 1;
        id
    }

    /// Number of splits opened so far
    pub fn count(&self) -> u32 {
        self.next
    }
}

/// "At split `split`, `variable` took root `root` of `of`"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Premise {
    pub split: SplitId,
    pub variable: Symbol,
    pub root: usize,
    pub of: usize,
}

impl fmt::Display for Premise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{}:{}[{}/{}]",
            self.split.0,
            self.variable,
            self.root + 1,
            self.of
        )
    }
}

/// Set of premises a fact depends on
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JustificationSet {
    premises: BTreeSet<Premise>,
}

impl JustificationSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(premise: Premise) -> Self {
        let mut set = Self::empty();
        set.insert(premise);
        set
    }

    pub fn insert(&mut self, premise: Premise) -> bool {
        self.premises.insert(premise)
    }

    /// Commutative, idempotent union
    pub fn union(&self, other: &JustificationSet) -> JustificationSet {
        if other.premises.is_subset(&self.premises) {
            return self.clone();
        }
        if self.premises.is_subset(&other.premises) {
            return other.clone();
        }
        JustificationSet {
            premises: self.premises.union(&other.premises).cloned().collect(),
        }
    }

    /// This set with every premise of `split` removed
    pub fn without(&self, split: SplitId) -> JustificationSet {
        JustificationSet {
            premises: self
                .premises
                .iter()
                .filter(|p| p.split != split)
                .cloned()
                .collect(),
        }
    }

    pub fn contains(&self, premise: &Premise) -> bool {
        self.premises.contains(premise)
    }

    pub fn is_subset(&self, other: &JustificationSet) -> bool {
        self.premises.is_subset(&other.premises)
    }

    pub fn is_empty(&self) -> bool {
        self.premises.is_empty()
    }

    pub fn len(&self) -> usize {
        self.premises.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Premise> {
        self.premises.iter()
    }
}

impl FromIterator<Premise> for JustificationSet {
    fn from_iter<I: IntoIterator<Item = Premise>>(iter: I) -> Self {
        JustificationSet {
            premises: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for JustificationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, p) in self.premises.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn premise(split: u32, var: &str, root: usize) -> Premise {
        Premise {
            split: SplitId(split),
            variable: Symbol::new(var),
            root,
            of: 2,
        }
    }

    #[test]
    fn union_is_commutative_and_idempotent() {
        let a: JustificationSet = [premise(0, "x", 0)].into_iter().collect();
        let b: JustificationSet = [premise(1, "y", 1), premise(0, "x", 0)]
            .into_iter()
            .collect();

        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.union(&a), a);
        assert_eq!(a.union(&b).len(), 2);
        assert!(a.is_subset(&a.union(&b)));
    }

    #[test]
    fn without_drops_one_split() {
        let set: JustificationSet = [premise(0, "x", 0), premise(1, "y", 1)]
            .into_iter()
            .collect();
        let reduced = set.without(SplitId(0));
        assert_eq!(reduced.len(), 1);
        assert!(reduced.contains(&premise(1, "y", 1)));
    }

    #[test]
    fn allocator_hands_out_fresh_ids() {
        let mut splits = SplitAllocator::new();
        assert_eq!(splits.allocate(), SplitId(0));
        assert_eq!(splits.allocate(), SplitId(1));
        assert_eq!(splits.count(), 2);
    }

    #[test]
    fn display_lists_premises() {
        let set = JustificationSet::single(premise(3, "x", 1));
        assert_eq!(set.to_string(), "{#3:x[2/2]}");
        assert_eq!(JustificationSet::empty().to_string(), "{}");
    }
}
