//! The metacontext: the only mutable state of elaboration.

use std::rc::Rc;

use fxhash::{FxHashMap, FxHashSet};

use tela_ast::MId;

use crate::ctx::Cxt;
use crate::normalizer::val::Val;

/// The state of one metavariable slot.
///
/// `Unsolved.blockers` is the set of constancy constraints currently
/// depending on this meta; dually, `Constancy.blockers` is the set of metas
/// whose solving may allow the constraint to be decided. The two sets index
/// each other.
#[derive(Debug, Clone)]
pub enum MetaEntry {
    Unsolved { blockers: FxHashSet<MId>, ty: Rc<Val> },
    Solved(Rc<Val>),
    /// A deferred check that the telescope `dom` is empty iff `cod` does not
    /// use its bound variable. `cod` is stored pre-applied to the variable
    /// bound at `cxt.len()`.
    Constancy { cxt: Cxt, dom: Rc<Val>, cod: Rc<Val>, blockers: FxHashSet<MId> },
}

/// Storage for metavariable slots, keyed by monotonically increasing ids.
///
/// The store is unordered: a solution may in principle reference a
/// later-allocated meta; strengthening guarantees acyclicity by
/// construction.
#[derive(Debug, Default)]
pub struct MetaCxt {
    entries: FxHashMap<MId, MetaEntry>,
    next: u32,
}

impl MetaCxt {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next allocation will receive. Also used to generate the
    /// names of inserted telescope binders.
    pub fn next_mid(&self) -> MId {
        MId(self.next)
    }

    pub fn fresh(&mut self, entry: MetaEntry) -> MId {
        let m = MId(self.next);
        self.next += 1;
        self.entries.insert(m, entry);
        m
    }

    /// Looking up an unknown id is a programming error.
    pub fn lookup(&self, m: MId) -> &MetaEntry {
        self.entries.get(&m).unwrap_or_else(|| panic!("unknown metavariable {m}"))
    }

    pub fn get(&self, m: MId) -> Option<&MetaEntry> {
        self.entries.get(&m)
    }

    pub fn write(&mut self, m: MId, entry: MetaEntry) {
        self.entries.insert(m, entry);
    }

    pub fn modify(&mut self, m: MId, f: impl FnOnce(&mut MetaEntry)) {
        if let Some(entry) = self.entries.get_mut(&m) {
            f(entry);
        }
    }

    pub fn remove(&mut self, m: MId) -> Option<MetaEntry> {
        self.entries.remove(&m)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (MId, &MetaEntry)> {
        self.entries.iter().map(|(m, e)| (*m, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut metas = MetaCxt::new();
        let a = metas.fresh(MetaEntry::Solved(Rc::new(Val::U)));
        let b = metas.fresh(MetaEntry::Solved(Rc::new(Val::U)));
        assert!(a < b);
        assert_eq!(metas.next_mid(), MId(2));
        assert_eq!(metas.len(), 2);
    }

    #[test]
    fn write_overwrites() {
        let mut metas = MetaCxt::new();
        let m = metas.fresh(MetaEntry::Solved(Rc::new(Val::U)));
        metas.write(m, MetaEntry::Solved(Rc::new(Val::Tel)));
        assert!(matches!(metas.lookup(m), MetaEntry::Solved(v) if matches!(&**v, Val::Tel)));
    }

    #[test]
    fn remove_deletes_the_slot() {
        let mut metas = MetaCxt::new();
        let m = metas.fresh(MetaEntry::Solved(Rc::new(Val::U)));
        assert!(metas.remove(m).is_some());
        assert!(metas.get(m).is_none());
    }
}
