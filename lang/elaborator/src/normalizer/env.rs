use std::rc::Rc;

use tela_ast::{Ix, Lvl};

use crate::normalizer::val::Val;

/// An evaluation environment: one entry per binder in scope, innermost last.
///
/// A `Skipped` slot stands for a binder which exists in the context but for
/// which the current evaluation has no value; looking it up produces the
/// neutral variable at the slot's level. Closing types over let-bound
/// entries and strengthening both rely on this.
#[derive(Debug, Clone, Default)]
pub struct Env(Vec<EnvEntry>);

#[derive(Debug, Clone)]
pub enum EnvEntry {
    Defined(Rc<Val>),
    Skipped,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend with a defined entry.
    pub fn defined(&self, v: Rc<Val>) -> Env {
        let mut env = self.clone();
        env.0.push(EnvEntry::Defined(v));
        env
    }

    /// Extend with a skipped entry.
    pub fn skipped(&self) -> Env {
        let mut env = self.clone();
        env.0.push(EnvEntry::Skipped);
        env
    }

    pub fn push_defined(&mut self, v: Rc<Val>) {
        self.0.push(EnvEntry::Defined(v));
    }

    pub fn push_skipped(&mut self) {
        self.0.push(EnvEntry::Skipped);
    }

    pub fn lookup(&self, ix: Ix) -> Rc<Val> {
        let pos = self.0.len() - 1 - ix.0;
        match &self.0[pos] {
            EnvEntry::Defined(v) => v.clone(),
            EnvEntry::Skipped => Rc::new(Val::var(Lvl(pos))),
        }
    }
}
