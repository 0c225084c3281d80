//! The elaboration context: values, types, names and name origins of the
//! binders in scope, threaded by value through elaboration and unification.

use std::rc::Rc;

use tela_ast::{Icit, Lvl, Name, NameCtx, Tm};

use crate::metas::{MetaCxt, MetaEntry};
use crate::normalizer::env::Env;
use crate::normalizer::eval::{Eval, force};
use crate::normalizer::quote::quote;
use crate::normalizer::val::{Closure, Val};

/// Whether a context entry is let-bound or λ-bound. Let-bound entries are
/// skipped when closing a type over the context; λ-bound entries become Π
/// binders (telescope Π for telescope-bound entries).
#[derive(Debug, Clone)]
pub enum TyEntry {
    Def(Rc<Val>),
    Bound(Rc<Val>),
}

impl TyEntry {
    pub fn ty(&self) -> &Rc<Val> {
        match self {
            TyEntry::Def(a) | TyEntry::Bound(a) => a,
        }
    }
}

/// Whether a name was written by the user or invented by elaboration. Only
/// source names are visible to variable lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOrigin {
    Source,
    Inserted,
}

#[derive(Debug, Clone, Default)]
pub struct Cxt {
    pub env: Env,
    pub types: Vec<TyEntry>,
    pub names: Vec<Name>,
    pub origins: Vec<NameOrigin>,
}

impl Cxt {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Lvl {
        debug_assert_eq!(self.env.len(), self.names.len());
        debug_assert_eq!(self.types.len(), self.names.len());
        debug_assert_eq!(self.origins.len(), self.names.len());
        Lvl(self.names.len())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Push a bound variable. The environment grows by a skipped slot: the
    /// variable has no value yet.
    pub fn bind(&self, x: Name, origin: NameOrigin, a: Rc<Val>) -> Cxt {
        let mut cxt = self.clone();
        cxt.env.push_skipped();
        cxt.types.push(TyEntry::Bound(a));
        cxt.names.push(x);
        cxt.origins.push(origin);
        cxt
    }

    pub fn bind_src(&self, x: Name, a: Rc<Val>) -> Cxt {
        self.bind(x, NameOrigin::Source, a)
    }

    /// Push a let-bound variable together with its value.
    pub fn define(&self, x: Name, a: Rc<Val>, t: Rc<Val>) -> Cxt {
        let mut cxt = self.clone();
        cxt.env.push_defined(t);
        cxt.types.push(TyEntry::Def(a));
        cxt.names.push(x);
        cxt.origins.push(NameOrigin::Source);
        cxt
    }

    pub fn lvl_name(&self, l: Lvl) -> Name {
        self.names[l.0].clone()
    }

    pub fn name_ctx(&self) -> NameCtx {
        NameCtx::from_names(&self.names)
    }

    /// Turn a value living in this context extended by one binder into a
    /// first-class binder: quote one level up, then close the term over the
    /// current environment.
    pub fn lift_val(&self, metas: &MetaCxt, v: &Rc<Val>) -> Closure {
        Closure::Term {
            env: self.env.clone(),
            body: Rc::new(quote(metas, self.len().inc(), v)),
        }
    }

    /// Close a type over the context: Π for bound entries (telescope Π for
    /// telescope-bound ones), `Skip` for let-bound entries.
    pub fn closing_ty(&self, metas: &MetaCxt, b: Tm) -> Tm {
        let mut b = b;
        for j in (0..self.names.len()).rev() {
            b = match &self.types[j] {
                TyEntry::Def(_) => Tm::Skip(Box::new(b)),
                TyEntry::Bound(a) => {
                    let x = self.names[j].clone();
                    match &*force(metas, a) {
                        Val::Rec(r) => Tm::PiTel(
                            x,
                            Box::new(quote(metas, Lvl(j), r)),
                            Box::new(b),
                        ),
                        _ => Tm::Pi(
                            x,
                            Icit::Expl,
                            Box::new(quote(metas, Lvl(j), a)),
                            Box::new(b),
                        ),
                    }
                }
            };
        }
        b
    }

    /// Allocate a fresh unsolved meta of type `a` (closed over the context)
    /// and return it applied to the spine of bound variables.
    pub fn fresh_meta(&self, metas: &mut MetaCxt, a: &Rc<Val>) -> Tm {
        let a_tm = quote(metas, self.len(), a);
        let closed = self.closing_ty(metas, a_tm);
        let ty = closed.eval(metas, &Env::new());
        let m = metas.fresh(MetaEntry::Unsolved { blockers: Default::default(), ty });
        let mut t = Tm::Meta(m);
        for j in 0..self.names.len() {
            if let TyEntry::Bound(a) = &self.types[j] {
                let ix = Lvl(j).to_ix(self.len());
                t = match &*force(metas, a) {
                    Val::Rec(r) => Tm::AppTel(
                        Box::new(quote(metas, self.len(), r)),
                        Box::new(t),
                        Box::new(Tm::Var(ix)),
                    ),
                    _ => Tm::App(Box::new(t), Box::new(Tm::Var(ix)), Icit::Expl),
                };
            }
        }
        t
    }

    /// Render a core term with this context's names, for errors and logging.
    pub fn show_tm(&self, tm: &Tm) -> String {
        tm.print_to_string(&mut self.name_ctx(), None)
    }

    /// Render a value with this context's names.
    pub fn show_val(&self, metas: &MetaCxt, v: &Rc<Val>) -> String {
        self.show_tm(&quote(metas, self.len(), v))
    }
}
