pub mod ctx;
pub mod metas;
pub mod normalizer;
pub mod result;
pub mod typechecker;
pub mod unification;

use std::rc::Rc;

use tela_ast::{Raw, Tm};

use crate::ctx::Cxt;
use crate::metas::MetaCxt;
use crate::normalizer::val::Val;
use crate::result::ElabError;

/// Elaborate a closed surface term, treating a leading block of lambdas as
/// postulates. Returns the elaborated term, its type and the final
/// metacontext.
pub fn elaborate(raw: &Raw) -> Result<(Tm, Rc<Val>, MetaCxt), ElabError> {
    let mut metas = MetaCxt::new();
    let cxt = Cxt::empty();
    let (tm, ty) = typechecker::infer_top_lams(&mut metas, &cxt, raw)?;
    Ok((tm, ty, metas))
}
