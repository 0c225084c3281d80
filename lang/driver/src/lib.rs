//! The elaboration pipeline: parse a term from a source string, elaborate
//! it, and render the outputs the CLI exposes.

pub mod zonk;

use std::rc::Rc;

use miette::Diagnostic;
use thiserror::Error;

use tela_ast::{Lvl, NameCtx, Tm};
use tela_elaborator::metas::MetaCxt;
use tela_elaborator::normalizer::env::Env;
use tela_elaborator::normalizer::eval::Eval;
use tela_elaborator::normalizer::quote::quote;
use tela_elaborator::normalizer::val::Val;
use tela_elaborator::result::ElabError;
use tela_parser::ParseError;

#[derive(Error, Diagnostic, Debug)]
pub enum DriverError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Elab(#[from] ElabError),
}

pub struct Elaborated {
    pub term: Tm,
    pub ty: Rc<Val>,
    pub metas: MetaCxt,
}

pub fn elaborate(src: &str) -> Result<Elaborated, DriverError> {
    let raw = tela_parser::parse_term(src)?;
    let (term, ty, metas) = tela_elaborator::elaborate(&raw)?;
    Ok(Elaborated { term, ty, metas })
}

/// The elaborated term, with solved metavariables substituted in.
pub fn elab_output(src: &str) -> Result<String, DriverError> {
    let e = elaborate(src)?;
    let zonked = zonk::zonk(&e.metas, &Env::new(), &e.term);
    Ok(zonked.print_to_string(&mut NameCtx::empty(), None))
}

/// The normal form of the elaborated term.
pub fn normal_form(src: &str) -> Result<String, DriverError> {
    let e = elaborate(src)?;
    let nf = quote(&e.metas, Lvl(0), &e.term.eval(&e.metas, &Env::new()));
    Ok(nf.print_to_string(&mut NameCtx::empty(), None))
}

/// The inferred type of the term.
pub fn infer_type(src: &str) -> Result<String, DriverError> {
    let e = elaborate(src)?;
    let ty = quote(&e.metas, Lvl(0), &e.ty);
    Ok(ty.print_to_string(&mut NameCtx::empty(), None))
}
