mod exp;
mod idx;
mod print;

pub use exp::*;
pub use idx::*;
pub use print::*;

pub use tela_miette_util::codespan::Span;
