pub use pretty::DocAllocator;
pub use pretty::termcolor;
pub use pretty::termcolor::ColorSpec;

pub mod tokens;
mod types;
mod util;

pub use types::*;
pub use util::*;

pub const DEFAULT_WIDTH: usize = 100;
