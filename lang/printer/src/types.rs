use pretty::termcolor::ColorSpec;

pub type Alloc<'a> = pretty::Arena<'a, ColorSpec>;
pub type Builder<'a> = pretty::DocBuilder<'a, Alloc<'a>, ColorSpec>;

/// Configuration for the prettyprinter
#[derive(Debug, Clone)]
pub struct PrintCfg {
    /// Width of the output page
    pub width: usize,
    /// Indentation step
    pub indent: isize,
    /// Whether metavariables are printed with their numeric id
    pub print_metavar_ids: bool,
}

impl Default for PrintCfg {
    fn default() -> Self {
        Self { width: crate::DEFAULT_WIDTH, indent: crate::tokens::INDENT, print_metavar_ids: true }
    }
}
