use clap::{Parser, Subcommand};

mod elab;
mod nf;
mod ty;

pub fn exec() -> miette::Result<()> {
    let cli = Cli::parse();

    // Initialize the logger based on the flags
    let mut builder = env_logger::Builder::from_default_env();
    builder.format_timestamp(None).format_level(false).format_target(false);
    if cli.trace {
        builder.filter_level(log::LevelFilter::Trace);
    } else if cli.debug {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }
    builder.init();

    use Command::*;
    match cli.command {
        Elab => elab::exec(),
        Nf => nf::exec(),
        Type => ty::exec(),
    }
}

#[derive(Parser)]
#[clap(version, about = "Elaborator for a small dependently typed language", long_about = None)]
struct Cli {
    /// Enable trace logging
    #[clap(long)]
    trace: bool,
    /// Enable debug logging
    #[clap(long)]
    debug: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read a term from stdin and print its elaboration
    Elab,
    /// Read a term from stdin and print its normal form
    Nf,
    /// Read a term from stdin and print its type
    #[clap(name = "type")]
    Type,
}

/// Read the input term from stdin.
pub(crate) fn read_source() -> miette::Result<String> {
    use miette::IntoDiagnostic;
    std::io::read_to_string(std::io::stdin()).into_diagnostic()
}
