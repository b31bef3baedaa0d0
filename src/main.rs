//! `xlr` entry point
//!
//! Parses the command line, runs the command and turns failures into a
//! readable error report with a non-zero exit code.
//!
//! - `apply` - resolve YAML files and write the payloads for their targets
//! - `blueprint` - generate files from a blueprint directory
//! - `config` - show or create the configuration file

use xl_render::cli;
use xl_render::core::user_friendly_error;
use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute() {
        // Convert to user-friendly error with context and suggestions
        let error_ctx = user_friendly_error(e);
        error_ctx.display();
        std::process::exit(1);
    }
}
