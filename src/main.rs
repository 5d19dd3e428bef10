use clap::Parser;
use dirsort::cli::{self, Cli};
use dirsort::output::OutputFormatter;
use std::process;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::run(cli) {
        OutputFormatter::error(&e);
        process::exit(1);
    }
}
