use clap::Parser;
use tracing::Level;

use winrtgen_cli::driver::{self, Args};

fn main() {
    std::process::exit(generate());
}

fn generate() -> i32 {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            // Usage problems and --help both print usage on stdout; neither
            // is a generation failure.
            print!("{}", error.render());
            return 0;
        }
    };

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match driver::run(&args) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("winrtgen : error {:#}", error);
            1
        }
    }
}
