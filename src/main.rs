//! Typegraft binary entry point.
//!
//! All logic lives in the library; this shim only maps errors onto the
//! `error: <message>` stderr contract and a non-zero exit code. Argument
//! parse failures exit with code 2 via clap.

fn main() {
    if let Err(err) = typegraft::cli::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
