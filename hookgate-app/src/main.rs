use clap::error::ErrorKind;
use clap::Parser;
use hookgate_app::{cli::Cli, commands, logging};
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

/// Non-blocking failure: the host treats any code other than 2 as proceed.
const EXIT_INTERNAL: u8 = 1;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_INTERNAL),
            };
        }
    };

    logging::init(cli.verbose);

    match panic::catch_unwind(AssertUnwindSafe(|| commands::run(&cli))) {
        Ok(Ok(code)) => ExitCode::from(code),
        Ok(Err(e)) => {
            eprintln!("hookgate: {:#}", e);
            ExitCode::from(EXIT_INTERNAL)
        }
        Err(_) => {
            eprintln!("hookgate: internal panic, allowing");
            ExitCode::from(EXIT_INTERNAL)
        }
    }
}
