use std::env::args_os;
use std::process::ExitCode;

use plain_ppm::{recode_ppm_files, CLIParser};

fn main() -> ExitCode {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    match recode_ppm_files(&arguments) {
        Ok(written_files) => {
            println!("Re-encoded {} file(s)", written_files.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Re-encoding failed because of: {}", e);
            ExitCode::FAILURE
        }
    }
}
