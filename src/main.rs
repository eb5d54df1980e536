use std::process::ExitCode;

use tokenreg::ui::output;

fn main() -> ExitCode {
    match tokenreg::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
