use std::process::ExitCode;

use registry_mirror::ui::output;

fn main() -> ExitCode {
    match registry_mirror::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
