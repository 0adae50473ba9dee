use std::process::ExitCode;

fn main() -> ExitCode {
    ExitCode::from(logicalgit::cli::run())
}
