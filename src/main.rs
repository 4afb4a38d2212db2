use std::process::ExitCode;

fn main() -> ExitCode {
    bindsmith::cli::run()
}
