use std::process::ExitCode;

fn main() -> ExitCode {
    aislefinder_cli::run()
}
