use std::process::ExitCode;

fn main() -> ExitCode {
    valbot_cli::run()
}
