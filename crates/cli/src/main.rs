use std::process::ExitCode;

fn main() -> ExitCode {
    shopkit_cli::run()
}
