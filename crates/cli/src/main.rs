use std::process::ExitCode;

fn main() -> ExitCode {
    combo_cli::run()
}
