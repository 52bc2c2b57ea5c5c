use std::process::ExitCode;

fn main() -> ExitCode {
    moduvisor_cli::run()
}
