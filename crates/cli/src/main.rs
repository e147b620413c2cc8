use std::process::ExitCode;

fn main() -> ExitCode {
    lampo_cli::init_tracing();
    lampo_cli::run()
}
