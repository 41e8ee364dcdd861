use std::process::ExitCode;

fn main() -> ExitCode {
    homesearch_cli::run()
}
