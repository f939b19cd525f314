use std::process::ExitCode;

fn main() -> ExitCode {
    herbheal::run()
}
