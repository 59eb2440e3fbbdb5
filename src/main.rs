use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    ircheck::driver::main()
}
