use std::process::ExitCode;

fn main() -> ExitCode {
    order_desk_lib::run()
}
