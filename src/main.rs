//! qv-edx-trigger CLI entry point

use qv_edx_trigger::{app, exit_codes, logging};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();

    let code = app::run(std::env::args_os()).await;
    ExitCode::from(u8::try_from(code).unwrap_or(exit_codes::EXCEPTION as u8))
}
