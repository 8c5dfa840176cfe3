use std::process::ExitCode;

fn main() -> ExitCode {
    // A missing `.env` is the normal case.
    dotenvy::dotenv().ok();
    cost_scaling::logging::init();

    match cost_scaling::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
