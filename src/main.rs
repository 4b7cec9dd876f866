mod cli;
mod commands;
mod env_loader;
mod error;
mod history;

use error::ExitCode;

fn main() {
    env_loader::load_dotenv();

    match cli::run() {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(ExitCode::Failure.as_i32());
        }
    }
}
