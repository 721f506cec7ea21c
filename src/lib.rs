pub mod app_error;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod output;
pub mod params;
pub mod path;
pub mod replay;
pub mod timer;
pub mod version;

pub fn run() -> i32 {
    match cli::run_cli() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            err.code()
        }
    }
}
