//! CLI command implementations.

mod config;
mod list;
mod process;
mod serve;
mod show;

pub use config::run_config;
pub use list::run_list;
pub use process::run_process;
pub use serve::run_serve;
pub use show::run_show;
