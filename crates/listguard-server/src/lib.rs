//! listguard server: HTTP API and command-line tools over the validation runtime.

pub mod cli;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
