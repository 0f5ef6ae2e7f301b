pub mod handler;
pub mod response;
pub mod run;

pub use handler::{handle_request, AppState};
pub use run::{run, serve, shutdown_on_signal};
