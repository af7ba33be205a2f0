pub mod error;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod script_store;
pub mod server;
pub mod state;
pub mod userscript;

pub use error::*;
pub use handlers::*;
pub use logging::init_tracing;
pub use routes::*;
pub use script_store::{NewScript, SavedScript, ScriptStore};
pub use server::*;
pub use state::*;
pub use userscript::{safe_filename, Userscript};
