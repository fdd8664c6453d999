pub mod activity_log;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod rewrite;
pub mod routes;
pub mod server;
pub mod state;
pub mod upstream;

pub use activity_log::{ActivityEvent, ActivityLogger, LogPhase, LogScope};
pub use router::UpstreamKind;
pub use server::start_server;
pub use state::{AppState, CoreServices};
