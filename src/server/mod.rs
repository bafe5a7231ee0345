pub mod lifecycle;
pub mod metrics;
pub mod origin;
pub mod server;

pub use origin::OriginPolicy;
pub use server::{make_app, run_server, ServerState};
