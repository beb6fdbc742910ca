pub mod monitor;
pub mod session;
pub mod store;

pub use monitor::MonitorDeps;
pub use session::{MonitorSession, SessionState};
