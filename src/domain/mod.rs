pub mod target;
pub mod types;

pub use target::Target;
pub use types::{FetchedPage, Snapshot};
