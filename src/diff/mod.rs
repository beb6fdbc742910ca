mod engine;
mod render;

pub use engine::{compute_diff, ChangeSet};
pub use render::{render_side_by_side, render_table_html, DiffRow};
pub(crate) use render::escape_html;
