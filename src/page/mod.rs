pub mod defaults;
pub mod gate;
pub mod model;
pub mod render;
pub mod reorder;
pub mod resolve;

pub use model::{Block, BlockKind, PageDocument, Schedule, Styling};
