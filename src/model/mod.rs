pub mod selection;
pub mod task;

pub use selection::*;
pub use task::*;
