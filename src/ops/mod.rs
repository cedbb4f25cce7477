pub mod drag;
pub mod ordering;
pub mod tree;
