pub mod merge;
pub mod probe;
