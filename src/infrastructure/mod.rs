pub mod delta;
pub mod stdio;
