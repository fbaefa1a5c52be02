pub mod grid;
pub mod site;

pub use grid::*;
pub use site::*;
