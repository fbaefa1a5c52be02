pub mod genetic;
pub mod population;

pub use genetic::*;
pub use population::*;
