pub mod errors;
pub mod parameters;
pub mod series;

pub use errors::*;
pub use parameters::*;
pub use series::*;
