pub mod assistant;
pub mod documents;

pub use assistant::*;
pub use documents::*;
