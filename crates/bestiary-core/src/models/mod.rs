pub mod index;
pub mod results;
pub mod subject;

pub use index::*;
pub use results::*;
pub use subject::*;
