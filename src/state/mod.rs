pub mod connections;
pub mod history;
pub mod saved_queries;

pub use connections::*;
pub use history::*;
pub use saved_queries::*;
