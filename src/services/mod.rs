pub mod backend;
pub mod lifecycle;
pub mod settings;
pub mod storage;

pub use backend::*;
pub use lifecycle::*;
pub use settings::*;
pub use storage::*;
