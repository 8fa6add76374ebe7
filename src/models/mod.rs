pub mod options;
pub mod payload;
pub mod result;

pub use options::*;
pub use payload::*;
pub use result::*;
