pub mod baseline;
pub mod category;
pub mod errors;
pub mod resolved;

pub use baseline::*;
pub use category::*;
pub use errors::*;
pub use resolved::*;
