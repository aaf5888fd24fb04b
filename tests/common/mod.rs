pub mod asserts;
pub mod boards;
pub mod handlers;
pub mod harness;

pub use asserts::*;
pub use boards::*;
pub use handlers::*;
pub use harness::*;
