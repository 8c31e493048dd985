//! Interactive viewing: viewport state machine and viewer sessions

mod session;
mod viewport;

pub use session::*;
pub use viewport::*;
