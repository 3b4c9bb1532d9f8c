pub mod alert;
pub mod event;

pub use alert::*;
pub use event::*;
