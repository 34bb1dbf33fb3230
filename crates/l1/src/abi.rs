mod calls;
mod logs;

pub use calls::*;
pub use logs::*;
