pub mod check;
pub mod context;
pub mod diff;
pub mod sync;
