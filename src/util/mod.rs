pub mod analyze;
pub mod format;
pub mod lenient;
pub mod suggest;
