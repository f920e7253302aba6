pub mod engine;
pub mod error;
pub mod processing;
pub mod source;
pub mod util;
