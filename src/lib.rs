pub mod compare;
pub mod dataset;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod profile;
pub mod runner;

pub use error::Error;
