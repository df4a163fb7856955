pub mod driver;
pub mod engine;
pub mod pages;
pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use engine::Engine;
pub use runner::Runner;
