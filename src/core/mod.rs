pub mod agent;
pub mod mode;
pub mod prompt;
pub mod runtime;
pub mod toolkit;
