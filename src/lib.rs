pub mod cli;
pub mod core;
pub mod pipeline;
pub mod providers;
pub mod report;
