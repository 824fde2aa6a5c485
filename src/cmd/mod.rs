pub mod board;
pub mod config;
pub mod console;
pub mod prompt;
pub mod stats;
pub mod ticket;
