pub mod filter;
pub mod stats;
pub mod ticket;
