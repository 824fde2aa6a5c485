pub mod classifier;
pub mod ticket_store;

pub use classifier::ClassifierService;
pub use ticket_store::TicketStoreService;
