pub mod classification;
pub mod draft;
pub mod fence;
pub mod listing;
pub mod refresh;
pub mod stats;
pub mod submission;
