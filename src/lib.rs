pub mod catalog;
pub mod engine;
pub mod filter;
pub mod import;
pub mod limits;
pub mod model;
pub mod observability;
pub mod report;
pub mod timefmt;
