pub mod config;
pub mod feed;
pub mod images;
pub mod ledger;
pub mod pipeline;
pub mod publisher;
pub mod selector;
pub mod shortener;
pub mod twitter;
