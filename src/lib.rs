pub mod bars;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod detail;
pub mod error;
pub mod histogram;
pub mod matcher;
pub mod names;
pub mod output;
pub mod records;
pub mod resolver;
pub mod sanitize;
pub mod sources;
