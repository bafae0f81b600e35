pub mod config;
pub mod errors;
pub mod logger;
pub mod metrics;
pub mod parser;
pub mod registry;
pub mod row;
pub mod salt;
pub mod scramble;
pub mod strategy;
pub mod stream;
