pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod schema;
pub mod store;
