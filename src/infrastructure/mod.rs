pub mod bootstrap;
pub mod config;
pub mod export;
pub mod logging;
pub mod providers;
pub mod tabular;
