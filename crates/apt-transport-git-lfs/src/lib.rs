pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;

pub mod runtime;

pub use error::MethodError;
pub use runtime::MethodEngine;
