pub mod day;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use error::{LogError, Result};
pub use service::FoodLogService;
