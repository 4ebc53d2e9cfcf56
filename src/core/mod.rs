pub mod anonymizer;
pub mod etl;
pub mod privacy;
pub mod records;
pub mod table;
pub mod timestamp;

pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
