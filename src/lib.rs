pub mod error;
pub mod remote;
pub mod translate;

pub use error::AppError;
