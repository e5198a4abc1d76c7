pub mod consultation;
pub mod enums;
pub mod media;
pub mod prescription;
pub mod user;

pub use consultation::*;
pub use enums::*;
pub use media::*;
pub use prescription::*;
pub use user::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid timestamp for {field}: {value}")]
    InvalidTimestamp { field: String, value: String },
}
