mod error;
mod failover;
mod generate;
mod image;

pub use error::{ProviderErrorKind, TrichoscanError};
pub use failover::FailoverChain;
pub use generate::{
    Generate, GenerationConfig, GenerationRequest, GenerationResponse, InlinePart, Part,
};
pub use image::ImageBlob;
