//! Origin module: where mirrored images are fetched from.
//!
//! The fetcher only needs a plain GET returning a status code and a body
//! stream. `HttpOrigin` provides that over reqwest; tests use
//! `testing::MockOrigin`.

mod error;
mod http;
mod traits;

pub use error::OriginError;
pub use http::HttpOrigin;
pub use traits::{Origin, OriginBody, OriginResponse};
