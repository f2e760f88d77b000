//! Rendition providers.
//!
//! A rendition provider converts content of exactly one source media type
//! into any of a fixed set of target media types. Providers for remote
//! transform services are created by the loader during discovery and stored
//! in the component registry; callers look them up and invoke
//! [`RenditionProvider::convert`] directly.
//!
//! # Example
//!
//! ```ignore
//! use renditions_core::provider::{collect_bytes, RenditionInput, RenditionProvider};
//!
//! let input = RenditionInput::from_file("/tmp/report.html").await?;
//! let target = "application/pdf".parse()?;
//! let stream = provider.convert(input, &target).await?;
//! let pdf = collect_bytes(stream).await?;
//! ```

mod error;
mod traits;
mod transform_core;
mod types;

pub use error::ConversionError;
pub use traits::RenditionProvider;
pub use transform_core::TransformCoreProvider;
pub use types::{collect_bytes, ByteStream, RenditionInput, DEFAULT_FILE_NAME};
