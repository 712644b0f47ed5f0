//! Core business entities.

mod url;

pub use url::{NewUrl, Url};
