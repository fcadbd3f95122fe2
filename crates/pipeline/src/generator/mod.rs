//! Concrete adapters for the generation seams in
//! [`boardwright_core::generation`].

pub mod enricher;
pub mod http;
pub mod placeholder;

pub use enricher::HttpSceneEnricher;
pub use http::HttpImageGenerator;
pub use placeholder::PlaceholderGenerator;
