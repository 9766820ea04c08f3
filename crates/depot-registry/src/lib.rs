pub mod client;
pub mod source;

pub use client::RegistryClient;
pub use source::{ArchiveSource, DependencySource};
