//! I/O side of the engine: filesystem seams, the partial-file registry,
//! HTTP client construction, the transfer workers and the facade.

mod batch;
mod connector;
mod dispatch;
mod fsops;
mod get;
mod http;
mod partfile;
mod put;

pub use connector::RepositoryConnector;
pub use fsops::{DefaultFileProcessor, FileProcessor};
