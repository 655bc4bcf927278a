#![forbid(unsafe_code)]

pub mod host;
pub mod memory;
pub mod progress;

pub use host::{ConnectionState, HostApi, HostConnection, HostError, HostHandle, WindowGraph, WindowId};
pub use memory::{HostOp, HostRecord, InMemoryHost};
pub use progress::{ProgressError, ProgressStore, format_score, format_session_time};
