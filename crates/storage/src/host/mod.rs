mod api;
mod connection;
mod window;

pub use api::{HostApi, HostError, SUCCESS, codes, fields};
pub use connection::{ConnectionState, HostConnection, HostHandle, MAX_DISCOVERY_HOPS};
pub use window::{WindowGraph, WindowId, WindowTree};
