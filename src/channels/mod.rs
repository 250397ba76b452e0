pub mod connection;
pub mod transport;

pub use connection::{
    ConnectionState, ConnectionStatus, OpenOutcome, PollReport, ProgressConnection, WatchOutcome,
};
pub use transport::{ConnectionError, Connector, Transport, TransportEvent, WebSocketConnector};
