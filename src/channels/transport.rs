use std::io::ErrorKind;
use std::net::TcpStream;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{connect, Message, WebSocket};

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid progress endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("progress socket connect failed: {0}")]
    Connect(String),
    #[error("progress socket send failed: {0}")]
    Send(String),
    #[error("failed to configure progress socket stream: {0}")]
    Configure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Text(String),
    Undecodable(String),
    Control,
    Idle,
    Closed(String),
}

pub trait Transport {
    fn send_text(&mut self, text: &str) -> Result<(), ConnectionError>;
    fn poll(&mut self) -> TransportEvent;
    fn close(&mut self);
}

pub trait Connector {
    fn connect(&mut self, endpoint: &str) -> Result<Box<dyn Transport>, ConnectionError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn connect(&mut self, endpoint: &str) -> Result<Box<dyn Transport>, ConnectionError> {
        if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
            return Err(ConnectionError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "expected a ws:// or wss:// url".to_string(),
            });
        }
        let (socket, _) =
            connect(endpoint).map_err(|err| ConnectionError::Connect(err.to_string()))?;
        let mut transport = WebSocketTransport { socket };
        transport.set_nonblocking()?;
        Ok(Box::new(transport))
    }
}

pub struct WebSocketTransport {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl WebSocketTransport {
    fn set_nonblocking(&mut self) -> Result<(), ConnectionError> {
        match self.socket.get_mut() {
            MaybeTlsStream::Plain(stream) => stream.set_nonblocking(true),
            MaybeTlsStream::Rustls(stream) => stream.sock.set_nonblocking(true),
            _ => Ok(()),
        }
        .map_err(|err| ConnectionError::Configure(err.to_string()))
    }
}

impl Transport for WebSocketTransport {
    fn send_text(&mut self, text: &str) -> Result<(), ConnectionError> {
        match self.socket.send(Message::Text(text.to_string())) {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::Io(err)) if err.kind() == ErrorKind::WouldBlock => {
                // Queued in the write buffer; flushed by later reads.
                Ok(())
            }
            Err(err) => Err(ConnectionError::Send(err.to_string())),
        }
    }

    fn poll(&mut self) -> TransportEvent {
        match self.socket.read() {
            Ok(Message::Text(text)) => TransportEvent::Text(text),
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => TransportEvent::Text(text),
                Err(err) => {
                    TransportEvent::Undecodable(format!("binary frame is not valid utf-8: {err}"))
                }
            },
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {
                TransportEvent::Control
            }
            Ok(Message::Close(frame)) => TransportEvent::Closed(match frame {
                Some(frame) if !frame.reason.is_empty() => {
                    format!("server closed the connection: {}", frame.reason)
                }
                _ => "server closed the connection".to_string(),
            }),
            Err(tungstenite::Error::Io(err))
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                TransportEvent::Idle
            }
            Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                TransportEvent::Closed("connection closed".to_string())
            }
            Err(err) => TransportEvent::Closed(format!("socket read failed: {err}")),
        }
    }

    fn close(&mut self) {
        let _ = self.socket.close(None);
        let _ = self.socket.flush();
    }
}
