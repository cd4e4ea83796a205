//! Connection plumbing for the bidirectional voice endpoint

use crate::{Result, SolaceError};
use std::net::TcpStream;
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::WebSocket;
use url::Url;

pub type LiveSocket = WebSocket<MaybeTlsStream<TcpStream>>;

const LIVE_ENDPOINT: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Open the streaming connection.
///
/// The read timeout keeps the transport loop responsive to stop requests;
/// a timed-out read is not an error.
pub fn connect(api_key: &str, read_timeout: Duration) -> Result<LiveSocket> {
    let mut url = Url::parse(LIVE_ENDPOINT)
        .map_err(|e| SolaceError::ConnectionError(format!("bad endpoint: {}", e)))?;
    url.query_pairs_mut().append_pair("key", api_key);

    let (mut socket, _response) = tungstenite::connect(url.as_str())
        .map_err(|e| SolaceError::ConnectionError(format!("handshake failed: {}", e)))?;

    match socket.get_mut() {
        MaybeTlsStream::Plain(stream) => {
            let _ = stream.set_read_timeout(Some(read_timeout));
        }
        MaybeTlsStream::NativeTls(stream) => {
            let _ = stream.get_mut().set_read_timeout(Some(read_timeout));
        }
        _ => {}
    }

    Ok(socket)
}
