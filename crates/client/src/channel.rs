use std::{net::TcpStream, sync::Arc};

use agency_protocol::codec::{read_frame, write_frame};

use crate::{error::ClientError, token::CancelToken};

/// One TCP connection to the aggregator.
///
/// Traffic is half-duplex: [`Channel::exchange`] writes one frame and reads
/// exactly one reply before returning. The stream is registered with the
/// cancel token for as long as the channel exists.
pub struct Channel {
    stream: TcpStream,
    token: Arc<CancelToken>,
    addr: String,
}

impl Channel {
    pub fn connect(addr: &str, token: Arc<CancelToken>) -> Result<Self, ClientError> {
        if !token.is_live() {
            return Err(ClientError::NotLive);
        }

        let stream = TcpStream::connect(addr).map_err(|source| ClientError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        // Frames are written in one go; no point waiting for more.
        stream
            .set_nodelay(true)
            .map_err(|e| ClientError::io("configure stream", e))?;
        token.register(&stream)?;

        Ok(Self {
            stream,
            token,
            addr: addr.to_string(),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Sends `payload` and waits for the reply.
    pub fn exchange(&mut self, payload: &[u8]) -> Result<String, ClientError> {
        write_frame(&mut self.stream, payload).map_err(|e| ClientError::io("send", e))?;
        let reply = read_frame(&mut self.stream).map_err(|e| ClientError::io("receive", e))?;
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.token.release();
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
