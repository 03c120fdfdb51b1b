//! Open Pixel Control client.
//!
//! Each frame is one message: `[channel, command, len_hi, len_lo]` followed by
//! `len` bytes of RGB data.

use byteorder::{BigEndian, WriteBytesExt};
use tokio::{io::AsyncWriteExt, net::TcpStream};
use tracing::{info, warn};

use crate::effects::{PixelSink, SinkError};
use crate::pixels::Rgb;

const SET_PIXEL_COLORS: u8 = 0;

pub struct OpcClient {
    addr: String,
    channel: u8,
    stream: Option<TcpStream>,
}

impl OpcClient {
    /// Nothing is connected until the first frame goes out.
    pub fn new(addr: String) -> OpcClient {
        OpcClient {
            addr,
            channel: 0,
            stream: None,
        }
    }

    #[cfg(test)]
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn stream(&mut self) -> Result<&mut TcpStream, SinkError> {
        if self.stream.is_none() {
            let stream = TcpStream::connect(&self.addr).await?;
            stream.set_nodelay(true)?;
            info!(addr = %self.addr, "connected to pixel server");
            self.stream = Some(stream);
        }

        self.stream
            .as_mut()
            .ok_or_else(|| SinkError::Rejected(String::from("not connected")))
    }
}

/// Encodes one set-pixel-colors message.
pub fn encode_frame(channel: u8, pixels: &[Rgb]) -> Result<Vec<u8>, SinkError> {
    let len =
        u16::try_from(pixels.len() * 3).map_err(|_| SinkError::FrameTooLarge(pixels.len()))?;

    // tokio's AsyncWriteExt is in scope too and also has write_u8 for Vec<u8>
    let mut packet = Vec::with_capacity(4 + len as usize);
    WriteBytesExt::write_u8(&mut packet, channel)?;
    WriteBytesExt::write_u8(&mut packet, SET_PIXEL_COLORS)?;
    WriteBytesExt::write_u16::<BigEndian>(&mut packet, len)?;
    packet.extend(pixels.iter().flat_map(|p| p.to_bytes()));

    Ok(packet)
}

impl PixelSink for OpcClient {
    async fn put_pixels(&mut self, pixels: &[Rgb]) -> Result<(), SinkError> {
        let packet = encode_frame(self.channel, pixels)?;

        let result = match self.stream().await {
            Ok(stream) => stream.write_all(&packet).await.map_err(SinkError::from),
            Err(e) => Err(e),
        };

        if result.is_err() && self.stream.take().is_some() {
            warn!(addr = %self.addr, "dropped pixel server connection");
        }
        result
    }
}
