//! Wired transport: OSC packets in SLIP frames over a byte link.
//!
//! [`SerialLink`] is generic over [`ByteLink`], so the same framing runs on
//! the ESP32 UART and on an in-memory loopback in tests.

use log::{debug, warn};

use crate::app::ports::OscTransport;
use crate::osc::codec::{self, CodecError, MAX_PACKET_LEN};
use crate::osc::slip::{self, MAX_ENCODED_LEN, SlipDecoder};
use crate::osc::Message;

/// Byte-oriented, non-blocking channel.
pub trait ByteLink {
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes.  Returns 0 when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Discards writes and never yields bytes.
pub struct NullLink;

impl ByteLink for NullLink {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

const RX_CHUNK: usize = 64;

pub struct SerialLink<L: ByteLink> {
    link: L,
    decoder: SlipDecoder,
    rx: [u8; RX_CHUNK],
    rx_len: usize,
    rx_pos: usize,
}

impl<L: ByteLink> SerialLink<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            decoder: SlipDecoder::new(),
            rx: [0; RX_CHUNK],
            rx_len: 0,
            rx_pos: 0,
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn write_all(&mut self, mut data: &[u8]) -> Result<(), L::Error> {
        while !data.is_empty() {
            let n = self.link.write(data)?;
            if n == 0 {
                // Peer not draining; drop the rest of the frame.
                break;
            }
            data = &data[n..];
        }
        self.link.flush()
    }
}

impl<L: ByteLink> OscTransport for SerialLink<L> {
    fn send(&mut self, msg: &Message) {
        let mut packet = [0u8; MAX_PACKET_LEN];
        let len = match codec::encode(msg, &mut packet) {
            Ok(len) => len,
            Err(e) => {
                warn!("Serial: cannot encode {}: {}", msg.address(), e);
                return;
            }
        };

        let mut frame = [0u8; MAX_ENCODED_LEN];
        let Some(frame_len) = slip::encode(&packet[..len], &mut frame) else {
            warn!("Serial: frame overflow for {}", msg.address());
            return;
        };

        if let Err(e) = self.write_all(&frame[..frame_len]) {
            debug!("Serial: write failed: {:?}", e);
        }
    }

    fn poll(&mut self) -> Option<Result<Message, CodecError>> {
        loop {
            while self.rx_pos < self.rx_len {
                let byte = self.rx[self.rx_pos];
                self.rx_pos += 1;
                if let Some(frame) = self.decoder.push(byte) {
                    return Some(codec::decode(frame));
                }
            }

            self.rx_pos = 0;
            self.rx_len = match self.link.read(&mut self.rx) {
                Ok(n) => n,
                Err(e) => {
                    debug!("Serial: read failed: {:?}", e);
                    0
                }
            };
            if self.rx_len == 0 {
                return None;
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF UART
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl ByteLink for esp_idf_hal::uart::UartDriver<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        esp_idf_hal::uart::UartDriver::read(self, buf, esp_idf_hal::delay::NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        esp_idf_hal::uart::UartDriver::write(self, data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        esp_idf_hal::uart::UartDriver::wait_tx_done(self, esp_idf_hal::delay::NON_BLOCK)
    }
}
