//! Stream framing for serial and TCP links.
//!
//! Every protobuf message on a byte stream is wrapped in a 4-byte header:
//! ```text
//! ┌──────┬──────┬──────────────┬─────────────────┐
//! │ 0x94 │ 0xc3 │  size (BE)   │    payload      │
//! │ 1 b  │ 1 b  │   2 bytes    │   size bytes    │
//! └──────┴──────┴──────────────┴─────────────────┘
//! ```
//!
//! Anything between frames (boot banners, debug console output, line noise)
//! is skipped by the decoder until the next magic prefix.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::FrameError;

/// First magic byte.
pub const START1: u8 = 0x94;

/// Second magic byte.
pub const START2: u8 = 0xc3;

/// Largest payload a radio accepts or emits in one frame.
pub const MAX_PAYLOAD_SIZE: usize = 512;

/// Magic prefix plus 2-byte length.
pub const HEADER_SIZE: usize = 4;

/// Encodes a payload into a framed message.
///
/// # Errors
///
/// Returns `FrameError::TooLarge` if the payload exceeds `MAX_PAYLOAD_SIZE`.
pub fn encode(payload: &[u8]) -> Result<Bytes, FrameError> {
    let len = u16::try_from(payload.len())
        .ok()
        .filter(|len| usize::from(*len) <= MAX_PAYLOAD_SIZE)
        .ok_or(FrameError::TooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        })?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_u8(START1);
    buf.put_u8(START2);
    buf.put_u16(len);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Frame decoder that handles partial data and resynchronises on garbage.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
    discarded: usize,
}

impl FrameDecoder {
    /// Creates a new frame decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds data into the decoder.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to decode the next complete frame.
    ///
    /// Returns `Ok(Some(payload))` if a complete frame was decoded and
    /// `Ok(None)` if more data is needed. Bytes that cannot start a frame are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `FrameError::TooLarge` when a header announces more than
    /// `MAX_PAYLOAD_SIZE` bytes. The offending magic byte has already been
    /// dropped, so calling `decode` again continues with the next candidate.
    pub fn decode(&mut self) -> Result<Option<Bytes>, FrameError> {
        loop {
            let Some(start) = self.buffer.iter().position(|&b| b == START1) else {
                self.skip(self.buffer.len());
                return Ok(None);
            };
            self.skip(start);

            if self.buffer.len() < 2 {
                return Ok(None);
            }
            if self.buffer[1] != START2 {
                self.skip(1);
                continue;
            }
            if self.buffer.len() < HEADER_SIZE {
                return Ok(None);
            }

            let length = usize::from(u16::from_be_bytes([self.buffer[2], self.buffer[3]]));
            if length > MAX_PAYLOAD_SIZE {
                self.skip(1);
                return Err(FrameError::TooLarge {
                    size: length,
                    max: MAX_PAYLOAD_SIZE,
                });
            }

            if self.buffer.len() < HEADER_SIZE + length {
                return Ok(None);
            }

            self.buffer.advance(HEADER_SIZE);
            return Ok(Some(self.buffer.split_to(length).freeze()));
        }
    }

    fn skip(&mut self, count: usize) {
        if count > 0 {
            trace!(count, "skipping non-frame bytes");
            self.buffer.advance(count);
            self.discarded += count;
        }
    }

    /// Returns the number of bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the number of bytes dropped while searching for frames.
    #[must_use]
    pub const fn discarded(&self) -> usize {
        self.discarded
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_simple() {
        let frame = encode(b"hello").unwrap();

        assert_eq!(frame[0], START1);
        assert_eq!(frame[1], START2);
        assert_eq!(frame[2], 0); // length high byte
        assert_eq!(frame[3], 5); // length low byte
        assert_eq!(&frame[4..], b"hello");
    }

    #[test]
    fn test_encode_too_large() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];
        assert!(matches!(
            encode(&payload),
            Err(FrameError::TooLarge { size: 513, max: 512 })
        ));
        assert!(encode(&payload[..MAX_PAYLOAD_SIZE]).is_ok());
    }

    #[test]
    fn test_decode_complete_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&[0x94, 0xc3, 0x00, 0x05, b'h', b'e', b'l', b'l', b'o']);

        let result = decoder.decode().unwrap();
        assert_eq!(result, Some(Bytes::from_static(b"hello")));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decode_partial_frame() {
        let mut decoder = FrameDecoder::new();

        decoder.feed(&[0x94]);
        assert_eq!(decoder.decode().unwrap(), None);

        decoder.feed(&[0xc3, 0x00, 0x05, b'h', b'e']);
        assert_eq!(decoder.decode().unwrap(), None);

        decoder.feed(b"llo");
        let result = decoder.decode().unwrap();
        assert_eq!(result, Some(Bytes::from_static(b"hello")));
    }

    #[test]
    fn test_decode_skips_garbage() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"INFO | boot\r\n");
        decoder.feed(&[0x94, 0x94, 0xc3, 0x00, 0x02, b'o', b'k']);

        let result = decoder.decode().unwrap();
        assert_eq!(result, Some(Bytes::from_static(b"ok")));
        assert_eq!(decoder.discarded(), 14);
    }

    #[test]
    fn test_decode_oversized_header_resyncs() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&[0x94, 0xc3, 0xff, 0xff]);
        decoder.feed(&[0x94, 0xc3, 0x00, 0x01, 0x2a]);

        assert!(matches!(
            decoder.decode(),
            Err(FrameError::TooLarge { size: 0xffff, .. })
        ));
        assert_eq!(decoder.decode().unwrap(), Some(Bytes::from_static(&[0x2a])));
    }

    #[test]
    fn test_decode_multiple_frames() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&[
            0x94, 0xc3, 0x00, 0x02, b'h', b'i', // first frame
            0x94, 0xc3, 0x00, 0x03, b'b', b'y', b'e', // second frame
        ]);

        let first = decoder.decode().unwrap();
        assert_eq!(first, Some(Bytes::from_static(b"hi")));

        let second = decoder.decode().unwrap();
        assert_eq!(second, Some(Bytes::from_static(b"bye")));

        assert_eq!(decoder.decode().unwrap(), None);
    }

    #[test]
    fn test_decode_empty_payload() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&encode(&[]).unwrap());
        assert_eq!(decoder.decode().unwrap(), Some(Bytes::new()));
    }
}
