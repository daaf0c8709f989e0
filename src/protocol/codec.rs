//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Request Kind
//! - INVOKE: argc (4 bytes) + fn_len (4) + function + [arg_len (4) + arg]*argc
//! - PING:   empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use super::Request;
use crate::error::{Result, WalletError};
use crate::invocation::{Response, Status};

/// Header size: 1 byte kind/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
///
/// Format: kind (1) + payload_len (4) + payload
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let mut payload = BytesMut::new();
    if let Request::Invoke { function, args } = request {
        payload.put_u32(checked_len(args.len(), "argument count")?);
        put_string(&mut payload, function)?;
        for arg in args {
            put_string(&mut payload, arg)?;
        }
    }

    frame(request.kind() as u8, &payload)
}

/// Decode a request from bytes
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (kind, payload) = split_frame(bytes, "request")?;

    match kind {
        0x01 => decode_invoke_request(payload),
        0x02 => {
            if !payload.is_empty() {
                return Err(WalletError::Protocol(format!(
                    "PING request: unexpected payload of {} bytes",
                    payload.len()
                )));
            }
            Ok(Request::Ping)
        }
        _ => Err(WalletError::Protocol(format!("Unknown request kind: 0x{:02x}", kind))),
    }
}

/// Decode INVOKE request payload
fn decode_invoke_request(mut payload: &[u8]) -> Result<Request> {
    if payload.remaining() < 4 {
        return Err(WalletError::Protocol(
            "INVOKE request: missing argument count".to_string(),
        ));
    }
    let argc = payload.get_u32() as usize;

    // Every argument needs at least its 4-byte length
    if argc > payload.remaining() / 4 {
        return Err(WalletError::Protocol(format!(
            "INVOKE request: argument count {} exceeds payload",
            argc
        )));
    }

    let function = take_string(&mut payload, "function")?;
    let mut args = Vec::with_capacity(argc);
    for i in 0..argc {
        args.push(take_string(&mut payload, &format!("argument {}", i))?);
    }

    if payload.has_remaining() {
        return Err(WalletError::Protocol(format!(
            "INVOKE request: {} trailing bytes",
            payload.remaining()
        )));
    }

    Ok(Request::Invoke { function, args })
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let payload = match response.status {
        Status::Ok => response.payload.as_slice(),
        Status::Error => response.message.as_deref().unwrap_or_default().as_bytes(),
    };

    frame(response.status as u8, payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status, payload) = split_frame(bytes, "response")?;

    match status {
        0x00 => Ok(Response::ok(payload.to_vec())),
        0x02 => {
            let message = String::from_utf8(payload.to_vec()).map_err(|_| {
                WalletError::Protocol("Error message is not valid UTF-8".to_string())
            })?;
            Ok(Response::error(message))
        }
        _ => Err(WalletError::Protocol(format!(
            "Unknown response status: 0x{:02x}",
            status
        ))),
    }
}

// =============================================================================
// Framing helpers
// =============================================================================

fn frame(tag: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let payload_len = checked_len(payload.len(), "payload")?;
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(tag);
    message.put_u32(payload_len);
    message.put_slice(payload);
    Ok(message.to_vec())
}

/// Length as a wire `u32`, refusing anything a reader would reject
fn checked_len(len: usize, what: &str) -> Result<u32> {
    match u32::try_from(len) {
        Ok(len) if len <= MAX_PAYLOAD_SIZE => Ok(len),
        _ => Err(WalletError::Protocol(format!(
            "{} too large: {} bytes (max {})",
            what, len, MAX_PAYLOAD_SIZE
        ))),
    }
}

/// Validate a complete frame and return its tag and payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(WalletError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    // Validate payload length
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(WalletError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(WalletError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((tag, &bytes[HEADER_SIZE..total_len]))
}

fn put_string(buf: &mut BytesMut, value: &str) -> Result<()> {
    buf.put_u32(checked_len(value.len(), "string")?);
    buf.put_slice(value.as_bytes());
    Ok(())
}

fn take_string(buf: &mut &[u8], what: &str) -> Result<String> {
    if buf.remaining() < 4 {
        return Err(WalletError::Protocol(format!("INVOKE request: missing {} length", what)));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(WalletError::Protocol(format!(
            "INVOKE request: incomplete {} (expected {}, got {})",
            what,
            len,
            buf.remaining()
        )));
    }

    let bytes = buf.copy_to_bytes(len);
    String::from_utf8(bytes.to_vec())
        .map_err(|_| WalletError::Protocol(format!("INVOKE request: {} is not valid UTF-8", what)))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    // Parse payload length
    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    // Validate payload length
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(WalletError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

/// Read a complete request from a stream
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let message = read_frame(reader)?;
    decode_request(&message)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader)?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
