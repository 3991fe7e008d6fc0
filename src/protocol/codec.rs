// src/protocol/codec.rs
// Framing for the Java edition status protocol: every packet is
// VarInt(length) + VarInt(packet id) + body.
use byteorder::ReadBytesExt;
use std::io::{self, Cursor, Read};
use tokio::io::{AsyncRead, AsyncReadExt};

pub const HANDSHAKE_PACKET_ID: i32 = 0x00;
pub const STATUS_REQUEST_PACKET_ID: i32 = 0x00;
pub const STATUS_RESPONSE_PACKET_ID: i32 = 0x00;
pub const NEXT_STATE_STATUS: i32 = 1;

const MAX_VARINT_BYTES: usize = 5;
// Status JSON with an embedded favicon stays well under this.
pub const MAX_PACKET_LEN: usize = 2 * 1024 * 1024;

pub fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7F == 0 {
            buf.push(value as u8);
            return;
        }
        buf.push(((value & 0x7F) | 0x80) as u8);
        value >>= 7;
    }
}

pub fn write_string(buf: &mut Vec<u8>, value: &str) {
    write_varint(buf, value.len() as i32);
    buf.extend_from_slice(value.as_bytes());
}

pub fn read_varint<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut result: u32 = 0;
    for i in 0..MAX_VARINT_BYTES {
        let byte = reader.read_u8()?;
        result |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result as i32);
        }
    }
    Err(io::Error::new(io::ErrorKind::InvalidData, "VarInt is too long"))
}

pub async fn read_varint_async<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<i32> {
    let mut result: u32 = 0;
    for i in 0..MAX_VARINT_BYTES {
        let byte = reader.read_u8().await?;
        result |= ((byte & 0x7F) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result as i32);
        }
    }
    Err(io::Error::new(io::ErrorKind::InvalidData, "VarInt is too long"))
}

pub fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    let len = read_varint(reader)?;
    if len < 0 || len as usize > MAX_PACKET_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid string length {}", len)));
    }
    let mut bytes = vec![0u8; len as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Prefixes `payload` (packet id + body) with its VarInt length.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(payload.len() + MAX_VARINT_BYTES);
    write_varint(&mut packet, payload.len() as i32);
    packet.extend_from_slice(payload);
    packet
}

pub fn handshake_packet(protocol_version: i32, host: &str, port: u16) -> Vec<u8> {
    let mut payload = Vec::new();
    write_varint(&mut payload, HANDSHAKE_PACKET_ID);
    write_varint(&mut payload, protocol_version);
    write_string(&mut payload, host);
    payload.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut payload, NEXT_STATE_STATUS);
    frame(&payload)
}

pub fn status_request_packet() -> Vec<u8> {
    let mut payload = Vec::new();
    write_varint(&mut payload, STATUS_REQUEST_PACKET_ID);
    frame(&payload)
}

/// Reads one framed packet and returns its id and body.
pub async fn read_packet<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<(i32, Vec<u8>)> {
    let len = read_varint_async(reader).await?;
    if len <= 0 || len as usize > MAX_PACKET_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidData, format!("Invalid packet length {}", len)));
    }
    let mut data = vec![0u8; len as usize];
    reader.read_exact(&mut data).await?;

    let mut cursor = Cursor::new(data);
    let packet_id = read_varint(&mut cursor)?;
    let offset = cursor.position() as usize;
    let mut data = cursor.into_inner();
    data.drain(..offset);
    Ok((packet_id, data))
}

/// Decodes the JSON string carried by a status response body.
pub fn decode_status_body(body: &[u8]) -> io::Result<serde_json::Value> {
    let mut cursor = Cursor::new(body);
    let json = read_string(&mut cursor)?;
    serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
