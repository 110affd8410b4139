//! Binary record of one played game: packed board states, chosen moves,
//! and summary metadata, with a CRC32C trailer. Written by the arena
//! runner, parseable offline.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::engine::Move;

const MAGIC: &[u8; 4] = b"A4R1"; // ASCII magic
const VERSION: u8 = 1;
const ENDIAN_LE: u8 = 0; // 0 = little-endian

// Header size:
// 4 magic + 1 version + 1 endian + 4 steps + 8 start + 4 elapsed
// + 8 score + 4 highest_tile + 2 budget_ms + 2 engine_len
const HEADER_LEN: usize = 4 + 1 + 1 + 4 + 8 + 4 + 8 + 4 + 2 + 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub steps: u32,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
    /// Merge points accumulated over the whole game.
    pub score: u64,
    pub highest_tile: u32,
    /// Per-decision wall-clock budget the run was played with.
    pub budget_ms: u16,
    pub engine_str: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub meta: Meta,
    pub states: Vec<u64>, // length = steps + 1
    pub moves: Vec<u8>,   // length = steps
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("unsupported endianness")]
    Endianness,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
}

#[inline]
pub fn move_to_byte(m: Move) -> u8 {
    match m {
        Move::Up => 0,
        Move::Down => 1,
        Move::Left => 2,
        Move::Right => 3,
    }
}

#[inline]
pub fn move_from_byte(b: u8) -> Option<Move> {
    match b {
        0 => Some(Move::Up),
        1 => Some(Move::Down),
        2 => Some(Move::Left),
        3 => Some(Move::Right),
        _ => None,
    }
}

#[inline]
fn read_u16_le(bytes: &[u8]) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(..2)?.try_into().ok()?))
}

#[inline]
fn read_u32_le(bytes: &[u8]) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(..4)?.try_into().ok()?))
}

#[inline]
fn read_u64_le(bytes: &[u8]) -> Option<u64> {
    Some(u64::from_le_bytes(bytes.get(..8)?.try_into().ok()?))
}

#[inline]
fn read_f32_le(bytes: &[u8]) -> Option<f32> {
    read_u32_le(bytes).map(f32::from_bits)
}

pub fn encode_run(meta: &Meta, states: &[u64], moves: &[u8]) -> Vec<u8> {
    assert_eq!(states.len(), meta.steps as usize + 1);
    assert_eq!(moves.len(), meta.steps as usize);

    let engine_bytes = meta.engine_str.as_ref().map(|s| s.as_bytes()).unwrap_or(&[]);
    let engine_len: u16 = engine_bytes
        .len()
        .try_into()
        .expect("engine_str too long for u16 length");

    let payload_len = engine_len as usize + states.len() * 8 + moves.len();
    let mut buf = Vec::with_capacity(HEADER_LEN + payload_len + 4);

    // Header
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.push(ENDIAN_LE);
    buf.extend_from_slice(&meta.steps.to_le_bytes());
    buf.extend_from_slice(&meta.start_unix_s.to_le_bytes());
    buf.extend_from_slice(&meta.elapsed_s.to_bits().to_le_bytes());
    buf.extend_from_slice(&meta.score.to_le_bytes());
    buf.extend_from_slice(&meta.highest_tile.to_le_bytes());
    buf.extend_from_slice(&meta.budget_ms.to_le_bytes());
    buf.extend_from_slice(&engine_len.to_le_bytes());

    // Variable metadata
    buf.extend_from_slice(engine_bytes);

    // Payload: states LE u64, then moves u8
    for &v in states {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf.extend_from_slice(moves);

    // Trailer: CRC32C of all preceding bytes
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf
}

pub fn write_run_to_path<P: AsRef<Path>>(
    path: P,
    meta: &Meta,
    states: &[u64],
    moves: &[u8],
) -> Result<(), TraceError> {
    let data = encode_run(meta, states, moves);
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    Ok(())
}

pub fn parse_run_bytes(bytes: &[u8]) -> Result<Run, TraceError> {
    if bytes.len() < HEADER_LEN + 4 {
        // header + checksum at minimum (no payload)
        return Err(TraceError::Malformed);
    }

    // Validate the checksum first to avoid reading fields of a torn file.
    let (content, trailer) = bytes.split_at(bytes.len() - 4);
    let file_crc = read_u32_le(trailer).ok_or(TraceError::Malformed)?;
    if file_crc != crc32c::crc32c(content) {
        return Err(TraceError::Checksum);
    }

    if &content[..4] != MAGIC || content[4] != VERSION {
        return Err(TraceError::MagicOrVersion);
    }
    if content[5] != ENDIAN_LE {
        return Err(TraceError::Endianness);
    }

    let mut off = 6;
    let steps = read_u32_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 4;
    let start_unix_s = read_u64_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 8;
    let elapsed_s = read_f32_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 4;
    let score = read_u64_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 8;
    let highest_tile = read_u32_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 4;
    let budget_ms = read_u16_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 2;
    let engine_len = read_u16_le(&content[off..]).ok_or(TraceError::Malformed)? as usize;
    off += 2;

    if content.len() < off + engine_len {
        return Err(TraceError::Malformed);
    }
    let engine_str = if engine_len > 0 {
        std::str::from_utf8(&content[off..off + engine_len])
            .ok()
            .map(str::to_string)
    } else {
        None
    };
    off += engine_len;

    let states_count = steps as usize + 1;
    let states_bytes_len = states_count.checked_mul(8).ok_or(TraceError::Malformed)?;
    let moves_len = steps as usize;

    if content.len() < off + states_bytes_len + moves_len {
        return Err(TraceError::Malformed);
    }

    let mut states = Vec::with_capacity(states_count);
    let mut i = 0;
    while i < states_bytes_len {
        states.push(read_u64_le(&content[off + i..]).ok_or(TraceError::Malformed)?);
        i += 8;
    }
    off += states_bytes_len;

    let moves = content[off..off + moves_len].to_vec();

    Ok(Run {
        meta: Meta { steps, start_unix_s, elapsed_s, score, highest_tile, budget_ms, engine_str },
        states,
        moves,
    })
}

pub fn parse_run_file<P: AsRef<Path>>(path: P) -> Result<Run, TraceError> {
    let data = fs::read(path)?;
    parse_run_bytes(&data)
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
