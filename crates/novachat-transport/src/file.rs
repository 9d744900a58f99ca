//! File sub-framing: encode/decode only, no retry or reassembly logic.
//! Reliable or ordered file transfer is explicitly out of scope; this module
//! exists so the record shapes are available to a future client without the
//! server tracking transfer state.

use std::fmt;

use novachat_protocol::Id128;

const TAG_START: u8 = 1;
const TAG_BLOCK: u8 = 2;
const TAG_REQUEST_BLOCK: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStart {
    pub file_id: Id128,
    pub file_size: u32,
    pub blocks_count: u16,
    pub file_name: String,
    pub file_hash: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock {
    pub file_id: Id128,
    pub block_idx: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequestBlock {
    pub file_id: Id128,
    pub block_idx: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFrame {
    Start(FileStart),
    Block(FileBlock),
    RequestBlock(FileRequestBlock),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFrameError {
    TooShort,
    UnknownTag(u8),
}

impl fmt::Display for FileFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFrameError::TooShort => write!(f, "file sub-frame too short"),
            FileFrameError::UnknownTag(tag) => write!(f, "unknown file sub-frame tag: {tag}"),
        }
    }
}

impl std::error::Error for FileFrameError {}

impl FileFrame {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            FileFrame::Start(s) => {
                let name_bytes = s.file_name.as_bytes();
                let mut out = Vec::with_capacity(1 + 16 + 4 + 2 + 32 + 2 + name_bytes.len());
                out.push(TAG_START);
                out.extend_from_slice(&s.file_id.to_bytes());
                out.extend_from_slice(&s.file_size.to_le_bytes());
                out.extend_from_slice(&s.blocks_count.to_le_bytes());
                out.extend_from_slice(&s.file_hash);
                out.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
                out.extend_from_slice(name_bytes);
                out
            }
            FileFrame::Block(b) => {
                let mut out = Vec::with_capacity(1 + 16 + 2 + b.data.len());
                out.push(TAG_BLOCK);
                out.extend_from_slice(&b.file_id.to_bytes());
                out.extend_from_slice(&b.block_idx.to_le_bytes());
                out.extend_from_slice(&b.data);
                out
            }
            FileFrame::RequestBlock(r) => {
                let mut out = Vec::with_capacity(1 + 16 + 2);
                out.push(TAG_REQUEST_BLOCK);
                out.extend_from_slice(&r.file_id.to_bytes());
                out.extend_from_slice(&r.block_idx.to_le_bytes());
                out
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FileFrameError> {
        if bytes.is_empty() {
            return Err(FileFrameError::TooShort);
        }
        let tag = bytes[0];
        let rest = &bytes[1..];
        match tag {
            TAG_START => {
                if rest.len() < 16 + 4 + 2 + 32 + 2 {
                    return Err(FileFrameError::TooShort);
                }
                let file_id = Id128::from_bytes(rest[0..16].try_into().unwrap());
                let file_size = u32::from_le_bytes(rest[16..20].try_into().unwrap());
                let blocks_count = u16::from_le_bytes(rest[20..22].try_into().unwrap());
                let file_hash: [u8; 32] = rest[22..54].try_into().unwrap();
                let name_len = u16::from_le_bytes(rest[54..56].try_into().unwrap()) as usize;
                if rest.len() < 56 + name_len {
                    return Err(FileFrameError::TooShort);
                }
                let file_name = String::from_utf8_lossy(&rest[56..56 + name_len]).into_owned();
                Ok(FileFrame::Start(FileStart {
                    file_id,
                    file_size,
                    blocks_count,
                    file_name,
                    file_hash,
                }))
            }
            TAG_BLOCK => {
                if rest.len() < 16 + 2 {
                    return Err(FileFrameError::TooShort);
                }
                let file_id = Id128::from_bytes(rest[0..16].try_into().unwrap());
                let block_idx = u16::from_le_bytes(rest[16..18].try_into().unwrap());
                let data = rest[18..].to_vec();
                Ok(FileFrame::Block(FileBlock {
                    file_id,
                    block_idx,
                    data,
                }))
            }
            TAG_REQUEST_BLOCK => {
                if rest.len() < 16 + 2 {
                    return Err(FileFrameError::TooShort);
                }
                let file_id = Id128::from_bytes(rest[0..16].try_into().unwrap());
                let block_idx = u16::from_le_bytes(rest[16..18].try_into().unwrap());
                Ok(FileFrame::RequestBlock(FileRequestBlock { file_id, block_idx }))
            }
            other => Err(FileFrameError::UnknownTag(other)),
        }
    }
}
