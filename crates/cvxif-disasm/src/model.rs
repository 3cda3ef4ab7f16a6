use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub base: u32,
    pub bytes: Vec<u8>,
}

impl Segment {
    /// One past the last byte; wraps at the top of the address space.
    pub fn end(&self) -> u32 {
        self.base.wrapping_add(self.bytes.len() as u32)
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub segments: Vec<Segment>,
}

impl Image {
    pub fn from_bytes(base: u32, bytes: Vec<u8>) -> Self {
        Image { segments: vec![Segment { name: "segment0".into(), base, bytes }] }
    }

    pub fn end(&self) -> u32 {
        self.segments
            .iter()
            .map(Segment::end)
            .max()
            .unwrap_or(0)
    }
}

pub fn load_raw_bin(path: &Path, base: u32, skip: usize, len: Option<usize>) -> Result<Image> {
    let file = std::fs::read(path)?;
    anyhow::ensure!(skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    Ok(Image::from_bytes(base, payload.to_vec()))
}

pub fn read_u8(img: &Image, addr: u32) -> Option<u8> {
    for s in &img.segments {
        let start = s.base;
        let end = s.base.wrapping_add(s.bytes.len() as u32);
        if addr >= start && addr < end {
            return Some(s.bytes[(addr - start) as usize]);
        }
    }
    None
}

/// Little-endian instruction word at `addr`, if all four bytes are mapped.
pub fn read_u32(img: &Image, addr: u32) -> Option<u32> {
    let b0 = read_u8(img, addr)?;
    let b1 = read_u8(img, addr.wrapping_add(1))?;
    let b2 = read_u8(img, addr.wrapping_add(2))?;
    let b3 = read_u8(img, addr.wrapping_add(3))?;
    Some(u32::from_le_bytes([b0, b1, b2, b3]))
}
