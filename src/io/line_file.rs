//! Traced vortex lines on disk.
//!
//! A run writes one `<base>.vortex` file holding every frame's encoded
//! lines back to back, plus a `<base>.vortex.offset` sidecar (a count and
//! one `(offset, size)` pair per frame) so a viewer can pull frame `k`
//! without touching the rest. Each frame buffer opens with its own header
//! and is decodable on its own.

use std::fs;
use std::path::PathBuf;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::info;

use crate::curve::line::VortexLine;
use crate::io::wire::{
    opt_to_raw, raw_to_opt, read_hdr, take_f64, take_u32, take_u64, take_u8, write_hdr, KIND_LINES,
};
use crate::vortex_error::VortexError;

const FLAG_LOOP: u8 = 1;

pub fn vortex_path(base: &str) -> PathBuf {
    PathBuf::from(format!("{base}.vortex"))
}

pub fn offset_path(base: &str) -> PathBuf {
    PathBuf::from(format!("{base}.vortex.offset"))
}

/// Encodes one frame's lines as a standalone payload.
pub fn encode_frame(lines: &[VortexLine]) -> Bytes {
    let mut buf = BytesMut::new();
    write_hdr(&mut buf, KIND_LINES);
    buf.put_u32_le(lines.len() as u32);
    for line in lines {
        buf.put_u32_le(opt_to_raw(line.id));
        buf.put_u32_le(opt_to_raw(line.gid));
        buf.put_u32_le(line.frame as u32);
        buf.put_f64_le(line.time);
        buf.put_u8(if line.is_loop { FLAG_LOOP } else { 0 });
        buf.put_slice(&line.color);
        buf.put_u32_le(line.len() as u32);
        for p in line.points() {
            for v in p {
                buf.put_f64_le(*v);
            }
        }
    }
    buf.freeze()
}

pub fn decode_frame<B: Buf>(buf: &mut B) -> Result<Vec<VortexLine>, VortexError> {
    read_hdr(buf, KIND_LINES)?;
    let count = take_u32(buf)?;
    let mut out = Vec::new();
    for _ in 0..count {
        let id = raw_to_opt(take_u32(buf)?);
        let gid = raw_to_opt(take_u32(buf)?);
        let frame = take_u32(buf)? as usize;
        let time = take_f64(buf)?;
        let flags = take_u8(buf)?;
        let mut color = [0u8; 3];
        for c in &mut color {
            *c = take_u8(buf)?;
        }
        let npoints = take_u32(buf)?;
        let mut points = Vec::new();
        for _ in 0..npoints {
            points.push([take_f64(buf)?, take_f64(buf)?, take_f64(buf)?]);
        }
        let mut line = VortexLine::from_points(frame, time, points);
        line.id = id;
        line.gid = gid;
        line.is_loop = flags & FLAG_LOOP != 0;
        line.color = color;
        out.push(line);
    }
    Ok(out)
}

/// Writes the whole run: the concatenated frames and their offset table.
pub fn write_line_files(base: &str, frames: &[Vec<VortexLine>]) -> Result<(), VortexError> {
    let mut data = BytesMut::new();
    let mut table = BytesMut::new();
    table.put_u64_le(frames.len() as u64);
    for lines in frames {
        let payload = encode_frame(lines);
        table.put_u64_le(data.len() as u64);
        table.put_u64_le(payload.len() as u64);
        data.put_slice(&payload);
    }
    fs::write(vortex_path(base), &data)?;
    fs::write(offset_path(base), &table)?;
    info!(
        "wrote {} frames ({} bytes) to {}",
        frames.len(),
        data.len(),
        vortex_path(base).display()
    );
    Ok(())
}

/// Random access over a written run, one frame at a time.
pub struct VortexFileReader {
    data: Bytes,
    offsets: Vec<(u64, u64)>,
}

impl VortexFileReader {
    pub fn open(base: &str) -> Result<Self, VortexError> {
        let data = Bytes::from(fs::read(vortex_path(base))?);
        let mut table = Bytes::from(fs::read(offset_path(base))?);
        let count = take_u64(&mut table)?;
        let mut offsets = Vec::new();
        for _ in 0..count {
            let offset = take_u64(&mut table)?;
            let size = take_u64(&mut table)?;
            offsets.push((offset, size));
        }
        Ok(VortexFileReader { data, offsets })
    }

    pub fn frame_count(&self) -> usize {
        self.offsets.len()
    }

    /// The raw encoded payload of one frame, zero-copy.
    pub fn frame_bytes(&self, frame: usize) -> Result<Bytes, VortexError> {
        let &(offset, size) = self
            .offsets
            .get(frame)
            .ok_or(VortexError::FrameOutOfRange {
                frame,
                nframes: self.offsets.len(),
            })?;
        let end = offset
            .checked_add(size)
            .filter(|&e| e <= self.data.len() as u64)
            .ok_or_else(|| {
                VortexError::WireParse(format!("offset table points past the data for frame {frame}"))
            })?;
        Ok(self.data.slice(offset as usize..end as usize))
    }

    pub fn read_frame(&self, frame: usize) -> Result<Vec<VortexLine>, VortexError> {
        let mut buf = self.frame_bytes(frame)?;
        let lines = decode_frame(&mut buf)?;
        if buf.has_remaining() {
            return Err(VortexError::WireParse(format!(
                "{} trailing bytes in frame {frame}",
                buf.remaining()
            )));
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frames() -> Vec<Vec<VortexLine>> {
        let mut a = VortexLine::from_points(
            0,
            0.0,
            vec![[0.0, 0.0, 0.0], [0.5, 0.25, 1.0], [1.0, 1.0, 2.0]],
        );
        a.id = Some(0);
        a.gid = Some(7);
        a.color = [10, 20, 30];
        let mut b = VortexLine::from_points(0, 0.0, vec![[3.0, 3.0, 3.0], [4.0, 3.0, 3.0]]);
        b.id = Some(1);
        b.is_loop = true;
        let mut c = VortexLine::from_points(1, 0.5, vec![[0.1, 0.2, 0.3]]);
        c.id = Some(0);
        c.gid = Some(7);
        vec![vec![a, b], vec![], vec![c]]
    }

    #[test]
    fn frame_payload_roundtrips_with_metadata() {
        let frames = sample_frames();
        let bytes = encode_frame(&frames[0]);
        let mut rd = bytes.clone();
        let back = decode_frame(&mut rd).unwrap();
        assert!(!rd.has_remaining());
        assert_eq!(back, frames[0]);
        assert!(back[1].is_loop);
        assert_eq!(back[0].gid, Some(7));
    }

    #[test]
    fn offset_table_gives_random_access() {
        let dir = std::env::temp_dir().join("glvortex-lines-test");
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("run").to_string_lossy().into_owned();

        let frames = sample_frames();
        write_line_files(&base, &frames).unwrap();

        let reader = VortexFileReader::open(&base).unwrap();
        assert_eq!(reader.frame_count(), 3);
        assert_eq!(reader.read_frame(0).unwrap(), frames[0]);
        assert!(reader.read_frame(1).unwrap().is_empty());
        assert_eq!(reader.read_frame(2).unwrap(), frames[2]);
        assert_eq!(reader.frame_bytes(2).unwrap(), encode_frame(&frames[2]));
        assert!(matches!(
            reader.read_frame(3),
            Err(VortexError::FrameOutOfRange {
                frame: 3,
                nframes: 3,
            })
        ));

        std::fs::remove_file(vortex_path(&base)).unwrap();
        std::fs::remove_file(offset_path(&base)).unwrap();
    }
}
