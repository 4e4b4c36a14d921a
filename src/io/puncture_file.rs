//! Cache files for detected punctures.
//!
//! Detection is the expensive part of a run, so punctured faces and edges
//! are cached per frame (`<name>.pf.<frame>`) and per interval
//! (`<name>.pe.<t0>.<t1>`). Records are written in id order; readers hand
//! back the raw records and leave the incidence replay to the extractor.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use hashbrown::HashMap as FastMap;
use log::info;

use crate::extract::puncture::{PuncturedEdge, PuncturedFace};
use crate::io::wire::{
    chirality_from_i8, chirality_to_i8, read_hdr, take_f64, take_i8, take_u32, take_u8, write_hdr,
    KIND_PEDGE, KIND_PFACE,
};
use crate::topology::id::{EdgeId, FaceId};
use crate::vortex_error::VortexError;

pub fn face_cache_path(name: &str, frame: usize) -> PathBuf {
    PathBuf::from(format!("{name}.pf.{frame}"))
}

pub fn edge_cache_path(name: &str, t0: usize, t1: usize) -> PathBuf {
    PathBuf::from(format!("{name}.pe.{t0}.{t1}"))
}

pub fn write_face_cache(
    path: &Path,
    faces: &FastMap<FaceId, PuncturedFace>,
) -> Result<(), VortexError> {
    let mut records: Vec<(&FaceId, &PuncturedFace)> = faces.iter().collect();
    records.sort_unstable_by_key(|(id, _)| **id);

    let mut buf = BytesMut::new();
    write_hdr(&mut buf, KIND_PFACE);
    buf.put_u32_le(records.len() as u32);
    for (id, pf) in records {
        buf.put_u32_le(id.get());
        buf.put_i8(chirality_to_i8(pf.chirality));
        match pf.pos {
            Some(p) => {
                buf.put_u8(1);
                for v in p {
                    buf.put_f64_le(v);
                }
            }
            None => buf.put_u8(0),
        }
    }
    fs::write(path, &buf)?;
    info!("cached {} punctured faces at {}", faces.len(), path.display());
    Ok(())
}

pub fn read_face_cache(path: &Path) -> Result<Vec<(FaceId, PuncturedFace)>, VortexError> {
    let mut buf = Bytes::from(fs::read(path)?);
    read_hdr(&mut buf, KIND_PFACE)?;
    let count = take_u32(&mut buf)?;
    let mut out = Vec::new();
    for _ in 0..count {
        let id = FaceId::new(take_u32(&mut buf)?);
        let chirality = chirality_from_i8(take_i8(&mut buf)?)?;
        let pos = match take_u8(&mut buf)? {
            0 => None,
            _ => Some([
                take_f64(&mut buf)?,
                take_f64(&mut buf)?,
                take_f64(&mut buf)?,
            ]),
        };
        out.push((id, PuncturedFace { chirality, pos }));
    }
    Ok(out)
}

pub fn write_edge_cache(
    path: &Path,
    edges: &FastMap<EdgeId, PuncturedEdge>,
) -> Result<(), VortexError> {
    let mut records: Vec<(&EdgeId, &PuncturedEdge)> = edges.iter().collect();
    records.sort_unstable_by_key(|(id, _)| **id);

    let mut buf = BytesMut::new();
    write_hdr(&mut buf, KIND_PEDGE);
    buf.put_u32_le(records.len() as u32);
    for (id, pe) in records {
        buf.put_u32_le(id.get());
        buf.put_i8(chirality_to_i8(pe.chirality));
        buf.put_f64_le(pe.t);
    }
    fs::write(path, &buf)?;
    info!("cached {} punctured edges at {}", edges.len(), path.display());
    Ok(())
}

pub fn read_edge_cache(path: &Path) -> Result<Vec<(EdgeId, PuncturedEdge)>, VortexError> {
    let mut buf = Bytes::from(fs::read(path)?);
    read_hdr(&mut buf, KIND_PEDGE)?;
    let count = take_u32(&mut buf)?;
    let mut out = Vec::new();
    for _ in 0..count {
        let id = EdgeId::new(take_u32(&mut buf)?);
        let chirality = chirality_from_i8(take_i8(&mut buf)?)?;
        let t = take_f64(&mut buf)?;
        out.push((id, PuncturedEdge { chirality, t }));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::chirality::Chirality;

    #[test]
    fn cache_paths_carry_frame_numbers() {
        assert_eq!(
            face_cache_path("run/gl3d", 12),
            PathBuf::from("run/gl3d.pf.12")
        );
        assert_eq!(
            edge_cache_path("run/gl3d", 12, 13),
            PathBuf::from("run/gl3d.pe.12.13")
        );
    }

    #[test]
    fn face_cache_roundtrips_in_id_order() {
        let dir = std::env::temp_dir().join("glvortex-pf-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("a.pf.0");

        let mut faces = FastMap::new();
        faces.insert(FaceId::new(9), PuncturedFace {
            chirality: Chirality::Neg,
            pos: None,
        });
        faces.insert(FaceId::new(2), PuncturedFace {
            chirality: Chirality::Pos,
            pos: Some([0.5, 1.5, 2.5]),
        });
        write_face_cache(&path, &faces).unwrap();

        let records = read_face_cache(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, FaceId::new(2));
        assert_eq!(records[0].1.pos, Some([0.5, 1.5, 2.5]));
        assert_eq!(records[1].0, FaceId::new(9));
        assert_eq!(records[1].1.chirality, Chirality::Neg);
        assert_eq!(records[1].1.pos, None);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn edge_cache_roundtrips() {
        let dir = std::env::temp_dir().join("glvortex-pe-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("a.pe.0.1");

        let mut edges = FastMap::new();
        edges.insert(EdgeId::new(4), PuncturedEdge {
            chirality: Chirality::Pos,
            t: 0.25,
        });
        write_edge_cache(&path, &edges).unwrap();
        let records = read_edge_cache(&path).unwrap();
        assert_eq!(records, vec![(EdgeId::new(4), PuncturedEdge {
            chirality: Chirality::Pos,
            t: 0.25,
        })]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_cache_is_an_io_error() {
        let err = read_face_cache(Path::new("/nonexistent/x.pf.0")).unwrap_err();
        assert!(matches!(err, VortexError::Io(_)));
    }
}
