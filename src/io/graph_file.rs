//! Binary persistence for the combinatorial mesh graph.
//!
//! Tetrahedralization dominates preprocessing time on large lattices, so
//! the finished graph is written once and reloaded on later runs. The
//! decoder builds a fresh graph from scratch and validates it; a partially
//! decoded graph is never handed out.

use std::fs;
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::info;

use crate::io::wire::{
    chirality_from_i8, chirality_to_i8, opt_to_raw, raw_to_opt, read_hdr, take_i8, take_u32,
    take_u8, write_hdr, KIND_GRAPH,
};
use crate::topology::graph::{CCell, CEdge, CFace, CellUse, FaceUse, MeshGraph};
use crate::topology::id::{CellId, EdgeId, FaceId, NodeId};
use crate::vortex_error::VortexError;

pub fn encode_graph(graph: &MeshGraph) -> Bytes {
    let mut buf = BytesMut::new();
    write_hdr(&mut buf, KIND_GRAPH);

    buf.put_u32_le(graph.edge_count() as u32);
    for (_, edge) in graph.edges() {
        buf.put_u32_le(edge.node0.get());
        buf.put_u32_le(edge.node1.get());
        buf.put_u32_le(edge.faces.len() as u32);
        for fu in &edge.faces {
            buf.put_u32_le(fu.face.get());
            buf.put_i8(chirality_to_i8(fu.chirality));
            buf.put_u8(fu.local_edge);
        }
    }

    buf.put_u32_le(graph.face_count() as u32);
    for (_, face) in graph.faces() {
        buf.put_u32_le(face.nodes.len() as u32);
        for n in &face.nodes {
            buf.put_u32_le(n.get());
        }
        buf.put_u32_le(face.edges.len() as u32);
        for &(e, c) in &face.edges {
            buf.put_u32_le(e.get());
            buf.put_i8(chirality_to_i8(c));
        }
        buf.put_u32_le(face.cells.len() as u32);
        for cu in &face.cells {
            buf.put_u32_le(cu.cell.get());
            buf.put_i8(chirality_to_i8(cu.chirality));
            buf.put_u8(cu.local_face);
        }
    }

    buf.put_u32_le(graph.cell_count() as u32);
    for (_, cell) in graph.cells() {
        buf.put_u32_le(cell.nodes.len() as u32);
        for n in &cell.nodes {
            buf.put_u32_le(n.get());
        }
        buf.put_u32_le(cell.faces.len() as u32);
        for (k, &(f, c)) in cell.faces.iter().enumerate() {
            buf.put_u32_le(f.get());
            buf.put_i8(chirality_to_i8(c));
            let nb = cell.neighbors.get(k).copied().flatten();
            buf.put_u32_le(opt_to_raw(nb.map(|n| n.get())));
        }
    }
    buf.freeze()
}

pub fn decode_graph<B: Buf>(buf: &mut B) -> Result<MeshGraph, VortexError> {
    read_hdr(buf, KIND_GRAPH)?;

    let nedges = take_u32(buf)?;
    let mut edges = Vec::new();
    for _ in 0..nedges {
        let node0 = NodeId::new(take_u32(buf)?);
        let node1 = NodeId::new(take_u32(buf)?);
        let nuses = take_u32(buf)?;
        let mut faces = Vec::new();
        for _ in 0..nuses {
            faces.push(FaceUse {
                face: FaceId::new(take_u32(buf)?),
                chirality: chirality_from_i8(take_i8(buf)?)?,
                local_edge: take_u8(buf)?,
            });
        }
        edges.push(CEdge {
            node0,
            node1,
            faces,
        });
    }

    let nfaces = take_u32(buf)?;
    let mut faces = Vec::new();
    for _ in 0..nfaces {
        let nnodes = take_u32(buf)?;
        let mut nodes = Vec::new();
        for _ in 0..nnodes {
            nodes.push(NodeId::new(take_u32(buf)?));
        }
        let nring = take_u32(buf)?;
        let mut ring = Vec::new();
        for _ in 0..nring {
            let e = EdgeId::new(take_u32(buf)?);
            let c = chirality_from_i8(take_i8(buf)?)?;
            ring.push((e, c));
        }
        let ncells = take_u32(buf)?;
        let mut cells = Vec::new();
        for _ in 0..ncells {
            cells.push(CellUse {
                cell: CellId::new(take_u32(buf)?),
                chirality: chirality_from_i8(take_i8(buf)?)?,
                local_face: take_u8(buf)?,
            });
        }
        faces.push(CFace {
            nodes,
            edges: ring,
            cells,
        });
    }

    let ncells = take_u32(buf)?;
    let mut cells = Vec::new();
    for _ in 0..ncells {
        let nnodes = take_u32(buf)?;
        let mut nodes = Vec::new();
        for _ in 0..nnodes {
            nodes.push(NodeId::new(take_u32(buf)?));
        }
        let nfaces = take_u32(buf)?;
        let mut cfaces = Vec::new();
        let mut neighbors = Vec::new();
        for _ in 0..nfaces {
            let f = FaceId::new(take_u32(buf)?);
            let c = chirality_from_i8(take_i8(buf)?)?;
            neighbors.push(raw_to_opt(take_u32(buf)?).map(CellId::new));
            cfaces.push((f, c));
        }
        cells.push(CCell {
            nodes,
            faces: cfaces,
            neighbors,
        });
    }

    let graph = MeshGraph::from_parts(edges, faces, cells);
    graph.validate()?;
    Ok(graph)
}

pub fn write_graph_file(path: &Path, graph: &MeshGraph) -> Result<(), VortexError> {
    let bytes = encode_graph(graph);
    fs::write(path, &bytes)?;
    info!("wrote graph to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

pub fn read_graph_file(path: &Path) -> Result<MeshGraph, VortexError> {
    let mut buf = Bytes::from(fs::read(path)?);
    let graph = decode_graph(&mut buf)?;
    if buf.has_remaining() {
        return Err(VortexError::WireParse(format!(
            "{} trailing bytes after graph payload",
            buf.remaining()
        )));
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::regular::{tetrahedralize, RegularLattice};

    fn sample() -> MeshGraph {
        tetrahedralize(&RegularLattice::new([2, 2, 2], [false; 3])).unwrap()
    }

    #[test]
    fn graph_survives_the_wire() {
        let graph = sample();
        let bytes = encode_graph(&graph);
        let mut rd = bytes.clone();
        let back = decode_graph(&mut rd).unwrap();
        assert!(!rd.has_remaining());
        assert_eq!(back, graph);
    }

    #[test]
    fn truncation_is_an_error_not_a_panic() {
        let bytes = encode_graph(&sample());
        for cut in [0, 4, 12, 40, bytes.len() - 1] {
            let mut rd = bytes.slice(..cut);
            assert!(decode_graph(&mut rd).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn corrupt_sign_bytes_are_rejected() {
        let bytes = encode_graph(&sample());
        let mut raw = BytesMut::from(&bytes[..]);
        // first face-use chirality of the first edge record
        raw[28] = 0;
        assert!(matches!(
            decode_graph(&mut raw.freeze()),
            Err(VortexError::InvalidChirality(0))
        ));
    }

    #[test]
    fn wrong_kind_is_refused_up_front() {
        use crate::io::wire::{write_hdr, KIND_LINES};
        let mut buf = BytesMut::new();
        write_hdr(&mut buf, KIND_LINES);
        assert!(matches!(
            decode_graph(&mut buf.freeze()),
            Err(VortexError::WireKind { .. })
        ));
    }
}
