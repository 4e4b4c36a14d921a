//! Framing shared by every binary file this crate writes.
//!
//! Each payload opens with an 8-byte header: a magic tag, a format version,
//! and a kind discriminant so a graph file is never fed to the line decoder.
//! All integers and floats on the wire are little-endian.

use bytes::{Buf, BufMut};
use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use crate::topology::chirality::Chirality;
use crate::vortex_error::VortexError;

pub const WIRE_MAGIC: [u8; 4] = *b"VXWR";
pub const WIRE_VERSION: u16 = 1;

pub const KIND_GRAPH: u16 = 1;
pub const KIND_LINES: u16 = 2;
pub const KIND_PFACE: u16 = 3;
pub const KIND_PEDGE: u16 = 4;

/// Raw id standing in for an absent optional id on the wire.
pub const ABSENT_ID: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct WireHdr {
    pub magic: [u8; 4],
    version_le: [u8; 2],
    kind_le: [u8; 2],
}

const_assert_eq!(std::mem::size_of::<WireHdr>(), 8);
const_assert_eq!(std::mem::align_of::<WireHdr>(), 1);

impl WireHdr {
    pub fn new(kind: u16) -> Self {
        WireHdr {
            magic: WIRE_MAGIC,
            version_le: WIRE_VERSION.to_le_bytes(),
            kind_le: kind.to_le_bytes(),
        }
    }

    pub fn version(&self) -> u16 {
        u16::from_le_bytes(self.version_le)
    }

    pub fn kind(&self) -> u16 {
        u16::from_le_bytes(self.kind_le)
    }
}

pub fn write_hdr<B: BufMut>(buf: &mut B, kind: u16) {
    buf.put_slice(bytemuck::bytes_of(&WireHdr::new(kind)));
}

/// Consumes and checks a header, failing on foreign files, version drift,
/// or a payload of the wrong kind.
pub fn read_hdr<B: Buf>(buf: &mut B, expected_kind: u16) -> Result<(), VortexError> {
    let mut raw = [0u8; std::mem::size_of::<WireHdr>()];
    if buf.remaining() < raw.len() {
        return Err(truncated());
    }
    buf.copy_to_slice(&mut raw);
    let hdr: WireHdr = bytemuck::pod_read_unaligned(&raw);
    if hdr.magic != WIRE_MAGIC {
        return Err(VortexError::BadMagic);
    }
    if hdr.version() != WIRE_VERSION {
        return Err(VortexError::WireVersion {
            found: hdr.version(),
            expected: WIRE_VERSION,
        });
    }
    if hdr.kind() != expected_kind {
        return Err(VortexError::WireKind {
            found: hdr.kind(),
            expected: expected_kind,
        });
    }
    Ok(())
}

fn truncated() -> VortexError {
    VortexError::WireParse("truncated payload".into())
}

pub fn take_u8<B: Buf>(buf: &mut B) -> Result<u8, VortexError> {
    if buf.remaining() < 1 {
        return Err(truncated());
    }
    Ok(buf.get_u8())
}

pub fn take_i8<B: Buf>(buf: &mut B) -> Result<i8, VortexError> {
    if buf.remaining() < 1 {
        return Err(truncated());
    }
    Ok(buf.get_i8())
}

pub fn take_u32<B: Buf>(buf: &mut B) -> Result<u32, VortexError> {
    if buf.remaining() < 4 {
        return Err(truncated());
    }
    Ok(buf.get_u32_le())
}

pub fn take_u64<B: Buf>(buf: &mut B) -> Result<u64, VortexError> {
    if buf.remaining() < 8 {
        return Err(truncated());
    }
    Ok(buf.get_u64_le())
}

pub fn take_f64<B: Buf>(buf: &mut B) -> Result<f64, VortexError> {
    if buf.remaining() < 8 {
        return Err(truncated());
    }
    Ok(buf.get_f64_le())
}

pub fn opt_to_raw(v: Option<u32>) -> u32 {
    v.unwrap_or(ABSENT_ID)
}

pub fn raw_to_opt(v: u32) -> Option<u32> {
    (v != ABSENT_ID).then_some(v)
}

pub fn chirality_to_i8(c: Chirality) -> i8 {
    c.sign() as i8
}

pub fn chirality_from_i8(v: i8) -> Result<Chirality, VortexError> {
    Chirality::from_sign(v as i32)
}
