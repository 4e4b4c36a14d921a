//! Legacy VTK (`.vtk`) export of traced vortex lines.
//!
//! ASCII `POLYDATA` with one polyline per vortex. Loops close by repeating
//! their first point index; global ids and colors ride along as cell data
//! so viewers can color by identity.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::curve::line::VortexLine;
use crate::vortex_error::VortexError;

/// Connectivity entries one line contributes, the closing index included.
fn conn_len(line: &VortexLine) -> usize {
    line.len() + usize::from(closes(line))
}

fn closes(line: &VortexLine) -> bool {
    line.is_loop && line.len() > 2
}

pub fn write_vtk<W: Write>(writer: &mut W, lines: &[VortexLine]) -> Result<(), VortexError> {
    writeln!(writer, "# vtk DataFile Version 3.0")?;
    writeln!(writer, "vortex lines")?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET POLYDATA")?;

    let npoints: usize = lines.iter().map(|l| l.len()).sum();
    writeln!(writer, "POINTS {npoints} double")?;
    for line in lines {
        for p in line.points() {
            writeln!(writer, "{} {} {}", p[0], p[1], p[2])?;
        }
    }

    let conn_size: usize = lines.iter().map(|l| 1 + conn_len(l)).sum();
    writeln!(writer, "LINES {} {conn_size}", lines.len())?;
    let mut base = 0usize;
    for line in lines {
        write!(writer, "{}", conn_len(line))?;
        for k in 0..line.len() {
            write!(writer, " {}", base + k)?;
        }
        if closes(line) {
            write!(writer, " {base}")?;
        }
        writeln!(writer)?;
        base += line.len();
    }

    writeln!(writer, "CELL_DATA {}", lines.len())?;
    writeln!(writer, "SCALARS gid int 1")?;
    writeln!(writer, "LOOKUP_TABLE default")?;
    for line in lines {
        let gid = line.gid.map_or(-1, |g| g as i64);
        writeln!(writer, "{gid}")?;
    }
    writeln!(writer, "COLOR_SCALARS color 3")?;
    for line in lines {
        let [r, g, b] = line.color;
        writeln!(
            writer,
            "{:.4} {:.4} {:.4}",
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0
        )?;
    }
    Ok(())
}

pub fn write_vtk_file(path: &Path, lines: &[VortexLine]) -> Result<(), VortexError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_vtk(&mut writer, lines)?;
    writer.flush()?;
    Ok(())
}
