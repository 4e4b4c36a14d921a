// End-to-end vortex tracking on a synthetic lattice field.
// Run with `cargo run --example trace_lattice`

use std::fs::File;

use glvortex::io::line_file::write_line_files;
use glvortex::io::vtk::write_vtk_file;
use glvortex::prelude::*;

/// A unit vortex along z drifting in x, sampled between two frames.
struct DriftField<'g> {
    lattice: RegularLattice,
    graph: &'g MeshGraph,
    frames: (usize, usize),
}

impl DriftField<'_> {
    fn core_x(t: f64) -> f64 {
        2.3 + 1.1 * t
    }
}

impl Dataset for DriftField<'_> {
    fn graph(&self) -> &MeshGraph {
        self.graph
    }
    fn name(&self) -> &str {
        "trace_demo"
    }
    fn frame(&self, slot: TimeSlot) -> usize {
        match slot {
            TimeSlot::Current => self.frames.0,
            TimeSlot::Next => self.frames.1,
        }
    }
    fn position(&self, node: NodeId) -> [f64; 3] {
        let [x, y, z] = self.lattice.node_index(node);
        [f64::from(x), f64::from(y), f64::from(z)]
    }
    fn sample(&self, node: NodeId, slot: TimeSlot) -> Complex {
        let [x, y, _] = self.position(node);
        Complex::new(x - Self::core_x(self.time(slot)), y - 5.6)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let out = std::env::temp_dir().join("glvortex-demo");
    std::fs::create_dir_all(&out)?;
    let nframes = 4usize;

    // ---------------------------------------------
    // 1) Mesh the lattice once, reuse it per frame
    // ---------------------------------------------
    let lattice = RegularLattice::new([12, 12, 8], [false; 3]);
    let graph = tetrahedralize(&lattice)?;
    println!(
        "lattice {:?}: {} cells, {} faces, {} edges",
        lattice.dims(),
        graph.cell_count(),
        graph.face_count(),
        graph.edge_count()
    );

    // ---------------------------------------------
    // 2) Per frame: detect punctures, trace lines
    // ---------------------------------------------
    let mut traces: Vec<SpaceTrace> = Vec::new();
    for k in 0..nframes {
        let data = DriftField {
            lattice,
            graph: &graph,
            frames: (k, k + 1),
        };
        let mut ex = VortexExtractor::new(&data);
        ex.extract_faces(TimeSlot::Current);
        let trace = ex.trace_space();
        println!(
            "frame {k}: {} punctured faces, {} vortex objects, {} lines",
            ex.punctured_faces().len(),
            trace.components,
            trace.lines.len()
        );
        write_vtk_file(&out.join(format!("frame{k}.vtk")), &trace.lines)?;
        traces.push(trace);
    }

    let curve = BezierCurve::from_line(&traces[0].lines[0], 1e-3);
    println!(
        "frame 0 line fits {} cubic segments",
        curve.segments().len()
    );

    // ---------------------------------------------
    // 3) Per interval: prisms, correspondences, matrices
    // ---------------------------------------------
    let mut vt = VortexTransition::new();
    for k in 0..nframes - 1 {
        let data = DriftField {
            lattice,
            graph: &graph,
            frames: (k, k + 1),
        };
        let mut ex = VortexExtractor::new(&data);
        ex.extract_faces(TimeSlot::Current);
        ex.extract_faces(TimeSlot::Next);
        ex.extract_edges();
        let stats = ex.prism_stats();
        let correspondences = ex.trace_time();
        println!(
            "interval [{k}, {}]: {} punctured edges, prisms {stats:?}, {} correspondences",
            k + 1,
            ex.punctured_edges().len(),
            correspondences.len()
        );
        vt.add_matrix(VortexTransitionMatrix::from_correspondences(
            (k, k + 1),
            &traces[k],
            &traces[k + 1],
            &correspondences,
        ));
    }

    // ---------------------------------------------
    // 4) Global identities, colors, run files
    // ---------------------------------------------
    vt.construct(0, nframes)?;
    vt.sequence_graph_coloring();
    println!(
        "{} sequences, {} events",
        vt.sequences().len(),
        vt.events().len()
    );
    for ev in vt.events() {
        println!("  {:?} at {:?}: {:?} -> {:?}", ev.kind, ev.interval, ev.lhs, ev.rhs);
    }

    let mut frames: Vec<Vec<VortexLine>> = traces.into_iter().map(|t| t.lines).collect();
    for (k, lines) in frames.iter_mut().enumerate() {
        for line in lines.iter_mut() {
            let Some(lv) = line.id else { continue };
            let Some(gv) = vt.lvid_to_gvid(k, lv) else { continue };
            line.gid = Some(gv);
            if let Some(c) = vt.sequence_color(gv) {
                line.color = c;
            }
        }
    }
    let base = out.join("trace_demo").to_string_lossy().into_owned();
    write_line_files(&base, &frames)?;
    vt.write_dot(File::create(out.join("trace_demo.dot"))?)?;

    let reader = VortexFileReader::open(&base)?;
    println!(
        "wrote {} frames to {}, frame 0 reads back {} lines",
        reader.frame_count(),
        out.display(),
        reader.read_frame(0)?.len()
    );
    Ok(())
}
