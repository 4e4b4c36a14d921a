//! Persistence of extraction products: punctured-element caches, the
//! frame-indexed line file pair, and the VTK export.

mod common;

use common::{drifting_vortex, straight_vortex, SyntheticDataset};
use glvortex::extract::dataset::{Dataset, TimeSlot};
use glvortex::extract::extractor::VortexExtractor;
use glvortex::io::line_file::{offset_path, vortex_path, write_line_files, VortexFileReader};
use glvortex::io::puncture_file::{edge_cache_path, face_cache_path};
use glvortex::io::vtk::{write_vtk, write_vtk_file};

/// Cache paths derive from the dataset name, so tests point the name into
/// the temp directory.
fn temp_name(tag: &str) -> &'static str {
    Box::leak(
        std::env::temp_dir()
            .join(format!("glvortex-{tag}"))
            .to_string_lossy()
            .into_owned()
            .into_boxed_str(),
    )
}

#[test]
fn face_caches_replay_into_a_fresh_extractor() {
    let name = temp_name("face-cache");
    let data = SyntheticDataset::new(name, [3, 3, 4], straight_vortex);
    let mut ex = VortexExtractor::new(&data);
    ex.extract_faces(TimeSlot::Current);
    ex.save_punctured_faces(TimeSlot::Current).unwrap();

    let mut fresh = VortexExtractor::new(&data);
    assert!(fresh.load_punctured_faces(TimeSlot::Current));
    assert_eq!(fresh.punctured_faces(), ex.punctured_faces());
    // the replay rebuilds the cell and prism bookkeeping, not just the map
    assert_eq!(fresh.punctured_cells(), ex.punctured_cells());
    assert_eq!(fresh.prism_cells(), ex.prism_cells());

    std::fs::remove_file(face_cache_path(name, data.frame(TimeSlot::Current))).unwrap();
}

#[test]
fn edge_caches_replay_into_a_fresh_extractor() {
    let name = temp_name("edge-cache");
    let data = SyntheticDataset::new(name, [3, 3, 4], drifting_vortex);
    let mut ex = VortexExtractor::new(&data);
    ex.extract_faces(TimeSlot::Current);
    ex.extract_faces(TimeSlot::Next);
    ex.extract_edges();
    assert!(!ex.punctured_edges().is_empty());
    ex.save_punctured_edges().unwrap();

    let mut fresh = VortexExtractor::new(&data);
    assert!(fresh.load_punctured_edges());
    assert_eq!(fresh.punctured_edges(), ex.punctured_edges());

    std::fs::remove_file(edge_cache_path(name, 0, 1)).unwrap();
}

#[test]
fn missing_caches_fall_back_to_recomputation() {
    let data = SyntheticDataset::new("/glvortex-no-such-dir/none", [2, 2, 2], straight_vortex);
    let mut ex = VortexExtractor::new(&data);
    assert!(!ex.load_punctured_faces(TimeSlot::Current));
    assert!(!ex.load_punctured_edges());
    assert!(ex.punctured_faces().is_empty());
    assert!(ex.punctured_edges().is_empty());
}

#[test]
fn traced_lines_survive_the_file_pair() {
    let data = SyntheticDataset::new("lines", [3, 3, 4], straight_vortex);
    let mut ex = VortexExtractor::new(&data);
    ex.extract_faces(TimeSlot::Current);
    let trace = ex.trace_space();
    assert_eq!(trace.lines.len(), 1);

    let base = std::env::temp_dir()
        .join("glvortex-run-test")
        .to_string_lossy()
        .into_owned();
    let frames = vec![trace.lines.clone(), Vec::new()];
    write_line_files(&base, &frames).unwrap();

    let reader = VortexFileReader::open(&base).unwrap();
    assert_eq!(reader.frame_count(), 2);
    assert_eq!(reader.read_frame(0).unwrap(), trace.lines);
    assert!(reader.read_frame(1).unwrap().is_empty());

    std::fs::remove_file(vortex_path(&base)).unwrap();
    std::fs::remove_file(offset_path(&base)).unwrap();
}

#[test]
fn vtk_export_lists_the_full_polyline() {
    let data = SyntheticDataset::new("vtk", [3, 3, 4], straight_vortex);
    let mut ex = VortexExtractor::new(&data);
    ex.extract_faces(TimeSlot::Current);
    let mut lines = ex.trace_space().lines;
    lines[0].gid = Some(3);

    let mut out = Vec::new();
    write_vtk(&mut out, &lines).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("DATASET POLYDATA"));
    assert!(text.contains("POINTS 10 double"));
    assert!(text.contains("LINES 1 11"));
    assert!(text.contains("\n10 0 1 2 3 4 5 6 7 8 9\n"));
    assert!(text.contains("CELL_DATA 1"));
    assert!(text.contains("\n3\n"));

    let path = std::env::temp_dir().join("glvortex-vtk-test.vtk");
    write_vtk_file(&path, &lines).unwrap();
    let on_disk = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(on_disk, text);
}
