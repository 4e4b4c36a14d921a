//! Global vortex identities across a run.
//!
//! Per-interval transition matrices are chained into sequences: a vortex
//! keeps its global id as long as its component transfers one-to-one.
//! Anything else (births, deaths, splits, merges, recombinations) closes
//! the involved sequences, opens fresh ones, and records an event.

use std::collections::BTreeMap;
use std::io;

use hashbrown::HashMap as FastMap;
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::track::matrix::VortexTransitionMatrix;
use crate::vortex_error::VortexError;

/// Twelve well-separated colors handed out round-robin by the greedy
/// coloring pass.
const PALETTE: [[u8; 3]; 12] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
    [210, 245, 60],
    [250, 190, 190],
    [0, 128, 128],
    [170, 110, 40],
];

/// Lifetime of one globally identified vortex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VortexSequence {
    pub start_frame: usize,
    /// Number of consecutive frames the vortex lives for.
    pub len: usize,
    pub color: [u8; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Birth,
    Death,
    Split,
    Merge,
    Recombination,
}

/// A topology change between two frames, in global sequence ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VortexEvent {
    pub interval: (usize, usize),
    pub kind: EventKind,
    pub lhs: Vec<u32>,
    pub rhs: Vec<u32>,
}

/// The assembled history of a run: matrices in, sequences and events out.
#[derive(Clone, Debug, Default)]
pub struct VortexTransition {
    matrices: BTreeMap<(usize, usize), VortexTransitionMatrix>,
    seqs: Vec<VortexSequence>,
    /// (frame, local id) to global id.
    seqmap: FastMap<(usize, u32), u32>,
    /// (frame, global id) back to the local id in that frame.
    invseqmap: FastMap<(usize, u32), u32>,
    events: Vec<VortexEvent>,
    nvortices_per_frame: BTreeMap<usize, usize>,
}

impl VortexTransition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_matrix(&mut self, m: VortexTransitionMatrix) {
        self.matrices.insert(m.interval(), m);
    }

    pub fn matrix(&self, interval: (usize, usize)) -> Option<&VortexTransitionMatrix> {
        self.matrices.get(&interval)
    }

    /// Chains the matrices covering `nframes` frames starting at
    /// `start_frame` into sequences and events. Every interval of the run
    /// must have been added, and consecutive matrices must agree on the
    /// shared frame's vortex count; matrices outside the run are ignored.
    pub fn construct(&mut self, start_frame: usize, nframes: usize) -> Result<(), VortexError> {
        self.seqs.clear();
        self.seqmap.clear();
        self.invseqmap.clear();
        self.events.clear();
        self.nvortices_per_frame.clear();

        if nframes < 2 {
            return Ok(());
        }
        let intervals: Vec<(usize, usize)> = (0..nframes - 1)
            .map(|k| (start_frame + k, start_frame + k + 1))
            .collect();
        let mut prev_n1 = None;
        for &(t0, t1) in &intervals {
            let m = self
                .matrices
                .get(&(t0, t1))
                .ok_or(VortexError::MissingInterval { t0, t1 })?;
            if let Some(expected) = prev_n1 {
                if m.n0() != expected {
                    return Err(VortexError::FrameCountMismatch {
                        frame: t0,
                        expected,
                        found: m.n0(),
                    });
                }
            }
            prev_n1 = Some(m.n1());
        }

        let first = intervals[0];
        let first_n = self.matrices[&first].n0();
        self.nvortices_per_frame.insert(first.0, first_n);
        for lvid in 0..first_n as u32 {
            self.new_sequence(first.0, lvid);
        }
        for interval in intervals {
            self.advance(interval);
        }
        info!(
            "{} sequences and {} events over {} frames",
            self.seqs.len(),
            self.events.len(),
            nframes
        );
        Ok(())
    }

    fn advance(&mut self, interval: (usize, usize)) {
        let (n1, components) = {
            let m = self
                .matrices
                .get(&interval)
                .expect("construct checked every interval of the run");
            (m.n1(), bipartite_components(m))
        };
        self.nvortices_per_frame.insert(interval.1, n1);

        for (lhs, rhs) in components {
            if let ([lv], [rv]) = (lhs.as_slice(), rhs.as_slice()) {
                let gvid = self.seqmap[&(interval.0, *lv)];
                self.extend_sequence(gvid, interval.1, *rv);
                continue;
            }
            let kind = match (lhs.len(), rhs.len()) {
                (0, _) => EventKind::Birth,
                (_, 0) => EventKind::Death,
                (1, _) => EventKind::Split,
                (_, 1) => EventKind::Merge,
                _ => EventKind::Recombination,
            };
            let lhs_gids = lhs
                .iter()
                .map(|lv| self.seqmap[&(interval.0, *lv)])
                .collect();
            let rhs_gids = rhs
                .iter()
                .map(|rv| self.new_sequence(interval.1, *rv))
                .collect();
            self.events.push(VortexEvent {
                interval,
                kind,
                lhs: lhs_gids,
                rhs: rhs_gids,
            });
        }
    }

    fn new_sequence(&mut self, frame: usize, lvid: u32) -> u32 {
        let gvid = self.seqs.len() as u32;
        self.seqs.push(VortexSequence {
            start_frame: frame,
            len: 0,
            color: [255, 0, 0],
        });
        self.extend_sequence(gvid, frame, lvid);
        gvid
    }

    fn extend_sequence(&mut self, gvid: u32, frame: usize, lvid: u32) {
        self.seqs[gvid as usize].len += 1;
        self.seqmap.insert((frame, lvid), gvid);
        self.invseqmap.insert((frame, gvid), lvid);
    }

    pub fn lvid_to_gvid(&self, frame: usize, lvid: u32) -> Option<u32> {
        self.seqmap.get(&(frame, lvid)).copied()
    }

    pub fn gvid_to_lvid(&self, frame: usize, gvid: u32) -> Option<u32> {
        self.invseqmap.get(&(frame, gvid)).copied()
    }

    pub fn nvortices(&self, frame: usize) -> usize {
        self.nvortices_per_frame.get(&frame).copied().unwrap_or(0)
    }

    pub fn max_nvortices_per_frame(&self) -> usize {
        self.nvortices_per_frame.values().copied().max().unwrap_or(0)
    }

    pub fn sequences(&self) -> &[VortexSequence] {
        &self.seqs
    }

    pub fn sequence_color(&self, gvid: u32) -> Option<[u8; 3]> {
        self.seqs.get(gvid as usize).map(|s| s.color)
    }

    pub fn events(&self) -> &[VortexEvent] {
        &self.events
    }

    /// Colors sequences so any two related by an event differ, greedily
    /// from a fixed palette. Falls back to reuse when a vertex has more
    /// than eleven event neighbors.
    pub fn sequence_graph_coloring(&mut self) {
        let n = self.seqs.len();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for ev in &self.events {
            let members: Vec<usize> = ev
                .lhs
                .iter()
                .chain(&ev.rhs)
                .map(|&g| g as usize)
                .collect();
            for (k, &a) in members.iter().enumerate() {
                for &b in &members[k + 1..] {
                    adjacency[a].push(b);
                    adjacency[b].push(a);
                }
            }
        }

        let mut assigned: Vec<Option<usize>> = vec![None; n];
        let mut exhausted = false;
        for v in 0..n {
            let mut used = [false; PALETTE.len()];
            for &nb in &adjacency[v] {
                if let Some(c) = assigned[nb] {
                    used[c] = true;
                }
            }
            let pick = match used.iter().position(|&u| !u) {
                Some(c) => c,
                None => {
                    exhausted = true;
                    v % PALETTE.len()
                }
            };
            assigned[v] = Some(pick);
            self.seqs[v].color = PALETTE[pick];
        }
        if exhausted {
            warn!("palette exhausted, some related sequences share a color");
        }
    }

    /// Random saturated colors, reproducible from the caller's rng.
    pub fn random_color_scheme<R: Rng>(&mut self, rng: &mut R) {
        for seq in &mut self.seqs {
            let h = rng.gen_range(0.0..360.0);
            seq.color = hsv_to_rgb(h, 0.8, 0.9);
        }
    }

    /// Renders the whole transition history as a graphviz digraph, one rank
    /// per frame, nodes labeled with global ids.
    pub fn write_dot<W: io::Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "digraph vortex_transition {{")?;
        writeln!(w, "  rankdir=LR;")?;
        writeln!(w, "  node [shape=circle, style=filled];")?;
        for (&frame, &n) in &self.nvortices_per_frame {
            write!(w, "  {{ rank=same;")?;
            for lvid in 0..n as u32 {
                write!(w, " f{frame}v{lvid};")?;
            }
            writeln!(w, " }}")?;
        }
        for (&frame, &n) in &self.nvortices_per_frame {
            for lvid in 0..n as u32 {
                if let Some(&gvid) = self.seqmap.get(&(frame, lvid)) {
                    let c = self.seqs[gvid as usize].color;
                    writeln!(
                        w,
                        "  f{frame}v{lvid} [label=\"{gvid}\", fillcolor=\"#{:02x}{:02x}{:02x}\"];",
                        c[0], c[1], c[2]
                    )?;
                }
            }
        }
        for (&(t0, t1), m) in &self.matrices {
            for i in 0..m.n0() {
                for j in 0..m.n1() {
                    if m.entry(i, j) > 0 {
                        writeln!(w, "  f{t0}v{i} -> f{t1}v{j} [weight={}];", m.entry(i, j))?;
                    }
                }
            }
        }
        writeln!(w, "}}")
    }
}

/// Connected components of the bipartite graph a matrix spans, isolated
/// vortices included as singletons. Rows and columns come back sorted.
fn bipartite_components(m: &VortexTransitionMatrix) -> Vec<(Vec<u32>, Vec<u32>)> {
    let n0 = m.n0();
    let n1 = m.n1();
    let mut seen_l = vec![false; n0];
    let mut seen_r = vec![false; n1];
    let mut out = Vec::new();

    // (side, index) worklist; side false = row, true = column
    let mut stack: Vec<(bool, usize)> = Vec::new();
    for seed in 0..n0 + n1 {
        let (side, idx) = if seed < n0 {
            (false, seed)
        } else {
            (true, seed - n0)
        };
        let seen = if side { &mut seen_r } else { &mut seen_l };
        if seen[idx] {
            continue;
        }
        seen[idx] = true;
        let mut lhs = Vec::new();
        let mut rhs = Vec::new();
        stack.push((side, idx));
        while let Some((side, idx)) = stack.pop() {
            if side {
                rhs.push(idx as u32);
                for i in 0..n0 {
                    if m.entry(i, idx) > 0 && !seen_l[i] {
                        seen_l[i] = true;
                        stack.push((false, i));
                    }
                }
            } else {
                lhs.push(idx as u32);
                for j in 0..n1 {
                    if m.entry(idx, j) > 0 && !seen_r[j] {
                        seen_r[j] = true;
                        stack.push((true, j));
                    }
                }
            }
        }
        lhs.sort_unstable();
        rhs.sort_unstable();
        out.push((lhs, rhs));
    }
    out
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}
