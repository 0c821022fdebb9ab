//! Binary labeling of a 4-connected grid by minimum s-t cut.
//!
//! Energy of a labeling `x` (true = foreground):
//!
//! ```text
//! Σ_p (x_p ? fg_p : bg_p) + Σ_{p~q} w_pq · [x_p ≠ x_q]
//! ```
//!
//! With non-negative `w_pq` the energy is submodular and a minimum cut gives
//! the global minimum. Pixels on the source side of the cut are foreground.
use crate::error::{Error, Result};
use std::collections::VecDeque;

/// Borrowed grid labeling problem; layout as in `ImageCosts`.
#[derive(Clone, Copy, Debug)]
pub struct GridCutProblem<'a> {
    pub width: usize,
    pub height: usize,
    pub fg: &'a [f64],
    pub bg: &'a [f64],
    pub horizontal: &'a [f64],
    pub vertical: &'a [f64],
}

impl GridCutProblem<'_> {
    fn validate(&self) -> Result<()> {
        let (w, h) = (self.width, self.height);
        let sizes = [
            ("foreground costs", self.fg.len(), w * h),
            ("background costs", self.bg.len(), w * h),
            ("horizontal weights", self.horizontal.len(), w.saturating_sub(1) * h),
            ("vertical weights", self.vertical.len(), w * h.saturating_sub(1)),
        ];
        for (what, actual, expected) in sizes {
            if actual != expected {
                return Err(Error::SizeMismatch {
                    what,
                    expected,
                    actual,
                });
            }
        }
        if self
            .horizontal
            .iter()
            .chain(self.vertical)
            .any(|v| *v < 0.0)
        {
            return Err(Error::MinCut("negative pairwise weight".to_string()));
        }
        Ok(())
    }

    /// Energy of `labels` (true = foreground).
    pub fn energy(&self, labels: &[bool]) -> f64 {
        let w = self.width;
        let mut e = 0.0;
        for (i, &fg) in labels.iter().enumerate() {
            e += if fg { self.fg[i] } else { self.bg[i] };
        }
        for y in 0..self.height {
            for x in 0..w {
                let i = y * w + x;
                if x + 1 < w && labels[i] != labels[i + 1] {
                    e += self.horizontal[y * (w - 1) + x];
                }
                if y + 1 < self.height && labels[i] != labels[i + w] {
                    e += self.vertical[i];
                }
            }
        }
        e
    }
}

/// Optimal labeling and its energy.
#[derive(Clone, Debug, PartialEq)]
pub struct Labeling {
    pub labels: Vec<bool>,
    pub energy: f64,
}

pub trait MinCutSolver: Sync {
    fn solve(&self, problem: &GridCutProblem<'_>) -> Result<Labeling>;
}

/// Dinic max-flow on the grid graph.
#[derive(Clone, Copy, Debug, Default)]
pub struct DinicSolver;

impl MinCutSolver for DinicSolver {
    fn solve(&self, problem: &GridCutProblem<'_>) -> Result<Labeling> {
        problem.validate()?;
        let (w, h) = (problem.width, problem.height);
        let n = w * h;
        let (source, sink) = (n, n + 1);
        let pairwise = problem.horizontal.len() + problem.vertical.len();
        let mut graph = FlowGraph::with_capacity(n + 2, 2 * (n + pairwise));

        for i in 0..n {
            let m = problem.fg[i].min(problem.bg[i]);
            // cutting source -> p puts p on the sink side (background)
            let to_source = problem.bg[i] - m;
            let to_sink = problem.fg[i] - m;
            if to_source > 0.0 {
                graph.add_edge(source, i, to_source, 0.0);
            }
            if to_sink > 0.0 {
                graph.add_edge(i, sink, to_sink, 0.0);
            }
        }
        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                if x + 1 < w {
                    let c = problem.horizontal[y * (w - 1) + x];
                    if c > 0.0 {
                        graph.add_edge(i, i + 1, c, c);
                    }
                }
                if y + 1 < h {
                    let c = problem.vertical[i];
                    if c > 0.0 {
                        graph.add_edge(i, i + w, c, c);
                    }
                }
            }
        }

        graph.max_flow(source, sink);
        let reachable = graph.reachable_from(source);
        let labels = reachable[..n].to_vec();
        let energy = problem.energy(&labels);
        if !energy.is_finite() {
            return Err(Error::MinCut(format!("non-finite labeling energy {energy}")));
        }
        Ok(Labeling { labels, energy })
    }
}

const NONE: usize = usize::MAX;
const FLOW_EPS: f64 = 1e-9;

/// Residual graph; edge `e` and `e ^ 1` are each other's reverse.
struct FlowGraph {
    head: Vec<usize>,
    next: Vec<usize>,
    to: Vec<usize>,
    cap: Vec<f64>,
}

impl FlowGraph {
    fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            head: vec![NONE; nodes],
            next: Vec::with_capacity(edges),
            to: Vec::with_capacity(edges),
            cap: Vec::with_capacity(edges),
        }
    }

    fn add_edge(&mut self, u: usize, v: usize, forward: f64, backward: f64) {
        for (a, b, c) in [(u, v, forward), (v, u, backward)] {
            self.to.push(b);
            self.cap.push(c);
            self.next.push(self.head[a]);
            self.head[a] = self.to.len() - 1;
        }
    }

    fn levels(&self, source: usize, sink: usize, level: &mut [usize]) -> bool {
        level.fill(NONE);
        level[source] = 0;
        let mut queue = VecDeque::from([source]);
        while let Some(u) = queue.pop_front() {
            let mut e = self.head[u];
            while e != NONE {
                let v = self.to[e];
                if self.cap[e] > FLOW_EPS && level[v] == NONE {
                    level[v] = level[u] + 1;
                    queue.push_back(v);
                }
                e = self.next[e];
            }
        }
        level[sink] != NONE
    }

    /// Blocking flow along level-increasing paths, with an explicit path stack.
    fn blocking_flow(
        &mut self,
        source: usize,
        sink: usize,
        level: &mut [usize],
        it: &mut [usize],
    ) -> f64 {
        it.copy_from_slice(&self.head);
        let mut path: Vec<usize> = Vec::new();
        let mut total = 0.0;
        loop {
            let u = path.last().map_or(source, |&e| self.to[e]);
            if u == sink {
                let pushed = path
                    .iter()
                    .map(|&e| self.cap[e])
                    .fold(f64::INFINITY, f64::min);
                for &e in &path {
                    self.cap[e] -= pushed;
                    self.cap[e ^ 1] += pushed;
                }
                total += pushed;
                let saturated = path
                    .iter()
                    .position(|&e| self.cap[e] <= FLOW_EPS)
                    .unwrap_or(0);
                path.truncate(saturated);
                continue;
            }

            while it[u] != NONE {
                let e = it[u];
                if self.cap[e] > FLOW_EPS && level[self.to[e]] == level[u] + 1 {
                    break;
                }
                it[u] = self.next[e];
            }

            if it[u] == NONE {
                if u == source {
                    break;
                }
                level[u] = NONE;
                path.pop();
                let prev = path.last().map_or(source, |&e| self.to[e]);
                it[prev] = self.next[it[prev]];
            } else {
                path.push(it[u]);
            }
        }
        total
    }

    fn max_flow(&mut self, source: usize, sink: usize) -> f64 {
        let n = self.head.len();
        let mut level = vec![NONE; n];
        let mut it = vec![NONE; n];
        let mut flow = 0.0;
        while self.levels(source, sink, &mut level) {
            flow += self.blocking_flow(source, sink, &mut level, &mut it);
        }
        flow
    }

    fn reachable_from(&self, source: usize) -> Vec<bool> {
        let mut seen = vec![false; self.head.len()];
        seen[source] = true;
        let mut stack = vec![source];
        while let Some(u) = stack.pop() {
            let mut e = self.head[u];
            while e != NONE {
                let v = self.to[e];
                if self.cap[e] > FLOW_EPS && !seen[v] {
                    seen[v] = true;
                    stack.push(v);
                }
                e = self.next[e];
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(problem: &GridCutProblem<'_>) -> f64 {
        let n = problem.width * problem.height;
        (0..1u32 << n)
            .map(|bits| {
                let labels: Vec<bool> = (0..n).map(|i| bits >> i & 1 == 1).collect();
                problem.energy(&labels)
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn independent_pixels_pick_cheaper_label() {
        let fg = [1.0, 0.0, 3.0, -1.0];
        let bg = [0.0, 2.0, 1.0, 0.5];
        let problem = GridCutProblem {
            width: 2,
            height: 2,
            fg: &fg,
            bg: &bg,
            horizontal: &[0.0; 2],
            vertical: &[0.0; 2],
        };
        let labeling = DinicSolver.solve(&problem).unwrap();
        assert_eq!(labeling.labels, vec![false, true, false, true]);
        assert!((labeling.energy - (0.0 + 0.0 + 1.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn strong_smoothness_flattens_labels() {
        let fg = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let bg = [1.0, 1.0, 1.0, 0.0, 0.0, 0.2];
        let problem = GridCutProblem {
            width: 6,
            height: 1,
            fg: &fg,
            bg: &bg,
            horizontal: &[10.0; 5],
            vertical: &[],
        };
        let labeling = DinicSolver.solve(&problem).unwrap();
        assert!(labeling.labels.iter().all(|&l| l == labeling.labels[0]));
        assert!((labeling.energy - 3.0).abs() < 1e-9);
    }

    #[test]
    fn matches_brute_force_on_small_grids() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let width = rng.gen_range(1..4);
            let height = rng.gen_range(1..4);
            let n = width * height;
            let fg: Vec<f64> = (0..n).map(|_| rng.gen_range(-2.0..2.0)).collect();
            let bg: Vec<f64> = (0..n).map(|_| rng.gen_range(-2.0..2.0)).collect();
            let horizontal: Vec<f64> = (0..(width - 1) * height)
                .map(|_| rng.gen_range(0.0..1.5))
                .collect();
            let vertical: Vec<f64> = (0..width * (height - 1))
                .map(|_| rng.gen_range(0.0..1.5))
                .collect();
            let problem = GridCutProblem {
                width,
                height,
                fg: &fg,
                bg: &bg,
                horizontal: &horizontal,
                vertical: &vertical,
            };
            let labeling = DinicSolver.solve(&problem).unwrap();
            let best = brute_force(&problem);
            assert!(
                (labeling.energy - best).abs() < 1e-9,
                "{} vs {best}",
                labeling.energy
            );
        }
    }

    #[test]
    fn rejects_malformed_problems() {
        let problem = GridCutProblem {
            width: 2,
            height: 1,
            fg: &[0.0, 0.0],
            bg: &[0.0],
            horizontal: &[0.0],
            vertical: &[],
        };
        assert!(matches!(
            DinicSolver.solve(&problem),
            Err(Error::SizeMismatch { .. })
        ));
        let negative = GridCutProblem {
            width: 2,
            height: 1,
            fg: &[0.0, 0.0],
            bg: &[0.0, 0.0],
            horizontal: &[-1.0],
            vertical: &[],
        };
        assert!(matches!(DinicSolver.solve(&negative), Err(Error::MinCut(_))));
    }
}
