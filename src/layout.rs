use std::collections::VecDeque;
use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::Graph;

const IDEAL_EDGE_LENGTH: f64 = 100.0;
const NODE_REPULSION: f64 = 4500.0;
const EDGE_ELASTICITY: f64 = 0.45;
const GRAVITY: f64 = 0.02;
const FORCE_ITERATIONS: usize = 300;
const FORCE_SEED: u64 = 0x6d61_7463_6875_7073;
const SPACING_FACTOR: f64 = 1.5;
const NODE_SIZE: f64 = 80.0;
const MIN_NODE_SPACING: f64 = 50.0;
const FIT_PADDING: f64 = 50.0;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphLayout {
    Force,
    Hierarchical,
    Grid,
    Circle,
    Concentric,
}

impl GraphLayout {
    pub const ALL: [GraphLayout; 5] = [
        GraphLayout::Force,
        GraphLayout::Hierarchical,
        GraphLayout::Grid,
        GraphLayout::Circle,
        GraphLayout::Concentric,
    ];

    pub fn next(self) -> Self {
        match self {
            GraphLayout::Force => GraphLayout::Hierarchical,
            GraphLayout::Hierarchical => GraphLayout::Grid,
            GraphLayout::Grid => GraphLayout::Circle,
            GraphLayout::Circle => GraphLayout::Concentric,
            GraphLayout::Concentric => GraphLayout::Force,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GraphLayout::Force => "force",
            GraphLayout::Hierarchical => "hierarchical",
            GraphLayout::Grid => "grid",
            GraphLayout::Circle => "circle",
            GraphLayout::Concentric => "concentric",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One position per node, indexed by node id. Only the displayed edges shape the result.
pub fn compute_layout(layout: GraphLayout, graph: &Graph, edges: &[usize]) -> Vec<Point> {
    let n = graph.nodes.len();
    if n == 0 {
        return Vec::new();
    }
    match layout {
        GraphLayout::Force => force_layout(graph, edges),
        GraphLayout::Hierarchical => hierarchical_layout(graph, edges),
        GraphLayout::Grid => grid_layout(n),
        GraphLayout::Circle => circle_layout(n),
        GraphLayout::Concentric => concentric_layout(graph, edges),
    }
}

fn grid_layout(n: usize) -> Vec<Point> {
    let rows = (n as f64).sqrt().ceil().max(1.0) as usize;
    let cols = n.div_ceil(rows);
    (0..n)
        .map(|i| {
            Point::new(
                (i % cols) as f64 * IDEAL_EDGE_LENGTH,
                -((i / cols) as f64) * IDEAL_EDGE_LENGTH,
            )
        })
        .collect()
}

fn circle_layout(n: usize) -> Vec<Point> {
    if n == 1 {
        return vec![Point::default()];
    }
    let radius = (n as f64 * IDEAL_EDGE_LENGTH / TAU).max(IDEAL_EDGE_LENGTH);
    (0..n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn concentric_layout(graph: &Graph, edges: &[usize]) -> Vec<Point> {
    let degree = graph.degree(edges);
    let mut order: Vec<usize> = (0..graph.nodes.len()).collect();
    order.sort_by(|a, b| degree[*b].cmp(&degree[*a]).then(a.cmp(b)));

    let step = NODE_SIZE + MIN_NODE_SPACING;
    let mut positions = vec![Point::default(); graph.nodes.len()];
    let mut ring_radius: f64 = 0.0;
    let mut ring_index = 0usize;
    let mut start = 0usize;
    while start < order.len() {
        let level = degree[order[start]];
        let end = order[start..]
            .iter()
            .position(|idx| degree[*idx] != level)
            .map(|off| start + off)
            .unwrap_or(order.len());
        let ring = &order[start..end];

        let needed = ring.len() as f64 * step / TAU;
        ring_radius = if ring_index == 0 && ring.len() == 1 {
            0.0
        } else if ring_index == 0 {
            needed
        } else {
            (ring_radius + step).max(needed)
        };

        for (slot, node) in ring.iter().enumerate() {
            let angle = TAU * slot as f64 / ring.len() as f64;
            positions[*node] = Point::new(ring_radius * angle.cos(), ring_radius * angle.sin());
        }
        ring_index += 1;
        start = end;
    }
    positions
}

fn hierarchical_layout(graph: &Graph, edges: &[usize]) -> Vec<Point> {
    let n = graph.nodes.len();
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    for edge in edges.iter().filter_map(|idx| graph.edges.get(*idx)) {
        outgoing[edge.source].push(edge.target);
        indegree[edge.target] += 1;
    }

    let mut depth: Vec<Option<usize>> = vec![None; n];
    let mut queue = VecDeque::new();
    for (node, deg) in indegree.iter().enumerate() {
        if *deg == 0 {
            depth[node] = Some(0);
            queue.push_back(node);
        }
    }

    loop {
        while let Some(node) = queue.pop_front() {
            let next_depth = depth[node].unwrap_or(0) + 1;
            for target in &outgoing[node] {
                if depth[*target].is_none() {
                    depth[*target] = Some(next_depth);
                    queue.push_back(*target);
                }
            }
        }
        // Cycles leave nodes unreached; seed the lowest remaining id as a new root.
        match depth.iter().position(Option::is_none) {
            Some(root) => {
                depth[root] = Some(0);
                queue.push_back(root);
            }
            None => break,
        }
    }

    let spacing = IDEAL_EDGE_LENGTH * SPACING_FACTOR;
    let max_depth = depth.iter().flatten().copied().max().unwrap_or(0);
    let mut levels: Vec<Vec<usize>> = vec![Vec::new(); max_depth + 1];
    for (node, d) in depth.iter().enumerate() {
        levels[d.unwrap_or(0)].push(node);
    }

    let mut positions = vec![Point::default(); n];
    for (level, nodes) in levels.iter().enumerate() {
        let width = nodes.len().saturating_sub(1) as f64 * spacing;
        for (slot, node) in nodes.iter().enumerate() {
            positions[*node] = Point::new(slot as f64 * spacing - width / 2.0, -(level as f64) * spacing);
        }
    }
    positions
}

fn force_layout(graph: &Graph, edges: &[usize]) -> Vec<Point> {
    let n = graph.nodes.len();
    let mut rng = StdRng::seed_from_u64(FORCE_SEED);
    let extent = (n as f64).sqrt() * IDEAL_EDGE_LENGTH;
    let mut pos: Vec<Point> = (0..n)
        .map(|_| Point::new(rng.gen_range(-extent..=extent), rng.gen_range(-extent..=extent)))
        .collect();
    if n == 1 {
        return vec![Point::default()];
    }

    let springs: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|idx| graph.edges.get(*idx))
        .filter(|edge| edge.source != edge.target)
        .map(|edge| (edge.source, edge.target))
        .collect();

    let mut temperature = IDEAL_EDGE_LENGTH;
    let cooling = temperature / FORCE_ITERATIONS as f64;
    let mut disp = vec![Point::default(); n];
    for _ in 0..FORCE_ITERATIONS {
        disp.iter_mut().for_each(|d| *d = Point::default());

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = pos[i].x - pos[j].x;
                let dy = pos[i].y - pos[j].y;
                let dist_sq = (dx * dx + dy * dy).max(1.0);
                let dist = dist_sq.sqrt();
                let force = NODE_REPULSION * IDEAL_EDGE_LENGTH / dist_sq;
                let fx = dx / dist * force;
                let fy = dy / dist * force;
                disp[i].x += fx;
                disp[i].y += fy;
                disp[j].x -= fx;
                disp[j].y -= fy;
            }
        }

        for (a, b) in &springs {
            let dx = pos[*a].x - pos[*b].x;
            let dy = pos[*a].y - pos[*b].y;
            let dist = (dx * dx + dy * dy).sqrt().max(0.01);
            let force = EDGE_ELASTICITY * (dist - IDEAL_EDGE_LENGTH);
            let fx = dx / dist * force;
            let fy = dy / dist * force;
            disp[*a].x -= fx;
            disp[*a].y -= fy;
            disp[*b].x += fx;
            disp[*b].y += fy;
        }

        for (p, d) in pos.iter().zip(disp.iter_mut()) {
            d.x -= p.x * GRAVITY;
            d.y -= p.y * GRAVITY;
        }

        for (p, d) in pos.iter_mut().zip(&disp) {
            let len = (d.x * d.x + d.y * d.y).sqrt();
            if len > 0.0 {
                let step = len.min(temperature);
                p.x += d.x / len * step;
                p.y += d.y / len * step;
            }
        }
        temperature = (temperature - cooling).max(1.0);
    }
    pos
}

/// Visible window over layout space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Point,
    pub half_width: f64,
    pub half_height: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: Point::default(),
            half_width: FIT_PADDING,
            half_height: FIT_PADDING,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Frames every point with padding, at 100% zoom.
    pub fn fit(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let (mut min_x, mut max_x) = (f64::MAX, f64::MIN);
        let (mut min_y, mut max_y) = (f64::MAX, f64::MIN);
        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Self {
            center: Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            half_width: (max_x - min_x) / 2.0 + FIT_PADDING,
            half_height: (max_y - min_y) / 2.0 + FIT_PADDING,
            zoom: 1.0,
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.2).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom * 0.8).max(MIN_ZOOM);
    }

    /// Shifts by a fraction of the visible extent.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.center.x += dx * self.half_width / self.zoom;
        self.center.y += dy * self.half_height / self.zoom;
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let half = self.half_width / self.zoom;
        [self.center.x - half, self.center.x + half]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let half = self.half_height / self.zoom;
        [self.center.y - half, self.center.y + half]
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }
}
