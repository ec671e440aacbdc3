//! Commutative-diagram matrices: a grid plus arrows between cells and
//! per-cell border decorations.
//!
//! Arrow endpoints are row-major cell indices into the same diagram.
//! Every mutation that renumbers cells remaps the arrow endpoints and
//! the decoration grid in the same pass; arrows that lose an endpoint
//! are dropped rather than left stale.

use super::matrix::ordered_clamped;
use super::{Formula, Matrix};

/// Line style of an arrow or a decoration border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Where an arrow label sits relative to the arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPos {
    #[default]
    Above,
    Below,
    /// Centered on the arrow, drawn over a background patch.
    Centered,
}

/// An arrow between two cells of the same diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub from: usize,
    pub to: usize,
    /// 1 = single shaft, 2 = double, 3+ = numbered multi-shaft.
    pub multiplicity: u8,
    pub stroke: StrokeStyle,
    /// Head glyph; `">"` is the default head.
    pub head: String,
    pub label: Option<Formula>,
    pub label_pos: LabelPos,
}

impl Arrow {
    /// A plain single solid arrow between two cells.
    pub fn new(from: usize, to: usize) -> Self {
        Arrow {
            from,
            to,
            multiplicity: 1,
            stroke: StrokeStyle::Solid,
            head: ">".to_string(),
            label: None,
            label_pos: LabelPos::Above,
        }
    }
}

/// Border decoration of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decoration {
    /// Margin delta in steps; positive grows, negative shrinks.
    pub size: i8,
    pub circular: bool,
    pub doubled: bool,
    pub stroke: StrokeStyle,
}

/// A matrix augmented with arrows and per-cell decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    grid: Matrix,
    arrows: Vec<Arrow>,
    decorations: Vec<Option<Decoration>>,
}

impl Diagram {
    pub fn new(rows: usize, cols: usize) -> Self {
        let grid = Matrix::new(rows, cols);
        let decorations = vec![None; grid.rows() * grid.cols()];
        Diagram {
            grid,
            arrows: Vec::new(),
            decorations,
        }
    }

    pub fn matrix(&self) -> &Matrix {
        &self.grid
    }

    pub fn matrix_mut(&mut self) -> &mut Matrix {
        &mut self.grid
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn decoration(&self, row: usize, col: usize) -> Option<&Decoration> {
        self.decorations[self.grid.index(row, col)].as_ref()
    }

    pub fn set_decoration(&mut self, row: usize, col: usize, deco: Option<Decoration>) {
        let idx = self.grid.index(row, col);
        self.decorations[idx] = deco;
    }

    /// Add an arrow. Returns false (and adds nothing) when an endpoint
    /// is out of bounds.
    pub fn add_arrow(&mut self, arrow: Arrow) -> bool {
        let cells = self.grid.rows() * self.grid.cols();
        if arrow.from >= cells || arrow.to >= cells {
            return false;
        }
        self.arrows.push(arrow);
        true
    }

    /// Find the `ordinal`-th arrow sharing the `(from, to)` pair.
    /// Parallel arrows between the same cells are permitted, so the
    /// ordinal disambiguates.
    pub fn find_arrow(&self, from: usize, to: usize, ordinal: usize) -> Option<&Arrow> {
        self.arrows
            .iter()
            .filter(|a| a.from == from && a.to == to)
            .nth(ordinal)
    }

    /// Remove and return the `ordinal`-th arrow of the `(from, to)`
    /// pair.
    pub fn remove_arrow(&mut self, from: usize, to: usize, ordinal: usize) -> Option<Arrow> {
        let pos = self
            .arrows
            .iter()
            .enumerate()
            .filter(|(_, a)| a.from == from && a.to == to)
            .nth(ordinal)
            .map(|(i, _)| i)?;
        Some(self.arrows.remove(pos))
    }

    pub fn can_shrink(&self, horizontal: bool) -> bool {
        self.grid.can_shrink(horizontal)
    }

    /// Add one trailing column or row, renumbering arrow endpoints and
    /// growing the decoration grid to match.
    pub fn extend(&mut self, horizontal: bool) {
        let old_cols = self.grid.cols();
        self.grid.extend(horizontal);
        let new_cols = self.grid.cols();
        if horizontal {
            for arrow in &mut self.arrows {
                arrow.from = remap(arrow.from, old_cols, new_cols);
                arrow.to = remap(arrow.to, old_cols, new_cols);
            }
        }
        self.decorations = remap_grid(
            std::mem::take(&mut self.decorations),
            old_cols,
            self.grid.rows(),
            new_cols,
        );
    }

    /// Drop the trailing column or row. Arrows with an endpoint in the
    /// removed line are dropped; the rest are renumbered. No-op at the
    /// 1×1 floor.
    pub fn shrink(&mut self, horizontal: bool) {
        if !self.grid.can_shrink(horizontal) {
            return;
        }
        let old_cols = self.grid.cols();
        self.grid.shrink(horizontal);
        let new_rows = self.grid.rows();
        let new_cols = self.grid.cols();
        self.arrows.retain(|a| {
            let (fr, fc) = (a.from / old_cols, a.from % old_cols);
            let (tr, tc) = (a.to / old_cols, a.to % old_cols);
            fr < new_rows && tr < new_rows && fc < new_cols && tc < new_cols
        });
        for arrow in &mut self.arrows {
            arrow.from = remap(arrow.from, old_cols, new_cols);
            arrow.to = remap(arrow.to, old_cols, new_cols);
        }
        self.decorations = remap_grid(
            std::mem::take(&mut self.decorations),
            old_cols,
            new_rows,
            new_cols,
        );
    }

    /// Overlay `src` onto this diagram at `(row, col)`: cells overwrite
    /// element-by-element within the overlap, and the source's arrows
    /// and decorations are translated by the offset and merged in.
    /// Translated arrows landing outside the grid are dropped.
    pub fn paste_overlay(&mut self, row: usize, col: usize, src: &Diagram) {
        self.grid.paste_overlay(row, col, src.matrix());
        let row_span = src.rows().min(self.rows().saturating_sub(row));
        let col_span = src.cols().min(self.cols().saturating_sub(col));
        for i in 0..row_span {
            for j in 0..col_span {
                let deco = src.decorations[src.grid.index(i, j)];
                let idx = self.grid.index(row + i, col + j);
                self.decorations[idx] = deco;
            }
        }
        for arrow in &src.arrows {
            let (fr, fc) = src.grid.position(arrow.from);
            let (tr, tc) = src.grid.position(arrow.to);
            let (fr, fc) = (fr + row, fc + col);
            let (tr, tc) = (tr + row, tc + col);
            if fr >= self.rows() || tr >= self.rows() || fc >= self.cols() || tc >= self.cols() {
                continue;
            }
            let mut moved = arrow.clone();
            moved.from = self.grid.index(fr, fc);
            moved.to = self.grid.index(tr, tc);
            self.arrows.push(moved);
        }
    }

    /// Extract the inclusive sub-rectangle as a new detached diagram.
    ///
    /// With `erase`, source cells are blanked and arrows/decorations
    /// fully or partially inside the rectangle move into the result;
    /// endpoints outside the rectangle are clamped to its border when
    /// rebased.
    pub fn clone_rect(
        &mut self,
        i1: usize,
        j1: usize,
        i2: usize,
        j2: usize,
        erase: bool,
    ) -> Diagram {
        let (r1, r2) = ordered_clamped(i1, i2, self.rows());
        let (c1, c2) = ordered_clamped(j1, j2, self.cols());
        let mut out = Diagram::new(r2 - r1 + 1, c2 - c1 + 1);
        out.grid = self.grid.clone_rect(r1, c1, r2, c2, erase);

        for i in r1..=r2 {
            for j in c1..=c2 {
                let idx = self.grid.index(i, j);
                let target = out.grid.index(i - r1, j - c1);
                out.decorations[target] = self.decorations[idx];
                if erase {
                    self.decorations[idx] = None;
                }
            }
        }

        let inside = |cell: usize| {
            let (r, c) = self.grid.position(cell);
            r >= r1 && r <= r2 && c >= c1 && c <= c2
        };
        let mut keep = Vec::new();
        for arrow in self.arrows.drain(..) {
            if inside(arrow.from) || inside(arrow.to) {
                let mut moved = arrow.clone();
                let (fr, fc) = self.grid.position(arrow.from);
                let (tr, tc) = self.grid.position(arrow.to);
                let rebase = |r: usize, c: usize| {
                    let r = r.clamp(r1, r2) - r1;
                    let c = c.clamp(c1, c2) - c1;
                    out.grid.index(r, c)
                };
                moved.from = rebase(fr, fc);
                moved.to = rebase(tr, tc);
                out.arrows.push(moved);
                if !erase {
                    keep.push(arrow);
                }
            } else {
                keep.push(arrow);
            }
        }
        self.arrows = keep;
        out
    }
}

/// Renumber a row-major cell index after a column-count change.
fn remap(index: usize, old_cols: usize, new_cols: usize) -> usize {
    (index / old_cols) * new_cols + index % old_cols
}

/// Rebuild a row-major decoration grid for new dimensions, keeping
/// entries that still fit.
fn remap_grid(
    old: Vec<Option<Decoration>>,
    old_cols: usize,
    new_rows: usize,
    new_cols: usize,
) -> Vec<Option<Decoration>> {
    let mut grid = vec![None; new_rows * new_cols];
    for (idx, deco) in old.into_iter().enumerate() {
        if deco.is_none() {
            continue;
        }
        let (r, c) = (idx / old_cols, idx % old_cols);
        if r < new_rows && c < new_cols {
            grid[r * new_cols + c] = deco;
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_arrows_by_ordinal() {
        let mut d = Diagram::new(2, 2);
        let mut second = Arrow::new(0, 3);
        second.multiplicity = 2;
        assert!(d.add_arrow(Arrow::new(0, 3)));
        assert!(d.add_arrow(second));
        assert_eq!(d.find_arrow(0, 3, 1).unwrap().multiplicity, 2);
        let removed = d.remove_arrow(0, 3, 0).unwrap();
        assert_eq!(removed.multiplicity, 1);
        assert_eq!(d.find_arrow(0, 3, 0).unwrap().multiplicity, 2);
    }

    #[test]
    fn test_add_arrow_rejects_out_of_bounds() {
        let mut d = Diagram::new(2, 2);
        assert!(!d.add_arrow(Arrow::new(0, 4)));
        assert!(d.arrows().is_empty());
    }

    #[test]
    fn test_shrink_drops_dangling_arrows() {
        let mut d = Diagram::new(2, 3);
        // 0 1 2
        // 3 4 5
        assert!(d.add_arrow(Arrow::new(0, 2))); // ends in last column
        assert!(d.add_arrow(Arrow::new(0, 4))); // survives
        d.shrink(true);
        assert_eq!(d.cols(), 2);
        assert_eq!(d.arrows().len(), 1);
        // (1,1) renumbered from 4 to 3
        assert_eq!(d.arrows()[0].to, 3);
    }

    #[test]
    fn test_extend_renumbers_arrows() {
        let mut d = Diagram::new(2, 2);
        assert!(d.add_arrow(Arrow::new(1, 2))); // (0,1) -> (1,0)
        d.set_decoration(1, 0, Some(Decoration::default()));
        d.extend(true);
        assert_eq!(d.cols(), 3);
        assert_eq!(d.arrows()[0].from, 1);
        assert_eq!(d.arrows()[0].to, 3);
        assert!(d.decoration(1, 0).is_some());
    }

    #[test]
    fn test_clone_rect_moves_arrows_on_erase() {
        let mut d = Diagram::new(3, 3);
        assert!(d.add_arrow(Arrow::new(0, 4))); // inside 2x2 rect
        assert!(d.add_arrow(Arrow::new(8, 8))); // outside
        let sub = d.clone_rect(0, 0, 1, 1, true);
        assert_eq!(sub.arrows().len(), 1);
        assert_eq!(sub.arrows()[0].from, 0);
        assert_eq!(sub.arrows()[0].to, 3); // (1,1) in the 2x2 result
        assert_eq!(d.arrows().len(), 1);
        assert_eq!(d.arrows()[0].from, 8);
    }

    #[test]
    fn test_paste_overlay_translates_arrows() {
        let mut dest = Diagram::new(3, 3);
        let mut src = Diagram::new(2, 2);
        assert!(src.add_arrow(Arrow::new(0, 3)));
        src.set_decoration(0, 0, Some(Decoration::default()));
        dest.paste_overlay(1, 1, &src);
        assert_eq!(dest.arrows().len(), 1);
        assert_eq!(dest.arrows()[0].from, dest.matrix().index(1, 1));
        assert_eq!(dest.arrows()[0].to, dest.matrix().index(2, 2));
        assert!(dest.decoration(1, 1).is_some());
    }
}
