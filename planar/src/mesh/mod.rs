//! Triangle meshes over sampled grids
//!
//! A surface is sampled on a `rows × cols` grid of vertices, stored in
//! row-major order (rows run along Y, columns along X).  Each grid cell is
//! split into two triangles, unless any of its corners has an undefined
//! (`NaN`) height, in which case the whole cell is left out.
use crate::{Error, sample::ThreadPool};
use nalgebra::Vector3;
use rayon::prelude::*;

mod output;

/// An indexed 3D mesh
///
/// Vertices are stored as `(x, height, y)`, matching a Y-up renderer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// Triangles, as indexes into [`self.vertices`](Self::vertices)
    pub triangles: Vec<Vector3<u32>>,
    /// Vertex positions
    pub vertices: Vec<Vector3<f32>>,
}

impl Mesh {
    /// Builds a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mesh from a row-major grid of vertices
    ///
    /// Returns an error if the grid's dimensions don't match the vertex count,
    /// or if the vertices can't be indexed with `u32`.
    pub fn from_grid(
        vertices: Vec<Vector3<f32>>,
        rows: usize,
        cols: usize,
        threads: Option<&ThreadPool>,
    ) -> Result<Self, Error> {
        let triangles = grid_triangles(&vertices, rows, cols, threads)?;
        Ok(Self {
            triangles,
            vertices,
        })
    }

    /// Returns triangle indexes as a flat list, three per triangle
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.triangles.iter().flat_map(|t| [t.x, t.y, t.z])
    }
}

/// Checks that every vertex in a buffer of the given size can be indexed
pub(crate) fn check_index_range(len: usize) -> Result<(), Error> {
    if len > u32::MAX as usize {
        Err(Error::MeshTooLarge(len))
    } else {
        Ok(())
    }
}

/// Emits two triangles per grid cell, skipping cells with a `NaN` corner
///
/// For the cell at `(row, col)`, corners are numbered as
/// ```text
///   i2 ---- i3      row + 1
///   |  \     |
///   |    \   |
///   i0 ---- i1      row
///  col    col + 1
/// ```
/// and the triangles are `(i0, i1, i2)` and `(i1, i3, i2)`, in that order.
///
/// Triangles are emitted in row-major cell order regardless of threading.
pub fn grid_triangles(
    vertices: &[Vector3<f32>],
    rows: usize,
    cols: usize,
    threads: Option<&ThreadPool>,
) -> Result<Vec<Vector3<u32>>, Error> {
    if rows.checked_mul(cols) != Some(vertices.len()) {
        return Err(Error::BadGrid {
            rows,
            cols,
            len: vertices.len(),
        });
    }
    check_index_range(vertices.len())?;
    if rows < 2 || cols < 2 {
        return Ok(vec![]);
    }

    let row = |row: usize| {
        let mut out = vec![];
        let hole = |i: usize| vertices[i].y.is_nan();
        for col in 0..cols - 1 {
            let i0 = row * cols + col;
            let i1 = i0 + 1;
            let i2 = i0 + cols;
            let i3 = i2 + 1;
            if [i0, i1, i2, i3].into_iter().any(hole) {
                continue;
            }
            // Checked against u32::MAX above
            let [i0, i1, i2, i3] = [i0, i1, i2, i3].map(|i| i as u32);
            out.push(Vector3::new(i0, i1, i2));
            out.push(Vector3::new(i1, i3, i2));
        }
        out
    };

    let n = rows - 1;
    let triangles: Vec<Vec<Vector3<u32>>> = match threads {
        Some(pool) => pool.run(|| (0..n).into_par_iter().map(row).collect()),
        None => (0..n).map(row).collect(),
    };
    Ok(triangles.into_iter().flatten().collect())
}
