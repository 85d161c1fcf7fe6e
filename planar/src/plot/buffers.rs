//! Combined vertex and index buffers for a whole scene
use super::{Equation, Geometry};
use crate::{Error, mesh::check_index_range};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Number of `f32` values per vertex: position, then color
pub const VERTEX_STRIDE: usize = 6;

/// A free-standing point drawn alongside the equations
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Position in render coordinates `(x, height, y)`
    pub position: [f32; 3],
    /// Color, as linear RGB in `[0, 1]`
    pub color: [f32; 3],
}

/// Span of the combined buffers belonging to one equation
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Range of vertices (not `f32` values) in [`RenderBuffers::vertices`]
    pub vertices: Range<usize>,
    /// Range of indices in [`RenderBuffers::indices`]; empty for point clouds
    pub indices: Range<usize>,
    /// Opacity of the owning equation
    pub opacity: f32,
}

/// Interleaved vertex buffer and triangle index buffer for a whole scene
///
/// Each vertex is [`VERTEX_STRIDE`] `f32` values, `[x, y, z, r, g, b]`.
/// Indices refer to whole vertices in the combined buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderBuffers {
    /// Interleaved vertex data
    pub vertices: Vec<f32>,
    /// Triangle indices, three per triangle
    pub indices: Vec<u32>,
    /// One batch per visible equation, in input order
    pub batches: Vec<Batch>,
    /// Range of vertices holding markers, after every batch
    pub markers: Range<usize>,
}

impl RenderBuffers {
    /// Assembles buffers from built equations and markers
    ///
    /// Hidden equations are skipped entirely.  Meshed geometry contributes
    /// every vertex (so its triangles stay valid) with indices offset by the
    /// number of vertices before it; other geometry contributes only its
    /// finite points.
    pub fn build<'a, I>(plots: I, markers: &[Marker]) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (&'a Equation, &'a Geometry)>,
    {
        let mut out = Self::default();
        for (eq, geom) in plots {
            if !eq.visible {
                continue;
            }
            let start = out.vertex_count();
            let index_start = out.indices.len();
            if geom.is_meshed() {
                let end = start + geom.mesh.vertices.len();
                check_index_range(end)?;
                for v in &geom.mesh.vertices {
                    out.push(v, &eq.color);
                }
                // Checked against u32::MAX above
                let offset = start as u32;
                out.indices.extend(geom.mesh.indices().map(|i| i + offset));
            } else {
                for v in geom.finite_points() {
                    out.push(v, &eq.color);
                }
            }
            out.batches.push(Batch {
                vertices: start..out.vertex_count(),
                indices: index_start..out.indices.len(),
                opacity: eq.opacity,
            });
        }

        let start = out.vertex_count();
        for m in markers {
            out.push(&Vector3::from(m.position), &m.color);
        }
        out.markers = start..out.vertex_count();
        log::debug!(
            "assembled {} vertices and {} indices from {} batches",
            out.vertex_count(),
            out.indices.len(),
            out.batches.len()
        );
        Ok(out)
    }

    /// Returns the number of vertices (not `f32` values)
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    fn push(&mut self, pos: &Vector3<f32>, color: &[f32; 3]) {
        self.vertices.extend(pos.iter());
        self.vertices.extend(color);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mesh::Mesh,
        plot::{Layout, Refinement},
        sample::Domain,
    };

    fn grid(rows: usize, cols: usize, nan: &[usize], mesh: bool) -> Geometry {
        let vertices = (0..rows * cols)
            .map(|i| {
                let h = if nan.contains(&i) { f32::NAN } else { i as f32 };
                Vector3::new((i % cols) as f32, h, (i / cols) as f32)
            })
            .collect();
        let mesh = if mesh {
            Mesh::from_grid(vertices, rows, cols, None).unwrap()
        } else {
            Mesh {
                vertices,
                triangles: vec![],
            }
        };
        Geometry::new(mesh, Layout::Grid { rows, cols })
    }

    #[test]
    fn test_offsets_skip_hidden() {
        let shown = Equation {
            color: [0.0, 0.0, 1.0],
            ..Default::default()
        };
        let hidden = Equation {
            visible: false,
            ..Default::default()
        };
        let a = grid(2, 2, &[], true);
        let b = grid(3, 3, &[], false);
        let c = grid(2, 3, &[5], true);
        let markers = [Marker {
            position: [1.0, 2.0, 3.0],
            color: [1.0, 1.0, 1.0],
        }];

        let out = RenderBuffers::build(
            [(&shown, &a), (&hidden, &b), (&shown, &c)],
            &markers,
        )
        .unwrap();

        assert_eq!(out.batches.len(), 2);
        assert_eq!(out.batches[0].vertices, 0..4);
        assert_eq!(out.batches[1].vertices, 4..10);
        assert_eq!(out.markers, 10..11);
        assert_eq!(out.vertices.len(), 11 * VERTEX_STRIDE);

        // The second mesh is offset by the first mesh only
        assert_eq!(&out.indices[..6], &[0, 1, 2, 1, 3, 2]);
        assert_eq!(&out.indices[6..], &[4, 5, 7, 5, 8, 7]);
        assert_eq!(out.batches[1].indices, 6..12);

        assert_eq!(&out.vertices[..6], &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(&out.vertices[60..], &[1.0, 2.0, 3.0, 1.0, 1.0, 1.0]);

        // Every index points at a defined vertex
        for &i in &out.indices {
            let y = out.vertices[i as usize * VERTEX_STRIDE + 1];
            assert!(!y.is_nan());
        }
    }

    #[test]
    fn test_point_cloud_drops_holes() {
        let eq = Equation::default();
        let g = grid(3, 3, &[0, 4], false);
        let out = RenderBuffers::build([(&eq, &g)], &[]).unwrap();
        assert_eq!(out.vertex_count(), 7);
        assert!(out.indices.is_empty());
        assert_eq!(out.batches[0].indices, 0..0);
        assert!(out.vertices.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_built_equations() {
        let surface = Equation {
            expr: "x*y".to_owned(),
            samples: 8,
            is_mesh: true,
            x: Domain::new(0.0, 1.0).unwrap(),
            y: Domain::new(0.0, 1.0).unwrap(),
            opacity: 0.5,
            ..Default::default()
        };
        let curve = Equation {
            expr: "x".to_owned(),
            samples: 8,
            is_3d: false,
            ..Default::default()
        };
        let refine = Refinement::default();
        let gs = surface.build(&refine, None).unwrap();
        let gc = curve.build(&refine, None).unwrap();

        let plots = [(&curve, &gc), (&surface, &gs)];
        let out = RenderBuffers::build(plots, &[]).unwrap();
        let n = gc.mesh.vertices.len();
        assert_eq!(out.batches[0].vertices, 0..n);
        assert_eq!(out.batches[1].opacity, 0.5);
        assert_eq!(out.indices.len(), gs.mesh.triangles.len() * 3);
        assert!(out.indices.iter().all(|&i| i as usize >= n));
        assert!(out.markers.is_empty());
    }
}
