//! Equation plotting pipeline
//!
//! An [`Equation`] holds everything needed to turn expression text into
//! renderable [`Geometry`]: the domains to sample, the base sample count, and
//! how the result should be shown.  [`Equation::build`] runs the whole pipeline
//! (compile, adaptive sampling, grid evaluation, and optional meshing) and is
//! authoritative: each call rebuilds the geometry from scratch.
//!
//! ```
//! use planar::plot::{Equation, Layout, Refinement};
//!
//! let eq = Equation {
//!     expr: "x^2 + y^2".to_owned(),
//!     samples: 16,
//!     is_mesh: true,
//!     ..Default::default()
//! };
//! let geom = eq.build(&Refinement::default(), None)?;
//! let Layout::Grid { rows, cols } = geom.layout else { unreachable!() };
//! assert_eq!(geom.mesh.vertices.len(), rows * cols);
//! assert_eq!(geom.mesh.triangles.len(), 2 * (rows - 1) * (cols - 1));
//! # Ok::<(), planar::Error>(())
//! ```
mod buffers;

pub use buffers::{Batch, Marker, RenderBuffers, VERTEX_STRIDE};

use crate::{
    Error,
    eval::{Evaluator, Expression},
    mesh::Mesh,
    sample::{Domain, SampleFn, SampleSettings, ThreadPool, adaptive_samples},
    var::{Var, Vars},
};
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for a single plotted equation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equation {
    /// Expression text, in terms of `x` (and `y` for surfaces)
    pub expr: String,
    /// Vertex color, as linear RGB in `[0, 1]`
    pub color: [f32; 3],
    /// Number of base samples along each axis
    pub samples: usize,
    /// Domain along the X axis
    pub x: Domain,
    /// Domain along the Y axis (ignored for curves)
    pub y: Domain,
    /// Whether the equation contributes to [`RenderBuffers`]
    pub visible: bool,
    /// Plot as a surface `h(x, y)` rather than a curve `h(x)`
    pub is_3d: bool,
    /// Build a triangle mesh over the surface grid
    pub is_mesh: bool,
    /// Opacity used when drawing
    pub opacity: f32,
}

impl Default for Equation {
    fn default() -> Self {
        Self {
            expr: String::new(),
            color: [1.0, 0.5, 0.2],
            samples: 1000,
            x: Domain::default(),
            y: Domain::default(),
            visible: true,
            is_3d: true,
            is_mesh: false,
            opacity: 1.0,
        }
    }
}

/// Refinement parameters shared by every equation in a scene
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    /// Maximum subdivision depth per base interval
    pub max_depth: u8,
    /// Slope magnitude above which an interval is split
    pub threshold: f64,
}

impl Default for Refinement {
    fn default() -> Self {
        let s = SampleSettings::default();
        Self {
            max_depth: s.max_depth,
            threshold: s.threshold,
        }
    }
}

/// Arrangement of the vertices in a [`Geometry`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Finite points along a curve, in ascending `x` order
    Curve,
    /// Row-major `rows × cols` grid, with rows along Y and columns along X
    Grid {
        /// Number of Y samples
        rows: usize,
        /// Number of X samples
        cols: usize,
    },
}

/// Sampled geometry for one equation
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    /// Vertices as `(x, height, y)`, plus triangles if meshing was requested
    ///
    /// Grid vertices with an undefined height are kept (as `NaN`) so that
    /// triangle indices line up with grid positions.
    pub mesh: Mesh,
    /// How the vertices are arranged
    pub layout: Layout,
    /// Smallest and largest finite height, or `None` if there are none
    pub height_range: Option<[f32; 2]>,
}

impl Geometry {
    /// Iterates over vertices with a defined height
    pub fn finite_points(&self) -> impl Iterator<Item = &Vector3<f32>> + '_ {
        self.mesh.vertices.iter().filter(|v| !v.y.is_nan())
    }

    /// Checks whether this geometry carries a triangle mesh
    ///
    /// Meshed geometry must be drawn with every vertex, including undefined
    /// ones, so that triangle indices remain valid.
    pub fn is_meshed(&self) -> bool {
        !self.mesh.triangles.is_empty()
    }

    fn new(mesh: Mesh, layout: Layout) -> Self {
        let height_range = mesh
            .vertices
            .iter()
            .map(|v| v.y)
            .filter(|h| !h.is_nan())
            .fold(None, |acc: Option<[f32; 2]>, h| {
                Some(match acc {
                    Some([lo, hi]) => [lo.min(h), hi.max(h)],
                    None => [h, h],
                })
            });
        Self {
            mesh,
            layout,
            height_range,
        }
    }
}

impl Equation {
    /// Returns the per-axis sample settings for this equation
    pub fn settings(&self, refine: &Refinement) -> SampleSettings {
        SampleSettings {
            base_samples: self.samples,
            max_depth: refine.max_depth,
            threshold: refine.threshold,
        }
    }

    /// Compiles and samples this equation
    ///
    /// Parse errors and invalid settings are returned before any sampling
    /// starts; points which fail to evaluate become holes in the output.
    /// Surfaces bind `z` to 0; curves bind both `y` and `z` to 0.
    pub fn build(
        &self,
        refine: &Refinement,
        threads: Option<&ThreadPool>,
    ) -> Result<Geometry, Error> {
        let expr = Expression::new(&self.expr)?;
        let settings = self.settings(refine);
        settings.validate()?;

        let program = expr.program();
        if self.is_3d && !program.uses(Var::Y) {
            log::debug!("surface '{}' does not depend on y", self.expr);
        }
        if program.uses(Var::Z) || (!self.is_3d && program.uses(Var::Y)) {
            log::debug!("'{}' reads a variable bound to 0", self.expr);
        }

        let start = std::time::Instant::now();
        let geom = if self.is_3d {
            self.build_surface(&expr, &settings, threads)?
        } else {
            self.build_curve(&expr, &settings, threads)?
        };
        if geom.height_range.is_none() {
            log::warn!("'{}' has no finite points", self.expr);
        }
        log::debug!(
            "built '{}' ({} vertices, {} triangles) in {:?} on {} thread(s)",
            self.expr,
            geom.mesh.vertices.len(),
            geom.mesh.triangles.len(),
            start.elapsed(),
            ThreadPool::count(threads)
        );
        Ok(geom)
    }

    fn build_curve(
        &self,
        expr: &Expression,
        settings: &SampleSettings,
        threads: Option<&ThreadPool>,
    ) -> Result<Geometry, Error> {
        let fixed = Vars::new().with(Var::Y, 0.0).with(Var::Z, 0.0);
        let slice = expr.slice(Var::X, fixed);
        let xs = adaptive_samples(&slice, self.x, settings, threads)?;
        let heights = eval_all(&slice, &xs, threads);
        let vertices = xs
            .iter()
            .zip(heights)
            .map(|(&x, h)| Vector3::new(x as f32, h as f32, 0.0))
            .filter(|v| v.y.is_finite())
            .collect();
        let mesh = Mesh {
            vertices,
            triangles: vec![],
        };
        Ok(Geometry::new(mesh, Layout::Curve))
    }

    fn build_surface(
        &self,
        expr: &Expression,
        settings: &SampleSettings,
        threads: Option<&ThreadPool>,
    ) -> Result<Geometry, Error> {
        // Each axis is refined along the edge of the domain
        let along_x = expr.slice(
            Var::X,
            Vars::new().with(Var::Y, self.y.min()).with(Var::Z, 0.0),
        );
        let along_y = expr.slice(
            Var::Y,
            Vars::new().with(Var::X, self.x.min()).with(Var::Z, 0.0),
        );
        let xs = adaptive_samples(&along_x, self.x, settings, threads)?;
        let ys = adaptive_samples(&along_y, self.y, settings, threads)?;

        let (rows, cols) = (ys.len(), xs.len());
        let n = rows
            .checked_mul(cols)
            .ok_or(Error::MeshTooLarge(usize::MAX))?;
        let mut vertices = vec![Vector3::zeros(); n];

        let program = expr.program();
        let fill_row =
            |eval: &mut Evaluator, (r, row): (usize, &mut [Vector3<f32>])| {
                let y = ys[r];
                for (v, &x) in row.iter_mut().zip(xs.iter()) {
                    let vars = Vars::xyz(x, y, 0.0);
                    let h = eval.eval_or_nan(program, &vars) as f32;
                    let h = if h.is_finite() { h } else { f32::NAN };
                    *v = Vector3::new(x as f32, h, y as f32);
                }
            };
        match threads {
            Some(pool) => pool.run(|| {
                vertices
                    .par_chunks_mut(cols)
                    .enumerate()
                    .for_each_init(Evaluator::new, fill_row)
            }),
            None => {
                let mut eval = Evaluator::new();
                vertices
                    .chunks_mut(cols)
                    .enumerate()
                    .for_each(|r| fill_row(&mut eval, r))
            }
        }

        let mesh = if self.is_mesh {
            Mesh::from_grid(vertices, rows, cols, threads)?
        } else {
            Mesh {
                vertices,
                triangles: vec![],
            }
        };
        Ok(Geometry::new(mesh, Layout::Grid { rows, cols }))
    }
}

/// Evaluates a function at each of the given points, in order
fn eval_all<F: SampleFn>(
    f: &F,
    ts: &[f64],
    threads: Option<&ThreadPool>,
) -> Vec<f64> {
    match threads {
        Some(pool) => pool.run(|| {
            ts.par_iter()
                .map_init(F::Data::default, |data, &t| f.eval(t, data))
                .collect()
        }),
        None => {
            let mut data = F::Data::default();
            ts.iter().map(|&t| f.eval(t, &mut data)).collect()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ParseError;

    fn equation(expr: &str) -> Equation {
        Equation {
            expr: expr.to_owned(),
            samples: 21,
            x: Domain::new(-2.0, 2.0).unwrap(),
            y: Domain::new(-1.0, 1.0).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let eq = Equation::default();
        assert_eq!(eq.color, [1.0, 0.5, 0.2]);
        assert_eq!(eq.samples, 1000);
        assert_eq!(eq.x.min(), -25.0);
        assert_eq!(eq.y.max(), 25.0);
        assert!(eq.visible && eq.is_3d && !eq.is_mesh);
        assert_eq!(
            eq.settings(&Refinement::default()),
            SampleSettings::default()
        );
    }

    #[test]
    fn test_curve() {
        let eq = Equation {
            is_3d: false,
            ..equation("x*y + 1/x")
        };
        let geom = eq.build(&Refinement::default(), None).unwrap();
        assert_eq!(geom.layout, Layout::Curve);
        assert!(geom.mesh.triangles.is_empty());

        // y is bound to 0 and the pole at x = 0 is dropped
        assert!(!geom.mesh.vertices.is_empty());
        for v in &geom.mesh.vertices {
            assert!(v.y.is_finite());
            assert_eq!(v.z, 0.0);
            approx::assert_relative_eq!(v.y, 1.0 / v.x, max_relative = 1e-5);
        }
        assert!(geom.mesh.vertices.windows(2).all(|w| w[0].x < w[1].x));
        assert!(geom.mesh.vertices.iter().all(|v| v.x != 0.0));
    }

    #[test]
    fn test_surface_grid() {
        let geom = equation("x + 2*y")
            .build(&Refinement::default(), None)
            .unwrap();
        let Layout::Grid { rows, cols } = geom.layout else {
            panic!("expected a grid");
        };
        // Linear functions with a small slope stay at the base resolution
        assert_eq!((rows, cols), (21, 21));
        assert_eq!(geom.mesh.vertices.len(), rows * cols);
        assert!(geom.mesh.triangles.is_empty());

        // Row-major, rows along Y
        let v = geom.mesh.vertices[cols + 2];
        approx::assert_relative_eq!(v.x, -1.6, epsilon = 1e-6);
        approx::assert_relative_eq!(v.z, -0.9, epsilon = 1e-6);
        approx::assert_relative_eq!(v.y, -1.6 + 2.0 * -0.9, epsilon = 1e-5);
        assert_eq!(geom.height_range, Some([-4.0, 4.0]));
    }

    #[test]
    fn test_surface_holes() {
        let eq = Equation {
            is_mesh: true,
            ..equation("log(x)")
        };
        let geom = eq.build(&Refinement::default(), None).unwrap();
        assert!(geom.is_meshed());
        assert!(geom.mesh.vertices.iter().any(|v| v.y.is_nan()));
        for t in &geom.mesh.triangles {
            for &i in t.iter() {
                let v = geom.mesh.vertices[i as usize];
                assert!(v.y.is_finite());
                assert!(v.x > 0.0);
            }
        }
        assert!(geom.finite_points().all(|v| v.x > 0.0));
    }

    #[test]
    fn test_no_finite_points() {
        let geom = equation("log(-1)")
            .build(&Refinement::default(), None)
            .unwrap();
        assert_eq!(geom.height_range, None);
        assert_eq!(geom.finite_points().count(), 0);
    }

    #[test]
    fn test_threaded_matches_serial() {
        let eq = Equation {
            is_mesh: true,
            samples: 40,
            ..equation("tan(x*y*3)")
        };
        let refine = Refinement::default();
        let a = eq.build(&refine, None).unwrap();
        let b = eq.build(&refine, Some(&ThreadPool::Global)).unwrap();
        assert_eq!(a.layout, b.layout);
        assert_eq!(a.mesh.triangles, b.mesh.triangles);
        let bits = |m: &Mesh| {
            m.vertices
                .iter()
                .flat_map(|v| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>())
                .collect::<Vec<u32>>()
        };
        assert_eq!(bits(&a.mesh), bits(&b.mesh));
    }

    #[test]
    fn test_serde() {
        let eq = Equation {
            expr: "sin(x)".to_owned(),
            opacity: 0.25,
            ..equation("x")
        };
        let bytes = bincode::serialize(&eq).unwrap();
        let out: Equation = bincode::deserialize(&bytes).unwrap();
        assert_eq!(eq, out);

        // Domains are validated when deserialized
        let bytes = bincode::serialize(&[1.0f64, -1.0]).unwrap();
        assert!(bincode::deserialize::<Domain>(&bytes).is_err());
    }

    #[test]
    fn test_errors_before_sampling() {
        assert!(matches!(
            equation("x + (").build(&Refinement::default(), None),
            Err(Error::Parse(ParseError::UnmatchedOpen))
        ));
        let eq = Equation {
            samples: 1,
            ..equation("x")
        };
        assert!(matches!(
            eq.build(&Refinement::default(), None),
            Err(Error::BadSampleCount(1))
        ));
        let refine = Refinement {
            max_depth: 30,
            ..Default::default()
        };
        assert!(matches!(
            equation("x").build(&refine, None),
            Err(Error::BadDepth(30))
        ));
    }
}
