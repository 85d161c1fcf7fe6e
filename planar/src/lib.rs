//! Planar is a library for sampling and meshing explicit plots, i.e. curves
//! `h = f(x)` and height-field surfaces `h = f(x, y)`, written as plain-text
//! math expressions.
//!
//! The rest of this page is a quick tour through the library APIs.
//!
//! # Expressions
//! An expression is written in the usual infix notation, using the free
//! variables `x`, `y`, and `z`, the operators `+ - * / ^`, and the functions
//! `sin`, `cos`, `tan`, and `log`.  Before evaluation, it's compiled into a
//! postfix [`Program`](crate::expr::Program) by
//! [`expr::compile`](crate::expr::compile):
//!
//! ```
//! use planar::expr::compile;
//!
//! let program = compile("x * sin(y) - 1")?;
//! assert_eq!(program.to_string(), "x y sin * 1 -");
//! # Ok::<(), planar::Error>(())
//! ```
//!
//! Structural problems (unbalanced parentheses, unknown identifiers) are
//! reported here, as a [`ParseError`].
//!
//! # Evaluation
//! A [`Program`](crate::expr::Program) is evaluated by an
//! [`Evaluator`](crate::eval::Evaluator), given values for its variables in a
//! [`Vars`](crate::var::Vars) context.  An evaluator carries no persistent
//! data except its scratch stack, and is typically built once per thread:
//!
//! ```
//! use planar::{eval::Evaluator, expr::compile, var::Vars};
//!
//! let program = compile("x^2 + y")?;
//! let mut eval = Evaluator::new();
//! for x in 0..4 {
//!     let v = eval.eval(&program, &Vars::xy(x as f64, 1.0))?;
//!     assert_eq!(v, (x * x + 1) as f64);
//! }
//! # Ok::<(), planar::Error>(())
//! ```
//!
//! Evaluation is strict, returning an [`EvalError`] for division by zero,
//! out-of-domain function arguments, and so on.  The sampling pipeline maps
//! these errors to `NaN`, so undefined regions become holes in the plot.
//!
//! # Sampling
//! Plots are sampled adaptively: the domain is divided into uniform intervals,
//! which are then recursively split wherever the function is steep.  The
//! sampler works on any [`SampleFn`](crate::sample::SampleFn), including
//! plain closures:
//!
//! ```
//! use planar::sample::{Domain, SampleSettings, adaptive_samples};
//!
//! let settings = SampleSettings {
//!     base_samples: 11,
//!     max_depth: 6,
//!     threshold: 5.0,
//! };
//! let domain = Domain::new(-1.0, 1.0)?;
//! let samples = adaptive_samples(&|x: f64| 1.0 / x, domain, &settings, None)?;
//! assert!(samples.len() > 11);
//! # Ok::<(), planar::Error>(())
//! ```
//!
//! Sampling (and grid evaluation) can be spread across a Rayon thread pool by
//! passing a [`ThreadPool`](crate::sample::ThreadPool); the results are
//! identical to a single-threaded run.
//!
//! # Plotting
//! The [`plot`] module ties everything together: an
//! [`Equation`](crate::plot::Equation) is compiled, sampled along each axis,
//! evaluated on the resulting grid, and optionally
//! [meshed](crate::mesh::Mesh):
//!
//! ```
//! use planar::plot::{Equation, Refinement};
//!
//! let eq = Equation {
//!     expr: "sin(x) * cos(y)".to_owned(),
//!     samples: 50,
//!     is_mesh: true,
//!     ..Default::default()
//! };
//! let geom = eq.build(&Refinement::default(), None)?;
//! assert!(!geom.mesh.triangles.is_empty());
//!
//! let mut stl = vec![];
//! geom.mesh.write_stl(&mut stl)?;
//! # Ok::<(), planar::Error>(())
//! ```
//!
//! Several built equations can be combined into a single interleaved vertex
//! buffer and index buffer with
//! [`RenderBuffers`](crate::plot::RenderBuffers).
#![warn(missing_docs)]

pub mod eval;
pub mod expr;
pub mod mesh;
pub mod plot;
pub mod sample;
pub mod var;

mod error;
pub use error::{Error, EvalError, ParseError};
