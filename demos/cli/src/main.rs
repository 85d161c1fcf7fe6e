use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use planar::{
    eval::{Expression, eval_substituted, substitute},
    plot::{Equation, Geometry, Layout, Refinement},
    sample::{Domain, ThreadPool},
    var::{Var, Vars},
};

/// Expression plotting tool
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluates an expression at a single point
    Eval {
        /// Expression text
        expr: String,

        /// Value of `x`
        #[clap(short, allow_negative_numbers = true)]
        x: Option<f64>,

        /// Value of `y`
        #[clap(short, allow_negative_numbers = true)]
        y: Option<f64>,

        /// Value of `z`
        #[clap(short, allow_negative_numbers = true)]
        z: Option<f64>,

        /// Substitute values into the text before compiling
        #[clap(long)]
        substitute: bool,
    },

    /// Samples a curve `h = f(x)`
    Curve {
        /// Expression text
        expr: String,

        #[clap(flatten)]
        settings: PlotSettings,
    },

    /// Samples a surface `h = f(x, y)`, optionally writing a mesh
    Surface {
        /// Expression text
        expr: String,

        #[clap(flatten)]
        settings: PlotSettings,

        /// Name of a `.stl` file to write
        #[clap(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Parser)]
struct PlotSettings {
    /// Number of base samples along each axis
    #[clap(short, long, default_value_t = 200)]
    samples: usize,

    /// Maximum subdivision depth
    #[clap(short, long, default_value_t = Refinement::default().max_depth)]
    depth: u8,

    /// Slope above which intervals are subdivided
    #[clap(long, default_value_t = Refinement::default().threshold)]
    threshold: f64,

    /// Lower bound along X
    #[clap(long, default_value_t = -25.0, allow_negative_numbers = true)]
    x_min: f64,

    /// Upper bound along X
    #[clap(long, default_value_t = 25.0, allow_negative_numbers = true)]
    x_max: f64,

    /// Lower bound along Y
    #[clap(long, default_value_t = -25.0, allow_negative_numbers = true)]
    y_min: f64,

    /// Upper bound along Y
    #[clap(long, default_value_t = 25.0, allow_negative_numbers = true)]
    y_max: f64,

    /// Number of threads to use
    #[clap(short, long)]
    threads: Option<NonZeroUsize>,

    /// Number of times to build (for benchmarking)
    #[clap(short = 'N', default_value_t = 1)]
    n: usize,
}

////////////////////////////////////////////////////////////////////////////////

fn run_plot(
    expr: String,
    settings: &PlotSettings,
    is_3d: bool,
    is_mesh: bool,
) -> Result<Geometry> {
    let eq = Equation {
        expr,
        samples: settings.samples,
        x: Domain::new(settings.x_min, settings.x_max)?,
        y: Domain::new(settings.y_min, settings.y_max)?,
        is_3d,
        is_mesh,
        ..Default::default()
    };
    let refine = Refinement {
        max_depth: settings.depth,
        threshold: settings.threshold,
    };

    let pool = match settings.threads {
        Some(n) if n.get() == 1 => None,
        Some(n) => Some(ThreadPool::Custom(
            rayon::ThreadPoolBuilder::new()
                .num_threads(n.get())
                .build()?,
        )),
        None => Some(ThreadPool::Global),
    };
    let threads = pool.as_ref();

    let start = Instant::now();
    let mut geom = eq.build(&refine, threads)?;
    for _ in 1..settings.n {
        geom = eq.build(&refine, threads)?;
    }
    info!(
        "Built {}x on {} thread(s) at {:?} ms/iter",
        settings.n,
        ThreadPool::count(threads),
        start.elapsed().as_micros() as f64 / 1000.0 / (settings.n as f64)
    );
    Ok(geom)
}

fn report(geom: &Geometry) {
    match geom.layout {
        Layout::Curve => info!("{} curve points", geom.mesh.vertices.len()),
        Layout::Grid { rows, cols } => info!(
            "{rows} × {cols} grid, {} finite points, {} triangles",
            geom.finite_points().count(),
            geom.mesh.triangles.len()
        ),
    }
    match geom.height_range {
        Some([lo, hi]) => info!("height range is [{lo}, {hi}]"),
        None => info!("no finite heights"),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();
    match args.cmd {
        Command::Eval {
            expr,
            x,
            y,
            z,
            substitute: textual,
        } => {
            let mut vars = Vars::new();
            for (var, value) in [(Var::X, x), (Var::Y, y), (Var::Z, z)] {
                if let Some(value) = value {
                    vars.set(var, value);
                }
            }
            let v = if textual {
                info!("Substituted: {}", substitute(&expr, &vars));
                eval_substituted(&expr, &vars)?
            } else {
                let start = Instant::now();
                let e = Expression::new(&expr)?;
                info!(
                    "Compiled `{}` to `{}` in {:?}",
                    e.text(),
                    e.program(),
                    start.elapsed()
                );
                e.eval(&vars)?
            };
            println!("{v}");
        }
        Command::Curve { expr, settings } => {
            let geom = run_plot(expr, &settings, false, false)?;
            report(&geom);
        }
        Command::Surface {
            expr,
            settings,
            out,
        } => {
            let geom = run_plot(expr, &settings, true, out.is_some())?;
            report(&geom);
            if let Some(out) = out {
                info!("Writing STL to {out:?}");
                let mut file = std::fs::File::create(out)?;
                geom.mesh.write_stl(&mut file)?;
            }
        }
    }
    Ok(())
}
