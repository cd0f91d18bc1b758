use std::path::PathBuf;
use std::time::{Duration, Instant};

use amg_interp::matrix::error::MatrixError;
use amg_interp::matrix::mtx::load_matrix_market_csc_file;
use amg_interp::{CscBuilder, CscMatrix, Error, Interpolation, SkeletonConfig, StopRule, interp_skel};
use clap::Parser;

/// Compute the interpolation-operator support of a MatrixMarket operator.
#[derive(Parser, Debug)]
struct Args {
    /// fine-grid operator A (.mtx, square, SPD)
    a: PathBuf,

    /// target matrix B (.mtx); identity when omitted
    b: Option<PathBuf>,

    /// tolerance controlling skeleton size
    #[arg(long, default_value_t = 1e-4)]
    tol: f64,

    /// stopping rule: max | sum
    #[arg(long, default_value = "sum")]
    stop: String,
}

fn fmt_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs >= 1.0 {
        format!("{secs:.3}s")
    } else if secs >= 1e-3 {
        format!("{:.3}ms", secs * 1e3)
    } else if secs >= 1e-6 {
        format!("{:.3}us", secs * 1e6)
    } else {
        format!("{}ns", d.as_nanos())
    }
}

fn identity(n: usize) -> Result<CscMatrix, MatrixError> {
    let mut b = CscBuilder::new(n, n);
    for j in 0..n {
        b.push(j, j, 1.0)?;
    }
    Ok(b.build()?)
}

struct Run {
    a: CscMatrix,
    b: CscMatrix,
    out: Interpolation,
    load_time: Duration,
    solve_time: Duration,
}

fn run(args: &Args, stop: StopRule) -> Result<Run, Error> {
    let t = Instant::now();
    let a = load_matrix_market_csc_file(&args.a)?;
    a.check_invariants().map_err(MatrixError::from)?;
    let b = match &args.b {
        Some(path) => {
            let b = load_matrix_market_csc_file(path)?;
            b.check_invariants().map_err(MatrixError::from)?;
            b
        }
        None => identity(a.dim.nrows)?,
    };
    let load_time = t.elapsed();

    let diag = a.diagonal();
    let weights = vec![1.0; b.dim.ncols];
    let config = SkeletonConfig {
        stop,
        ..Default::default()
    };

    let t = Instant::now();
    let out = interp_skel(&a, &b, &diag, &weights, args.tol, &config)?;
    let solve_time = t.elapsed();

    Ok(Run {
        a,
        b,
        out,
        load_time,
        solve_time,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let stop = match args.stop.as_str() {
        "max" => StopRule::MaxEntry,
        "sum" => StopRule::SumEntries,
        other => return Err(format!("unknown stop rule '{other}' (expected 'max' or 'sum')").into()),
    };

    let total = Instant::now();
    let run = run(&args, stop)?;
    let total_elapsed = total.elapsed();

    let skel = &run.out.skeleton;
    let ncols = skel.dim.ncols;
    let max_col = (0..ncols).map(|j| skel.col(j).len()).max().unwrap_or(0);
    let empty_cols = (0..ncols).filter(|&j| skel.col(j).is_empty()).count();

    println!(
        "A:      {}x{}, nnz {}",
        run.a.dim.nrows,
        run.a.dim.ncols,
        run.a.nnz()
    );
    println!(
        "B:      {}x{}, nnz {}",
        run.b.dim.nrows,
        run.b.dim.ncols,
        run.b.nnz()
    );
    println!(
        "X_skel: {}x{}, nnz {} (max column {max_col}, {empty_cols} empty)",
        skel.dim.nrows,
        skel.dim.ncols,
        skel.nnz()
    );
    println!("sum(X*u) = {:.6e}", run.out.row_sum.iter().sum::<f64>());

    println!();
    println!("timing (total {}):", fmt_duration(total_elapsed));
    println!("  load   {:>12}", fmt_duration(run.load_time));
    println!("  solve  {:>12}", fmt_duration(run.solve_time));

    Ok(())
}
