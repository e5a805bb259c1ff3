//! Candidate jet updates from VALID neighbours: the straight-line template
//! and the adjacent-triangle edge minimisation, the latter solved by a
//! Brent-like 1-D root finder.

use crate::cubic::{Bicubic, Variable};
use crate::direction::Direction;
use crate::error::SolverError;
use crate::geometry::GridGeometry;
use crate::node::Jet;
use crate::slowness::Slowness;
use bevy_math::DVec2;

/// Root-finder tolerance on `|dF/dlambda|`.
const EPS: f64 = 1e-13;

/// Generous cap on root-finder iterations before clamping to the best
/// bracket endpoint and reporting [`SolverError::RootFinderStalled`].
const MAX_ITERATIONS: usize = 100;

const SQRT2: f64 = std::f64::consts::SQRT_2;

/// Which bicubic variable and edge a triangle update's neighbour direction
/// restricts to, indexed by [`Direction::index`]. Load-bearing lookup
/// tables carried from the reference solver: direction parity alone does
/// not determine them (axial neighbours alternate between the `Lambda` and
/// `Mu` edge depending on which side of the cell they sit on).
const TRI_VARIABLE: [Variable; 8] = [
    Variable::Mu,
    Variable::Mu,
    Variable::Lambda,
    Variable::Lambda,
    Variable::Mu,
    Variable::Mu,
    Variable::Lambda,
    Variable::Lambda,
];
const TRI_EDGE: [u8; 8] = [1, 1, 0, 0, 0, 0, 1, 1];

/// Apply the line-update template: a candidate travel time at `l` from the
/// single VALID neighbour at `l0` (offset direction `dir`).
///
/// Writes the jet at `l` and returns `true` iff it improved on the current
/// value.
pub fn line_update<S: Slowness>(
    geom: &GridGeometry,
    slowness: &S,
    jets: &mut [Jet],
    l: usize,
    l0: usize,
    dir: Direction,
) -> Result<bool, SolverError> {
    let s = sample(geom, slowness, l)?;
    let s0 = sample(geom, slowness, l0)?;
    let t0 = jets[l0].f;
    let d = if dir.is_diagonal() { SQRT2 } else { 1.0 };
    let t_new = t0 + geom.spec.h * (s + s0) / 2.0 * d;

    if t_new < jets[l].f {
        let offset = dir.offset();
        jets[l].f = t_new;
        jets[l].fx = s * offset.x as f64 / d;
        jets[l].fy = s * offset.y as f64 / d;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Apply the triangle-update template: minimise `F(lambda) = p_e(lambda) +
/// h*s(x(lambda))*sqrt(1+lambda^2)` over the edge of the cell bordering
/// `l`, between VALID neighbours `l0` (lambda=0) and `l1` (lambda=1).
/// `dir` identifies which of `l`'s eight neighbour directions `l0` sits at,
/// selecting the triangle's cell and bicubic edge.
///
/// Writes the jet at `l` and returns `true` iff it improved on the current
/// value. Root-finder stalls are reported as a warning, not a failure: the
/// clamped best estimate is still used.
pub fn triangle_update<S: Slowness>(
    geom: &GridGeometry,
    slowness: &S,
    bicubics: &[Bicubic],
    jets: &mut [Jet],
    l: usize,
    l0: usize,
    l1: usize,
    dir: Direction,
    warnings: &mut Vec<SolverError>,
) -> Result<bool, SolverError> {
    let cell = geom.tri_cell(l, dir);
    let var = TRI_VARIABLE[dir.index()];
    let edge = TRI_EDGE[dir.index()];
    let cubic = bicubics[cell].restrict(var, edge);

    let xy0 = geom.xy(l0);
    let xy1 = geom.xy(l1);
    let h = geom.spec.h;

    let f_value = |lam: f64| -> Result<f64, SolverError> {
        let x = lerp(xy0, xy1, lam);
        let s = sample_at(slowness, x)?;
        let len = (1.0 + lam * lam).sqrt();
        Ok(cubic.eval(lam) + h * s * len)
    };
    let df_dlam = |lam: f64| -> Result<f64, SolverError> {
        let x = lerp(xy0, xy1, lam);
        let s = sample_at(slowness, x)?;
        let ds = slowness.gradient(x);
        let ds_dlam = match var {
            Variable::Lambda => ds.x,
            Variable::Mu => ds.y,
        };
        let len = (1.0 + lam * lam).sqrt();
        let dlen_dlam = lam / len;
        Ok(cubic.eval_derivative(lam) + h * (ds_dlam * len + s * dlen_dlam))
    };

    let lam = find_root(df_dlam, l, warnings)?;
    let t = f_value(lam)?;

    if t < jets[l].f {
        let x = geom.xy(l);
        let xlam = lerp(xy0, xy1, lam);
        let len = (1.0 + lam * lam).sqrt();
        let s = sample(geom, slowness, l)?;
        jets[l].f = t;
        jets[l].fx = s * (x.x - xlam.x) / len;
        jets[l].fy = s * (x.y - xlam.y) / len;
        Ok(true)
    } else {
        Ok(false)
    }
}

#[inline]
fn lerp(a: DVec2, b: DVec2, lam: f64) -> DVec2 {
    a * (1.0 - lam) + b * lam
}

#[inline]
fn sample<S: Slowness>(geom: &GridGeometry, slowness: &S, l: usize) -> Result<f64, SolverError> {
    sample_at(slowness, geom.xy(l))
}

#[inline]
fn sample_at<S: Slowness>(slowness: &S, x: DVec2) -> Result<f64, SolverError> {
    let value = slowness.value(x);
    if value <= 0.0 {
        return Err(SolverError::NonPositiveSlowness { x, value });
    }
    Ok(value)
}

fn sgn(x: f64) -> i32 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Solve `df(lambda) = 0` on `[0, 1]` with the pre-bracketing and
/// Brent-like hybrid secant/bisection search the reference solver uses:
/// check the endpoints first, fall back to a straight endpoint choice when
/// `df` has the same sign at both ends (meaning `F` is monotone on
/// `[0,1]`), and otherwise iterate a bounded secant step, bisecting
/// whenever it would leave the bracket or fail to shrink it fast enough.
fn find_root(
    df: impl Fn(f64) -> Result<f64, SolverError>,
    node: usize,
    warnings: &mut Vec<SolverError>,
) -> Result<f64, SolverError> {
    let fa0 = df(0.0)?;
    if fa0.abs() <= EPS {
        return Ok(0.0);
    }
    let fb0 = df(1.0)?;
    if fb0.abs() <= EPS {
        return Ok(1.0);
    }
    if sgn(fa0) == sgn(fb0) {
        // F is monotone across the whole edge; the minimiser is whichever
        // endpoint F is still decreasing into.
        return Ok(if sgn(fa0) == 1 { 0.0 } else { 1.0 });
    }

    let mut a = 0.0_f64;
    let mut fa = fa0;
    let mut b = 1.0_f64;
    let mut fb = fb0;
    let mut c = a;
    let mut fc = fa;

    for _ in 0..MAX_ITERATIONS {
        if fc.abs() < fb.abs() {
            std::mem::swap(&mut b, &mut c);
            std::mem::swap(&mut fb, &mut fc);
            a = c;
            fa = fc;
        }
        if (b - c).abs() <= EPS {
            return Ok((b + c) / 2.0);
        }

        let dm = (c - b) / 2.0;
        let df_ab = fa - fb;
        let ds = if df_ab == 0.0 {
            dm
        } else {
            -fb * (a - b) / df_ab
        };
        let dd = if sgn(ds) != sgn(dm) || ds.abs() > dm.abs() {
            dm
        } else {
            ds
        };
        let dd = if dd.abs() < EPS {
            EPS * sgn(dm) as f64 / 2.0
        } else {
            dd
        };

        let d = b + dd;
        let fd = df(d)?;
        if fd == 0.0 {
            return Ok(d);
        }

        a = b;
        fa = fb;
        b = d;
        fb = fd;
        if sgn(fb) == sgn(fc) {
            c = a;
            fc = fa;
        }
    }

    tracing::warn!(node, iterations = MAX_ITERATIONS, "root finder stalled, clamping to best bracket");
    warnings.push(SolverError::RootFinderStalled {
        node,
        iterations: MAX_ITERATIONS,
    });
    Ok((b + c) / 2.0)
}
