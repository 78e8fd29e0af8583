use rand::Rng;

use crate::relaxation::RelaxationResult;
use crate::violations::is_fractional;
use crate::Instance;

/// Fraction of `samples` random roundings of the relaxed point that satisfy
/// every row. Each fractional integer variable goes to its ceiling or floor
/// by a fair coin; everything else keeps its relaxed value.
///
/// Returns `None` for zero samples and `Some(0.0)` when the relaxation has
/// no optimal point.
pub fn sample_roundings<R: Rng + ?Sized>(
    instance: &dyn Instance,
    relaxation: &RelaxationResult,
    samples: usize,
    tolerance: f64,
    rng: &mut R,
) -> Option<f64> {
    if samples == 0 {
        return None;
    }
    let Some(primal) = relaxation.primal() else {
        return Some(0.0);
    };

    let fractional: Vec<usize> = primal
        .iter()
        .enumerate()
        .filter(|&(i, &v)| instance.variable(i).is_integer && is_fractional(v, tolerance))
        .map(|(i, _)| i)
        .collect();

    let mut x = primal.to_vec();
    let mut feasible = 0usize;
    for _ in 0..samples {
        for &i in &fractional {
            x[i] = if rng.random_bool(0.5) {
                primal[i].ceil()
            } else {
                primal[i].floor()
            };
        }
        if instance.is_lp_feasible(&x, tolerance) {
            feasible += 1;
        }
    }

    let probability = feasible as f64 / samples as f64;
    tracing::debug!(samples, feasible, fractional = fractional.len(), "sampled roundings");
    Some(probability)
}
