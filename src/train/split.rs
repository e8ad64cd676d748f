//! Shuffled, stratified train/held-out split

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{Error, Result};

/// Index partition of a sample set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Indices used for fitting, in shuffled order
    pub train: Vec<usize>,
    /// Held-out indices, in shuffled order
    pub test: Vec<usize>,
}

/// Held-out count for a class of `n` samples.
///
/// `ceil(fraction × n)`, but a class never gives up its last training
/// sample.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn held_out_count(n: usize, fraction: f64) -> usize {
    let wanted = (fraction * n as f64).ceil() as usize;
    wanted.min(n.saturating_sub(1))
}

/// Shuffle, then hold out `fraction` of each class.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `fraction` is outside `[0, 1)`.
pub fn stratified_split<R: Rng>(labels: &[bool], fraction: f64, rng: &mut R) -> Result<Split> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(Error::InvalidInput(format!(
            "test fraction must be in [0, 1), got {fraction}"
        )));
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.shuffle(rng);

    let positives = labels.iter().filter(|&&l| l).count();
    let mut quota_pos = held_out_count(positives, fraction);
    let mut quota_neg = held_out_count(labels.len() - positives, fraction);

    let mut split = Split {
        train: Vec::with_capacity(labels.len()),
        test: Vec::with_capacity(quota_pos + quota_neg),
    };
    for idx in order {
        let quota = if labels[idx] {
            &mut quota_pos
        } else {
            &mut quota_neg
        };
        if *quota > 0 {
            *quota -= 1;
            split.test.push(idx);
        } else {
            split.train.push(idx);
        }
    }
    Ok(split)
}
