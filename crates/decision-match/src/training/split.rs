//! Seeded, class-stratified holdout and k-fold splits.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::TrainingError;

pub const SPLIT_SEED: u64 = 42;
pub const HOLDOUT_FRACTION: f64 = 0.2;
pub const CV_FOLDS: usize = 5;

/// Indices of the training and validation parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

fn class_indices(labels: &[u8]) -> [Vec<usize>; 2] {
    let mut classes = [Vec::new(), Vec::new()];
    for (index, label) in labels.iter().enumerate() {
        classes[usize::from(*label == 1)].push(index);
    }
    classes
}

/// Hold out about `test_fraction` of every class. Each class needs at least two
/// members so that both parts can see it.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> Result<Split, TrainingError> {
    let mut classes = class_indices(labels);
    if let Some(smallest) = classes.iter().map(Vec::len).filter(|n| *n < 2).min() {
        return Err(TrainingError::ClassTooSmall {
            members: smallest,
            required: 2,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::new(),
        test: Vec::new(),
    };
    for members in &mut classes {
        members.shuffle(&mut rng);
        let held = ((members.len() as f64 * test_fraction).round() as usize)
            .clamp(1, members.len() - 1);
        split.test.extend_from_slice(&members[..held]);
        split.train.extend_from_slice(&members[held..]);
    }
    split.train.sort_unstable();
    split.test.sort_unstable();
    Ok(split)
}

/// `n_splits` folds with every class dealt round-robin after a seeded shuffle.
pub fn stratified_k_fold(labels: &[u8], n_splits: usize, seed: u64) -> Result<Vec<Split>, TrainingError> {
    let mut classes = class_indices(labels);
    if let Some(smallest) = classes.iter().map(Vec::len).filter(|n| *n < n_splits).min() {
        return Err(TrainingError::ClassTooSmall {
            members: smallest,
            required: n_splits,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
    let mut next_fold = 0;
    for members in &mut classes {
        members.shuffle(&mut rng);
        for index in members.iter() {
            folds[next_fold].push(*index);
            next_fold = (next_fold + 1) % n_splits;
        }
    }

    Ok((0..n_splits)
        .map(|fold| {
            let mut test = folds[fold].clone();
            test.sort_unstable();
            let mut train: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != fold)
                .flat_map(|(_, members)| members.iter().copied())
                .collect();
            train.sort_unstable();
            Split { train, test }
        })
        .collect())
}
