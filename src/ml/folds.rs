use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::search::SearchError;
use crate::dataset::LABELS;

/// One cross-validation split as row indices into the training set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified k-fold split.
///
/// Members of each class are dealt to folds round-robin in their original
/// order, or in a seeded shuffled order when `shuffle_seed` is set. Every
/// label in [`LABELS`] needs at least `k` members so that each fold sees each
/// class. Index lists are returned in ascending order.
pub fn stratified_k_fold(
    labels: &[usize],
    k: usize,
    shuffle_seed: Option<u64>,
) -> Result<Vec<Fold>, SearchError> {
    if k < 2 {
        return Err(SearchError::InvalidFolds(k));
    }
    if let Some(&label) = labels.iter().find(|&&label| !LABELS.contains(&label)) {
        return Err(SearchError::UnknownLabel(label));
    }
    let mut rng = shuffle_seed.map(StdRng::seed_from_u64);
    let mut assignment = vec![0usize; labels.len()];
    for label in LABELS {
        let mut members = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == label)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        if members.len() < k {
            return Err(SearchError::TooFewMembers {
                label,
                count: members.len(),
                folds: k,
            });
        }
        if let Some(rng) = rng.as_mut() {
            members.shuffle(rng);
        }
        for (position, idx) in members.into_iter().enumerate() {
            assignment[idx] = position % k;
        }
    }

    Ok((0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&idx| assignment[idx] == fold);
            Fold { train, test }
        })
        .collect())
}

/// At most `count` row indices, taken evenly through each class in proportion
/// to its size. Returned in ascending order.
pub fn stratified_sample(labels: &[usize], count: usize) -> Vec<usize> {
    let total = labels.len();
    if count >= total {
        return (0..total).collect();
    }
    let mut picked = Vec::with_capacity(count);
    for label in LABELS {
        let members = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == label)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        let take = members.len() * count / total;
        picked.extend((0..take).map(|i| members[i * members.len() / take]));
    }
    picked.sort_unstable();
    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deals_each_class_round_robin() {
        let labels = [0, 1, 0, 1, 0, 1, 1, 0];
        let folds = stratified_k_fold(&labels, 2, None).unwrap();
        assert_eq!(folds[0].test, vec![0, 1, 4, 5]);
        assert_eq!(folds[1].test, vec![2, 3, 6, 7]);
        assert_eq!(folds[0].train, folds[1].test);
    }

    #[test]
    fn every_row_is_tested_exactly_once() {
        let labels = (0..23).map(|i| usize::from(i % 3 == 0)).collect::<Vec<_>>();
        let folds = stratified_k_fold(&labels, 5, Some(7)).unwrap();
        let mut seen = folds
            .iter()
            .flat_map(|fold| fold.test.iter().copied())
            .collect::<Vec<_>>();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());
        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 23);
            assert!(fold.test.iter().any(|&idx| labels[idx] == 0));
            assert!(fold.test.iter().any(|&idx| labels[idx] == 1));
        }
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let labels = (0..40).map(|i| i % 2).collect::<Vec<_>>();
        let first = stratified_k_fold(&labels, 4, Some(42)).unwrap();
        let second = stratified_k_fold(&labels, 4, Some(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn small_class_is_an_error() {
        let err = stratified_k_fold(&[0, 0, 0, 1, 1], 3, None).unwrap_err();
        assert!(matches!(
            err,
            SearchError::TooFewMembers {
                label: 1,
                count: 2,
                folds: 3
            }
        ));
    }

    #[test]
    fn needs_at_least_two_folds() {
        assert!(matches!(
            stratified_k_fold(&[0, 1], 1, None),
            Err(SearchError::InvalidFolds(1))
        ));
    }

    #[test]
    fn sample_keeps_class_balance() {
        let labels = (0..100).map(|i| usize::from(i % 10 >= 3)).collect::<Vec<_>>();
        let picked = stratified_sample(&labels, 10);
        assert_eq!(picked.len(), 10);
        assert!(picked.windows(2).all(|pair| pair[0] < pair[1]));
        let zeros = picked.iter().filter(|&&idx| labels[idx] == 0).count();
        assert_eq!(zeros, 3);
    }

    #[test]
    fn sample_larger_than_input_keeps_everything() {
        assert_eq!(stratified_sample(&[1, 0, 1], 5), vec![0, 1, 2]);
    }
}
