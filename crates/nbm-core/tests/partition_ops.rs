use nbm_core::partition::{
    block_sizes, compose, continuous_map, equivalent, fold_by_blocks, identity, num_blocks,
    validate,
};
use proptest::prelude::*;

#[test]
fn continuous_map_orders_by_first_appearance() {
    assert_eq!(continuous_map(&[5, 5, 2, 5, 9, 2]), vec![0, 0, 1, 0, 2, 1]);
    assert_eq!(continuous_map(&[]), Vec::<usize>::new());
}

#[test]
fn compose_projects_memberships() {
    // level-l nodes -> level-(l+1) blocks -> level-(l+2) blocks
    let inner = [0, 1, 1, 2];
    let outer = [0, 0, 1];
    assert_eq!(compose(&outer, &inner).unwrap(), vec![0, 0, 0, 1]);
}

#[test]
fn compose_rejects_out_of_range_blocks() {
    let err = compose(&[0, 1], &[0, 2]).unwrap_err();
    assert_eq!(err.info().code, "compose-out-of-range");
}

#[test]
fn equivalence_ignores_labels() {
    assert!(equivalent(&[0, 0, 1, 2], &[7, 7, 3, 1]));
    assert!(!equivalent(&[0, 0, 1], &[0, 1, 1]));
}

#[test]
fn fold_takes_block_representatives() {
    let clabel = [4, 4, 9, 9];
    let b = [0, 0, 1, 1];
    assert_eq!(fold_by_blocks(&clabel, &b, 2), vec![4, 9]);
}

#[test]
fn validate_rejects_gappy_partitions() {
    assert!(validate(&[0, 1, 2], 3).is_ok());
    let err = validate(&[0, 2, 2], 3).unwrap_err();
    assert_eq!(err.info().code, "partition-not-contiguous");
    let err = validate(&[0, 1], 3).unwrap_err();
    assert_eq!(err.info().code, "partition-length");
}

#[test]
fn sizes_and_counts_agree() {
    let b = [0, 1, 0, 2, 1, 0];
    assert_eq!(num_blocks(&b), 3);
    assert_eq!(block_sizes(&b), vec![3, 2, 1]);
    assert_eq!(identity(4), vec![0, 1, 2, 3]);
}

proptest! {
    #[test]
    fn continuous_map_is_idempotent(raw in prop::collection::vec(0usize..12, 0..64)) {
        let once = continuous_map(&raw);
        prop_assert_eq!(continuous_map(&once), once.clone());
        prop_assert!(equivalent(&raw, &once));
    }

    #[test]
    fn continuous_map_passes_validation(raw in prop::collection::vec(0usize..12, 1..64)) {
        let relabeled = continuous_map(&raw);
        prop_assert!(validate(&relabeled, raw.len()).is_ok());
    }
}
