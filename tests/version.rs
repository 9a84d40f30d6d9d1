//! Version and build id ordering through the public API

use rstest::rstest;
use std::cmp::Ordering;

use update_resolver::version::{BuildId, Version, compare_versions};

#[rstest]
#[case("1.0", "1.0.0", Ordering::Equal)]
#[case("3.6b1", "3.6", Ordering::Less)]
#[case("3.6a2", "3.6b1", Ordering::Less)]
#[case("3.6pre1", "3.6", Ordering::Less)]
#[case("4.0.1", "4.0", Ordering::Greater)]
#[case("10.0", "9.0.1", Ordering::Greater)]
#[case("1.9.2.13", "1.9.13", Ordering::Equal)]
fn compare_versions_orders_release_lines(
    #[case] a: &str,
    #[case] b: &str,
    #[case] expected: Ordering,
) {
    assert_eq!(compare_versions(a, b).unwrap(), expected);
}

#[test]
fn release_train_sorts_in_shipping_order() {
    let mut versions: Vec<Version> = ["4.0", "3.6", "4.0b2", "3.6.13", "4.0b10", "4.0a1"]
        .iter()
        .map(|v| v.parse().unwrap())
        .collect();
    versions.sort();

    let sorted: Vec<String> = versions.iter().map(ToString::to_string).collect();
    assert_eq!(sorted, ["3.6", "3.6.13", "4.0a1", "4.0b2", "4.0b10", "4.0"]);
}

#[rstest]
#[case("20200101", "20191231", Ordering::Greater)]
#[case("2020010100", "20200101", Ordering::Greater)]
#[case("20200101", "20200101", Ordering::Equal)]
fn build_ids_compare_numerically(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
    let a = BuildId::parse(a).unwrap();
    let b = BuildId::parse(b).unwrap();

    assert_eq!(a.cmp(&b), expected);
}

#[test]
fn malformed_input_is_rejected() {
    assert!(compare_versions("1.0", "one.zero").is_err());
    assert!(BuildId::parse("2020-01-01").is_err());
}
