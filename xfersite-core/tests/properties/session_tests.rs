//! Property-based tests for site naming and ordering

use std::cmp::Ordering;

use proptest::prelude::*;
use xfersite_core::models::natural_cmp;
use xfersite_core::SessionData;

// ============================================================================
// Generators
// ============================================================================

/// Strategy for a single name segment
fn arb_segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ._-]{0,12}"
}

/// Strategy for a folder path of one to three segments
fn arb_folder() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_segment(), 1..=3).prop_map(|segments| segments.join("/"))
}

// ============================================================================
// Names and folders
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A name made valid is always accepted.
    #[test]
    fn prop_make_valid_name_is_valid(name in "[ -~]{0,24}") {
        let valid = SessionData::make_valid_name(&name);
        prop_assert!(!valid.contains('/'));
        prop_assert!(SessionData::validate_name(&valid).is_ok());
        prop_assert_eq!(valid.len(), name.len());
    }

    /// Composing a path and splitting it again yields the parts.
    #[test]
    fn prop_compose_and_extract(folder in arb_folder(), local in arb_segment()) {
        let full = SessionData::compose_path(&folder, &local);
        prop_assert_eq!(SessionData::extract_local_name(&full), local.as_str());
        prop_assert_eq!(SessionData::extract_folder_name(&full), folder.as_str());

        let data = SessionData::new(full.clone());
        prop_assert_eq!(data.folder_name(), folder.clone());
        prop_assert!(data.is_in_folder_or_workspace(&folder));
        prop_assert!(data.is_in_folder_or_workspace(&folder.to_uppercase()));
    }

    /// A site without a name is named after its user and host.
    #[test]
    fn prop_unnamed_site_uses_host(user in "[a-z]{1,8}", host in "[a-z]{1,10}\\.example\\.com") {
        let mut data = SessionData::new("");
        data.set_host_name(format!("{user}@{host}"));
        prop_assert_eq!(data.host_name(), host.as_str());
        prop_assert_eq!(data.user_name(), user.as_str());
        prop_assert_eq!(data.session_name(), format!("{user}@{host}"));
    }

    /// Making a name unique never returns a taken name.
    #[test]
    fn prop_make_unique(base in arb_segment(), taken_count in 0usize..5) {
        let mut taken = vec![base.clone()];
        for n in 1..=taken_count {
            taken.push(format!("{base} ({n})"));
        }
        let mut data = SessionData::new(base);
        data.make_unique_in(|name| taken.iter().any(|t| t == name));
        prop_assert!(!taken.contains(&data.name().to_string()));
    }
}

// ============================================================================
// Secrets follow their key fields
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Changing host or user keeps the password readable.
    #[test]
    fn prop_password_survives_rekeying(
        password in "[ -~]{1,20}",
        host in "[a-z]{1,10}\\.example\\.com",
        new_host in "[a-z]{1,10}\\.example\\.org",
        new_user in "[a-z]{1,8}",
    ) {
        let mut data = SessionData::new("site");
        data.set_host_name(host);
        data.set_password(&password);

        data.set_host_name(new_host);
        prop_assert_eq!(data.password(), password.clone());
        data.set_user_name(new_user);
        prop_assert_eq!(data.password(), password);
    }
}

// ============================================================================
// Natural ordering
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Digit runs compare by value.
    #[test]
    fn prop_natural_numbers(prefix in "[a-z]{0,4}", a in 0u32..100_000, b in 0u32..100_000) {
        let left = format!("{prefix}{a}");
        let right = format!("{prefix}{b}");
        prop_assert_eq!(natural_cmp(&left, &right), a.cmp(&b));
    }

    /// The ordering is antisymmetric.
    #[test]
    fn prop_natural_antisymmetric(a in "[A-Za-z0-9]{0,8}", b in "[A-Za-z0-9]{0,8}") {
        prop_assert_eq!(natural_cmp(&a, &b), natural_cmp(&b, &a).reverse());
    }

    /// Letters compare without regard to case before falling back.
    #[test]
    fn prop_natural_case_insensitive_first(a in "[a-z]{1,6}", b in "[a-z]{1,6}") {
        prop_assume!(a != b);
        prop_assert_eq!(natural_cmp(&a.to_uppercase(), &b), a.cmp(&b));
    }
}

#[test]
fn test_natural_ordering_of_sites() {
    let mut names = vec!["site10", "Site2", "site1", "alpha"];
    names.sort_by(|a, b| natural_cmp(a, b));
    assert_eq!(names, vec!["alpha", "site1", "Site2", "site10"]);
    assert_eq!(natural_cmp("a", "A"), "a".cmp("A"));
    assert_ne!(natural_cmp("a", "A"), Ordering::Equal);
}
