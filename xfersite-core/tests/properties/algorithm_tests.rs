//! Property-based tests for algorithm preference lists

use proptest::prelude::*;
use xfersite_core::algorithms::{format_list, merge, merge_text, parse_list, Algorithm};
use xfersite_core::{Cipher, Kex};

// ============================================================================
// Generators
// ============================================================================

/// Strategy for a user ordering: any subset of the family in any order
fn arb_ordering<A: Algorithm>() -> impl Strategy<Value = Vec<A>> {
    Just(A::ALL.to_vec())
        .prop_shuffle()
        .prop_flat_map(|shuffled| {
            let len = shuffled.len();
            (Just(shuffled), 0..=len)
        })
        .prop_map(|(shuffled, keep)| shuffled.into_iter().take(keep).collect())
}

fn count<A: Algorithm>(list: &[A], wanted: A) -> usize {
    list.iter().filter(|&&algorithm| algorithm == wanted).count()
}

fn is_subsequence<A: Algorithm>(needle: &[A], haystack: &[A]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|wanted| rest.any(|candidate| candidate == wanted))
}

// ============================================================================
// Merge completeness
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every cipher appears exactly once after merging.
    #[test]
    fn prop_cipher_merge_is_permutation(user in arb_ordering::<Cipher>()) {
        let merged = merge(&user, Cipher::DEFAULT_ORDER);
        prop_assert_eq!(merged.len(), Cipher::ALL.len());
        for &cipher in Cipher::ALL {
            prop_assert_eq!(count(&merged, cipher), 1, "{:?} in {:?}", cipher, merged);
        }
    }

    /// Every key exchange appears exactly once after merging.
    #[test]
    fn prop_kex_merge_is_permutation(user in arb_ordering::<Kex>()) {
        let merged = merge(&user, Kex::DEFAULT_ORDER);
        prop_assert_eq!(merged.len(), Kex::ALL.len());
        for &kex in Kex::ALL {
            prop_assert_eq!(count(&merged, kex), 1, "{:?} in {:?}", kex, merged);
        }
    }

    /// The user's relative ordering survives the merge.
    #[test]
    fn prop_merge_keeps_user_order(user in arb_ordering::<Cipher>()) {
        let merged = merge(&user, Cipher::DEFAULT_ORDER);
        prop_assert!(is_subsequence(&user, &merged), "{:?} not kept in {:?}", user, merged);
    }

    /// Merging a complete list changes nothing.
    #[test]
    fn prop_merge_is_idempotent(user in arb_ordering::<Kex>()) {
        let merged = merge(&user, Kex::DEFAULT_ORDER);
        prop_assert_eq!(merge(&merged, Kex::DEFAULT_ORDER), merged);
    }
}

// ============================================================================
// Storage text form
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A merged list survives its storage form unchanged.
    #[test]
    fn prop_merged_list_text_is_stable(user in arb_ordering::<Cipher>()) {
        let merged = merge(&user, Cipher::DEFAULT_ORDER);
        prop_assert_eq!(merge_text::<Cipher>(&format_list(&merged)), merged);
    }

    /// Unknown names and repeats are dropped while parsing.
    #[test]
    fn prop_parse_ignores_noise(
        user in arb_ordering::<Kex>(),
        noise in prop::collection::vec("[a-z]{1,6}-x", 0..4),
    ) {
        let mut text = format_list(&user);
        for token in &noise {
            text.push(',');
            text.push_str(token);
        }
        text.push(',');
        text.push_str(&format_list(&user));
        prop_assert_eq!(parse_list::<Kex>(&text), user);
    }

    /// Parsing ignores case and surrounding blanks.
    #[test]
    fn prop_parse_is_case_insensitive(user in arb_ordering::<Cipher>()) {
        let text = user
            .iter()
            .map(|cipher| format!(" {} ", cipher.name().to_uppercase()))
            .collect::<Vec<_>>()
            .join(",");
        prop_assert_eq!(parse_list::<Cipher>(&text), user);
    }
}

#[test]
fn test_default_order_is_fixed_point() {
    assert_eq!(merge(Cipher::DEFAULT_ORDER, Cipher::DEFAULT_ORDER), Cipher::DEFAULT_ORDER);
    assert_eq!(merge_text::<Kex>(""), Kex::DEFAULT_ORDER);
}
