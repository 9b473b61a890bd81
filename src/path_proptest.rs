//! Property-based tests for path manipulation functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{clean, glob_match, is_within};
    use proptest::prelude::*;
    use std::path::{Component, PathBuf};

    // ============================================================================
    // clean property tests
    // ============================================================================

    /// Path segments: names, `.` and `..`
    fn segment() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => "[a-z0-9_-]{1,8}",
            1 => Just(".".to_string()),
            1 => Just("..".to_string()),
        ]
    }

    fn relative_path() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 0..8).prop_map(|segs| segs.join("/"))
    }

    proptest! {
        /// Property: clean is idempotent
        #[test]
        fn clean_is_idempotent(input in relative_path()) {
            let once = clean(&input);
            let twice = clean(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: clean never leaves `.` components behind (except a lone ".")
        #[test]
        fn clean_removes_cur_dir(input in relative_path()) {
            let result = clean(&input);
            if result != PathBuf::from(".") {
                prop_assert!(!result.components().any(|c| c == Component::CurDir));
            }
        }

        /// Property: `..` only survives as a leading component
        #[test]
        fn clean_parent_dirs_are_leading(input in relative_path()) {
            let result = clean(&input);
            let comps: Vec<_> = result.components().collect();
            let first_normal = comps
                .iter()
                .position(|c| matches!(c, Component::Normal(_)))
                .unwrap_or(comps.len());
            prop_assert!(comps[first_normal..]
                .iter()
                .all(|c| *c != Component::ParentDir));
        }

        /// Property: plain names are left untouched
        #[test]
        fn clean_preserves_plain_paths(segs in prop::collection::vec("[a-z0-9_]{1,8}", 1..6)) {
            let input = segs.join("/");
            prop_assert_eq!(clean(&input), PathBuf::from(&input));
        }

        /// Property: anything cleaned without leading `..` stays within the root
        #[test]
        fn is_within_matches_leading_parent(input in relative_path()) {
            let cleaned = clean(&input);
            let escapes = cleaned.starts_with("..");
            prop_assert_eq!(is_within("/SRV/ROOT", &input), !escapes);
        }

        /// Property: a literal pattern always matches itself
        #[test]
        fn glob_match_literal_matches_itself(name in "[a-z0-9_]{1,12}") {
            prop_assert!(glob_match(&name, &name).unwrap());
        }
    }
}
