//! Property tests for check-step version reconciliation.

use proptest::prelude::*;
use vault_resource::core::domain::Version;
use vault_resource::core::reconcile::{delta, is_lease_id};

proptest! {
    #[test]
    fn range_is_contiguous_and_ends_at_current(last in 0u64..500, current in 0u64..500) {
        let versions = delta(Some(&last.to_string()), &Version::Ordinal(current));

        prop_assert_eq!(versions.last(), Some(&Version::Ordinal(current)));
        if last > current {
            prop_assert_eq!(versions.len(), 1);
        } else {
            prop_assert_eq!(versions.len() as u64, current - last + 1);
            prop_assert_eq!(versions.first(), Some(&Version::Ordinal(last)));
            for pair in versions.windows(2) {
                prop_assert_eq!(pair[1].ordinal(), pair[0].ordinal().map(|n| n + 1));
            }
        }
    }

    #[test]
    fn unparseable_last_seen_counts_from_zero(last in "[a-z-]{0,12}", current in 0u64..100) {
        let versions = delta(Some(&last), &Version::Ordinal(current));
        prop_assert_eq!(versions.len() as u64, current + 1);
        prop_assert_eq!(versions.first(), Some(&Version::Ordinal(0)));
    }

    #[test]
    fn opaque_current_stands_alone(
        last in ".{0,20}",
        current in "[0-9]{4}-[0-9]{2}-[0-9]{2}-[0-9]{6}",
    ) {
        let current = Version::Opaque(current);
        prop_assert_eq!(delta(Some(&last), &current), vec![current.clone()]);
    }

    #[test]
    fn uuid_lease_ids_are_accepted(_seed in any::<u8>()) {
        let lease = uuid::Uuid::new_v4().to_string();
        prop_assert!(is_lease_id(&lease));
    }
}

#[test]
fn test_documented_cases() {
    let render = |v: Vec<Version>| v.iter().map(ToString::to_string).collect::<Vec<_>>();

    assert_eq!(render(delta(Some("1"), &Version::Ordinal(4))), ["1", "2", "3", "4"]);
    assert_eq!(render(delta(Some("5"), &Version::Ordinal(2))), ["2"]);
    assert_eq!(render(delta(Some(""), &Version::Unversioned)), ["0"]);
    assert_eq!(render(delta(Some("0"), &Version::Ordinal(0))), ["0"]);
}
