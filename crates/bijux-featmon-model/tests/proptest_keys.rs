// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_model::{FeatureKey, URL_KEY_PREFIX};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn url_keys_round_trip_through_string(path in "/[a-z0-9/_-]{1,60}") {
        let key = FeatureKey::from_canonical_url(&path).expect("key");
        prop_assert!(key.as_str().starts_with(URL_KEY_PREFIX));
        let reparsed = FeatureKey::parse(key.as_str()).expect("reparse");
        prop_assert_eq!(reparsed, key);
    }

    #[test]
    fn unprefixed_keys_are_always_rejected(raw in "[a-z][a-z0-9]{0,20}") {
        prop_assume!(!raw.starts_with("url") && !raw.starts_with("graphql"));
        prop_assert!(FeatureKey::parse(&raw).is_err());
    }
}
