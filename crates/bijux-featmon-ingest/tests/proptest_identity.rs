// SPDX-License-Identifier: Apache-2.0

use bijux_featmon_ingest::canonicalize_url_or_path;
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn canonicalization_is_idempotent(
        host in "[a-zA-Z]{1,10}\\.(com|org|blog)",
        path in "(/[a-z0-9-]{1,8}){0,4}/?",
        fragment in proptest::option::of("[a-z]{1,6}")
    ) {
        let mut raw = format!("https://{host}{path}");
        if let Some(fragment) = fragment {
            raw.push('#');
            raw.push_str(&fragment);
        }
        let once = canonicalize_url_or_path(&raw).expect("canonical");
        let twice = canonicalize_url_or_path(&once).expect("canonical again");
        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.contains('#'));
        prop_assert!(!once.ends_with('/'));
        prop_assert!(once.starts_with("https://"));
    }

    #[test]
    fn host_case_never_changes_identity(host in "[a-z]{1,10}\\.com", path in "/[a-z0-9]{1,8}") {
        let lower = canonicalize_url_or_path(&format!("https://{host}{path}")).expect("lower");
        let upper = canonicalize_url_or_path(&format!("HTTPS://{}{path}", host.to_uppercase()))
            .expect("upper");
        prop_assert_eq!(lower, upper);
    }
}
