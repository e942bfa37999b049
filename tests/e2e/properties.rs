//! Property tests over generated paths and contents

use crate::common::fixtures::MemoryFixture;
use dfs_facade::PreconditionError;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn concat_appends_sources_in_argument_order(
        parts in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..16), 1..6)
    ) {
        let fx = MemoryFixture::new();
        fx.memory.write_file("/c/target", b"head").unwrap();
        let sources: Vec<String> = (0..parts.len())
            .rev()
            .map(|i| format!("/c/part-{i}"))
            .collect();
        for (source, data) in sources.iter().zip(&parts) {
            fx.memory.write_file(source, data).unwrap();
        }

        prop_assert!(fx.facade.concat(&sources, "/c/target").unwrap());

        let mut expected = b"head".to_vec();
        for data in &parts {
            expected.extend_from_slice(data);
        }
        prop_assert_eq!(fx.memory.read_file("/c/target").unwrap(), expected);
    }

    #[test]
    fn blank_paths_are_rejected_without_client_calls(blank in "[ \t\n]{0,4}") {
        let fx = MemoryFixture::new();

        let rejected = matches!(
            fx.facade.exist(&blank),
            Err(PreconditionError::BlankArgument { .. })
        );
        prop_assert!(rejected);
        prop_assert!(fx.facade.delete(&blank).is_err());
        prop_assert!(fx.facade.delete_with(&blank, true).is_err());
        prop_assert!(fx.facade.mkdirs(&blank).is_err());
        prop_assert!(fx.facade.list_status(&blank).is_err());
        prop_assert!(fx.facade.concat(&[blank.as_str()], "/t").is_err());
        prop_assert_eq!(fx.calls(), 0);
    }

    #[test]
    fn mkdirs_then_exist(segments in prop::collection::vec("[a-z0-9_]{1,8}", 1..5)) {
        let fx = MemoryFixture::new();
        let path = format!("/{}", segments.join("/"));

        prop_assert!(fx.facade.mkdirs(&path).unwrap());
        prop_assert!(fx.facade.mkdirs(&path).unwrap());
        prop_assert!(fx.facade.exist(&path).unwrap());
        let listing = fx.facade.list_status(&path).unwrap();
        prop_assert!(listing.is_empty());
    }
}
