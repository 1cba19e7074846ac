//! Property-based coverage over the fixture shapes.

use proptest::prelude::*;
use shelfdb_core::{Config, Context, StoreError};
use shelfdb_testkit::fixtures::{Document, Tally, TestContext, Widget};
use shelfdb_testkit::generators::{any_widget, distinct_documents, distinct_widgets};
use tempfile::TempDir;

fn line_context(dir: &TempDir) -> Context {
    Context::builder(Config::line_file(dir.path()))
        .entity::<Widget>()
        .build()
        .expect("build line context")
}

fn keyed_context(dir: &TempDir) -> Context {
    Context::builder(Config::keyed_file(dir.path()))
        .entity::<Document>()
        .build()
        .expect("build keyed context")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn line_store_round_trips_across_reconstruction(batch in distinct_widgets(16)) {
        let dir = TempDir::new().unwrap();
        {
            let ctx = line_context(&dir);
            ctx.set::<Widget>().unwrap().add_many(batch.clone()).unwrap();
        }
        let ctx = line_context(&dir);
        let widgets = ctx.set::<Widget>().unwrap();
        prop_assert_eq!(widgets.len(), batch.len());
        for expected in &batch {
            let found = widgets.find(expected.sku.as_str()).unwrap();
            prop_assert_eq!(&found, expected);
        }
    }

    #[test]
    fn keyed_store_round_trips_across_reconstruction(batch in distinct_documents(16)) {
        let dir = TempDir::new().unwrap();
        {
            let ctx = keyed_context(&dir);
            ctx.set::<Document>().unwrap().add_many(batch.clone()).unwrap();
        }
        let ctx = keyed_context(&dir);
        let docs = ctx.set::<Document>().unwrap();
        prop_assert_eq!(docs.len(), batch.len());
        for expected in &batch {
            let found = docs.find(expected.id).unwrap();
            prop_assert_eq!(&found, expected);
        }
    }

    #[test]
    fn adding_the_same_key_twice_always_fails(w in any_widget()) {
        let ctx = TestContext::memory();
        let widgets = ctx.widgets();
        widgets.add(w.clone()).unwrap();
        prop_assert!(
            matches!(
                widgets.add(w.clone()),
                Err(StoreError::DuplicateKey { .. })
            ),
            "expected DuplicateKey error on second add"
        );
        prop_assert_eq!(widgets.len(), 1);
    }

    #[test]
    fn removed_records_stay_gone(batch in distinct_widgets(8)) {
        prop_assume!(!batch.is_empty());
        let ctx = TestContext::line_file();
        let widgets = ctx.widgets();
        widgets.add_many(batch.clone()).unwrap();
        let victim = &batch[0];
        widgets.remove(victim).unwrap();
        prop_assert!(
            matches!(
                widgets.find(victim.sku.as_str()),
                Err(StoreError::NotFound { .. })
            ),
            "expected NotFound error after removal"
        );
        prop_assert_eq!(widgets.len(), batch.len() - 1);
    }

    #[test]
    fn snapshots_are_isolated_from_later_mutations(batch in distinct_widgets(8)) {
        let ctx = TestContext::memory();
        let widgets = ctx.widgets();
        widgets.add_many(batch.clone()).unwrap();

        let snapshot = widgets.all().unwrap();
        widgets.clear().unwrap();

        prop_assert_eq!(snapshot.len(), batch.len());
        prop_assert!(widgets.is_empty());
    }

    #[test]
    fn identity_less_records_always_insert(count in 0usize..32) {
        let ctx = TestContext::memory();
        let tallies = ctx.tallies();
        for _ in 0..count {
            tallies.add(Tally { count: 7 }).unwrap();
        }
        prop_assert_eq!(tallies.len(), count);
    }
}
