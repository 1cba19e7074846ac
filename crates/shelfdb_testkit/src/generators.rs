//! Proptest strategies over the fixture shapes.

use crate::fixtures::{Document, Widget};
use proptest::prelude::*;
use uuid::Uuid;

/// Strategy for a widget with an arbitrary alphanumeric SKU.
pub fn any_widget() -> impl Strategy<Value = Widget> {
    ("[a-z0-9]{1,12}", "[a-z ]{0,24}", any::<u32>()).prop_map(|(sku, name, price)| Widget {
        sku,
        name,
        price,
    })
}

/// Strategy for a batch of widgets whose SKUs are pairwise distinct,
/// so the whole batch can be added to a single store.
pub fn distinct_widgets(max: usize) -> impl Strategy<Value = Vec<Widget>> {
    prop::collection::hash_set("[a-z0-9]{1,12}", 0..=max).prop_flat_map(|skus| {
        let skus: Vec<String> = skus.into_iter().collect();
        let len = skus.len();
        prop::collection::vec(any::<u32>(), len).prop_map(move |prices| {
            skus.iter()
                .zip(prices)
                .map(|(sku, price)| Widget {
                    sku: sku.clone(),
                    name: format!("widget {sku}"),
                    price,
                })
                .collect()
        })
    })
}

/// Strategy for a document with an arbitrary UUID identity.
pub fn any_document() -> impl Strategy<Value = Document> {
    (any::<u128>(), "[ -~]{0,64}").prop_map(|(raw, body)| Document {
        id: Uuid::from_u128(raw),
        body,
    })
}

/// Strategy for a batch of documents with pairwise distinct identities.
pub fn distinct_documents(max: usize) -> impl Strategy<Value = Vec<Document>> {
    prop::collection::hash_set(any::<u128>(), 0..=max).prop_map(|ids| {
        ids.into_iter()
            .map(|raw| Document {
                id: Uuid::from_u128(raw),
                body: format!("doc {raw:x}"),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn widget_batches_have_distinct_skus(batch in distinct_widgets(24)) {
            let skus: HashSet<_> = batch.iter().map(|w| w.sku.clone()).collect();
            prop_assert_eq!(skus.len(), batch.len());
        }

        #[test]
        fn document_batches_have_distinct_ids(batch in distinct_documents(24)) {
            let ids: HashSet<_> = batch.iter().map(|d| d.id).collect();
            prop_assert_eq!(ids.len(), batch.len());
        }
    }
}
