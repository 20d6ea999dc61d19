// Property tests for paged queries

mod common;

use imgsrv_core::model::{Filesystem, FilesystemField, FilesystemTier};
use imgsrv_core::SelectCriteria;
use imgsrv_store::adaptor::FilesystemAdaptor;
use imgsrv_store::EntityAdaptor;
use proptest::prelude::*;

fn seeded(rows: usize) -> FilesystemAdaptor {
    let store = common::new_store();
    let adaptor: FilesystemAdaptor = EntityAdaptor::new(store);
    for i in 0..rows {
        let tier = if i % 3 == 0 { FilesystemTier::Tier2 } else { FilesystemTier::Tier1 };
        adaptor
            .add(&Filesystem::columns(format!("/fs/{:03}", i), tier))
            .unwrap();
    }
    adaptor
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn consecutive_pages_are_disjoint_and_contiguous(page_size in 1usize..8, extra in 0usize..10) {
        let adaptor = seeded(2 * page_size + extra);
        let criteria = SelectCriteria::<Filesystem>::new().sort_desc(FilesystemField::FilesystemPath);

        let all = adaptor.find(&criteria).unwrap();
        let first = adaptor.find_range(&criteria, 0, page_size).unwrap();
        let second = adaptor.find_range(&criteria, page_size, page_size).unwrap();

        prop_assert_eq!(first.len(), page_size);
        prop_assert_eq!(second.len(), page_size);
        prop_assert!(first.iter().all(|a| second.iter().all(|b| a.key != b.key)));

        let joined: Vec<_> = first.into_iter().chain(second).collect();
        prop_assert_eq!(&joined[..], &all[..2 * page_size]);
    }

    #[test]
    fn filtered_pages_cover_filtered_rows(page_size in 1usize..5) {
        let adaptor = seeded(30);
        let criteria = SelectCriteria::<Filesystem>::new()
            .equal_to(FilesystemField::FilesystemTier, FilesystemTier::Tier1);

        let total = adaptor.count(&criteria).unwrap();
        let mut paged = Vec::new();
        let mut start = 0;
        loop {
            let page = adaptor.find_range(&criteria, start, page_size).unwrap();
            if page.is_empty() {
                break;
            }
            start += page.len();
            paged.extend(page);
        }

        prop_assert_eq!(paged.len(), total);
        prop_assert_eq!(paged, adaptor.find(&criteria).unwrap());
    }
}

#[test]
fn test_page_past_end_is_empty() {
    let adaptor = seeded(3);
    let page = adaptor.find_range(&SelectCriteria::new(), 3, 10).unwrap();
    assert!(page.is_empty());
}

#[test]
fn test_zero_rows_requested_is_empty() {
    let adaptor = seeded(3);
    let page = adaptor.find_range(&SelectCriteria::new(), 0, 0).unwrap();
    assert!(page.is_empty());
}

#[test]
fn test_largest_start_index_is_empty() {
    let adaptor = seeded(3);
    let page = adaptor
        .find_range(&SelectCriteria::new(), usize::MAX, 10)
        .unwrap();
    assert!(page.is_empty());
}
