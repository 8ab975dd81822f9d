//! Property tests for the diff engine and section publication.

use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;
use rowsync::model::{EditScript, SectionModel, diff};

/// Small alphabet so sequences share and duplicate values often.
fn sequence() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..5, 0..24)
}

fn lcs_len(a: &[u8], b: &[u8]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    for x in a {
        let mut row = vec![0usize; b.len() + 1];
        for (j, y) in b.iter().enumerate() {
            row[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(row[j])
            };
        }
        prev = row;
    }
    prev[b.len()]
}

proptest! {
    #[test]
    fn test_identical_sequences_produce_nothing(seq in sequence()) {
        prop_assert!(diff(&seq, &seq).is_empty());
    }

    #[test]
    fn test_from_and_to_empty(seq in sequence()) {
        let inserts = diff(&[], &seq);
        prop_assert_eq!(inserts.delete_count(), 0);
        prop_assert_eq!(
            inserts.insertions().map(|a| a.row).collect::<Vec<_>>(),
            (0..seq.len()).collect::<Vec<_>>()
        );

        let deletes = diff(&seq, &[]);
        prop_assert_eq!(deletes.insert_count(), 0);
        prop_assert_eq!(
            deletes.deletions().map(|a| a.row).collect::<Vec<_>>(),
            (0..seq.len()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_script_transforms_old_into_new(old in sequence(), new in sequence()) {
        let script = diff(&old, &new);
        prop_assert!(script.validate(0, old.len(), new.len()).is_ok());

        let mut applied = old.clone();
        script.apply_to(&mut applied, &new).unwrap();
        prop_assert_eq!(applied, new);
    }

    #[test]
    fn test_script_is_minimal(old in sequence(), new in sequence()) {
        let script = diff(&old, &new);
        let kept = lcs_len(&old, &new);
        prop_assert_eq!(script.delete_count(), old.len() - kept);
        prop_assert_eq!(script.insert_count(), new.len() - kept);
    }

    #[test]
    fn test_diff_is_deterministic(old in sequence(), new in sequence()) {
        prop_assert_eq!(diff(&old, &new), diff(&old, &new));
    }

    #[test]
    fn test_section_publishes_every_change(updates in prop::collection::vec(sequence(), 1..6)) {
        let section = SectionModel::new(Vec::<u8>::new());
        let published: Arc<Mutex<Vec<EditScript>>> = Arc::new(Mutex::new(Vec::new()));
        let published_clone = published.clone();
        section.content_changed().connect(move |script| {
            published_clone.lock().push(script.clone());
        });

        let mut mirror: Vec<u8> = Vec::new();
        let mut changes = 0;
        for update in updates {
            let before = published.lock().len();
            let changed = mirror != update;
            section.replace(update.clone());

            let scripts = published.lock();
            if changed {
                changes += 1;
                prop_assert_eq!(scripts.len(), before + 1);
                scripts[before].apply_to(&mut mirror, &update).unwrap();
            } else {
                prop_assert_eq!(scripts.len(), before);
            }
            prop_assert_eq!(&mirror, &update);
        }
        prop_assert_eq!(section.revision(), changes);
    }
}
