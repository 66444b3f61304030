//! Fold entries that do not fit on screen into synthesized virtual folders.

use edgelaunch_types::{Entry, VirtualFolder};

use crate::{Error, Result};

/// Icon reference given to synthesized overflow folders
pub const OVERFLOW_ICON: &str = "folder-overflow";

/// Shape `entries` so every level fits in `available_height_px`.
///
/// A level holding more than `capacity = available / entry_height` entries
/// keeps its first `capacity - 1` entries and moves the rest, in order, into a
/// virtual folder appended as the last slot. Real folders are shaped
/// recursively with the same capacity; virtual folders are not. A capacity
/// below one is treated as one.
///
/// # Errors
///
/// Returns [`Error::Config`] if `entry_height_px` is not positive.
pub fn shape_entries(
    entries: Vec<Entry>,
    entry_height_px: i32,
    available_height_px: i32,
    overflow_name: &str,
) -> Result<Vec<Entry>> {
    if entry_height_px <= 0 {
        return Err(Error::Config(format!(
            "entry height must be positive, got {entry_height_px}px"
        )));
    }

    let capacity = usize::try_from(available_height_px / entry_height_px)
        .unwrap_or(0)
        .max(1);

    Ok(shape_level(entries, capacity, overflow_name))
}

fn shape_level(mut entries: Vec<Entry>, capacity: usize, overflow_name: &str) -> Vec<Entry> {
    if entries.len() > capacity {
        let overflow = entries.split_off(capacity - 1);
        entries.push(Entry::VirtualFolder(VirtualFolder {
            name: overflow_name.to_string(),
            icon: Some(OVERFLOW_ICON.to_string()),
            children: overflow,
        }));
    }

    entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Folder(mut folder) => {
                let children = std::mem::take(&mut folder.children);
                folder.children = shape_level(children, capacity, overflow_name);
                Entry::Folder(folder)
            }
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgelaunch_types::{Folder, Leaf};

    fn leaf(id: i64) -> Entry {
        Entry::Leaf(Leaf {
            id,
            name: format!("app-{id}"),
            icon: None,
            target: format!("pkg.app{id}"),
        })
    }

    fn leaves(range: std::ops::Range<i64>) -> Vec<Entry> {
        range.map(leaf).collect()
    }

    fn folder(id: i64, children: Vec<Entry>) -> Entry {
        Entry::Folder(Folder {
            id,
            name: format!("folder-{id}"),
            icon: None,
            children,
        })
    }

    #[test]
    fn test_fitting_level_is_unchanged() {
        let entries = leaves(0..4);
        let shaped = shape_entries(entries.clone(), 100, 400, "More").unwrap();
        assert_eq!(shaped, entries);
    }

    #[test]
    fn test_overflow_into_virtual_folder() {
        let shaped = shape_entries(leaves(0..10), 100, 450, "More").unwrap();

        assert_eq!(shaped.len(), 4);
        assert_eq!(&shaped[..3], &leaves(0..3)[..]);
        let Entry::VirtualFolder(virtual_folder) = &shaped[3] else {
            panic!("expected virtual folder, got {:?}", shaped[3]);
        };
        assert_eq!(virtual_folder.name, "More");
        assert_eq!(virtual_folder.children, leaves(3..10));
    }

    #[test]
    fn test_one_over_capacity() {
        let shaped = shape_entries(leaves(0..5), 100, 400, "More").unwrap();
        assert_eq!(shaped.len(), 4);
        assert_eq!(shaped[3].children(), &leaves(3..5)[..]);
    }

    #[test]
    fn test_zero_capacity_collapses_into_one_folder() {
        let shaped = shape_entries(leaves(0..3), 100, 50, "More").unwrap();
        assert_eq!(shaped.len(), 1);
        assert!(shaped[0].is_virtual());
        assert_eq!(shaped[0].children(), &leaves(0..3)[..]);
    }

    #[test]
    fn test_negative_available_height_behaves_like_zero_capacity() {
        let shaped = shape_entries(leaves(0..2), 100, -300, "More").unwrap();
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0].subtree_len(), 3);
    }

    #[test]
    fn test_non_positive_entry_height_is_error() {
        assert!(matches!(
            shape_entries(leaves(0..2), 0, 400, "More"),
            Err(Error::Config(_))
        ));
        assert!(shape_entries(leaves(0..2), -5, 400, "More").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(shape_entries(Vec::new(), 100, 400, "More").unwrap().is_empty());
    }

    #[test]
    fn test_recurses_into_real_folders() {
        let entries = vec![leaf(0), folder(100, leaves(1..8))];
        let shaped = shape_entries(entries, 100, 300, "More").unwrap();

        assert_eq!(shaped.len(), 2);
        let children = shaped[1].children();
        assert_eq!(children.len(), 3);
        assert!(children[2].is_virtual());
        assert_eq!(children[2].children(), &leaves(3..8)[..]);
    }

    #[test]
    fn test_virtual_folder_contents_not_reshaped() {
        let entries = vec![
            leaf(0),
            leaf(1),
            folder(100, leaves(10..20)),
            leaf(2),
        ];
        let shaped = shape_entries(entries, 100, 200, "More").unwrap();

        assert_eq!(shaped.len(), 2);
        let overflow = shaped[1].children();
        assert_eq!(overflow.len(), 3);
        // The folder moved into the virtual folder keeps all ten children
        assert_eq!(overflow[1].children().len(), 10);
    }

    #[test]
    fn test_shaping_is_idempotent_when_fitting() {
        let entries = vec![leaf(0), folder(100, leaves(1..3)), leaf(4)];
        let once = shape_entries(entries.clone(), 100, 300, "More").unwrap();
        let twice = shape_entries(once.clone(), 100, 300, "More").unwrap();
        assert_eq!(once, entries);
        assert_eq!(twice, once);
    }
}
