//! Minimal list updates between two snapshots of a list.

use crate::db::SleepNight;

/// Identity and content predicates over a pair of list items.
pub trait DiffCallback<T> {
    /// Both values describe the same item (e.g. equal ids).
    fn are_items_the_same(&self, old: &T, new: &T) -> bool;

    /// Only called for items that are the same; `false` means the row must be
    /// re-rendered.
    fn are_contents_the_same(&self, old: &T, new: &T) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SleepNightDiffCallback;

impl DiffCallback<SleepNight> for SleepNightDiffCallback {
    fn are_items_the_same(&self, old: &SleepNight, new: &SleepNight) -> bool {
        old.night_id == new.night_id
    }

    fn are_contents_the_same(&self, old: &SleepNight, new: &SleepNight) -> bool {
        old == new
    }
}

/// One positional edit.
///
/// Structural updates (`Remove`, `Insert`, `Move`) apply in order to the old
/// list; `Move` removes at `from` and then inserts at `to`. `Change` positions
/// refer to the final list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListUpdate {
    Remove { position: usize },
    Insert { position: usize },
    Move { from: usize, to: usize },
    Change { position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Old(usize),
    New(usize),
}

/// Computes the updates that turn `old` into `new`.
///
/// Items on a longest common subsequence (by identity) stay put, items in
/// both lists but off that subsequence are moved, the rest are removed or
/// inserted.
pub fn calculate_diff<T, C>(old: &[T], new: &[T], callback: &C) -> Vec<ListUpdate>
where
    C: DiffCallback<T> + ?Sized,
{
    let (old_anchor, new_anchor) = common_subsequence(old, new, callback);

    let mut moved_from: Vec<Option<usize>> = vec![None; new.len()];
    let mut old_moved = vec![false; old.len()];
    for (j, new_item) in new.iter().enumerate() {
        if new_anchor[j].is_some() {
            continue;
        }
        moved_from[j] = (0..old.len()).find(|&i| {
            old_anchor[i].is_none()
                && !old_moved[i]
                && callback.are_items_the_same(&old[i], new_item)
        });
        if let Some(i) = moved_from[j] {
            old_moved[i] = true;
        }
    }

    let mut updates = Vec::new();

    for i in (0..old.len()).rev() {
        if old_anchor[i].is_none() && !old_moved[i] {
            updates.push(ListUpdate::Remove { position: i });
        }
    }

    let mut working: Vec<Entry> = (0..old.len())
        .filter(|&i| old_anchor[i].is_some() || old_moved[i])
        .map(Entry::Old)
        .collect();

    let entry_for = |j: usize| match (new_anchor[j], moved_from[j]) {
        (Some(i), _) | (None, Some(i)) => Entry::Old(i),
        (None, None) => Entry::New(j),
    };
    let position_of = |working: &[Entry], entry: Entry| {
        working.iter().position(|candidate| *candidate == entry)
    };

    for j in 0..new.len() {
        if new_anchor[j].is_some() {
            continue;
        }

        // Everything placed is kept right after its predecessor in `new`.
        let entry = entry_for(j);
        if let Some(from) = position_of(working.as_slice(), entry) {
            working.remove(from);
            let to = insertion_point(working.as_slice(), j, &entry_for, &position_of);
            working.insert(to, entry);
            if from != to {
                updates.push(ListUpdate::Move { from, to });
            }
        } else {
            let to = insertion_point(working.as_slice(), j, &entry_for, &position_of);
            working.insert(to, entry);
            updates.push(ListUpdate::Insert { position: to });
        }
    }

    for (j, new_item) in new.iter().enumerate() {
        let source = new_anchor[j].or(moved_from[j]);
        if let Some(i) = source {
            if !callback.are_contents_the_same(&old[i], new_item) {
                updates.push(ListUpdate::Change { position: j });
            }
        }
    }

    updates
}

fn insertion_point<E, P>(working: &[Entry], j: usize, entry_for: &E, position_of: &P) -> usize
where
    E: Fn(usize) -> Entry,
    P: Fn(&[Entry], Entry) -> Option<usize>,
{
    if j == 0 {
        return 0;
    }
    // The predecessor is an anchor or was placed on an earlier iteration.
    position_of(working, entry_for(j - 1)).map_or(0, |pos| pos + 1)
}

/// Pairs old and new indices along a longest common subsequence.
fn common_subsequence<T, C>(
    old: &[T],
    new: &[T],
    callback: &C,
) -> (Vec<Option<usize>>, Vec<Option<usize>>)
where
    C: DiffCallback<T> + ?Sized,
{
    let (n, m) = (old.len(), new.len());
    // lengths[i][j] = LCS length of old[i..] and new[j..]
    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            let skip = lengths[i + 1][j].max(lengths[i][j + 1]);
            lengths[i][j] = if callback.are_items_the_same(&old[i], &new[j]) {
                skip.max(lengths[i + 1][j + 1] + 1)
            } else {
                skip
            };
        }
    }

    let mut old_anchor = vec![None; n];
    let mut new_anchor = vec![None; m];
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if callback.are_items_the_same(&old[i], &new[j])
            && lengths[i][j] == lengths[i + 1][j + 1] + 1
        {
            old_anchor[i] = Some(j);
            new_anchor[j] = Some(i);
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    (old_anchor, new_anchor)
}
