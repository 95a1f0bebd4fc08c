//! Utils

/// Move the element at `from` to position `to`, shifting the elements in
/// between. Every other element keeps its relative order.
///
/// Returns `false` without touching `items` if either index is out of bounds.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }

    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }

    true
}
