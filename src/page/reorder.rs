use super::model::Block;

/// Apply a drag-and-drop outcome: relocate the block at display position
/// `from` to display position `to`, then reassign every `order` field to
/// the dense sequence 0..n-1.
///
/// Positions are indices into the display order (blocks sorted by `order`,
/// stable), not raw array indices — the document array is not guaranteed
/// to be sorted. `from == to` is a no-op apart from the dense renumbering.
/// Returns false without touching the list when either index is out of
/// range. All other block fields are preserved unchanged.
pub fn move_block(blocks: &mut Vec<Block>, from: usize, to: usize) -> bool {
    if from >= blocks.len() || to >= blocks.len() {
        return false;
    }

    blocks.sort_by_key(|b| b.order);
    let moved = blocks.remove(from);
    blocks.insert(to, moved);

    for (index, block) in blocks.iter_mut().enumerate() {
        block.order = index as i64;
    }
    true
}
