use chrono::{DateTime, Utc};

use super::model::Block;

/// Compute which blocks are currently displayed, in display order.
///
/// Pure function of `(blocks, now)` — callers re-derive it on every render
/// because `now` moves. Inactive blocks are excluded unconditionally;
/// scheduled blocks are excluded when `now` falls outside their inclusive
/// [start, end] window. The survivors are sorted ascending by `order`,
/// stable for equal values (original array position breaks ties).
pub fn resolve(blocks: &[Block], now: DateTime<Utc>) -> Vec<&Block> {
    let mut visible: Vec<&Block> = blocks
        .iter()
        .filter(|b| b.active)
        .filter(|b| b.schedule.as_ref().is_none_or(|s| s.contains(now)))
        .collect();
    // Vec::sort_by_key is a stable sort
    visible.sort_by_key(|b| b.order);
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::model::{BlockKind, Schedule};

    fn block(id: &str, order: i64, active: bool) -> Block {
        let mut b = Block::new(id.to_string(), BlockKind::Standard, order);
        b.active = active;
        b
    }

    #[test]
    fn inactive_blocks_are_always_excluded() {
        let now = Utc::now();
        let blocks = vec![block("a", 0, true), block("b", 1, false)];
        let ids: Vec<&str> = resolve(&blocks, now).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn sorted_by_order_skipping_inactive() {
        // Worked example: [{a,2,active},{b,1,inactive},{c,0,active}] -> [c, a]
        let now = Utc::now();
        let blocks = vec![block("a", 2, true), block("b", 1, false), block("c", 0, true)];
        let ids: Vec<&str> = resolve(&blocks, now).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn order_values_need_not_be_contiguous() {
        let now = Utc::now();
        let blocks = vec![block("a", 70, true), block("b", -3, true), block("c", 12, true)];
        let ids: Vec<&str> = resolve(&blocks, now).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn equal_order_keeps_original_array_position() {
        let now = Utc::now();
        let blocks = vec![block("first", 5, true), block("second", 5, true), block("third", 5, true)];
        let ids: Vec<&str> = resolve(&blocks, now).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn schedule_window_is_boundary_inclusive() {
        let start: chrono::DateTime<Utc> = "2026-06-01T00:00:00Z".parse().unwrap();
        let end: chrono::DateTime<Utc> = "2026-06-30T23:59:59Z".parse().unwrap();
        let mut scheduled = block("s", 0, true);
        scheduled.schedule = Some(Schedule {
            start: Some(start),
            end: Some(end),
        });
        let blocks = vec![scheduled];

        assert_eq!(resolve(&blocks, start).len(), 1);
        assert_eq!(resolve(&blocks, end).len(), 1);
        assert_eq!(resolve(&blocks, start - chrono::Duration::seconds(1)).len(), 0);
        assert_eq!(resolve(&blocks, end + chrono::Duration::seconds(1)).len(), 0);
    }

    #[test]
    fn inactive_wins_over_schedule() {
        let now = Utc::now();
        let mut b = block("s", 0, false);
        // Window that includes now — active=false still hides it
        b.schedule = Some(Schedule { start: None, end: None });
        assert!(resolve(&[b], now).is_empty());
    }

    #[test]
    fn absent_schedule_means_always_visible() {
        let far_future: chrono::DateTime<Utc> = "2099-01-01T00:00:00Z".parse().unwrap();
        let blocks = vec![block("a", 0, true)];
        assert_eq!(resolve(&blocks, far_future).len(), 1);
    }
}
