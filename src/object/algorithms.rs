// src/object/algorithms.rs
//
// The Stack & Track algorithms from spec.md §4.6-§4.7: flattening a layered
// Stack into one opaque Track, trimming a Track to a sub-range without
// splitting a Transition, and a Myers shortest-edit-script visual diff
// between two Tracks.

use crate::error::{Error, Result};
use crate::object::clip::Gap;
use crate::object::common::TrackKind;
use crate::object::composition::{self, Stack, Track};
use crate::object::{clone_node, item, NodeKind, NodeRef};
use crate::time::{RationalTime, TimeRange, DEFAULT_EPSILON_S};

/// Reduce a Stack of bottom-to-top Tracks to a single equivalent Track:
/// at every instant, the topmost non-Gap Item covering that instant wins.
pub fn flatten_stack(stack: &Stack) -> Result<Track> {
    let layers = stack.children()?;
    if layers.is_empty() {
        return Ok(Track::new(stack.node().name(), TrackKind::Video));
    }

    struct Placed {
        range: TimeRange,
        item: NodeRef,
    }

    let mut layouts: Vec<Vec<Placed>> = Vec::with_capacity(layers.len());
    let mut rate: Option<f64> = None;
    for layer in &layers {
        let track = Track::from_node(layer.clone())?;
        let kids = track.children()?;
        let mut placed = Vec::with_capacity(kids.len());
        for (i, child) in kids.iter().enumerate() {
            if matches!(&*child.kind.borrow(), NodeKind::Transition(_)) {
                continue;
            }
            let r = composition::range_of_child_at_index(layer, i)?;
            if rate.is_none() {
                rate = Some(r.duration.rate);
            }
            placed.push(Placed { range: r, item: child.clone() });
        }
        layouts.push(placed);
    }
    let rate = rate.unwrap_or(24.0);

    let mut points = vec![0.0f64];
    let mut union_end = 0.0f64;
    for layout in &layouts {
        for p in layout {
            let s = p.range.start_time.rescaled_to(rate).value;
            let e = p.range.end_time_exclusive().rescaled_to(rate).value;
            points.push(s);
            points.push(e);
            union_end = union_end.max(e);
        }
    }
    points.push(union_end);
    points.sort_by(|a, b| a.partial_cmp(b).unwrap());
    points.dedup_by(|a, b| (*a - *b).abs() < DEFAULT_EPSILON_S);

    let result = Track::new(format!("{}.flattened", stack.node().name()), TrackKind::Video);
    for window in points.windows(2) {
        let (s, e) = (window[0], window[1]);
        if e - s <= DEFAULT_EPSILON_S {
            continue;
        }
        let sub = TimeRange::new(RationalTime::new(s, rate), RationalTime::new(e - s, rate));

        let mut winner: Option<(&Placed, f64)> = None;
        for layout in layouts.iter().rev() {
            if let Some(p) = layout.iter().find(|p| {
                let ps = p.range.start_time.rescaled_to(rate).value;
                let pe = p.range.end_time_exclusive().rescaled_to(rate).value;
                ps <= s + DEFAULT_EPSILON_S && e <= pe + DEFAULT_EPSILON_S
            }) {
                if !matches!(&*p.item.kind.borrow(), NodeKind::Gap(_)) {
                    let offset = s - p.range.start_time.rescaled_to(rate).value;
                    winner = Some((p, offset));
                    break;
                }
            }
        }

        match winner {
            Some((placed, offset)) => {
                let cloned = clone_node(&placed.item)?;
                let base = item::trimmed_range(&placed.item)?;
                let new_start = base.start_time + RationalTime::new(offset, rate).rescaled_to(base.start_time.rate);
                let new_range = TimeRange::new(new_start, sub.duration.rescaled_to(new_start.rate));
                item::set_source_range(&cloned, Some(new_range))?;
                result.append_child(cloned)?;
            }
            None => {
                result.append_child(Gap::new(String::new(), sub).node().clone())?;
            }
        }
    }
    Ok(result)
}

/// Trim a Track to `range` without splitting a Transition. Items entirely
/// inside `range` are kept whole; items straddling an edge are cloned and
/// re-trimmed; items entirely outside are dropped. A Transition straddling
/// an edge fails with `CANNOT_TRIM_TRANSITION`.
pub fn track_trimmed_to_range(track: &Track, range: TimeRange) -> Result<Track> {
    let node = track.node();
    let total = composition::intrinsic_range(node)?;
    let total_start = total.start_time.to_seconds();
    let total_end = total.end_time_exclusive().to_seconds();
    let range_start = range.start_time.to_seconds();
    let range_end = range.end_time_exclusive().to_seconds();

    if range_start <= total_start + DEFAULT_EPSILON_S && range_end >= total_end - DEFAULT_EPSILON_S {
        return Track::from_node(clone_node(node)?);
    }

    let kids = track.children()?;
    let result = Track::new(node.name(), track.kind());
    let rate = range.duration.rate;

    for (i, child) in kids.iter().enumerate() {
        let r = composition::range_of_child_at_index(node, i)?;
        let is_transition = matches!(&*child.kind.borrow(), NodeKind::Transition(_));
        // A Transition has zero width in the track's layout, but its real
        // footprint — the handle frames it borrows from each neighbor —
        // spans `[position - in_offset, position + out_offset)`. Trimming
        // must see that footprint, not the zero-width layout point, or a
        // cut landing inside a kept Transition's handles would go
        // undetected.
        let (cs, ce) = if is_transition {
            let (in_offset, out_offset) = match &*child.kind.borrow() {
                NodeKind::Transition(t) => (t.in_offset, t.out_offset),
                _ => unreachable!(),
            };
            let position = r.start_time.to_seconds();
            (position - in_offset.to_seconds(), position + out_offset.to_seconds())
        } else {
            (r.start_time.to_seconds(), r.end_time_exclusive().to_seconds())
        };

        if ce <= range_start + DEFAULT_EPSILON_S || cs >= range_end - DEFAULT_EPSILON_S {
            continue;
        }
        if cs >= range_start - DEFAULT_EPSILON_S && ce <= range_end + DEFAULT_EPSILON_S {
            result.append_child(clone_node(child)?)?;
            continue;
        }
        if is_transition {
            return Err(Error::CannotTrimTransition);
        }

        let new_s = cs.max(range_start);
        let new_e = ce.min(range_end);
        let cloned = clone_node(child)?;
        let trimmed = item::trimmed_range(child)?;
        let offset = new_s - cs;
        let new_start =
            trimmed.start_time + RationalTime::new(offset, rate).rescaled_to(trimmed.start_time.rate);
        let new_dur = RationalTime::new(new_e - new_s, rate);
        item::set_source_range(&cloned, Some(TimeRange::new(new_start, new_dur.rescaled_to(new_start.rate))))?;
        result.append_child(cloned)?;
    }
    Ok(result)
}

enum DiffOp {
    Keep(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Classic Myers O((N+M)D) shortest-edit-script, specialized to return
/// index-pair operations rather than a line diff.
fn myers_diff(old: &[NodeRef], new: &[NodeRef], eq: &dyn Fn(&NodeRef, &NodeRef) -> bool) -> Vec<DiffOp> {
    let n = old.len() as isize;
    let m = new.len() as isize;
    let max = (n + m).max(1);
    let offset = max;
    let width = (2 * max + 1) as usize;
    let mut v = vec![0isize; width];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    let idx = |k: isize| -> usize { (k + offset) as usize };

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let go_down = k == -d || (k != d && v[idx(k - 1)] < v[idx(k + 1)]);
            let mut x = if go_down { v[idx(k + 1)] } else { v[idx(k - 1)] + 1 };
            let mut y = x - k;
            while x < n && y < m && eq(&old[x as usize], &new[y as usize]) {
                x += 1;
                y += 1;
            }
            v[idx(k)] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    let mut ops = Vec::new();
    let mut x = n;
    let mut y = m;
    for d in (0..trace.len() as isize).rev() {
        let vd = &trace[d as usize];
        let k = x - y;
        let go_down = k == -d || (k != d && vd[idx(k - 1)] < vd[idx(k + 1)]);
        let prev_k = if go_down { k + 1 } else { k - 1 };
        let prev_x = vd[idx(prev_k)];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(DiffOp::Keep((x - 1) as usize, (y - 1) as usize));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                ops.push(DiffOp::Insert((y - 1) as usize));
            } else {
                ops.push(DiffOp::Delete((x - 1) as usize));
            }
            x = prev_x;
            y = prev_y;
        }
    }
    ops.reverse();
    ops
}

/// Diff two Tracks by a caller-supplied equality predicate (typically "same
/// clip name"). Returns a Stack of three Tracks: `added` (new-only items at
/// their new-track offsets, gap-filled), `new` (a clone of the new track),
/// `removed` (old-only items at their old-track offsets, gap-filled).
pub fn track_visual_diff(
    old: &Track,
    new_track: &Track,
    eq: impl Fn(&NodeRef, &NodeRef) -> bool,
) -> Result<Stack> {
    let old_children = old.children()?;
    let new_children = new_track.children()?;
    let ops = myers_diff(&old_children, &new_children, &eq);

    let added = Track::new("added", new_track.kind());
    let removed = Track::new("removed", old.kind());
    let mut cursor_added = 0.0f64;
    let mut cursor_removed = 0.0f64;

    for op in &ops {
        match op {
            DiffOp::Insert(j) => {
                let item_node = &new_children[*j];
                let pos = composition::range_of_child_at_index(new_track.node(), *j)?;
                let start_s = pos.start_time.to_seconds();
                if start_s > cursor_added + DEFAULT_EPSILON_S {
                    let rate = pos.start_time.rate;
                    let gap = RationalTime::new(start_s - cursor_added, rate);
                    added.append_child(Gap::new(String::new(), TimeRange::new(RationalTime::zero(), gap)).node().clone())?;
                }
                added.append_child(clone_node(item_node)?)?;
                cursor_added = pos.end_time_exclusive().to_seconds();
            }
            DiffOp::Delete(i) => {
                let item_node = &old_children[*i];
                let pos = composition::range_of_child_at_index(old.node(), *i)?;
                let start_s = pos.start_time.to_seconds();
                if start_s > cursor_removed + DEFAULT_EPSILON_S {
                    let rate = pos.start_time.rate;
                    let gap = RationalTime::new(start_s - cursor_removed, rate);
                    removed.append_child(Gap::new(String::new(), TimeRange::new(RationalTime::zero(), gap)).node().clone())?;
                }
                removed.append_child(clone_node(item_node)?)?;
                cursor_removed = pos.end_time_exclusive().to_seconds();
            }
            DiffOp::Keep(..) => {}
        }
    }

    let new_clone = Track::from_node(clone_node(new_track.node())?)?;
    let stack = Stack::new(format!("{}.diff", new_track.node().name()));
    stack.append_child(added.node().clone())?;
    stack.append_child(new_clone.node().clone())?;
    stack.append_child(removed.node().clone())?;
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::common::{MediaReference, TrackKind};
    use crate::object::Clip;

    fn clip_with_duration(name: &str, frames: f64) -> NodeRef {
        let clip = Clip::new(name, Some(MediaReference::External {
            target_url: None,
            available_range: Some(TimeRange::from_components(0.0, frames, 24.0)),
            metadata: crate::any::AnyDictionary::new(),
        }));
        clip.node().clone()
    }

    #[test]
    fn s3_stack_flatten_obscures_with_single_track() {
        let track_abc = Track::new("ABC", TrackKind::Video);
        for (n, d) in [("A", 50.0), ("B", 50.0), ("C", 50.0)] {
            track_abc.append_child(clip_with_duration(n, d)).unwrap();
        }
        let track_z = Track::new("Z", TrackKind::Video);
        track_z.append_child(clip_with_duration("Z", 150.0)).unwrap();

        let stack = Stack::new("s");
        stack.append_child(track_abc.node().clone()).unwrap();
        stack.append_child(track_z.node().clone()).unwrap();

        let flat = flatten_stack(&stack).unwrap();
        assert_eq!(flat.duration().unwrap(), RationalTime::new(150.0, 24.0));
    }

    #[test]
    fn track_trim_whole_range_clones() {
        let track = Track::new("t", TrackKind::Video);
        track.append_child(clip_with_duration("A", 50.0)).unwrap();
        let trimmed = track_trimmed_to_range(&track, TimeRange::from_components(0.0, 50.0, 24.0)).unwrap();
        assert_eq!(trimmed.duration().unwrap(), RationalTime::new(50.0, 24.0));
    }
}
