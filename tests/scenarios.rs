// End-to-end scenarios from spec.md's testable-properties section,
// exercised through the crate's public API.

use reeltime::object::common::{MediaReference, TrackKind};
use reeltime::object::composition::{Stack, Track};
use reeltime::object::{algorithms, Clip, Gap, Transition, TransitionType};
use reeltime::time::{to_timecode, DropFramePolicy, RationalTime, TimeRange};

fn clip_with_duration(name: &str, frames: f64) -> Clip {
    Clip::new(
        name,
        Some(MediaReference::External {
            target_url: None,
            available_range: Some(TimeRange::from_components(0.0, frames, 24.0)),
            metadata: Default::default(),
        }),
    )
}

#[test]
fn s1_drop_frame_timecode() {
    let t = RationalTime::new(1084319.0, 30000.0 / 1001.0);
    let rate = 30000.0 / 1001.0;
    assert_eq!(to_timecode(t, rate, DropFramePolicy::ForceYes).unwrap(), "10:03:00;05");
    assert_eq!(to_timecode(t, rate, DropFramePolicy::ForceNo).unwrap(), "10:02:23:29");
    assert_eq!(to_timecode(t, rate, DropFramePolicy::InferFromRate).unwrap(), "10:03:00;05");
}

#[test]
fn s2_range_arithmetic_across_rates() {
    let r = TimeRange::new(RationalTime::new(0.0, 24.0), RationalTime::new(24.0, 24.0));
    assert_eq!(r.end_time_exclusive(), RationalTime::new(24.0, 24.0));
    assert_eq!(r.end_time_inclusive(), RationalTime::new(23.0, 24.0));

    let fractional = TimeRange::new(RationalTime::new(0.0, 24.0), RationalTime::new(5.5, 24.0));
    assert_eq!(fractional.end_time_inclusive(), RationalTime::new(5.0, 24.0));
}

#[test]
fn s3_stack_flatten_obscures_either_order() {
    let track_abc = Track::new("ABC", TrackKind::Video);
    for (name, frames) in [("A", 50.0), ("B", 50.0), ("C", 50.0)] {
        track_abc.append_child(clip_with_duration(name, frames).node().clone()).unwrap();
    }
    let track_z = Track::new("Z", TrackKind::Video);
    track_z.append_child(clip_with_duration("Z", 150.0).node().clone()).unwrap();

    let stack_z_on_top = Stack::new("s");
    stack_z_on_top.append_child(track_abc.node().clone()).unwrap();
    stack_z_on_top.append_child(track_z.node().clone()).unwrap();
    let flat = algorithms::flatten_stack(&stack_z_on_top).unwrap();
    let names: Vec<String> = flat.children().unwrap().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["Z"]);

    let track_abc2 = Track::new("ABC", TrackKind::Video);
    for (name, frames) in [("A", 50.0), ("B", 50.0), ("C", 50.0)] {
        track_abc2.append_child(clip_with_duration(name, frames).node().clone()).unwrap();
    }
    let track_z2 = Track::new("Z", TrackKind::Video);
    track_z2.append_child(clip_with_duration("Z", 150.0).node().clone()).unwrap();

    let stack_abc_on_top = Stack::new("s");
    stack_abc_on_top.append_child(track_z2.node().clone()).unwrap();
    stack_abc_on_top.append_child(track_abc2.node().clone()).unwrap();
    let flat2 = algorithms::flatten_stack(&stack_abc_on_top).unwrap();
    let names2: Vec<String> = flat2.children().unwrap().iter().map(|c| c.name()).collect();
    assert_eq!(names2, vec!["A", "B", "C"]);
}

#[test]
fn s4_gap_fill_in() {
    let track_abc = Track::new("ABC", TrackKind::Video);
    for (name, frames) in [("A", 50.0), ("B", 50.0), ("C", 50.0)] {
        track_abc.append_child(clip_with_duration(name, frames).node().clone()).unwrap();
    }

    let track_dge = Track::new("DgE", TrackKind::Video);
    track_dge.append_child(clip_with_duration("D", 50.0).node().clone()).unwrap();
    track_dge
        .append_child(Gap::new("g", TimeRange::from_components(0.0, 50.0, 24.0)).node().clone())
        .unwrap();
    track_dge.append_child(clip_with_duration("E", 50.0).node().clone()).unwrap();

    let stack = Stack::new("s");
    stack.append_child(track_abc.node().clone()).unwrap();
    stack.append_child(track_dge.node().clone()).unwrap();

    let flat = algorithms::flatten_stack(&stack).unwrap();
    let names: Vec<String> = flat.children().unwrap().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["D", "B", "E"]);
}

fn transition(name: &str, in_offset: f64, out_offset: f64) -> Transition {
    Transition::new(
        name,
        TransitionType::SmoothCut,
        RationalTime::new(in_offset, 24.0),
        RationalTime::new(out_offset, 24.0),
    )
}

fn build_s5_track() -> Track {
    let track = Track::new("t", TrackKind::Video);
    track.append_child(clip_with_duration("A", 50.0).node().clone()).unwrap();
    track.append_child(transition("t1", 12.0, 20.0).node().clone()).unwrap();
    track.append_child(clip_with_duration("B", 50.0).node().clone()).unwrap();
    track.append_child(transition("t2", 17.0, 15.0).node().clone()).unwrap();
    track.append_child(clip_with_duration("C", 50.0).node().clone()).unwrap();
    track.append_child(clip_with_duration("D", 50.0).node().clone()).unwrap();
    track
}

#[test]
fn s5_track_trim_into_transition_fails() {
    let track = build_s5_track();
    let err = algorithms::track_trimmed_to_range(&track, TimeRange::from_components(5.0, 50.0, 24.0))
        .unwrap_err();
    assert!(matches!(err, reeltime::Error::CannotTrimTransition));
}

#[test]
fn s5_track_trim_clear_of_transition_succeeds() {
    let track = build_s5_track();
    let trimmed = algorithms::track_trimmed_to_range(&track, TimeRange::from_components(25.0, 50.0, 24.0))
        .unwrap();
    let names: Vec<String> = trimmed.children().unwrap().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["A", "t1", "B"]);

    let kids = trimmed.children().unwrap();
    let a_duration = reeltime::object::item::duration(&kids[0]).unwrap();
    assert_eq!(a_duration, RationalTime::new(25.0, 24.0));
    let b_duration = reeltime::object::item::duration(&kids[2]).unwrap();
    assert_eq!(b_duration, RationalTime::new(25.0, 24.0));
}

#[test]
fn s6_clip_visible_range_durations() {
    let track = Track::new("t", TrackKind::Video);

    let mut clips = Vec::new();
    for name in ["A", "B", "C", "D"] {
        let clip = Clip::new(
            name,
            Some(MediaReference::External {
                target_url: None,
                available_range: Some(TimeRange::from_components(0.0, 52.0, 24.0)),
                metadata: Default::default(),
            }),
        );
        reeltime::object::item::set_source_range(
            clip.node(),
            Some(TimeRange::from_components(1.0, 50.0, 24.0)),
        )
        .unwrap();
        clips.push(clip);
    }

    track.append_child(clips[0].node().clone()).unwrap();
    track.append_child(transition("t1", 7.0, 10.0).node().clone()).unwrap();
    track.append_child(clips[1].node().clone()).unwrap();
    track.append_child(transition("t2", 17.0, 15.0).node().clone()).unwrap();
    track.append_child(clips[2].node().clone()).unwrap();
    track.append_child(clips[3].node().clone()).unwrap();

    assert_eq!(clips[0].visible_range().unwrap().duration, RationalTime::new(60.0, 24.0));
    assert_eq!(clips[1].visible_range().unwrap().duration, RationalTime::new(72.0, 24.0));
    assert_eq!(clips[2].visible_range().unwrap().duration, RationalTime::new(67.0, 24.0));
    assert_eq!(clips[3].visible_range().unwrap().duration, RationalTime::new(50.0, 24.0));
}
