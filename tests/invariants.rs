// Quantified invariants from spec.md's testable-properties section,
// checked over representative sample grids (the full real-valued/frame-range
// quantifiers aren't enumerable, so each test samples a grid wide enough to
// catch a broken implementation).

use reeltime::json::{read_from_string, write_to_string, ReadOptions, WriteOptions};
use reeltime::object::common::{MediaReference, TrackKind};
use reeltime::object::composition::Track;
use reeltime::object::{self, algorithms, nodes_structurally_equal, Clip, Gap, Timeline, Transition, TransitionType};
use reeltime::time::{from_timecode, to_timecode, DropFramePolicy, RationalTime, TimeRange};

const RATES: [f64; 10] = [
    24000.0 / 1001.0,
    24.0,
    25.0,
    30000.0 / 1001.0,
    30.0,
    48000.0 / 1001.0,
    48.0,
    50.0,
    60000.0 / 1001.0,
    60.0,
];

#[test]
fn invariant_1_rational_time_commutative_and_invertible() {
    let values = [0.0, 1.0, 23.0, 1001.0, 48000.0];
    let rates = [24.0, 25.0, 30000.0 / 1001.0, 48.0, 90000.0];
    for &av in &values {
        for &ar in &rates {
            for &bv in &values {
                for &br in &rates {
                    let a = RationalTime::new(av, ar);
                    let b = RationalTime::new(bv, br);
                    assert_eq!(a + b, b + a, "a={a:?} b={b:?}");
                    assert_eq!((a + b) - b, a, "a={a:?} b={b:?}");
                }
            }
        }
    }
}

#[test]
fn invariant_2_timecode_round_trips_every_valid_rate() {
    for &rate in &RATES {
        let policy = if reeltime::time::RationalTime::is_valid_timecode_rate(rate)
            && [30000.0 / 1001.0, 60000.0 / 1001.0].iter().any(|r| (r - rate).abs() < 1e-6)
        {
            DropFramePolicy::InferFromRate
        } else {
            DropFramePolicy::ForceNo
        };
        let max_frame = (24.0 * 3600.0 * rate.ceil()) as i64;
        let samples = [0i64, 1, 59, 3599, 86399, max_frame / 2, (max_frame - 1).max(0)];
        for &n in &samples {
            let t = RationalTime::new(n as f64, rate);
            let tc = to_timecode(t, rate, policy).unwrap();
            let back = from_timecode(&tc, rate).unwrap();
            assert_eq!(back, t, "rate={rate} n={n} tc={tc}");
        }
    }
}

fn sample_timeline() -> Timeline {
    let timeline = Timeline::new("reel one");
    let track = Track::new("V1", TrackKind::Video);
    let clip = Clip::new(
        "shot_010",
        Some(MediaReference::External {
            target_url: Some("file:///shot_010.mov".into()),
            available_range: Some(TimeRange::from_components(0.0, 240.0, 24.0)),
            metadata: Default::default(),
        }),
    );
    track.append_child(clip.node().clone()).unwrap();
    track.append_child(Gap::new("slug", TimeRange::from_components(0.0, 12.0, 24.0)).node().clone()).unwrap();
    track
        .append_child(
            Transition::new(
                "dissolve",
                TransitionType::SmoothCut,
                RationalTime::new(6.0, 24.0),
                RationalTime::new(6.0, 24.0),
            )
            .node()
            .clone(),
        )
        .unwrap();
    let second_clip = Clip::new(
        "shot_020",
        Some(MediaReference::External {
            target_url: Some("file:///shot_020.mov".into()),
            available_range: Some(TimeRange::from_components(0.0, 96.0, 24.0)),
            metadata: Default::default(),
        }),
    );
    track.append_child(second_clip.node().clone()).unwrap();
    timeline.tracks().append_child(track.node().clone()).unwrap();
    timeline.set_global_start_time(Some(RationalTime::new(3600.0, 24.0)));
    timeline
}

#[test]
fn invariant_3_deserialize_of_serialize_is_structurally_equal() {
    let timeline = sample_timeline();
    let json = write_to_string(timeline.node(), &WriteOptions::default()).unwrap();
    let read_back = read_from_string(&json, &ReadOptions::default()).unwrap();
    assert!(nodes_structurally_equal(timeline.node(), &read_back));
}

#[test]
fn invariant_4_range_of_child_matches_range_of_child_at_index() {
    let timeline = sample_timeline();
    let track_node = timeline.tracks().children().unwrap().into_iter().next().unwrap();
    let children = object::composition::children(&track_node).unwrap();
    for child in &children {
        let by_identity = object::composition::range_of_child(&track_node, child).unwrap();
        let index = object::composition::index_of(&track_node, child).unwrap();
        let by_index = object::composition::range_of_child_at_index(&track_node, index).unwrap();
        assert_eq!(by_identity, by_index);
    }
}

#[test]
fn invariant_5_track_trim_duration_matches_requested_range_when_no_transition_split() {
    let track = Track::new("t", TrackKind::Video);
    for name in ["A", "B", "C", "D"] {
        let clip = Clip::new(
            name,
            Some(MediaReference::External {
                target_url: None,
                available_range: Some(TimeRange::from_components(0.0, 50.0, 24.0)),
                metadata: Default::default(),
            }),
        );
        track.append_child(clip.node().clone()).unwrap();
    }
    for range in [
        TimeRange::from_components(0.0, 50.0, 24.0),
        TimeRange::from_components(25.0, 50.0, 24.0),
        TimeRange::from_components(50.0, 100.0, 24.0),
    ] {
        let trimmed = algorithms::track_trimmed_to_range(&track, range).unwrap();
        assert_eq!(trimmed.duration().unwrap(), range.duration, "range={range:?}");
    }
}

#[test]
fn invariant_6_allen_relations_are_mutually_exclusive() {
    let a = TimeRange::from_components(0.0, 10.0, 24.0);

    let cases = [
        ("before", TimeRange::from_components(20.0, 5.0, 24.0)),
        ("meets", TimeRange::from_components(10.0, 5.0, 24.0)),
        ("overlaps", TimeRange::from_components(5.0, 10.0, 24.0)),
        ("begins", TimeRange::from_components(0.0, 20.0, 24.0)),
        ("finishes", TimeRange::from_components(-5.0, 15.0, 24.0)),
        ("contains", TimeRange::from_components(2.0, 5.0, 24.0)),
    ];

    for (label, b) in cases {
        let predicates = [
            ("before", a.before(&b)),
            ("meets", a.meets(&b)),
            ("overlaps", a.overlaps(&b)),
            ("begins", a.begins(&b)),
            ("finishes", a.finishes(&b)),
            ("contains", a.contains(&b)),
        ];
        let true_count = predicates.iter().filter(|(_, v)| *v).count();
        assert_eq!(true_count, 1, "case {label}: predicates={predicates:?}");
        assert!(predicates.iter().any(|(name, v)| *name == label && *v), "case {label}: expected {label} to hold");
    }
}
