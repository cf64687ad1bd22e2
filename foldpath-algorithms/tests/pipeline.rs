use std::convert::Infallible;

use foldpath_algorithms::{
    classify_windows, summarize, ContactClusterer, FrameEvaluator, SummaryWindows,
};
use foldpath_core::{
    ClustererConfig, ContactRow, Coordinate, EvaluatorConfig, Frame, NativeContactMap,
    SummaryConfig,
};

const HELIX_A: [(u32, u32); 3] = [(1, 10), (2, 11), (3, 12)];
const HELIX_B: [(u32, u32); 2] = [(40, 50), (41, 51)];

fn native_map() -> NativeContactMap {
    let rows = HELIX_A
        .iter()
        .chain(&HELIX_B)
        .map(|&(i, j)| ContactRow::new(i, j, 1.0, 1.0, 5.0));
    NativeContactMap::from_rows(rows).unwrap()
}

/// Places every contact partner either at distance 1 (formed) or 50 (broken).
fn frame(number: u64, a_formed: bool, b_formed: bool) -> Frame {
    let mut frame = Frame::new(number);
    let mut place = |pairs: &[(u32, u32)], formed: bool| {
        for &(i, j) in pairs {
            let x = f64::from(i) * 100.0;
            frame.insert(i, Coordinate::new(x, 0.0, 0.0));
            let offset = if formed { 1.0 } else { 50.0 };
            frame.insert(j, Coordinate::new(x + offset, 0.0, 0.0));
        }
    };
    place(&HELIX_A, a_formed);
    place(&HELIX_B, b_formed);
    frame
}

fn run(frames: Vec<Frame>, window_size: usize) -> foldpath_core::ClassificationResult {
    let clusterer = ContactClusterer::new(
        ClustererConfig::new()
            .with_cluster_count(2)
            .with_min_cluster_size(1),
    )
    .unwrap();
    let map = clusterer.cluster(&native_map()).unwrap();
    assert_eq!(map.cluster_ids(), vec![1, 2]);

    let evaluator = FrameEvaluator::new(map, EvaluatorConfig::new()).unwrap();
    let records = evaluator
        .evaluate_stream(frames.into_iter().map(Ok::<_, Infallible>))
        .with_chunk_size(3)
        .map(|record| match record {
            Ok(record) => record,
            Err(never) => match never {},
        });

    let config = SummaryConfig::new()
        .with_window_size(window_size)
        .with_binarize_cutoff(0.5);
    let windows = SummaryWindows::new(records, config)
        .unwrap()
        .collect::<foldpath_core::Result<Vec<_>>>()
        .unwrap();
    classify_windows(&windows).unwrap()
}

#[test]
fn test_end_to_end_formation_order() {
    let frames = (1..=8).map(|n| frame(n, true, n >= 5)).collect();
    let result = run(frames, 2);

    assert_eq!(result.order, vec![1, 2]);
    assert_eq!(result.break_index(1), Some(0));
    assert_eq!(result.break_index(2), Some(2));
}

#[test]
fn test_end_to_end_refolding_uses_last_formation() {
    // B forms early, unfolds, then refolds for good; A forms late
    let frames = (1..=8)
        .map(|n| frame(n, n >= 3, matches!(n, 1 | 2 | 7 | 8)))
        .collect();
    let result = run(frames, 2);

    assert_eq!(result.break_index(1), Some(1));
    assert_eq!(result.break_index(2), Some(3));
    assert_eq!(result.order, vec![1, 2]);
}

#[test]
fn test_end_to_end_unfolded_cluster_never_formed() {
    let frames = (1..=6).map(|n| frame(n, true, n <= 2)).collect();
    let result = run(frames, 2);

    assert_eq!(result.order, vec![1]);
    assert_eq!(result.never_formed, vec![2]);
}

#[test]
fn test_q_tracks_formed_fraction() {
    let map = ContactClusterer::new(ClustererConfig::new().with_min_cluster_size(1))
        .unwrap()
        .cluster(&native_map())
        .unwrap();
    let evaluator = FrameEvaluator::new(map, EvaluatorConfig::new()).unwrap();

    let records = evaluator.evaluate_all(&[frame(1, true, false), frame(2, false, true)]);
    assert!((records[0].q - 0.6).abs() < 1e-12);
    assert!((records[1].q - 0.4).abs() < 1e-12);
    assert_eq!(records[0].formed, HELIX_A.to_vec());

    let windows = summarize(records, &SummaryConfig::new().with_window_size(2)).unwrap();
    assert_eq!(windows.len(), 1);
    assert!((windows[0].values[&1] - 0.5).abs() < 1e-12);
    assert!((windows[0].values[&2] - 0.5).abs() < 1e-12);
}
