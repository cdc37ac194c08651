//! Property tests for column addressing and pipeline ordering

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use xlsxstream::fast_writer::{BufferPool, OrderedPipeline, RowEncoder};
use xlsxstream::{column_label, encode_row, CancelToken, Row, MAX_COLUMNS};

fn label_to_index(label: &str) -> usize {
    label
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize)
        - 1
}

#[test]
fn column_labels_are_unique_across_the_sheet() {
    let mut seen = HashSet::with_capacity(MAX_COLUMNS);
    for index in 0..MAX_COLUMNS {
        assert!(seen.insert(column_label(index)), "duplicate label at {index}");
    }
}

proptest! {
    #[test]
    fn column_label_is_bijective(index in 0usize..1_000_000) {
        let label = column_label(index);
        prop_assert!(label.bytes().all(|b| b.is_ascii_uppercase()));
        prop_assert_eq!(label_to_index(&label), index);
    }

    #[test]
    fn column_label_length_tracks_range(index in 0usize..MAX_COLUMNS) {
        let expected = match index {
            0..=25 => 1,
            26..=701 => 2,
            _ => 3,
        };
        prop_assert_eq!(column_label(index).len(), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn pipeline_output_depends_only_on_input_order(
        rows in prop::collection::vec(
            prop::collection::vec("[ -~]{0,12}", 0..6),
            0..120,
        ),
        workers in 1usize..9,
        queue_depth in 1usize..16,
        start in 1u32..1000,
    ) {
        let mut expected = Vec::new();
        for (offset, row) in rows.iter().enumerate() {
            expected.extend(encode_row(start + offset as u32, row).unwrap());
        }

        let pool = Arc::new(BufferPool::new(workers * 2, 256));
        let pipeline = OrderedPipeline::new(RowEncoder::default(), pool, workers, queue_depth);
        let mut sink = Vec::new();
        let input: Vec<Row> = rows.clone();
        let committed = pipeline.run(&mut sink, start, input, &CancelToken::new());

        prop_assert_eq!(committed.result.unwrap(), rows.len());
        prop_assert_eq!(committed.next_row, start + rows.len() as u32);
        prop_assert_eq!(sink, expected);
    }
}
