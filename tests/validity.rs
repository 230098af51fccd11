use ocean_engine::{screen_answers, AnswerMap, ValidityFlag, ValidityParams};

fn answers(values: &[i64]) -> AnswerMap {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (format!("q{i}"), v))
        .collect()
}

#[test]
fn all_identical_answers_are_flagged_uniform() {
    for v in 1..=5 {
        let report = screen_answers(&answers(&[v; 20]), &ValidityParams::default());
        assert_eq!(report.flag, Some(ValidityFlag::Uniform));
        assert_eq!(report.distinct_values, 1);
        assert_eq!(report.stddev, Some(0.0));
    }
}

#[test]
fn single_answer_is_uniform() {
    let report = screen_answers(&answers(&[4]), &ValidityParams::default());
    assert_eq!(report.flag, Some(ValidityFlag::Uniform));
}

#[test]
fn low_variance_is_flagged() {
    // mean 3.1, variance 0.09, stddev 0.3
    let values = [3, 3, 3, 3, 3, 3, 3, 3, 3, 4];
    let report = screen_answers(&answers(&values), &ValidityParams::default());
    assert_eq!(report.flag, Some(ValidityFlag::LowVariance));
    assert_eq!(report.distinct_values, 2);
    assert!((report.stddev.unwrap() - 0.3).abs() < 1e-12);
}

#[test]
fn stddev_at_threshold_is_not_flagged() {
    // mean 2.5, stddev exactly 0.5
    let report = screen_answers(&answers(&[2, 3]), &ValidityParams::default());
    assert_eq!(report.stddev, Some(0.5));
    assert!(!report.is_invalid());
}

#[test]
fn alternating_extremes_pass() {
    let values: Vec<i64> = (0..180).map(|i| if i % 2 == 0 { 1 } else { 5 }).collect();
    let report = screen_answers(&answers(&values), &ValidityParams::default());
    assert!(!report.is_invalid());
    assert_eq!(report.mean, Some(3.0));
    assert_eq!(report.stddev, Some(2.0));
}

#[test]
fn empty_answers_are_not_flagged() {
    let report = screen_answers(&AnswerMap::new(), &ValidityParams::default());
    assert!(!report.is_invalid());
    assert_eq!(report.distinct_values, 0);
    assert_eq!(report.mean, None);
    assert_eq!(report.stddev, None);
}

#[test]
fn threshold_is_configurable() {
    let strict = ValidityParams { min_stddev: 2.5 };
    let values: Vec<i64> = (0..10).map(|i| if i % 2 == 0 { 1 } else { 5 }).collect();
    let report = screen_answers(&answers(&values), &strict);
    assert_eq!(report.flag, Some(ValidityFlag::LowVariance));
}
