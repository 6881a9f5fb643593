use std::collections::BTreeMap;

use chrono::Duration;

use crate::{Exercise, ExerciseID, ExerciseTree, RepsConfig, SetEntry, WeightConfig, WeightUnit};

pub const KG_TO_LB: f64 = 2.20462;
pub const BODYWEIGHT_LB: f64 = 150.0;
pub const EPLEY_COEFFICIENT: f64 = 0.0333;
pub const EXPERIENCE_FACTOR: f64 = 0.833;
pub const VOLUME_DIVISOR: f64 = 800.0;
pub const CARDIO_SECONDS_PER_POINT: f64 = 275.0;
/// Effort credited for a logged set of a weighted exercise that was entered without load.
pub const PROXY_LOAD_LB: f64 = 50.0;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Score {
    pub total_volume: f64,
    pub total_sets: u32,
    pub cardio_seconds: u64,
    pub elapsed_minutes: i64,
    pub added_exp: u64,
    pub one_rep_maxes: BTreeMap<ExerciseID, f64>,
}

/// Scores a finished tree. Pure in `tree` and `elapsed`.
#[must_use]
pub fn score(tree: &ExerciseTree, elapsed: Duration) -> Score {
    let mut result = Score {
        elapsed_minutes: elapsed.num_minutes().max(0),
        ..Score::default()
    };

    for exercise in tree.exercises() {
        for entry in exercise.loggable_entries() {
            result.total_sets += 1;
            let Some(reps) = entry.reps else {
                continue;
            };
            if exercise.reps_config == RepsConfig::CardioDuration {
                result.cardio_seconds += u64::from(u32::from(reps));
            } else {
                result.total_volume +=
                    normalized_weight(exercise, &entry) * exercise.reps_config.normalized(reps);
            }
        }
        if let Some(one_rep_max) = exercise_one_rep_max(exercise) {
            result.one_rep_maxes.insert(exercise.id, one_rep_max);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let points = result.elapsed_minutes as f64
        * EXPERIENCE_FACTOR
        * result.total_volume
        * f64::from(result.total_sets)
        / VOLUME_DIVISOR
        + result.cardio_seconds as f64 / CARDIO_SECONDS_PER_POINT;
    result.added_exp = whole_points(points);
    result
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_points(points: f64) -> u64 {
    points.floor().max(0.0) as u64
}

/// Load of a set in pounds as used for volume.
#[must_use]
pub fn normalized_weight(exercise: &Exercise, entry: &SetEntry) -> f64 {
    let extra = entry.weight.map_or(0.0, |w| {
        to_pounds(
            exercise.weight_config.total_load(w, exercise.weight_unit),
            exercise.weight_unit,
        )
    });
    match exercise.weight_config {
        WeightConfig::Bodyweight => BODYWEIGHT_LB,
        WeightConfig::BodyweightPlusExtra => BODYWEIGHT_LB + extra,
        _ if extra > 0.0 => extra,
        _ => PROXY_LOAD_LB,
    }
}

#[must_use]
pub fn to_pounds(load: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Pounds => load,
        WeightUnit::Kilograms => load * KG_TO_LB,
    }
}

/// Epley estimate of the maximum single-repetition load.
#[must_use]
pub fn one_rep_max(load: f64, reps: u32) -> f64 {
    load * (1.0 + EPLEY_COEFFICIENT * f64::from(reps))
}

/// Highest estimate over the logged sets, in the exercise's own unit.
#[must_use]
pub fn exercise_one_rep_max(exercise: &Exercise) -> Option<f64> {
    if exercise.reps_config != RepsConfig::Repetitions
        || !exercise.weight_config.accepts_weight()
    {
        return None;
    }
    exercise
        .loggable_entries()
        .filter_map(|entry| {
            Some(one_rep_max(
                exercise.displayed_load(entry.key)?,
                entry.reps?.into(),
            ))
        })
        .reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{Field, Name, SetKey};

    fn name(value: &str) -> Name {
        Name::new(value).unwrap()
    }

    fn log(tree: &mut ExerciseTree, id: ExerciseID, key: SetKey, weight: &str, reps: &str) {
        if !weight.is_empty() {
            tree.update_field(&id, Some(&key), Field::Weight(weight.into()))
                .unwrap();
        }
        tree.update_field(&id, Some(&key), Field::Reps(reps.into()))
            .unwrap();
    }

    fn bench_and_incline() -> (ExerciseTree, ExerciseID, ExerciseID) {
        let mut tree = ExerciseTree::new();
        let bench = tree
            .add_named_exercise(name("Bench Press"), None, WeightUnit::Pounds)
            .unwrap();
        let incline = tree
            .add_named_exercise(name("Incline Press"), Some(bench), WeightUnit::Pounds)
            .unwrap();
        tree.update_field(
            &incline,
            None,
            Field::WeightConfig(WeightConfig::PerSidePlusBar),
        )
        .unwrap();
        log(&mut tree, bench, SetKey::set(1), "135", "10");
        log(&mut tree, incline, SetKey::set(1), "45", "8");
        (tree, bench, incline)
    }

    #[test]
    fn test_bench_and_incline_scenario() {
        let (tree, bench, incline) = bench_and_incline();
        assert_eq!(tree.displayed_load(&incline, &SetKey::set(1)), Some(135.0));
        let result = score(&tree, Duration::minutes(30));
        assert_approx_eq!(result.one_rep_maxes[&bench], 179.955);
        assert_approx_eq!(result.one_rep_maxes[&incline], 135.0 * (1.0 + 0.0333 * 8.0));
        assert_approx_eq!(result.total_volume, 135.0 * 10.0 + 135.0 * 8.0);
        assert_eq!(result.total_sets, 2);
        assert_eq!(result.elapsed_minutes, 30);
        // 30 * 0.833 * 2430 * 2 / 800 = 151.81
        assert_eq!(result.added_exp, 151);
    }

    #[test]
    fn test_score_deterministic() {
        let (tree, _, _) = bench_and_incline();
        assert_eq!(
            score(&tree, Duration::seconds(1234)),
            score(&tree, Duration::seconds(1234))
        );
    }

    #[test]
    fn test_score_partial_minutes_are_floored() {
        let (tree, _, _) = bench_and_incline();
        assert_eq!(score(&tree, Duration::seconds(59)).added_exp, 0);
        assert_eq!(
            score(&tree, Duration::seconds(119)),
            score(&tree, Duration::seconds(60))
        );
    }

    #[test]
    fn test_score_excludes_unloggable_sets() {
        let (mut tree, bench, _) = bench_and_incline();
        tree.add_set(&bench).unwrap();
        tree.update_field(&bench, Some(&SetKey::set(2)), Field::Weight("200".into()))
            .unwrap();
        let result = score(&tree, Duration::minutes(30));
        assert_eq!(result.total_sets, 2);
        assert_approx_eq!(result.one_rep_maxes[&bench], 179.955);
    }

    #[test]
    fn test_score_includes_drop_sets() {
        let (mut tree, bench, _) = bench_and_incline();
        let drop_set = tree.add_drop_set(&bench, &SetKey::set(1)).unwrap();
        log(&mut tree, bench, drop_set, "95", "6");
        let result = score(&tree, Duration::minutes(10));
        assert_eq!(result.total_sets, 3);
        assert_approx_eq!(result.total_volume, 1350.0 + 1080.0 + 570.0);
    }

    #[test]
    fn test_score_cardio() {
        let mut tree = ExerciseTree::new();
        let run = tree
            .add_named_exercise(name("Run"), None, WeightUnit::Pounds)
            .unwrap();
        tree.update_field(&run, None, Field::RepsConfig(RepsConfig::CardioDuration))
            .unwrap();
        log(&mut tree, run, SetKey::set(1), "", "0:45:50");
        let result = score(&tree, Duration::minutes(46));
        assert_eq!(result.cardio_seconds, 2750);
        assert_approx_eq!(result.total_volume, 0.0);
        assert_eq!(result.total_sets, 1);
        assert_eq!(result.added_exp, 10);
        assert!(result.one_rep_maxes.is_empty());
    }

    #[rstest]
    #[case::total_weight(WeightConfig::TotalWeight, WeightUnit::Pounds, "100", 100.0)]
    #[case::kilograms(WeightConfig::TotalWeight, WeightUnit::Kilograms, "100", 220.462)]
    #[case::per_side(WeightConfig::PerSide, WeightUnit::Pounds, "25", 50.0)]
    #[case::per_side_plus_bar(WeightConfig::PerSidePlusBar, WeightUnit::Kilograms, "10", 88.1848)]
    #[case::bodyweight(WeightConfig::Bodyweight, WeightUnit::Kilograms, "", 150.0)]
    #[case::bodyweight_plus_extra(WeightConfig::BodyweightPlusExtra, WeightUnit::Pounds, "25", 175.0)]
    #[case::zero_load_proxy(WeightConfig::TotalWeight, WeightUnit::Pounds, "0", 50.0)]
    fn test_normalized_weight(
        #[case] weight_config: WeightConfig,
        #[case] weight_unit: WeightUnit,
        #[case] weight: &str,
        #[case] expected: f64,
    ) {
        let mut tree = ExerciseTree::new();
        let id = tree
            .add_named_exercise(name("Lift"), None, weight_unit)
            .unwrap();
        tree.update_field(&id, None, Field::WeightConfig(weight_config))
            .unwrap();
        log(&mut tree, id, SetKey::set(1), weight, "5");
        let exercise = tree.get(&id).unwrap();
        let entry = exercise.entry(&SetKey::set(1)).unwrap();
        assert_approx_eq!(normalized_weight(exercise, &entry), expected);
    }

    #[test]
    fn test_one_rep_max_timed_exercise() {
        let mut tree = ExerciseTree::new();
        let id = tree
            .add_named_exercise(name("Plank"), None, WeightUnit::Pounds)
            .unwrap();
        tree.update_field(&id, None, Field::RepsConfig(RepsConfig::Time))
            .unwrap();
        log(&mut tree, id, SetKey::set(1), "10", "1:00");
        assert_eq!(exercise_one_rep_max(tree.get(&id).unwrap()), None);
        assert_approx_eq!(score(&tree, Duration::minutes(1)).total_volume, 600.0);
    }
}
