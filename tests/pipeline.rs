use std::{env, fs, path::PathBuf};

use ndarray::Array2;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Uniform};

use p300_learner::{
    P300Classifier, Pipeline, PipelineConfig, PipelineErr,
    config::{AdamConfig, EegConfig, SplitConfig, SyntheticConfig},
    eeg::{ChannelInfo, ChannelKind, Recording},
    report::Reporter,
    synthetic::SyntheticData,
};

fn temp_path(name: &str) -> PathBuf {
    env::temp_dir().join(format!("p300_learner_{name}"))
}

fn synthetic_config(name: &str) -> PipelineConfig {
    let mut config = PipelineConfig {
        snapshot_path: temp_path(&format!("{name}.safetensors")),
        report_dir: temp_path(&format!("{name}_reports")),
        eeg: None,
        ..PipelineConfig::default()
    };
    config.synthetic.sample_count = 120;
    config
}

#[test]
fn scores_are_probabilities_for_any_input() {
    let mut classifier = P300Classifier::new(226, [500, 1000, 100, 10], 100).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let dist = Uniform::new(-50., 50.).unwrap();
    let x = Array2::from_shape_simple_fn((6, 226), || dist.sample(&mut rng));

    let y = classifier.predict(x.view()).unwrap();

    assert_eq!(y.dim(), (6, 1));
    assert!(y.iter().all(|v| (0. ..=1.).contains(v)));
}

#[test]
fn synthetic_run_learns() {
    let config = synthetic_config("synthetic_run");
    let snapshot = config.snapshot_path.clone();
    let mut pipeline = Pipeline::new(config).unwrap();

    let outcome = pipeline.run_synthetic().unwrap();
    let _ = fs::remove_file(&snapshot);

    assert_eq!(outcome.loss.len(), 100);
    assert!(outcome.loss.tail_mean(10).unwrap() < outcome.loss.head_mean(10).unwrap());
    assert!(outcome.positive_test.mean_score() > outcome.negative_test.mean_score());
    assert_eq!(outcome.positive_test.len(), 10);
    assert_eq!(outcome.negative_test.len(), 10);
}

#[test]
fn snapshot_restores_the_initial_state() {
    let path = temp_path("initial_state.safetensors");
    let hidden = [32, 64, 16, 4];

    let mut original = P300Classifier::new(226, hidden, 100).unwrap();
    original.save_snapshot(&path).unwrap();

    let mut reloaded = P300Classifier::new(226, hidden, 7).unwrap();
    reloaded.reload(&path).unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let dist = Uniform::new(0., 1.).unwrap();
    let x = Array2::from_shape_simple_fn((12, 226), || dist.sample(&mut rng));

    assert_eq!(reloaded.params(), original.params());
    assert_eq!(
        reloaded.predict(x.view()).unwrap(),
        original.predict(x.view()).unwrap()
    );

    // Training moves the parameters away, reloading brings them back.
    let synthetic = SyntheticConfig {
        sample_count: 8,
        ..SyntheticConfig::default()
    };
    let data = SyntheticData::generate(&synthetic, 226, &mut rng).unwrap();
    reloaded.train(&data.train, 3, 1e-3, AdamConfig::default()).unwrap();
    assert_ne!(reloaded.params(), original.params());

    reloaded.reload(&path).unwrap();
    let _ = fs::remove_file(&path);
    assert_eq!(reloaded.params(), original.params());
}

#[test]
fn mismatched_snapshot_is_rejected() {
    let path = temp_path("mismatched.safetensors");

    P300Classifier::new(20, [8, 8, 4, 2], 1)
        .unwrap()
        .save_snapshot(&path)
        .unwrap();
    let result = P300Classifier::new(20, [8, 8, 4, 3], 1).unwrap().reload(&path);
    let _ = fs::remove_file(&path);

    assert!(result.is_err());
}

const SFREQ: f32 = 20.;
const FIRST_SAMP: usize = 500;
const P300_EVENTS: usize = 14;
const OTHER_EVENTS: usize = 20;

/// A recording with a positive deflection on `EEG 058` a few samples after every id 5 event, and
/// the matching event file.
fn write_recording(name: &str) -> (PathBuf, PathBuf) {
    let n = 1500;
    let mut rng = StdRng::seed_from_u64(5);
    let noise = Uniform::new(-1e-6, 1e-6).unwrap();
    let mut data = Array2::from_shape_simple_fn((3, n), || noise.sample(&mut rng));

    let mut events = String::new();
    for k in 0..P300_EVENTS + OTHER_EVENTS {
        let at = 20 + 40 * k;
        let id = if k < 2 * P300_EVENTS && k % 2 == 0 {
            5
        } else {
            1 + (k % 4) as u32
        };

        if id == 5 {
            for t in at + 4..at + 10 {
                data[[1, t]] += 3e-5;
            }
        }
        events.push_str(&format!("{} 0 {id}\n", FIRST_SAMP + at));
    }

    let recording = Recording::new(
        SFREQ,
        FIRST_SAMP,
        vec![
            ChannelInfo::new("EEG 001", ChannelKind::Eeg),
            ChannelInfo::new("EEG 058", ChannelKind::Eeg),
            ChannelInfo::new("EOG 061", ChannelKind::Eog),
        ],
        Vec::new(),
        data,
    )
    .unwrap();

    let raw_path = temp_path(&format!("{name}_raw.safetensors"));
    let events_path = temp_path(&format!("{name}-eve.txt"));
    recording.save(&raw_path).unwrap();
    fs::write(&events_path, events).unwrap();

    (raw_path, events_path)
}

#[test]
fn full_walkthrough_on_a_recording() {
    let (raw_path, events_path) = write_recording("walkthrough");

    let mut config = synthetic_config("walkthrough");
    config.hidden = [16, 16, 8, 4];
    // Window -0.5..=1.0 s at 20 Hz.
    config.sample_length = 31;
    config.synthetic.iterations = 20;
    config.eeg = Some(EegConfig {
        raw_path: raw_path.clone(),
        events_path: events_path.clone(),
        splits: SplitConfig {
            positive_train: 0..8,
            positive_test: 8..12,
            negative_train: 4..12,
            negative_test: 12..16,
        },
        iterations: 30,
        ..EegConfig::default()
    });

    let snapshot = config.snapshot_path.clone();
    let reporter = Reporter::new(&config.report_dir).unwrap();
    let mut pipeline = Pipeline::new(config).unwrap();
    pipeline.run(&reporter).unwrap();

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(reporter.dir().join("eeg.json")).unwrap())
            .unwrap();
    let synthetic_exists = reporter.dir().join("synthetic.json").exists();
    let weights_exist = reporter.dir().join("eeg_weights.json").exists();

    let _ = fs::remove_dir_all(reporter.dir());
    for path in [raw_path, events_path, snapshot] {
        let _ = fs::remove_file(path);
    }

    assert!(synthetic_exists);
    assert!(weights_exist);
    assert_eq!(report["loss"].as_array().unwrap().len(), 30);
    assert_eq!(report["times"].as_array().unwrap().len(), 31);
    assert_eq!(report["positive_test"]["total"].as_u64(), Some(4));
    assert_eq!(report["negative_test"]["total"].as_u64(), Some(4));
    // 20 other epochs minus the 8 training and 4 test ones.
    assert_eq!(report["negative_rest"]["total"].as_u64(), Some(8));
}

#[test]
fn epoch_width_must_match_the_classifier() {
    let (raw_path, events_path) = write_recording("width_mismatch");

    let mut config = synthetic_config("width_mismatch");
    config.hidden = [8, 8, 4, 2];
    config.sample_length = 30;
    config.synthetic.iterations = 1;
    config.eeg = Some(EegConfig {
        raw_path: raw_path.clone(),
        events_path: events_path.clone(),
        splits: SplitConfig {
            positive_train: 0..2,
            positive_test: 2..3,
            negative_train: 0..2,
            negative_test: 2..3,
        },
        ..EegConfig::default()
    });

    let snapshot = config.snapshot_path.clone();
    let reporter = Reporter::new(&config.report_dir).unwrap();
    let result = Pipeline::new(config).and_then(|mut pipeline| pipeline.run(&reporter));

    let _ = fs::remove_dir_all(reporter.dir());
    for path in [raw_path, events_path, snapshot] {
        let _ = fs::remove_file(path);
    }

    assert!(matches!(result, Err(PipelineErr::InvalidConfig(_))));
}
