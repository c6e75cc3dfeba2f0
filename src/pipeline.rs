//! The straight-line walkthrough: a synthetic sanity check, then the real recording.
//!
//! Both experiments start from the same initial parameters, saved once as a snapshot and
//! reloaded before each run together with a fresh optimizer.

use log::info;
use machine_learning::{
    evaluation::{Class, Evaluation},
    training::LossTrace,
};
use ndarray::Array1;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    classifier::P300Classifier,
    config::{EegConfig, PipelineConfig},
    eeg::EegSamples,
    error::{PipelineErr, Result},
    report::{EegReport, Reporter, SyntheticReport, WeightsReport},
    synthetic::SyntheticData,
};

/// What the synthetic run produced.
#[derive(Debug, Clone)]
pub struct SyntheticOutcome {
    pub loss: LossTrace,
    pub positive_test: Evaluation,
    pub negative_test: Evaluation,
    pub mean_positive: Array1<f32>,
    pub mean_negative: Array1<f32>,
}

/// What the real data run produced.
#[derive(Debug, Clone)]
pub struct EegOutcome {
    pub loss: LossTrace,
    pub times: Vec<f32>,
    pub positive_test: Evaluation,
    pub negative_test: Evaluation,
    /// Every negative epoch left out of both training and testing.
    pub negative_rest: Evaluation,
    pub mean_positive: Array1<f32>,
    pub mean_negative: Array1<f32>,
}

pub struct Pipeline {
    config: PipelineConfig,
    classifier: P300Classifier,
}

impl Pipeline {
    /// Validates `config`, builds the classifier and saves its initial parameters.
    ///
    /// # Errors
    /// `PipelineErr::InvalidConfig` if the configuration doesn't validate, or whatever building
    /// the classifier or writing the snapshot fails with.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let classifier = P300Classifier::from_config(&config)?;
        info!(
            "built {} with {} parameters",
            classifier.model().describe(),
            classifier.params().len()
        );

        classifier.save_snapshot(&config.snapshot_path)?;
        Ok(Self { config, classifier })
    }

    /// Trains on freshly generated synthetic data and scores both held-out sets.
    pub fn run_synthetic(&mut self) -> Result<SyntheticOutcome> {
        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let data = SyntheticData::generate(&config.synthetic, config.sample_length, &mut rng)?;

        info!("synthetic run: {} training samples", data.train.len());
        self.classifier.reload(&config.snapshot_path)?;
        let loss = self.classifier.train(
            &data.train,
            config.synthetic.iterations,
            config.learning_rate,
            config.adam,
        )?;

        let positive_test = self
            .classifier
            .evaluate(data.test_positives.view(), config.threshold)?;
        let negative_test = self
            .classifier
            .evaluate(data.test_negatives.view(), config.threshold)?;
        log_scores("synthetic positives", &positive_test, Class::Positive);
        log_scores("synthetic negatives", &negative_test, Class::Negative);

        let (mean_positive, mean_negative) = data.class_means();

        Ok(SyntheticOutcome {
            loss,
            positive_test,
            negative_test,
            mean_positive,
            mean_negative,
        })
    }

    /// Trains on the real epochs and scores the test sets and the remaining negatives.
    ///
    /// # Errors
    /// `PipelineErr::InvalidConfig` if the epochs aren't as wide as the classifier's input.
    pub fn run_eeg(&mut self, eeg: &EegConfig, samples: &EegSamples) -> Result<EegOutcome> {
        if samples.width() != self.config.sample_length {
            return Err(PipelineErr::InvalidConfig(format!(
                "epochs hold {} samples but sample_length is {}",
                samples.width(),
                self.config.sample_length
            )));
        }

        let splits = samples.split(&eeg.splits)?;
        let threshold = self.config.threshold;

        info!("eeg run: {} training epochs", splits.train.len());
        self.classifier.reload(&self.config.snapshot_path)?;
        let loss = self.classifier.train(
            &splits.train,
            eeg.iterations,
            self.config.learning_rate,
            self.config.adam,
        )?;

        let positive_test = self
            .classifier
            .evaluate(splits.positive_test.view(), threshold)?;
        let negative_test = self
            .classifier
            .evaluate(splits.negative_test.view(), threshold)?;
        let negative_rest = self
            .classifier
            .evaluate(splits.negative_rest.view(), threshold)?;
        log_scores("eeg positives", &positive_test, Class::Positive);
        log_scores("eeg negatives", &negative_test, Class::Negative);
        log_scores("remaining eeg negatives", &negative_rest, Class::Negative);

        Ok(EegOutcome {
            loss,
            times: samples.times.clone(),
            positive_test,
            negative_test,
            negative_rest,
            mean_positive: samples.mean_positive.clone(),
            mean_negative: samples.mean_negative.clone(),
        })
    }

    /// Runs every stage in order, writing the reports of each one as soon as it ends.
    pub fn run(&mut self, reporter: &Reporter) -> Result<()> {
        let outcome = self.run_synthetic()?;
        reporter.write("synthetic", &SyntheticReport::new(&outcome))?;
        self.write_weights(reporter, "synthetic_weights")?;

        let Some(eeg) = self.config.eeg.clone() else {
            info!("no eeg section configured, skipping the real data run");
            return Ok(());
        };

        let samples = EegSamples::load(&eeg)?;
        let outcome = self.run_eeg(&eeg, &samples)?;
        reporter.write("eeg", &EegReport::new(&outcome))?;
        self.write_weights(reporter, "eeg_weights")?;

        Ok(())
    }

    fn write_weights(&self, reporter: &Reporter, name: &str) -> Result<()> {
        let report = WeightsReport::new(
            self.classifier.model().describe(),
            &self.classifier.layer_weights()?,
        );
        reporter.write_compact(name, &report)?;
        Ok(())
    }
}

fn log_scores(what: &str, evaluation: &Evaluation, expected: Class) {
    info!(
        "{what}: average score {:.4}, {}/{} classified correctly ({:.1}%)",
        evaluation.mean_score(),
        evaluation.correct(expected),
        evaluation.len(),
        100. * evaluation.accuracy(expected)
    );
}
