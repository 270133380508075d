//! Wall-clock timing of the algorithm phases

use std::time::Instant;

use crate::adapters::{AdapterInput, CallArgs};
use crate::algorithm::Algorithm;
use crate::data_types::ExecutionPhase;
use crate::{Error, Result};

/// Durations (seconds) of one phase; pre/post-processing are absent when not configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Times {
    phase: ExecutionPhase,
    preprocess_time: Option<f64>,
    main_time: f64,
    postprocess_time: Option<f64>,
}

fn timed<T>(step: impl FnOnce() -> Result<T>) -> Result<(T, f64)> {
    let start = Instant::now();
    let value = step()?;
    Ok((value, start.elapsed().as_secs_f64()))
}

impl Times {
    /// Run preprocessing and training, timing each.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing step.
    pub fn from_train_algorithm(
        algorithm: &Algorithm,
        input: AdapterInput,
        args: &CallArgs,
    ) -> Result<Self> {
        let (input, preprocess_time) = preprocess(algorithm, input, args)?;
        let ((), main_time) = timed(|| algorithm.main().train(&input, args))?;
        Ok(Self {
            phase: ExecutionPhase::Train,
            preprocess_time,
            main_time,
            postprocess_time: None,
        })
    }

    /// Run preprocessing, execution and postprocessing, timing each.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing step.
    pub fn from_execute_algorithm(
        algorithm: &Algorithm,
        input: AdapterInput,
        args: &CallArgs,
    ) -> Result<(Vec<f64>, Self)> {
        let (input, preprocess_time) = preprocess(algorithm, input, args)?;
        let (scores, main_time) = timed(|| algorithm.main().execute(&input, args))?;
        let (scores, postprocess_time) = match algorithm.postprocess() {
            Some(transform) => {
                let (scores, elapsed) =
                    timed(|| transform(scores, args).map_err(Error::Adapter))?;
                (scores, Some(elapsed))
            }
            None => (scores, None),
        };
        Ok((
            scores,
            Self {
                phase: ExecutionPhase::Execute,
                preprocess_time,
                main_time,
                postprocess_time,
            },
        ))
    }

    /// Phase these timings belong to.
    #[must_use]
    pub const fn phase(&self) -> ExecutionPhase {
        self.phase
    }

    /// Seconds spent in the adapter.
    #[must_use]
    pub const fn main_time(&self) -> f64 {
        self.main_time
    }

    /// Result columns: `{phase}_preprocess_time`, `{phase}_main_time`, `{phase}_postprocess_time`.
    #[must_use]
    pub fn columns(&self) -> Vec<(String, Option<f64>)> {
        let phase = self.phase.as_str();
        vec![
            (format!("{phase}_preprocess_time"), self.preprocess_time),
            (format!("{phase}_main_time"), Some(self.main_time)),
            (format!("{phase}_postprocess_time"), self.postprocess_time),
        ]
    }
}

fn preprocess(
    algorithm: &Algorithm,
    input: AdapterInput,
    args: &CallArgs,
) -> Result<(AdapterInput, Option<f64>)> {
    match algorithm.preprocess() {
        Some(transform) => {
            let (input, elapsed) = timed(|| transform(input, args).map_err(Error::Adapter))?;
            Ok((input, Some(elapsed)))
        }
        None => Ok((input, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tests::call_args;
    use crate::adapters::Adapter;
    use crate::dataset::DataMatrix;
    use std::path::PathBuf;

    #[test]
    fn test_execute_applies_transforms_in_order() {
        let algorithm = Algorithm::builder(
            "double",
            Adapter::function(|input, _| match input {
                AdapterInput::Array(matrix) => Ok(matrix.values().iter().map(|v| v * 2.0).collect()),
                AdapterInput::Path(_) => anyhow::bail!("expected array"),
            }),
        )
        .preprocess(|_, _| Ok(AdapterInput::Array(DataMatrix::from_series(vec![1.0, 2.0]))))
        .postprocess(|scores, _| Ok(scores.into_iter().map(|v| v + 1.0).collect()))
        .build()
        .unwrap();

        let input = AdapterInput::Path(PathBuf::from("ignored.csv"));
        let (scores, times) =
            Times::from_execute_algorithm(&algorithm, input, &call_args(PathBuf::from("/tmp")))
                .unwrap();
        assert_eq!(scores, vec![3.0, 5.0]);
        assert_eq!(times.phase(), ExecutionPhase::Execute);

        let columns = times.columns();
        assert_eq!(columns[0].0, "execute_preprocess_time");
        assert!(columns[0].1.is_some());
        assert_eq!(columns[1].0, "execute_main_time");
        assert_eq!(columns[2].0, "execute_postprocess_time");
        assert!(columns[2].1.is_some());
    }

    #[test]
    fn test_train_without_transforms() {
        let adapter = crate::adapters::FunctionAdapter::new(|_, _| Ok(vec![]))
            .with_train(|_, _| Ok(()));
        let algorithm = Algorithm::builder("trainable", adapter).build().unwrap();
        let input = AdapterInput::Path(PathBuf::from("train.csv"));
        let times =
            Times::from_train_algorithm(&algorithm, input, &call_args(PathBuf::from("/tmp")))
                .unwrap();
        let columns = times.columns();
        assert_eq!(columns[0], ("train_preprocess_time".to_string(), None));
        assert_eq!(columns[2], ("train_postprocess_time".to_string(), None));
        assert!(times.main_time() >= 0.0);
    }

    #[test]
    fn test_postprocess_failure_is_adapter_error() {
        let algorithm = Algorithm::builder("broken", Adapter::function(|_, _| Ok(vec![1.0])))
            .postprocess(|_, _| anyhow::bail!("bad scaling"))
            .build()
            .unwrap();
        let input = AdapterInput::Path(PathBuf::from("test.csv"));
        let err =
            Times::from_execute_algorithm(&algorithm, input, &call_args(PathBuf::from("/tmp")))
                .unwrap_err();
        assert!(matches!(err, Error::Adapter(_)));
    }
}
