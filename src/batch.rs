//! Offline evaluation of recorded samples on a bounded worker pool.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::error::{GestureError, Result};
use crate::recording::{Recording, list_recordings};
use crate::session::Recognizer;
use crate::template::TemplateStore;
use crate::types::MatchResult;

pub const NO_MATCH_LABEL: &str = "none";
pub const ERROR_LABEL: &str = "error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    Matched(String),
    NoMatch,
    /// The sample could not be evaluated; carries the reason.
    Failed(String),
}

impl SampleOutcome {
    pub fn label(&self) -> &str {
        match self {
            SampleOutcome::Matched(name) => name,
            SampleOutcome::NoMatch => NO_MATCH_LABEL,
            SampleOutcome::Failed(_) => ERROR_LABEL,
        }
    }
}

/// Runs a whole recording through a fresh recognizer and keeps the best match seen.
pub fn evaluate_recording(
    recording: &Recording,
    config: &EngineConfig,
    store: &TemplateStore,
) -> Result<SampleOutcome> {
    if recording.tracked_frames() == 0 {
        return Err(GestureError::EmptyRecording(format!("({} frames)", recording.len())));
    }
    let mut recognizer = Recognizer::new(config, store)?;
    let mut best: Option<MatchResult> = None;
    for frame in &recording.frames {
        if let Some(m) = recognizer.process_frame(frame.as_ref()) {
            if best.as_ref().is_none_or(|b| m.score < b.score) {
                best = Some(m);
            }
        }
    }
    Ok(match best {
        Some(m) => SampleOutcome::Matched(m.template_name),
        None => SampleOutcome::NoMatch,
    })
}

/// Loads and evaluates one sample file; failures are folded into the outcome.
pub fn evaluate_sample(path: &Path, config: &EngineConfig, store: &TemplateStore) -> SampleOutcome {
    let outcome = Recording::load(path).and_then(|r| {
        if r.tracked_frames() == 0 {
            return Err(GestureError::EmptyRecording(path.display().to_string()));
        }
        evaluate_recording(&r, config, store)
    });
    match outcome {
        Ok(outcome) => {
            log::debug!("{}: {}", path.display(), outcome.label());
            outcome
        }
        Err(e) => {
            log::warn!("failed to evaluate {}: {}", path.display(), e);
            SampleOutcome::Failed(e.to_string())
        }
    }
}

/// Evaluates `paths` on `workers` threads. The result order follows `paths`.
pub fn evaluate_paths(
    paths: &[PathBuf],
    config: &EngineConfig,
    store: &TemplateStore,
    workers: usize,
) -> Result<Vec<SampleOutcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| GestureError::InvalidConfig(format!("worker pool: {}", e)))?;
    Ok(pool.install(|| {
        paths
            .par_iter()
            .progress_count(paths.len() as u64)
            .map(|path| evaluate_sample(path, config, store))
            .collect()
    }))
}

/// Counts outcomes per label.
pub fn frequency_table<'a>(
    outcomes: impl IntoIterator<Item = &'a SampleOutcome>,
) -> BTreeMap<String, usize> {
    let mut table = BTreeMap::new();
    for outcome in outcomes {
        *table.entry(outcome.label().to_string()).or_insert(0) += 1;
    }
    table
}

/// Evaluates every recording below `samples_dir` and returns the frequency table.
pub fn evaluate_dir(
    samples_dir: impl AsRef<Path>,
    config: &EngineConfig,
    store: &TemplateStore,
    workers: usize,
) -> Result<BTreeMap<String, usize>> {
    let paths = list_recordings(samples_dir)?;
    let outcomes = evaluate_paths(&paths, config, store, workers)?;
    let table = frequency_table(&outcomes);
    log::info!("evaluated {} samples: {:?}", outcomes.len(), table);
    Ok(table)
}
