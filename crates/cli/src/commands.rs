//! Subcommand implementations.

use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use verdict_core::{EngineConfig, Subject};
use verdict_rules::loader::{LoadResult, LoadStatus};
use verdict_rules::service::invalidate_on_change;
use verdict_rules::{
    validate_yaml, CachedEvaluator, CriteriaEvaluator, CriteriaLoader, EvaluationService, RuleError,
};

// ── Output ──────────────────────────────────────────────────────────

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_subject(path: &Path) -> Result<Subject> {
    let json = read_input(path)?;
    Subject::from_json(&json).with_context(|| format!("invalid subject in {}", path.display()))
}

// ── Setup ───────────────────────────────────────────────────────────

/// Scan the criteria directory, logging files that failed to load.
fn load_criteria(config: &EngineConfig) -> Result<(CriteriaLoader, Vec<LoadResult>)> {
    let loader = CriteriaLoader::new(config.criteria_dir.clone());
    let results = loader
        .load_all()
        .with_context(|| format!("failed to scan {}", loader.criteria_dir().display()))?;
    let failed = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
        .count();
    if failed > 0 {
        warn!(failed, "some criteria files failed to load");
    }
    info!(loaded = loader.len(), dir = %loader.criteria_dir().display(), "criteria loaded");
    Ok((loader, results))
}

fn with_hint(err: RuleError, known: &[String]) -> anyhow::Error {
    if matches!(err, RuleError::CriteriaNotFound(_)) && !known.is_empty() {
        anyhow::Error::new(err).context(format!("known criteria: {}", known.join(", ")))
    } else {
        err.into()
    }
}

// ── Commands ────────────────────────────────────────────────────────

pub fn evaluate(config: &EngineConfig, criteria_id: &str, subject: &Path, pretty: bool) -> Result<()> {
    let subject = read_subject(subject)?;
    let (loader, _) = load_criteria(config)?;
    let ids = loader.ids();
    let service = EvaluationService::from_config(config, Arc::new(loader));

    let result = service
        .evaluate(criteria_id, &subject)
        .map_err(|e| with_hint(e, &ids))?;
    print_json(&result, pretty)
}

pub fn batch(config: &EngineConfig, criteria_id: &str, subjects: &Path, pretty: bool) -> Result<()> {
    let reader: Box<dyn BufRead> = if subjects.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = fs::File::open(subjects)
            .with_context(|| format!("failed to open {}", subjects.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut parsed = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.context("failed to read subjects")?;
        if line.trim().is_empty() {
            continue;
        }
        let subject = Subject::from_json(&line)
            .with_context(|| format!("invalid subject on line {}", n + 1))?;
        parsed.push(subject);
    }

    let (loader, _) = load_criteria(config)?;
    let ids = loader.ids();
    let service = EvaluationService::from_config(config, Arc::new(loader));
    let results = service
        .evaluate_batch(criteria_id, &parsed)
        .map_err(|e| with_hint(e, &ids))?;

    info!(criteria_id = %criteria_id, subjects = results.len(), "batch evaluated");
    for result in &results {
        print_json(result, pretty)?;
    }
    Ok(())
}

pub fn validate(file: &Path, pretty: bool) -> Result<()> {
    let yaml = read_input(file)?;
    let result = validate_yaml(&yaml);
    print_json(&result, pretty)?;
    if !result.valid {
        bail!("{} has {} validation error(s)", file.display(), result.errors.len());
    }
    Ok(())
}

#[derive(Serialize)]
struct ListEntry<'a> {
    path: String,
    #[serde(flatten)]
    status: &'a LoadStatus,
}

pub fn list(config: &EngineConfig, pretty: bool) -> Result<()> {
    let (loader, results) = load_criteria(config)?;
    let entries: Vec<ListEntry<'_>> = results
        .iter()
        .map(|r| ListEntry {
            path: r
                .path
                .strip_prefix(loader.criteria_dir())
                .unwrap_or(&r.path)
                .display()
                .to_string(),
            status: &r.status,
        })
        .collect();
    print_json(&entries, pretty)
}

pub fn watch(config: &EngineConfig, criteria_id: &str, subject: &Path, pretty: bool) -> Result<()> {
    let subject = read_subject(subject)?;
    let (mut loader, _) = load_criteria(config)?;

    let evaluator = CriteriaEvaluator::with_default_decision(config.default_decision.clone());
    let cached = Arc::new(CachedEvaluator::from_config(&config.cache, evaluator));

    let (tx, rx) = mpsc::channel::<String>();
    let invalidate = invalidate_on_change(Arc::clone(&cached));
    loader
        .watch(move |id: &str| {
            invalidate(id);
            // Receiver only goes away on shutdown.
            let _ = tx.send(id.to_string());
        })
        .context("failed to start criteria watcher")?;

    let service = EvaluationService::new(Arc::new(loader), cached)
        .with_chunk_size(config.batch_chunk_size);

    let run = |service: &EvaluationService| -> Result<()> {
        match service.evaluate(criteria_id, &subject) {
            Ok(result) => print_json(&result, pretty),
            Err(e @ RuleError::CriteriaNotFound(_)) | Err(e @ RuleError::CriteriaDisabled(_)) => {
                warn!(error = %e, "criteria unavailable, waiting for changes");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    };

    run(&service)?;
    for changed in rx {
        if changed == criteria_id {
            run(&service)?;
        }
    }
    Ok(())
}
