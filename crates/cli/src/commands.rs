//! Subcommand implementations. Everything written to stdout is JSON except
//! the `validate` listing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use echem_compute::{InsightEngine, Pipeline};
use echem_core::{rank_insights, AnomalyMethod, Config, Domain, Series};
use echem_rules::validation::validate_document;
use echem_rules::{LoadResult, LoadStatus, RuleDocument, RuleLoader, RuleSet};

/// Resolved settings plus the loaded rule set, shared by every subcommand.
pub struct Context {
    pub rules_dir: PathBuf,
    pub rules: RuleSet,
    pub load_results: Vec<LoadResult>,
    pub pretty: bool,
    pub default_method: AnomalyMethod,
}

impl Context {
    pub fn new(config: &Config, rules_dir: Option<PathBuf>, compact: bool) -> Result<Self> {
        let rules_dir = rules_dir.unwrap_or_else(|| config.rules_dir.clone());
        let (rules, load_results) = RuleLoader::new(&rules_dir)
            .load_all()
            .with_context(|| format!("failed to load rules from {}", rules_dir.display()))?;
        let default_method = config
            .anomaly_method
            .parse::<AnomalyMethod>()
            .map_err(anyhow::Error::msg)
            .context("invalid ECHEM_ANOMALY_METHOD")?;
        Ok(Self {
            rules_dir,
            rules,
            load_results,
            pretty: config.pretty && !compact,
            default_method,
        })
    }

    fn has_analysis_config(&self) -> bool {
        self.rules
            .documents()
            .any(|d| d.as_analysis_config().is_some())
    }

    /// Detector precedence: CLI flag, then an AnalysisConfig rule, then env.
    fn anomaly_method(&self, flag: Option<AnomalyMethod>) -> AnomalyMethod {
        match flag {
            Some(method) => method,
            None if self.has_analysis_config() => self.rules.analysis_config().anomaly.method,
            None => self.default_method,
        }
    }

    fn pipeline(&self, record: Option<&Path>, template: Option<&str>) -> Result<Option<Pipeline>> {
        if let Some(path) = record {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read pipeline {}", path.display()))?;
            let pipeline = Pipeline::from_json(&json)
                .with_context(|| format!("invalid pipeline record {}", path.display()))?;
            return Ok(Some(pipeline));
        }
        if let Some(id) = template {
            let Some(rule) = self.rules.template(id) else {
                bail!(
                    "no enabled PipelineTemplate '{}' in {}",
                    id,
                    self.rules_dir.display()
                );
            };
            let pipeline = Pipeline::from_record(&rule.to_record())
                .with_context(|| format!("template '{}' does not form a pipeline", id))?;
            return Ok(Some(pipeline));
        }
        Ok(None)
    }

    fn emit<T: Serialize>(&self, value: &T, output: Option<&Path>) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        match output {
            Some(path) => {
                fs::write(path, json + "\n")
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "output written");
            }
            None => println!("{}", json),
        }
        Ok(())
    }
}

pub fn read_series(path: &Path) -> Result<Series> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read series {}", path.display()))?;
    let series: Series = serde_json::from_str(&json)
        .with_context(|| format!("invalid series file {}", path.display()))?;
    debug!(path = %path.display(), points = series.len(), "series loaded");
    Ok(series)
}

pub fn transform(
    ctx: &Context,
    input: &Path,
    record: Option<&Path>,
    template: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let series = read_series(input)?;
    let Some(pipeline) = ctx.pipeline(record, template)? else {
        bail!("transform needs --pipeline or --template");
    };
    let execution = pipeline.execute(&series).context("pipeline execution failed")?;
    for issue in &execution.issues {
        warn!(step_id = %issue.id, kind = %issue.kind, reason = %issue.reason, "step passed through");
    }
    ctx.emit(&execution, output)
}

pub fn insights(
    ctx: &Context,
    input: &Path,
    domain: Option<Domain>,
    record: Option<&Path>,
    template: Option<&str>,
    method: Option<AnomalyMethod>,
    full_report: bool,
) -> Result<()> {
    let mut series = read_series(input)?;
    if let Some(pipeline) = ctx.pipeline(record, template)? {
        let execution = pipeline.execute(&series).context("pipeline execution failed")?;
        if !execution.is_clean() {
            warn!(issues = execution.issues.len(), "pipeline ran with pass-through steps");
        }
        series = execution.series;
    }

    let engine = InsightEngine::with_config(&ctx.rules.analysis_config())
        .with_method(ctx.anomaly_method(method));
    let mut report = engine
        .report(&series, domain)
        .context("insight analysis failed")?;
    rank_insights(&mut report.insights);

    if full_report {
        ctx.emit(&report, None)
    } else {
        ctx.emit(&report.insights, None)
    }
}

/// Problems found in one rule document, for the `validate` listing.
fn document_problems(doc: &RuleDocument) -> (Vec<String>, Vec<String>) {
    let result = validate_document(doc);
    let mut errors: Vec<String> = result
        .errors
        .iter()
        .map(|e| match &e.suggestion {
            Some(s) => format!("{}: {} ({})", e.path, e.message, s),
            None => format!("{}: {}", e.path, e.message),
        })
        .collect();
    let warnings = result
        .warnings
        .iter()
        .map(|w| format!("{}: {}", w.path, w.message))
        .collect();

    if let Some(template) = doc.as_pipeline_template() {
        match Pipeline::from_record(&template.to_record()) {
            Ok(pipeline) => {
                for step in pipeline.steps() {
                    if let Some(reason) = step.config_error() {
                        errors.push(format!("step '{}': {}", step.id(), reason));
                    }
                }
            }
            Err(e) => errors.push(e.to_string()),
        }
    }
    (errors, warnings)
}

pub fn validate(ctx: &Context) -> Result<()> {
    let mut failures = 0usize;

    for result in &ctx.load_results {
        match &result.status {
            LoadStatus::Loaded { rule_id } => {
                println!("ok      {} ({})", result.path.display(), rule_id)
            }
            LoadStatus::Skipped { reason } => {
                println!("skip    {} ({})", result.path.display(), reason)
            }
            LoadStatus::Failed { error } => {
                failures += 1;
                println!("FAILED  {}: {}", result.path.display(), error);
            }
        }
    }

    for doc in ctx.rules.documents() {
        let (errors, warnings) = document_problems(doc);
        let id = &doc.metadata().id;
        for w in &warnings {
            println!("warn    {}: {}", id, w);
        }
        for e in &errors {
            println!("error   {}: {}", id, e);
        }
        if !errors.is_empty() {
            failures += 1;
        }
    }

    println!(
        "{} document(s) from {}, {} problem(s)",
        ctx.rules.len(),
        ctx.rules_dir.display(),
        failures
    );
    if failures > 0 {
        bail!("{} rule document(s) failed validation", failures);
    }
    Ok(())
}
