//! Pipeline engine: an ordered, id-keyed list of configured transform steps.
//!
//! Steps live in an `IndexMap` so lookup by id and positional moves are both
//! cheap, and iteration order is execution order. Each step carries its
//! compiled [`TransformOp`]; configuration errors surface when a step is added
//! or updated, and `execute` only ever sees data errors or steps restored
//! from a record that no longer compile.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use echem_core::{
    EchemError, PipelineRecord, Result, Series, StepKind, StepParams, StepRecord,
};

use crate::transform::{default_params, TransformOp};

pub type StepId = String;

/// One configured operator inside a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct TransformStep {
    id: StepId,
    kind: StepKind,
    parameters: StepParams,
    enabled: bool,
    compiled: std::result::Result<TransformOp, String>,
}

impl TransformStep {
    fn new(id: StepId, kind: StepKind, parameters: StepParams, enabled: bool) -> Self {
        let compiled = TransformOp::from_step(&kind, &parameters).map_err(|e| e.to_string());
        Self {
            id,
            kind,
            parameters,
            enabled,
            compiled,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    pub fn parameters(&self) -> &StepParams {
        &self.parameters
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The reason this step cannot run, if its configuration is invalid.
    pub fn config_error(&self) -> Option<&str> {
        self.compiled.as_ref().err().map(String::as_str)
    }

    fn to_record(&self) -> StepRecord {
        StepRecord {
            id: self.id.clone(),
            kind: self.kind.clone(),
            parameters: self.parameters.clone(),
            enabled: self.enabled,
        }
    }
}

/// A step that ran, with the exact parameters it ran with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedStep {
    pub id: StepId,
    pub kind: StepKind,
    pub parameters: StepParams,
}

/// An enabled step that was passed through instead of applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepIssue {
    pub id: StepId,
    pub kind: StepKind,
    pub reason: String,
}

/// Result of [`Pipeline::execute`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub series: Series,
    pub applied: Vec<AppliedStep>,
    pub issues: Vec<StepIssue>,
}

impl Execution {
    /// True when every enabled step ran.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    steps: IndexMap<StepId, TransformStep>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&TransformStep> {
        self.steps.get(id)
    }

    /// Current position of `id` in execution order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.get_index_of(id)
    }

    /// Steps in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &TransformStep> {
        self.steps.values()
    }

    /// Append a new enabled step with a fresh id.
    ///
    /// `overrides` are layered over the kind's defaults. Invalid
    /// configuration is rejected and the pipeline is left unchanged.
    pub fn add(&mut self, kind: impl Into<StepKind>, overrides: StepParams) -> Result<StepId> {
        let kind = kind.into();
        let mut parameters = default_params(&kind);
        parameters.extend(overrides);
        let op = TransformOp::from_step(&kind, &parameters)?;

        let id = Uuid::new_v4().to_string();
        debug!(step_id = %id, kind = %kind, "step added");
        self.steps.insert(
            id.clone(),
            TransformStep {
                id: id.clone(),
                kind,
                parameters,
                enabled: true,
                compiled: Ok(op),
            },
        );
        Ok(id)
    }

    pub fn remove(&mut self, id: &str) -> Result<TransformStep> {
        self.steps
            .shift_remove(id)
            .ok_or_else(|| EchemError::StepNotFound(id.to_string()))
    }

    /// Flip `enabled`, returning the new state.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let step = self.step_mut(id)?;
        step.enabled = !step.enabled;
        Ok(step.enabled)
    }

    /// Merge `changes` into the step's parameters.
    ///
    /// The merged set must validate; on failure nothing changes.
    pub fn update(&mut self, id: &str, changes: StepParams) -> Result<()> {
        let step = self.step_mut(id)?;
        let mut parameters = step.parameters.clone();
        parameters.extend(changes);
        let op = TransformOp::from_step(&step.kind, &parameters)?;
        step.parameters = parameters;
        step.compiled = Ok(op);
        Ok(())
    }

    /// Move the step at position `from` to position `to`, shifting the rest.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.steps.len();
        for index in [from, to] {
            if index >= len {
                return Err(EchemError::IndexOutOfRange { index, len });
            }
        }
        self.steps.move_index(from, to);
        Ok(())
    }

    fn step_mut(&mut self, id: &str) -> Result<&mut TransformStep> {
        self.steps
            .get_mut(id)
            .ok_or_else(|| EchemError::StepNotFound(id.to_string()))
    }

    /// Run every enabled step in order, each feeding the next.
    ///
    /// Steps whose configuration does not compile are passed through and
    /// reported in [`Execution::issues`]. Failures caused by the data
    /// itself abort the run, including a step that leaves no points.
    pub fn execute(&self, input: &Series) -> Result<Execution> {
        input.require_len(1, "pipeline execution")?;

        let mut series = input.clone();
        let mut applied = Vec::new();
        let mut issues = Vec::new();
        let mut skipped = 0usize;

        for step in self.steps.values() {
            if !step.enabled {
                skipped += 1;
                continue;
            }
            match &step.compiled {
                Ok(op) => {
                    let points_in = series.len();
                    series = op.apply(&series)?;
                    if series.is_empty() {
                        return Err(EchemError::InvalidSeries(format!(
                            "step '{}' ({}) left no points from {}",
                            step.id, step.kind, points_in
                        )));
                    }
                    debug!(
                        step_id = %step.id,
                        kind = %step.kind,
                        points_in,
                        points_out = series.len(),
                        "step applied"
                    );
                    applied.push(AppliedStep {
                        id: step.id.clone(),
                        kind: step.kind.clone(),
                        parameters: step.parameters.clone(),
                    });
                }
                Err(reason) => {
                    warn!(
                        step_id = %step.id,
                        kind = %step.kind,
                        reason = %reason,
                        "step not runnable, passing series through"
                    );
                    issues.push(StepIssue {
                        id: step.id.clone(),
                        kind: step.kind.clone(),
                        reason: reason.clone(),
                    });
                }
            }
        }

        info!(
            applied = applied.len(),
            disabled = skipped,
            issues = issues.len(),
            points = series.len(),
            "pipeline executed"
        );
        Ok(Execution {
            series,
            applied,
            issues,
        })
    }

    pub fn to_record(&self) -> PipelineRecord {
        PipelineRecord {
            steps: self.steps.values().map(TransformStep::to_record).collect(),
        }
    }

    /// Rebuild a pipeline exactly as recorded.
    ///
    /// Ids, order, parameters and flags are kept verbatim, including steps
    /// that no longer compile; those are reported when executed. Duplicate
    /// ids are rejected because they cannot be addressed.
    pub fn from_record(record: &PipelineRecord) -> Result<Self> {
        let mut steps = IndexMap::with_capacity(record.steps.len());
        for rec in &record.steps {
            let step = TransformStep::new(
                rec.id.clone(),
                rec.kind.clone(),
                rec.parameters.clone(),
                rec.enabled,
            );
            if let Some(reason) = step.config_error() {
                warn!(step_id = %rec.id, kind = %rec.kind, reason, "recorded step does not compile");
            }
            if steps.insert(rec.id.clone(), step).is_some() {
                return Err(EchemError::Serialize(format!(
                    "duplicate step id '{}' in pipeline record",
                    rec.id
                )));
            }
        }
        Ok(Self { steps })
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_record().to_json()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_record(&PipelineRecord::from_json(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echem_core::{params, ParamValue};

    fn ids(p: &Pipeline) -> Vec<String> {
        p.steps().map(|s| s.id().to_string()).collect()
    }

    #[test]
    fn add_assigns_unique_ids_and_defaults() {
        let mut p = Pipeline::new();
        let a = p.add(StepKind::Smooth, StepParams::new()).unwrap();
        let b = p.add(StepKind::Smooth, params([("window", 3usize)])).unwrap();
        assert_ne!(a, b);
        assert_eq!(p.get(&a).unwrap().parameters()["window"], ParamValue::Number(5.0));
        assert_eq!(p.get(&b).unwrap().parameters()["window"], ParamValue::Number(3.0));
        assert!(p.get(&a).unwrap().enabled());
    }

    #[test]
    fn add_rejects_invalid_configuration() {
        let mut p = Pipeline::new();
        assert!(p.add("custom", params([("expression", "y +")])).is_err());
        assert!(p.add("teleport", StepParams::new()).is_err());
        assert!(p.is_empty());
    }

    #[test]
    fn update_merges_and_is_atomic() {
        let mut p = Pipeline::new();
        let id = p
            .add(StepKind::Filter, params([("filterType", "highpass")]))
            .unwrap();
        p.update(&id, params([("cutoff", 0.25)])).unwrap();
        let step = p.get(&id).unwrap();
        assert_eq!(step.parameters()["cutoff"], ParamValue::Number(0.25));
        assert_eq!(step.parameters()["filterType"].as_str(), Some("highpass"));

        assert!(p.update(&id, params([("cutoff", -1.0)])).is_err());
        assert_eq!(p.get(&id).unwrap().parameters()["cutoff"], ParamValue::Number(0.25));
        assert!(matches!(
            p.update("missing", StepParams::new()),
            Err(EchemError::StepNotFound(_))
        ));
    }

    #[test]
    fn toggle_and_remove() {
        let mut p = Pipeline::new();
        let id = p.add(StepKind::Normalize, StepParams::new()).unwrap();
        assert!(!p.toggle(&id).unwrap());
        assert!(p.toggle(&id).unwrap());
        let removed = p.remove(&id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(p.is_empty());
        assert!(p.remove(&id).is_err());
        assert!(p.toggle(&id).is_err());
    }

    #[test]
    fn reorder_moves_and_checks_bounds() {
        let mut p = Pipeline::new();
        let a = p.add(StepKind::Normalize, StepParams::new()).unwrap();
        let b = p.add(StepKind::Derivative, StepParams::new()).unwrap();
        let c = p.add(StepKind::Integral, StepParams::new()).unwrap();

        p.reorder(0, 2).unwrap();
        assert_eq!(ids(&p), vec![b.clone(), c.clone(), a.clone()]);
        p.reorder(2, 0).unwrap();
        assert_eq!(ids(&p), vec![a.clone(), b, c]);
        assert_eq!(p.position(&a), Some(0));

        assert!(matches!(
            p.reorder(0, 3),
            Err(EchemError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn disabled_steps_are_skipped_not_reordered() {
        let mut p = Pipeline::new();
        let n = p.add(StepKind::Normalize, StepParams::new()).unwrap();
        let neg = p.add("math", params([("operation", "negate")])).unwrap();
        p.toggle(&n).unwrap();

        let out = p.execute(&Series::from_y(vec![1.0, 3.0])).unwrap();
        assert_eq!(out.series.y(), &[-1.0, -3.0]);
        assert_eq!(out.applied.len(), 1);
        assert_eq!(out.applied[0].id, neg);
        assert!(out.is_clean());
    }

    #[test]
    fn execute_does_not_mutate_configuration() {
        let mut p = Pipeline::new();
        p.add(StepKind::Smooth, StepParams::new()).unwrap();
        let before = p.to_record();
        p.execute(&Series::from_y(vec![1.0, 2.0, 3.0])).unwrap();
        assert_eq!(p.to_record(), before);
    }

    #[test]
    fn empty_series_is_invalid() {
        let p = Pipeline::new();
        let err = p.execute(&Series::from_y(vec![])).unwrap_err();
        assert!(matches!(err, EchemError::InvalidSeries(_)));
    }

    #[test]
    fn recorded_bad_steps_pass_through_with_issue() {
        let json = r#"{"steps":[
            {"id":"a","kind":"wavelet","parameters":{},"enabled":true},
            {"id":"b","kind":"custom","parameters":{"expression":"import os"},"enabled":true},
            {"id":"c","kind":"math","parameters":{"operation":"negate"},"enabled":true}
        ]}"#;
        let p = Pipeline::from_json(json).unwrap();
        assert!(p.get("a").unwrap().config_error().is_some());

        let out = p.execute(&Series::from_y(vec![2.0])).unwrap();
        assert_eq!(out.series.y(), &[-2.0]);
        assert_eq!(out.issues.len(), 2);
        assert_eq!(out.issues[0].kind, StepKind::Unrecognized("wavelet".into()));
        assert_eq!(out.issues[1].id, "b");
        assert_eq!(out.applied.len(), 1);
    }

    #[test]
    fn record_keeps_unknown_kinds_and_order() {
        let json = r#"{"steps":[{"id":"z","kind":"wavelet","parameters":{"level":3},"enabled":false},{"id":"a","kind":"normalize","parameters":{},"enabled":true}]}"#;
        let p = Pipeline::from_json(json).unwrap();
        let record = p.to_record();
        assert_eq!(record, PipelineRecord::from_json(json).unwrap());
        assert_eq!(record.steps[0].kind.as_str(), "wavelet");
    }

    #[test]
    fn add_and_update_reject_unknown_or_non_finite_parameters() {
        let mut p = Pipeline::new();
        assert!(p.add(StepKind::Normalize, params([("scale", f64::NAN)])).is_err());
        assert!(p.add(StepKind::Smooth, params([("windw", 3usize)])).is_err());
        assert!(p.is_empty());

        let id = p.add(StepKind::Smooth, params([("window", 3usize)])).unwrap();
        assert!(p.update(&id, params([("window", f64::INFINITY)])).is_err());
        assert!(p.update(&id, params([("windw", 7usize)])).is_err());
        assert_eq!(p.get(&id).unwrap().parameters().len(), 1);

        let restored = Pipeline::from_json(&p.to_json().unwrap()).unwrap();
        assert_eq!(restored.to_record(), p.to_record());
    }

    #[test]
    fn recorded_parameter_typo_is_an_issue() {
        let json = r#"{"steps":[{"id":"s","kind":"smooth","parameters":{"windw":3},"enabled":true}]}"#;
        let p = Pipeline::from_json(json).unwrap();
        let reason = p.get("s").unwrap().config_error().unwrap();
        assert!(reason.contains("did you mean 'window'?"), "{reason}");

        let input = Series::from_y(vec![0.0, 10.0, 0.0, 10.0, 0.0]);
        let out = p.execute(&input).unwrap();
        assert_eq!(out.series.y(), input.y());
        assert_eq!(out.issues.len(), 1);
        assert_eq!(out.issues[0].id, "s");
        assert!(out.applied.is_empty());
    }

    #[test]
    fn step_leaving_no_points_aborts() {
        let mut p = Pipeline::new();
        p.add(StepKind::Derivative, StepParams::new()).unwrap();
        p.add("math", params([("operation", "abs")])).unwrap();
        let err = p.execute(&Series::from_y(vec![1.0])).unwrap_err();
        assert!(matches!(err, EchemError::InvalidSeries(ref m) if m.contains("left no points")));

        let out = p.execute(&Series::from_y(vec![1.0, 4.0])).unwrap();
        assert_eq!(out.series.y(), &[3.0]);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let json = r#"{"steps":[{"id":"a","kind":"normalize"},{"id":"a","kind":"smooth"}]}"#;
        assert!(Pipeline::from_json(json).is_err());
    }
}
