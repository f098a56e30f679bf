// src/graph/risk.rs

//! Classification of a change set into a [`RiskLevel`] plus a short
//! human-readable report.

use std::collections::BTreeMap;

use crate::graph::model::{ImpactEntry, SignatureChange};
use crate::types::{RiskLevel, Severity};

const HIGH_SEVERITY_LIMIT: usize = 5;
const HIGH_IMPACT_LIMIT: usize = 15;
const MEDIUM_IMPACT_LIMIT: usize = 5;

/// Impacts keyed by changed file, then by impacted file.
pub type ImpactsByFile = BTreeMap<String, BTreeMap<String, ImpactEntry>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub total_impacted: usize,
    pub high_severity: usize,
    pub report: String,
}

/// Classify a set of changes.
///
/// `signature_changes` is keyed by changed file. `cycle` is one import cycle
/// if the graph has any.
pub fn classify(
    changed_files: &[String],
    impacts: &ImpactsByFile,
    signature_changes: &BTreeMap<String, Vec<SignatureChange>>,
    cycle: Option<&[String]>,
) -> RiskAssessment {
    let total_impacted: usize = impacts.values().map(BTreeMap::len).sum();
    let high_severity = impacts
        .values()
        .flat_map(BTreeMap::values)
        .filter(|e| e.severity == Severity::High)
        .count();
    let any_signature_change = signature_changes.values().any(|c| !c.is_empty());

    let level = if cycle.is_some() || high_severity > HIGH_SEVERITY_LIMIT || total_impacted > HIGH_IMPACT_LIMIT {
        RiskLevel::High
    } else if any_signature_change || high_severity > 0 || total_impacted > MEDIUM_IMPACT_LIMIT {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let report = render_report(level, changed_files, impacts, signature_changes, cycle, total_impacted);

    RiskAssessment {
        level,
        total_impacted,
        high_severity,
        report,
    }
}

struct Caps {
    signature_examples: usize,
    files: usize,
    impacts_per_file: usize,
}

fn render_report(
    level: RiskLevel,
    changed_files: &[String],
    impacts: &ImpactsByFile,
    signature_changes: &BTreeMap<String, Vec<SignatureChange>>,
    cycle: Option<&[String]>,
    total_impacted: usize,
) -> String {
    let (mut lines, caps) = match level {
        RiskLevel::Low => {
            if changed_files.is_empty() {
                return "Safe: no changes detected".to_string();
            }
            return format!("Safe: {} file(s) changed, low impact", changed_files.len());
        }
        RiskLevel::Medium => (
            vec![format!("Caution: {total_impacted} file(s) potentially affected")],
            Caps {
                signature_examples: 2,
                files: 3,
                impacts_per_file: 3,
            },
        ),
        RiskLevel::High => {
            let mut head = String::from("High risk: ");
            if let Some(cycle) = cycle {
                let mut ring = cycle.to_vec();
                if let Some(first) = cycle.first() {
                    ring.push(first.clone());
                }
                head.push_str(&format!("circular dependency ({}), ", ring.join(" -> ")));
            }
            head.push_str(&format!("{total_impacted} file(s) affected"));
            (
                vec![head],
                Caps {
                    signature_examples: 2,
                    files: 2,
                    impacts_per_file: 5,
                },
            )
        }
    };

    let examples: Vec<(&String, &SignatureChange)> = signature_changes
        .iter()
        .flat_map(|(file, changes)| changes.iter().map(move |c| (file, c)))
        .take(caps.signature_examples)
        .collect();
    if !examples.is_empty() {
        lines.push("  Signature changes:".to_string());
        for (file, change) in examples {
            lines.push(format!("    {file}: {change}"));
        }
    }

    let mut shown = 0;
    for changed in changed_files {
        if shown == caps.files {
            break;
        }
        let Some(affected) = impacts.get(changed).filter(|m| !m.is_empty()) else {
            continue;
        };
        shown += 1;
        lines.push(format!("  {changed} affects {} file(s):", affected.len()));
        for (path, entry) in affected.iter().take(caps.impacts_per_file) {
            let marker = if entry.severity == Severity::High { "!" } else { "-" };
            lines.push(format!("    {marker} {path} ({})", entry.reasons_text()));
        }
    }

    lines.join("\n")
}
