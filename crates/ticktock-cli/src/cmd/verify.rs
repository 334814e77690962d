//! `tt verify`: find tickets whose stored flags contradict their status.
//!
//! Lifecycle commands never produce such tickets; manual edits and hand
//! edited data files can.

use super::{Context, Session};
use crate::output::render;
use serde::Serialize;
use ticktock_core::Ticket;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Finding {
    row: usize,
    project_id: String,
    issues: Vec<String>,
}

#[derive(Debug, Serialize)]
struct VerifyOutput {
    checked: usize,
    ok: bool,
    findings: Vec<Finding>,
}

fn collect_findings(tickets: &[Ticket]) -> Vec<Finding> {
    tickets
        .iter()
        .enumerate()
        .filter_map(|(index, ticket)| {
            let issues = ticket.consistency_issues();
            (!issues.is_empty()).then(|| Finding {
                row: index + 1,
                project_id: ticket.project_id.clone(),
                issues: issues.iter().map(ToString::to_string).collect(),
            })
        })
        .collect()
}

/// Report inconsistent tickets; fails when any are found.
pub fn run_verify(ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let findings = collect_findings(session.store.tickets());
    let output = VerifyOutput {
        checked: session.store.len(),
        ok: findings.is_empty(),
        findings,
    };

    render(ctx.output, &output, |o, w| {
        for finding in &o.findings {
            for issue in &finding.issues {
                writeln!(w, "FAIL #{} {}: {issue}", finding.row, finding.project_id)?;
            }
        }
        if o.ok {
            writeln!(w, "✓ {} ticket(s) consistent", o.checked)
        } else {
            writeln!(w, "{} of {} ticket(s) inconsistent", o.findings.len(), o.checked)
        }
    })?;

    if !output.ok {
        anyhow::bail!(
            "{} ticket(s) have flags that contradict their status; fix them with `tt edit`",
            output.findings.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ticktock_core::Status;

    #[test]
    fn findings_point_at_bad_rows() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let good = Ticket::new("P1", "ana", "", now);
        let mut bad = Ticket::new("P2", "bo", "", now);
        bad.status = Status::TaskFinished;

        let findings = collect_findings(&[good, bad]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].row, 2);
        assert_eq!(findings[0].project_id, "P2");
        assert!(!findings[0].issues.is_empty());
    }
}
