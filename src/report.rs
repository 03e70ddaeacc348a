use serde::Serialize;

use crate::catalog::SkillCatalog;
use crate::engine::{aggregate_mitigation, detect_interference};
use crate::model::*;
use crate::timefmt::format_time;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSummary {
    pub id: Id,
    pub name: String,
    pub start: String,
    pub end: String,
    pub gimmick_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterferenceEntry {
    pub placement_id: Id,
    pub time: String,
    pub member: String,
    pub skill: String,
    pub interfering_members: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub id: Id,
    pub name: String,
    pub members: usize,
    pub placements: usize,
    /// The party points at a different content than the one reported on.
    pub dangling_content: bool,
    pub interference: Vec<InterferenceEntry>,
    pub max_physical_mitigation: f64,
    pub max_magical_mitigation: f64,
    pub invincible_seconds: usize,
}

/// Summary of one content and, optionally, the party planned against it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub content_id: Id,
    pub raid_name: String,
    pub boss_name: String,
    pub duration: String,
    pub phases: Vec<PhaseSummary>,
    pub gimmicks: usize,
    pub bursts: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<PartySummary>,
}

impl PlanReport {
    pub fn build(content: &Content, party: Option<&Party>, catalog: &SkillCatalog) -> Self {
        let phases = content
            .phases
            .iter()
            .map(|p| PhaseSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                start: format_time(p.start_time),
                end: format_time(p.end_time),
                gimmick_count: content.gimmicks_in_phase(&p.id).count(),
            })
            .collect();

        PlanReport {
            content_id: content.id.clone(),
            raid_name: content.raid_name.clone(),
            boss_name: content.boss_name.clone(),
            duration: format_time(content.duration),
            phases,
            gimmicks: content.gimmicks.len(),
            bursts: content.burst_timings.len(),
            party: party.map(|p| summarize_party(content, p, catalog)),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn summarize_party(content: &Content, party: &Party, catalog: &SkillCatalog) -> PartySummary {
    if party.content_id != content.id {
        tracing::warn!(party = %party.id, content = %content.id, referenced = %party.content_id, "party references another content");
    }

    let flags = detect_interference(party, catalog);
    let mut interference: Vec<(Ms, InterferenceEntry)> = party
        .placements()
        .filter_map(|(member, placement)| {
            let flag = flags.get(&placement.id).filter(|f| f.has_interference)?;
            let skill = catalog
                .get_skill_by_id(&placement.skill_id)
                .map_or(placement.skill_id.as_str(), |s| s.name.as_str());
            Some((
                placement.time,
                InterferenceEntry {
                    placement_id: placement.id.clone(),
                    time: format_time(placement.time),
                    member: member.display_name().to_string(),
                    skill: skill.to_string(),
                    interfering_members: flag.interfering_members.clone(),
                },
            ))
        })
        .collect();
    interference.sort_by(|(a, x), (b, y)| a.cmp(b).then_with(|| x.placement_id.cmp(&y.placement_id)));

    let curve = aggregate_mitigation(party, catalog, content.duration);

    PartySummary {
        id: party.id.clone(),
        name: party.name.clone(),
        members: party.members.len(),
        placements: party.placements().count(),
        dangling_content: party.content_id != content.id,
        interference: interference.into_iter().map(|(_, e)| e).collect(),
        max_physical_mitigation: curve.max_physical,
        max_magical_mitigation: curve.max_magical,
        invincible_seconds: curve.invincible_seconds(),
    }
}
