use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::SkillCatalog;
use crate::model::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillInterference {
    pub placement_id: Id,
    pub has_interference: bool,
    /// Display names of the other members, each listed once.
    pub interfering_members: Vec<String>,
}

/// For every placement of a role-shared skill, the other members whose
/// placement of the same skill id has an overlapping effect window.
///
/// Each side of an overlapping pair is reported independently.
pub fn detect_interference(party: &Party, catalog: &SkillCatalog) -> HashMap<Id, SkillInterference> {
    let mut result = HashMap::new();

    for member in &party.members {
        for placement in &member.skill_placements {
            let Some(skill) = catalog.get_skill_by_id(&placement.skill_id) else {
                continue;
            };
            if !skill.is_role_shared() {
                continue;
            }
            let window = skill.effect_span(placement.time);

            let mut interfering_members: Vec<String> = Vec::new();
            for other in &party.members {
                if other.id == member.id {
                    continue;
                }
                let overlaps = other
                    .skill_placements
                    .iter()
                    .filter(|p| p.skill_id == placement.skill_id)
                    .any(|p| skill.effect_span(p.time).overlaps(&window));
                if overlaps {
                    interfering_members.push(other.display_name().to_string());
                }
            }

            result.insert(
                placement.id.clone(),
                SkillInterference {
                    placement_id: placement.id.clone(),
                    has_interference: !interfering_members.is_empty(),
                    interfering_members,
                },
            );
        }
    }

    result
}
