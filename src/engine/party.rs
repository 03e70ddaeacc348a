use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::SkillCatalog;
use crate::limits::*;
use crate::model::*;

use super::history::{DocumentKind, History};
use super::lanes::find_available_lane;
use super::EngineError;

/// Roster used for new parties and for growing a party, in slot order.
pub const DEFAULT_ROSTER: [(Role, &str); 8] = [
    (Role::Tank, "Paladin"),
    (Role::Tank, "Warrior"),
    (Role::Healer, "White Mage"),
    (Role::Healer, "Scholar"),
    (Role::Dps, "Dragoon"),
    (Role::Dps, "Ninja"),
    (Role::Dps, "Black Mage"),
    (Role::Dps, "Bard"),
];

/// Job given to a member added one at a time.
pub const DEFAULT_MEMBER: (Role, &str) = (Role::Dps, "Dragoon");

fn roster_member(order: usize) -> Member {
    let (role, job) = DEFAULT_ROSTER[order % DEFAULT_ROSTER.len()];
    Member::new(order as u32, role, job)
}

/// A fresh party with the full default roster.
pub fn create_party(name: impl Into<String>, content_id: impl Into<Id>) -> Party {
    let now = now_timestamp();
    Party {
        id: new_id(),
        name: name.into(),
        content_id: content_id.into(),
        members: (0..MAX_PARTY_SIZE).map(roster_member).collect(),
        created_at: now.clone(),
        updated_at: now,
    }
}

#[derive(Debug, Clone, Default)]
pub struct PartyPatch {
    pub name: Option<String>,
    pub content_id: Option<Id>,
}

#[derive(Debug, Clone, Default)]
pub struct MemberPatch {
    pub player_name: Option<Option<String>>,
    pub role: Option<Role>,
    pub job: Option<String>,
    pub collapsed: Option<Option<bool>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPlacement {
    pub skill_id: Id,
    pub time: Ms,
    /// Explicit lane; auto-assigned when absent.
    pub lane: Option<u8>,
    pub target: Option<String>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlacementPatch {
    pub time: Option<Ms>,
    pub lane: Option<u8>,
    pub target: Option<Option<String>>,
    pub memo: Option<Option<String>>,
}

fn apply<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn check_lane(lane: Option<u8>) -> Result<(), EngineError> {
    match lane {
        Some(l) if l >= MAX_LANES => Err(EngineError::InvalidOperation("lane out of range")),
        _ => Ok(()),
    }
}

/// Owns one Party document, its undo history and a handle on the shared
/// skill catalog used for lane assignment.
#[derive(Debug, Clone)]
pub struct PartyEditor {
    party: Party,
    history: History<Party>,
    catalog: Arc<SkillCatalog>,
    revision: u64,
}

impl PartyEditor {
    pub fn new(party: Party, catalog: Arc<SkillCatalog>) -> Self {
        Self {
            party,
            history: History::new(DocumentKind::Party),
            catalog,
            revision: 0,
        }
    }

    pub fn create(name: impl Into<String>, content_id: impl Into<Id>, catalog: Arc<SkillCatalog>) -> Self {
        Self::new(create_party(name, content_id), catalog)
    }

    pub fn party(&self) -> &Party {
        &self.party
    }

    pub fn into_party(self) -> Party {
        self.party
    }

    pub fn catalog(&self) -> &Arc<SkillCatalog> {
        &self.catalog
    }

    pub fn history(&self) -> &History<Party> {
        &self.history
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn commit<R>(&mut self, op: &'static str, f: impl FnOnce(&mut Party) -> R) -> R {
        self.history.push(self.party.clone());
        let out = f(&mut self.party);
        self.party.updated_at = now_timestamp();
        self.revision += 1;
        metrics::counter!(crate::observability::MUTATIONS_TOTAL, "document" => "party", "op" => op).increment(1);
        tracing::debug!(op, revision = self.revision, "party mutated");
        out
    }

    fn reject(op: &'static str, err: EngineError) -> EngineError {
        metrics::counter!(crate::observability::REJECTED_MUTATIONS_TOTAL, "document" => "party", "op" => op)
            .increment(1);
        tracing::debug!(op, %err, "party mutation rejected");
        err
    }

    fn member_index(&self, member_id: &str) -> Option<usize> {
        self.party.members.iter().position(|m| m.id == member_id)
    }

    /// (member index, placement index) of a placement anywhere in the party.
    fn placement_index(&self, placement_id: &str) -> Option<(usize, usize)> {
        self.party.members.iter().enumerate().find_map(|(mi, m)| {
            m.skill_placements
                .iter()
                .position(|p| p.id == placement_id)
                .map(|pi| (mi, pi))
        })
    }

    pub fn undo(&mut self) -> Result<(), EngineError> {
        if !self.history.undo(&mut self.party) {
            return Err(EngineError::NothingToUndo);
        }
        self.revision += 1;
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), EngineError> {
        if !self.history.redo(&mut self.party) {
            return Err(EngineError::NothingToRedo);
        }
        self.revision += 1;
        Ok(())
    }

    // ── Party and members ────────────────────────────────────────

    pub fn update_party(&mut self, patch: PartyPatch) -> Result<(), EngineError> {
        self.commit("update_party", |p| {
            apply(&mut p.name, patch.name);
            apply(&mut p.content_id, patch.content_id);
        });
        Ok(())
    }

    pub fn update_member(&mut self, member_id: &str, patch: MemberPatch) -> Result<(), EngineError> {
        let Some(index) = self.member_index(member_id) else {
            return Err(Self::reject("update_member", EngineError::NotFound(member_id.into())));
        };
        self.commit("update_member", |p| {
            let m = &mut p.members[index];
            apply(&mut m.player_name, patch.player_name);
            apply(&mut m.role, patch.role);
            apply(&mut m.job, patch.job);
            apply(&mut m.collapsed, patch.collapsed);
        });
        Ok(())
    }

    /// Switch a member to another catalog job. Crossing roles clears every
    /// placement; within a role only role and common skills survive.
    pub fn change_member_job(&mut self, member_id: &str, job_name: &str) -> Result<(), EngineError> {
        let Some(index) = self.member_index(member_id) else {
            return Err(Self::reject("change_member_job", EngineError::NotFound(member_id.into())));
        };
        let Some(job) = self.catalog.job(job_name) else {
            return Err(Self::reject("change_member_job", EngineError::NotFound(job_name.into())));
        };
        let new_role = job.role;
        let keep: HashSet<Id> = self.catalog.role_and_common_skill_ids(new_role).into_iter().collect();

        self.commit("change_member_job", |p| {
            let m = &mut p.members[index];
            if m.role != new_role {
                m.skill_placements.clear();
            } else {
                m.skill_placements.retain(|sp| keep.contains(&sp.skill_id));
            }
            m.role = new_role;
            m.job = job_name.to_string();
        });
        Ok(())
    }

    /// View state only: recorded in `updatedAt` but not undoable.
    pub fn toggle_member_collapsed(&mut self, member_id: &str) -> Result<bool, EngineError> {
        let Some(index) = self.member_index(member_id) else {
            return Err(EngineError::NotFound(member_id.into()));
        };
        let member = &mut self.party.members[index];
        let collapsed = !member.collapsed.unwrap_or(false);
        member.collapsed = Some(collapsed);
        self.party.updated_at = now_timestamp();
        self.revision += 1;
        Ok(collapsed)
    }

    /// Reorder to match `member_ids`. Unknown or repeated ids are skipped and
    /// members left out are dropped; the result must still be a valid party.
    pub fn reorder_members(&mut self, member_ids: &[&str]) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        let order: Vec<usize> = member_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.member_index(id))
            .collect();
        if order.len() < MIN_PARTY_SIZE {
            return Err(Self::reject("reorder_members", EngineError::PartySize(order.len())));
        }
        self.commit("reorder_members", |p| {
            let mut members: Vec<Member> = order.iter().map(|&i| p.members[i].clone()).collect();
            for (i, m) in members.iter_mut().enumerate() {
                m.order = i as u32;
            }
            p.members = members;
        });
        Ok(())
    }

    pub fn add_member(&mut self) -> Result<Id, EngineError> {
        let len = self.party.members.len();
        if len >= MAX_PARTY_SIZE {
            return Err(Self::reject("add_member", EngineError::PartySize(len + 1)));
        }
        let (role, job) = DEFAULT_MEMBER;
        let member = Member::new(len as u32, role, job);
        let id = member.id.clone();
        self.commit("add_member", |p| p.members.push(member));
        Ok(id)
    }

    pub fn remove_member(&mut self, member_id: &str) -> Result<(), EngineError> {
        let len = self.party.members.len();
        if len <= MIN_PARTY_SIZE {
            return Err(Self::reject("remove_member", EngineError::PartySize(len.saturating_sub(1))));
        }
        let Some(index) = self.member_index(member_id) else {
            return Err(Self::reject("remove_member", EngineError::NotFound(member_id.into())));
        };
        self.commit("remove_member", |p| {
            p.members.remove(index);
            for (i, m) in p.members.iter_mut().enumerate() {
                m.order = i as u32;
            }
        });
        Ok(())
    }

    /// Grow from the default roster template or truncate from the tail.
    pub fn set_member_count(&mut self, count: usize) -> Result<(), EngineError> {
        if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&count) {
            return Err(Self::reject("set_member_count", EngineError::PartySize(count)));
        }
        self.commit("set_member_count", |p| {
            let current = p.members.len();
            if count > current {
                p.members.extend((current..count).map(roster_member));
            } else {
                p.members.truncate(count);
            }
        });
        Ok(())
    }

    // ── Placements ───────────────────────────────────────────────

    /// Place a skill for a member. Without an explicit lane the lowest free
    /// lane is chosen; skills missing from the catalog land on lane 0.
    pub fn add_skill(&mut self, member_id: &str, new: NewPlacement) -> Result<Id, EngineError> {
        let Some(index) = self.member_index(member_id) else {
            return Err(Self::reject("add_skill", EngineError::NotFound(member_id.into())));
        };
        if let Err(e) = check_lane(new.lane) {
            return Err(Self::reject("add_skill", e));
        }

        let lane = match (new.lane, self.catalog.get_skill_by_id(&new.skill_id)) {
            (Some(lane), _) => lane,
            (None, Some(skill)) => find_available_lane(
                &self.party.members[index].skill_placements,
                skill,
                new.time,
                None,
                &self.catalog,
            ),
            (None, None) => 0,
        };
        let placement = SkillPlacement {
            id: new_id(),
            skill_id: new.skill_id,
            time: new.time,
            lane: Some(lane),
            target: new.target,
            memo: new.memo,
        };
        let id = placement.id.clone();
        self.commit("add_skill", |p| p.members[index].skill_placements.push(placement));
        Ok(id)
    }

    /// A time change without an explicit lane re-runs lane assignment,
    /// ignoring the placement's own old position.
    pub fn update_skill(&mut self, placement_id: &str, patch: PlacementPatch) -> Result<(), EngineError> {
        self.update_skill_as("update_skill", placement_id, patch)
    }

    pub fn delete_skill(&mut self, placement_id: &str) -> Result<(), EngineError> {
        let Some((mi, pi)) = self.placement_index(placement_id) else {
            return Err(Self::reject("delete_skill", EngineError::NotFound(placement_id.into())));
        };
        self.commit("delete_skill", |p| {
            p.members[mi].skill_placements.remove(pi);
        });
        Ok(())
    }

    pub fn move_skill(&mut self, placement_id: &str, new_time: Ms) -> Result<(), EngineError> {
        self.update_skill_as(
            "move_skill",
            placement_id,
            PlacementPatch {
                time: Some(new_time),
                ..Default::default()
            },
        )
    }

    fn update_skill_as(&mut self, op: &'static str, placement_id: &str, patch: PlacementPatch) -> Result<(), EngineError> {
        let Some((mi, pi)) = self.placement_index(placement_id) else {
            return Err(Self::reject(op, EngineError::NotFound(placement_id.into())));
        };
        if let Err(e) = check_lane(patch.lane) {
            return Err(Self::reject(op, e));
        }

        let placements = &self.party.members[mi].skill_placements;
        let lane = match (patch.lane, patch.time) {
            (Some(lane), _) => Some(lane),
            (None, Some(time)) => self
                .catalog
                .get_skill_by_id(&placements[pi].skill_id)
                .map(|skill| find_available_lane(placements, skill, time, Some(placement_id), &self.catalog)),
            (None, None) => None,
        };

        self.commit(op, |p| {
            let sp = &mut p.members[mi].skill_placements[pi];
            apply(&mut sp.time, patch.time);
            if lane.is_some() {
                sp.lane = lane;
            }
            apply(&mut sp.target, patch.target);
            apply(&mut sp.memo, patch.memo);
        });
        Ok(())
    }
}
