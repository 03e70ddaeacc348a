use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Id, Ms, Role, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    #[serde(alias = "軽減")]
    Mitigation,
    #[serde(alias = "バフ")]
    Buff,
    #[serde(alias = "バリア")]
    Barrier,
    #[serde(alias = "薬")]
    Consumable,
}

/// A catalog entry. All durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    pub job: Option<String>,
    /// Set for abilities shared by every member of a role.
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_time: Option<Ms>,
    pub recast: Ms,
    pub duration: Ms,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_mitigation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magical_mitigation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buff_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invincible: Option<bool>,
}

impl Skill {
    /// Window in which the skill is on cooldown: `[time, time + recast)`.
    /// The end saturates at `Ms::MAX`.
    pub fn recast_span(&self, time: Ms) -> Span {
        Span::new(time, time.saturating_add(self.recast.max(0)))
    }

    /// Window in which the effect is active: `[time, time + duration)`.
    pub fn effect_span(&self, time: Ms) -> Span {
        Span::new(time, time.saturating_add(self.duration.max(0)))
    }

    pub fn is_role_shared(&self) -> bool {
        self.role.is_some()
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Id,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleSkills {
    #[serde(rename = "Tank", default)]
    pub tank: Vec<Skill>,
    #[serde(rename = "Healer", default)]
    pub healer: Vec<Skill>,
    #[serde(rename = "DPS", default)]
    pub dps: Vec<Skill>,
}

impl RoleSkills {
    pub fn for_role(&self, role: Role) -> &[Skill] {
        match role {
            Role::Tank => &self.tank,
            Role::Healer => &self.healer,
            Role::Dps => &self.dps,
        }
    }
}

/// Wire shape of the catalog file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMaster {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub role_skills: RoleSkills,
    #[serde(default)]
    pub common_skills: Vec<Skill>,
}

/// Where a skill lives inside the master lists.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Job(usize, usize),
    Role(Role, usize),
    Common(usize),
}

/// Immutable, indexed skill catalog. Built once at startup and shared by
/// reference (`Arc<SkillCatalog>`) with every editor and view.
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    master: SkillMaster,
    index: HashMap<Id, Slot>,
}

impl SkillCatalog {
    pub fn new(master: SkillMaster) -> Self {
        let mut index = HashMap::new();
        // First definition wins, in job → role → common order.
        for (ji, job) in master.jobs.iter().enumerate() {
            for (si, skill) in job.skills.iter().enumerate() {
                index.entry(skill.id.clone()).or_insert(Slot::Job(ji, si));
            }
        }
        for role in [Role::Tank, Role::Healer, Role::Dps] {
            for (si, skill) in master.role_skills.for_role(role).iter().enumerate() {
                index.entry(skill.id.clone()).or_insert(Slot::Role(role, si));
            }
        }
        for (si, skill) in master.common_skills.iter().enumerate() {
            index.entry(skill.id.clone()).or_insert(Slot::Common(si));
        }
        tracing::debug!(skills = index.len(), jobs = master.jobs.len(), "skill catalog indexed");
        Self { master, index }
    }

    pub fn master(&self) -> &SkillMaster {
        &self.master
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get_skill_by_id(&self, id: &str) -> Option<&Skill> {
        match *self.index.get(id)? {
            Slot::Job(ji, si) => self.master.jobs.get(ji)?.skills.get(si),
            Slot::Role(role, si) => self.master.role_skills.for_role(role).get(si),
            Slot::Common(si) => self.master.common_skills.get(si),
        }
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.master.jobs.iter().find(|j| j.name == name)
    }

    pub fn jobs_by_role(&self, role: Role) -> impl Iterator<Item = &Job> {
        self.master.jobs.iter().filter(move |j| j.role == role)
    }

    /// Job skills, then the job's role skills, then common skills.
    /// Unknown jobs have no skills.
    pub fn skills_for_job(&self, job_name: &str) -> Vec<&Skill> {
        let Some(job) = self.job(job_name) else {
            return Vec::new();
        };
        job.skills
            .iter()
            .chain(self.master.role_skills.for_role(job.role))
            .chain(&self.master.common_skills)
            .collect()
    }

    pub fn skills_for_role(&self, role: Role) -> Vec<&Skill> {
        self.master
            .role_skills
            .for_role(role)
            .iter()
            .chain(&self.master.common_skills)
            .collect()
    }

    /// Ids that survive a job change within the same role.
    pub fn role_and_common_skill_ids(&self, role: Role) -> Vec<Id> {
        self.skills_for_role(role).into_iter().map(|s| s.id.clone()).collect()
    }
}
