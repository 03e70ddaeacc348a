use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Milliseconds from the start of the fight.
pub type Ms = i64;

/// Document identifiers are opaque strings so externally authored files round-trip.
pub type Id = String;

/// Fresh identifier for entities created by the engine.
pub fn new_id() -> Id {
    Ulid::new().to_string()
}

/// RFC 3339 UTC timestamp with millisecond precision, as stored in `createdAt`/`updatedAt`.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Strict overlap. Touching endpoints do not overlap, and an empty span
    /// overlaps nothing, itself included.
    pub fn overlaps(&self, other: &Span) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && self.end > other.start
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

// ── Content (the fight timeline) ─────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: Id,
    pub raid_name: String,
    pub boss_name: String,
    pub duration: Ms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
    pub phases: Vec<Phase>,
    #[serde(default)]
    pub gimmicks: Vec<Gimmick>,
    #[serde(default)]
    pub burst_timings: Vec<BurstTiming>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_memos: Option<Vec<TimelineMemo>>,
}

impl Content {
    /// A content with a single phase covering `[0, duration)`.
    pub fn new(raid_name: impl Into<String>, boss_name: impl Into<String>, duration: Ms) -> Self {
        Self {
            id: new_id(),
            raid_name: raid_name.into(),
            boss_name: boss_name.into(),
            duration,
            targets: None,
            phases: vec![Phase {
                id: new_id(),
                name: "Phase 1".into(),
                start_time: 0,
                end_time: duration,
                color: crate::limits::phase_color(0).into(),
            }],
            gimmicks: Vec::new(),
            burst_timings: Vec::new(),
            timeline_memos: None,
        }
    }

    pub fn phase(&self, id: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    pub fn phase_index(&self, id: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.id == id)
    }

    /// The phase whose interval contains `t`.
    pub fn phase_at(&self, t: Ms) -> Option<&Phase> {
        self.phases.iter().find(|p| p.span().contains_instant(t))
    }

    pub fn gimmick(&self, id: &str) -> Option<&Gimmick> {
        self.gimmicks.iter().find(|g| g.id == id)
    }

    pub fn gimmicks_in_phase<'a>(&'a self, phase_id: &'a str) -> impl Iterator<Item = &'a Gimmick> {
        self.gimmicks.iter().filter(move |g| g.phase_id == phase_id)
    }

    pub fn memos(&self) -> &[TimelineMemo] {
        self.timeline_memos.as_deref().unwrap_or_default()
    }

    /// Checks that the phases partition `[0, duration)` without gaps or overlaps.
    pub fn check_partition(&self) -> Result<(), PartitionError> {
        let Some(first) = self.phases.first() else {
            return Err(PartitionError::NoPhases);
        };
        if first.start_time != 0 {
            return Err(PartitionError::FirstPhaseStart(first.start_time));
        }
        for (i, phase) in self.phases.iter().enumerate() {
            if phase.start_time >= phase.end_time {
                return Err(PartitionError::EmptyPhase(phase.id.clone()));
            }
            if let Some(next) = self.phases.get(i + 1)
                && next.start_time != phase.end_time
            {
                return Err(PartitionError::Discontinuity {
                    at: phase.end_time,
                    next_start: next.start_time,
                });
            }
        }
        let last_end = self.phases[self.phases.len() - 1].end_time;
        if last_end != self.duration {
            return Err(PartitionError::LastPhaseEnd {
                end: last_end,
                duration: self.duration,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    NoPhases,
    FirstPhaseStart(Ms),
    EmptyPhase(Id),
    Discontinuity { at: Ms, next_start: Ms },
    LastPhaseEnd { end: Ms, duration: Ms },
}

impl std::fmt::Display for PartitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionError::NoPhases => write!(f, "timeline has no phases"),
            PartitionError::FirstPhaseStart(t) => write!(f, "first phase starts at {t}, not 0"),
            PartitionError::EmptyPhase(id) => write!(f, "phase {id} is empty"),
            PartitionError::Discontinuity { at, next_start } => {
                write!(f, "phase boundary at {at} does not meet next phase start {next_start}")
            }
            PartitionError::LastPhaseEnd { end, duration } => {
                write!(f, "last phase ends at {end} but duration is {duration}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: Id,
    pub name: String,
    pub start_time: Ms,
    pub end_time: Ms,
    pub color: String,
}

impl Phase {
    pub fn span(&self) -> Span {
        Span::new(self.start_time, self.end_time.max(self.start_time))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gimmick {
    pub id: Id,
    pub name: String,
    pub time: Ms,
    pub cast_duration: Ms,
    pub phase_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<GimmickCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_type: Option<DamageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<MitigationLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<TargetType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanics: Option<Vec<String>>,
}

impl Gimmick {
    /// Legacy entries carry none of the tactical metadata.
    pub fn is_classified(&self) -> bool {
        self.category.is_some()
            || self.severity.is_some()
            || self.mitigation.is_some()
            || self.targets.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GimmickCategory {
    Raidwide,
    Tankbuster,
    Stack,
    Spread,
    Tower,
    Proximity,
    Mechanic,
    Transition,
    Enrage,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Physical,
    Magical,
    None,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MitigationLevel {
    None,
    Optional,
    Recommended,
    Required,
    Invuln,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    All,
    Tanks,
    Healers,
    Dps,
    Mt,
    St,
    Random,
}

/// Advisory high-output window. Bursts may overlap anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurstTiming {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_time: Ms,
    pub end_time: Ms,
}

impl BurstTiming {
    pub fn span(&self) -> Span {
        Span::new(self.start_time, self.end_time.max(self.start_time))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMemo {
    pub id: Id,
    pub time: Ms,
    pub text: String,
}

// ── Party (the plan) ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Tank,
    Healer,
    #[serde(rename = "DPS")]
    Dps,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tank => "Tank",
            Role::Healer => "Healer",
            Role::Dps => "DPS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id: Id,
    pub name: String,
    /// Reference only; a dangling id is left for the caller to notice.
    pub content_id: Id,
    pub members: Vec<Member>,
    pub created_at: String,
    pub updated_at: String,
}

impl Party {
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Finds a placement and the member that owns it.
    pub fn placement(&self, id: &str) -> Option<(&Member, &SkillPlacement)> {
        self.members.iter().find_map(|m| {
            m.skill_placements
                .iter()
                .find(|p| p.id == id)
                .map(|p| (m, p))
        })
    }

    pub fn placements(&self) -> impl Iterator<Item = (&Member, &SkillPlacement)> {
        self.members
            .iter()
            .flat_map(|m| m.skill_placements.iter().map(move |p| (m, p)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Id,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    pub role: Role,
    pub job: String,
    #[serde(default)]
    pub skill_placements: Vec<SkillPlacement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

impl Member {
    pub fn new(order: u32, role: Role, job: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            order,
            player_name: None,
            role,
            job: job.into(),
            skill_placements: Vec::new(),
            collapsed: None,
        }
    }

    /// Player name when known, job name otherwise.
    pub fn display_name(&self) -> &str {
        self.player_name.as_deref().unwrap_or(&self.job)
    }
}

/// One planned use of a catalog skill. The occupied intervals are derived
/// from the catalog at query time and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillPlacement {
    pub id: Id,
    pub skill_id: Id,
    pub time: Ms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl SkillPlacement {
    pub fn lane(&self) -> u8 {
        self.lane.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // adjacent, not overlapping
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn span_single_ms_overlap() {
        assert!(Span::new(100, 201).overlaps(&Span::new(200, 300)));
    }

    #[test]
    fn empty_span_overlaps_nothing() {
        let empty = Span::new(150, 150);
        assert!(!empty.overlaps(&empty));
        assert!(!empty.overlaps(&Span::new(100, 200)));
        assert!(!Span::new(100, 200).overlaps(&empty));
        assert!(!empty.overlaps(&Span::new(150, 160)));
        assert!(!empty.contains_instant(150));
    }

    #[test]
    fn new_content_is_a_single_partition() {
        let content = Content::new("Raid", "Boss", 600_000);
        assert_eq!(content.phases.len(), 1);
        assert_eq!(content.phases[0].span(), Span::new(0, 600_000));
        assert_eq!(content.check_partition(), Ok(()));
    }

    #[test]
    fn partition_detects_gap() {
        let mut content = Content::new("Raid", "Boss", 600_000);
        content.phases[0].end_time = 100_000;
        content.phases.push(Phase {
            id: "p2".into(),
            name: "Phase 2".into(),
            start_time: 120_000,
            end_time: 600_000,
            color: "#fff".into(),
        });
        assert_eq!(
            content.check_partition(),
            Err(PartitionError::Discontinuity {
                at: 100_000,
                next_start: 120_000
            })
        );
    }

    #[test]
    fn partition_detects_short_last_phase() {
        let mut content = Content::new("Raid", "Boss", 600_000);
        content.phases[0].end_time = 500_000;
        assert!(matches!(
            content.check_partition(),
            Err(PartitionError::LastPhaseEnd { .. })
        ));
    }

    #[test]
    fn phase_at_uses_half_open_bounds() {
        let mut content = Content::new("Raid", "Boss", 600_000);
        content.phases[0].end_time = 120_000;
        content.phases.push(Phase {
            id: "p2".into(),
            name: "Phase 2".into(),
            start_time: 120_000,
            end_time: 600_000,
            color: "#fff".into(),
        });
        assert_eq!(content.phase_at(119_999).unwrap().id, content.phases[0].id);
        assert_eq!(content.phase_at(120_000).unwrap().id, "p2");
        assert!(content.phase_at(600_000).is_none());
    }

    #[test]
    fn legacy_gimmick_keeps_absent_fields_absent() {
        let json = r#"{"id":"g1","name":"Raidwide","time":15000,"castDuration":3000,"phaseId":"p1"}"#;
        let gimmick: Gimmick = serde_json::from_str(json).unwrap();
        assert!(!gimmick.is_classified());
        assert_eq!(serde_json::to_string(&gimmick).unwrap(), json);
    }

    #[test]
    fn role_serializes_with_upper_case_dps() {
        assert_eq!(serde_json::to_string(&Role::Dps).unwrap(), "\"DPS\"");
        let role: Role = serde_json::from_str("\"Healer\"").unwrap();
        assert_eq!(role, Role::Healer);
    }

    #[test]
    fn member_display_name_falls_back_to_job() {
        let mut m = Member::new(0, Role::Tank, "Paladin");
        assert_eq!(m.display_name(), "Paladin");
        m.player_name = Some("Alice".into());
        assert_eq!(m.display_name(), "Alice");
    }

    #[test]
    fn placement_without_lane_defaults_to_zero() {
        let json = r#"{"id":"s1","skillId":"TANK_REPRISAL","time":10000}"#;
        let p: SkillPlacement = serde_json::from_str(json).unwrap();
        assert_eq!(p.lane, None);
        assert_eq!(p.lane(), 0);
        assert_eq!(serde_json::to_string(&p).unwrap(), json);
    }
}
