//! JSON import and export of the three documents.
//!
//! An import either yields a document that satisfies every structural
//! invariant or fails; nothing is repaired or partially applied.

use std::path::{Path, PathBuf};

use crate::catalog::{SkillCatalog, SkillMaster};
use crate::limits::{MAX_LANES, MAX_PARTY_SIZE, MIN_PARTY_SIZE};
use crate::model::*;

#[derive(Debug)]
pub enum ImportError {
    Io { path: PathBuf, source: std::io::Error },
    Json { document: &'static str, message: String },
    Invalid { document: &'static str, reason: String },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            ImportError::Json { document, message } => write!(f, "malformed {document} JSON: {message}"),
            ImportError::Invalid { document, reason } => write!(f, "invalid {document}: {reason}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(document: &'static str, json: &str) -> Result<T, ImportError> {
    serde_json::from_str(json).map_err(|e| ImportError::Json {
        document,
        message: e.to_string(),
    })
}

pub fn import_content(json: &str) -> Result<Content, ImportError> {
    let content: Content = parse("content", json)?;
    content.check_partition().map_err(|e| ImportError::Invalid {
        document: "content",
        reason: e.to_string(),
    })?;
    tracing::debug!(id = %content.id, phases = content.phases.len(), gimmicks = content.gimmicks.len(), "content imported");
    Ok(content)
}

/// The imported party gets a fresh id and timestamps so it never collides
/// with the party it was exported from.
pub fn import_party(json: &str) -> Result<Party, ImportError> {
    let mut party: Party = parse("party", json)?;
    let invalid = |reason: String| ImportError::Invalid {
        document: "party",
        reason,
    };

    let size = party.members.len();
    if !(MIN_PARTY_SIZE..=MAX_PARTY_SIZE).contains(&size) {
        return Err(invalid(format!(
            "{size} members, expected {MIN_PARTY_SIZE} to {MAX_PARTY_SIZE}"
        )));
    }
    if let Some((member, placement)) = party.placements().find(|(_, p)| p.lane() >= MAX_LANES) {
        return Err(invalid(format!(
            "placement {} of member {} is on lane {}",
            placement.id,
            member.id,
            placement.lane()
        )));
    }

    let source_id = std::mem::replace(&mut party.id, new_id());
    let now = now_timestamp();
    party.created_at = now.clone();
    party.updated_at = now;
    tracing::debug!(%source_id, id = %party.id, members = size, "party imported");
    Ok(party)
}

pub fn import_catalog(json: &str) -> Result<SkillCatalog, ImportError> {
    let master: SkillMaster = parse("catalog", json)?;
    Ok(SkillCatalog::new(master))
}

pub fn export_content(content: &Content) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(content)
}

pub fn export_party(party: &Party) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(party)
}

// ── File loading ─────────────────────────────────────────────────

/// Everything a planning session starts from.
#[derive(Debug)]
pub struct LoadedPlan {
    pub catalog: SkillCatalog,
    pub content: Content,
    pub party: Option<Party>,
}

async fn read(path: &Path) -> Result<String, ImportError> {
    tokio::fs::read_to_string(path).await.map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the catalog, content and optional party files concurrently, then
/// import each.
pub async fn load_plan(catalog: &Path, content: &Path, party: Option<&Path>) -> Result<LoadedPlan, ImportError> {
    let party_read = async {
        match party {
            Some(path) => read(path).await.map(Some),
            None => Ok(None),
        }
    };
    let (catalog_json, content_json, party_json) = tokio::try_join!(read(catalog), read(content), party_read)?;

    Ok(LoadedPlan {
        catalog: import_catalog(&catalog_json)?,
        content: import_content(&content_json)?,
        party: party_json.as_deref().map(import_party).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::create_party;

    const CONTENT: &str = r##"{
        "id": "c1",
        "raidName": "Raid",
        "bossName": "Boss",
        "duration": 600000,
        "phases": [
            { "id": "p1", "name": "Phase 1", "startTime": 0, "endTime": 120000, "color": "#60A5FA" },
            { "id": "p2", "name": "Phase 2", "startTime": 120000, "endTime": 600000, "color": "#34D399" }
        ],
        "gimmicks": [
            { "id": "g1", "name": "Raidwide", "time": 150000, "castDuration": 3000, "phaseId": "p2" }
        ],
        "burstTimings": []
    }"##;

    const CATALOG: &str = r##"{
        "jobs": [
            { "id": "PLD", "name": "Paladin", "role": "Tank", "color": "#A8D2E6", "skills": [
                { "id": "PLD_SENTINEL", "name": "Sentinel", "job": "Paladin", "recast": 120000,
                  "duration": 15000, "type": "軽減", "physicalMitigation": 30, "magicalMitigation": 30 }
            ] }
        ],
        "roleSkills": { "Tank": [], "Healer": [], "DPS": [] },
        "commonSkills": []
    }"##;

    #[test]
    fn content_round_trips() {
        let content = import_content(CONTENT).unwrap();
        assert_eq!(content.phases.len(), 2);
        assert_eq!(content.gimmicks[0].category, None);
        let again = import_content(&export_content(&content).unwrap()).unwrap();
        assert_eq!(again, content);
    }

    #[test]
    fn broken_partition_is_rejected() {
        let gap = CONTENT.replace(r#""startTime": 120000"#, r#""startTime": 130000"#);
        assert!(matches!(
            import_content(&gap),
            Err(ImportError::Invalid { document: "content", .. })
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = import_content("{ nope").unwrap_err();
        assert!(matches!(err, ImportError::Json { document: "content", .. }));
        assert!(err.to_string().starts_with("malformed content JSON"));
    }

    #[test]
    fn party_import_assigns_fresh_identity() {
        let mut original = create_party("Static", "c1");
        original.created_at = "2020-01-01T00:00:00.000Z".into();
        let json = export_party(&original).unwrap();
        let imported = import_party(&json).unwrap();
        assert_ne!(imported.id, original.id);
        assert_ne!(imported.created_at, original.created_at);
        assert_eq!(imported.members, original.members);
    }

    #[test]
    fn party_size_and_lanes_are_checked() {
        let mut party = create_party("Static", "c1");
        party.members.truncate(1);
        let err = import_party(&export_party(&party).unwrap()).unwrap_err();
        assert!(matches!(err, ImportError::Invalid { document: "party", .. }));

        let mut party = create_party("Static", "c1");
        party.members[0].skill_placements.push(SkillPlacement {
            id: "sp".into(),
            skill_id: "X".into(),
            time: 0,
            lane: Some(MAX_LANES),
            target: None,
            memo: None,
        });
        assert!(import_party(&export_party(&party).unwrap()).is_err());
    }

    #[test]
    fn far_future_placements_survive_derived_views() {
        use crate::catalog::fixtures::catalog;
        use crate::engine::{aggregate_mitigation, detect_interference};

        let catalog = catalog();
        let mut party = create_party("Static", "c1");
        for (i, member) in party.members.iter_mut().take(2).enumerate() {
            member.skill_placements.push(SkillPlacement {
                id: format!("sp{i}"),
                skill_id: "TANK_REPRISAL".into(),
                time: Ms::MAX - 5,
                lane: Some(0),
                target: None,
                memo: None,
            });
        }
        let imported = import_party(&export_party(&party).unwrap()).unwrap();

        let curve = aggregate_mitigation(&imported, &catalog, 60_000);
        assert_eq!(curve.max_physical, 0.0);
        let flags = detect_interference(&imported, &catalog);
        assert!(flags["sp0"].has_interference && flags["sp1"].has_interference);
    }

    #[test]
    fn catalog_accepts_legacy_type_labels() {
        let catalog = import_catalog(CATALOG).unwrap();
        let sentinel = catalog.get_skill_by_id("PLD_SENTINEL").unwrap();
        assert_eq!(sentinel.skill_type, crate::catalog::SkillType::Mitigation);
        assert_eq!(catalog.skills_for_job("Paladin").len(), 1);
    }

    fn scratch(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("raidplan-{}-{name}", new_id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn load_plan_reads_all_documents() {
        let catalog = scratch("catalog.json", CATALOG);
        let content = scratch("content.json", CONTENT);
        let party = scratch("party.json", &export_party(&create_party("Static", "c1")).unwrap());

        let plan = tokio_test::block_on(load_plan(&catalog, &content, Some(&party))).unwrap();
        assert_eq!(plan.content.id, "c1");
        assert_eq!(plan.party.unwrap().members.len(), 8);
        assert_eq!(plan.catalog.len(), 1);

        let plan = tokio_test::block_on(load_plan(&catalog, &content, None)).unwrap();
        assert!(plan.party.is_none());

        for p in [catalog, content, party] {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn load_plan_reports_missing_file() {
        let missing = std::env::temp_dir().join(format!("raidplan-missing-{}", new_id()));
        let err = tokio_test::block_on(load_plan(&missing, &missing, None)).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
