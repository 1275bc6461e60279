//! Team name resolution
//!
//! Maps free-text team identifiers from the feed onto directory entries. The
//! directory never creates teams; unknown names are reported to the caller.

use crate::data::Database;
use crate::{Result, Team};
use std::fmt;

/// Placeholder the feed uses for a side that is not decided yet
pub const TBD_PLACEHOLDER: &str = "TBD";

/// Why a feed name could not be mapped to a single team
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Empty or "TBD"; the match is not scheduled yet
    Placeholder,
    /// No team has this name or short code
    Unknown,
    /// Several teams share this canonical name
    NameConflict(usize),
    /// Several teams share this short code
    ShortNameConflict(usize),
}

impl UnresolvedReason {
    /// Placeholders are expected feed noise, everything else needs directory fixes
    pub fn needs_attention(&self) -> bool {
        !matches!(self, UnresolvedReason::Placeholder)
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::Placeholder => write!(f, "placeholder"),
            UnresolvedReason::Unknown => write!(f, "unknown team"),
            UnresolvedReason::NameConflict(n) => write!(f, "name conflict ({} teams)", n),
            UnresolvedReason::ShortNameConflict(n) => {
                write!(f, "short name conflict ({} teams)", n)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Team),
    Unresolved(UnresolvedReason),
}

/// Read-only view over the team table
pub struct TeamDirectory<'a> {
    db: &'a Database,
}

impl<'a> TeamDirectory<'a> {
    pub fn new(db: &'a Database) -> Self {
        TeamDirectory { db }
    }

    /// Resolve by exact canonical name, then by exact short code
    pub fn resolve(&self, name: &str) -> Result<Resolution> {
        if name.is_empty() || name == TBD_PLACEHOLDER {
            return Ok(Resolution::Unresolved(UnresolvedReason::Placeholder));
        }

        let mut by_name = self.db.teams_by_name(name)?;
        match by_name.len() {
            0 => {}
            1 => return Ok(Resolution::Resolved(by_name.remove(0))),
            n => return Ok(Resolution::Unresolved(UnresolvedReason::NameConflict(n))),
        }

        let mut by_short_name = self.db.teams_by_short_name(name)?;
        Ok(match by_short_name.len() {
            0 => Resolution::Unresolved(UnresolvedReason::Unknown),
            1 => Resolution::Resolved(by_short_name.remove(0)),
            n => Resolution::Unresolved(UnresolvedReason::ShortNameConflict(n)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewTeam, Region};

    fn seed(db: &Database, name: &str, short_name: &str, region: Region) -> Team {
        db.insert_team(&NewTeam {
            continuity_id: 0,
            name: name.to_string(),
            short_name: short_name.to_string(),
            region,
        })
        .unwrap()
    }

    #[test]
    fn test_placeholders_are_unresolved() {
        let db = Database::in_memory().unwrap();
        let directory = TeamDirectory::new(&db);
        for name in ["", "TBD"] {
            assert_eq!(
                directory.resolve(name).unwrap(),
                Resolution::Unresolved(UnresolvedReason::Placeholder)
            );
        }
        assert!(!UnresolvedReason::Placeholder.needs_attention());
    }

    #[test]
    fn test_resolve_by_name_then_short_name() {
        let db = Database::in_memory().unwrap();
        let fnatic = seed(&db, "Fnatic", "FNC", Region::Europe);
        let directory = TeamDirectory::new(&db);

        assert_eq!(
            directory.resolve("Fnatic").unwrap(),
            Resolution::Resolved(fnatic.clone())
        );
        assert_eq!(
            directory.resolve("FNC").unwrap(),
            Resolution::Resolved(fnatic)
        );
    }

    #[test]
    fn test_canonical_name_wins_over_short_name() {
        let db = Database::in_memory().unwrap();
        // One team's short code equals another team's full name
        let g2 = seed(&db, "G2", "G2", Region::Europe);
        seed(&db, "Gamers2", "G2", Region::Europe);
        let directory = TeamDirectory::new(&db);

        assert_eq!(directory.resolve("G2").unwrap(), Resolution::Resolved(g2));
    }

    #[test]
    fn test_short_name_conflict() {
        let db = Database::in_memory().unwrap();
        seed(&db, "Team Liquid", "TL", Region::NorthAmerica);
        seed(&db, "Team Legends", "TL", Region::China);
        let directory = TeamDirectory::new(&db);

        let resolution = directory.resolve("TL").unwrap();
        assert_eq!(
            resolution,
            Resolution::Unresolved(UnresolvedReason::ShortNameConflict(2))
        );
    }

    #[test]
    fn test_unknown_team() {
        let db = Database::in_memory().unwrap();
        seed(&db, "Fnatic", "FNC", Region::Europe);
        let directory = TeamDirectory::new(&db);

        let resolution = directory.resolve("fnatic").unwrap();
        assert_eq!(resolution, Resolution::Unresolved(UnresolvedReason::Unknown));
        assert!(UnresolvedReason::Unknown.needs_attention());
    }
}
