//! Monster definition loaded from RON.

use serde::{Deserialize, Serialize};

use crate::battle::MonsterSpec;
use crate::bestiary::Behavior;
use crate::error::{BattleError, Result};
use crate::stats::{StatBlock, Status};

/// A monster as written in a content file.
///
/// # Example RON
///
/// ```ron
/// MonsterData(
///     name: "Bore Mite",
///     experience: 50,
///     base: (hp: 50, off: 10, def: 6, psy: 6, dmg_phy: 2),
///     behavior: Skittish(
///         guard_chance: 0.15,
///         chatter_chance: 0.15,
///         chatter: "{name} lets out a series of clicks.",
///     ),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterData {
    /// Display name.
    pub name: String,

    /// Experience yielded when defeated.
    #[serde(default)]
    pub experience: u32,

    /// Base stats. Omitted fields are zero.
    pub base: StatBlock,

    /// Status effects the monster starts with.
    #[serde(default)]
    pub statuses: Vec<Status>,

    /// How the monster picks its actions.
    #[serde(default)]
    pub behavior: Behavior,
}

impl MonsterData {
    /// Build the battle-ready spec.
    #[must_use]
    pub fn to_spec(&self) -> MonsterSpec {
        let mut spec = MonsterSpec::new(self.name.clone(), self.base, self.experience);
        spec.statuses.clone_from(&self.statuses);
        spec.decision = self.behavior.clone().into_decision();
        spec
    }

    /// Check for content mistakes the type system cannot rule out.
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Monster has an empty name".to_string());
        }
        if self.base.hp <= 0 {
            errors.push(format!("Monster '{}' has no hit points", self.name));
        }

        let probabilities: Vec<(&str, f64)> = match &self.behavior {
            Behavior::Skittish {
                guard_chance,
                chatter_chance,
                ..
            } => vec![
                ("guard_chance", *guard_chance),
                ("chatter_chance", *chatter_chance),
                ("guard_chance + chatter_chance", guard_chance + chatter_chance),
            ],
            Behavior::Brute {
                guard_chance,
                windup_chance,
                windup_ticks,
                ..
            } => {
                if *windup_ticks <= 0 {
                    errors.push(format!(
                        "Monster '{}' has a non-positive windup_ticks {}",
                        self.name, windup_ticks
                    ));
                }
                vec![("guard_chance", *guard_chance), ("windup_chance", *windup_chance)]
            }
            Behavior::Steady | Behavior::Scripted { .. } => Vec::new(),
        };
        for (label, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                errors.push(format!(
                    "Monster '{}' has {label} {p} outside 0..=1",
                    self.name
                ));
            }
        }

        errors
    }
}

fn parse_error(label: &str, err: &ron::error::SpannedError) -> BattleError {
    BattleError::DataParse {
        path: label.to_string(),
        message: err.to_string(),
    }
}

/// Parse a single monster. `label` names the source in errors.
pub fn parse_monster(label: &str, text: &str) -> Result<MonsterData> {
    ron::from_str(text).map_err(|e| parse_error(label, &e))
}

/// Parse a list of monsters. `label` names the source in errors.
pub fn parse_roster(label: &str, text: &str) -> Result<Vec<MonsterData>> {
    ron::from_str(text).map_err(|e| parse_error(label, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MITE: &str = r#"MonsterData(
        name: "Bore Mite",
        experience: 50,
        base: (hp: 50, off: 10, def: 6, psy: 6, dmg_phy: 2),
        behavior: Skittish(
            guard_chance: 0.15,
            chatter_chance: 0.15,
            chatter: "{name} lets out a series of clicks.",
        ),
    )"#;

    #[test]
    fn test_parse_monster() {
        let data = parse_monster("mite.ron", MITE).unwrap();
        assert_eq!(data.name, "Bore Mite");
        assert_eq!(data.base.dmg_phy, 2);
        assert_eq!(data.base.res_phy, 0);
        assert!(data.validate().is_empty());

        let spec = data.to_spec();
        assert_eq!(spec.experience, 50);
        assert!(spec.decision.is_some());
    }

    #[test]
    fn test_steady_has_no_decision() {
        let data = parse_monster("rat.ron", r#"(name: "Rat", base: (hp: 5, off: 3, def: 2, psy: 1))"#).unwrap();
        assert_eq!(data.behavior, Behavior::Steady);
        assert!(data.to_spec().decision.is_none());
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = parse_roster("broken.ron", "[ (name: ").unwrap_err();
        assert!(matches!(err, BattleError::DataParse { ref path, .. } if path == "broken.ron"));
    }

    #[test]
    fn test_validate_catches_bad_probabilities() {
        let mut data = parse_monster("mite.ron", MITE).unwrap();
        data.behavior = Behavior::Skittish {
            guard_chance: 0.8,
            chatter_chance: 0.4,
            chatter: String::new(),
        };
        data.base.hp = 0;
        let errors = data.validate();
        assert_eq!(errors.len(), 2);
    }
}
