//! User preferences: bot name, theme, background, and age-group persona.
//!
//! Each value is persisted independently by the store and has a documented
//! default, so a missing or unreadable entry never takes the app down.

pub const DEFAULT_BOT_NAME: &str = "Mindful Echo";
pub const DEFAULT_THEME: &str = "light";

/// Starter names offered by `/botname` when no argument is given.
pub const BOT_NAME_SUGGESTIONS: &[&str] = &[
    "SereneMate",
    "Mindful Echo",
    "SoulSync",
    "Healio",
    "AuraCare",
    "Zenith",
];

/// Age-group selector that picks the companion persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    Child,
    Teenager,
    Adult,
    GrownAdult,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [
        AgeGroup::Child,
        AgeGroup::Teenager,
        AgeGroup::Adult,
        AgeGroup::GrownAdult,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::Teenager => "teenager",
            AgeGroup::Adult => "adult",
            AgeGroup::GrownAdult => "grown-adult",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Child => "Child",
            AgeGroup::Teenager => "Teenager",
            AgeGroup::Adult => "Adult",
            AgeGroup::GrownAdult => "Grown Adult",
        }
    }

    pub fn parse(value: &str) -> Option<AgeGroup> {
        match value {
            "child" => Some(AgeGroup::Child),
            "teenager" => Some(AgeGroup::Teenager),
            "adult" => Some(AgeGroup::Adult),
            "grown-adult" => Some(AgeGroup::GrownAdult),
            _ => None,
        }
    }
}

impl Default for AgeGroup {
    fn default() -> Self {
        AgeGroup::Adult
    }
}

#[derive(Debug, Clone)]
pub struct Preferences {
    pub bot_name: String,
    pub theme: String,
    /// Optional color spec overriding the active theme's background.
    pub custom_background: Option<String>,
    pub age_group: AgeGroup,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            bot_name: DEFAULT_BOT_NAME.to_string(),
            theme: DEFAULT_THEME.to_string(),
            custom_background: None,
            age_group: AgeGroup::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_groups_round_trip_their_string_forms() {
        for group in AgeGroup::ALL {
            assert_eq!(AgeGroup::parse(group.as_str()), Some(group));
        }
    }

    #[test]
    fn unknown_age_group_strings_are_rejected() {
        assert_eq!(AgeGroup::parse("elder"), None);
        assert_eq!(AgeGroup::parse(""), None);
        assert_eq!(AgeGroup::parse("Adult"), None);
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let prefs = Preferences::default();
        assert_eq!(prefs.bot_name, "Mindful Echo");
        assert_eq!(prefs.theme, "light");
        assert_eq!(prefs.custom_background, None);
        assert_eq!(prefs.age_group, AgeGroup::Adult);
    }
}
