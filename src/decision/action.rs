//! The closed set of actions a provider may choose for an agent

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Symbolic action chosen for one agent
///
/// The domain layer owns what each action means; this crate only carries it.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Safe no-op, used whenever nothing better is known
    #[default]
    #[display(fmt = "IDLE")]
    Idle,
    #[display(fmt = "EAT")]
    Eat,
    #[display(fmt = "SLEEP")]
    Sleep,
    #[display(fmt = "MINE")]
    Mine,
    #[display(fmt = "FARM")]
    Farm,
    #[display(fmt = "GATHER")]
    Gather,
    #[display(fmt = "BUILD")]
    Build,
    #[display(fmt = "CRAFT")]
    Craft,
    #[display(fmt = "TRADE")]
    Trade,
    #[display(fmt = "SOCIALIZE")]
    Socialize,
    #[display(fmt = "PATROL")]
    Patrol,
    #[display(fmt = "DEFEND")]
    Defend,
    #[display(fmt = "FLEE")]
    Flee,
    #[display(fmt = "EXPLORE")]
    Explore,
    #[display(fmt = "HEAL")]
    Heal,
    #[display(fmt = "PRAY")]
    Pray,
}

impl Action {
    pub const ALL: [Action; 16] = [
        Action::Idle,
        Action::Eat,
        Action::Sleep,
        Action::Mine,
        Action::Farm,
        Action::Gather,
        Action::Build,
        Action::Craft,
        Action::Trade,
        Action::Socialize,
        Action::Patrol,
        Action::Defend,
        Action::Flee,
        Action::Explore,
        Action::Heal,
        Action::Pray,
    ];

    /// Wire name, e.g. `"SOCIALIZE"`
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Idle => "IDLE",
            Action::Eat => "EAT",
            Action::Sleep => "SLEEP",
            Action::Mine => "MINE",
            Action::Farm => "FARM",
            Action::Gather => "GATHER",
            Action::Build => "BUILD",
            Action::Craft => "CRAFT",
            Action::Trade => "TRADE",
            Action::Socialize => "SOCIALIZE",
            Action::Patrol => "PATROL",
            Action::Defend => "DEFEND",
            Action::Flee => "FLEE",
            Action::Explore => "EXPLORE",
            Action::Heal => "HEAL",
            Action::Pray => "PRAY",
        }
    }

    /// Match a single token against the action names and common synonyms.
    pub fn from_token(token: &str) -> Option<Action> {
        let upper = token
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphanumeric())
            .to_ascii_uppercase();
        let action = match upper.as_str() {
            "IDLE" | "WAIT" | "NONE" | "REST" => Action::Idle,
            "EAT" | "EATING" | "FEED" => Action::Eat,
            "SLEEP" | "SLEEPING" => Action::Sleep,
            "MINE" | "MINING" => Action::Mine,
            "FARM" | "FARMING" | "HARVEST" => Action::Farm,
            "GATHER" | "GATHERING" | "FORAGE" => Action::Gather,
            "BUILD" | "BUILDING" | "CONSTRUCT" => Action::Build,
            "CRAFT" | "CRAFTING" => Action::Craft,
            "TRADE" | "TRADING" | "BARTER" => Action::Trade,
            "SOCIALIZE" | "SOCIALISE" | "TALK" | "CHAT" => Action::Socialize,
            "PATROL" | "GUARD" => Action::Patrol,
            "DEFEND" | "FIGHT" => Action::Defend,
            "FLEE" | "HIDE" | "RUN" => Action::Flee,
            "EXPLORE" | "SCOUT" => Action::Explore,
            "HEAL" | "TEND" => Action::Heal,
            "PRAY" | "WORSHIP" => Action::Pray,
            _ => return None,
        };
        Some(action)
    }

    /// First recognisable action word in free text, if any.
    pub fn find_in_text(text: &str) -> Option<Action> {
        text.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .find_map(Action::from_token)
    }
}
