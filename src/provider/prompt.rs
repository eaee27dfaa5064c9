//! Prompt rendering and model-output mapping for text-generating backends
//!
//! The documented output contract for batch decisions is a JSON object
//! `{"actions": ["MINE", "EAT", ...]}` with one entry per agent, in request
//! order. When a model ignores the contract we fall back to numbered lines
//! (`3. MINE`, `3) mine`, `3: Mine`), placing each action at its number.
//! Unnumbered lines are never used, so prose cannot shift answers onto the
//! wrong agent. Anything that still does not map to an action becomes `None`,
//! which the response alignment turns into the safe default.

use crate::decision::{Action, DecisionRequest, WorldSummary};
use serde::Deserialize;

/// System prompt for batch decisions
pub const DECIDE_SYSTEM_PROMPT: &str = r#"You choose the next action for villagers in a medieval settlement simulation.
You will receive the world state and a numbered list of villagers.

AVAILABLE ACTIONS:
IDLE, EAT, SLEEP, MINE, FARM, GATHER, BUILD, CRAFT, TRADE, SOCIALIZE, PATROL, DEFEND, FLEE, EXPLORE, HEAL, PRAY

Needs are urgency scores from 0.0 (satisfied) to 1.0 (desperate).
Prefer addressing desperate needs, keep villagers on their current task otherwise,
and respond to threats sensibly (guards DEFEND, others FLEE).

OUTPUT FORMAT (JSON only, no explanation), exactly one action per villager in list order:
{"actions": ["ACTION", "ACTION", ...]}
"#;

/// System prompt for strategic advice
pub const ADVISE_SYSTEM_PROMPT: &str = r#"You are the village elder advising a medieval settlement.
Given the state of the village, reply with two or three sentences of strategic advice.
End with a line of the form "FOCUS: ACTION" naming the single action the village should emphasise,
chosen from IDLE, EAT, SLEEP, MINE, FARM, GATHER, BUILD, CRAFT, TRADE, SOCIALIZE, PATROL, DEFEND, FLEE, EXPLORE, HEAL, PRAY.
"#;

/// Render a batch as the user message
pub fn render_batch(request: &DecisionRequest) -> String {
    let world = request.world();
    let mut s = String::new();
    s.push_str("WORLD:\n");
    s.push_str(&format!("Era: {}\n", world.era));
    s.push_str(&format!("Time of day: {:?}\n", world.time_of_day));
    s.push_str(&format!("Global threat: {:?}\n", world.global_threat));
    s.push_str(&format!("\nVILLAGERS ({}):\n", request.len()));

    for (i, agent) in request.agents().iter().enumerate() {
        s.push_str(&format!(
            "{}. {} - {:?} {:?}, mood {:?}, at {}, threat {:?}, task {:?}\n",
            i + 1,
            agent.name,
            agent.life_stage,
            agent.role,
            agent.mood,
            agent.location,
            agent.threat,
            agent.current_task
        ));
        s.push_str(&format!(
            "   needs: hunger {:.2}, fatigue {:.2}, social {:.2}, safety {:.2}\n",
            agent.needs.hunger, agent.needs.fatigue, agent.needs.social, agent.needs.safety
        ));
        if !agent.nearby_resources.is_empty() {
            s.push_str(&format!("   nearby: {}\n", agent.nearby_resources.join(", ")));
        }
        if !agent.recent_events.is_empty() {
            s.push_str(&format!("   recent: {}\n", agent.recent_events.join("; ")));
        }
    }

    s.push_str(&format!(
        "\nRespond with exactly {} actions as JSON:",
        request.len()
    ));
    s
}

/// Render a world summary as the user message for advice
pub fn render_advice(summary: &WorldSummary) -> String {
    format!("VILLAGE STATE:\n{}\nWhat should the village focus on?", summary.render())
}

#[derive(Deserialize)]
struct ActionList {
    actions: Vec<String>,
}

/// Map model output to exactly `expected` optional actions.
pub fn parse_action_list(text: &str, expected: usize) -> Vec<Option<Action>> {
    let parsed = extract_json(text).and_then(|json| serde_json::from_str::<ActionList>(json).ok());
    let mut actions = match parsed {
        Some(list) => list
            .actions
            .iter()
            .map(|a| Action::from_token(a))
            .collect::<Vec<_>>(),
        None => {
            tracing::debug!("Model output did not follow the JSON contract, reading numbered lines");
            parse_numbered_lines(text, expected)
        }
    };
    actions.resize(expected, None);
    actions
}

/// Place each `N. ACTION` line at slot `N - 1`; the first answer for a slot wins.
fn parse_numbered_lines(text: &str, expected: usize) -> Vec<Option<Action>> {
    let mut actions = vec![None; expected];
    for (number, rest) in text.lines().filter_map(numbered_item) {
        let Some(slot) = number.checked_sub(1).and_then(|i| actions.get_mut(i)) else {
            continue;
        };
        if slot.is_none() {
            *slot = Action::find_in_text(rest);
        }
    }
    actions
}

/// Split `"  12) text"` into `(12, " text")`; `None` for unnumbered lines.
fn numbered_item(line: &str) -> Option<(usize, &str)> {
    let line = line.trim_start();
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let number = line[..digits].parse().ok()?;
    let rest = &line[digits..];
    let rest = rest
        .strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .or_else(|| rest.strip_prefix(':'))?;
    Some((number, rest))
}

/// Split advice text into its prose and the optional `FOCUS:` action.
pub fn parse_advice(text: &str) -> (String, Option<Action>) {
    let mut prose = Vec::new();
    let mut focus = None;
    for line in text.lines() {
        let trimmed = line.trim();
        match trimmed
            .strip_prefix("FOCUS:")
            .or_else(|| trimmed.strip_prefix("Focus:"))
        {
            Some(rest) => focus = focus.or_else(|| Action::find_in_text(rest)),
            None if !trimmed.is_empty() => prose.push(trimmed),
            None => {}
        }
    }
    (prose.join(" "), focus)
}

/// Extract the outermost JSON object from a response (handles surrounding text)
fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}
