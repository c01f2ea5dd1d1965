//! Known tutorial steps and their chart labels.

use serde::Serialize;

/// Text-bubble taps. They fire for everyone who sees the bubble and say
/// nothing about progression, so the behaviour funnel ignores them.
pub const TEXT_STEPS: [&str; 6] = ["01", "02", "03", "23", "37", "61"];

/// Steps that are not part of the linear flow (63: a near-defeat in the
/// first stage, which only fires for some players).
pub const SPECIAL_STEPS: [&str; 1] = ["63"];

pub const INITIAL_LAUNCH: &str = "Initial launch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    Text(u8),
    Card { battle: u8, card: u8 },
    FirstTap(&'static str),
    Other(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorialStep {
    pub id: &'static str,
    pub number: u32,
    pub phase: &'static str,
    pub description: String,
}

const fn card(battle: u8, card: u8) -> StepKind {
    StepKind::Card { battle, card }
}

#[rustfmt::skip]
const STEPS: [(&str, StepKind); 63] = [
    ("01", StepKind::Text(1)),
    ("02", StepKind::Text(2)),
    ("03", StepKind::Text(3)),
    ("04", card(1, 1)), ("05", card(1, 2)), ("06", card(1, 3)), ("07", card(1, 4)),
    ("08", card(1, 5)), ("09", card(1, 6)), ("10", card(1, 7)), ("11", card(1, 8)),
    ("12", card(1, 9)), ("13", card(1, 10)), ("14", card(1, 11)), ("15", card(1, 12)),
    ("16", card(1, 13)), ("17", card(1, 14)), ("18", card(1, 15)), ("19", card(1, 16)),
    ("20", card(1, 17)), ("21", card(1, 18)), ("22", card(1, 19)),
    ("23", StepKind::Text(4)),
    ("24", StepKind::FirstTap("Unclaimed button")),
    ("25", StepKind::FirstTap("Clear chest")),
    ("26", StepKind::Other("Clear chest closed")),
    ("27", StepKind::FirstTap("Hero menu")),
    ("28", StepKind::FirstTap("Chip icon")),
    ("29", StepKind::FirstTap("Chip equip button")),
    ("30", StepKind::FirstTap("Equipment tab")),
    ("31", StepKind::FirstTap("Equipment icon")),
    ("32", StepKind::FirstTap("Equipment equip button")),
    ("33", StepKind::FirstTap("Promotion menu")),
    ("34", StepKind::FirstTap("Upgrade button")),
    ("35", StepKind::FirstTap("Promotion popup back")),
    ("36", StepKind::FirstTap("Lobby menu")),
    ("37", StepKind::Text(5)),
    ("38", StepKind::FirstTap("Battle start button")),
    ("39", card(2, 1)), ("40", card(2, 2)), ("41", card(2, 3)), ("42", card(2, 4)),
    ("43", card(2, 5)), ("44", card(2, 6)), ("45", card(2, 7)), ("46", card(2, 8)),
    ("47", card(2, 9)), ("48", card(2, 10)), ("49", card(2, 11)), ("50", card(2, 12)),
    ("51", card(2, 13)), ("52", card(2, 14)), ("53", card(2, 15)), ("54", card(2, 16)),
    ("55", card(2, 17)), ("56", card(2, 18)), ("57", card(2, 19)),
    ("58", StepKind::FirstTap("Unit upgrade menu")),
    ("59", StepKind::FirstTap("Missile turret upgrade menu")),
    ("60", StepKind::FirstTap("Missile turret upgrade button")),
    ("61", StepKind::Text(6)),
    ("62", StepKind::Other("Third battle force-started")),
    ("63", StepKind::Other("Near defeat in stage 1 during tutorial")),
];

fn battle_name(battle: u8) -> &'static str {
    if battle == 1 {
        "First"
    } else {
        "Second"
    }
}

fn ordinal(n: u8) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

impl StepKind {
    fn description(self) -> String {
        match self {
            StepKind::Text(n) => format!("TutorialText{n} tap"),
            StepKind::Card { battle, card } => format!(
                "{} battle: {} card pick",
                battle_name(battle),
                ordinal(card)
            ),
            StepKind::FirstTap(what) => format!("{what} first tap"),
            StepKind::Other(what) => what.to_string(),
        }
    }

    fn short(self) -> String {
        match self {
            StepKind::Text(n) => format!("Text{n}"),
            StepKind::Card { battle, card } => format!("Battle{battle} card{card}"),
            StepKind::FirstTap(what) => what.to_string(),
            StepKind::Other(what) => {
                let head: String = what.chars().take(10).collect();
                format!("{head}...")
            }
        }
    }
}

fn lookup(step_id: &str) -> Option<(&'static str, u32, StepKind)> {
    STEPS
        .iter()
        .zip(1u32..)
        .find(|((id, _), _)| *id == step_id)
        .map(|((id, kind), number)| (*id, number, *kind))
}

pub fn step(step_id: &str) -> Option<TutorialStep> {
    let (id, number, kind) = lookup(step_id)?;
    Some(TutorialStep {
        id,
        number,
        phase: INITIAL_LAUNCH,
        description: kind.description(),
    })
}

/// Every known step, in order.
pub fn all_steps() -> Vec<TutorialStep> {
    STEPS.iter().filter_map(|(id, _)| step(id)).collect()
}

/// `"24. Unclaimed button first tap"`, or `"Tutorial <id>"` for unknown steps.
pub fn describe_step(step_id: &str) -> String {
    match lookup(step_id) {
        Some((_, number, kind)) => format!("{number}. {}", kind.description()),
        None => format!("Tutorial {step_id}"),
    }
}

/// Compact label for chart axes; unknown steps fall back to the raw id.
pub fn short_step_label(step_id: &str) -> String {
    match lookup(step_id) {
        Some((_, number, kind)) => format!("{number}. {}", kind.short()),
        None => step_id.to_string(),
    }
}

pub fn is_text_step(step_id: &str) -> bool {
    TEXT_STEPS.contains(&step_id)
}

pub fn is_special_step(step_id: &str) -> bool {
    SPECIAL_STEPS.contains(&step_id)
}
