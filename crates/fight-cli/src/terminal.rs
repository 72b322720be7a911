//! Plain-text fight screen

use fight_logic::{
    Affordability, Combatant, EncounterEvent, Phase, PresentationSink, ResourcePool, Route,
};

const BAR_WIDTH: usize = 20;

/// Prints encounter notifications to stdout
#[derive(Debug, Default)]
pub struct TerminalSink {
    pub route: Option<Route>,
}

impl PresentationSink for TerminalSink {
    fn notify(&mut self, event: &EncounterEvent) {
        match event {
            EncounterEvent::PhaseEntered { phase, round, .. } => match phase {
                Phase::PlayerChoice => println!("\n== Round {} ==", round),
                Phase::OpponentChoice => println!("{}", phase.title()),
                Phase::Resolution => {}
                Phase::Won | Phase::Lost | Phase::Draw => println!("\n*** {} ***", phase.title()),
            },
            EncounterEvent::PlayerChose { action, .. } => {
                println!("You use {} ({}).", action.name, action.kind);
            }
            EncounterEvent::OpponentChose { action, .. } => {
                if action.is_skip() {
                    println!("Your opponent hesitates.");
                } else {
                    println!("Your opponent uses {} ({}).", action.name, action.kind);
                }
            }
            EncounterEvent::OpponentDecisionRejected { .. } => {}
            EncounterEvent::RoundResolved(report) => {
                println!(
                    "You deal {} damage and take {}.",
                    report.damage_to_opponent, report.damage_to_player
                );
            }
            EncounterEvent::Concluded(conclusion) => {
                println!("Finished after {} rounds.", conclusion.rounds);
            }
        }
    }

    fn play_cue(&mut self, cue: &str) {
        tracing::debug!(cue, "cue");
    }

    fn navigate(&mut self, route: &Route) {
        println!("-> {}", route);
        self.route = Some(route.clone());
    }
}

/// `[#######.............] 35/100`
pub fn bar(pool: &ResourcePool) -> String {
    let filled = usize::from(pool.percent()) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        pool
    )
}

pub fn status(combatant: &Combatant) -> String {
    format!(
        "{:<12} HP {}  CK {}",
        combatant.name,
        bar(&combatant.health),
        bar(&combatant.energy)
    )
}

/// Shown when chakra remains but no move is cheap enough
pub fn stalled_note(combatant: &Combatant, affordability: Affordability) -> Option<String> {
    if affordability.any() {
        return None;
    }
    Some(format!(
        "Not enough chakra for any move ({} left).",
        combatant.energy.now
    ))
}

/// Numbered move menu; unaffordable moves are marked
pub fn menu(combatant: &Combatant, affordability: Affordability) -> String {
    [&combatant.attack, &combatant.defence, &combatant.special]
        .into_iter()
        .enumerate()
        .map(|(i, action)| {
            let mark = if affordability.allows(action.kind) { ' ' } else { 'x' };
            format!(
                " {}{} {:<8} {} (dmg {}, cost {})",
                mark,
                i + 1,
                action.kind.as_str(),
                action.name,
                action.damage,
                action.cost
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
