use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::propagate::is_settled;
use crate::standings::champion;
use crate::types::{Bracket, BracketFormat, Match, MatchId, MatchStatus, Side, Slot};

pub fn describe_round(round: u32, rounds: u32) -> String {
    if round == rounds {
        "Final".to_string()
    } else if round + 1 == rounds {
        "Semifinal".to_string()
    } else {
        format!("Round {round}")
    }
}

/// Heading for one round. Round robin rounds are never finals.
pub fn round_heading(format: BracketFormat, round: u32, rounds: u32) -> String {
    match format {
        BracketFormat::Single => describe_round(round, rounds),
        BracketFormat::RoundRobin => format!("Round {round}"),
    }
}

pub fn describe_match(m: &Match, format: BracketFormat, rounds: u32) -> String {
    if m.third_place {
        "Third place".to_string()
    } else {
        round_heading(format, m.round, rounds)
    }
}

/// Short reference accepted back by the CLI (`2.0`, `3rd`).
pub fn match_ref(m: &Match) -> String {
    if m.third_place {
        "3rd".to_string()
    } else {
        format!("{}.{}", m.round, m.index)
    }
}

/// Matches grouped by round, rounds ascending, each group sorted by index.
pub fn format_matches_by_round(matches: &[Match]) -> Vec<(u32, Vec<&Match>)> {
    let mut grouped: BTreeMap<u32, Vec<&Match>> = BTreeMap::new();
    for m in matches {
        grouped.entry(m.round).or_default().push(m);
    }
    grouped
        .into_iter()
        .map(|(round, mut list)| {
            list.sort_by_key(|m| (m.third_place, m.index));
            (round, list)
        })
        .collect()
}

fn status_label(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Completed => "Completed",
        MatchStatus::Pending => "In progress",
        MatchStatus::Empty => "Not started",
    }
}

// ── Renderer payload ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub name: String,
    pub seed: Option<u32>,
    pub score: Option<u32>,
    pub bye: bool,
    pub placeholder: bool,
    /// `win` or `lose` once the match is decided.
    pub result: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: MatchId,
    pub reference: String,
    pub label: String,
    pub status: MatchStatus,
    pub status_label: &'static str,
    pub best_of: u32,
    pub a: SlotView,
    pub b: SlotView,
    pub winner_name: Option<String>,
    pub auto: bool,
    pub draw: bool,
    pub time: String,
    pub location: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub round: u32,
    pub label: String,
    pub matches: Vec<MatchView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketView {
    pub title: String,
    pub format: BracketFormat,
    pub rounds: u32,
    pub total_matches: usize,
    pub completed_matches: usize,
    /// Every match has a result (byes included).
    pub finished: bool,
    pub champion: Option<String>,
    pub groups: Vec<RoundView>,
}

fn slot_view(m: &Match, side: Side) -> SlotView {
    let slot = m.slot(side);
    let result = match m.winner_side() {
        Some(winner) if winner == side => Some("win"),
        Some(_) => Some("lose"),
        None => None,
    };
    SlotView {
        name: slot.display_name().to_string(),
        seed: slot.contestant().and_then(|c| c.seed),
        score: slot.score(),
        bye: slot.is_bye(),
        placeholder: matches!(slot, Slot::Pending(_)),
        result,
    }
}

fn match_view(m: &Match, format: BracketFormat, rounds: u32) -> MatchView {
    MatchView {
        id: m.id,
        reference: match_ref(m),
        label: describe_match(m, format, rounds),
        status: m.status,
        status_label: status_label(m.status),
        best_of: m.best_of,
        a: slot_view(m, Side::A),
        b: slot_view(m, Side::B),
        winner_name: m.winner_name.clone(),
        auto: m.auto,
        draw: m.draw,
        time: m.time.clone(),
        location: m.location.clone(),
        notes: m.notes.clone(),
    }
}

/// Read-only payload for a renderer: `{rounds, matches}` already grouped and labelled.
pub fn bracket_view(title: &str, bracket: &Bracket) -> BracketView {
    let groups = format_matches_by_round(&bracket.matches)
        .into_iter()
        .map(|(round, list)| RoundView {
            round,
            label: round_heading(bracket.format, round, bracket.rounds),
            matches: list
                .into_iter()
                .map(|m| match_view(m, bracket.format, bracket.rounds))
                .collect(),
        })
        .collect();
    let champion = match bracket.format {
        BracketFormat::Single => champion(&bracket.matches).map(|c| c.name.clone()),
        BracketFormat::RoundRobin => None,
    };
    BracketView {
        title: title.to_string(),
        format: bracket.format,
        rounds: bracket.rounds,
        total_matches: bracket.matches.len(),
        completed_matches: bracket
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Completed)
            .count(),
        finished: !bracket.matches.is_empty() && is_settled(&bracket.matches),
        champion,
        groups,
    }
}

fn slot_line(slot: &SlotView) -> String {
    let mut line = slot.name.clone();
    if let Some(seed) = slot.seed.filter(|_| !slot.bye) {
        let _ = write!(line, " (#{seed})");
    }
    if let Some(score) = slot.score {
        let _ = write!(line, " [{score}]");
    }
    if slot.result == Some("win") {
        line.push_str(" *");
    }
    line
}

/// Plain-text rendering used by `show`.
pub fn render_text(view: &BracketView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}/{} matches completed)",
        view.title, view.completed_matches, view.total_matches
    );
    if view.groups.is_empty() {
        out.push_str("No matches.\n");
    }
    for group in &view.groups {
        let _ = writeln!(out, "\n== {} ==", group.label);
        for m in &group.matches {
            let heading = if m.label == group.label {
                String::new()
            } else {
                format!(" {}", m.label)
            };
            let _ = writeln!(
                out,
                "[{}]{} {} vs {}  {} Bo{}",
                m.reference,
                heading,
                slot_line(&m.a),
                slot_line(&m.b),
                if m.draw { "Draw" } else { m.status_label },
                m.best_of
            );
            let details = [&m.time, &m.location, &m.notes]
                .into_iter()
                .filter(|s| !s.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>();
            if !details.is_empty() {
                let _ = writeln!(out, "      {}", details.join(" | "));
            }
        }
    }
    if let Some(champion) = &view.champion {
        let _ = writeln!(out, "\nChampion: {champion}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{build_single_elim, normalize_links};
    use crate::propagate::apply_winner;
    use crate::round_robin::build_round_robin;
    use crate::seeding::create_participants;
    use crate::types::{BuildOptions, SeedingMode};

    fn bracket(n: usize, options: &BuildOptions) -> Bracket {
        let names = (1..=n).map(|i| format!("P{i}")).collect::<Vec<_>>();
        let mut bracket = build_single_elim(&create_participants(&names, SeedingMode::AsEntered), options);
        normalize_links(&mut bracket.matches);
        bracket
    }

    #[test]
    fn round_names() {
        assert_eq!(describe_round(3, 3), "Final");
        assert_eq!(describe_round(2, 3), "Semifinal");
        assert_eq!(describe_round(1, 3), "Round 1");
        assert_eq!(describe_round(1, 1), "Final");
        assert_eq!(round_heading(BracketFormat::RoundRobin, 3, 3), "Round 3");
    }

    #[test]
    fn grouping_is_ordered_by_round_then_index() {
        let mut b = bracket(8, &BuildOptions { third_place: true, ..Default::default() });
        b.matches.reverse();
        let grouped = format_matches_by_round(&b.matches);
        assert_eq!(grouped.iter().map(|(r, _)| *r).collect::<Vec<_>>(), vec![1, 2, 3]);
        for (_, list) in &grouped {
            let indexes = list.iter().map(|m| m.index).collect::<Vec<_>>();
            let mut sorted = indexes.clone();
            sorted.sort();
            assert_eq!(indexes, sorted);
        }
        let last = &grouped[2].1;
        assert_eq!(last.len(), 2);
        assert!(last[1].third_place);
    }

    #[test]
    fn view_labels_and_champion() {
        let mut b = bracket(2, &BuildOptions::default());
        assert!(!bracket_view("Cup", &b).finished);
        let id = b.matches[0].id;
        apply_winner(&mut b.matches, id, Side::B);
        let view = bracket_view("Cup", &b);
        assert!(view.finished);
        assert_eq!(view.champion.as_deref(), Some("P2"));
        assert_eq!(view.completed_matches, 1);
        let m = &view.groups[0].matches[0];
        assert_eq!(m.label, "Final");
        assert_eq!(m.reference, "1.0");
        assert_eq!(m.a.result, Some("lose"));
        assert_eq!(m.b.result, Some("win"));

        let text = render_text(&view);
        assert!(text.contains("== Final =="));
        assert!(text.contains("Champion: P2"));
    }

    #[test]
    fn placeholders_are_flagged() {
        let b = bracket(4, &BuildOptions::default());
        let view = bracket_view("Cup", &b);
        let final_match = &view.groups[1].matches[0];
        assert!(final_match.a.placeholder && final_match.b.placeholder);
        assert_eq!(final_match.a.name, "TBD");
        assert_eq!(final_match.status_label, "In progress");
    }

    #[test]
    fn round_robin_has_no_champion() {
        let names = ["A", "B", "C"].map(String::from);
        let b = build_round_robin(&create_participants(&names, SeedingMode::AsEntered), &BuildOptions::default());
        let view = bracket_view("League", &b);
        assert!(view.champion.is_none());
        assert!(!view.finished);
        assert!(!bracket_view("Empty", &Bracket { matches: Vec::new(), ..b.clone() }).finished);
        assert!(view.groups.iter().all(|g| g.label.starts_with("Round ")));
    }
}
