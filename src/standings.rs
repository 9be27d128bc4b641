use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::types::{Contestant, Match, MatchStatus, Participant, ParticipantId, PointsConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
  pub id: ParticipantId,
  pub name: String,
  pub seed: u32,
  pub wins: u32,
  pub losses: u32,
  pub draws: u32,
  pub played: u32,
  pub points: i32,
  pub scored: i64,
  pub conceded: i64,
  pub diff: i64,
}

impl StandingRow {
  fn new(participant: &Participant) -> Self {
    Self {
      id: participant.id,
      name: participant.name.clone(),
      seed: participant.seed,
      wins: 0,
      losses: 0,
      draws: 0,
      played: 0,
      points: 0,
      scored: 0,
      conceded: 0,
      diff: 0,
    }
  }

  fn record(&mut self, own: Option<u32>, other: Option<u32>, points: i32) {
    self.played += 1;
    self.points += points;
    self.scored += i64::from(own.unwrap_or(0));
    self.conceded += i64::from(other.unwrap_or(0));
    self.diff = self.scored - self.conceded;
  }
}

fn rank(left: &StandingRow, right: &StandingRow) -> Ordering {
  right
    .points
    .cmp(&left.points)
    .then_with(|| right.diff.cmp(&left.diff))
    .then_with(|| right.scored.cmp(&left.scored))
    .then_with(|| left.name.cmp(&right.name))
}

/// Ranked table over every completed match. Matches whose sides are not both
/// known participants (byes, unresolved slots) are left out.
pub fn compute_standings(
  participants: &[Participant],
  matches: &[Match],
  points: &PointsConfig,
) -> Vec<StandingRow> {
  let mut rows = participants
    .iter()
    .filter(|p| !p.bye)
    .map(StandingRow::new)
    .collect::<Vec<_>>();
  let lookup = rows
    .iter()
    .enumerate()
    .map(|(i, row)| (row.id, i))
    .collect::<HashMap<_, _>>();

  for m in matches.iter().filter(|m| m.status == MatchStatus::Completed) {
    let (Some(a), Some(b)) = (m.a.contestant(), m.b.contestant()) else {
      continue;
    };
    let (Some(&ia), Some(&ib)) = (lookup.get(&a.id), lookup.get(&b.id)) else {
      continue;
    };

    if m.draw {
      rows[ia].draws += 1;
      rows[ia].record(a.score, b.score, points.draw);
      rows[ib].draws += 1;
      rows[ib].record(b.score, a.score, points.draw);
      continue;
    }

    let (winner, loser, iw, il) = match m.winner {
      Some(id) if id == a.id => (a, b, ia, ib),
      Some(id) if id == b.id => (b, a, ib, ia),
      _ => continue,
    };
    rows[iw].wins += 1;
    rows[iw].record(winner.score, loser.score, points.win);
    rows[il].losses += 1;
    rows[il].record(loser.score, winner.score, points.loss);
  }

  rows.sort_by(rank);
  rows
}

/// Winner of the final of a single-elimination bracket, once it is decided.
/// `None` while the last round holds more than one match (round robin).
pub fn champion(matches: &[Match]) -> Option<&Contestant> {
  let last = matches.iter().filter(|m| !m.third_place).map(|m| m.round).max()?;
  let mut finals = matches.iter().filter(|m| !m.third_place && m.round == last);
  let decider = finals.next()?;
  if finals.next().is_some() || decider.status != MatchStatus::Completed {
    return None;
  }
  decider.winner_contestant()
}
