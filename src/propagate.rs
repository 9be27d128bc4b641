use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::types::{
  Contestant, Link, Match, MatchId, MatchStatus, Outcome, Placeholder, Side, Slot, TBD,
};

/// Re-resolve every linked slot from its source match, round by round, and drop
/// downstream results that the refreshed slots no longer support.
///
/// Does nothing when no match carries a link (round-robin, or a single round).
/// Running it twice in a row leaves the collection unchanged.
pub fn propagate(matches: &mut [Match]) {
  if !matches.iter().any(Match::is_linked) {
    return;
  }
  let index = matches
    .iter()
    .enumerate()
    .map(|(i, m)| (m.id, i))
    .collect::<HashMap<_, _>>();

  // Sources always sit in an earlier round, so visiting rounds in increasing
  // order means every source has already been settled for this pass.
  let mut order = (0..matches.len()).collect::<Vec<_>>();
  order.sort_by_key(|&i| (matches[i].round, matches[i].third_place, matches[i].index));

  for i in order {
    if !matches[i].is_linked() {
      continue;
    }
    let links = matches[i].links;
    let next_a = links[0].map(|link| resolve_link(matches, &index, link));
    let next_b = links[1].map(|link| resolve_link(matches, &index, link));

    let m = &mut matches[i];
    let mut displaced = false;
    if let Some(slot) = next_a {
      displaced |= refresh_slot(&mut m.a, slot);
    }
    if let Some(slot) = next_b {
      displaced |= refresh_slot(&mut m.b, slot);
    }
    settle(m, displaced);
  }
}

fn resolve_link(matches: &[Match], index: &HashMap<MatchId, usize>, link: Link) -> Slot {
  let Some(source) = index.get(&link.source).map(|&i| &matches[i]) else {
    return Slot::Empty;
  };
  match link.outcome {
    Outcome::Winner => match source.winner_contestant() {
      Some(contestant) => Slot::Concrete(fresh(contestant)),
      None => Slot::Pending(Placeholder {
        source: link.source,
        outcome: Outcome::Winner,
        name: placeholder_name(source),
      }),
    },
    Outcome::Loser => {
      let losing_slot = source
        .winner_side()
        .filter(|_| !source.draw)
        .map(|side| source.slot(side.other()));
      match losing_slot {
        None | Some(Slot::Pending(_)) => Slot::pending(link),
        Some(Slot::Concrete(contestant)) if !contestant.bye => Slot::Concrete(fresh(contestant)),
        Some(_) => Slot::Empty,
      }
    }
  }
}

fn fresh(contestant: &Contestant) -> Contestant {
  Contestant {
    score: None,
    ..contestant.clone()
  }
}

/// Display name for the undecided winner of `source`.
fn placeholder_name(source: &Match) -> String {
  if let Some(name) = source.winner_name.as_deref().filter(|name| !name.is_empty()) {
    return name.to_string();
  }
  for slot in [&source.a, &source.b] {
    if let Slot::Pending(placeholder) = slot {
      if placeholder.outcome == Outcome::Winner && placeholder.name != TBD {
        return placeholder.name.clone();
      }
    }
  }
  // A lone contestant facing an empty slot is the only possible advancer.
  match (&source.a, &source.b) {
    (Slot::Concrete(c), Slot::Empty) | (Slot::Empty, Slot::Concrete(c)) => c.name.clone(),
    _ => TBD.to_string(),
  }
}

/// Replace a slot with its fresh resolution. Returns true when a contestant who
/// held the slot was replaced or removed.
fn refresh_slot(slot: &mut Slot, mut next: Slot) -> bool {
  let displaced = match (&*slot, &mut next) {
    (Slot::Concrete(old), Slot::Concrete(new)) if old.id == new.id => {
      new.score = old.score;
      false
    }
    (Slot::Concrete(_), _) => true,
    _ => false,
  };
  *slot = next;
  displaced
}

/// Side that advances without play: the opponent of a bye, or a lone contestant
/// whose other slot can never be filled.
fn auto_side(m: &Match) -> Option<Side> {
  match (&m.a, &m.b) {
    (Slot::Concrete(a), Slot::Concrete(b)) => match (a.bye, b.bye) {
      (true, false) => Some(Side::B),
      (false, true) | (true, true) => Some(Side::A),
      (false, false) => None,
    },
    (Slot::Concrete(a), Slot::Empty) if !a.bye => Some(Side::A),
    (Slot::Empty, Slot::Concrete(b)) if !b.bye => Some(Side::B),
    _ => None,
  }
}

/// A recorded result survives only while its winner still holds a slot and
/// neither contestant it was decided between has been replaced upstream.
fn settle(m: &mut Match, displaced: bool) {
  let stale = match m.winner_side() {
    None => m.winner.is_some(),
    Some(side) => displaced || (m.auto && auto_side(m) != Some(side)),
  };
  if stale {
    debug!(match_id = %m.id, round = m.round, index = m.index, "dropping stale result");
    m.winner = None;
    m.winner_name = None;
    m.auto = false;
  }
  if m.winner.is_none() && !m.draw {
    if let Some(side) = auto_side(m) {
      m.set_winner(side, true);
    }
  }
  m.refresh_status();
}

// ── Result mutations ───────────────────────────────────────────────────

pub fn find_match(matches: &[Match], match_id: MatchId) -> Option<&Match> {
  matches.iter().find(|m| m.id == match_id)
}

/// Record `side` as the winner and push the result downstream.
///
/// Silently ignored when the match is unknown, the slot holds no concrete
/// contestant, the slot is a bye, or the match was settled by a bye.
pub fn apply_winner(matches: &mut [Match], match_id: MatchId, side: Side) {
  let Some(target) = matches.iter_mut().find(|m| m.id == match_id) else {
    return;
  };
  if target.auto {
    return;
  }
  match target.slot(side).contestant() {
    Some(contestant) if !contestant.bye => {}
    _ => return,
  }
  target.set_winner(side, false);
  propagate(matches);
}

/// Mark a match drawn. Only meaningful where nothing depends on a winner, so it
/// is ignored for any collection that carries links.
pub fn record_draw(matches: &mut [Match], match_id: MatchId) {
  if matches.iter().any(Match::is_linked) {
    return;
  }
  let Some(target) = matches.iter_mut().find(|m| m.id == match_id) else {
    return;
  };
  if target.a.contestant().is_none() || target.b.contestant().is_none() {
    return;
  }
  target.winner = None;
  target.winner_name = None;
  target.auto = false;
  target.draw = true;
  target.refresh_status();
}

/// Undo one result and every downstream result that depended on it.
/// Bye resolutions are structural and stay in place.
pub fn clear_match(matches: &mut [Match], match_id: MatchId) {
  let Some(target) = matches.iter_mut().find(|m| m.id == match_id) else {
    return;
  };
  if target.auto {
    return;
  }
  target.reset_result();
  propagate(matches);
}

pub fn clear_all(matches: &mut [Match]) {
  for m in matches.iter_mut().filter(|m| !m.auto) {
    m.reset_result();
  }
  propagate(matches);
}

/// Scores are informational; they never decide who advances.
pub fn update_score(matches: &mut [Match], match_id: MatchId, side: Side, value: Option<u32>) {
  let Some(target) = matches.iter_mut().find(|m| m.id == match_id) else {
    return;
  };
  if let Some(contestant) = target.slot_mut(side).contestant_mut() {
    contestant.score = value;
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchDetails {
  pub time: Option<String>,
  pub location: Option<String>,
  pub notes: Option<String>,
}

pub fn update_details(matches: &mut [Match], match_id: MatchId, details: MatchDetails) {
  let Some(target) = matches.iter_mut().find(|m| m.id == match_id) else {
    return;
  };
  if let Some(time) = details.time {
    target.time = time;
  }
  if let Some(location) = details.location {
    target.location = location;
  }
  if let Some(notes) = details.notes {
    target.notes = notes;
  }
}

/// Look a match up by uuid, by `round.index` (e.g. `2.0`), or by `3rd`.
pub fn resolve_match_ref(matches: &[Match], raw: &str) -> Option<MatchId> {
  let trimmed = raw.trim();
  if let Ok(id) = Uuid::parse_str(trimmed) {
    return find_match(matches, id).map(|m| m.id);
  }
  if trimmed.eq_ignore_ascii_case("3rd") {
    return matches.iter().find(|m| m.third_place).map(|m| m.id);
  }
  let (round, index) = trimmed.split_once('.')?;
  let round = round.trim().trim_start_matches(['r', 'R']).parse::<u32>().ok()?;
  let index = index.trim().parse::<u32>().ok()?;
  matches
    .iter()
    .find(|m| !m.third_place && m.round == round && m.index == index)
    .map(|m| m.id)
}

/// True once every match carries a result.
pub fn is_settled(matches: &[Match]) -> bool {
  matches.iter().all(|m| m.status == MatchStatus::Completed)
}
