use tracing::debug;

use crate::propagate::propagate;
use crate::seeding::{new_id, next_pow2, seed_positions};
use crate::types::{
  Bracket, BracketFormat, BuildOptions, ByeMode, Link, Match, MatchStatus, Participant, Side, Slot,
};

/// A fresh match record. Status follows the slots: `pending` if either is filled, else `empty`.
pub fn create_match(round: u32, index: u32, a: Slot, b: Slot, options: &BuildOptions) -> Match {
  let mut m = Match {
    id: new_id(),
    round,
    index,
    third_place: false,
    a,
    b,
    links: [None, None],
    winner: None,
    winner_name: None,
    status: MatchStatus::Empty,
    auto: false,
    draw: false,
    time: options.defaults.time.clone(),
    location: options.defaults.location.clone(),
    notes: options.defaults.notes.clone(),
    best_of: options.best_of.max(1),
  };
  m.refresh_status();
  m
}

fn linked_match(round: u32, index: u32, links: [Link; 2], options: &BuildOptions) -> Match {
  let mut m = create_match(
    round,
    index,
    Slot::pending(links[0]),
    Slot::pending(links[1]),
    options,
  );
  m.links = [Some(links[0]), Some(links[1])];
  m
}

/// Settle a match that holds a bye: the other contestant advances without play.
/// Two byes resolve to side `a` so the bracket stays well-formed.
pub(crate) fn resolve_bye(m: &mut Match) -> bool {
  let (a_bye, b_bye) = (m.a.is_bye(), m.b.is_bye());
  if !a_bye && !b_bye {
    return false;
  }
  let side = if a_bye && !b_bye { Side::B } else { Side::A };
  if m.slot(side).contestant().is_none() {
    return false;
  }
  m.set_winner(side, true);
  true
}

fn padded_field(participants: &[Participant], size: usize, bye_mode: ByeMode) -> Vec<Participant> {
  let mut filled = participants.to_vec();
  let real = participants.len() as u32;
  for i in 0..(size - participants.len()) {
    filled.push(Participant::bye(real + i as u32 + 1));
  }
  match bye_mode {
    ByeMode::End => filled,
    ByeMode::Seeded => {
      filled.sort_by_key(|p| p.seed);
      seed_positions(size as u32)
        .into_iter()
        .filter_map(|rank| filled.get(rank as usize - 1).cloned())
        .collect()
    }
  }
}

pub fn build_single_elim(participants: &[Participant], options: &BuildOptions) -> Bracket {
  let size = next_pow2(participants.len());
  let rounds = size.trailing_zeros();
  let filled = padded_field(participants, size, options.bye_mode);

  let mut matches = Vec::with_capacity(size);
  let mut current = Vec::with_capacity(size / 2);
  for (i, pair) in filled.chunks(2).enumerate() {
    if pair.len() < 2 {
      break;
    }
    let mut m = create_match(
      1,
      i as u32,
      Slot::Concrete(pair[0].contestant()),
      Slot::Concrete(pair[1].contestant()),
      options,
    );
    resolve_bye(&mut m);
    current.push(m.id);
    matches.push(m);
  }

  let mut semifinals = Vec::new();
  for round in 2..=rounds {
    let prev = std::mem::take(&mut current);
    if round == rounds {
      semifinals = prev.clone();
    }
    for (i, pair) in prev.chunks(2).enumerate() {
      let m = linked_match(
        round,
        i as u32,
        [Link::winner_of(pair[0]), Link::winner_of(pair[1])],
        options,
      );
      current.push(m.id);
      matches.push(m);
    }
  }

  if options.third_place && rounds > 1 && semifinals.len() == 2 {
    let mut m = linked_match(
      rounds,
      current.len() as u32,
      [Link::loser_of(semifinals[0]), Link::loser_of(semifinals[1])],
      options,
    );
    m.third_place = true;
    matches.push(m);
  }

  debug!(
    entrants = participants.len(),
    size,
    rounds,
    matches = matches.len(),
    "built single elimination bracket"
  );
  Bracket {
    format: BracketFormat::Single,
    rounds,
    size,
    matches,
  }
}

/// Resolve every link once after a build (or after restoring a snapshot).
pub fn normalize_links(matches: &mut [Match]) {
  propagate(matches);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeding::create_participants;
  use crate::types::{Outcome, SeedingMode};

  fn field(n: usize) -> Vec<Participant> {
    let names = (1..=n).map(|i| format!("P{i}")).collect::<Vec<_>>();
    create_participants(&names, SeedingMode::AsEntered)
  }

  #[test]
  fn match_counts_follow_bracket_size() {
    for n in 2..=33 {
      let bracket = build_single_elim(&field(n), &BuildOptions::default());
      let size = next_pow2(n);
      assert_eq!(bracket.size, size);
      assert_eq!(bracket.rounds, size.trailing_zeros());
      assert_eq!(bracket.matches.len(), size - 1, "n = {n}");
      for round in 1..=bracket.rounds {
        let count = bracket.matches.iter().filter(|m| m.round == round).count();
        assert_eq!(count, size >> round);
      }
    }
  }

  #[test]
  fn third_place_adds_one_match() {
    let options = BuildOptions { third_place: true, ..Default::default() };
    let bracket = build_single_elim(&field(6), &options);
    assert_eq!(bracket.matches.len(), 8);

    let third = bracket.matches.iter().find(|m| m.third_place).unwrap();
    assert_eq!(third.round, bracket.rounds);
    assert_eq!(third.index, 1);
    assert!(third
      .links
      .iter()
      .all(|link| matches!(link, Some(l) if l.outcome == Outcome::Loser)));

    let two = build_single_elim(&field(2), &options);
    assert_eq!(two.matches.len(), 1);
    assert!(!two.matches.iter().any(|m| m.third_place));
  }

  #[test]
  fn degenerate_fields_have_no_matches() {
    for n in 0..=1 {
      let bracket = build_single_elim(&field(n), &BuildOptions::default());
      assert_eq!(bracket.size, 1);
      assert_eq!(bracket.rounds, 0);
      assert!(bracket.matches.is_empty());
    }
  }

  #[test]
  fn round_one_pairs_in_list_order() {
    let bracket = build_single_elim(&field(4), &BuildOptions::default());
    let names = bracket
      .matches
      .iter()
      .filter(|m| m.round == 1)
      .map(|m| (m.index, m.a.display_name().to_string(), m.b.display_name().to_string()))
      .collect::<Vec<_>>();
    assert_eq!(
      names,
      vec![
        (0, "P1".to_string(), "P2".to_string()),
        (1, "P3".to_string(), "P4".to_string()),
      ]
    );
  }

  #[test]
  fn bye_matches_resolve_at_construction() {
    let bracket = build_single_elim(&field(7), &BuildOptions::default());
    let with_bye = bracket
      .matches
      .iter()
      .filter(|m| m.a.is_bye() || m.b.is_bye())
      .collect::<Vec<_>>();
    assert_eq!(with_bye.len(), 1);
    for m in with_bye {
      assert_eq!(m.status, MatchStatus::Completed);
      assert!(m.auto);
      let real = if m.a.is_bye() { &m.b } else { &m.a };
      assert_eq!(m.winner, real.concrete_id());
      assert_eq!(m.winner_name.as_deref(), Some(real.display_name()));
    }
  }

  #[test]
  fn later_rounds_start_as_placeholders() {
    let bracket = build_single_elim(&field(8), &BuildOptions::default());
    for m in bracket.matches.iter().filter(|m| m.round > 1) {
      assert!(matches!(m.a, Slot::Pending(_)));
      assert!(matches!(m.b, Slot::Pending(_)));
      assert_eq!(m.status, MatchStatus::Pending);
      assert!(m.winner.is_none());
    }
  }

  #[test]
  fn seeded_byes_go_to_top_seeds() {
    let options = BuildOptions { bye_mode: ByeMode::Seeded, ..Default::default() };
    let bracket = build_single_elim(&field(5), &options);
    let round_one = bracket.matches.iter().filter(|m| m.round == 1).collect::<Vec<_>>();
    assert_eq!(round_one.len(), 4);
    assert!(round_one.iter().all(|m| !(m.a.is_bye() && m.b.is_bye())));

    let auto_winners = round_one
      .iter()
      .filter(|m| m.auto)
      .filter_map(|m| m.winner_contestant().and_then(|c| c.seed))
      .collect::<Vec<_>>();
    assert_eq!(auto_winners, vec![1, 2, 3]);

    let first = round_one[0];
    assert_eq!(first.a.contestant().and_then(|c| c.seed), Some(1));
    assert_eq!(first.b.contestant().and_then(|c| c.seed), Some(8));
  }

  #[test]
  fn defaults_copy_into_every_match() {
    let mut options = BuildOptions { best_of: 3, ..Default::default() };
    options.defaults.location = "Hall B".to_string();
    options.defaults.notes = "bring pens".to_string();
    let bracket = build_single_elim(&field(4), &options);
    assert!(bracket
      .matches
      .iter()
      .all(|m| m.best_of == 3 && m.location == "Hall B" && m.notes == "bring pens"));
  }
}
