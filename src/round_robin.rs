use tracing::debug;

use crate::bracket::create_match;
use crate::types::{Bracket, BracketFormat, BuildOptions, Participant, Slot};

/// Every entrant meets every other entrant once (twice with `double_round`),
/// scheduled with the circle method. An odd field gets a padding bye whose
/// pairings are left out rather than recorded.
pub fn build_round_robin(participants: &[Participant], options: &BuildOptions) -> Bracket {
  let mut order = participants.to_vec();
  if order.len() % 2 == 1 {
    order.push(Participant::bye(participants.len() as u32 + 1));
  }
  let size = order.len();
  if participants.len() < 2 {
    return Bracket {
      format: BracketFormat::RoundRobin,
      rounds: 0,
      size,
      matches: Vec::new(),
    };
  }

  let rounds = (size - 1) as u32;
  let mut matches = Vec::with_capacity(size * (size - 1) / 2);
  for round in 1..=rounds {
    let mut index = 0;
    for i in 0..size / 2 {
      let (a, b) = (&order[i], &order[size - 1 - i]);
      if a.bye || b.bye {
        continue;
      }
      matches.push(create_match(
        round,
        index,
        Slot::Concrete(a.contestant()),
        Slot::Concrete(b.contestant()),
        options,
      ));
      index += 1;
    }
    // First entrant stays put; everyone else moves one seat clockwise.
    order[1..].rotate_right(1);
  }

  if options.double_round {
    let mirrored = matches
      .iter()
      .map(|m| create_match(m.round + rounds, m.index, m.b.clone(), m.a.clone(), options))
      .collect::<Vec<_>>();
    matches.extend(mirrored);
  }

  let rounds = if options.double_round { rounds * 2 } else { rounds };
  debug!(entrants = participants.len(), rounds, matches = matches.len(), "built round robin");
  Bracket {
    format: BracketFormat::RoundRobin,
    rounds,
    size,
    matches,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::propagate::propagate;
  use crate::seeding::create_participants;
  use crate::types::{MatchStatus, ParticipantId, SeedingMode};
  use std::collections::HashSet;

  fn field(n: usize) -> Vec<Participant> {
    let names = (1..=n).map(|i| format!("P{i}")).collect::<Vec<_>>();
    create_participants(&names, SeedingMode::AsEntered)
  }

  fn pairing(a: ParticipantId, b: ParticipantId) -> (ParticipantId, ParticipantId) {
    if a < b { (a, b) } else { (b, a) }
  }

  #[test]
  fn odd_field_pads_with_a_bye_and_skips_it() {
    let bracket = build_round_robin(&field(5), &BuildOptions::default());
    assert_eq!(bracket.size, 6);
    assert_eq!(bracket.rounds, 5);
    assert_eq!(bracket.matches.len(), 10);
    assert!(bracket.matches.iter().all(|m| !m.a.is_bye() && !m.b.is_bye()));
  }

  #[test]
  fn every_pair_meets_exactly_once() {
    for n in 2..=9 {
      let bracket = build_round_robin(&field(n), &BuildOptions::default());
      assert_eq!(bracket.matches.len(), n * (n - 1) / 2, "n = {n}");
      let pairs = bracket
        .matches
        .iter()
        .map(|m| pairing(m.a.concrete_id().unwrap(), m.b.concrete_id().unwrap()))
        .collect::<HashSet<_>>();
      assert_eq!(pairs.len(), bracket.matches.len());
    }
  }

  #[test]
  fn nobody_plays_twice_in_a_round() {
    let bracket = build_round_robin(&field(8), &BuildOptions::default());
    for round in 1..=bracket.rounds {
      let mut seen = HashSet::new();
      for m in bracket.matches.iter().filter(|m| m.round == round) {
        assert!(seen.insert(m.a.concrete_id().unwrap()));
        assert!(seen.insert(m.b.concrete_id().unwrap()));
      }
      assert_eq!(seen.len(), 8);
    }
  }

  #[test]
  fn double_round_mirrors_sides() {
    let options = BuildOptions { double_round: true, ..Default::default() };
    let bracket = build_round_robin(&field(4), &options);
    assert_eq!(bracket.rounds, 6);
    assert_eq!(bracket.matches.len(), 12);

    let (first, second) = bracket.matches.split_at(6);
    for (m, mirror) in first.iter().zip(second) {
      assert_eq!(mirror.round, m.round + 3);
      assert_eq!(mirror.index, m.index);
      assert_eq!(mirror.a.concrete_id(), m.b.concrete_id());
      assert_eq!(mirror.b.concrete_id(), m.a.concrete_id());
      assert_ne!(mirror.id, m.id);
    }
  }

  #[test]
  fn matches_start_pending_and_ignore_propagation() {
    let mut bracket = build_round_robin(&field(4), &BuildOptions::default());
    assert!(bracket.matches.iter().all(|m| m.status == MatchStatus::Pending && !m.is_linked()));
    let before = bracket.matches.clone();
    propagate(&mut bracket.matches);
    assert_eq!(bracket.matches, before);
  }

  #[test]
  fn tiny_fields_have_no_matches() {
    assert!(build_round_robin(&field(0), &BuildOptions::default()).matches.is_empty());
    let single = build_round_robin(&field(1), &BuildOptions::default());
    assert!(single.matches.is_empty());
    assert_eq!(single.rounds, 0);
  }
}
