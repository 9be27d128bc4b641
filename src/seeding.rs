use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::types::{Participant, SeedingMode};

pub fn new_id() -> Uuid {
  Uuid::new_v4()
}

/// Smallest power of two that holds `n` entrants (at least 1).
pub fn next_pow2(n: usize) -> usize {
  n.max(1).next_power_of_two()
}

/// Participants with seeds 1..N in input order, or shuffled first when the mode is `Random`.
pub fn create_participants(names: &[String], seeding: SeedingMode) -> Vec<Participant> {
  create_participants_with_rng(names, seeding, &mut rand::thread_rng())
}

pub fn create_participants_with_rng<R: Rng + ?Sized>(
  names: &[String],
  seeding: SeedingMode,
  rng: &mut R,
) -> Vec<Participant> {
  let mut list = names
    .iter()
    .enumerate()
    .map(|(i, name)| Participant {
      id: new_id(),
      name: name.clone(),
      seed: i as u32 + 1,
      bye: false,
    })
    .collect::<Vec<_>>();
  if seeding == SeedingMode::Random {
    list.shuffle(rng);
    for (i, participant) in list.iter_mut().enumerate() {
      participant.seed = i as u32 + 1;
    }
  }
  list
}

/// Seed numbers in bracket order for a field of `size` (a power of two), so that
/// seed 1 meets seed `size` and the top two seeds can only meet in the final.
pub fn seed_positions(size: u32) -> Vec<u32> {
  let mut seeds = vec![1u32];
  while seeds.len() < size as usize {
    let n = seeds.len() as u32;
    let mut next = Vec::with_capacity(seeds.len() * 2);
    for seed in seeds.iter().copied() {
      next.push(seed);
      next.push((n * 2 + 1).saturating_sub(seed));
    }
    seeds = next;
  }
  seeds
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn next_pow2_rounds_up() {
    assert_eq!(next_pow2(0), 1);
    assert_eq!(next_pow2(1), 1);
    assert_eq!(next_pow2(2), 2);
    assert_eq!(next_pow2(3), 4);
    assert_eq!(next_pow2(5), 8);
    assert_eq!(next_pow2(16), 16);
    assert_eq!(next_pow2(17), 32);
  }

  #[test]
  fn as_entered_keeps_input_order() {
    let list = create_participants(&names(&["Alice", "Bob", "Cara"]), SeedingMode::AsEntered);
    let view = list.iter().map(|p| (p.name.as_str(), p.seed)).collect::<Vec<_>>();
    assert_eq!(view, vec![("Alice", 1), ("Bob", 2), ("Cara", 3)]);
    assert!(list.iter().all(|p| !p.bye));
  }

  #[test]
  fn random_reseeds_in_shuffled_order() {
    let input = names(&["A", "B", "C", "D", "E", "F", "G", "H"]);
    let mut rng = StdRng::seed_from_u64(7);
    let list = create_participants_with_rng(&input, SeedingMode::Random, &mut rng);

    let seeds = list.iter().map(|p| p.seed).collect::<Vec<_>>();
    assert_eq!(seeds, (1..=8).collect::<Vec<_>>());

    let mut sorted = list.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
    sorted.sort();
    assert_eq!(sorted, input);
  }

  #[test]
  fn empty_input_yields_nothing() {
    assert!(create_participants(&[], SeedingMode::Random).is_empty());
  }

  #[test]
  fn ids_are_unique() {
    let list = create_participants(&names(&["A", "B", "C", "D"]), SeedingMode::AsEntered);
    for (i, left) in list.iter().enumerate() {
      for right in &list[i + 1..] {
        assert_ne!(left.id, right.id);
      }
    }
  }

  #[test]
  fn seed_positions_pair_top_against_bottom() {
    assert_eq!(seed_positions(2), vec![1, 2]);
    assert_eq!(seed_positions(4), vec![1, 4, 2, 3]);
    assert_eq!(seed_positions(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
  }
}
