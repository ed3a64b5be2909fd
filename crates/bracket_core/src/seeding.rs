//! Standard bracket seeding.

/// Smallest power of two that holds `n` entrants (never below 2)
pub fn bracket_size(n: usize) -> usize {
    n.max(2).next_power_of_two()
}

/// Seed numbers (1-based) in bracket-line order for a power-of-two field.
///
/// Built by repeatedly pairing each seed `s` with `size + 1 - s`, which keeps
/// the top two seeds in opposite halves and gives every first-round match a
/// seed sum of `size + 1`.
pub fn seed_order(size: usize) -> Vec<u32> {
    debug_assert!(size.is_power_of_two());
    let mut order = vec![1u32];
    while order.len() < size {
        let next = (order.len() * 2) as u32 + 1;
        order = order.iter().flat_map(|&s| [s, next - s]).collect();
    }
    order
}

/// First-round seed pairs for `n` entrants.
///
/// The second element is `None` when the opposing seed does not exist, i.e.
/// the first seed receives a bye. Byes go to the highest seeds, and no
/// entrant can receive more than one.
pub fn first_round_pairs(n: usize) -> Vec<(u32, Option<u32>)> {
    let order = seed_order(bracket_size(n));
    order
        .chunks(2)
        .map(|pair| {
            let (high, low) = (pair[0].min(pair[1]), pair[0].max(pair[1]));
            let low = if (low as usize) <= n { Some(low) } else { None };
            (high, low)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_size() {
        assert_eq!(bracket_size(2), 2);
        assert_eq!(bracket_size(3), 4);
        assert_eq!(bracket_size(8), 8);
        assert_eq!(bracket_size(9), 16);
    }

    #[test]
    fn test_seed_order_eight() {
        assert_eq!(seed_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn test_byes_go_to_top_seeds() {
        let pairs = first_round_pairs(5);
        let bye_seeds: Vec<u32> = pairs
            .iter()
            .filter(|(_, low)| low.is_none())
            .map(|(high, _)| *high)
            .collect();
        assert_eq!(bye_seeds.len(), 3);
        let mut sorted = bye_seeds.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 3]);
    }

    #[test]
    fn test_full_field_has_no_byes() {
        assert!(first_round_pairs(8).iter().all(|(_, low)| low.is_some()));
    }
}
