use super::*;
use std::collections::{HashMap, HashSet};

fn field(names: &[&str]) -> Vec<Entrant> {
    names.iter().map(|n| Entrant::named(n)).collect()
}

fn pair_key(a: &EntrantId, b: &EntrantId) -> (String, String) {
    if a < b {
        (a.0.clone(), b.0.clone())
    } else {
        (b.0.clone(), a.0.clone())
    }
}

fn assert_complete(entrants: &[Entrant]) {
    let schedule = generate_round_robin(entrants);
    let n = entrants.len();
    let padded = n + n % 2;

    assert_eq!(schedule.len(), padded - 1);

    let mut pairs: HashMap<(String, String), u32> = HashMap::new();
    let mut byes: HashMap<String, u32> = HashMap::new();
    for round in &schedule {
        assert_eq!(round.len(), padded / 2);

        // Nobody appears twice in one round
        let mut seen = HashSet::new();
        for pairing in round {
            match pairing {
                Pairing::Match { a, b } => {
                    assert!(seen.insert(a.clone()));
                    assert!(seen.insert(b.clone()));
                    *pairs.entry(pair_key(a, b)).or_insert(0) += 1;
                }
                Pairing::Bye(e) => {
                    assert!(seen.insert(e.clone()));
                    *byes.entry(e.0.clone()).or_insert(0) += 1;
                }
            }
        }
    }

    assert_eq!(pairs.len(), n * (n - 1) / 2);
    assert!(pairs.values().all(|&count| count == 1), "repeated pairing");

    if n % 2 == 1 {
        assert_eq!(byes.len(), n);
        assert!(byes.values().all(|&count| count == 1));
    } else {
        assert!(byes.is_empty());
    }
}

#[test]
fn test_round_robin_completeness_small_fields() {
    for n in 2..=12 {
        let names: Vec<String> = (0..n).map(|i| format!("T{i:02}")).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        assert_complete(&field(&refs));
    }
}

#[test]
fn test_five_entrants_scenario() {
    let entrants = field(&["A", "B", "C", "D", "E"]);
    let schedule = generate_round_robin(&entrants);

    assert_eq!(schedule.len(), 5);

    let matches: Vec<&Pairing> = schedule
        .iter()
        .flatten()
        .filter(|p| matches!(p, Pairing::Match { .. }))
        .collect();
    assert_eq!(matches.len(), 10);

    // Every entrant appears in 4 real matches plus exactly one bye
    for e in &entrants {
        let appearances = schedule.iter().flatten().filter(|p| p.involves(&e.id)).count();
        assert_eq!(appearances, 5);
        let byes = schedule
            .iter()
            .flatten()
            .filter(|p| **p == Pairing::Bye(e.id.clone()))
            .count();
        assert_eq!(byes, 1);
    }
}

#[test]
fn test_first_round_pairs_ends() {
    let entrants = field(&["A", "B", "C", "D"]);
    let schedule = generate_round_robin(&entrants);

    assert_eq!(
        schedule[0][0],
        Pairing::Match {
            a: "A".into(),
            b: "D".into()
        }
    );
    assert_eq!(
        schedule[0][1],
        Pairing::Match {
            a: "B".into(),
            b: "C".into()
        }
    );
    // After one rotation D sits at position 1
    assert_eq!(
        schedule[1][0],
        Pairing::Match {
            a: "A".into(),
            b: "C".into()
        }
    );
}

#[test]
fn test_fewer_than_two_entrants_yield_nothing() {
    assert!(generate_round_robin(&[]).is_empty());
    assert!(generate_round_robin(&field(&["solo"])).is_empty());
}
