use std::collections::HashSet;

use proptest::prelude::*;

use super::*;

#[test]
fn mario_rosa_basic_patterns() {
    let set = guesses_for_name("Mario Rosa", "example.com", GuessStrategy::Basic)
        .expect("valid domain");
    insta::assert_snapshot!(set.addresses().join("\n"), @r"
    mario@example.com
    rosa@example.com
    mario.rosa@example.com
    rosa.mario@example.com
    mariorosa@example.com
    rosamario@example.com
    m.rosa@example.com
    mrosa@example.com
    mr@example.com
    ");
}

#[test]
fn three_tokens_split_rounding_up() {
    // first group: ["anna", "maria"], last group: ["verdi"]
    let set = guesses_for_name("Anna Maria Verdi", "example.org", GuessStrategy::Basic)
        .expect("valid domain");
    let addresses = set.addresses();
    assert_eq!(addresses[0], "anna@example.org");
    assert_eq!(addresses[1], "verdi@example.org");
    assert!(addresses.contains(&"maria.verdi@example.org".to_string()));
    assert!(!addresses.contains(&"anna.maria@example.org".to_string()));
    // "verdi" n'apparaît qu'une fois malgré deux paires
    let verdi = addresses
        .iter()
        .filter(|a| a.as_str() == "verdi@example.org")
        .count();
    assert_eq!(verdi, 1);
}

#[test]
fn smart_strategy_priority_list() {
    let set = guesses_for_name("Mario De Rosa", "example.com", GuessStrategy::Smart)
        .expect("valid domain");
    let addresses = set.addresses();
    assert_eq!(addresses.len(), 15);
    assert_eq!(addresses[0], "mario.derosa@example.com");
    assert_eq!(addresses[1], "mario@example.com");
    assert_eq!(addresses[2], "mderosa@example.com");
    assert_eq!(addresses[13], "mario.derosa1@example.com");
    assert_eq!(addresses[14], "marioderosa1@example.com");
}

#[test]
fn single_token_yields_nothing() {
    let set = guesses_for_name("Madonna", "example.com", GuessStrategy::Basic)
        .expect("valid domain");
    assert!(set.is_empty());
    let set = guesses_for_name("Madonna", "example.com", GuessStrategy::Smart)
        .expect("valid domain");
    assert!(set.is_empty());
}

#[test]
fn invalid_domain_is_an_error() {
    let err = guesses_for_name("Mario Rosa", "example", GuessStrategy::Basic)
        .expect_err("no tld");
    assert_eq!(err, GuessError::InvalidDomain("example".to_string()));
}

#[test]
fn unusable_tokens_are_dropped() {
    let set = guesses_for_name("Mario (IT) Rosa", "example.com", GuessStrategy::Basic)
        .expect("valid domain");
    assert!(!set.is_empty());
    assert!(set.iter().all(|c| !c.local_part().contains('(')));
}

#[test]
fn cyrillic_names_still_give_guesses() {
    let set = guesses_for_name("Иван Петров", "example.com", GuessStrategy::Basic)
        .expect("valid domain");
    assert_eq!(set.len(), 9);
    assert_eq!(set.addresses()[2], "ivan.petrov@example.com");
}

#[test]
fn domain_is_normalized() {
    let set = guesses_for_name("Mario Rosa", "Example.COM", GuessStrategy::Basic)
        .expect("valid domain");
    assert!(set.iter().all(|c| c.domain() == "example.com"));
}

#[test]
fn strategy_parses_from_str() {
    assert_eq!("smart".parse::<GuessStrategy>(), Ok(GuessStrategy::Smart));
    assert_eq!("BASIC".parse::<GuessStrategy>(), Ok(GuessStrategy::Basic));
    assert!("fancy".parse::<GuessStrategy>().is_err());
}

proptest! {
    #[test]
    fn multi_token_names_give_unique_non_empty_sets(
        name in "[a-z]{1,8}( [a-z]{1,8}){1,3}",
        smart in any::<bool>(),
    ) {
        let strategy = if smart { GuessStrategy::Smart } else { GuessStrategy::Basic };
        let set = guesses_for_name(&name, "example.com", strategy).unwrap();
        prop_assert!(!set.is_empty());
        let unique: HashSet<String> = set.addresses().into_iter().collect();
        prop_assert_eq!(unique.len(), set.len());
    }

    #[test]
    fn ordering_is_deterministic(name in "[a-z]{1,8}( [a-z]{1,8}){1,3}") {
        let a = guesses_for_name(&name, "example.com", GuessStrategy::Basic).unwrap();
        let b = guesses_for_name(&name, "example.com", GuessStrategy::Basic).unwrap();
        prop_assert_eq!(a.addresses(), b.addresses());
    }

    #[test]
    fn single_token_names_give_empty_sets(name in "[a-z]{1,12}") {
        let set = guesses_for_name(&name, "example.com", GuessStrategy::Basic).unwrap();
        prop_assert!(set.is_empty());
    }
}
