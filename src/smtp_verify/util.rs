use rand::seq::SliceRandom;
use rand::{Rng, distributions::Alphanumeric};

pub fn random_local_part(len: usize) -> String {
    let length = len.clamp(6, 32);
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase()
}

const HOST_PREFIXES: &[&str] = &["mail", "mx", "smtp", "relay", "out"];

/// Plausible-looking client name, different on every call.
pub fn random_hostname() -> String {
    let mut rng = rand::thread_rng();
    let prefix = HOST_PREFIXES.choose(&mut rng).copied().unwrap_or("mail");
    let number: u16 = rng.gen_range(1..100);
    let label: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase();
    format!("{prefix}{number}.{label}.net")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_part_length_is_clamped() {
        assert_eq!(random_local_part(2).len(), 6);
        assert_eq!(random_local_part(100).len(), 32);
        assert!(random_local_part(12).chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn hostname_is_a_valid_domain() {
        let host = random_hostname();
        assert!(crate::validator::is_valid_domain(&host), "{host}");
    }
}
