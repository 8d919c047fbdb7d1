//! Display-name cleanup used by the guess generator.

use phf::phf_map;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Letters that have no canonical decomposition but still have an obvious
/// ASCII spelling.
const LIGATURE_MAP: phf::Map<char, &'static str> = phf_map! {
    'œ' => "oe",
    'æ' => "ae",
    'ß' => "ss",
    'ø' => "o",
    'ł' => "l",
    'đ' => "d",
    'þ' => "th",
};

/// Cyrillic spelled the way passports and corporate directories do.
const CYRILLIC_MAP: phf::Map<char, &'static str> = phf_map! {
    'а' => "a", 'б' => "b", 'в' => "v", 'г' => "g", 'ґ' => "g", 'д' => "d",
    'е' => "e", 'є' => "ye", 'ж' => "zh", 'з' => "z", 'и' => "i", 'і' => "i",
    'к' => "k", 'л' => "l", 'м' => "m", 'н' => "n", 'о' => "o",
    'п' => "p", 'р' => "r", 'с' => "s", 'т' => "t", 'у' => "u", 'ф' => "f",
    'х' => "kh", 'ц' => "ts", 'ч' => "ch", 'ш' => "sh", 'щ' => "shch",
    'ъ' => "", 'ы' => "y", 'ь' => "", 'э' => "e", 'ю' => "yu", 'я' => "ya",
};

/// Lowercased, whitespace-split tokens of a display name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameTokens(Vec<String>);

impl NameTokens {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First/last combinations need at least two tokens.
    pub fn is_sufficient(&self) -> bool {
        self.0.len() >= 2
    }
}

pub fn normalize_name(raw: &str) -> NameTokens {
    let lowered = raw.trim().to_lowercase();
    let folded = fold_diacritics(&lowered);
    NameTokens(folded.split_whitespace().map(str::to_string).collect())
}

fn fold_diacritics(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        match LIGATURE_MAP.get(&c).or_else(|| CYRILLIC_MAP.get(&c)) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_lowercases() {
        let tokens = normalize_name("  Mario \t  ROSA\n");
        assert_eq!(tokens.as_slice(), ["mario", "rosa"]);
        assert!(tokens.is_sufficient());
    }

    #[test]
    fn single_token_is_insufficient() {
        let tokens = normalize_name("Cher");
        assert_eq!(tokens.len(), 1);
        assert!(!tokens.is_sufficient());
        assert!(normalize_name("   ").is_empty());
    }

    #[test]
    fn strips_diacritics() {
        let tokens = normalize_name("José Nuñez");
        assert_eq!(tokens.as_slice(), ["jose", "nunez"]);
        let tokens = normalize_name("Søren Œrsted");
        assert_eq!(tokens.as_slice(), ["soren", "oersted"]);
    }

    #[test]
    fn transliterates_cyrillic() {
        let tokens = normalize_name("Иван Петров");
        assert_eq!(tokens.as_slice(), ["ivan", "petrov"]);
        let tokens = normalize_name("Юлия Щербакова");
        assert_eq!(tokens.as_slice(), ["yuliya", "shcherbakova"]);
    }
}
