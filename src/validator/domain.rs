/// Valide le domaine: conversion IDNA + checks de labels.
/// Push des raisons invalidantes dans `reasons`.
pub fn check_domain(domain: &str, reasons: &mut Vec<String>) {
    let domain_ascii = match idna::domain_to_ascii(domain.trim()) {
        Ok(d) => d,
        Err(_) => {
            reasons.push("domain punycode conversion failed".to_string());
            return;
        }
    };

    if domain_ascii.is_empty() {
        reasons.push("domain empty after IDNA conversion".to_string());
        return;
    }

    // au moins un point
    if !domain_ascii.contains('.') {
        reasons.push("domain must contain at least one dot".to_string());
    }

    for label in domain_ascii.split('.') {
        if label.is_empty() {
            reasons.push("empty domain label".to_string());
            continue;
        }
        if label.len() > 63 {
            reasons.push(format!(
                "domain label '{}' length {} > 63",
                label,
                label.len()
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            reasons.push(format!(
                "domain label '{}' cannot start/end with '-'",
                label
            ));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            reasons.push(format!("domain label '{}' has invalid chars", label));
        }
    }

    if let Some(tld) = domain_ascii.rsplit('.').next() {
        if !tld.is_empty() && !is_valid_tld(tld) {
            reasons.push(format!("top-level domain '{tld}' must be 2+ letters"));
        }
    }
}

fn is_valid_tld(tld: &str) -> bool {
    if tld.starts_with("xn--") {
        return tld.len() > 4;
    }
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Retourne (domaine en minuscules, domaine ASCII). Le second est vide si la
/// conversion IDNA échoue.
pub fn normalize_domain(domain: &str) -> (String, String) {
    let lower = domain.trim().trim_end_matches('.').to_lowercase();
    let ascii = idna::domain_to_ascii(&lower).unwrap_or_default();
    (lower, ascii)
}
