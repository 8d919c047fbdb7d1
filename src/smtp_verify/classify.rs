//! Reply classification rules.
//!
//! Which codes and phrases mean "mailbox exists" or "mailbox does not exist"
//! lives in the two tables below; everything else is indeterminate.

use phf::phf_map;

use super::types::{Existence, SmtpReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accepted,
    Rejected,
}

static RCPT_CODES: phf::Map<u16, Verdict> = phf_map! {
    250u16 => Verdict::Accepted,
    251u16 => Verdict::Accepted,
    550u16 => Verdict::Rejected,
    551u16 => Verdict::Rejected,
    553u16 => Verdict::Rejected,
    554u16 => Verdict::Rejected,
};

const MAILBOX_UNKNOWN_MARKERS: &[&str] = &[
    "user unknown",
    "unknown user",
    "no such user",
    "mailbox unavailable",
    "does not exist",
    "invalid recipient",
];

pub fn mentions_unknown_mailbox(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    MAILBOX_UNKNOWN_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Classifies the reply to `RCPT TO`.
pub fn classify_reply(reply: &SmtpReply) -> Existence {
    match RCPT_CODES.get(&reply.code) {
        Some(Verdict::Accepted) => Existence::Exists,
        Some(Verdict::Rejected) => Existence::DoesNotExist,
        None if mentions_unknown_mailbox(&reply.text()) => Existence::DoesNotExist,
        None if reply.is_transient_failure() => {
            Existence::indeterminate(format!("temporary failure {}", reply.code))
        }
        None => Existence::indeterminate(format!("unexpected response {}", reply.code)),
    }
}

/// Classifies free-form server text received in place of a `RCPT TO` reply.
/// Only a leading status code counts, never digits further in the line.
pub fn classify_text(text: &str) -> Existence {
    let trimmed = text.trim_start();
    let code = trimmed
        .get(..3)
        .filter(|prefix| prefix.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|prefix| prefix.parse::<u16>().ok())
        .filter(|_| !trimmed.as_bytes().get(3).is_some_and(u8::is_ascii_digit));
    let rejected_code = code
        .and_then(|code| RCPT_CODES.get(&code))
        .is_some_and(|verdict| *verdict == Verdict::Rejected);
    if rejected_code || mentions_unknown_mailbox(text) {
        Existence::DoesNotExist
    } else {
        Existence::indeterminate(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_codes_exist() {
        assert_eq!(classify_reply(&SmtpReply::new(250, "2.1.5 Ok")), Existence::Exists);
        assert_eq!(
            classify_reply(&SmtpReply::new(251, "User not local; will forward")),
            Existence::Exists
        );
    }

    #[test]
    fn rejection_codes_do_not_exist() {
        for code in [550, 551, 553, 554] {
            assert_eq!(
                classify_reply(&SmtpReply::new(code, "5.1.1 rejected")),
                Existence::DoesNotExist,
                "code {code}"
            );
        }
    }

    #[test]
    fn rejection_phrases_do_not_exist() {
        let reply = SmtpReply::new(552, "Requested action aborted: Mailbox unavailable");
        assert_eq!(classify_reply(&reply), Existence::DoesNotExist);
        let reply = SmtpReply::new(501, "5.1.3 Invalid recipient syntax");
        assert_eq!(classify_reply(&reply), Existence::DoesNotExist);
    }

    #[test]
    fn other_replies_are_indeterminate() {
        assert!(matches!(
            classify_reply(&SmtpReply::new(451, "Greylisted, try later")),
            Existence::Indeterminate(reason) if reason.contains("temporary")
        ));
        assert!(matches!(
            classify_reply(&SmtpReply::new(552, "Quota exceeded")),
            Existence::Indeterminate(_)
        ));
    }

    #[test]
    fn raw_text_uses_leading_550_family() {
        assert_eq!(classify_text("550 5.1.1 nope"), Existence::DoesNotExist);
        assert_eq!(classify_text("553 sorry"), Existence::DoesNotExist);
        assert_eq!(classify_text("Error: no such user here"), Existence::DoesNotExist);
        assert!(matches!(classify_text("garbage"), Existence::Indeterminate(_)));
    }

    #[test]
    fn raw_text_ignores_embedded_digits() {
        assert!(matches!(classify_text("Error: 550 rejected"), Existence::Indeterminate(_)));
        assert!(matches!(
            classify_text("mx.test ESMTP queue 15502 ready"),
            Existence::Indeterminate(_)
        ));
        assert!(matches!(classify_text("5501 odd"), Existence::Indeterminate(_)));
    }
}
