//! Text clean-up applied to agent-authored bodies and titles.

/// Longest body forwarded to GitHub, in characters.
pub const MAX_BODY_CHARS: usize = 65_000;

/// Longest title forwarded to GitHub, in characters.
pub const MAX_TITLE_CHARS: usize = 256;

const TRUNCATION_NOTE: &str = "\n\n[Content truncated due to length]";

/// Neutralizes @mentions and caps the body length, truncation note included.
#[must_use]
pub fn sanitize_body(text: &str) -> String {
    sanitize_body_within(text, 0)
}

/// Like [`sanitize_body`], but keeps `reserved` characters of the limit free
/// for text the caller appends afterwards.
#[must_use]
pub fn sanitize_body_within(text: &str, reserved: usize) -> String {
    let neutralized = neutralize_mentions(text);
    truncate_chars(
        &neutralized,
        MAX_BODY_CHARS.saturating_sub(reserved),
        TRUNCATION_NOTE,
    )
}

/// Collapses a title onto one line, neutralizes @mentions, and caps its length.
#[must_use]
pub fn sanitize_title(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&neutralize_mentions(&single_line), MAX_TITLE_CHARS, "")
}

/// Wraps `@user` and `@org/team` mentions in backticks so they do not notify.
///
/// Email addresses and mentions already inside inline code are left alone.
#[must_use]
pub fn neutralize_mentions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        let starts_mention = c == '@'
            && !prev.is_some_and(|p| p.is_alphanumeric() || p == '`' || p == '_')
            && chars.peek().is_some_and(char::is_ascii_alphanumeric);

        if !starts_mention {
            out.push(c);
            prev = Some(c);
            continue;
        }

        let mut handle = String::new();
        let mut seen_slash = false;
        while let Some(&next) = chars.peek() {
            let accepted = next.is_ascii_alphanumeric()
                || next == '-'
                || (seen_slash && next == '_')
                || (!seen_slash && next == '/' && !handle.is_empty());
            if !accepted {
                break;
            }
            seen_slash |= next == '/';
            handle.push(next);
            chars.next();
        }
        // `@user/` keeps the slash outside the code span.
        let dangling = handle.strip_suffix('/');

        out.push_str("`@");
        out.push_str(dangling.unwrap_or(handle.as_str()));
        out.push('`');
        if dangling.is_some() {
            out.push('/');
        }
        prev = Some('`');
    }

    out
}

// Output never exceeds `max` characters, `note` included.
fn truncate_chars(text: &str, max: usize, note: &str) -> String {
    if text.char_indices().nth(max).is_none() {
        return text.to_owned();
    }
    let keep = max.saturating_sub(note.chars().count());
    let cut = text.char_indices().nth(keep).map_or(text.len(), |(at, _)| at);
    let mut truncated = text[..cut].to_owned();
    truncated.push_str(note);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_are_wrapped() {
        assert_eq!(
            neutralize_mentions("cc @octocat and @github/security please"),
            "cc `@octocat` and `@github/security` please"
        );
        assert_eq!(neutralize_mentions("@octocat"), "`@octocat`");
        assert_eq!(neutralize_mentions("see @octocat/"), "see `@octocat`/");
    }

    #[test]
    fn emails_and_code_are_untouched() {
        assert_eq!(
            neutralize_mentions("mail dev@example.com"),
            "mail dev@example.com"
        );
        assert_eq!(neutralize_mentions("run `@octocat`"), "run `@octocat`");
        assert_eq!(neutralize_mentions("a lone @ sign"), "a lone @ sign");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(MAX_BODY_CHARS + 10);
        let sanitized = sanitize_body(&body);
        assert!(sanitized.ends_with(TRUNCATION_NOTE));
        assert_eq!(sanitized.chars().count(), MAX_BODY_CHARS);

        let exact = "y".repeat(MAX_BODY_CHARS);
        assert_eq!(sanitize_body(&exact), exact);

        let short = "ok".to_owned();
        assert_eq!(sanitize_body(&short), "ok");
    }

    #[test]
    fn reserved_room_shrinks_the_body() {
        let body = "é".repeat(MAX_BODY_CHARS);
        let sanitized = sanitize_body_within(&body, 120);
        assert!(sanitized.ends_with(TRUNCATION_NOTE));
        assert_eq!(sanitized.chars().count(), MAX_BODY_CHARS - 120);

        assert_eq!(sanitize_body_within("fits", 120), "fits");
    }

    #[test]
    fn titles_are_single_line() {
        assert_eq!(sanitize_title("  Fix\nthe   build "), "Fix the build");
        let long = "é".repeat(MAX_TITLE_CHARS + 1);
        assert_eq!(sanitize_title(&long).chars().count(), MAX_TITLE_CHARS);
    }
}
