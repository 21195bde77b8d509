/// Trim, collapse every whitespace run to one space, keep at most `max_chars` characters
///
/// Used as the content half of both the provisional-match test and the dedup key,
/// so `"  hi   there\n"` and `"hi there"` compare equal.
pub fn normalize_content(text: &str, max_chars: usize) -> String {
    let mut normalized = String::with_capacity(text.len().min(max_chars.saturating_mul(4)));
    let mut taken = 0;

    for word in text.split_whitespace() {
        if taken >= max_chars {
            break;
        }
        if !normalized.is_empty() {
            normalized.push(' ');
            taken += 1;
            if taken >= max_chars {
                // Never end on the separator
                normalized.pop();
                break;
            }
        }
        for ch in word.chars() {
            if taken >= max_chars {
                break;
            }
            normalized.push(ch);
            taken += 1;
        }
    }

    normalized
}
