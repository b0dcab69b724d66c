//! Helpers for logging model output.

/// One-line preview of `text` for log lines.
///
/// Runs of whitespace (including newlines in planner JSON or tool output)
/// collapse to a single space. Previews longer than `max_chars` characters
/// are cut and end with the number of characters left out.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut words = text.split_whitespace();
    let mut flat = String::with_capacity(text.len().min(max_chars + 16));
    if let Some(first) = words.next() {
        flat.push_str(first);
        for word in words {
            flat.push(' ');
            flat.push_str(word);
        }
    }

    let total = flat.chars().count();
    if total <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}... (+{} chars)", total - max_chars)
}
