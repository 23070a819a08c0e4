// Sanitize chat text before sending it to the model.
// Strips invisible Unicode, drops injected instruction lines, normalizes
// whitespace and bounds the length. Bengali script passes through untouched.

/// Maximum input length sent to the model (characters).
const MAX_INPUT_CHARS: usize = 20_000;

/// Clean chat text for model consumption.
pub fn sanitize_for_llm(raw: &str) -> String {
    let cleaned = remove_invisible_chars(raw);
    let (no_injection, removed) = remove_injection_lines(&cleaned);

    if removed > 0 {
        // Counts only; chat content is customer data.
        tracing::warn!(
            removed_lines = removed,
            "Instruction-like lines removed from chat input"
        );
    }

    let normalized = normalize_whitespace(&no_injection);
    truncate_chars(&normalized, MAX_INPUT_CHARS)
}

/// Remove zero-width, bidi-override and control characters.
/// Keeps space, newline, tab and the ZWJ/ZWNJ pair Bengali conjuncts use.
fn remove_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if matches!(*c, ' ' | '\n' | '\t' | '\u{200C}' | '\u{200D}') {
                return true;
            }
            if matches!(
                *c,
                '\u{200B}'
                    | '\u{200E}'
                    | '\u{200F}'
                    | '\u{202A}'..='\u{202E}'
                    | '\u{2060}'..='\u{2064}'
                    | '\u{FEFF}'
            ) {
                return false;
            }
            !c.is_control()
        })
        .collect()
}

fn is_injection_line(trimmed_lower: &str) -> bool {
    trimmed_lower.starts_with("system:")
        || trimmed_lower.starts_with("[system]")
        || trimmed_lower.starts_with("[inst]")
        || trimmed_lower.starts_with("<<sys>>")
        || trimmed_lower.starts_with("note to ai:")
        || trimmed_lower.starts_with("<instruction")
        || trimmed_lower.starts_with("</chat")
        || trimmed_lower.contains("ignore previous instructions")
        || trimmed_lower.contains("ignore all instructions")
        || trimmed_lower.contains("disregard your instructions")
        || trimmed_lower.contains("new instructions:")
}

/// Drop lines that try to talk to the model instead of the merchant.
fn remove_injection_lines(text: &str) -> (String, usize) {
    let mut kept = Vec::new();
    let mut removed = 0usize;
    for line in text.lines() {
        if is_injection_line(&line.trim().to_lowercase()) {
            removed += 1;
        } else {
            kept.push(line);
        }
    }
    (kept.join("\n"), removed)
}

/// Trim each line and collapse runs of blank lines.
fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut prev_blank = true;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !prev_blank {
                lines.push("");
            }
            prev_blank = true;
        } else {
            lines.push(trimmed);
            prev_blank = false;
        }
    }

    while lines.last() == Some(&"") {
        lines.pop();
    }
    lines.join("\n")
}

/// Truncate on a character boundary, never inside a multi-byte char.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…[TRUNCATED]", &text[..byte_idx]),
        None => text.to_string(),
    }
}
