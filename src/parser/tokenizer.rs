/// Two of these in a row expand to the shell's own pid.
pub const PID_MARKER: char = '$';

/// Splits a line on whitespace and expands `$$` inside every word.
///
/// A line holding only whitespace yields no tokens.
pub fn tokenize(line: &str, pid: u32) -> Vec<String> {
    let pid = pid.to_string();
    line.split_whitespace()
        .map(|word| expand_pid(word, &pid))
        .collect()
}

/// Replaces each `$$` pair in `word` with `pid`, scanning left to right.
/// A lone `$` is copied through untouched.
pub fn expand_pid(word: &str, pid: &str) -> String {
    if !word.contains(PID_MARKER) {
        return word.to_string();
    }

    let mut expanded = String::with_capacity(word.len() + pid.len());
    let mut chars = word.chars().peekable();

    while let Some(c) = chars.next() {
        if c == PID_MARKER && chars.peek() == Some(&PID_MARKER) {
            chars.next();
            expanded.push_str(pid);
        } else {
            expanded.push(c);
        }
    }

    expanded
}
