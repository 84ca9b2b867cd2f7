//! Decides which characters of a block need a backslash to stay literal.
//!
//! Escaping is planned over the whole block before rendering so the decision for a
//! character can depend on what follows it (a `#` is only a heading marker when
//! whitespace follows, an `_` only emphasis when a matching `_` closes it later on the
//! line). The renderer consults the resulting mask character by character.
//!
//! Rules:
//!
//! 1. Line starts (index 0 and after every newline):
//!    - `#` runs of 1 to 6 followed by whitespace or end of line
//!    - `-`, `+`, `*` followed by whitespace or end of line
//!    - up to 9 digits followed by `.` or `)` and whitespace or end of line; the
//!      `.`/`)` gets the backslash
//!    - `>` always
//!    - thematic breaks (three or more of the same `-`, `*`, `_`, spaces allowed)
//! 2. Runs of `*`, `_`, `~`, `+` and `` ` `` that would pair up as emphasis: a run that
//!    can open, later matched on the same line by a run of the same character and
//!    length that can close. Both runs are escaped; unmatched runs are left alone.
//!    `~` and `+` pair inside words too (`H~2~O`), so for them only the whitespace
//!    side of the run counts.
//! 3. A backslash followed by ASCII punctuation.
//! 4. `[` when a `]` follows on the same line, so no link or image can form.
//! 5. `<` when it could start an HTML tag or autolink: followed by a letter, `/`, `!`
//!    or `?`, or by a `>` later on the line.
//!
//! Characters flagged as verbatim (inside inline code or a code block) are never escaped.

/// Returns one flag per character: `true` when a backslash must precede it.
pub(crate) fn plan(chars: &[char], verbatim: &[bool]) -> Vec<bool> {
    let mut escaped = vec![false; chars.len()];
    mark_line_markers(chars, verbatim, &mut escaped);
    mark_delimiter_pairs(chars, verbatim, &mut escaped);
    mark_backslashes(chars, verbatim, &mut escaped);
    mark_brackets(chars, verbatim, &mut escaped);
    mark_angle_brackets(chars, verbatim, &mut escaped);
    escaped
}

fn is_verbatim(verbatim: &[bool], index: usize) -> bool {
    verbatim.get(index).copied().unwrap_or(false)
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '*' | '_' | '~' | '+' | '`')
}

fn mark_line_markers(chars: &[char], verbatim: &[bool], escaped: &mut [bool]) {
    let mut start = 0;
    while start <= chars.len() {
        let end = chars[start..]
            .iter()
            .position(|&c| c == '\n')
            .map_or(chars.len(), |p| start + p);

        if let Some(offset) = line_marker(&chars[start..end]) {
            let index = start + offset;
            if !is_verbatim(verbatim, index) {
                escaped[index] = true;
            }
        }
        start = end + 1;
    }
}

/// Offset within `line` of the character that would turn the line into block syntax.
fn line_marker(line: &[char]) -> Option<usize> {
    let first = *line.first()?;
    let blank_at = |at: usize| line.get(at).map_or(true, |c| c.is_whitespace());

    match first {
        '>' => Some(0),
        '#' => {
            let run = line.iter().take_while(|&&c| c == '#').count();
            (run <= 6 && blank_at(run)).then_some(0)
        }
        '-' | '+' | '*' if blank_at(1) => Some(0),
        '-' | '*' | '_' if is_thematic_break(line) => Some(0),
        c if c.is_ascii_digit() => {
            let run = line.iter().take_while(|c| c.is_ascii_digit()).count();
            let delimited = matches!(line.get(run), Some('.') | Some(')'));
            (run <= 9 && delimited && blank_at(run + 1)).then_some(run)
        }
        _ => None,
    }
}

fn is_thematic_break(line: &[char]) -> bool {
    let marker = line[0];
    let mut count = 0;
    for &c in line {
        if c == marker {
            count += 1;
        } else if c != ' ' && c != '\t' {
            return false;
        }
    }
    count >= 3
}

fn mark_delimiter_pairs(chars: &[char], verbatim: &[bool], escaped: &mut [bool]) {
    // (delimiter, run length, run start) of runs that may still be closed
    let mut openers: Vec<(char, usize, usize)> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            openers.clear();
            i += 1;
            continue;
        }
        if !is_delimiter(c) || is_verbatim(verbatim, i) {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i] == c && !is_verbatim(verbatim, i) {
            i += 1;
        }
        let len = i - start;
        let before = start.checked_sub(1).map(|p| chars[p]);
        let after = chars.get(i).copied();

        let intraword = matches!(c, '~' | '+');
        let can_open = (intraword
            || before.map_or(true, |b| b.is_whitespace() || b.is_ascii_punctuation()))
            && after.map_or(false, |a| !a.is_whitespace());
        let can_close = before.map_or(false, |b| !b.is_whitespace())
            && (intraword
                || after.map_or(true, |a| a.is_whitespace() || a.is_ascii_punctuation()));

        if can_close {
            if let Some(pos) = openers
                .iter()
                .rposition(|&(delimiter, run, _)| delimiter == c && run == len)
            {
                let (_, _, open_start) = openers[pos];
                openers.truncate(pos);
                escaped[open_start..open_start + len].fill(true);
                escaped[start..i].fill(true);
                continue;
            }
        }
        if can_open {
            openers.push((c, len, start));
        }
    }
}

fn mark_backslashes(chars: &[char], verbatim: &[bool], escaped: &mut [bool]) {
    for (i, pair) in chars.windows(2).enumerate() {
        if pair[0] == '\\' && pair[1].is_ascii_punctuation() && !is_verbatim(verbatim, i) {
            escaped[i] = true;
        }
    }
}

/// Whether `target` occurs after `from` before the end of the line.
fn ahead_on_line(chars: &[char], from: usize, target: char) -> bool {
    chars[from + 1..]
        .iter()
        .take_while(|&&c| c != '\n')
        .any(|&c| c == target)
}

fn mark_brackets(chars: &[char], verbatim: &[bool], escaped: &mut [bool]) {
    for (i, &c) in chars.iter().enumerate() {
        if c == '[' && !is_verbatim(verbatim, i) && ahead_on_line(chars, i, ']') {
            escaped[i] = true;
        }
    }
}

fn mark_angle_brackets(chars: &[char], verbatim: &[bool], escaped: &mut [bool]) {
    for (i, &c) in chars.iter().enumerate() {
        if c != '<' || is_verbatim(verbatim, i) {
            continue;
        }
        let tag_start = chars
            .get(i + 1)
            .is_some_and(|&next| next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?'));
        if tag_start || ahead_on_line(chars, i, '>') {
            escaped[i] = true;
        }
    }
}
