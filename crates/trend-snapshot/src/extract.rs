//! Trend candidate selection from rendered DOM text.

use std::collections::HashSet;

use crate::config::CandidateLimits;

/// Collects trimmed `textContent` of every `a`, `div` and `span`, in
/// document order. `{MAX_UNITS}` is a coarse UTF-16 upper bound so huge
/// container blocks are not shipped back over the DevTools bridge; the
/// exact length filter runs in [`select_trends`].
const COLLECT_SCRIPT_TEMPLATE: &str = r#"(() => {
  const out = [];
  for (const e of document.querySelectorAll('a, div, span')) {
    const t = (e.textContent || '').trim();
    if (t.length > 0 && t.length <= {MAX_UNITS}) out.push(t);
  }
  return out;
})()"#;

/// Whitespace as `String.prototype.trim` sees it: Unicode `White_Space`
/// minus U+0085, plus U+FEFF.
fn is_js_whitespace(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

/// Build the DOM collection script for the given limits.
pub fn collect_script(limits: &CandidateLimits) -> String {
    // A char needs at most two UTF-16 units.
    let max_units = limits.max_len.saturating_mul(2);
    COLLECT_SCRIPT_TEMPLATE.replace("{MAX_UNITS}", &max_units.to_string())
}

/// Filter, deduplicate and cap raw candidates.
///
/// Candidates are trimmed the way the page script trims and kept when
/// their length in chars lies in `[min_len, max_len]`. Duplicates are
/// compared lowercased and the first casing seen wins. Scanning stops once `max_trends` are accepted.
pub fn select_trends<I, S>(candidates: I, limits: &CandidateLimits) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    if limits.max_trends == 0 {
        return out;
    }
    let mut seen = HashSet::new();

    for candidate in candidates {
        let text = candidate.as_ref().trim_matches(is_js_whitespace);
        let len = text.chars().count();
        if len < limits.min_len || len > limits.max_len {
            continue;
        }
        if !seen.insert(text.to_lowercase()) {
            continue;
        }
        out.push(text.to_string());
        if out.len() >= limits.max_trends {
            break;
        }
    }

    out
}
