//! Extraction of cross-document references from Markdown bodies.
//!
//! Recognizes inline links and images (`[text](target)`, `![alt](<target>)`)
//! and reference definitions (`[label]: target`). Fenced code blocks and
//! inline code spans are skipped, since example syntax inside them looks
//! like a link but is not one. Only targets that resolve inside the corpus
//! are kept.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scribe_common::DocumentId;

/// Destination of an inline link or image, starting at `](`. Either an
/// `<angle-bracketed>` target or a bare one that may hold one level of
/// balanced parentheses and ends at whitespace or the closing `)`.
static INLINE_DESTINATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\]\(\s*(?:<([^>\n]*)>|((?:[^\s()]|\([^\s()]*\))*)[\s)])")
        .expect("inline destination pattern is valid")
});

/// Reference definition at the start of a line. Footnotes (`[^label]:`) and
/// empty labels do not match.
static REF_DEFINITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\[[^\]\n^][^\]\n]*\]:[ \t]*(?:<([^>\n]*)>|(\S+))")
        .expect("reference definition pattern is valid")
});

/// Extracts the set of corpus documents referenced by `body`.
///
/// Relative targets resolve against `document`'s directory, `/`-prefixed
/// targets against the corpus root. External URLs, protocol-relative
/// links, same-document anchors and targets that climb above the root are
/// dropped, as is any reference back to `document` itself.
pub fn extract_references(body: &str, document: &DocumentId) -> BTreeSet<DocumentId> {
    let mut refs = BTreeSet::new();
    let mut fence: Option<Fence> = None;
    // Code spans may continue onto the next line but never past a blank
    // line or a fence, so text is scanned one paragraph at a time.
    let mut paragraph = String::new();

    for line in body.lines() {
        if let Some(open) = fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = Fence::opening(line) {
            scan_paragraph(&paragraph, document, &mut refs);
            paragraph.clear();
            fence = Some(open);
            continue;
        }
        if line.trim().is_empty() {
            scan_paragraph(&paragraph, document, &mut refs);
            paragraph.clear();
            continue;
        }
        paragraph.push_str(line);
        paragraph.push('\n');
    }
    scan_paragraph(&paragraph, document, &mut refs);

    refs
}

fn scan_paragraph(text: &str, document: &DocumentId, refs: &mut BTreeSet<DocumentId>) {
    if text.is_empty() {
        return;
    }
    let masked = mask_code_spans(text);
    for target in link_targets(&masked) {
        if let Some(id) = resolve_target(document, target) {
            refs.insert(id);
        }
    }
}

/// An open fenced code block: its marker character and run length.
#[derive(Clone, Copy)]
struct Fence {
    marker: u8,
    len: usize,
}

impl Fence {
    fn opening(line: &str) -> Option<Self> {
        let trimmed = line.trim_start().as_bytes();
        let marker = *trimmed.first()?;
        if marker != b'`' && marker != b'~' {
            return None;
        }
        let len = run_len(trimmed, 0, marker);
        if len < 3 {
            return None;
        }
        // A backtick fence's info string may not itself contain backticks.
        if marker == b'`' && trimmed[len..].contains(&b'`') {
            return None;
        }
        Some(Self { marker, len })
    }

    fn is_closed_by(self, line: &str) -> bool {
        let trimmed = line.trim_start().as_bytes();
        let len = run_len(trimmed, 0, self.marker);
        len >= self.len && trimmed[len..].iter().all(u8::is_ascii_whitespace)
    }
}

fn run_len(bytes: &[u8], start: usize, marker: u8) -> usize {
    bytes[start..].iter().take_while(|&&b| b == marker).count()
}

/// Blanks out inline code spans so their contents are never scanned.
///
/// A span opens with a run of backticks and closes at the next run of the
/// same length, possibly on a later line. An unmatched run is literal text.
fn mask_code_spans(text: &str) -> String {
    let bytes = text.as_bytes();
    if !bytes.contains(&b'`') {
        return text.to_string();
    }
    let mut masked = bytes.to_vec();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let open = run_len(bytes, i, b'`');
        match closing_run(bytes, i + open, open) {
            Some(close) => {
                let end = close + open;
                for b in &mut masked[i..end] {
                    if *b != b'\n' {
                        *b = b' ';
                    }
                }
                i = end;
            }
            None => i += open,
        }
    }
    String::from_utf8_lossy(&masked).into_owned()
}

fn closing_run(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let n = run_len(bytes, j, b'`');
            if n == len {
                return Some(j);
            }
            j += n;
        } else {
            j += 1;
        }
    }
    None
}

/// Raw link destinations found in one (already masked) paragraph.
fn link_targets(text: &str) -> Vec<&str> {
    REF_DEFINITION_REGEX
        .captures_iter(text)
        .chain(INLINE_DESTINATION_REGEX.captures_iter(text))
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .collect()
}

fn resolve_target(document: &DocumentId, raw: &str) -> Option<DocumentId> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') || raw.starts_with("//") || has_scheme(raw) {
        return None;
    }
    let end = raw.find(|c: char| c == '#' || c == '?').unwrap_or(raw.len());
    let path = percent_decode(&raw[..end]);
    if path.is_empty() {
        return None;
    }
    let resolved = document.resolve(&path).ok()?;
    (resolved != *document).then_some(resolved)
}

/// Returns `true` for targets like `https:`, `mailto:` or `C:`.
fn has_scheme(target: &str) -> bool {
    let Some(colon) = target.find(':') else {
        return false;
    };
    let mut chars = target[..colon].chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn percent_decode(s: &str) -> String {
    if !s.contains('%') {
        return s.to_string();
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| s.to_string())
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DocumentId {
        DocumentId::new(s).unwrap()
    }

    fn refs(body: &str, doc: &str) -> Vec<String> {
        extract_references(body, &id(doc))
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn empty_body_has_no_references() {
        assert!(extract_references("", &id("a.md")).is_empty());
        assert!(extract_references("just prose, no links", &id("a.md")).is_empty());
    }

    #[test]
    fn inline_links_and_images() {
        let body = "See [the guide](guide.md) and ![diagram](img/flow.png \"Flow\").";
        assert_eq!(refs(body, "README.md"), vec!["guide.md", "img/flow.png"]);
    }

    #[test]
    fn reference_definitions() {
        let body = "Read [setup][s].\n\n[s]: docs/setup.md \"Setup\"\n  [api]: <docs/api reference.md>\n";
        assert_eq!(
            refs(body, "README.md"),
            vec!["docs/api reference.md", "docs/setup.md"]
        );
    }

    #[test]
    fn footnote_definition_ignored() {
        assert!(refs("[^1]: see other.md for details", "a.md").is_empty());
    }

    #[test]
    fn parent_and_child_relative_targets() {
        let body = "[up](../intro.md) [down](details/more.md) [sibling](./peer.md)";
        assert_eq!(
            refs(body, "guide/start.md"),
            vec!["guide/details/more.md", "guide/peer.md", "intro.md"]
        );
    }

    #[test]
    fn root_relative_target() {
        assert_eq!(refs("[home](/README.md)", "a/b/c.md"), vec!["README.md"]);
    }

    #[test]
    fn directory_targets_are_valid() {
        assert_eq!(
            refs("[api](api/) [up](../)", "docs/guide/index.md"),
            vec!["docs", "docs/guide/api"]
        );
    }

    #[test]
    fn external_and_anchor_targets_dropped() {
        let body = "[web](https://example.com/a.md) [mail](mailto:me@example.com) \
                    [cdn](//cdn.example.com/x.js) [top](#top) [empty]()";
        assert!(refs(body, "a.md").is_empty());
    }

    #[test]
    fn fragment_and_query_stripped() {
        let body = "[a](other.md#section) [b](other.md?raw=1) [c](./other.md)";
        assert_eq!(refs(body, "a.md"), vec!["other.md"]);
    }

    #[test]
    fn spellings_collapse() {
        let body = "[a](docs/x.md) [b](./docs/x.md) [c](docs/../docs/x.md) [d](/docs/x.md)";
        assert_eq!(refs(body, "README.md"), vec!["docs/x.md"]);
    }

    #[test]
    fn percent_escapes_decoded() {
        assert_eq!(refs("[a](my%20notes.md)", "a.md"), vec!["my notes.md"]);
    }

    #[test]
    fn self_reference_excluded() {
        let body = "[me](a.md) [me again](./a.md#part) [other](b.md)";
        assert_eq!(refs(body, "a.md"), vec!["b.md"]);
    }

    #[test]
    fn escaping_root_dropped() {
        assert!(refs("[out](../../outside.md)", "docs/a.md").is_empty());
    }

    #[test]
    fn fenced_code_excluded() {
        let body = "\
Real [link](real.md).

```markdown
Example [fake](fake.md)
```

~~~~
[also fake](tilde.md)
~~~
still inside [fake](inner.md)
~~~~

After [fence](after.md).
";
        assert_eq!(refs(body, "a.md"), vec!["after.md", "real.md"]);
    }

    #[test]
    fn unclosed_fence_hides_rest() {
        let body = "[before](before.md)\n```\n[hidden](hidden.md)\n";
        assert_eq!(refs(body, "a.md"), vec!["before.md"]);
    }

    #[test]
    fn inline_code_excluded() {
        let body = "Write `[text](fake.md)` or ``[x](`fake2.md`)`` but see [real](real.md).";
        assert_eq!(refs(body, "a.md"), vec!["real.md"]);
    }

    #[test]
    fn unmatched_backtick_is_literal() {
        assert_eq!(refs("a ` tick then [x](x.md)", "a.md"), vec!["x.md"]);
    }

    #[test]
    fn code_span_across_line_break_excluded() {
        let body = "Before `[x](\nfake.md)` after [real](real.md).";
        assert_eq!(refs(body, "a.md"), vec!["real.md"]);
    }

    #[test]
    fn code_span_stops_at_blank_line() {
        let body = "`open\n\n[x](x.md) `";
        assert_eq!(refs(body, "a.md"), vec!["x.md"]);
    }

    #[test]
    fn definition_after_paragraph_text() {
        let body = "Intro with `code`.\n[guide]: docs/guide.md\n";
        assert_eq!(refs(body, "README.md"), vec!["docs/guide.md"]);
    }

    #[test]
    fn nested_parentheses_in_destination() {
        assert_eq!(refs("[w](notes(v2).md)", "a.md"), vec!["notes(v2).md"]);
    }

    #[test]
    fn link_text_spanning_lines() {
        assert_eq!(refs("[a long\nlabel](target.md)", "a.md"), vec!["target.md"]);
    }
}
