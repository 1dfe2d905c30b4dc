//! Post-conversion cleanup passes for extracted page Markdown.
//!
//! Passes run in a fixed order; each one is a plain `&str -> String` function.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Passes that need no page context.
const PASSES: &[fn(&str) -> String] = &[
    collapse_blank_lines,
    strip_fence_language_prefix,
    strip_wrapper_tags,
];

/// Run every cleanup pass over `md`, resolving links against `base` if given.
pub(crate) fn run(md: &str, base: Option<&Url>) -> String {
    let mut out = PASSES.iter().fold(md.to_string(), |acc, pass| pass(&acc));
    if let Some(base) = base {
        out = absolutize_links(&out, base);
    }
    finish(&out)
}

/// Collapse runs of blank lines down to a single empty line.
fn collapse_blank_lines(md: &str) -> String {
    static BLANKS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*){2,}").expect("valid regex"));

    BLANKS.replace_all(md, "\n\n").into_owned()
}

/// `language-rust` / `lang-rust` / `highlight-rust` fences become `rust`.
fn strip_fence_language_prefix(md: &str) -> String {
    static FENCE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^(\s*```)(?:language-|lang-|highlight-)([\w+-]+)").expect("valid regex")
    });

    FENCE.replace_all(md, "$1$2").into_owned()
}

/// Drop layout tags htmd passes through, leaving their text. Fenced code is untouched.
fn strip_wrapper_tags(md: &str) -> String {
    static WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"</?(?:div|span|section|article|header|footer|aside|figure|figcaption|details|summary)(?:\s[^>]*)?>",
        )
        .expect("valid regex")
    });

    outside_fences(md, |line| WRAPPER.replace_all(line, "").into_owned())
}

/// Rewrite relative `[text](href)` targets to absolute URLs. Images,
/// in-page anchors and fenced code are left alone.
fn absolutize_links(md: &str, base: &Url) -> String {
    static LINK: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    outside_fences(md, |line| {
        LINK.replace_all(line, |caps: &Captures| {
            let (bang, text, href) = (&caps[1], &caps[2], &caps[3]);
            if !bang.is_empty() || href.starts_with('#') || Url::parse(href).is_ok() {
                return caps[0].to_string();
            }
            match base.join(href) {
                Ok(resolved) => format!("[{text}]({resolved})"),
                Err(_) => caps[0].to_string(),
            }
        })
        .into_owned()
    })
}

/// Apply `rewrite` to every line that is not inside a fenced code block.
fn outside_fences(md: &str, rewrite: impl Fn(&str) -> String) -> String {
    let mut in_fence = false;
    md.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence {
                line.to_string()
            } else {
                rewrite(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trim trailing whitespace per line; end with exactly one newline.
fn finish(md: &str) -> String {
    let body = md
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let body = body.trim_matches('\n');
    if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    }
}
