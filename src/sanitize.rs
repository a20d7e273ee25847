//! Cleaning of stored custom CSS before it reaches a page.
//!
//! The stored value is untrusted: it is echoed inside a `<style>` block and
//! inside a `<textarea>`. Executable elements are removed together with their
//! content, every other tag is stripped leaving its text, and style constructs
//! that can run code are dropped. Passes repeat until the output is stable, so
//! sanitizing already sanitized text is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Elements removed together with everything they enclose.
const EXECUTABLE_ELEMENTS: &[&str] = &["script", "iframe", "object", "embed", "noscript"];

static EXECUTABLE_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    EXECUTABLE_ELEMENTS
        .iter()
        .map(|element| {
            Regex::new(&format!(r"(?is)<{}\b[^>]*>.*?</{}\s*>", element, element))
                .expect("static pattern")
        })
        .collect()
});

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static pattern"));

/// Style constructs able to run script or pull remote code.
static DANGEROUS_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)javascript\s*:|vbscript\s*:|expression\s*\(|-moz-binding|behavior\s*:|@import")
        .expect("static pattern")
});

/// Returns CSS that is safe to embed in a style block.
pub fn sanitize_css(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    if current != raw {
        warn!(removed = raw.len() - current.len(), "stripped markup from custom css");
    }
    current
}

fn sanitize_pass(input: &str) -> String {
    let mut result = input.to_string();
    for block in EXECUTABLE_BLOCKS.iter() {
        result = block.replace_all(&result, "").to_string();
    }
    result = ANY_TAG.replace_all(&result, "").to_string();
    DANGEROUS_STYLE.replace_all(&result, "").to_string()
}
