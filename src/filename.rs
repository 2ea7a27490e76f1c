//! Stored filename generation.
//!
//! Uploaded files are never stored under their client-supplied name. Each
//! upload gets `<slug>-<5 random chars>.<ext>`, where the slug comes from the
//! original name with its extension stripped. The fresh random suffix per
//! physical upload is what makes replacement safe: a new upload never reuses
//! the filename it replaces.

use rand::Rng;

const SUFFIX_LEN: usize = 5;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Build a collision-resistant stored filename from an upload's original name
/// and extension. Pure; call once per physical upload.
///
/// The extension is taken verbatim from the upload, not re-derived from
/// content.
pub fn generate(original_name: &str, extension: &str) -> String {
    let base = strip_extension(original_name);
    format!("{}-{}.{extension}", slugify(base), random_suffix())
}

/// Strip the trailing `.<ext>` from a name, greedily from the first dot to
/// the end (`archive.tar.gz` -> `archive`).
fn strip_extension(name: &str) -> &str {
    match name.find('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Lowercase and collapse non-alphanumeric runs to a single `-`, trimming
/// leading and trailing separators.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_slug_with_suffix_and_extension() {
        let name = generate("My Photo.PNG", "png");
        assert!(name.starts_with("my-photo-"));
        assert!(name.ends_with(".png"));
        let suffix = &name["my-photo-".len()..name.len() - ".png".len()];
        assert_eq!(suffix.len(), 5);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn strips_multi_dot_extensions_greedily() {
        assert_eq!(strip_extension("archive.tar.gz"), "archive");
        assert_eq!(strip_extension("photo.jpeg"), "photo");
        assert_eq!(strip_extension("no-extension"), "no-extension");
    }

    #[test]
    fn slugify_collapses_separator_runs() {
        assert_eq!(slugify("My   Summer -- Photo"), "my-summer-photo");
        assert_eq!(slugify("  padded  "), "padded");
        assert_eq!(slugify("Ünïcode snap"), "n-code-snap");
    }

    #[test]
    fn successive_calls_differ() {
        // 36^5 suffixes; two consecutive collisions would be astonishing
        assert_ne!(generate("a.png", "png"), generate("a.png", "png"));
    }
}
