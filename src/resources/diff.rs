//! Unified diffs of prospective changes.
use similar::TextDiff;

/// Unified line diff from `old` to `new`, labelled with the given headers.
///
/// Bytes are decoded lossily so binary content still produces a (noisy but
/// harmless) diff instead of an error.  Returns an empty string when the
/// inputs are equal.
#[must_use]
pub fn unified(old: &[u8], new: &[u8], old_label: &str, new_label: &str) -> String {
    let old = String::from_utf8_lossy(old);
    let new = String::from_utf8_lossy(new);
    TextDiff::from_lines(&*old, &*new)
        .unified_diff()
        .context_radius(3)
        .header(old_label, new_label)
        .to_string()
}
