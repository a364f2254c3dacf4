use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Folding applied to surface forms before they are used as lookup keys.
///
/// Case and diacritics (macrons, breves, diaereses, accents) are always
/// folded. `fold_jv` additionally maps `j` to `i` and `v` to `u`, so that
/// editions using consonantal `j`/`v` match datasets that do not.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Normalization {
    pub fold_jv: bool,
}

impl Default for Normalization {
    fn default() -> Self {
        Self { fold_jv: true }
    }
}

/// Fold `text` into its lookup key.
///
/// Empty or all-whitespace input yields an empty string.
pub fn normalize_form(text: &str, normalization: &Normalization) -> String {
    let stripped: String = text
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'j' if normalization.fold_jv => 'i',
            'v' if normalization.fold_jv => 'u',
            other => other,
        })
        .collect();
    stripped.nfc().collect()
}
