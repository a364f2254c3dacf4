/// Consonantal `u`/`v` and `i`/`j` spelling to force on output lemmata.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Consonants {
    /// `u` becomes `v`, `j` becomes `i`.
    Vi,
    /// `v` becomes `u`, `j` becomes `i`.
    Ui,
}

/// Display rewrites for lemmata written to output cells.
///
/// Applied in a fixed order: case, trailing digits, punctuation, consonants.
/// The index never sees styled lemmata.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LemmaStyle {
    pub lowercase: bool,
    pub uppercase: bool,
    pub no_trailing_digits: bool,
    pub no_punctuation: bool,
    pub consonants: Option<Consonants>,
}

impl LemmaStyle {
    pub fn apply(&self, lemma: &str) -> String {
        let mut out = if self.lowercase {
            lemma.to_lowercase()
        } else {
            lemma.to_string()
        };
        if self.uppercase {
            out = out.to_uppercase();
        }
        if self.no_trailing_digits {
            let kept = out.trim_end_matches(|c: char| c.is_ascii_digit()).len();
            out.truncate(kept);
        }
        if self.no_punctuation {
            out.retain(char::is_alphabetic);
        }
        if let Some(consonants) = self.consonants {
            out = out
                .chars()
                .map(|c| match (consonants, c) {
                    (Consonants::Vi, 'u') => 'v',
                    (Consonants::Vi, 'U') => 'V',
                    (Consonants::Ui, 'v') => 'u',
                    (Consonants::Ui, 'V') => 'U',
                    (_, 'j') => 'i',
                    (_, 'J') => 'I',
                    (_, other) => other,
                })
                .collect();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_style_is_identity() {
        let style = LemmaStyle::default();
        assert_eq!(style.apply("Iuppiter1"), "Iuppiter1");
    }

    #[test]
    fn strips_homograph_digits_and_punctuation() {
        let style = LemmaStyle {
            no_trailing_digits: true,
            ..LemmaStyle::default()
        };
        assert_eq!(style.apply("edo2"), "edo");
        assert_eq!(style.apply("res publica"), "res publica");

        let style = LemmaStyle {
            no_punctuation: true,
            ..LemmaStyle::default()
        };
        assert_eq!(style.apply("res-publica#1"), "respublica");
    }

    #[test]
    fn case_and_consonants() {
        let style = LemmaStyle {
            uppercase: true,
            consonants: Some(Consonants::Ui),
            ..LemmaStyle::default()
        };
        assert_eq!(style.apply("Jovis"), "IOUIS");

        let style = LemmaStyle {
            lowercase: true,
            consonants: Some(Consonants::Vi),
            ..LemmaStyle::default()
        };
        assert_eq!(style.apply("Juuenis"), "ivvenis");
    }
}
