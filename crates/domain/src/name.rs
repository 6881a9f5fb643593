use derive_more::{AsRef, Display};

#[derive(AsRef, Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    pub fn new(name: &str) -> Result<Self, NameError> {
        let trimmed_name = name.trim();

        if trimmed_name.is_empty() {
            return Err(NameError::Empty);
        }

        let len = trimmed_name.len();

        if len > 64 {
            return Err(NameError::TooLong(len));
        }

        Ok(Name(trimmed_name.to_string()))
    }

    /// Lowercased with every run of whitespace collapsed into a single space.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn matches(&self, other: &Name) -> bool {
        self.normalized() == other.normalized()
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum NameError {
    #[error("Name must not be empty")]
    Empty,
    #[error("Name must be 64 characters or fewer ({0} > 64)")]
    TooLong(usize),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Bench Press", Ok(Name("Bench Press".to_string())))]
    #[case("  Squat  ", Ok(Name("Squat".to_string())))]
    #[case("", Err(NameError::Empty))]
    #[case("   ", Err(NameError::Empty))]
    #[case(
        "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        Err(NameError::TooLong(65))
    )]
    fn test_name_new(#[case] name: &str, #[case] expected: Result<Name, NameError>) {
        assert_eq!(Name::new(name), expected);
    }

    #[rstest]
    #[case("Bench Press", "bench press")]
    #[case("Incline   DB\tPress", "incline db press")]
    #[case("ROW", "row")]
    fn test_name_normalized(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(Name::new(name).unwrap().normalized(), expected);
    }

    #[test]
    fn test_name_matches() {
        assert!(
            Name::new("Push Day")
                .unwrap()
                .matches(&Name::new("push  day").unwrap())
        );
        assert!(
            !Name::new("Push Day")
                .unwrap()
                .matches(&Name::new("Pull Day").unwrap())
        );
    }
}
