/// Outcome of checking a post against the platform limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Within { text: String, length: usize },
    Exceeded { length: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct LengthGate {
    max_len: usize,
}

impl LengthGate {
    pub fn new(max_len: usize) -> Self {
        LengthGate { max_len }
    }

    /// Appends the hashtag line and measures the result in characters.
    /// Never truncates: the text goes out whole or not at all.
    pub fn check(&self, message: &str, hashtags: &str) -> Verdict {
        let text = format!("{}\n{}", message, hashtags);
        let length = text.chars().count();
        if length > self.max_len {
            Verdict::Exceeded { length }
        } else {
            Verdict::Within { text, length }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(len: usize, hashtags: &str) -> String {
        "x".repeat(len - hashtags.chars().count() - 1)
    }

    #[test]
    fn allows_exactly_max() {
        let gate = LengthGate::new(280);
        let message = body_of(280, "#Python");
        match gate.check(&message, "#Python") {
            Verdict::Within { text, length } => {
                assert_eq!(length, 280);
                assert!(text.ends_with("\n#Python"));
            }
            other => panic!("expected Within, got {:?}", other),
        }
    }

    #[test]
    fn blocks_one_over_max() {
        let gate = LengthGate::new(280);
        let message = body_of(281, "#Python");
        assert_eq!(gate.check(&message, "#Python"), Verdict::Exceeded { length: 281 });
    }

    #[test]
    fn counts_characters_not_bytes() {
        let gate = LengthGate::new(10);
        // 8 checkmarks are 24 bytes but 8 characters.
        let message = "✅".repeat(8);
        assert!(matches!(gate.check(&message, "#"), Verdict::Within { length: 10, .. }));
    }
}
