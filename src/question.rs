use serde::{Deserialize, Serialize};

/// A single multiple-choice question.
///
/// Two questions are the same question when they share chapter title and
/// text; there is no numeric ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub chapter: String,
    /// Stamped by the catalog so persisted records can be joined back to a
    /// chapter without going through its title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<String>,
}

impl Question {
    pub fn is_correct(&self, answer: Option<usize>) -> bool {
        answer == Some(self.correct_answer)
    }

    pub fn same_identity(&self, other: &Question) -> bool {
        self.chapter == other.chapter && self.question == other.question
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }
}

/// A completed quiz as written to the history ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub questions: Vec<Question>,
    pub user_answers: Vec<Option<usize>>,
    #[serde(default)]
    pub user_confidence_ratings: Vec<u8>,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Seconds
    pub time_spent: u64,
    pub correct_count: usize,
}

impl QuizResult {
    /// Score `answers` against `questions` positionally
    pub fn score(questions: &[Question], answers: &[Option<usize>]) -> usize {
        questions
            .iter()
            .zip(answers)
            .filter(|(q, a)| q.is_correct(**a))
            .count()
    }

    pub fn accuracy(&self) -> f64 {
        crate::util::percent(self.correct_count as u64, self.questions.len() as u64)
            .unwrap_or(0.0)
    }

    /// Positions answered wrongly or left unanswered
    pub fn mistakes(&self) -> impl Iterator<Item = (&Question, Option<usize>)> {
        self.questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q, self.user_answers.get(i).copied().flatten()))
            .filter(|(q, a)| !q.is_correct(*a))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::question;
    use super::*;

    #[test]
    fn deserializes_camel_case_without_optional_fields() {
        let raw = r#"{"question":"q?","options":["a","b","c","d"],"correctAnswer":2}"#;
        let q: Question = serde_json::from_str(raw).unwrap();
        assert_eq!(q.correct_answer, 2);
        assert_eq!(q.explanation, "");
        assert_eq!(q.chapter, "");
        assert_eq!(q.chapter_id, None);
    }

    #[test]
    fn serializes_camel_case() {
        let q = question("Enums", "q?", 1);
        let v = serde_json::to_value(&q).unwrap();
        assert_eq!(v["correctAnswer"], 1);
        assert!(v.get("chapterId").is_none());
    }

    #[test]
    fn identity_ignores_options_and_answer() {
        let a = question("Enums", "q?", 1);
        let mut b = question("Enums", "q?", 3);
        b.options.reverse();
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&question("Traits", "q?", 1)));
    }

    #[test]
    fn unanswered_is_never_correct() {
        let q = question("Enums", "q?", 0);
        assert!(!q.is_correct(None));
        assert!(q.is_correct(Some(0)));
        assert_eq!(q.correct_option(), Some("a"));
    }

    #[test]
    fn mistakes_include_unanswered() {
        let questions = vec![
            question("A", "1", 0),
            question("A", "2", 1),
            question("A", "3", 2),
        ];
        let answers = vec![Some(0), None, Some(0)];
        let result = QuizResult {
            correct_count: QuizResult::score(&questions, &answers),
            questions,
            user_answers: answers,
            user_confidence_ratings: vec![],
            timestamp: 0,
            time_spent: 0,
        };

        assert_eq!(result.correct_count, 1);
        let missed: Vec<_> = result.mistakes().map(|(q, a)| (q.question.clone(), a)).collect();
        assert_eq!(missed, vec![("2".to_string(), None), ("3".to_string(), Some(0))]);
    }
}
