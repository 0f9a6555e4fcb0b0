use std::collections::{HashMap, HashSet};

use crate::fingerprint::fingerprint;
use crate::model::word::{Side, WordPair};

const DEFAULT_TEMPLATE: &str = "What is \"\"";

//
// ─── LESSON ───────────────────────────────────────────────────────────────────
//

/// An immutable catalog of question/answer pairs parsed from one lesson
/// source.
///
/// A lesson is created once by [`Lesson::parse`] and shared read-only by any
/// number of drill sessions. Besides the ordered word list it carries a
/// derived answer-to-question map used for confusable-answer hints and a
/// content fingerprint used to detect that the source changed since a
/// session snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    path: String,
    words: Vec<WordPair>,
    answer_map: HashMap<String, String>,
    ask_both_ways: bool,
    encoding: String,
    fingerprint: String,
}

impl Lesson {
    /// Parse a lesson from its raw source text.
    ///
    /// The format is line oriented:
    ///
    /// - blank and whitespace-only lines are ignored;
    /// - lines starting with `#` are `#key=value` directives; recognized
    ///   keys are `question1`, `question2` (question templates per side),
    ///   `askbothways` (0/1) and `encoding` (informational only);
    /// - every other line is a data line of the form `question, answer`,
    ///   split on the first occurrence of the two-character separator `", "`.
    ///
    /// Malformed data lines and duplicate questions or answers are skipped
    /// with a developer-facing warning; the first occurrence wins. Parsing
    /// itself never fails.
    #[must_use]
    pub fn parse(path: impl Into<String>, text: &str) -> Self {
        LessonParser::default().parse(path.into(), text)
    }

    /// All word pairs in catalog order.
    #[must_use]
    pub fn words(&self) -> &[WordPair] {
        &self.words
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The question that expects the given answer, if any.
    ///
    /// When several pairs share an answer the most recently parsed one wins.
    #[must_use]
    pub fn question_for_answer(&self, answer: &str) -> Option<&str> {
        self.answer_map.get(answer).map(String::as_str)
    }

    /// Content fingerprint of the source this lesson was parsed from.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    #[must_use]
    pub fn ask_both_ways(&self) -> bool {
        self.ask_both_ways
    }

    /// Declared source encoding. Informational only.
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

//
// ─── PARSER ───────────────────────────────────────────────────────────────────
//

/// Accumulates directives and de-duplicated raw pairs before materializing
/// the catalog, so a template directive applies no matter where it appears
/// in the file.
struct LessonParser {
    question1: String,
    question2: String,
    ask_both_ways: bool,
    encoding: String,
    questions: HashSet<String>,
    answers: HashSet<String>,
    pairs: Vec<(String, String)>,
}

impl Default for LessonParser {
    fn default() -> Self {
        Self {
            question1: DEFAULT_TEMPLATE.to_owned(),
            question2: DEFAULT_TEMPLATE.to_owned(),
            ask_both_ways: true,
            encoding: "UTF-8".to_owned(),
            questions: HashSet::new(),
            answers: HashSet::new(),
            pairs: Vec::new(),
        }
    }
}

impl LessonParser {
    fn parse(mut self, path: String, text: &str) -> Lesson {
        for (idx, line) in text.lines().enumerate() {
            self.process_line(line, idx + 1);
        }

        let mut words = Vec::with_capacity(self.pairs.len() * 2);
        let mut answer_map = HashMap::new();

        for (line_number, (question, answer)) in self.pairs.iter().enumerate() {
            let line_number = line_number as u32;
            words.push(WordPair::new(
                question.clone(),
                answer.clone(),
                Side::Forward,
                line_number,
                self.question2.clone(),
            ));
            answer_map.insert(answer.clone(), question.clone());

            if self.ask_both_ways {
                words.push(WordPair::new(
                    answer.clone(),
                    question.clone(),
                    Side::Reverse,
                    line_number,
                    self.question1.clone(),
                ));
                answer_map.insert(question.clone(), answer.clone());
            }
        }

        Lesson {
            path,
            words,
            answer_map,
            ask_both_ways: self.ask_both_ways,
            encoding: self.encoding,
            fingerprint: fingerprint(text),
        }
    }

    fn process_line(&mut self, line: &str, line_no: usize) {
        if line.trim().is_empty() {
            return;
        }

        if let Some(rest) = line.strip_prefix('#') {
            if let Some((key, value)) = rest.split_once('=') {
                self.process_directive(key.trim(), value.trim());
            }
            return;
        }

        let Some((question, answer)) = line.split_once(", ") else {
            log::warn!("syntax error at line {line_no}: no \", \" separator");
            return;
        };
        let question = question.trim();
        let answer = answer.trim();

        if self.questions.contains(question) {
            log::warn!("duplicate question {question:?} at line {line_no}");
            return;
        }
        if self.answers.contains(answer) {
            log::warn!("duplicate answer {answer:?} at line {line_no}");
            return;
        }

        self.questions.insert(question.to_owned());
        self.answers.insert(answer.to_owned());
        self.pairs.push((question.to_owned(), answer.to_owned()));
    }

    fn process_directive(&mut self, key: &str, value: &str) {
        match key.to_lowercase().as_str() {
            "question1" => self.question1 = value.to_owned(),
            "question2" => self.question2 = value.to_owned(),
            "askbothways" => self.ask_both_ways = value.parse::<i32>().unwrap_or(1) != 0,
            "encoding" => self.encoding = value.to_owned(),
            _ => {}
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
