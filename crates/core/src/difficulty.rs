use std::ops::RangeInclusive;
use types::TimeSlot;

/// Built-in keywords for demanding subjects, matched case-insensitively as substrings.
pub const DEFAULT_HARD_SUBJECTS: &[&str] = &[
    "математика",
    "русский",
    "физика",
    "химия",
    "английский",
    "алгебра",
    "геометрия",
];

/// Lesson numbers where hard subjects belong.
pub const PRIME_LESSONS: RangeInclusive<u8> = 2..=4;

pub fn is_prime_time(slot: TimeSlot) -> bool {
    PRIME_LESSONS.contains(&slot.lesson)
}

/// Decides whether a subject is cognitively demanding.
pub trait Difficulty: Send + Sync {
    fn is_hard(&self, subject: &str) -> bool;
}

impl<F> Difficulty for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_hard(&self, subject: &str) -> bool {
        self(subject)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HardSubjects {
    keywords: Vec<String>,
}

impl HardSubjects {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for HardSubjects {
    fn default() -> Self {
        Self::new(DEFAULT_HARD_SUBJECTS)
    }
}

impl Difficulty for HardSubjects {
    fn is_hard(&self, subject: &str) -> bool {
        let name = subject.to_lowercase();
        self.keywords.iter().any(|k| name.contains(k.as_str()))
    }
}
