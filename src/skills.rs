// Skill vocabulary and keyword extraction
use crate::model::Vacancy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_SKILLS: &[&str] = &[
    "Java", "JavaScript", "TypeScript", "Kotlin", "Scala", "Python", "PHP", "Ruby", "Swift",
    "C#", "C++", ".NET", "ASP.NET", "SQL", "PostgreSQL", "Oracle", "MongoDB", "Spring", "Spring Boot",
    "Hibernate", "Maven", "Gradle", "Angular", "React", "Vue", "Node.js", "HTML", "CSS",
    "Docker", "Kubernetes", "Kafka", "AWS", "Azure", "Terraform", "Linux", "Git", "Jenkins",
    "REST", "Microservices", "Scrum", "Agile",
];

// Characters that continue a word. `+` and `#` are included so that `C` stays out of `C++`.
// `.` is not, so `.NET` never matches inside `ASP.NET`; that framework is its own entry.
const WORD_CHARS: &str = r"\p{L}\p{N}_+#";

struct SkillPattern {
    name: String,
    pattern: Regex,
}

/// Read-only, shareable across source tasks.
pub struct SkillVocabulary {
    entries: Vec<SkillPattern>,
}

impl SkillVocabulary {
    /// Entries are deduplicated case-insensitively; the first spelling wins.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let entries = names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref().trim();
                if name.is_empty() || !seen.insert(name.to_lowercase()) {
                    return None;
                }
                let pattern = Regex::new(&whole_word_pattern(name)).ok()?;
                Some(SkillPattern {
                    name: name.to_string(),
                    pattern,
                })
            })
            .collect();

        Self { entries }
    }

    pub fn from_config(skills: &[String]) -> Self {
        if skills.is_empty() {
            Self::default()
        } else {
            Self::new(skills)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|entry| entry.pattern.is_match(text))
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Replaces the vacancy's skills with the entries found in its title and description.
    pub fn enrich(&self, mut vacancy: Vacancy) -> Vacancy {
        let text = format!("{}\n{}", vacancy.title, vacancy.description);
        vacancy.skills = self.extract(&text);
        vacancy
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_SKILLS)
    }
}

fn whole_word_pattern(name: &str) -> String {
    let body = name
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    format!(r"(?i)(?:^|[^{w}]){body}(?:$|[^{w}])", w = WORD_CHARS)
}
