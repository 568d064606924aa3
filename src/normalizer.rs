use crate::model::Vacancy;
use crate::utils::{canonical_url, clean_text};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DedupKey {
    Url(String),
    Fingerprint(String),
}

/// Trims text fields and rewrites the link into its canonical form when it is well-formed.
pub fn normalize_vacancy(mut vacancy: Vacancy) -> Vacancy {
    vacancy.title = clean_text(&vacancy.title);
    vacancy.location = clean_text(&vacancy.location);
    vacancy.company = clean_text(&vacancy.company);
    vacancy.broker = vacancy.broker.trim().to_string();
    vacancy.description = vacancy.description.trim().to_string();
    vacancy.url = match canonical_url(&vacancy.url) {
        Some(url) => url,
        None => vacancy.url.trim().to_string(),
    };
    vacancy
}

fn dedup_key(vacancy: &Vacancy) -> DedupKey {
    match canonical_url(&vacancy.url) {
        Some(url) => DedupKey::Url(url),
        None => DedupKey::Fingerprint(format!(
            "{}|{}",
            vacancy.title.to_lowercase(),
            vacancy.broker.to_lowercase()
        )),
    }
}

/// True when `candidate` should replace `current` in a collision.
fn is_preferred(candidate: &Vacancy, current: &Vacancy) -> bool {
    match candidate.skills.len().cmp(&current.skills.len()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => !candidate.location.is_empty() && current.location.is_empty(),
    }
}

/// Collapses postings that share a canonical URL, or failing that a title + broker
/// fingerprint. First-seen order is kept; `merge(merge(x)) == merge(x)`.
pub fn merge(vacancies: Vec<Vacancy>) -> Vec<Vacancy> {
    let mut merged: Vec<Vacancy> = Vec::with_capacity(vacancies.len());
    let mut index: HashMap<DedupKey, usize> = HashMap::new();

    for vacancy in vacancies.into_iter().map(normalize_vacancy) {
        if !vacancy.is_emittable() {
            continue;
        }
        match index.entry(dedup_key(&vacancy)) {
            Entry::Occupied(slot) => {
                let current = &mut merged[*slot.get()];
                if is_preferred(&vacancy, current) {
                    *current = vacancy;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(vacancy);
            }
        }
    }

    merged
}
