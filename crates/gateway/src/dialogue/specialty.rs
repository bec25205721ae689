//! Approximate-match index over the directory's specialty vocabulary.
//!
//! The snapshot is loaded at startup and refreshed by a background task;
//! lookups compare lowercased Sørensen–Dice similarity against a
//! configured threshold, so "cardiologist" still resolves the
//! "Cardiology" entry.

use parking_lot::RwLock;

use diana_providers::Specialty;

pub struct SpecialtyIndex {
    entries: RwLock<Vec<Specialty>>,
    threshold: f64,
}

impl SpecialtyIndex {
    pub fn new(threshold: f64) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            threshold,
        }
    }

    /// Swap in a fresh vocabulary snapshot.
    pub fn replace(&self, entries: Vec<Specialty>) {
        *self.entries.write() = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Resolve free text to the uid of the best-matching specialty, or
    /// `None` when nothing scores strictly above the threshold.
    pub fn resolve(&self, input: &str) -> Option<String> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let entries = self.entries.read();
        let mut best: Option<(f64, &Specialty)> = None;
        for entry in entries.iter() {
            let score = strsim::sorensen_dice(&needle, &entry.name.to_lowercase());
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, entry));
            }
        }

        best.filter(|(score, _)| *score > self.threshold)
            .map(|(_, entry)| entry.uid.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpecialtyIndex {
        let idx = SpecialtyIndex::new(0.3);
        idx.replace(vec![
            Specialty {
                uid: "c1".into(),
                name: "Cardiology".into(),
            },
            Specialty {
                uid: "d1".into(),
                name: "Dermatology".into(),
            },
        ]);
        idx
    }

    #[test]
    fn near_miss_resolves_best_entry() {
        assert_eq!(index().resolve("cardiologist").as_deref(), Some("c1"));
        assert_eq!(index().resolve("Dermatology").as_deref(), Some("d1"));
    }

    #[test]
    fn gibberish_resolves_nothing() {
        assert!(index().resolve("xyz123").is_none());
    }

    #[test]
    fn empty_input_and_empty_index_resolve_nothing() {
        assert!(index().resolve("   ").is_none());
        assert!(SpecialtyIndex::new(0.3).resolve("cardiology").is_none());
    }
}
