use crate::core::duplicate::DuplicatePair;
use crate::core::store::ErrorRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

/// Everything a scan produces, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub root: String,
    pub threshold: i64,
    pub images_found: usize,
    pub fingerprinted: usize,
    pub duplicates: Vec<DuplicatePair>,
    pub errors: Vec<ErrorRecord>,
}

impl Report {
    pub fn new(
        root: impl Into<String>,
        threshold: i64,
        images_found: usize,
        fingerprinted: usize,
        duplicates: Vec<DuplicatePair>,
        errors: Vec<ErrorRecord>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            root: root.into(),
            threshold,
            images_found,
            fingerprinted,
            duplicates,
            errors,
        }
    }

    /// Closest pairs first; equal distances keep encounter order.
    pub fn sort_by_distance(&mut self) {
        self.duplicates.sort_by_key(|p| p.distance);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();

        if self.duplicates.is_empty() {
            out.push_str("No duplicates found.\n");
        } else {
            let _ = writeln!(out, "Found {} duplicate pair(s):\n", self.duplicates.len());
            for pair in &self.duplicates {
                let marker = if pair.is_exact() { " [identical]" } else { "" };
                let _ = writeln!(
                    out,
                    "  {} ≈ {} (distance: {}){}",
                    pair.first, pair.second, pair.distance, marker
                );
            }
        }

        if !self.errors.is_empty() {
            let _ = writeln!(out, "\n⚠️  {} image(s) could not be processed:", self.errors.len());
            for record in &self.errors {
                let _ = writeln!(out, "  {}: {}", record.identifier, record.reason);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str, d: u32) -> DuplicatePair {
        DuplicatePair::new(a, b, d).unwrap()
    }

    #[test]
    fn test_render_empty() {
        let report = Report::new(".", 5, 0, 0, vec![], vec![]);
        assert_eq!(report.render_text(), "No duplicates found.\n");
    }

    #[test]
    fn test_render_pairs_and_errors() {
        let report = Report::new(
            ".",
            5,
            3,
            2,
            vec![pair("a.jpg", "b.jpg", 0), pair("a.jpg", "c.jpg", 4)],
            vec![ErrorRecord {
                identifier: "bad.jpg".into(),
                reason: "Image decoding error: truncated".into(),
            }],
        );

        let text = report.render_text();
        assert!(text.starts_with("Found 2 duplicate pair(s):"));
        assert!(text.contains("a.jpg ≈ b.jpg (distance: 0) [identical]"));
        assert!(text.contains("a.jpg ≈ c.jpg (distance: 4)\n"));
        assert!(text.contains("bad.jpg: Image decoding error: truncated"));
    }

    #[test]
    fn test_sort_by_distance_is_stable() {
        let mut report = Report::new(
            ".",
            5,
            4,
            4,
            vec![pair("c", "d", 3), pair("a", "b", 1), pair("b", "c", 3), pair("a", "d", 0)],
            vec![],
        );
        report.sort_by_distance();

        let order: Vec<(&str, u32)> = report
            .duplicates
            .iter()
            .map(|p| (p.first.as_str(), p.distance))
            .collect();
        assert_eq!(order, vec![("a", 0), ("a", 1), ("c", 3), ("b", 3)]);
    }

    #[test]
    fn test_json_contains_lists() {
        let report = Report::new("photos", 2, 2, 2, vec![pair("x", "y", 1)], vec![]);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["threshold"], 2);
        assert_eq!(value["duplicates"][0]["first"], "x");
        assert_eq!(value["duplicates"][0]["distance"], 1);
        assert!(value["errors"].as_array().unwrap().is_empty());
    }
}
