//! Dataset loading
//!
//! Reads the backing JSON file and validates every record.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{CacheError, Result};
use crate::models::Dataset;

const REQUIRED_KEYS: [&str; 4] = ["properties", "reservations", "reviews", "maintenance_blocks"];

/// Loads and validates the dataset at `path`.
///
/// Read and JSON syntax failures are [`CacheError::DataLoad`]; missing
/// sections, malformed dates and out-of-range values are
/// [`CacheError::DataValidation`].
pub fn load_and_validate(path: &Path) -> Result<Dataset> {
    info!(path = %path.display(), "Loading data");

    let contents = fs::read_to_string(path)
        .map_err(|e| CacheError::DataLoad(format!("Error reading file {}: {}", path.display(), e)))?;
    let raw: Value = serde_json::from_str(&contents).map_err(|e| {
        CacheError::DataLoad(format!("Invalid JSON format in {}: {}", path.display(), e))
    })?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| raw.get(key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(CacheError::DataValidation(format!(
            "Missing required keys: {}",
            missing.join(", ")
        )));
    }

    let dataset: Dataset =
        serde_json::from_value(raw).map_err(|e| CacheError::DataValidation(e.to_string()))?;
    validate(&dataset)?;

    info!(
        properties = dataset.properties.len(),
        reservations = dataset.reservations.len(),
        reviews = dataset.reviews.len(),
        maintenance_blocks = dataset.maintenance_blocks.len(),
        "Data validation successful"
    );
    Ok(dataset)
}

fn validate(dataset: &Dataset) -> Result<()> {
    let mut errors = Vec::new();

    for (i, p) in dataset.properties.iter().enumerate() {
        if p.property_id <= 0 {
            errors.push(format!("properties -> {}: property_id must be positive", i));
        }
        if p.reviews_count < 0 {
            errors.push(format!("properties -> {}: reviews_count must be non-negative", i));
        }
        if !(0.0..=5.0).contains(&p.average_review_score) {
            errors.push(format!(
                "properties -> {}: average_review_score must be between 0 and 5",
                i
            ));
        }
    }

    for (i, r) in dataset.reservations.iter().enumerate() {
        if r.reservation_id <= 0 || r.property_id <= 0 {
            errors.push(format!("reservations -> {}: ids must be positive", i));
        }
        if r.reservation_revenue < 0.0 {
            errors.push(format!(
                "reservations -> {}: reservation_revenue must be non-negative",
                i
            ));
        }
    }

    for (i, r) in dataset.reviews.iter().enumerate() {
        if r.review_id <= 0 || r.property_id <= 0 {
            errors.push(format!("reviews -> {}: ids must be positive", i));
        }
        if !(0.0..=5.0).contains(&r.rating) {
            errors.push(format!("reviews -> {}: rating must be between 0 and 5", i));
        }
    }

    for (i, m) in dataset.maintenance_blocks.iter().enumerate() {
        if m.maintenance_id <= 0 || m.property_id <= 0 {
            errors.push(format!("maintenance_blocks -> {}: ids must be positive", i));
        }
        if m.blocked_days <= 0 {
            errors.push(format!(
                "maintenance_blocks -> {}: blocked_days must be positive",
                i
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CacheError::DataValidation(errors.join("\n")))
    }
}

// == Summary ==
/// Headline counts of a loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub properties: usize,
    pub reservations: usize,
    pub reviews: usize,
    pub maintenance_blocks: usize,
    pub total_revenue: f64,
    pub average_rating: f64,
    pub total_blocked_days: i64,
}

impl DatasetSummary {
    pub fn of(dataset: &Dataset) -> Self {
        let average_rating = if dataset.reviews.is_empty() {
            0.0
        } else {
            dataset.reviews.iter().map(|r| r.rating).sum::<f64>() / dataset.reviews.len() as f64
        };

        Self {
            properties: dataset.properties.len(),
            reservations: dataset.reservations.len(),
            reviews: dataset.reviews.len(),
            maintenance_blocks: dataset.maintenance_blocks.len(),
            total_revenue: dataset.reservations.iter().map(|r| r.reservation_revenue).sum(),
            average_rating,
            total_blocked_days: dataset.maintenance_blocks.iter().map(|m| m.blocked_days).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"{
        "properties": [
            {"property_id": 1, "property_name": "Loft", "reviews_count": 2, "average_review_score": 4.5}
        ],
        "reservations": [
            {"reservation_id": 1, "property_id": 1, "property_name": "Loft", "guest_name": "Ann",
             "reservation_date": "2024-01-01", "check_in": "2024-01-10", "check_out": "2024-01-12",
             "reservation_revenue": 200.0}
        ],
        "reviews": [
            {"review_id": 1, "property_id": 1, "property_name": "Loft", "review_date": "2024-01-13", "rating": 4.0}
        ],
        "maintenance_blocks": [
            {"maintenance_id": 1, "property_id": 1, "property_name": "Loft",
             "start_date": "2024-02-01", "end_date": "2024-02-03", "blocked_days": 3}
        ]
    }"#;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_dataset() {
        let file = write_file(VALID);
        let dataset = load_and_validate(file.path()).unwrap();

        let summary = DatasetSummary::of(&dataset);
        assert_eq!(summary.properties, 1);
        assert_eq!(summary.reservations, 1);
        assert_eq!(summary.total_revenue, 200.0);
        assert_eq!(summary.average_rating, 4.0);
        assert_eq!(summary.total_blocked_days, 3);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = load_and_validate(Path::new("/nonexistent/data.json"));
        assert!(matches!(result, Err(CacheError::DataLoad(_))));
    }

    #[test]
    fn test_invalid_json_is_load_error() {
        let file = write_file("{ not json");
        assert!(matches!(
            load_and_validate(file.path()),
            Err(CacheError::DataLoad(_))
        ));
    }

    #[test]
    fn test_missing_section_is_validation_error() {
        let file = write_file(r#"{"properties": [], "reservations": []}"#);
        match load_and_validate(file.path()) {
            Err(CacheError::DataValidation(msg)) => {
                assert!(msg.contains("reviews"));
                assert!(msg.contains("maintenance_blocks"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_is_validation_error() {
        let file = write_file(&VALID.replace("2024-01-13", "13/01/2024"));
        assert!(matches!(
            load_and_validate(file.path()),
            Err(CacheError::DataValidation(_))
        ));
    }

    #[test]
    fn test_out_of_range_rating_is_validation_error() {
        let file = write_file(&VALID.replace("\"rating\": 4.0", "\"rating\": 7.5"));
        match load_and_validate(file.path()) {
            Err(CacheError::DataValidation(msg)) => assert!(msg.contains("rating")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
