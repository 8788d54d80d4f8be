//! Shared fixtures for integration tests

use std::io::Write;

use tempfile::NamedTempFile;

pub const DATASET_JSON: &str = r#"{
    "properties": [
        {"property_id": 1, "property_name": "Harbor Loft", "reviews_count": 1, "average_review_score": 4.8},
        {"property_id": 2, "property_name": "Pine Cabin", "reviews_count": 0, "average_review_score": 0.0}
    ],
    "reservations": [
        {"reservation_id": 1, "property_id": 1, "property_name": "Harbor Loft", "guest_name": "Ann",
         "reservation_date": "2024-01-01", "check_in": "2024-01-10", "check_out": "2024-01-12",
         "reservation_revenue": 300.0},
        {"reservation_id": 2, "property_id": 2, "property_name": "Pine Cabin", "guest_name": "Bo",
         "reservation_date": "2024-01-05", "check_in": "2024-01-20", "check_out": "2024-01-25",
         "reservation_revenue": 750.0}
    ],
    "reviews": [
        {"review_id": 1, "property_id": 1, "property_name": "Harbor Loft", "review_date": "2024-01-13", "rating": 4.8}
    ],
    "maintenance_blocks": [
        {"maintenance_id": 1, "property_id": 2, "property_name": "Pine Cabin",
         "start_date": "2024-02-01", "end_date": "2024-02-04", "blocked_days": 4}
    ]
}"#;

/// Writes the sample dataset to a temporary file.
pub fn dataset_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(DATASET_JSON.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
