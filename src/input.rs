//! Address list loading.
//!
//! The format is one `label,address` per line. Only the first comma
//! separates, so addresses may contain commas of their own.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::PlannerError;
use crate::planner::AddressEntry;

pub fn parse_addresses(text: &str) -> Vec<AddressEntry> {
    text.lines()
        .filter_map(|line| {
            let (label, address) = line.trim().split_once(',')?;
            let address = address.trim();
            if address.is_empty() {
                return None;
            }
            Some(AddressEntry::new(label.trim(), address))
        })
        .collect()
}

pub fn load_addresses(path: &Path) -> Result<Vec<AddressEntry>, PlannerError> {
    let text = fs::read_to_string(path).map_err(|source| PlannerError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_addresses(&text);
    debug!(path = %path.display(), entries = entries.len(), "loaded addresses");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_comma_only() {
        let entries = parse_addresses("Warehouse, 12 Rizal St, Makati City\nStop1,5 Ayala Ave\n");
        assert_eq!(
            entries,
            vec![
                AddressEntry::new("Warehouse", "12 Rizal St, Makati City"),
                AddressEntry::new("Stop1", "5 Ayala Ave"),
            ]
        );
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        let entries = parse_addresses("\nno comma here\nStop2,   \n  Stop3 , 9 Roxas Blvd  \n");
        assert_eq!(entries, vec![AddressEntry::new("Stop3", "9 Roxas Blvd")]);
    }

    #[test]
    fn missing_file_is_input_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_addresses(&dir.path().join("addresses.csv")).expect_err("missing");
        assert!(matches!(err, PlannerError::Input { .. }));
    }

    #[test]
    fn reads_file_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("addresses.csv");
        fs::write(&path, "Warehouse,1 Depot Rd\nStop1,2 Main St\n").expect("write");
        assert_eq!(load_addresses(&path).expect("loads").len(), 2);
    }
}
