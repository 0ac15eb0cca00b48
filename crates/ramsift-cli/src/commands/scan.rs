//! Scan command implementation.

use std::path::PathBuf;

use anyhow::{Result, bail};
use ramsift_core::{ComparisonType, FilterStep, SearchFilter, SearchResults};
use tracing::info;

use super::hex_utils::{format_hex_address, format_value};
use super::{ScanRange, apply_step, load_snapshot};
use crate::config::CliConfig;

/// Step applied to a snapshot that has no `--filter` of its own
pub const CHANGED: FilterStep = FilterStep {
    comparison: ComparisonType::NotEqualTo,
    filter: SearchFilter::LastKnownValue,
};

/// Scan the first snapshot, then narrow with each following one.
///
/// `filters[i]` is applied to `snapshots[i + 1]`. Returns the last generation
/// and one progress line per step.
pub fn narrow_snapshots(
    snapshots: &[PathBuf],
    range: ScanRange,
    filters: &[FilterStep],
    config: &CliConfig,
) -> Result<(SearchResults, Vec<String>)> {
    let Some((baseline_path, rest)) = snapshots.split_first() else {
        bail!("No snapshots given");
    };

    let memory = load_snapshot(baseline_path)?;
    let baseline = SearchResults::initialize_with_config(
        &memory,
        range.start,
        range.length(),
        range.size,
        &config.search,
    )?;
    let mut results = baseline.clone();
    let mut progress = vec![results.summary().to_string()];

    for (index, path) in rest.iter().enumerate() {
        let step = filters.get(index).copied().unwrap_or(CHANGED);
        let memory = load_snapshot(path)?;
        results = apply_step(&memory, &baseline, &results, step, &config.search)?;
        progress.push(format!(
            "{} {} candidates left after {}",
            results.summary(),
            results.matching_address_count(),
            path.display()
        ));
    }

    if filters.len() > rest.len() {
        info!(
            "Ignoring {} filters without a snapshot",
            filters.len() - rest.len()
        );
    }

    Ok((results, progress))
}

/// Run the scan command
pub fn run(
    snapshots: &[PathBuf],
    range: ScanRange,
    filters: &[FilterStep],
    limit: Option<usize>,
    json: bool,
    config: &CliConfig,
) -> Result<()> {
    let (results, progress) = narrow_snapshots(snapshots, range, filters, config)?;
    let limit = limit.unwrap_or(config.display.list_limit);

    if json {
        let shown: Vec<_> = results.iter().take(limit).collect();
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    for line in &progress {
        println!("{}", line);
    }
    println!();
    for (index, result) in results.iter().take(limit).enumerate() {
        println!(
            "[{}] {} {:<9} {} ({})",
            index,
            format_hex_address(result.address),
            result.size.label(),
            format_value(result.value, result.size),
            result.value
        );
    }

    let total = results.matching_address_count();
    if total > limit {
        println!("... and {} more", total - limit);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramsift_core::SizeClass;
    use std::fs;
    use tempfile::TempDir;

    fn write_snapshots(dir: &TempDir, snapshots: &[&[u8]]) -> Vec<PathBuf> {
        snapshots
            .iter()
            .enumerate()
            .map(|(i, bytes)| {
                let path = dir.path().join(format!("snap{i}.bin"));
                fs::write(&path, bytes).unwrap();
                path
            })
            .collect()
    }

    fn eight_bit() -> ScanRange {
        ScanRange {
            size: SizeClass::EightBit,
            start: 1,
            length: Some(3),
        }
    }

    #[test]
    fn test_narrow_defaults_to_changed() {
        let dir = TempDir::new().unwrap();
        let paths = write_snapshots(
            &dir,
            &[
                &[0x00, 0x12, 0x34, 0xAB, 0x56],
                &[0x00, 0x14, 0x55, 0xAB, 0x56],
            ],
        );

        let (results, progress) =
            narrow_snapshots(&paths, eight_bit(), &[], &CliConfig::default()).unwrap();
        assert_eq!(progress.len(), 2);
        assert_eq!(
            progress[0],
            "Cleared: (8-bit) mode. Aware of 3 RAM locations."
        );
        let got: Vec<_> = results.iter().map(|r| (r.address, r.value)).collect();
        assert_eq!(got, vec![(1, 0x14), (2, 0x55)]);
    }

    #[test]
    fn test_narrow_with_filters() {
        let dir = TempDir::new().unwrap();
        let paths = write_snapshots(
            &dir,
            &[
                &[0x00, 0x12, 0x34, 0xAB, 0x56],
                &[0x00, 0x12, 0x34, 0xAB, 0x56],
                &[0x00, 0x13, 0x34, 0xAC, 0x56],
            ],
        );
        let filters: Vec<FilterStep> = vec!["=171".parse().unwrap(), "=+1".parse().unwrap()];

        let (results, _) =
            narrow_snapshots(&paths, eight_bit(), &filters, &CliConfig::default()).unwrap();
        let got: Vec<_> = results.iter().map(|r| (r.address, r.value)).collect();
        assert_eq!(got, vec![(3, 0xAC)]);
        assert_eq!(
            results.summary(),
            "Filtering for EQUAL last known value plus 1..."
        );
    }

    #[test]
    fn test_narrow_back_to_initial_value() {
        let dir = TempDir::new().unwrap();
        let paths = write_snapshots(
            &dir,
            &[
                &[0x00, 0x12, 0x34, 0xAB, 0x56],
                &[0x00, 0x13, 0x35, 0xAB, 0x56],
                &[0x00, 0x12, 0x36, 0xAB, 0x56],
            ],
        );
        let filters: Vec<FilterStep> = vec!["!=".parse().unwrap(), "=init".parse().unwrap()];

        let (results, progress) =
            narrow_snapshots(&paths, eight_bit(), &filters, &CliConfig::default()).unwrap();
        let got: Vec<_> = results.iter().map(|r| (r.address, r.value)).collect();
        assert_eq!(got, vec![(1, 0x12)]);
        assert!(progress[2].starts_with("Filtering for EQUAL initial value..."));
    }

    #[test]
    fn test_narrow_whole_snapshot() {
        let dir = TempDir::new().unwrap();
        let paths = write_snapshots(&dir, &[&[1, 2, 3, 4]]);
        let range = ScanRange {
            size: SizeClass::SixteenBit,
            start: 0,
            length: None,
        };

        let (results, _) = narrow_snapshots(&paths, range, &[], &CliConfig::default()).unwrap();
        assert_eq!(results.matching_address_count(), 3);
        assert_eq!(results.range_length(), 4);
    }

    #[test]
    fn test_narrow_requires_snapshot() {
        assert!(narrow_snapshots(&[], eight_bit(), &[], &CliConfig::default()).is_err());

        let dir = TempDir::new().unwrap();
        let missing = vec![dir.path().join("missing.bin")];
        assert!(narrow_snapshots(&missing, eight_bit(), &[], &CliConfig::default()).is_err());
    }
}
