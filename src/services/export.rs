//! Export records and output file naming.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{BatchItem, ExportRecord, ItemStatus, MetadataValue};

fn non_alnum() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"))
}

/// Lower-case, underscore-separated filename stem. Never empty.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let slug = non_alnum().replace_all(&lower, "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug.chars().take(60).collect::<String>().trim_end_matches('_').to_string()
    }
}

/// Output filename for the record at 1-based `position`.
pub fn export_filename(item: &BatchItem, position: usize) -> String {
    let base = item
        .analysis
        .as_ref()
        .and_then(|a| a.label())
        .unwrap_or_else(|| item.source.stem());
    format!("{}_{:03}.png", slugify(base), position)
}

fn metadata(item: &BatchItem) -> BTreeMap<String, MetadataValue> {
    let mut map = BTreeMap::new();
    map.insert("content_hash".into(), item.content_hash.clone().into());
    map.insert("is_duplicate".into(), item.is_duplicate.into());
    map.insert("mime_type".into(), "image/png".into());
    map.insert("source_mime_type".into(), item.source.mime_type.clone().into());
    map.insert("operation_count".into(), item.operations.len().into());
    if let Some(output) = &item.output {
        map.insert("width".into(), output.width.into());
        map.insert("height".into(), output.height.into());
    }
    if let Some(analysis) = &item.analysis {
        map.insert("analysis_kind".into(), analysis.kind_name().into());
        if let Some(confidence) = analysis.confidence() {
            map.insert("confidence".into(), confidence.into());
        }
    }
    map
}

/// One record per completed item, in batch order.
pub fn build_records(items: &[BatchItem]) -> Vec<ExportRecord> {
    items
        .iter()
        .filter(|i| i.status == ItemStatus::Completed)
        .enumerate()
        .map(|(n, item)| ExportRecord {
            id: item.id.clone(),
            original_filename: item.source.filename.clone(),
            new_filename: export_filename(item, n + 1),
            analysis: item.analysis.clone(),
            operations: item.operations.clone(),
            metadata: metadata(item),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, ParsedAnalysis, ProcessedOutput, Upload};

    fn completed(filename: &str, analysis: Option<AnalysisResult>) -> BatchItem {
        let mut item = BatchItem::new(Upload::new(filename, "image/jpeg", filename.into()));
        item.status = ItemStatus::Completed;
        item.output = Some(ProcessedOutput {
            png: vec![0u8; 4].into(),
            width: 64,
            height: 48,
        });
        item.analysis = analysis;
        item
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Postage Stamps"), "postage_stamps");
        assert_eq!(slugify("  US / 1930s -- Airmail! "), "us_1930s_airmail");
        assert_eq!(slugify("***"), "item");
        assert_eq!(slugify("IMG_0042"), "img_0042");
    }

    #[test]
    fn test_records_only_completed_in_order() {
        let mut pending = BatchItem::new(Upload::new("p.png", "image/png", vec![9]));
        pending.status = ItemStatus::Pending;
        let items = vec![
            completed("first.jpg", None),
            pending,
            completed("second.jpg", None),
        ];
        let records = build_records(&items);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].original_filename, "first.jpg");
        assert_eq!(records[0].new_filename, "first_001.png");
        assert_eq!(records[1].new_filename, "second_002.png");
    }

    #[test]
    fn test_filename_from_analysis_category() {
        let analysis = AnalysisResult::Parsed(ParsedAnalysis {
            description: "A stamp".into(),
            categories: vec!["Airmail Stamps".into()],
            confidence: 90.0,
            ..Default::default()
        });
        let records = build_records(&[completed("scan.jpg", Some(analysis))]);
        assert_eq!(records[0].new_filename, "airmail_stamps_001.png");
        assert_eq!(
            records[0].metadata.get("confidence"),
            Some(&MetadataValue::Float(90.0))
        );
        assert_eq!(
            records[0].metadata.get("analysis_kind"),
            Some(&MetadataValue::Text("parsed".into()))
        );
    }

    #[test]
    fn test_raw_text_analysis_uses_stem() {
        let analysis = AnalysisResult::RawText {
            description: "could not parse".into(),
        };
        let records = build_records(&[completed("Coin Front.jpg", Some(analysis))]);
        assert_eq!(records[0].new_filename, "coin_front_001.png");
        assert!(!records[0].metadata.contains_key("confidence"));
    }

    #[test]
    fn test_metadata_fields() {
        let records = build_records(&[completed("a.jpg", None)]);
        let m = &records[0].metadata;
        assert_eq!(m.get("width"), Some(&MetadataValue::Integer(64)));
        assert_eq!(m.get("height"), Some(&MetadataValue::Integer(48)));
        assert_eq!(m.get("is_duplicate"), Some(&MetadataValue::Bool(false)));
        assert_eq!(m.get("operation_count"), Some(&MetadataValue::Integer(0)));
        assert_eq!(
            m.get("source_mime_type"),
            Some(&MetadataValue::Text("image/jpeg".into()))
        );
        assert!(m.contains_key("content_hash"));
    }
}
