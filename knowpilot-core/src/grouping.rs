//! Group table schema building
//!
//! A group table holds consecutive runs of `k` item contents per row, plus
//! the single-choice question generated for the row. The shape depends on
//! `k`, so the column list is computed here and rendered by each storage
//! backend.

use crate::{RowId, Timestamp, ValidationError};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Smallest supported group size.
pub const MIN_GROUP_SIZE: i64 = 1;
/// Largest supported group size.
pub const MAX_GROUP_SIZE: i64 = 20;

const CONTENT_PREFIX: &str = "content";

// ============================================================================
// COLUMNS
// ============================================================================

/// Storage-independent column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Auto-assigned integer primary key.
    Identity,
    /// Nullable text.
    Text,
    /// UTC timestamp, set on write.
    Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDescriptor {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Name of the content column holding slot `ordinal` (1-based).
pub fn content_column_name(ordinal: usize) -> String {
    format!("{}{}", CONTENT_PREFIX, ordinal)
}

/// Parse a `contentN` column name back to its ordinal.
pub fn content_column_ordinal(name: &str) -> Option<usize> {
    name.strip_prefix(CONTENT_PREFIX)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
        .filter(|ordinal| *ordinal >= 1)
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Physical name of the group table for size `k`.
pub fn group_table_name(k: i64) -> String {
    format!("content_group_{}", k)
}

/// Validated shape of a `content_group_{k}` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupTableSchema {
    k: usize,
}

impl GroupTableSchema {
    /// Validate `k` and build the schema.
    pub fn new(k: i64) -> Result<Self, ValidationError> {
        if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&k) {
            return Err(ValidationError::OutOfRange {
                field: "k".to_string(),
                value: k,
                min: MIN_GROUP_SIZE,
                max: MAX_GROUP_SIZE,
            });
        }
        Ok(Self { k: k as usize })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn table_name(&self) -> String {
        group_table_name(self.k as i64)
    }

    /// Every column, in table order.
    pub fn columns(&self) -> Vec<ColumnDescriptor> {
        let mut columns = Vec::with_capacity(self.k + 5);
        columns.push(ColumnDescriptor::new("id", ColumnKind::Identity));
        columns.extend(
            (1..=self.k).map(|i| ColumnDescriptor::new(content_column_name(i), ColumnKind::Text)),
        );
        columns.push(ColumnDescriptor::new("question", ColumnKind::Text));
        columns.push(ColumnDescriptor::new("correct_answer", ColumnKind::Text));
        columns.push(ColumnDescriptor::new("created_at", ColumnKind::Timestamp));
        columns.push(ColumnDescriptor::new("updated_at", ColumnKind::Timestamp));
        columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns().into_iter().map(|c| c.name).collect()
    }

    pub fn content_columns(&self) -> Vec<String> {
        (1..=self.k).map(content_column_name).collect()
    }
}

/// What a backend reports about an existing group table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub table: String,
    /// Column names in table order.
    pub columns: Vec<String>,
    pub primary_key: Vec<String>,
}

impl TableDescription {
    /// Number of `contentN` columns present.
    pub fn content_column_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| content_column_ordinal(c).is_some())
            .count()
    }
}

/// Split `items` into consecutive groups of `size`. The last group may be
/// shorter. A `size` of zero yields no groups.
pub fn partition_into_groups<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).map(|chunk| chunk.to_vec()).collect()
}

// ============================================================================
// ROWS
// ============================================================================

/// One `contentN` cell of a group row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSlot {
    /// The `N` of `contentN`, 1-based.
    pub ordinal: usize,
    pub text: Option<String>,
}

impl ContentSlot {
    /// Number `texts` as `content1`, `content2`, ...
    pub fn sequential(texts: impl IntoIterator<Item = Option<String>>) -> Vec<Self> {
        texts
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Self {
                ordinal: idx + 1,
                text,
            })
            .collect()
    }
}

/// One row of a group table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub id: RowId,
    /// Content cells in ordinal order. Ordinals may have gaps on tables
    /// created by hand.
    pub contents: Vec<ContentSlot>,
    pub question: Option<String>,
    pub correct_answer: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl GroupRow {
    /// Non-null slots as `(ordinal, text)`.
    pub fn populated_slots(&self) -> Vec<(usize, &str)> {
        self.contents
            .iter()
            .filter_map(|slot| slot.text.as_deref().map(|text| (slot.ordinal, text)))
            .collect()
    }

    /// Text of slot `ordinal`, if populated.
    pub fn slot(&self, ordinal: usize) -> Option<&str> {
        self.contents
            .iter()
            .find(|slot| slot.ordinal == ordinal)
            .and_then(|slot| slot.text.as_deref())
    }
}

impl Serialize for GroupRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.contents.len() + 5))?;
        map.serialize_entry("id", &self.id)?;
        for slot in &self.contents {
            map.serialize_entry(&content_column_name(slot.ordinal), &slot.text)?;
        }
        map.serialize_entry("question", &self.question)?;
        map.serialize_entry("correct_answer", &self.correct_answer)?;
        map.serialize_entry("created_at", &self.created_at)?;
        map.serialize_entry("updated_at", &self.updated_at)?;
        map.end()
    }
}

/// Generated question for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRowUpdate {
    pub row_id: RowId,
    pub question: String,
    /// Ordinal of the correct slot, as a decimal string.
    pub correct_answer: String,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_schema_bounds() {
        assert!(GroupTableSchema::new(0).is_err());
        assert!(GroupTableSchema::new(-3).is_err());
        assert!(GroupTableSchema::new(21).is_err());
        assert!(GroupTableSchema::new(1).is_ok());
        assert!(GroupTableSchema::new(20).is_ok());
    }

    #[test]
    fn test_schema_columns_in_order() {
        let schema = GroupTableSchema::new(3).unwrap();
        assert_eq!(schema.table_name(), "content_group_3");
        assert_eq!(
            schema.column_names(),
            vec![
                "id",
                "content1",
                "content2",
                "content3",
                "question",
                "correct_answer",
                "created_at",
                "updated_at"
            ]
        );
        assert_eq!(schema.columns()[0].kind, ColumnKind::Identity);
        assert_eq!(schema.columns()[7].kind, ColumnKind::Timestamp);
    }

    #[test]
    fn test_content_column_ordinal() {
        assert_eq!(content_column_ordinal("content12"), Some(12));
        assert_eq!(content_column_ordinal("content"), None);
        assert_eq!(content_column_ordinal("content0"), None);
        assert_eq!(content_column_ordinal("contents"), None);
        assert_eq!(content_column_ordinal("question"), None);
    }

    #[test]
    fn test_partition_trailing_group() {
        let groups = partition_into_groups(&[1, 2, 3, 4, 5], 2);
        assert_eq!(groups, vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert!(partition_into_groups(&[1, 2], 0).is_empty());
        assert!(partition_into_groups::<i32>(&[], 3).is_empty());
    }

    #[test]
    fn test_populated_slots_keep_blank_text() {
        let row = GroupRow {
            id: 7,
            contents: ContentSlot::sequential([
                Some("a".into()),
                None,
                Some("  ".into()),
                Some("d".into()),
            ]),
            question: None,
            correct_answer: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(row.populated_slots(), vec![(1, "a"), (3, "  "), (4, "d")]);
        assert_eq!(row.slot(4), Some("d"));
        assert_eq!(row.slot(2), None);
        assert_eq!(row.slot(0), None);
    }

    #[test]
    fn test_slots_keep_ordinals_across_gaps() {
        let row = GroupRow {
            id: 2,
            contents: vec![
                ContentSlot {
                    ordinal: 1,
                    text: Some("first".into()),
                },
                ContentSlot {
                    ordinal: 3,
                    text: Some("third".into()),
                },
            ],
            question: None,
            correct_answer: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(row.populated_slots(), vec![(1, "first"), (3, "third")]);
        assert_eq!(row.slot(3), Some("third"));
        assert_eq!(row.slot(2), None);

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["content3"], "third");
        assert!(json.get("content2").is_none());
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let row = GroupRow {
            id: 1,
            contents: ContentSlot::sequential([Some("x".into()), None]),
            question: Some("q".into()),
            correct_answer: Some("1".into()),
            created_at: Some(Utc::now()),
            updated_at: None,
        };
        let json = serde_json::to_string(&row).unwrap();
        let positions: Vec<usize> = ["\"id\"", "\"content1\"", "\"content2\"", "\"question\"", "\"correct_answer\"", "\"created_at\"", "\"updated_at\""]
            .iter()
            .map(|key| json.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(json.contains("\"content2\":null"));
    }
}
