//! Descriptive mapping: records into per-record element maps.

use crate::models::{ElementMap, Record};
use crate::schema::Schema;

/// One [`ElementMap`] per record, in record order.
///
/// Attributes are visited in schema declaration order; several attributes
/// may feed the same element, and their values are appended in that order.
/// Attributes without a target element, and ad hoc columns, are left out.
pub fn map_descriptive(records: &[Record], schema: &Schema) -> Vec<ElementMap> {
    let mapping = schema.element_mapping();

    records
        .iter()
        .map(|record| {
            let mut map = ElementMap::new();
            for (attribute, element) in &mapping {
                if let Some(value) = record.attributes.get(*attribute) {
                    map.push(element, value.to_list());
                }
            }
            map
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    fn schema() -> Schema {
        Schema::from_yaml_str(
            r#"
identifier: ark
attributes:
  - name: ark
    headings: [ARK]
    element: identifier
  - name: title
    headings: [Title]
    element: title
  - name: alt_title
    headings: [Alternative title]
    multivalued: true
    element: title
  - name: notes
    headings: [Notes]
"#,
        )
        .unwrap()
    }

    fn record(values: &[(&str, FieldValue)]) -> Record {
        let mut record = Record::new(2);
        for (name, value) in values {
            record.attributes.insert(name.to_string(), value.clone());
        }
        record
    }

    #[test]
    fn test_shared_element_combines_in_declaration_order() {
        // Inserted out of declaration order on purpose
        let rec = record(&[
            ("alt_title", FieldValue::List(vec!["B".into(), "C".into()])),
            ("title", FieldValue::Scalar("A".into())),
            ("ark", FieldValue::Scalar("ark:/1/a".into())),
        ]);

        let maps = map_descriptive(&[rec], &schema());
        let map = &maps[0];

        let elements: Vec<&str> = map.iter().map(|(e, _)| e).collect();
        assert_eq!(elements, vec!["identifier", "title"]);
        assert_eq!(map.get("title").unwrap(), &["A".to_string(), "B".to_string(), "C".to_string()]);
        assert_eq!(map.get("identifier").unwrap(), &["ark:/1/a".to_string()]);
    }

    #[test]
    fn test_unmapped_and_absent_values_skipped() {
        let mut rec = record(&[
            ("notes", FieldValue::Scalar("foxed".into())),
            ("title", FieldValue::Scalar("Hours".into())),
        ]);
        rec.extra.insert("shelf".into(), FieldValue::Scalar("B.4".into()));

        let maps = map_descriptive(&[rec], &schema());
        assert_eq!(maps[0].len(), 1);
        assert!(maps[0].get("identifier").is_none());
    }

    #[test]
    fn test_one_map_per_record() {
        let records = vec![
            record(&[("title", FieldValue::Scalar("A".into()))]),
            record(&[]),
            record(&[("title", FieldValue::Scalar("C".into()))]),
        ];
        let maps = map_descriptive(&records, &schema());
        assert_eq!(maps.len(), 3);
        assert!(maps[1].is_empty());
        assert_eq!(maps[2].get("title").unwrap(), &["C".to_string()]);
    }
}
