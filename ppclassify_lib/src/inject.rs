//! Rendering of aggregated categories into the host document's taxonomy
//! schema.
//!
//! The subtree shape and the eight-level parent path from an assignment's
//! `investmentVehicle` node back to the securities list are contracts of the
//! host format and must not change.

use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use uuid::Uuid;

use crate::aggregate::AggregatedCategory;
use crate::error::ClassifyError;
use crate::taxonomy::TaxonomyKind;

/// Fixed display color of a taxonomy's root node.
const ROOT_COLOR: &str = "#89afee";
/// The host format's representation of 100% on the root node.
const ROOT_WEIGHT: &str = "10000";
/// Parent levels from an investmentVehicle node up to the document root.
const PARENT_LEVELS: usize = 8;

/// Relative reference from an assignment to the n-th security record.
pub fn security_reference(position: usize) -> String {
    format!(
        "{}securities/security[{}]",
        "../".repeat(PARENT_LEVELS),
        position
    )
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn simple(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<(), ClassifyError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Like [`simple`], for text that is already XML-escaped (category names).
fn pre_escaped(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<(), ClassifyError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::from_escaped(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Renders one taxonomy subtree for appending under `<taxonomies>`.
pub fn render_taxonomy(
    kind: TaxonomyKind,
    categories: &[AggregatedCategory],
) -> Result<String, ClassifyError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Start(BytesStart::new("taxonomy")))?;
    simple(&mut writer, "id", &Uuid::new_v4().to_string())?;
    simple(&mut writer, "name", kind.name())?;

    writer.write_event(Event::Start(BytesStart::new("root")))?;
    simple(&mut writer, "id", &Uuid::new_v4().to_string())?;
    simple(&mut writer, "name", kind.name())?;
    simple(&mut writer, "color", ROOT_COLOR)?;

    writer.write_event(Event::Start(BytesStart::new("children")))?;
    for category in categories {
        writer.write_event(Event::Start(BytesStart::new("classification")))?;
        simple(&mut writer, "id", &category.id)?;
        pre_escaped(&mut writer, "name", &category.name)?;
        simple(&mut writer, "color", &category.color)?;

        let mut parent = BytesStart::new("parent");
        parent.push_attribute(("reference", "../../.."));
        writer.write_event(Event::Empty(parent))?;
        writer.write_event(Event::Empty(BytesStart::new("children")))?;

        writer.write_event(Event::Start(BytesStart::new("assignments")))?;
        for assignment in &category.assignments {
            writer.write_event(Event::Start(BytesStart::new("assignment")))?;
            let mut vehicle = BytesStart::new("investmentVehicle");
            vehicle.push_attribute(("class", "security"));
            vehicle.push_attribute((
                "reference",
                security_reference(assignment.security_position).as_str(),
            ));
            writer.write_event(Event::Empty(vehicle))?;
            simple(&mut writer, "weight", &assignment.weight.to_string())?;
            simple(&mut writer, "rank", &assignment.rank.to_string())?;
            writer.write_event(Event::End(BytesEnd::new("assignment")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("assignments")))?;

        simple(&mut writer, "weight", &category.total_weight().to_string())?;
        simple(&mut writer, "rank", "1")?;
        writer.write_event(Event::End(BytesEnd::new("classification")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("children")))?;

    writer.write_event(Event::Empty(BytesStart::new("assignments")))?;
    simple(&mut writer, "weight", ROOT_WEIGHT)?;
    simple(&mut writer, "rank", "0")?;
    writer.write_event(Event::End(BytesEnd::new("root")))?;

    writer.write_event(Event::End(BytesEnd::new("taxonomy")))?;

    let buf = writer.into_inner().into_inner();
    String::from_utf8(buf)
        .map_err(|e| ClassifyError::Document(format!("rendered taxonomy is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Assignment;

    fn sample_categories() -> Vec<AggregatedCategory> {
        vec![
            AggregatedCategory {
                name: "Technology".into(),
                id: "cat-1".into(),
                color: "#EFC758".into(),
                assignments: vec![
                    Assignment {
                        security_position: 1,
                        weight: 3000,
                        rank: 1,
                    },
                    Assignment {
                        security_position: 2,
                        weight: 2000,
                        rank: 2,
                    },
                ],
            },
            AggregatedCategory {
                name: "AT&amp;T &lt;Telecom&gt;".into(),
                id: "cat-2".into(),
                color: "#91C746".into(),
                assignments: vec![Assignment {
                    security_position: 2,
                    weight: 500,
                    rank: 3,
                }],
            },
        ]
    }

    #[test]
    fn reference_path_climbs_eight_levels() {
        assert_eq!(
            security_reference(5),
            "../../../../../../../../securities/security[5]"
        );
    }

    #[test]
    fn renders_fixed_root_node() {
        let xml = render_taxonomy(TaxonomyKind::Sector, &sample_categories()).unwrap();
        assert!(xml.contains("<name>Sector</name>"));
        assert!(xml.contains("<color>#89afee</color>"));
        assert!(xml.contains("<weight>10000</weight>"));
        assert!(xml.contains("<rank>0</rank>"));
    }

    #[test]
    fn renders_assignments_with_weights_and_ranks() {
        let xml = render_taxonomy(TaxonomyKind::Sector, &sample_categories()).unwrap();
        assert!(xml.contains(
            r#"<investmentVehicle class="security" reference="../../../../../../../../securities/security[1]"/>"#
        ));
        assert!(xml.contains("<weight>3000</weight>"));
        assert!(xml.contains("<weight>2000</weight>"));
        assert!(xml.contains("<rank>2</rank>"));
        // category total is derived from its assignments
        assert!(xml.contains("<weight>5000</weight>"));
    }

    #[test]
    fn escaped_names_are_written_verbatim() {
        let xml = render_taxonomy(TaxonomyKind::Sector, &sample_categories()).unwrap();
        assert!(xml.contains("<name>AT&amp;T &lt;Telecom&gt;</name>"));
        assert!(!xml.contains("&amp;amp;"));
    }

    #[test]
    fn rendered_subtree_is_parseable() {
        use quick_xml::Reader;

        let xml = render_taxonomy(TaxonomyKind::Sector, &sample_categories()).unwrap();
        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Err(e) => panic!("XML parse error: {e}"),
                _ => {}
            }
        }
    }

    #[test]
    fn empty_kind_renders_empty_children() {
        let xml = render_taxonomy(TaxonomyKind::Country, &[]).unwrap();
        assert!(xml.contains("<name>Country</name>"));
        assert!(!xml.contains("<classification>"));
    }
}
