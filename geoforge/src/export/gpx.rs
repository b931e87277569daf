use geoforge_types::GeometryKind;
use geojson::{Feature, FeatureCollection, JsonObject, Position, Value};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::ExportError;
use crate::filter::display_value;

/// Namespace of GPX 1.1 documents.
pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
/// Namespace of the extension elements that carry feature attributes.
pub const GEOFORGE_NAMESPACE: &str = "urn:geoforge:gpx:extensions:1";

const NAME_PROPERTIES: &[&str] = &["name"];
const DESCRIPTION_PROPERTIES: &[&str] = &["description", "desc"];

/// Writes the collection as a GPX 1.1 document.
///
/// Points become waypoints (one per point of a multipoint). Lines become tracks with one segment per line part.
/// Polygons become tracks with one segment per ring; every polygon of a multipolygon is a separate track. The `name`
/// and `description` (or `desc`) properties become the GPX name and description, all other properties and the
/// original geometry type are stored in `<extensions>`, so that no attribute is lost. Features without geometry
/// are skipped.
pub fn to_gpx(collection: &FeatureCollection, creator: &str) -> Result<String, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("gpx");
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("creator", creator));
    root.push_attribute(("xmlns", GPX_NAMESPACE));
    root.push_attribute(("xmlns:gf", GEOFORGE_NAMESPACE));
    writer.write_event(Event::Start(root))?;

    for (index, feature) in collection.features.iter().enumerate() {
        let Some(geometry) = &feature.geometry else {
            log::debug!("Feature {index} has no geometry, it is not exported");
            continue;
        };

        let Some(kind) = GeometryKind::of_value(&geometry.value) else {
            return Err(ExportError::UnsupportedGeometry("GeometryCollection"));
        };

        let attributes = Attributes::of(feature, index, kind);
        match &geometry.value {
            Value::Point(position) => write_waypoint(&mut writer, position, &attributes)?,
            Value::MultiPoint(positions) => {
                for position in positions {
                    write_waypoint(&mut writer, position, &attributes)?;
                }
            }
            Value::LineString(line) => {
                write_track(&mut writer, std::slice::from_ref(line), &attributes)?
            }
            Value::MultiLineString(lines) => write_track(&mut writer, lines, &attributes)?,
            Value::Polygon(rings) => write_track(&mut writer, rings, &attributes)?,
            Value::MultiPolygon(polygons) => {
                for rings in polygons {
                    write_track(&mut writer, rings, &attributes)?;
                }
            }
            Value::GeometryCollection(_) => {
                return Err(ExportError::UnsupportedGeometry("GeometryCollection"))
            }
        }
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

struct Attributes {
    name: Option<String>,
    description: Option<String>,
    geometry_type: &'static str,
    feature: usize,
    others: Vec<(String, String)>,
}

impl Attributes {
    fn of(feature: &Feature, index: usize, geometry_type: GeometryKind) -> Self {
        let empty = JsonObject::new();
        let properties = feature.properties.as_ref().unwrap_or(&empty);
        let first_of = |names: &[&'static str]| {
            names.iter().find_map(|name| {
                properties
                    .get(*name)
                    .and_then(display_value)
                    .map(|value| (*name, value))
            })
        };

        let name = first_of(NAME_PROPERTIES);
        let description = first_of(DESCRIPTION_PROPERTIES);
        let used: Vec<&str> = name.iter().chain(&description).map(|(key, _)| *key).collect();

        let others = properties
            .iter()
            .filter(|(key, _)| !used.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), display_value(value).unwrap_or_default()))
            .collect();

        Self {
            name: name.map(|(_, value)| value),
            description: description.map(|(_, value)| value),
            geometry_type: geometry_type.as_str(),
            feature: index,
            others,
        }
    }
}

fn write_waypoint<W: std::io::Write>(
    writer: &mut Writer<W>,
    position: &Position,
    attributes: &Attributes,
) -> Result<(), ExportError> {
    writer.write_event(Event::Start(point_element("wpt", position)))?;
    write_attributes(writer, attributes)?;
    writer.write_event(Event::End(BytesEnd::new("wpt")))?;
    Ok(())
}

fn write_track<W: std::io::Write>(
    writer: &mut Writer<W>,
    segments: &[Vec<Position>],
    attributes: &Attributes,
) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new("trk")))?;
    write_attributes(writer, attributes)?;

    for segment in segments {
        writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
        for position in segment {
            writer.write_event(Event::Empty(point_element("trkpt", position)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("trk")))?;
    Ok(())
}

fn point_element<'a>(tag: &'a str, position: &Position) -> BytesStart<'a> {
    let lon = position.first().copied().unwrap_or_default();
    let lat = position.get(1).copied().unwrap_or_default();

    let mut element = BytesStart::new(tag);
    element.push_attribute(("lat", lat.to_string().as_str()));
    element.push_attribute(("lon", lon.to_string().as_str()));
    element
}

fn write_attributes<W: std::io::Write>(
    writer: &mut Writer<W>,
    attributes: &Attributes,
) -> Result<(), ExportError> {
    if let Some(name) = &attributes.name {
        writer
            .create_element("name")
            .write_text_content(BytesText::new(name))?;
    }

    if let Some(description) = &attributes.description {
        writer
            .create_element("desc")
            .write_text_content(BytesText::new(description))?;
    }

    writer.write_event(Event::Start(BytesStart::new("extensions")))?;
    writer
        .create_element("gf:geometry")
        .with_attribute(("feature", attributes.feature.to_string().as_str()))
        .write_text_content(BytesText::new(attributes.geometry_type))?;
    for (key, value) in &attributes.others {
        writer
            .create_element("gf:property")
            .with_attribute(("name", key.as_str()))
            .write_text_content(BytesText::new(value))?;
    }
    writer.write_event(Event::End(BytesEnd::new("extensions")))?;

    Ok(())
}
