//! The parts of a KML document the converter reads, pulled out of the XML tree once. Elements
//! are matched by local name, so any (or no) KML namespace works.

use roxmltree::Node;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KmlFile {
    /// The first `Document` directly under the `kml` root
    pub document: Option<Container>,
}

/// A `Document` or `Folder`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Container {
    pub name: Option<String>,
    pub folders: Vec<Container>,
    pub placemarks: Vec<Placemark>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Placemark {
    pub name: Option<String>,
    pub geometry: Geometry,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// The raw `lon,lat[,alt]` text, not yet parsed
    Point { coordinates: String },
    LineString,
    /// No `Point` or `LineString`, or a `Point` without `coordinates`
    Unknown,
}

pub fn parse(input: &str) -> Result<KmlFile, roxmltree::Error> {
    let xml = roxmltree::Document::parse(input)?;
    let root = xml.root_element();
    let document = if root.tag_name().name() == "kml" {
        child(root, "Document").map(read_container)
    } else {
        None
    };
    Ok(KmlFile { document })
}

fn read_container(node: Node) -> Container {
    Container {
        name: child(node, "name").map(text),
        folders: children(node, "Folder").map(read_container).collect(),
        placemarks: children(node, "Placemark").map(read_placemark).collect(),
    }
}

fn read_placemark(node: Node) -> Placemark {
    // A LineString wins even if there's also a Point
    let geometry = if child(node, "LineString").is_some() {
        Geometry::LineString
    } else if let Some(coordinates) = child(node, "Point").and_then(|pt| child(pt, "coordinates"))
    {
        Geometry::Point {
            coordinates: text(coordinates),
        }
    } else {
        Geometry::Unknown
    };
    Placemark {
        name: child(node, "name").map(text),
        geometry,
    }
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

// Joins text and CDATA pieces, trimmed
fn text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}
