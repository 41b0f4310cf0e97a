use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

pub use error::ConvertError;
use error::describe_placemark;
pub use kml::{Container, Geometry, KmlFile, Placemark};

mod error;
pub mod kml;

/// Used for a Document or Folder without a name
pub const UNNAMED_LAYER: &str = "Unnamed Document";

/// Run configuration, built once by the caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvertOptions {
    /// Ignore Folders and produce exactly one layer from the Document's own placemarks, written
    /// to a single file.
    pub legacy_single_layer: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    pub name: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
}

impl From<Waypoint> for ov2::Poi {
    fn from(waypoint: Waypoint) -> Self {
        ov2::Poi {
            name: waypoint.name,
            lon: waypoint.longitude,
            lat: waypoint.latitude,
        }
    }
}

/// A named group of placemarks that becomes one output file
#[derive(Debug)]
pub struct LayerSource<'a> {
    pub name: String,
    pub placemarks: &'a [Placemark],
}

#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub name: String,
    pub waypoints: Vec<Waypoint>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputArtifact {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Where artifacts get written
#[derive(Clone, Debug, PartialEq)]
pub enum OutputTarget {
    /// One file per artifact, named by the artifact
    Directory(PathBuf),
    /// The single artifact of a legacy run
    File(PathBuf),
}

impl OutputTarget {
    /// Picks the target for `input`. Without an explicit `output`, multi-layer runs write next to
    /// the input, and legacy runs write the input path with an `.ov2` extension.
    pub fn new(input: &Path, output: Option<&Path>, options: &ConvertOptions) -> Self {
        match (output, options.legacy_single_layer) {
            (Some(path), true) => OutputTarget::File(path.to_path_buf()),
            (None, true) => OutputTarget::File(input.with_extension("ov2")),
            (Some(path), false) => OutputTarget::Directory(path.to_path_buf()),
            (None, false) => OutputTarget::Directory(match input.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => PathBuf::from("."),
            }),
        }
    }
}

/// Reads, converts, and writes one KML file, returning the paths written. Nothing is written
/// unless every layer converts successfully.
pub fn convert_file(
    input: &Path,
    target: &OutputTarget,
    options: &ConvertOptions,
) -> Result<Vec<PathBuf>, ConvertError> {
    info!("Reading {}", input.display());
    let text = std::fs::read_to_string(input).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ConvertError::InputNotFound {
                path: input.to_path_buf(),
            }
        } else {
            ConvertError::InputUnreadable {
                path: input.to_path_buf(),
                source,
            }
        }
    })?;
    let file = kml::parse(&text)?;
    let artifacts = convert(&file, options)?;
    write_artifacts(&artifacts, target)
}

/// Converts every layer of the document into OV2 bytes, in layer order.
pub fn convert(
    file: &KmlFile,
    options: &ConvertOptions,
) -> Result<Vec<OutputArtifact>, ConvertError> {
    let mut artifacts = Vec::new();
    let mut taken = HashSet::new();
    for layer in extract_layers(file, options)? {
        let route = ov2::Route {
            points: layer.waypoints.into_iter().map(ov2::Poi::from).collect(),
        };
        let content = ov2::encode(&[route]).map_err(|source| ConvertError::Encoding {
            layer: layer.name.clone(),
            source,
        })?;
        artifacts.push(OutputArtifact {
            file_name: unique_file_name(&layer.name, &mut taken),
            content,
        });
    }
    Ok(artifacts)
}

/// Resolves layers and pulls the waypoints out of each one.
pub fn extract_layers(
    file: &KmlFile,
    options: &ConvertOptions,
) -> Result<Vec<Layer>, ConvertError> {
    let sources = resolve_layers(file, options)?;
    info!("Found {} layer(s)", sources.len());

    let mut layers = Vec::new();
    for source in sources {
        let waypoints = extract_waypoints(source.placemarks)?;
        info!(
            "Layer {:?}: {} waypoints, skipped {} lines",
            source.name,
            waypoints.len(),
            source.placemarks.len() - waypoints.len()
        );
        layers.push(Layer {
            name: source.name,
            waypoints,
        });
    }
    Ok(layers)
}

/// Decides which layers a document holds. Every Folder directly under the Document is a layer;
/// without any, the Document itself is the only layer. Folders inside Folders are ignored.
pub fn resolve_layers<'a>(
    file: &'a KmlFile,
    options: &ConvertOptions,
) -> Result<Vec<LayerSource<'a>>, ConvertError> {
    let document = file.document.as_ref().ok_or(ConvertError::MissingDocument)?;

    if options.legacy_single_layer || document.folders.is_empty() {
        debug!("Treating the whole Document as one layer");
        return Ok(vec![layer_source(document)]);
    }
    if !document.placemarks.is_empty() {
        warn!(
            "Ignoring {} placemarks directly under the Document, since it has Folders",
            document.placemarks.len()
        );
    }
    Ok(document.folders.iter().map(layer_source).collect())
}

fn layer_source(container: &Container) -> LayerSource<'_> {
    LayerSource {
        name: layer_name(container),
        placemarks: &container.placemarks,
    }
}

fn layer_name(container: &Container) -> String {
    match container.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => UNNAMED_LAYER.to_string(),
    }
}

/// Turns placemarks into waypoints, keeping their order. Lines are dropped; anything without
/// point or line geometry is an error.
pub fn extract_waypoints(placemarks: &[Placemark]) -> Result<Vec<Waypoint>, ConvertError> {
    let mut waypoints = Vec::new();
    for placemark in placemarks {
        match &placemark.geometry {
            // OV2 can't represent lines
            Geometry::LineString => {}
            Geometry::Point { coordinates } => {
                let (longitude, latitude) = parse_coordinates(coordinates).ok_or_else(|| {
                    ConvertError::InvalidCoordinate {
                        placemark: describe_placemark(placemark.name.as_deref()),
                        coordinates: coordinates.clone(),
                    }
                })?;
                waypoints.push(Waypoint {
                    name: placemark.name.clone(),
                    longitude,
                    latitude,
                });
            }
            Geometry::Unknown => {
                return Err(ConvertError::MissingGeometry {
                    placemark: describe_placemark(placemark.name.as_deref()),
                });
            }
        }
    }
    Ok(waypoints)
}

/// Parses `lon,lat[,alt]`, ignoring whitespace around each value and anything after the
/// latitude. Both values must be finite numbers.
pub fn parse_coordinates(input: &str) -> Option<(f64, f64)> {
    let mut values = input.split(',').map(|x| x.trim().parse::<f64>());
    let longitude = values.next()?.ok()?;
    let latitude = values.next()?.ok()?;
    if longitude.is_finite() && latitude.is_finite() {
        Some((longitude, latitude))
    } else {
        None
    }
}

/// The longest file name most filesystems accept, in bytes
const MAX_FILE_NAME_LEN: usize = 255;
const EXTENSION: &str = ".ov2";

/// The file name for a layer: the name with characters that aren't valid in paths replaced by
/// `-`, cut short enough that the `.ov2` extension always fits.
pub fn output_file_name(layer_name: &str) -> String {
    file_name_with_suffix(layer_name, "")
}

fn file_name_with_suffix(layer_name: &str, suffix: &str) -> String {
    // Sanitize only the name, so reserved device names like CON keep the extension
    let mut file_name = sanitize_filename::sanitize_with_options(
        layer_name,
        sanitize_filename::Options {
            windows: true,
            truncate: false,
            replacement: "-",
        },
    );
    let mut max_len = MAX_FILE_NAME_LEN - EXTENSION.len() - suffix.len();
    if file_name.len() > max_len {
        while !file_name.is_char_boundary(max_len) {
            max_len -= 1;
        }
        file_name.truncate(max_len);
    }
    file_name.push_str(suffix);
    file_name.push_str(EXTENSION);
    file_name
}

/// Picks a file name no earlier layer has used, adding ` (2)`, ` (3)`, ... for repeats.
/// Names are compared ignoring case, for case-insensitive filesystems.
fn unique_file_name(layer_name: &str, taken: &mut HashSet<String>) -> String {
    let mut file_name = output_file_name(layer_name);
    let mut copy = 1;
    while !taken.insert(file_name.to_lowercase()) {
        copy += 1;
        file_name = file_name_with_suffix(layer_name, &format!(" ({copy})"));
    }
    if copy > 1 {
        warn!(
            "Layer {layer_name:?} has the same file name as an earlier layer; writing it to \
             {file_name}"
        );
    }
    file_name
}

/// Writes every artifact, one after another, overwriting existing files.
pub fn write_artifacts(
    artifacts: &[OutputArtifact],
    target: &OutputTarget,
) -> Result<Vec<PathBuf>, ConvertError> {
    if let OutputTarget::Directory(dir) = target {
        std::fs::create_dir_all(dir).map_err(|source| ConvertError::OutputUnwritable {
            path: dir.clone(),
            source,
        })?;
    }

    let mut written = Vec::new();
    for artifact in artifacts {
        let path = match target {
            OutputTarget::Directory(dir) => dir.join(&artifact.file_name),
            // Legacy runs only ever have one artifact
            OutputTarget::File(path) => path.clone(),
        };
        info!("Writing to file: {}", path.display());
        std::fs::write(&path, &artifact.content).map_err(|source| {
            ConvertError::OutputUnwritable {
                path: path.clone(),
                source,
            }
        })?;
        written.push(path);
    }
    Ok(written)
}
