//! Track property schemas, shorthand expansion and validation.
//!
//! A `TrackSection` is raw text; `TrackProperties` is what track handlers
//! consume: the file type is resolved, defaults are filled in and every
//! known property has been parsed to its declared type.

use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, TrackSection, TracksFile};
use crate::io::uncompressed_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Bigwig,
    Bedgraph,
    BedgraphMatrix,
    Bed,
    Gtf,
    NarrowPeak,
    Links,
    HicMatrix,
    Maf,
    XAxis,
    Spacer,
    Vlines,
    Hlines,
}

impl FileType {
    pub const ALL: [FileType; 13] = [
        FileType::Bigwig,
        FileType::Bedgraph,
        FileType::BedgraphMatrix,
        FileType::Bed,
        FileType::Gtf,
        FileType::NarrowPeak,
        FileType::Links,
        FileType::HicMatrix,
        FileType::Maf,
        FileType::XAxis,
        FileType::Spacer,
        FileType::Vlines,
        FileType::Hlines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Bigwig => "bigwig",
            FileType::Bedgraph => "bedgraph",
            FileType::BedgraphMatrix => "bedgraph_matrix",
            FileType::Bed => "bed",
            FileType::Gtf => "gtf",
            FileType::NarrowPeak => "narrow_peak",
            FileType::Links => "links",
            FileType::HicMatrix => "hic_matrix",
            FileType::Maf => "maf",
            FileType::XAxis => "x_axis",
            FileType::Spacer => "spacer",
            FileType::Vlines => "vlines",
            FileType::Hlines => "hlines",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Guess the type from a file name; a trailing `.gz` is ignored.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let name = uncompressed_name(path);
        let ext = name.rsplit_once('.').map(|(_, ext)| ext)?;
        match ext {
            "bed" => Some(FileType::Bed),
            "narrowpeak" => Some(FileType::NarrowPeak),
            "gtf" => Some(FileType::Gtf),
            "bw" | "bigwig" => Some(FileType::Bigwig),
            "bg" | "bedgraph" => Some(FileType::Bedgraph),
            "bm" => Some(FileType::BedgraphMatrix),
            "arcs" | "arc" | "link" | "links" => Some(FileType::Links),
            "ginteractions" | "gi" => Some(FileType::HicMatrix),
            "maf" => Some(FileType::Maf),
            _ => None,
        }
    }

    /// Types that read a data file named by the `file` property.
    pub fn needs_file(&self) -> bool {
        !matches!(self, FileType::XAxis | FileType::Spacer | FileType::Hlines)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a track relates to the panel of the track before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    /// Own panel.
    #[default]
    No,
    /// Drawn into the previous panel with an independent y range.
    Yes,
    /// Drawn into the previous panel sharing its y range.
    ShareY,
}

impl OverlayMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "no" | "false" | "off" | "0" => Some(OverlayMode::No),
            "yes" | "true" | "on" | "1" => Some(OverlayMode::Yes),
            "share-y" | "share_y" => Some(OverlayMode::ShareY),
            _ => None,
        }
    }

    pub fn is_overlay(&self) -> bool {
        *self != OverlayMode::No
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropKind {
    Bool,
    Str,
    Float { min: f64, max: f64 },
    Int { min: i64, max: i64 },
    Choice(&'static [&'static str]),
}

const ANY_FLOAT: PropKind = PropKind::Float { min: f64::NEG_INFINITY, max: f64::INFINITY };
const POSITIVE: PropKind = PropKind::Float { min: 0.0, max: f64::INFINITY };
const UNIT: PropKind = PropKind::Float { min: 0.0, max: 1.0 };
const LINE_STYLES: PropKind = PropKind::Choice(&["solid", "dashed", "dotted", "dashdot"]);

#[derive(Debug, Clone, PartialEq)]
pub struct PropSpec {
    pub name: &'static str,
    pub kind: PropKind,
    pub default: Option<&'static str>,
}

const fn prop(name: &'static str, kind: PropKind, default: Option<&'static str>) -> PropSpec {
    PropSpec { name, kind, default }
}

/// Defaults, required names and typed properties of one track type.
#[derive(Debug, Clone)]
pub struct TrackSchema {
    pub file_type: FileType,
    pub required: Vec<&'static str>,
    pub props: Vec<PropSpec>,
}

impl TrackSchema {
    pub fn for_type(file_type: FileType) -> Self {
        let mut props = vec![
            prop("file", PropKind::Str, None),
            prop("file_type", PropKind::Str, None),
            prop("title", PropKind::Str, Some("")),
            prop("height", POSITIVE, None),
            prop("overlay_previous", PropKind::Choice(&["no", "yes", "share-y"]), Some("no")),
            prop("orientation", PropKind::Choice(&["normal", "inverted"]), None),
        ];
        let mut required = Vec::new();
        if file_type.needs_file() {
            required.push("file");
        }

        let specific: Vec<PropSpec> = match file_type {
            FileType::Bigwig | FileType::Bedgraph => {
                let bigwig = file_type == FileType::Bigwig;
                let mut p = vec![
                    prop("height", POSITIVE, Some(if bigwig { "2" } else { "1.5" })),
                    prop("color", PropKind::Str, Some(if bigwig { "#33a02c" } else { "#a6cee3" })),
                    prop("negative_color", PropKind::Str, None),
                    prop("alpha", UNIT, Some("1")),
                    prop("plot_type", PropKind::Choice(&["fill", "line", "points", "heatmap"]), Some("fill")),
                    prop("line_width", POSITIVE, Some("0.5")),
                    prop("point_size", POSITIVE, Some("1")),
                    prop("number_of_bins", PropKind::Int { min: 1, max: i64::MAX }, Some("700")),
                    prop("nans_to_zeros", PropKind::Bool, Some("false")),
                    prop("min_value", ANY_FLOAT, None),
                    prop("max_value", ANY_FLOAT, None),
                    prop("show_data_range", PropKind::Bool, Some("true")),
                    prop("grid", PropKind::Bool, Some("false")),
                    prop("transform", PropKind::Choice(&["no", "log", "log1p", "-log", "log2", "log10"]), Some("no")),
                    prop("log_pseudocount", ANY_FLOAT, Some("0")),
                    prop("colormap", PropKind::Str, Some("viridis")),
                ];
                let methods = PropKind::Choice(&["mean", "average", "max", "min", "stdev", "coverage", "sum"]);
                if bigwig {
                    p.push(prop("summary_method", methods, Some("mean")));
                } else {
                    p.push(prop("summary_method", methods, None));
                    p.push(prop("use_middle", PropKind::Bool, Some("false")));
                }
                p
            }
            FileType::BedgraphMatrix => vec![
                prop("height", POSITIVE, Some("2")),
                prop("plot_type", PropKind::Choice(&["matrix", "lines"]), Some("matrix")),
                prop("colormap", PropKind::Str, Some("viridis")),
                prop("color", PropKind::Str, Some("#1f78b4")),
                prop("line_width", POSITIVE, Some("0.5")),
                prop("pos_score_in_bin", PropKind::Choice(&["center", "block"]), Some("center")),
                prop("show_data_range", PropKind::Bool, Some("true")),
                prop("plot_horizontal_lines", PropKind::Bool, Some("false")),
                prop("min_value", ANY_FLOAT, None),
                prop("max_value", ANY_FLOAT, None),
                prop("rasterize", PropKind::Bool, Some("false")),
            ],
            FileType::Bed | FileType::Gtf => {
                let mut p = vec![
                    prop("height", POSITIVE, Some("2")),
                    prop("style", PropKind::Choice(&["flybase", "UCSC", "tssarrow"]), Some("flybase")),
                    prop(
                        "display",
                        PropKind::Choice(&["stacked", "collapsed", "interleaved", "triangles"]),
                        Some("stacked"),
                    ),
                    prop("color", PropKind::Str, Some("#1f78b4")),
                    prop("border_color", PropKind::Str, Some("black")),
                    prop("labels", PropKind::Bool, Some("true")),
                    prop("fontsize", POSITIVE, Some("12")),
                    prop("gene_rows", PropKind::Int { min: 1, max: i64::MAX }, None),
                    prop("max_labels", PropKind::Int { min: 0, max: i64::MAX }, Some("60")),
                    prop("arrow_interval", POSITIVE, Some("2")),
                    prop("arrowhead_included", PropKind::Bool, Some("false")),
                    prop("color_utr", PropKind::Str, Some("grey")),
                    prop("height_utr", UNIT, Some("1")),
                    prop("all_labels_inside", PropKind::Bool, Some("false")),
                    prop("labels_in_margin", PropKind::Bool, Some("false")),
                    prop("color_backbone", PropKind::Str, None),
                    prop("line_width", POSITIVE, Some("0.5")),
                    prop("global_max_row", PropKind::Bool, Some("false")),
                    prop("min_value", ANY_FLOAT, None),
                    prop("max_value", ANY_FLOAT, None),
                ];
                if file_type == FileType::Gtf {
                    p.push(prop("prefered_name", PropKind::Str, Some("transcript_name")));
                    p.push(prop("merge_transcripts", PropKind::Bool, Some("false")));
                }
                p
            }
            FileType::NarrowPeak => vec![
                prop("height", POSITIVE, Some("2")),
                prop("type", PropKind::Choice(&["peak", "box"]), Some("peak")),
                prop("color", PropKind::Str, Some("#FF000080")),
                prop("show_labels", PropKind::Bool, Some("true")),
                prop("use_summit", PropKind::Bool, Some("true")),
                prop("width_adjust", PropKind::Float { min: 0.0, max: f64::INFINITY }, Some("1.5")),
                prop("max_value", ANY_FLOAT, None),
                prop("show_data_range", PropKind::Bool, Some("true")),
                prop("line_width", POSITIVE, Some("1")),
                prop("fontsize", POSITIVE, Some("10")),
            ],
            FileType::Links => vec![
                prop("height", POSITIVE, Some("2")),
                prop("links_type", PropKind::Choice(&["arcs", "triangles", "loops", "squares"]), Some("arcs")),
                prop("color", PropKind::Str, Some("blue")),
                prop("alpha", UNIT, Some("0.8")),
                prop("line_width", POSITIVE, Some("1")),
                prop("line_style", LINE_STYLES, Some("solid")),
                prop("use_middle", PropKind::Bool, Some("false")),
                prop("compact_arcs_level", PropKind::Choice(&["0", "1", "2"]), Some("0")),
                prop("ylim", POSITIVE, None),
                prop("region_only", PropKind::Bool, Some("false")),
                prop("min_value", ANY_FLOAT, None),
                prop("max_value", ANY_FLOAT, None),
            ],
            FileType::HicMatrix => vec![
                prop("depth", PropKind::Int { min: 1, max: i64::MAX }, Some("100000")),
                prop("colormap", PropKind::Str, Some("RdYlBu_r")),
                prop("transform", PropKind::Choice(&["no", "log1p", "log", "-log"]), Some("no")),
                prop("min_value", ANY_FLOAT, None),
                prop("max_value", ANY_FLOAT, None),
                prop("show_masked_bins", PropKind::Bool, Some("false")),
                prop("scale_factor", ANY_FLOAT, Some("1")),
            ],
            FileType::Maf => {
                required.push("reference");
                vec![
                    prop("height", POSITIVE, Some("3")),
                    prop("reference", PropKind::Str, None),
                    prop("species_order", PropKind::Str, None),
                    prop("species_labels", PropKind::Str, None),
                    prop("color_identical", PropKind::Str, Some("black")),
                    prop("color_mismatch", PropKind::Str, Some("grey")),
                    prop("color_gap", PropKind::Str, Some("lightgrey")),
                ]
            }
            FileType::XAxis => vec![
                prop("height", POSITIVE, Some("2")),
                prop("where", PropKind::Choice(&["top", "bottom"]), Some("bottom")),
                prop("fontsize", POSITIVE, None),
            ],
            FileType::Spacer => vec![prop("height", POSITIVE, Some("1"))],
            FileType::Vlines => vec![
                prop("type", PropKind::Str, None),
                prop("color", PropKind::Str, Some("black")),
                prop("alpha", UNIT, Some("1")),
                prop("line_width", POSITIVE, Some("0.5")),
                prop("line_style", LINE_STYLES, Some("dashed")),
                prop("use_end", PropKind::Bool, Some("false")),
            ],
            FileType::Hlines => {
                required.push("y_values");
                vec![
                    prop("height", POSITIVE, Some("1.5")),
                    prop("type", PropKind::Str, None),
                    prop("y_values", PropKind::Str, None),
                    prop("min_value", ANY_FLOAT, None),
                    prop("max_value", ANY_FLOAT, None),
                    prop("color", PropKind::Str, Some("black")),
                    prop("alpha", UNIT, Some("1")),
                    prop("line_width", POSITIVE, Some("0.5")),
                    prop("line_style", LINE_STYLES, Some("solid")),
                    prop("show_data_range", PropKind::Bool, Some("true")),
                ]
            }
        };

        // Type-specific entries replace the common ones of the same name.
        for spec in specific {
            match props.iter_mut().find(|p| p.name == spec.name) {
                Some(existing) => *existing = spec,
                None => props.push(spec),
            }
        }
        Self { file_type, required, props }
    }

    pub fn get(&self, name: &str) -> Option<&PropSpec> {
        self.props.iter().find(|p| p.name == name)
    }
}

/// Work out the track type of a section.
pub fn resolve_file_type(section: &TrackSection) -> Result<FileType, ConfigError> {
    if let Some(explicit) = section.get("file_type") {
        return FileType::parse(explicit)
            .ok_or_else(|| ConfigError::property(&section.name, format!("unknown file_type '{}'", explicit)));
    }
    let name = section.name.to_lowercase();
    if name.contains("x-axis") {
        return Ok(FileType::XAxis);
    }
    if name.starts_with("spacer") {
        return Ok(FileType::Spacer);
    }
    match section.get("type").map(|t| t.trim().to_lowercase()) {
        Some(t) if t == "vlines" => return Ok(FileType::Vlines),
        Some(t) if t == "hlines" => return Ok(FileType::Hlines),
        _ => {}
    }
    if section.get("y_values").is_some() {
        return Ok(FileType::Hlines);
    }

    let Some(file) = section.get("file") else {
        return Err(ConfigError::MissingProperty { section: section.name.clone(), property: "file".to_string() });
    };
    FileType::from_extension(Path::new(file))
        .ok_or_else(|| ConfigError::UnknownFileType { section: section.name.clone(), file: file.to_string() })
}

/// Rewrite shorthand forms into their canonical properties.
pub fn expand_shorthand(
    file_type: FileType,
    section: &str,
    options: &mut IndexMap<String, String>,
) -> Result<(), ConfigError> {
    for key in ["min_value", "max_value"] {
        if options.get(key).is_some_and(|v| v.trim().eq_ignore_ascii_case("auto")) {
            options.shift_remove(key);
        }
    }

    match file_type {
        FileType::Bigwig | FileType::Bedgraph => {
            let Some(value) = options.shift_remove("type") else {
                return Ok(());
            };
            let (kind, size) = match value.split_once(':') {
                Some((kind, size)) => (kind.trim().to_lowercase(), Some(size.trim().to_string())),
                None => (value.trim().to_lowercase(), None),
            };
            match (kind.as_str(), size) {
                ("line", Some(width)) => {
                    options.insert("line_width".to_string(), width);
                }
                ("points", Some(size)) => {
                    options.insert("point_size".to_string(), size);
                }
                ("fill" | "line" | "points" | "heatmap", None) => {}
                _ => return Err(ConfigError::property(section, format!("invalid type '{}'", value))),
            }
            options.insert("plot_type".to_string(), kind);
        }
        FileType::BedgraphMatrix => {
            if let Some(value) = options.shift_remove("type") {
                let kind = value.trim().to_lowercase();
                if kind != "matrix" && kind != "lines" {
                    return Err(ConfigError::property(section, format!("invalid type '{}'", value)));
                }
                options.insert("plot_type".to_string(), kind);
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Str(String),
    Float(f64),
    Int(i64),
}

fn parse_value(section: &str, spec: &PropSpec, raw: &str) -> Result<PropValue, ConfigError> {
    let raw = raw.trim();
    let invalid = |expected: &str| {
        ConfigError::property(section, format!("'{}' must be {}, found '{}'", spec.name, expected, raw))
    };
    match spec.kind {
        PropKind::Bool => parse_bool(raw).map(PropValue::Bool).ok_or_else(|| invalid("a boolean")),
        PropKind::Str => Ok(PropValue::Str(raw.to_string())),
        PropKind::Float { min, max } => {
            let v: f64 = raw.parse().map_err(|_| invalid("a number"))?;
            if !v.is_finite() {
                return Err(invalid("a finite number"));
            }
            if v < min || v > max {
                return Err(invalid(&format!("within [{}, {}]", min, max)));
            }
            Ok(PropValue::Float(v))
        }
        PropKind::Int { min, max } => {
            let v: i64 = raw.parse().map_err(|_| invalid("an integer"))?;
            if v < min || v > max {
                return Err(invalid(&format!("within [{}, {}]", min, max)));
            }
            Ok(PropValue::Int(v))
        }
        PropKind::Choice(choices) => choices
            .iter()
            .find(|c| c.eq_ignore_ascii_case(raw))
            .map(|c| PropValue::Str(c.to_string()))
            .ok_or_else(|| invalid(&format!("one of {}", choices.join("|")))),
    }
}

/// Validated properties of one track.
#[derive(Debug, Clone)]
pub struct TrackProperties {
    pub section: String,
    pub file_type: FileType,
    values: IndexMap<String, PropValue>,
}

impl TrackProperties {
    pub fn from_section(section: &TrackSection) -> Result<Self, ConfigError> {
        let file_type = resolve_file_type(section)?;
        let schema = TrackSchema::for_type(file_type);
        let mut options = section.options.clone();
        expand_shorthand(file_type, &section.name, &mut options)?;

        let mut values = IndexMap::new();
        for spec in &schema.props {
            if let Some(default) = spec.default {
                values.insert(spec.name.to_string(), parse_value(&section.name, spec, default)?);
            }
        }
        for (key, raw) in &options {
            match schema.get(key) {
                Some(spec) => {
                    values.insert(key.clone(), parse_value(&section.name, spec, raw)?);
                }
                None => {
                    log::warn!("[{}]: unknown property '{}' for {} tracks", section.name, key, file_type);
                    values.insert(key.clone(), PropValue::Str(raw.clone()));
                }
            }
        }

        for required in &schema.required {
            if !values.contains_key(*required) {
                return Err(ConfigError::MissingProperty {
                    section: section.name.clone(),
                    property: required.to_string(),
                });
            }
        }

        let props = Self { section: section.name.clone(), file_type, values };
        if let Some(file) = props.file() {
            if file_type.needs_file() && !file.exists() {
                return Err(ConfigError::FileNotFound { section: section.name.clone(), path: file });
            }
        }
        Ok(props)
    }

    /// Properties with only defaults; used for tracks built in code.
    pub fn with_defaults(section: &str, file_type: FileType) -> Self {
        let mut values = IndexMap::new();
        for spec in TrackSchema::for_type(file_type).props {
            if let Some(default) = spec.default {
                if let Ok(v) = parse_value(section, &spec, default) {
                    values.insert(spec.name.to_string(), v);
                }
            }
        }
        Self { section: section.to_string(), file_type, values }
    }

    pub fn set(&mut self, key: &str, value: PropValue) -> &mut Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn bool(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(PropValue::Bool(true)))
    }

    pub fn opt_f64(&self, key: &str) -> Option<f64> {
        match self.values.get(key)? {
            PropValue::Float(v) => Some(*v),
            PropValue::Int(v) => Some(*v as f64),
            PropValue::Str(s) => s.parse().ok(),
            PropValue::Bool(_) => None,
        }
    }

    pub fn f64(&self, key: &str) -> f64 {
        self.opt_f64(key).unwrap_or(0.0)
    }

    pub fn opt_i64(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            PropValue::Int(v) => Some(*v),
            PropValue::Float(v) => Some(*v as i64),
            PropValue::Str(s) => s.parse().ok(),
            PropValue::Bool(_) => None,
        }
    }

    pub fn i64(&self, key: &str) -> i64 {
        self.opt_i64(key).unwrap_or(0)
    }

    pub fn opt_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            PropValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn str(&self, key: &str) -> &str {
        self.opt_str(key).unwrap_or("")
    }

    pub fn file(&self) -> Option<PathBuf> {
        self.opt_str("file").filter(|f| !f.is_empty()).map(PathBuf::from)
    }

    /// The data file, or an error naming the section.
    pub fn require_file(&self) -> Result<PathBuf, ConfigError> {
        self.file().ok_or_else(|| ConfigError::MissingProperty {
            section: self.section.clone(),
            property: "file".to_string(),
        })
    }

    pub fn title(&self) -> &str {
        self.str("title")
    }

    pub fn height(&self) -> Option<f64> {
        self.opt_f64("height")
    }

    pub fn overlay(&self) -> OverlayMode {
        OverlayMode::parse(self.str("overlay_previous")).unwrap_or_default()
    }

    /// `Some(true)` only when `orientation = inverted` was configured.
    pub fn orientation_inverted(&self) -> Option<bool> {
        self.opt_str("orientation").map(|o| o == "inverted")
    }
}

/// Validate every section of a tracks file in order.
pub fn load_track_properties(tracks: &TracksFile) -> Result<Vec<TrackProperties>, ConfigError> {
    tracks.sections.iter().map(TrackProperties::from_section).collect()
}
