//! DICOM data dumping library
//!
//! This is a helper library for dumping the contents of DICOM objects
//! and elements in a human readable way.
//!
//! A quick and easy way to dump the contents of a DICOM object is via
//! [`dump_file`] (or [`dump_file_to`] to print to an arbitrary writer).
//! See the [`DumpOptions`] builder for additional dumping options.

use std::fmt::{self, Display, Formatter};
use std::io::{stdout, Result as IoResult, Write};
use std::str::FromStr;

use owo_colors::{OwoColorize, Stream};
use rdcm_core::{Header, PrimitiveValue, Tag, Value};
use rdcm_object::{DicomFile, FileMetaTable, InMemDicomObject};

/// An enum of all supported output formats for dumping DICOM data.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq, Default)]
#[non_exhaustive]
pub enum DumpFormat {
    /// The main dump format: human readable, displaying tag, alias,
    /// VR and value of each element.
    #[default]
    Main,
}

/// Options and flags to configure how to dump a DICOM file or object.
///
/// Once set up, [`DumpOptions::dump_file`] or [`DumpOptions::dump_object`]
/// finalize the dumping process.
///
/// # Example
///
/// ```no_run
/// use rdcm_object::file::DicomFile;
/// use rdcm_dump::DumpOptions;
///
/// let file = DicomFile::open("path/to/file.dcm")?;
/// DumpOptions::new().width(100).dump_file(&file)?;
/// # Result::<(), Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
#[non_exhaustive]
pub struct DumpOptions {
    pub format: DumpFormat,
    pub color: ColorMode,
    pub width: Option<u32>,
    pub no_text_limit: bool,
    pub no_limit: bool,
}

impl DumpOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn format(&mut self, format: DumpFormat) -> &mut Self {
        self.format = format;
        self
    }

    pub fn width(&mut self, width: u32) -> &mut Self {
        self.width = Some(width);
        self
    }

    pub fn width_auto(&mut self) -> &mut Self {
        self.width = None;
        self
    }

    pub fn no_text_limit(&mut self, no_text_limit: bool) -> &mut Self {
        self.no_text_limit = no_text_limit;
        self
    }

    pub fn no_limit(&mut self, no_limit: bool) -> &mut Self {
        self.no_limit = no_limit;
        self
    }

    pub fn color_mode(&mut self, color: ColorMode) -> &mut Self {
        self.color = color;
        self
    }

    /// Dump the file meta group and main data set of an open DICOM file
    /// to standard output.
    pub fn dump_file(&self, file: &DicomFile) -> IoResult<()> {
        self.dump_file_impl(stdout(), file, true)
    }

    /// Dump the file meta group and main data set of an open DICOM file
    /// to the given writer.
    pub fn dump_file_to(&self, to: impl Write, file: &DicomFile) -> IoResult<()> {
        self.dump_file_impl(to, file, false)
    }

    fn dump_file_impl(&self, mut to: impl Write, file: &DicomFile, to_stdout: bool) -> IoResult<()> {
        self.set_color_override(to_stdout);

        let width = determine_width(self.width);
        let (no_text_limit, no_limit) = self.effective_limits(to_stdout);

        meta_dump(&mut to, file.meta(), if no_limit { u32::MAX } else { width })?;
        writeln!(to, "{:-<58}", "")?;
        dump(&mut to, file.dataset(), width, 0, no_text_limit, no_limit)
    }

    /// Dump the contents of a bare DICOM object (no file meta group)
    /// to standard output.
    pub fn dump_object(&self, obj: &InMemDicomObject) -> IoResult<()> {
        self.dump_object_impl(stdout(), obj, true)
    }

    /// Dump the contents of a bare DICOM object to the given writer.
    pub fn dump_object_to(&self, to: impl Write, obj: &InMemDicomObject) -> IoResult<()> {
        self.dump_object_impl(to, obj, false)
    }

    fn dump_object_impl(&self, mut to: impl Write, obj: &InMemDicomObject, to_stdout: bool) -> IoResult<()> {
        self.set_color_override(to_stdout);
        let width = determine_width(self.width);
        let (no_text_limit, no_limit) = self.effective_limits(to_stdout);
        dump(&mut to, obj, width, 0, no_text_limit, no_limit)
    }

    fn set_color_override(&self, to_stdout: bool) {
        match (self.color, to_stdout) {
            (ColorMode::Never, _) => owo_colors::set_override(false),
            (ColorMode::Always, _) => owo_colors::set_override(true),
            (ColorMode::Auto, false) => owo_colors::set_override(false),
            (ColorMode::Auto, true) => owo_colors::unset_override(),
        }
    }

    fn effective_limits(&self, to_stdout: bool) -> (bool, bool) {
        if to_stdout {
            (self.no_text_limit, self.no_limit)
        } else {
            (true, true)
        }
    }
}

/// Enumeration of output coloring modes.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ColorMode {
    /// Produce colored output only if the destination supports it
    /// (namely, a terminal). This is the default behavior.
    #[default]
    Auto,
    /// Never produce colored output.
    Never,
    /// Always produce colored output.
    Always,
}

impl Display for ColorMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Never => f.write_str("never"),
            ColorMode::Auto => f.write_str("auto"),
            ColorMode::Always => f.write_str("always"),
        }
    }
}

impl FromStr for ColorMode {
    type Err = ColorModeError;

    fn from_str(color: &str) -> Result<Self, Self::Err> {
        match color {
            "never" => Ok(ColorMode::Never),
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            _ => Err(ColorModeError),
        }
    }
}

/// The error raised when providing an invalid color mode.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct ColorModeError;

impl Display for ColorModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("invalid color mode")
    }
}

impl std::error::Error for ColorModeError {}

/// Dump the contents of a DICOM file (meta group and data set) to
/// standard output.
pub fn dump_file(file: &DicomFile) -> IoResult<()> {
    DumpOptions::new().dump_file(file)
}

/// Dump the contents of a DICOM file to the given writer.
pub fn dump_file_to(to: impl Write, file: &DicomFile) -> IoResult<()> {
    DumpOptions::new().dump_file_to(to, file)
}

/// Dump the contents of a bare DICOM object to standard output.
pub fn dump_object(obj: &InMemDicomObject) -> IoResult<()> {
    DumpOptions::new().dump_object(obj)
}

/// Dump the contents of a bare DICOM object to the given writer.
pub fn dump_object_to(to: impl Write, obj: &InMemDicomObject) -> IoResult<()> {
    DumpOptions::new().dump_object_to(to, obj)
}

fn meta_dump(to: &mut impl Write, meta: &FileMetaTable, width: u32) -> IoResult<()> {
    writeln!(to, "{:-<58}", "File Meta ")?;
    writeln!(
        to,
        "Media Storage SOP Class UID: {}",
        trim_to_width(&meta.media_storage_sop_class_uid, width)
    )?;
    writeln!(
        to,
        "Media Storage SOP Instance UID: {}",
        trim_to_width(&meta.media_storage_sop_instance_uid, width)
    )?;
    writeln!(to, "Transfer Syntax: {}", meta.transfer_syntax_uid)?;
    writeln!(to, "Implementation Class UID: {}", meta.implementation_class_uid)?;
    if let Some(name) = &meta.implementation_version_name {
        writeln!(to, "Implementation Version Name: {}", name)?;
    }
    if let Some(aet) = &meta.source_application_entity_title {
        writeln!(to, "Source Application Entity Title: {}", aet)?;
    }
    Ok(())
}

fn dump(
    to: &mut impl Write,
    obj: &InMemDicomObject,
    width: u32,
    depth: u32,
    no_text_limit: bool,
    no_limit: bool,
) -> IoResult<()> {
    let indent = "  ".repeat(depth as usize);
    for element in obj.iter() {
        let tag = element.tag();
        let vr = element.vr();
        let alias = rdcm_dictionary_std::entry_by_tag(tag).map(|e| e.alias).unwrap_or("");

        write!(to, "{indent}")?;
        write!(to, "{}", tag_display(tag))?;
        write!(to, " {}", alias_display(alias))?;
        write!(to, " {:?}", vr)?;

        match element.value() {
            Value::Primitive(v) => {
                writeln!(to, " {}", value_display(v, width, no_text_limit, no_limit))?;
            }
            Value::Sequence { items, .. } => {
                writeln!(to, " ({} item(s))", items.len())?;
                for (i, item) in items.iter().enumerate() {
                    writeln!(to, "{indent}  Item #{i}")?;
                    dump(to, item, width, depth + 2, no_text_limit, no_limit)?;
                }
            }
            Value::PixelSequence { fragments, .. } => {
                writeln!(to, " ({} fragment(s))", fragments.len())?;
            }
        }
    }
    Ok(())
}

fn tag_display(tag: Tag) -> impl Display {
    format!("{}", tag)
        .if_supports_color(Stream::Stdout, |v| v.dimmed())
        .to_string()
}

fn alias_display(alias: &str) -> impl Display {
    alias.if_supports_color(Stream::Stdout, |v| v.bold()).to_string()
}

fn value_display(value: &PrimitiveValue, width: u32, no_text_limit: bool, no_limit: bool) -> String {
    if matches!(value, PrimitiveValue::Empty) {
        return "(no value)"
            .if_supports_color(Stream::Stdout, |v| v.italic())
            .to_string();
    }

    let text = value.to_string();
    let limited = if no_limit || (is_textual(value) && no_text_limit) {
        text
    } else {
        trim_to_width(&text, width)
    };

    if is_textual(value) {
        limited.if_supports_color(Stream::Stdout, |v| v.yellow()).to_string()
    } else {
        limited.if_supports_color(Stream::Stdout, |v| v.cyan()).to_string()
    }
}

fn is_textual(value: &PrimitiveValue) -> bool {
    matches!(value, PrimitiveValue::Str(_) | PrimitiveValue::Strs(_))
}

fn trim_to_width(s: &str, width: u32) -> String {
    let max = width.max(4) as usize;
    if s.chars().count() > max {
        s.chars().take(max.saturating_sub(3)).chain("...".chars()).collect()
    } else {
        s.to_owned()
    }
}

fn determine_width(user_width: Option<u32>) -> u32 {
    user_width
        .or_else(|| terminal_size::terminal_size().map(|(w, _)| w.0 as u32))
        .unwrap_or(120)
}
