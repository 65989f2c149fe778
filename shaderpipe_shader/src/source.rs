//! Splitting a combined shader file into its stages.
//!
//! The file format is about as simple as it gets. Any line containing `#shader` followed by a
//! stage keyword is a tag line, and every line after it (up to the next tag line) belongs to
//! that stage:
//!
//! ```text
//! #shader vertex
//! #version 330 core
//! layout(location = 0) in vec4 position;
//! void main() { gl_Position = position; }
//!
//! #shader fragment
//! #version 330 core
//! layout(location = 0) out vec4 color;
//! void main() { color = vec4(1.0, 0.0, 0.0, 1.0); }
//! ```
//!
//! Tag lines themselves never end up in a stage. Lines that come before the first tag line go to
//! the [`ShaderStageKind::Unknown`] bucket, which nothing downstream reads, so a file without
//! any tags quietly produces empty stages. Tags may repeat; a stage seen twice keeps
//! accumulating lines rather than starting over.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::error::ShaderError;

/// The literal that marks a tag line.
pub const TAG_MARKER: &str = "#shader";

/// One stage of the shader pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShaderStageKind {
    /// Where lines go before any tag line has been seen. Never compiled.
    Unknown,
    Vertex,
    Fragment,
    Geometry,
}

lazy_static! {
    /// Tag keywords, in the order they are tried against a tag line.
    static ref STAGE_KEYWORDS: [(&'static str, ShaderStageKind); 3] = [
        ("vertex", ShaderStageKind::Vertex),
        ("fragment", ShaderStageKind::Fragment),
        ("geometry", ShaderStageKind::Geometry),
    ];
}

impl ShaderStageKind {
    /// Works out which stage a tag line selects. Returns `None` if the line isn't a tag line,
    /// i.e. it has no `#shader` marker or no known keyword after the marker.
    pub fn from_tag_line(line: &str) -> Option<Self> {
        let marker = line.find(TAG_MARKER)?;
        let rest = &line[marker + TAG_MARKER.len()..];

        STAGE_KEYWORDS.iter()
            .find(|(keyword, _)| rest.contains(keyword))
            .map(|(_, kind)| *kind)
    }

    /// The tag keyword for this stage. `Unknown` has none.
    pub fn keyword(self) -> Option<&'static str> {
        STAGE_KEYWORDS.iter()
            .find(|(_, kind)| *kind == self)
            .map(|(keyword, _)| *keyword)
    }
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword().unwrap_or("unknown"))
    }
}

impl FromStr for ShaderStageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STAGE_KEYWORDS.iter()
            .find(|(keyword, _)| *keyword == s)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| format!("unknown shader stage \"{}\"", s))
    }
}

/// The per-stage source text pulled out of one shader file.
///
/// There is at most one buffer per stage kind, and lines sit in it in file order. Asking for a
/// stage that never got any lines gives back an empty string rather than an error, so the vertex
/// and fragment sources are always there to hand to the builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSourceDocument {
    buffers: BTreeMap<ShaderStageKind, String>,
}

impl ShaderSourceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line of source to a stage, plus the newline that reading it stripped off.
    pub fn push_line(&mut self, stage: ShaderStageKind, line: &str) {
        let buffer = self.buffers.entry(stage).or_insert_with(String::new);
        buffer.push_str(line);
        buffer.push('\n');
    }

    /// The source text routed to `stage`, or `""` if nothing was.
    pub fn source(&self, stage: ShaderStageKind) -> &str {
        self.buffers.get(&stage).map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self, stage: ShaderStageKind) -> bool {
        self.source(stage).is_empty()
    }

    /// Takes a stage's buffer out of the document, leaving it empty.
    pub fn take(&mut self, stage: ShaderStageKind) -> String {
        self.buffers.remove(&stage).unwrap_or_default()
    }

    /// The usable stages, in pipeline order. `Unknown` and empty stages are skipped.
    pub fn stages(&self) -> impl Iterator<Item = (ShaderStageKind, &str)> {
        self.buffers.iter()
            .filter(|(kind, text)| **kind != ShaderStageKind::Unknown && !text.is_empty())
            .map(|(kind, text)| (*kind, text.as_str()))
    }

    /// Writes the usable stages back out as a single tagged file.
    ///
    /// Repeated tags are merged, so this is only the inverse of parsing for files that tag each
    /// stage once.
    pub fn to_tagged_string(&self) -> String {
        let mut out = String::new();
        for (kind, text) in self.stages() {
            out.push_str(TAG_MARKER);
            out.push(' ');
            out.push_str(kind.keyword().unwrap_or_default());
            out.push('\n');
            out.push_str(text);
        }
        out
    }
}

/// Routes lines to stages one at a time.
///
/// The parser only remembers which stage the last tag line selected; everything else goes
/// straight into the document.
#[derive(Debug, Default)]
pub struct ShaderSourceParser {
    current: Option<ShaderStageKind>,
    document: ShaderSourceDocument,
}

impl ShaderSourceParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stage the next non-tag line would go to.
    pub fn current_stage(&self) -> ShaderStageKind {
        self.current.unwrap_or(ShaderStageKind::Unknown)
    }

    pub fn feed_line(&mut self, line: &str) {
        if let Some(kind) = ShaderStageKind::from_tag_line(line) {
            debug!("tag line selects {} stage", kind);
            self.current = Some(kind);
            return;
        }

        if line.contains(TAG_MARKER) {
            warn!("\"{}\" has no recognised stage keyword; keeping it as {} source",
                  line.trim(), self.current_stage());
        }

        let stage = self.current_stage();
        self.document.push_line(stage, line);
    }

    pub fn finish(self) -> ShaderSourceDocument {
        self.document
    }
}

/// Reads and splits a shader file.
///
/// Unlike a lot of tutorial code this does *not* pretend an unreadable file is an empty one; a
/// missing file, a permissions problem or invalid UTF-8 all come back as
/// [`ShaderError::FileUnreadable`].
pub fn parse<P: AsRef<Path>>(path: P) -> Result<ShaderSourceDocument, ShaderError> {
    let path = path.as_ref();
    let unreadable = |source| ShaderError::FileUnreadable { path: path.to_path_buf(), source };

    // The file is closed when the reader goes out of scope, error or not
    let file = File::open(path).map_err(unreadable)?;
    let document = parse_reader(BufReader::new(file)).map_err(unreadable)?;

    debug!("parsed {}: {} usable stage(s)", path.display(), document.stages().count());
    Ok(document)
}

/// Splits shader source from any buffered reader.
pub fn parse_reader<R: BufRead>(reader: R) -> io::Result<ShaderSourceDocument> {
    let mut parser = ShaderSourceParser::new();
    for line in reader.lines() {
        parser.feed_line(&line?);
    }
    Ok(parser.finish())
}

/// Splits shader source that's already in memory.
pub fn parse_str(text: &str) -> ShaderSourceDocument {
    let mut parser = ShaderSourceParser::new();
    text.lines().for_each(|line| parser.feed_line(line));
    parser.finish()
}
