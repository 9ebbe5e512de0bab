//! URL template parsing.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use super::options::{TileLayerOptions, RETINA_SUFFIX};
use super::TemplateError;
use crate::coord::TileCoord;

/// Placeholder pattern: `{name}` with optional spaces inside the braces.
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{ *([\w -]+?) *\}").unwrap())
}

/// A tile-dependent placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    X,
    Y,
    /// `{-y}`, row counted from the south edge
    InvertedY,
    Z,
    /// `{s}`
    Subdomain,
    /// `{r}`
    Retina,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "-y" => Some(Self::InvertedY),
            "z" => Some(Self::Z),
            "s" => Some(Self::Subdomain),
            "r" => Some(Self::Retina),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A parsed URL template.
///
/// Custom placeholders are substituted during parsing, so the parsed form
/// only holds literals and tile-dependent placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Parse `template`, resolving custom placeholders from `options.extra`.
    pub fn parse(template: &str, options: &TileLayerOptions) -> Result<Self, TemplateError> {
        if template.trim().is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in placeholder_pattern().captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            literal.push_str(&template[last..whole.start()]);
            last = whole.end();

            let name = name.as_str();
            if let Some(placeholder) = Placeholder::from_name(name) {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(placeholder));
            } else if let Some(value) = options.extra.get(name) {
                literal.push_str(value);
            } else {
                return Err(TemplateError::UnknownPlaceholder {
                    name: name.to_string(),
                    template: template.to_string(),
                });
            }
        }

        literal.push_str(&template[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template string as given.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholders used by the template, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }

    /// Render the URL of `coord` with the given subdomain.
    pub(crate) fn render(
        &self,
        coord: &TileCoord,
        subdomain: &str,
        options: &TileLayerOptions,
    ) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(p) => {
                    // Writing into a String cannot fail
                    let _ = match p {
                        Placeholder::X => write!(out, "{}", coord.x),
                        Placeholder::Y if options.tms => {
                            write!(out, "{}", coord.inverted_y(options.tile_size))
                        }
                        Placeholder::Y => write!(out, "{}", coord.y),
                        Placeholder::InvertedY => {
                            write!(out, "{}", coord.inverted_y(options.tile_size))
                        }
                        Placeholder::Z => write!(out, "{}", coord.z),
                        Placeholder::Subdomain => {
                            out.push_str(subdomain);
                            Ok(())
                        }
                        Placeholder::Retina => {
                            if options.retina {
                                out.push_str(RETINA_SUFFIX);
                            }
                            Ok(())
                        }
                    };
                }
            }
        }
        out
    }
}

impl std::fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
