//! `.pptx` previews via `zip` + `quick-xml`, gated behind the `pptx` feature.
//!
//! For every slide the preview lists the visible shape text and the speaker
//! notes. Slides with neither get a hint that they are probably image-only.

use std::path::Path;

/// Appended to slides with no text and no speaker notes.
pub const IMAGE_ONLY_NOTE: &str =
    "NOTE: This slide may be mostly images/screenshots. Add speaker notes or a captions doc.";

/// Handle proving presentation support is compiled in.
#[derive(Debug, Clone, Copy)]
pub struct PresentationReader {
    _private: (),
}

impl PresentationReader {
    /// `Some` when the `pptx` feature is enabled.
    pub fn detect() -> Option<Self> {
        cfg!(feature = "pptx").then_some(Self { _private: () })
    }

    /// Per-slide text and notes preview. Never fails.
    pub fn preview(&self, path: &Path) -> String {
        imp::preview(path)
    }
}

/// Render one slide's section of the preview.
pub fn render_slide(number: usize, texts: &[String], notes: &str) -> String {
    let mut parts = vec![format!("--- Slide {number} ---")];

    if texts.is_empty() {
        parts.push("SLIDE TEXT: (none detected)".to_string());
    } else {
        parts.push(format!("SLIDE TEXT:\n{}", texts.join("\n")));
    }

    if notes.is_empty() {
        parts.push("SPEAKER NOTES: (none)".to_string());
    } else {
        parts.push(format!("SPEAKER NOTES:\n{notes}"));
    }

    if texts.is_empty() && notes.is_empty() {
        parts.push(IMAGE_ONLY_NOTE.to_string());
    }

    parts.join("\n")
}

#[cfg(feature = "pptx")]
mod imp {
    use std::fs::File;
    use std::io::{Read, Seek};
    use std::path::Path;
    use std::sync::LazyLock;

    use quick_xml::Reader;
    use quick_xml::events::{BytesStart, Event};
    use regex::Regex;
    use tracing::{debug, warn};
    use zip::ZipArchive;

    use super::render_slide;

    const NOTES_SLIDE_REL: &str = "/notesSlide";
    const SLIDE_REL: &str = "/slide";

    pub(super) fn preview(path: &Path) -> String {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => return crate::unreadable(path, &e),
        };
        let mut archive = match ZipArchive::new(file) {
            Ok(a) => a,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "presentation unreadable");
                return crate::unreadable(path, &e);
            }
        };

        let slides = slide_parts(&mut archive);
        debug!(slides = slides.len(), "previewing presentation");
        if slides.is_empty() {
            return "(Presentation contains no slides)".to_string();
        }

        slides
            .iter()
            .enumerate()
            .map(|(i, part)| {
                let texts: Vec<String> = read_part(&mut archive, part)
                    .map(|xml| {
                        shapes(&xml)
                            .into_iter()
                            .map(|s| s.text)
                            .filter(|t| !t.is_empty())
                            .collect()
                    })
                    .unwrap_or_default();
                let notes = notes_part(&mut archive, part)
                    .and_then(|notes| read_part(&mut archive, &notes))
                    .map(|xml| notes_text(&xml))
                    .unwrap_or_default();
                render_slide(i + 1, &texts, &notes)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // -----------------------------------------------------------------------
    // Package structure
    // -----------------------------------------------------------------------

    /// Slide part names in presentation order.
    ///
    /// Order comes from `ppt/presentation.xml`; decks without a usable slide
    /// list fall back to the numeric order of `ppt/slides/slideN.xml`.
    fn slide_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Vec<String> {
        let ordered = slide_parts_from_presentation(archive);
        if !ordered.is_empty() {
            return ordered;
        }

        static SLIDE_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("valid regex")
        });

        let mut numbered: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| {
                let caps = SLIDE_PART_RE.captures(name)?;
                let n = caps[1].parse().ok()?;
                Some((n, name.to_string()))
            })
            .collect();
        numbered.sort();
        numbered.into_iter().map(|(_, name)| name).collect()
    }

    fn slide_parts_from_presentation<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Vec<String> {
        let Some(xml) = read_part(archive, "ppt/presentation.xml") else {
            return Vec::new();
        };
        let Some(rels_xml) = read_part(archive, "ppt/_rels/presentation.xml.rels") else {
            return Vec::new();
        };
        let rels = relationships(&rels_xml);

        let mut ids = Vec::new();
        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event() {
                Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"sldId" => {
                    if let Some(id) = attr(&e, "r:id") {
                        ids.push(id);
                    }
                }
                Ok(Event::Eof) | Err(_) => break,
                _ => {}
            }
        }

        ids.iter()
            .filter_map(|id| {
                rels.iter()
                    .find(|r| &r.id == id && r.rel_type.ends_with(SLIDE_REL))
                    .map(|r| resolve_target("ppt", &r.target))
            })
            .filter(|part| archive.by_name(part).is_ok())
            .collect()
    }

    /// The notes slide related to `slide_part`, if any.
    fn notes_part<R: Read + Seek>(archive: &mut ZipArchive<R>, slide_part: &str) -> Option<String> {
        let (dir, file) = slide_part.rsplit_once('/')?;
        let rels_xml = read_part(archive, &format!("{dir}/_rels/{file}.rels"))?;
        relationships(&rels_xml)
            .into_iter()
            .find(|r| r.rel_type.ends_with(NOTES_SLIDE_REL))
            .map(|r| resolve_target(dir, &r.target))
    }

    fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<String> {
        let mut entry = archive.by_name(name).ok()?;
        let mut xml = String::new();
        match entry.read_to_string(&mut xml) {
            Ok(_) => Some(xml),
            Err(e) => {
                warn!(part = name, error = %e, "package part unreadable");
                None
            }
        }
    }

    #[derive(Debug)]
    struct Relationship {
        id: String,
        rel_type: String,
        target: String,
    }

    fn relationships(xml: &str) -> Vec<Relationship> {
        let mut out = Vec::new();
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(Event::Start(e) | Event::Empty(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    if let (Some(id), Some(rel_type), Some(target)) =
                        (attr(&e, "Id"), attr(&e, "Type"), attr(&e, "Target"))
                    {
                        out.push(Relationship {
                            id,
                            rel_type,
                            target,
                        });
                    }
                }
                Ok(Event::Eof) | Err(_) => break,
                _ => {}
            }
        }
        out
    }

    fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
        let attribute = e.try_get_attribute(key).ok()??;
        attribute.unescape_value().ok().map(|v| v.into_owned())
    }

    /// Resolve a relationship target against the directory of its source part.
    pub(super) fn resolve_target(base_dir: &str, target: &str) -> String {
        if let Some(absolute) = target.strip_prefix('/') {
            return absolute.to_string();
        }
        let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
        for segment in target.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        segments.join("/")
    }

    // -----------------------------------------------------------------------
    // Shape text
    // -----------------------------------------------------------------------

    /// Text of one `<p:sp>` shape plus its placeholder type, if it is one.
    #[derive(Debug, Default)]
    pub(super) struct ShapeText {
        pub placeholder: Option<String>,
        pub text: String,
    }

    /// Collect the trimmed text of every shape in a slide or notes part.
    ///
    /// Paragraphs are separated by newlines and `<a:br/>` becomes a newline.
    /// Malformed XML ends the scan; whatever was collected so far is kept.
    pub(super) fn shapes(xml: &str) -> Vec<ShapeText> {
        let mut reader = Reader::from_str(xml);
        let mut out = Vec::new();

        let mut shape: Option<(ShapeText, Vec<String>)> = None;
        let mut paragraph = String::new();
        let mut in_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"sp" => shape = Some((ShapeText::default(), Vec::new())),
                    b"p" => paragraph.clear(),
                    b"t" => in_text = true,
                    b"ph" => set_placeholder(&mut shape, &e),
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"br" => paragraph.push('\n'),
                    b"ph" => set_placeholder(&mut shape, &e),
                    _ => {}
                },
                Ok(Event::Text(t)) if in_text => {
                    if let Ok(text) = t.unescape() {
                        paragraph.push_str(&text);
                    }
                }
                Ok(Event::CData(t)) if in_text => {
                    paragraph.push_str(&String::from_utf8_lossy(&t));
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"p" => {
                        if let Some((_, paragraphs)) = shape.as_mut() {
                            paragraphs.push(std::mem::take(&mut paragraph));
                        }
                    }
                    b"sp" => {
                        if let Some((mut finished, paragraphs)) = shape.take() {
                            finished.text = paragraphs.join("\n").trim().to_string();
                            out.push(finished);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    debug!(error = %e, "stopping at malformed slide xml");
                    break;
                }
                _ => {}
            }
        }

        out
    }

    fn set_placeholder(shape: &mut Option<(ShapeText, Vec<String>)>, e: &BytesStart<'_>) {
        if let Some((current, _)) = shape.as_mut() {
            // A placeholder without a type attribute is a body-type object placeholder.
            current.placeholder = Some(attr(e, "type").unwrap_or_else(|| "obj".to_string()));
        }
    }

    /// Speaker notes live in the notes slide's body placeholder.
    pub(super) fn notes_text(xml: &str) -> String {
        shapes(xml)
            .into_iter()
            .find(|s| s.placeholder.as_deref() == Some("body"))
            .map(|s| s.text)
            .unwrap_or_default()
    }
}

#[cfg(not(feature = "pptx"))]
mod imp {
    use std::path::Path;

    pub(super) fn preview(_path: &Path) -> String {
        crate::PRESENTATION_UNAVAILABLE.to_string()
    }
}
