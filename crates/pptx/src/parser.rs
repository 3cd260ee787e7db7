//! Slide XML parsing: shape trees, slide ordering, and canvas dimensions.
//!
//! Only the top-level children of `p:spTree` become shapes; the contents of
//! group shapes are deliberately not descended into, so a picture inside a
//! group is never laid out on its own.

use deckfit_core::{Canvas, Error, Geometry, Result, Shape, ShapeKind, Slide};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Whether a `p:spTree` child element counts as a shape.
pub(crate) fn is_shape_tag(local: &[u8]) -> bool {
    matches!(
        local,
        b"sp" | b"pic" | b"graphicFrame" | b"cxnSp" | b"grpSp"
    )
}

/// Whether shapes with this tag can carry an `a:ln` outline of their own.
pub(crate) fn is_outline_capable(local: &[u8]) -> bool {
    matches!(local, b"sp" | b"pic" | b"cxnSp")
}

/// Parse an attribute as a signed EMU value.
fn attr_i64(e: &BytesStart, key: &[u8]) -> Option<i64> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| String::from_utf8_lossy(&a.value).parse().ok())
}

/// One top-level shape under construction while streaming its subtree.
struct ShapeBuilder {
    tag: Vec<u8>,
    off: Option<(i64, i64)>,
    ext: Option<(i64, i64)>,
    in_xfrm: bool,
    xfrm_done: bool,
    is_chart: bool,
}

impl ShapeBuilder {
    fn new(tag: Vec<u8>) -> Self {
        Self {
            tag,
            off: None,
            ext: None,
            in_xfrm: false,
            xfrm_done: false,
            is_chart: false,
        }
    }

    fn take_transform(&mut self, local: &[u8], e: &BytesStart) {
        if !self.in_xfrm {
            return;
        }
        match local {
            b"off" => {
                if let (Some(x), Some(y)) = (attr_i64(e, b"x"), attr_i64(e, b"y")) {
                    self.off = Some((x, y));
                }
            }
            b"ext" => {
                if let (Some(cx), Some(cy)) = (attr_i64(e, b"cx"), attr_i64(e, b"cy")) {
                    self.ext = Some((cx, cy));
                }
            }
            _ => {}
        }
    }

    fn check_graphic_data(&mut self, local: &[u8], e: &BytesStart) {
        if local != b"graphicData" {
            return;
        }
        if let Some(uri) = e
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == b"uri")
        {
            if String::from_utf8_lossy(&uri.value).contains("chart") {
                self.is_chart = true;
            }
        }
    }

    fn build(self) -> Shape {
        let kind = match self.tag.as_slice() {
            b"pic" => ShapeKind::Picture,
            b"graphicFrame" if self.is_chart => ShapeKind::Chart,
            _ => ShapeKind::Other,
        };
        let geometry = match (self.off, self.ext) {
            (Some((x, y)), Some((cx, cy))) => Some(Geometry {
                left: x,
                top: y,
                width: cx,
                height: cy,
            }),
            _ => None,
        };
        Shape::new(kind, geometry, is_outline_capable(&self.tag))
    }
}

/// Parse one slide's XML into the domain model.
///
/// Shape order follows document order of the top-level `p:spTree` children,
/// which is what the layout engine's slot flags key off.
pub fn parse_slide(xml: &str) -> Result<Slide> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();
    let mut in_sp_tree = false;
    let mut current: Option<ShapeBuilder> = None;
    let mut shape_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local = local_name(e.name().as_ref()).to_vec();
                if current.is_some() {
                    let builder = current.as_mut().unwrap();
                    shape_depth += 1;
                    if local == b"xfrm" && !builder.xfrm_done {
                        builder.in_xfrm = true;
                    }
                    builder.take_transform(&local, e);
                    builder.check_graphic_data(&local, e);
                } else if local == b"spTree" {
                    in_sp_tree = true;
                } else if in_sp_tree && is_shape_tag(&local) {
                    current = Some(ShapeBuilder::new(local));
                    shape_depth = 1;
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(builder) = current.as_mut() {
                    let local = local_name(e.name().as_ref()).to_vec();
                    builder.take_transform(&local, e);
                    builder.check_graphic_data(&local, e);
                }
            }
            Ok(Event::End(ref e)) => {
                let local = local_name(e.name().as_ref()).to_vec();
                if current.is_some() {
                    let builder = current.as_mut().unwrap();
                    if local == b"xfrm" && builder.in_xfrm {
                        builder.in_xfrm = false;
                        builder.xfrm_done = true;
                    }
                    shape_depth -= 1;
                    if shape_depth == 0 {
                        shapes.push(current.take().unwrap().build());
                    }
                } else if local == b"spTree" {
                    in_sp_tree = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(format!("Error parsing slide: {}", e))),
            _ => {}
        }
    }

    Ok(Slide::new(shapes))
}

/// Parse the slide canvas dimensions from `ppt/presentation.xml` (`p:sldSz`).
pub fn parse_canvas(xml: &str) -> Result<Canvas> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldSz" =>
            {
                let width = attr_i64(e, b"cx");
                let height = attr_i64(e, b"cy");
                return match (width, height) {
                    (Some(width), Some(height)) => Ok(Canvas { width, height }),
                    _ => Err(Error::Corrupted(
                        "sldSz element is missing cx/cy".to_string(),
                    )),
                };
            }
            Ok(Event::Eof) => {
                return Err(Error::Corrupted(
                    "presentation.xml has no sldSz element".to_string(),
                ))
            }
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing presentation.xml: {}", e)))
            }
            _ => {}
        }
    }
}

/// Get the ordered list of slide archive paths from the presentation
/// relationships (`ppt/_rels/presentation.xml.rels`).
pub fn slide_order(rels_xml: &str) -> Result<Vec<String>> {
    let mut slides: Vec<(String, Option<usize>)> = Vec::new();

    let mut reader = Reader::from_str(rels_xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Type" => {
                            rel_type = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        b"Target" => {
                            target = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        b"Id" => {
                            id = String::from_utf8_lossy(&attr.value).to_string();
                        }
                        _ => {}
                    }
                }

                // Only slide parts; layouts and masters use related types.
                if rel_type.contains("/slide")
                    && !rel_type.contains("slideLayout")
                    && !rel_type.contains("slideMaster")
                {
                    let order_num =
                        extract_slide_number(&id).or_else(|| extract_slide_number(&target));
                    let full_path = if let Some(stripped) = target.strip_prefix('/') {
                        stripped.to_string()
                    } else {
                        format!("ppt/{}", target)
                    };
                    slides.push((full_path, order_num));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Xml(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
