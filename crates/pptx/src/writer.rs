//! Slide XML rewriting.
//!
//! Streams a slide's XML through unchanged, except that each top-level shape
//! gets its `a:off`/`a:ext` attributes rewritten from the edited model and,
//! for outline-capable shapes, its `a:ln` replaced with the model's outline.
//! The shape ordinals here must match [`crate::parser::parse_slide`] exactly,
//! since that is how edits are lined up with elements.

use crate::parser::{is_shape_tag, local_name};
use deckfit_core::{Error, Geometry, Outline, Result, Slide};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

/// Rewrite state for the shape currently being streamed.
struct ShapeState {
    /// Nesting depth inside the shape element (the element itself is 1).
    depth: usize,
    /// Geometry to write into the shape's own transform, if any.
    geometry: Option<Geometry>,
    /// Outline to write into the shape's own `p:spPr`, if capable.
    outline: Option<Outline>,
    in_xfrm: bool,
    xfrm_done: bool,
    in_own_sppr: bool,
    /// Non-zero while discarding an existing `a:ln` subtree.
    skip_depth: usize,
}

impl ShapeState {
    fn new(geometry: Option<Geometry>, outline: Option<Outline>) -> Self {
        Self {
            depth: 1,
            geometry,
            outline,
            in_xfrm: false,
            xfrm_done: false,
            in_own_sppr: false,
            skip_depth: 0,
        }
    }
}

/// Rewrite one slide's XML so it reflects the edited model.
///
/// Elements beyond the model's shape count, and everything outside `p:spTree`,
/// pass through untouched.
pub fn rewrite_slide(xml: &str, slide: &Slide) -> Result<Vec<u8>> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut in_sp_tree = false;
    let mut shape_index = 0usize;
    let mut state: Option<ShapeState> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::Xml(format!("Error rewriting slide: {}", e)))?;

        // Discard the remainder of a replaced a:ln subtree.
        if let Some(s) = state.as_mut() {
            if s.skip_depth > 0 {
                match &event {
                    Event::Start(_) => {
                        s.skip_depth += 1;
                        s.depth += 1;
                    }
                    Event::End(_) => {
                        s.skip_depth -= 1;
                        s.depth -= 1;
                    }
                    Event::Eof => {
                        return Err(Error::Xml("unterminated a:ln element".to_string()))
                    }
                    _ => {}
                }
                continue;
            }
        }

        match event {
            Event::Start(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                if state.is_some() {
                    let s = state.as_mut().unwrap();
                    s.depth += 1;
                    if local == b"xfrm" && !s.xfrm_done {
                        s.in_xfrm = true;
                    }
                    if local == b"spPr" && s.depth == 2 {
                        s.in_own_sppr = true;
                    }
                    if s.in_own_sppr && local == b"ln" && s.outline.is_some() {
                        // Replaced wholesale when spPr closes.
                        s.skip_depth = 1;
                        continue;
                    }
                    let rewritten = rewrite_transform(&e, &local, s);
                    write(&mut writer, Event::Start(rewritten))?;
                } else {
                    if local == b"spTree" {
                        in_sp_tree = true;
                    } else if in_sp_tree && is_shape_tag(&local) {
                        let shape = slide.shapes.get(shape_index);
                        shape_index += 1;
                        state = Some(ShapeState::new(
                            shape.and_then(|s| s.geometry),
                            shape.and_then(|s| s.outline),
                        ));
                    }
                    write(&mut writer, Event::Start(e))?;
                }
            }
            Event::Empty(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                if state.is_some() {
                    let s = state.as_mut().unwrap();
                    if s.in_own_sppr && local == b"ln" && s.outline.is_some() {
                        // Dropped; the replacement is emitted at </p:spPr>.
                        continue;
                    }
                    if local == b"spPr" && s.depth == 1 {
                        // Self-closing spPr: expand it so the outline has
                        // somewhere to live.
                        if let Some(outline) = s.outline {
                            let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                            write(&mut writer, Event::Start(copy_start(&e, &name)))?;
                            write_ln(&mut writer, &outline)?;
                            write(&mut writer, Event::End(BytesEnd::new(name)))?;
                            continue;
                        }
                    }
                    let rewritten = rewrite_transform(&e, &local, s);
                    write(&mut writer, Event::Empty(rewritten))?;
                } else {
                    write(&mut writer, Event::Empty(e))?;
                }
            }
            Event::End(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                if state.is_some() {
                    let s = state.as_mut().unwrap();
                    if local == b"xfrm" && s.in_xfrm {
                        s.in_xfrm = false;
                        s.xfrm_done = true;
                    }
                    if local == b"spPr" && s.in_own_sppr && s.depth == 2 {
                        if let Some(outline) = s.outline {
                            write_ln(&mut writer, &outline)?;
                        }
                        s.in_own_sppr = false;
                    }
                    s.depth -= 1;
                    let shape_closed = s.depth == 0;
                    write(&mut writer, Event::End(e))?;
                    if shape_closed {
                        state = None;
                    }
                } else {
                    if local == b"spTree" {
                        in_sp_tree = false;
                    }
                    write(&mut writer, Event::End(e))?;
                }
            }
            Event::Eof => break,
            other => write(&mut writer, other)?,
        }
    }

    Ok(writer.into_inner().into_inner())
}

/// Rewrite `a:off`/`a:ext` attributes inside the shape's own transform.
fn rewrite_transform<'a>(e: &BytesStart<'a>, local: &[u8], s: &ShapeState) -> BytesStart<'a> {
    let geometry = match (s.in_xfrm, s.geometry) {
        (true, Some(geometry)) => geometry,
        _ => return e.to_owned(),
    };

    match local {
        b"off" => with_attrs(
            e,
            &[
                (b"x", geometry.left.to_string()),
                (b"y", geometry.top.to_string()),
            ],
        ),
        b"ext" => with_attrs(
            e,
            &[
                (b"cx", geometry.width.to_string()),
                (b"cy", geometry.height.to_string()),
            ],
        ),
        _ => e.to_owned(),
    }
}

/// Copy of `e` with the given attributes replaced (or appended if absent).
fn with_attrs<'a>(e: &BytesStart<'_>, replacements: &[(&[u8], String)]) -> BytesStart<'a> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    let mut seen = vec![false; replacements.len()];

    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if let Some(i) = replacements
            .iter()
            .position(|(k, _)| *k == attr.key.as_ref())
        {
            seen[i] = true;
            out.push_attribute((key.as_str(), replacements[i].1.as_str()));
        } else {
            let value = String::from_utf8_lossy(&attr.value).into_owned();
            out.push_attribute((key.as_str(), value.as_str()));
        }
    }
    for (i, (key, value)) in replacements.iter().enumerate() {
        if !seen[i] {
            let key = String::from_utf8_lossy(key).into_owned();
            out.push_attribute((key.as_str(), value.as_str()));
        }
    }

    out
}

/// Copy of `e` with its attributes, under the given name.
fn copy_start<'a>(e: &BytesStart<'_>, name: &str) -> BytesStart<'a> {
    let mut out = BytesStart::new(name.to_string());
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        out.push_attribute((key.as_str(), value.as_str()));
    }
    out
}

/// Emit `<a:ln w="..."><a:solidFill><a:srgbClr val="..."/></a:solidFill></a:ln>`.
fn write_ln<W: std::io::Write>(writer: &mut Writer<W>, outline: &Outline) -> Result<()> {
    let mut ln = BytesStart::new("a:ln");
    let weight = outline.weight_emu().to_string();
    ln.push_attribute(("w", weight.as_str()));
    write(writer, Event::Start(ln))?;

    write(writer, Event::Start(BytesStart::new("a:solidFill")))?;
    let mut color = BytesStart::new("a:srgbClr");
    let hex = outline.color.to_hex();
    color.push_attribute(("val", hex.as_str()));
    write(writer, Event::Empty(color))?;
    write(writer, Event::End(BytesEnd::new("a:solidFill")))?;

    write(writer, Event::End(BytesEnd::new("a:ln")))
}

fn write<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(format!("Error writing slide XML: {}", e)))
}
