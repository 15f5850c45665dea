//! Scenario lighting (`.gls`).

use roxmltree::Document;

use crate::util::{to_channel, Error, Result, Vec3};

/// Sun and background parameters of a scenario.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    /// Unit vector towards the sun.
    pub sun_direction: Vec3,
    pub sun_color: [u8; 3],
    pub background_color: [u8; 3],
}

impl Lighting {
    /// Parse a lighting document.
    pub fn from_xml(text: &str) -> Result<Self> {
        let doc = Document::parse(text).map_err(|e| Error::Xml(e.to_string()))?;

        let inclination = parse_float(element_text(&doc, "sunInclination")?, "sunInclination")?;
        let rotation = parse_float(element_text(&doc, "sunRotation")?, "sunRotation")?;

        Ok(Self {
            sun_direction: sun_direction(inclination, rotation),
            sun_color: parse_color(element_text(&doc, "setTerrainColor")?, "setTerrainColor")?,
            background_color: parse_color(element_text(&doc, "backgroundColor")?, "backgroundColor")?,
        })
    }
}

/// Direction for an inclination above the horizon and a rotation around
/// the vertical axis, both in degrees.
pub fn sun_direction(inclination: f32, rotation: f32) -> Vec3 {
    let (inc, rot) = (inclination.to_radians(), rotation.to_radians());
    Vec3::new(rot.cos() * inc.cos(), rot.sin() * inc.cos(), inc.sin()).normalize_or_zero()
}

fn element_text<'a>(doc: &'a Document, name: &str) -> Result<&'a str> {
    doc.descendants()
        .find(|n| n.has_tag_name(name))
        .map(|n| n.text().unwrap_or(""))
        .ok_or_else(|| Error::Xml(format!("missing <{}>", name)))
}

fn parse_float(text: &str, what: &str) -> Result<f32> {
    text.trim()
        .parse()
        .map_err(|_| Error::Xml(format!("<{}> is not a number: {:?}", what, text)))
}

/// `"r,g,b"` with float channels to 8-bit colour.
fn parse_color(text: &str, what: &str) -> Result<[u8; 3]> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() < 3 {
        return Err(Error::Xml(format!("<{}> is not a colour: {:?}", what, text)));
    }
    let mut out = [0u8; 3];
    for (channel, part) in out.iter_mut().zip(parts) {
        *channel = to_channel(parse_float(part, what)?);
    }
    Ok(out)
}
