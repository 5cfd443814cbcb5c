//! Vector export: selected regions as filled SVG polygons.

use std::io::Write;
use std::sync::Arc;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::color_utils::to_hex;
use crate::export::ExportError;
use crate::export::contour::{Contour, trace_external_contours};
use crate::model::{Region, RegionId};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// One filled polygon traced from a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorPolygon {
    /// Region the polygon was traced from.
    pub region_id: RegionId,
    /// Closed outline in pixel coordinates.
    pub points: Contour,
    /// Fill color, the region's sampled source color.
    pub fill: [u8; 3],
}

/// A vector drawing sized to the source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgDocument {
    width: u32,
    height: u32,
    polygons: Vec<VectorPolygon>,
}

impl SvgDocument {
    /// Trace every selected region's external contours.
    ///
    /// Each contour becomes its own polygon, so a region with several
    /// disjoint parts yields several polygons sharing one fill.
    pub fn from_selection(selection: &[Arc<Region>]) -> Result<Self, ExportError> {
        let first = selection.first().ok_or(ExportError::NothingSelected)?;
        let (width, height) = (first.width(), first.height());

        let mut polygons = Vec::new();
        for region in selection {
            if (region.width(), region.height()) != (width, height) {
                return Err(ExportError::DimensionMismatch {
                    expected: (width, height),
                    found: (region.width(), region.height()),
                });
            }
            let fill = region.attributes().sample_color;
            let contours = trace_external_contours(region.occupancy());
            log::debug!(
                "Region {}: {} contour(s), fill {}",
                region.id(),
                contours.len(),
                to_hex(fill)
            );
            polygons.extend(contours.into_iter().map(|points| VectorPolygon {
                region_id: region.id(),
                points,
                fill,
            }));
        }

        Ok(Self {
            width,
            height,
            polygons,
        })
    }

    /// Drawing width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Drawing height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All polygons in emission order.
    pub fn polygons(&self) -> &[VectorPolygon] {
        &self.polygons
    }

    /// Serialize to an SVG document.
    pub fn to_svg_string(&self) -> Result<String, ExportError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| ExportError::Xml(e.into()))?;

        let width = self.width.to_string();
        let height = self.height.to_string();
        let view_box = format!("0 0 {} {}", self.width, self.height);
        let mut svg = BytesStart::new("svg");
        svg.push_attribute(("xmlns", SVG_NAMESPACE));
        svg.push_attribute(("version", "1.1"));
        svg.push_attribute(("width", width.as_str()));
        svg.push_attribute(("height", height.as_str()));
        svg.push_attribute(("viewBox", view_box.as_str()));
        writer
            .write_event(Event::Start(svg))
            .map_err(|e| ExportError::Xml(e.into()))?;

        for polygon in &self.polygons {
            self.write_polygon(&mut writer, polygon)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("svg")))
            .map_err(|e| ExportError::Xml(e.into()))?;

        let bytes = writer.into_inner();
        // Every byte written above came from &str values.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Write a single `<polygon>` element.
    fn write_polygon<W: Write>(
        &self,
        writer: &mut Writer<W>,
        polygon: &VectorPolygon,
    ) -> Result<(), ExportError> {
        let points = polygon
            .points
            .iter()
            .map(|(x, y)| format!("{},{}", x, y))
            .collect::<Vec<_>>()
            .join(" ");
        let fill = to_hex(polygon.fill);

        let mut element = BytesStart::new("polygon");
        element.push_attribute(("points", points.as_str()));
        element.push_attribute(("fill", fill.as_str()));
        writer
            .write_event(Event::Empty(element))
            .map_err(|e| ExportError::Xml(e.into()))?;
        Ok(())
    }
}
