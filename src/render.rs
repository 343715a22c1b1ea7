use crate::classify::{classify_tract, LEGEND_ORDER};
use crate::config::RenderConfig;
use crate::overlay::{label_anchor, landmarks_on_tracts, OverlayLayers, TractIndex};
use crate::processing::{summarize, SummaryStats};
use crate::types::{MetroMap, OverlayFeature};
use geo::bounding_rect::BoundingRect;
use geo::{Coord, Geometry, LineString, Polygon, Rect};
use std::fmt::{self, Write};

const MARGIN: f64 = 20.0;
const TITLE_HEIGHT: f64 = 70.0;

const TRACT_EDGE: &str = "#ffffff";
const WATER_STROKE: &str = "#808080";
const PARK_FILL: &str = "#D3D3D3";
const LABEL_COLOR: &str = "#696969";
const LANDMARK_COLOR: &str = "#333333";

const LEGEND_WIDTH: f64 = 280.0;
const LEGEND_ROW: f64 = 22.0;
const STATS_WIDTH: f64 = 230.0;
const STATS_ROW: f64 = 18.0;

/// Maps lon/lat onto the canvas. Longitude is scaled by the cosine of the
/// middle latitude so shapes keep their proportions away from the equator.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    min_x: f64,
    max_y: f64,
    kx: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    /// Fits `bounds` inside the viewport, centered, aspect ratio preserved.
    pub fn fit(bounds: Rect<f64>, x0: f64, y0: f64, width: f64, height: f64) -> Self {
        let mid_lat = (bounds.min().y + bounds.max().y) / 2.0;
        let kx = mid_lat.to_radians().cos().max(0.01);
        let dw = bounds.width() * kx;
        let dh = bounds.height();

        let sx = if dw > 0.0 { width / dw } else { f64::INFINITY };
        let sy = if dh > 0.0 { height / dh } else { f64::INFINITY };
        let mut scale = sx.min(sy);
        if !scale.is_finite() {
            scale = 1.0;
        }

        Self {
            min_x: bounds.min().x,
            max_y: bounds.max().y,
            kx,
            scale,
            offset_x: x0 + (width - dw * scale) / 2.0,
            offset_y: y0 + (height - dh * scale) / 2.0,
        }
    }

    pub fn project(&self, c: Coord<f64>) -> (f64, f64) {
        (
            self.offset_x + (c.x - self.min_x) * self.kx * self.scale,
            self.offset_y + (self.max_y - c.y) * self.scale,
        )
    }
}

/// Renders one metro/year map as a standalone SVG document.
///
/// Tracts are filled by gap class; water is outlined and labeled when its
/// name mentions a river, lake, ocean or bay; parks are filled in a light
/// grey; landmarks are marked only where they fall on a tract. The legend
/// always lists all six classes. The statistics box is left out when no
/// tract has enough applications.
pub fn compose_svg(map: &MetroMap, overlays: &OverlayLayers, canvas: &RenderConfig) -> Result<String, fmt::Error> {
    let (width, height) = (canvas.width, canvas.height);
    let index = TractIndex::new(&map.tracts);
    let landmarks = landmarks_on_tracts(&overlays.landmarks, &index);
    let bounds = map_bounds(map, overlays, &landmarks);
    let projection = Projection::fit(
        bounds,
        MARGIN,
        TITLE_HEIGHT,
        width - 2.0 * MARGIN,
        height - TITLE_HEIGHT - MARGIN,
    );

    let mut svg = String::new();
    writeln!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" id="metro-{code}-{year}" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="DejaVu Sans, Arial, sans-serif">"##,
        code = escape_xml(&map.code),
        year = map.year,
        w = width,
        h = height
    )?;
    writeln!(svg, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##)?;

    // Tracts
    writeln!(svg, r##"<g id="tracts" stroke="{}" stroke-width="0.5" fill-rule="evenodd">"##, TRACT_EDGE)?;
    for tract in &map.tracts {
        let mut d = String::new();
        for polygon in &tract.geometry {
            append_polygon(&mut d, polygon, &projection)?;
        }
        if !d.is_empty() {
            writeln!(svg, r##"<path d="{}" fill="{}"/>"##, d, classify_tract(tract).color())?;
        }
    }
    writeln!(svg, "</g>")?;

    write_overlays(&mut svg, overlays, &landmarks, &projection)?;
    write_legend(&mut svg, width)?;
    if let Some(stats) = summarize(&map.tracts) {
        write_stats(&mut svg, &stats)?;
    }
    write_title(&mut svg, map, width)?;

    writeln!(svg, "</svg>")?;
    Ok(svg)
}

fn write_overlays(
    svg: &mut String,
    overlays: &OverlayLayers,
    landmarks: &[&OverlayFeature],
    projection: &Projection,
) -> fmt::Result {
    if !overlays.water.is_empty() {
        writeln!(
            svg,
            r##"<g id="water" fill="none" stroke="{}" stroke-width="2" stroke-opacity="0.7" stroke-linejoin="round">"##,
            WATER_STROKE
        )?;
        for feature in &overlays.water {
            let d = path_data(&feature.geometry, projection)?;
            if !d.is_empty() {
                writeln!(svg, r##"<path d="{}"/>"##, d)?;
            }
        }
        writeln!(svg, "</g>")?;
    }

    if !overlays.parks.is_empty() {
        writeln!(
            svg,
            r##"<g id="parks" fill="{}" stroke="{}" stroke-width="1" opacity="0.6" fill-rule="evenodd">"##,
            PARK_FILL, LABEL_COLOR
        )?;
        for feature in &overlays.parks {
            let d = path_data(&feature.geometry, projection)?;
            if !d.is_empty() {
                writeln!(svg, r##"<path d="{}"/>"##, d)?;
            }
        }
        writeln!(svg, "</g>")?;
    }

    let labels = overlays.water_labels();
    if !labels.is_empty() {
        writeln!(svg, r##"<g id="water-labels">"##)?;
        for (feature, anchor) in labels {
            let (x, y) = projection.project(anchor);
            write_boxed_label(svg, &feature.name, x + 5.0, y + 5.0)?;
        }
        writeln!(svg, "</g>")?;
    }

    if !landmarks.is_empty() {
        writeln!(svg, r##"<g id="landmarks" font-size="8" fill="{}">"##, LANDMARK_COLOR)?;
        for landmark in landmarks {
            let Some(anchor) = label_anchor(&landmark.geometry) else {
                continue;
            };
            let (x, y) = projection.project(anchor);
            writeln!(svg, r##"<circle cx="{:.2}" cy="{:.2}" r="2.5" stroke="#ffffff" stroke-width="0.5"/>"##, x, y)?;
            writeln!(svg, r##"<text x="{:.2}" y="{:.2}">{}</text>"##, x + 4.0, y - 4.0, escape_xml(&landmark.name))?;
        }
        writeln!(svg, "</g>")?;
    }

    Ok(())
}

fn write_boxed_label(svg: &mut String, text: &str, x: f64, y: f64) -> fmt::Result {
    let font_size = 7.0;
    let pad = 1.5;
    // Glyph width estimate for a bold sans face; SVG has no text metrics.
    let box_width = text.chars().count() as f64 * font_size * 0.62 + 2.0 * pad;
    let box_height = font_size + 2.0 * pad;
    writeln!(
        svg,
        r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="2" fill="#ffffff" fill-opacity="0.8"/>"##,
        x,
        y,
        box_width,
        box_height
    )?;
    writeln!(
        svg,
        r##"<text x="{:.2}" y="{:.2}" font-size="{}" font-weight="bold" fill="{}">{}</text>"##,
        x + pad,
        y + pad + font_size * 0.85,
        font_size,
        LABEL_COLOR,
        escape_xml(text)
    )
}

fn write_legend(svg: &mut String, width: f64) -> fmt::Result {
    let x = width - MARGIN - LEGEND_WIDTH;
    let y = TITLE_HEIGHT;
    let height = LEGEND_ORDER.len() as f64 * LEGEND_ROW + 12.0;

    writeln!(svg, r##"<g id="legend" font-size="10">"##)?;
    writeln!(
        svg,
        r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="4" fill="#ffffff" fill-opacity="0.9" stroke="#999999"/>"##,
        x, y, LEGEND_WIDTH, height
    )?;
    for (i, class) in LEGEND_ORDER.iter().enumerate() {
        let row_y = y + 8.0 + i as f64 * LEGEND_ROW;
        writeln!(
            svg,
            r##"<rect x="{:.1}" y="{:.1}" width="18" height="12" fill="{}"/>"##,
            x + 10.0,
            row_y + 2.0,
            class.color()
        )?;
        writeln!(
            svg,
            r##"<text x="{:.1}" y="{:.1}" fill="#222222">{}</text>"##,
            x + 36.0,
            row_y + 12.0,
            escape_xml(class.label())
        )?;
    }
    writeln!(svg, "</g>")
}

fn write_stats(svg: &mut String, stats: &SummaryStats) -> fmt::Result {
    let lines = stats.lines();
    let x = MARGIN;
    let y = TITLE_HEIGHT;
    let height = lines.len() as f64 * STATS_ROW + 12.0;

    writeln!(svg, r##"<g id="stats" font-size="12">"##)?;
    writeln!(
        svg,
        r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="6" fill="#ffffff" fill-opacity="0.8" stroke="#999999"/>"##,
        x, y, STATS_WIDTH, height
    )?;
    for (i, line) in lines.iter().enumerate() {
        writeln!(
            svg,
            r##"<text x="{:.1}" y="{:.1}" fill="#222222">{}</text>"##,
            x + 10.0,
            y + 6.0 + (i as f64 + 1.0) * STATS_ROW - 4.0,
            escape_xml(line)
        )?;
    }
    writeln!(svg, "</g>")
}

fn write_title(svg: &mut String, map: &MetroMap, width: f64) -> fmt::Result {
    writeln!(
        svg,
        r##"<text x="{:.1}" y="30" text-anchor="middle" font-size="16" font-weight="bold">{}</text>"##,
        width / 2.0,
        escape_xml(&map.name)
    )?;
    writeln!(
        svg,
        r##"<text x="{:.1}" y="52" text-anchor="middle" font-size="16" font-weight="bold">Black-White Mortgage Approval Rate Gaps ({})</text>"##,
        width / 2.0,
        map.year
    )
}

/// Union of tract, water, park and drawn-landmark bounds; a unit square
/// when nothing has extent. Landmarks left off the map do not count.
fn map_bounds(map: &MetroMap, overlays: &OverlayLayers, landmarks: &[&OverlayFeature]) -> Rect<f64> {
    let tract_rects = map.tracts.iter().filter_map(|t| t.geometry.bounding_rect());
    let overlay_rects = overlays
        .water
        .iter()
        .chain(&overlays.parks)
        .chain(landmarks.iter().copied())
        .filter_map(|f| f.geometry.bounding_rect());

    tract_rects
        .chain(overlay_rects)
        .reduce(|a, b| {
            Rect::new(
                Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
        .unwrap_or_else(|| Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }))
}

/// SVG path data for line and polygon geometry. Points produce nothing.
pub fn path_data(geometry: &Geometry<f64>, projection: &Projection) -> Result<String, fmt::Error> {
    let mut d = String::new();
    append_geometry(&mut d, geometry, projection)?;
    Ok(d)
}

fn append_geometry(d: &mut String, geometry: &Geometry<f64>, projection: &Projection) -> fmt::Result {
    match geometry {
        Geometry::Polygon(p) => append_polygon(d, p, projection),
        Geometry::MultiPolygon(mp) => {
            for p in mp {
                append_polygon(d, p, projection)?;
            }
            Ok(())
        }
        Geometry::LineString(ls) => append_ring(d, ls, false, projection),
        Geometry::MultiLineString(mls) => {
            for ls in mls {
                append_ring(d, ls, false, projection)?;
            }
            Ok(())
        }
        Geometry::Line(line) => append_ring(d, &LineString::from(vec![line.start, line.end]), false, projection),
        Geometry::Rect(rect) => append_polygon(d, &rect.to_polygon(), projection),
        Geometry::Triangle(triangle) => append_polygon(d, &triangle.to_polygon(), projection),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                append_geometry(d, g, projection)?;
            }
            Ok(())
        }
        Geometry::Point(_) | Geometry::MultiPoint(_) => Ok(()),
    }
}

fn append_polygon(d: &mut String, polygon: &Polygon<f64>, projection: &Projection) -> fmt::Result {
    append_ring(d, polygon.exterior(), true, projection)?;
    for interior in polygon.interiors() {
        append_ring(d, interior, true, projection)?;
    }
    Ok(())
}

fn append_ring(d: &mut String, ring: &LineString<f64>, close: bool, projection: &Projection) -> fmt::Result {
    for (i, c) in ring.coords().enumerate() {
        let (x, y) = projection.project(*c);
        let cmd = if i == 0 { 'M' } else { 'L' };
        if !d.is_empty() {
            d.push(' ');
        }
        write!(d, "{}{:.2} {:.2}", cmd, x, y)?;
    }
    if close && ring.0.len() > 1 {
        d.push_str(" Z");
    }
    Ok(())
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
