//! Materials and frame cross-sections.
//!
//! Section axes follow the usual frame convention: local axis 2 runs across the
//! width of the section and local axis 3 along its depth. `I33` therefore
//! resists bending that deflects the member along local 2, and `I22` resists
//! bending that deflects it along local 3.

use serde::{Deserialize, Serialize};

use crate::errors::PropertyError;

/// Isotropic linear elastic material.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Young's modulus in pascals.
    pub elastic_modulus: f64,
    /// Poisson's ratio.
    pub poisson_ratio: f64,
    /// Weight per unit volume in newtons per cubic metre.
    #[serde(default)]
    pub unit_weight: f64,
    /// Optional yield strength in pascals.
    #[serde(default)]
    pub yield_strength: Option<f64>,
}

impl Material {
    /// Create a validated material.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] when the modulus is not positive, the Poisson
    /// ratio lies outside `(-1, 0.5)` or the unit weight is negative.
    ///
    /// # Examples
    /// ```
    /// use framex::Material;
    ///
    /// let steel = Material::new(200.0e9, 0.3, 76.9e3).expect("valid steel");
    /// assert!((steel.shear_modulus() - 76.923e9).abs() < 1.0e6);
    /// ```
    pub fn new(
        elastic_modulus: f64,
        poisson_ratio: f64,
        unit_weight: f64,
    ) -> Result<Self, PropertyError> {
        let material = Self {
            elastic_modulus,
            poisson_ratio,
            unit_weight,
            yield_strength: None,
        };
        material.validate()?;
        Ok(material)
    }

    /// Attach a yield strength in pascals.
    #[must_use]
    pub fn with_yield_strength(mut self, yield_strength: f64) -> Self {
        self.yield_strength = Some(yield_strength);
        self
    }

    /// Shear modulus `G = E / (2 (1 + ν))`.
    #[must_use]
    pub fn shear_modulus(&self) -> f64 {
        self.elastic_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }

    /// Check that the material constants are physically meaningful.
    ///
    /// # Errors
    ///
    /// See [`Material::new`].
    pub fn validate(&self) -> Result<(), PropertyError> {
        if self.elastic_modulus <= 0.0 {
            return Err(PropertyError::NonPositiveElasticModulus {
                elastic_modulus: self.elastic_modulus,
            });
        }
        if self.poisson_ratio <= -1.0 || self.poisson_ratio >= 0.5 {
            return Err(PropertyError::InvalidPoissonRatio {
                poisson_ratio: self.poisson_ratio,
            });
        }
        if self.unit_weight < 0.0 {
            return Err(PropertyError::NegativeUnitWeight {
                unit_weight: self.unit_weight,
            });
        }
        Ok(())
    }
}

/// Geometric properties of a cross-section.
///
/// Only the first six values enter the stiffness matrix; the remaining design
/// values are informational.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionProperties {
    /// Cross-sectional area.
    #[serde(rename = "A")]
    pub area: f64,
    /// Torsion constant.
    #[serde(rename = "J")]
    pub torsion_constant: f64,
    /// Second moment of area about local axis 2.
    #[serde(rename = "I22")]
    pub i22: f64,
    /// Second moment of area about local axis 3.
    #[serde(rename = "I33")]
    pub i33: f64,
    /// Shear area for forces along local axis 2. Zero disables shear deformation.
    #[serde(rename = "As2")]
    pub shear_area_2: f64,
    /// Shear area for forces along local axis 3. Zero disables shear deformation.
    #[serde(rename = "As3")]
    pub shear_area_3: f64,
    /// Elastic section modulus about axis 2.
    #[serde(rename = "S22")]
    pub s22: f64,
    /// Elastic section modulus about axis 3.
    #[serde(rename = "S33")]
    pub s33: f64,
    /// Plastic section modulus about axis 2.
    #[serde(rename = "Z22")]
    pub z22: f64,
    /// Plastic section modulus about axis 3.
    #[serde(rename = "Z33")]
    pub z33: f64,
    /// Radius of gyration about axis 2.
    #[serde(rename = "r22")]
    pub r22: f64,
    /// Radius of gyration about axis 3.
    #[serde(rename = "r33")]
    pub r33: f64,
}

impl SectionProperties {
    /// Create properties from the stiffness-relevant values only.
    #[must_use]
    pub fn new(
        area: f64,
        torsion_constant: f64,
        i22: f64,
        i33: f64,
        shear_area_2: f64,
        shear_area_3: f64,
    ) -> Self {
        Self {
            area,
            torsion_constant,
            i22,
            i33,
            shear_area_2,
            shear_area_3,
            ..Self::default()
        }
    }

    /// Check that the section can produce a non-degenerate stiffness matrix.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] when the area or either inertia is not positive.
    pub fn validate(&self) -> Result<(), PropertyError> {
        if self.area <= 0.0 {
            return Err(PropertyError::NonPositiveArea { area: self.area });
        }
        if self.i22 <= 0.0 {
            return Err(PropertyError::NonPositiveInertia {
                axis: "I22",
                value: self.i22,
            });
        }
        if self.i33 <= 0.0 {
            return Err(PropertyError::NonPositiveInertia {
                axis: "I33",
                value: self.i33,
            });
        }
        Ok(())
    }
}

/// Plate dimensions of a (possibly mono-symmetric) I-shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IDimensions {
    /// Overall depth.
    pub depth: f64,
    /// Top flange width.
    pub top_flange_width: f64,
    /// Top flange thickness.
    pub top_flange_thickness: f64,
    /// Bottom flange width.
    pub bottom_flange_width: f64,
    /// Bottom flange thickness.
    pub bottom_flange_thickness: f64,
    /// Web thickness.
    pub web_thickness: f64,
}

impl IDimensions {
    /// Doubly symmetric I-shape.
    #[must_use]
    pub const fn symmetric(
        depth: f64,
        flange_width: f64,
        flange_thickness: f64,
        web_thickness: f64,
    ) -> Self {
        Self {
            depth,
            top_flange_width: flange_width,
            top_flange_thickness: flange_thickness,
            bottom_flange_width: flange_width,
            bottom_flange_thickness: flange_thickness,
            web_thickness,
        }
    }

    /// Clear height of the web between the flanges.
    #[must_use]
    pub fn web_height(&self) -> f64 {
        self.depth - self.top_flange_thickness - self.bottom_flange_thickness
    }

    /// Distance from the bottom fibre to the centroid.
    #[must_use]
    pub fn centroid_from_bottom(&self) -> f64 {
        let web_height = self.web_height();
        let top = self.top_flange_width * self.top_flange_thickness;
        let bottom = self.bottom_flange_width * self.bottom_flange_thickness;
        let web = web_height * self.web_thickness;
        let total = top + bottom + web;
        if total == 0.0 {
            return self.depth / 2.0;
        }
        let y_bottom = self.bottom_flange_thickness / 2.0;
        let y_web = self.bottom_flange_thickness + web_height / 2.0;
        let y_top = self.depth - self.top_flange_thickness / 2.0;
        (bottom * y_bottom + web * y_web + top * y_top) / total
    }

    /// Reject zero or negative plates and webs that vanish between the flanges.
    fn validate(&self) -> Result<(), PropertyError> {
        let plates = [
            ("depth", self.depth),
            ("top_flange_width", self.top_flange_width),
            ("top_flange_thickness", self.top_flange_thickness),
            ("bottom_flange_width", self.bottom_flange_width),
            ("bottom_flange_thickness", self.bottom_flange_thickness),
            ("web_thickness", self.web_thickness),
            ("web_height", self.web_height()),
        ];
        for (name, value) in plates {
            if value <= 0.0 {
                return Err(PropertyError::NonPositiveDimension { name, value });
            }
        }
        Ok(())
    }

    /// Compute properties from the plate dimensions.
    fn properties(&self) -> SectionProperties {
        let depth = self.depth;
        let (bt, tt) = (self.top_flange_width, self.top_flange_thickness);
        let (bb, tb) = (self.bottom_flange_width, self.bottom_flange_thickness);
        let tw = self.web_thickness;
        let hw = self.web_height();

        let a_top = bt * tt;
        let a_bottom = bb * tb;
        let a_web = hw * tw;
        let area = a_top + a_bottom + a_web;
        let y_bar = self.centroid_from_bottom();

        let y_bottom = tb / 2.0;
        let y_web = tb + hw / 2.0;
        let y_top = depth - tt / 2.0;
        let i22 = bb * tb.powi(3) / 12.0
            + a_bottom * (y_bottom - y_bar).powi(2)
            + tw * hw.powi(3) / 12.0
            + a_web * (y_web - y_bar).powi(2)
            + bt * tt.powi(3) / 12.0
            + a_top * (y_top - y_bar).powi(2);
        let i33 = tb * bb.powi(3) / 12.0 + hw * tw.powi(3) / 12.0 + tt * bt.powi(3) / 12.0;

        let max_width = bt.max(bb);
        let c_top = depth - y_bar;
        SectionProperties {
            area,
            torsion_constant: (bb * tb.powi(3) + hw * tw.powi(3) + bt * tt.powi(3)) / 3.0,
            i22,
            i33,
            shear_area_2: a_top + a_bottom,
            shear_area_3: a_web,
            s22: i22 / c_top.max(y_bar),
            s33: i33 / (max_width / 2.0),
            z22: max_width * tt * (depth - tt) + tw * hw * hw / 4.0,
            z33: 2.0 * tt * bt * bt / 4.0 + hw * tw * tw / 4.0,
            r22: (i22 / area).sqrt(),
            r33: (i33 / area).sqrt(),
        }
    }
}

/// Shape of a cross-section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionShape {
    /// Solid rectangle, `width` along local 2 and `depth` along local 3.
    Rectangular {
        /// Width along local axis 2.
        width: f64,
        /// Depth along local axis 3.
        depth: f64,
    },
    /// I-shape built from plates.
    I(IDimensions),
    /// Arbitrary section known only through its properties.
    General,
}

/// Frame cross-section bound to a named material.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    /// Name of the material this section is made of.
    pub material: String,
    /// Geometric shape.
    pub shape: SectionShape,
    /// Properties used by the analysis.
    pub properties: SectionProperties,
}

impl Section {
    /// Solid rectangular section.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NonPositiveDimension`] for a zero or negative side.
    ///
    /// # Examples
    /// ```
    /// use framex::Section;
    ///
    /// let beam = Section::rectangular("Concrete", 0.3, 0.5).expect("valid rectangle");
    /// assert!((beam.properties.area - 0.15).abs() < 1.0e-12);
    /// assert!(beam.properties.i22 > beam.properties.i33);
    /// ```
    pub fn rectangular(
        material: impl Into<String>,
        width: f64,
        depth: f64,
    ) -> Result<Self, PropertyError> {
        for (name, value) in [("width", width), ("depth", depth)] {
            if value <= 0.0 {
                return Err(PropertyError::NonPositiveDimension { name, value });
            }
        }
        let area = width * depth;
        let long = width.max(depth);
        let short = width.min(depth);
        let ratio = short / long;
        let torsion_factor = 1.0 / 3.0 - 0.21 * ratio * (1.0 - ratio.powi(4) / 12.0);
        let i33 = depth * width.powi(3) / 12.0;
        let i22 = width * depth.powi(3) / 12.0;
        let properties = SectionProperties {
            area,
            torsion_constant: torsion_factor * long * short.powi(3),
            i22,
            i33,
            shear_area_2: 5.0 / 6.0 * area,
            shear_area_3: 5.0 / 6.0 * area,
            s22: i22 / (depth / 2.0),
            s33: i33 / (width / 2.0),
            z22: width * depth * depth / 4.0,
            z33: depth * width * width / 4.0,
            r22: (i22 / area).sqrt(),
            r33: (i33 / area).sqrt(),
        };
        Ok(Self {
            material: material.into(),
            shape: SectionShape::Rectangular { width, depth },
            properties,
        })
    }

    /// I-shape with properties computed from its plates.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NonPositiveDimension`] for invalid plates.
    pub fn i_shape(
        material: impl Into<String>,
        dimensions: IDimensions,
    ) -> Result<Self, PropertyError> {
        dimensions.validate()?;
        Ok(Self {
            material: material.into(),
            shape: SectionShape::I(dimensions),
            properties: dimensions.properties(),
        })
    }

    /// I-shape whose properties come from a published table such as the AISC
    /// shapes database. The dimensions are kept for drawing and insertion points.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] for invalid plates or properties.
    pub fn i_shape_tabulated(
        material: impl Into<String>,
        dimensions: IDimensions,
        properties: SectionProperties,
    ) -> Result<Self, PropertyError> {
        dimensions.validate()?;
        properties.validate()?;
        Ok(Self {
            material: material.into(),
            shape: SectionShape::I(dimensions),
            properties,
        })
    }

    /// Section defined only by its properties.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] when the area or an inertia is not positive.
    pub fn general(
        material: impl Into<String>,
        properties: SectionProperties,
    ) -> Result<Self, PropertyError> {
        properties.validate()?;
        Ok(Self {
            material: material.into(),
            shape: SectionShape::General,
            properties,
        })
    }

    /// Perimeter of the section in local `(2, 3)` coordinates relative to the centroid.
    ///
    /// General sections have no drawable outline and return an empty list.
    #[must_use]
    pub fn outline(&self) -> Vec<(f64, f64)> {
        match self.shape {
            SectionShape::Rectangular { width, depth } => {
                let (dy, dz) = (width / 2.0, depth / 2.0);
                vec![(dy, dz), (-dy, dz), (-dy, -dz), (dy, -dz)]
            }
            SectionShape::I(dims) => {
                let y_bar = dims.centroid_from_bottom();
                let top = dims.depth - y_bar;
                let bottom = -y_bar;
                let web_top = top - dims.top_flange_thickness;
                let web_bottom = bottom + dims.bottom_flange_thickness;
                let tr = dims.top_flange_width / 2.0;
                let br = dims.bottom_flange_width / 2.0;
                let wr = dims.web_thickness / 2.0;
                vec![
                    (tr, top),
                    (-tr, top),
                    (-tr, web_top),
                    (-wr, web_top),
                    (-wr, web_bottom),
                    (-br, web_bottom),
                    (-br, bottom),
                    (br, bottom),
                    (br, web_bottom),
                    (wr, web_bottom),
                    (wr, web_top),
                    (tr, web_top),
                ]
            }
            SectionShape::General => Vec::new(),
        }
    }

    /// Offset `(e2, e3)` from the node to the section centroid for an insertion point.
    #[must_use]
    pub fn insertion_offset(&self, cardinal: CardinalPoint) -> (f64, f64) {
        let (width, c_bottom, c_top) = match self.shape {
            SectionShape::Rectangular { width, depth } => (width, depth / 2.0, depth / 2.0),
            SectionShape::I(dims) => {
                let y_bar = dims.centroid_from_bottom();
                (
                    dims.top_flange_width.max(dims.bottom_flange_width),
                    y_bar,
                    dims.depth - y_bar,
                )
            }
            SectionShape::General => (0.0, 0.0, 0.0),
        };
        cardinal.offset(width, c_bottom, c_top)
    }
}

/// Insertion point of a frame element relative to its section, numbered 1–11.
///
/// ```text
///   7 ─── 8 ─── 9
///   │           │
///   4     5     6      10 = centroid, 11 = shear center
///   │           │
///   1 ─── 2 ─── 3
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CardinalPoint {
    /// Bottom left.
    BottomLeft,
    /// Bottom center.
    BottomCenter,
    /// Bottom right.
    BottomRight,
    /// Middle left.
    MiddleLeft,
    /// Middle center.
    MiddleCenter,
    /// Middle right.
    MiddleRight,
    /// Top left.
    TopLeft,
    /// Top center.
    TopCenter,
    /// Top right.
    TopRight,
    /// Centroid.
    #[default]
    Centroid,
    /// Shear center.
    ShearCenter,
}

impl CardinalPoint {
    /// Offset from the insertion node to the centroid.
    fn offset(self, width: f64, c_bottom: f64, c_top: f64) -> (f64, f64) {
        use CardinalPoint::*;
        let e3 = match self {
            Centroid | ShearCenter => return (0.0, 0.0),
            BottomLeft | BottomCenter | BottomRight => c_bottom,
            MiddleLeft | MiddleCenter | MiddleRight => 0.0,
            TopLeft | TopCenter | TopRight => -c_top,
        };
        let e2 = match self {
            BottomLeft | MiddleLeft | TopLeft => 0.5 * width,
            BottomRight | MiddleRight | TopRight => -0.5 * width,
            _ => 0.0,
        };
        (e2, e3)
    }
}

impl TryFrom<u8> for CardinalPoint {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use CardinalPoint::*;
        Ok(match value {
            1 => BottomLeft,
            2 => BottomCenter,
            3 => BottomRight,
            4 => MiddleLeft,
            5 => MiddleCenter,
            6 => MiddleRight,
            7 => TopLeft,
            8 => TopCenter,
            9 => TopRight,
            10 => Centroid,
            11 => ShearCenter,
            other => return Err(format!("cardinal point must be 1-11 (received {other})")),
        })
    }
}

impl From<CardinalPoint> for u8 {
    fn from(value: CardinalPoint) -> Self {
        value as u8 + 1
    }
}
