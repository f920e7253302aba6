use crate::error;
use crate::util::Result;
use gdal::spatial_ref::SpatialRef;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::str::FromStr;

/// A spatial reference authority that is part of a spatial reference definition
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum SpatialReferenceAuthority {
    Epsg,
    SrOrg,
    Iau2000,
    Esri,
}

impl SpatialReferenceAuthority {
    fn as_str(self) -> &'static str {
        match self {
            SpatialReferenceAuthority::Epsg => "EPSG",
            SpatialReferenceAuthority::SrOrg => "SR-ORG",
            SpatialReferenceAuthority::Iau2000 => "IAU2000",
            SpatialReferenceAuthority::Esri => "ESRI",
        }
    }
}

impl std::fmt::Display for SpatialReferenceAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpatialReferenceAuthority {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // GDAL reports authority names in varying case
        Ok(match s.to_ascii_uppercase().as_str() {
            "EPSG" => SpatialReferenceAuthority::Epsg,
            "SR-ORG" => SpatialReferenceAuthority::SrOrg,
            "IAU2000" | "IAU_2015" => SpatialReferenceAuthority::Iau2000,
            "ESRI" => SpatialReferenceAuthority::Esri,
            _ => {
                return Err(error::Error::InvalidSpatialReferenceString {
                    spatial_reference_string: s.into(),
                });
            }
        })
    }
}

/// A spatial reference consists of an authority and a code
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpatialReference {
    authority: SpatialReferenceAuthority,
    code: u32,
}

impl SpatialReference {
    pub fn new(authority: SpatialReferenceAuthority, code: u32) -> Self {
        Self { authority, code }
    }

    /// the WGS 84 spatial reference system
    pub fn epsg_4326() -> Self {
        Self::new(SpatialReferenceAuthority::Epsg, 4326)
    }

    pub fn authority(&self) -> SpatialReferenceAuthority {
        self.authority
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    /// Definition string understood by PROJ, e.g. `EPSG:4326`
    pub fn proj_string(self) -> String {
        self.to_string()
    }

    /// Identifies the authority and code of a GDAL spatial reference.
    ///
    /// If the definition carries no authority, GDAL is asked to find a matching EPSG code.
    pub fn from_gdal_spatial_ref(spatial_ref: &mut SpatialRef) -> Result<Self> {
        if let Ok(authority) = Self::authority_of(spatial_ref) {
            return Ok(authority);
        }

        spatial_ref
            .auto_identify_epsg()
            .map_err(|source| error::Error::UnidentifiedSpatialReference {
                reason: source.to_string(),
            })?;

        Self::authority_of(spatial_ref)
    }

    fn authority_of(spatial_ref: &SpatialRef) -> Result<Self> {
        let unidentified = |reason: String| error::Error::UnidentifiedSpatialReference { reason };

        let name = spatial_ref
            .auth_name()
            .ok_or_else(|| unidentified("missing authority name".to_string()))?;
        let code = spatial_ref
            .auth_code()
            .map_err(|source| unidentified(source.to_string()))?;

        let authority: SpatialReferenceAuthority = name.parse()?;
        let code = u32::try_from(code).map_err(|_| unidentified(format!("invalid code {code}")))?;

        Ok(Self::new(authority, code))
    }
}

impl std::fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

impl FromStr for SpatialReference {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((authority, code)) = s.split_once(':') else {
            return Err(error::Error::InvalidSpatialReferenceString {
                spatial_reference_string: s.into(),
            });
        };

        Ok(Self::new(
            authority.parse()?,
            code.parse::<u32>().context(error::ParseU32)?,
        ))
    }
}

impl TryFrom<String> for SpatialReference {
    type Error = error::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SpatialReference> for String {
    fn from(value: SpatialReference) -> Self {
        value.to_string()
    }
}

impl TryFrom<SpatialReference> for SpatialRef {
    type Error = error::Error;

    fn try_from(value: SpatialReference) -> Result<Self, Self::Error> {
        let spatial_ref = match value.authority {
            SpatialReferenceAuthority::Epsg => SpatialRef::from_epsg(value.code)?,
            _ => SpatialRef::from_definition(&value.proj_string())?,
        };
        Ok(spatial_ref)
    }
}

/// A spatial reference as a raster declares it.
///
/// Most rasters carry a definition GDAL can name by authority and code. Custom
/// projections without such a code are kept as their WKT, which PROJ understands as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpatialReferenceDefinition {
    Known(SpatialReference),
    Custom { wkt: String, proj4: Option<String> },
}

impl SpatialReferenceDefinition {
    /// Identifies a WKT projection string as returned by GDAL. An empty string has no definition.
    pub fn from_wkt(wkt: &str) -> Result<Option<Self>> {
        if wkt.trim().is_empty() {
            return Ok(None);
        }

        let mut spatial_ref = SpatialRef::from_wkt(wkt).map_err(|source| {
            error::Error::UnidentifiedSpatialReference {
                reason: source.to_string(),
            }
        })?;

        match SpatialReference::from_gdal_spatial_ref(&mut spatial_ref) {
            Ok(spatial_reference) => Ok(Some(spatial_reference.into())),
            Err(_) => Ok(Some(SpatialReferenceDefinition::Custom {
                wkt: wkt.to_string(),
                proj4: spatial_ref
                    .to_proj4()
                    .ok()
                    .map(|proj4| proj4.trim().to_string()),
            })),
        }
    }

    /// Definition string understood by PROJ
    pub fn proj_definition(&self) -> String {
        match self {
            SpatialReferenceDefinition::Known(spatial_reference) => spatial_reference.proj_string(),
            SpatialReferenceDefinition::Custom { wkt, .. } => wkt.clone(),
        }
    }
}

impl std::fmt::Display for SpatialReferenceDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpatialReferenceDefinition::Known(spatial_reference) => write!(f, "{spatial_reference}"),
            SpatialReferenceDefinition::Custom {
                proj4: Some(proj4), ..
            } => f.write_str(proj4),
            SpatialReferenceDefinition::Custom { proj4: None, .. } => f.write_str("custom WKT"),
        }
    }
}

impl From<SpatialReference> for SpatialReferenceDefinition {
    fn from(spatial_reference: SpatialReference) -> Self {
        Self::Known(spatial_reference)
    }
}

/// Checks whether a WKT projection string describes the same system as WGS 84.
///
/// An empty string is treated as "no reference", which is not the same as WGS 84.
pub fn wkt_is_wgs84(wkt: &str) -> Result<bool> {
    if wkt.trim().is_empty() {
        return Ok(false);
    }

    let declared = SpatialRef::from_wkt(wkt)?;
    let wgs84 = SpatialRef::try_from(SpatialReference::epsg_4326())?;

    Ok(declared == wgs84)
}
