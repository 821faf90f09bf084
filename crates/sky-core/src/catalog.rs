//! Static catalog of named bright stars with constellation figure links.
//!
//! Coordinates are J2000 right ascension / declination, stored in radians.
//! The table is a fixed external dataset: it is read at scene construction
//! and never mutated.

use std::f32::consts::PI;

/// Harvard spectral classification, hottest to coolest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpectralClass {
    O,
    B,
    A,
    F,
    G,
    K,
    M,
}

/// One immutable entry of the bright-star catalog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CatalogStar {
    pub name: &'static str,
    /// Right ascension in radians, `[0, 2π)`.
    pub ra: f32,
    /// Declination in radians, `[-π/2, π/2]`.
    pub dec: f32,
    /// Apparent visual magnitude (lower is brighter).
    pub magnitude: f32,
    pub spectral: Option<SpectralClass>,
    pub constellation: Option<&'static str>,
    /// Names of stars this one is joined to in its constellation figure.
    /// Only one direction needs to be listed.
    pub links: &'static [&'static str],
}

impl CatalogStar {
    /// Whether this star declares any figure links of its own.
    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }
}

const DEG: f32 = PI / 180.0;

const fn star(
    name: &'static str,
    ra_deg: f32,
    dec_deg: f32,
    magnitude: f32,
    spectral: SpectralClass,
    constellation: Option<&'static str>,
    links: &'static [&'static str],
) -> CatalogStar {
    CatalogStar {
        name,
        ra: ra_deg * DEG,
        dec: dec_deg * DEG,
        magnitude,
        spectral: Some(spectral),
        constellation,
        links,
    }
}

use SpectralClass::{A, B, F, G, K, M, O};

const ORI: Option<&str> = Some("Orion");
const UMA: Option<&str> = Some("Ursa Major");
const CAS: Option<&str> = Some("Cassiopeia");
const CYG: Option<&str> = Some("Cygnus");
const LYR: Option<&str> = Some("Lyra");
const AQL: Option<&str> = Some("Aquila");
const SCO: Option<&str> = Some("Scorpius");
const CRU: Option<&str> = Some("Crux");
const LEO: Option<&str> = Some("Leo");
const GEM: Option<&str> = Some("Gemini");
const TAU: Option<&str> = Some("Taurus");
const CMA: Option<&str> = Some("Canis Major");

/// Catalog revision. Bump when entries or links change.
pub const CATALOG_VERSION: u32 = 3;

/// The bright-star table.
pub static BRIGHT_STARS: &[CatalogStar] = &[
    // Orion
    star("Betelgeuse", 88.79, 7.41, 0.50, M, ORI, &["Meissa", "Bellatrix", "Alnitak"]),
    star("Rigel", 78.63, -8.20, 0.13, B, ORI, &["Mintaka"]),
    star("Bellatrix", 81.28, 6.35, 1.64, B, ORI, &["Mintaka", "Meissa"]),
    star("Mintaka", 83.00, -0.30, 2.23, O, ORI, &["Alnilam"]),
    star("Alnilam", 84.05, -1.20, 1.69, B, ORI, &["Alnitak"]),
    star("Alnitak", 85.19, -1.94, 1.77, O, ORI, &["Saiph"]),
    star("Saiph", 86.94, -9.67, 2.06, B, ORI, &[]),
    star("Meissa", 83.78, 9.93, 3.39, O, ORI, &[]),
    // Ursa Major
    star("Dubhe", 165.93, 61.75, 1.79, K, UMA, &["Merak", "Megrez"]),
    star("Merak", 165.46, 56.38, 2.37, A, UMA, &["Phecda"]),
    star("Phecda", 178.46, 53.69, 2.44, A, UMA, &["Megrez"]),
    star("Megrez", 183.86, 57.03, 3.31, A, UMA, &["Alioth"]),
    star("Alioth", 193.51, 55.96, 1.77, A, UMA, &["Mizar"]),
    star("Mizar", 200.98, 54.93, 2.27, A, UMA, &["Alkaid"]),
    star("Alkaid", 206.89, 49.31, 1.86, B, UMA, &[]),
    // Cassiopeia
    star("Caph", 2.29, 59.15, 2.27, F, CAS, &["Schedar"]),
    star("Schedar", 10.13, 56.54, 2.24, K, CAS, &["Navi"]),
    star("Navi", 14.18, 60.72, 2.47, B, CAS, &["Ruchbah"]),
    star("Ruchbah", 21.45, 60.24, 2.68, A, CAS, &["Segin"]),
    star("Segin", 28.60, 63.67, 3.38, B, CAS, &[]),
    // Cygnus
    star("Deneb", 310.36, 45.28, 1.25, A, CYG, &["Sadr"]),
    star("Sadr", 305.56, 40.26, 2.23, F, CYG, &["Albireo", "Gienah", "Fawaris"]),
    star("Gienah", 311.55, 33.97, 2.48, K, CYG, &[]),
    star("Fawaris", 296.24, 45.13, 2.87, B, CYG, &[]),
    star("Albireo", 292.68, 27.96, 3.05, K, CYG, &[]),
    // Lyra
    star("Vega", 279.23, 38.78, 0.03, A, LYR, &["Zeta Lyrae"]),
    star("Zeta Lyrae", 281.19, 37.61, 4.36, A, LYR, &["Sheliak", "Delta Lyrae"]),
    star("Sheliak", 282.52, 33.36, 3.52, B, LYR, &["Sulafat"]),
    star("Sulafat", 284.74, 32.69, 3.25, B, LYR, &["Delta Lyrae"]),
    star("Delta Lyrae", 283.63, 36.90, 4.22, M, LYR, &[]),
    // Aquila
    star("Altair", 297.70, 8.87, 0.77, A, AQL, &["Tarazed", "Alshain"]),
    star("Tarazed", 296.56, 10.61, 2.72, K, AQL, &[]),
    star("Alshain", 298.83, 6.41, 3.71, G, AQL, &[]),
    // Scorpius
    star("Antares", 247.35, -26.43, 1.06, M, SCO, &["Dschubba", "Paikauhale"]),
    star("Dschubba", 240.08, -22.62, 2.29, B, SCO, &["Acrab", "Fang"]),
    star("Acrab", 241.36, -19.81, 2.62, B, SCO, &[]),
    star("Fang", 239.71, -26.11, 2.89, B, SCO, &[]),
    star("Paikauhale", 248.97, -28.22, 2.82, B, SCO, &["Larawag"]),
    star("Larawag", 252.54, -34.29, 2.29, K, SCO, &["Sargas"]),
    star("Sargas", 264.33, -43.00, 1.86, F, SCO, &["Shaula"]),
    star("Shaula", 263.40, -37.10, 1.62, B, SCO, &["Lesath"]),
    star("Lesath", 262.69, -37.30, 2.70, B, SCO, &[]),
    // Crux
    star("Acrux", 186.65, -63.10, 0.76, B, CRU, &["Gacrux"]),
    star("Mimosa", 191.93, -59.69, 1.25, B, CRU, &["Imai"]),
    star("Gacrux", 187.79, -57.11, 1.63, M, CRU, &[]),
    star("Imai", 183.79, -58.75, 2.79, B, CRU, &[]),
    // Leo
    star("Regulus", 152.09, 11.97, 1.35, B, LEO, &["Algieba", "Chertan"]),
    star("Algieba", 154.99, 19.84, 2.08, K, LEO, &["Adhafera", "Zosma"]),
    star("Adhafera", 154.17, 23.42, 3.43, F, LEO, &["Rasalas"]),
    star("Rasalas", 146.46, 23.77, 2.98, G, LEO, &[]),
    star("Zosma", 168.53, 20.52, 2.56, A, LEO, &["Denebola", "Chertan"]),
    star("Chertan", 168.56, 15.43, 3.33, A, LEO, &["Denebola"]),
    star("Denebola", 177.26, 14.57, 2.13, A, LEO, &[]),
    // Gemini (Castor and Pollux list each other on purpose)
    star("Castor", 113.65, 31.89, 1.58, A, GEM, &["Pollux", "Mebsuta"]),
    star("Pollux", 116.33, 28.03, 1.14, K, GEM, &["Castor", "Wasat"]),
    star("Alhena", 99.43, 16.40, 1.93, A, GEM, &["Wasat"]),
    star("Mebsuta", 100.98, 25.13, 3.06, G, GEM, &[]),
    star("Wasat", 110.03, 21.98, 3.53, F, GEM, &[]),
    // Taurus
    star("Aldebaran", 68.98, 16.51, 0.85, K, TAU, &["Tianguan", "Ain"]),
    star("Ain", 67.15, 19.18, 3.53, K, TAU, &["Elnath"]),
    star("Elnath", 81.57, 28.61, 1.65, B, TAU, &[]),
    star("Tianguan", 84.41, 21.14, 3.00, B, TAU, &[]),
    star("Alcyone", 56.87, 24.11, 2.87, B, TAU, &[]),
    // Canis Major
    star("Sirius", 101.29, -16.72, -1.46, A, CMA, &["Mirzam", "Wezen"]),
    star("Wezen", 107.10, -26.39, 1.83, F, CMA, &["Adhara", "Aludra"]),
    star("Adhara", 104.66, -28.97, 1.50, B, CMA, &[]),
    star("Mirzam", 95.67, -17.96, 1.98, B, CMA, &[]),
    star("Aludra", 111.02, -29.30, 2.45, B, CMA, &[]),
    // Unfigured bright stars
    star("Canopus", 95.99, -52.70, -0.74, F, None, &[]),
    star("Rigil Kentaurus", 219.90, -60.83, -0.27, G, None, &[]),
    star("Arcturus", 213.92, 19.18, -0.05, K, None, &[]),
    star("Capella", 79.17, 46.00, 0.08, G, None, &[]),
    star("Procyon", 114.83, 5.22, 0.34, F, None, &[]),
    star("Achernar", 24.43, -57.24, 0.46, B, None, &[]),
    star("Hadar", 210.96, -60.37, 0.61, B, None, &[]),
    star("Spica", 201.30, -11.16, 0.97, B, None, &[]),
    star("Fomalhaut", 344.41, -29.62, 1.16, A, None, &[]),
    star("Polaris", 37.95, 89.26, 1.98, F, None, &[]),
];

/// Look up a catalog entry by exact name.
pub fn find(name: &str) -> Option<&'static CatalogStar> {
    BRIGHT_STARS.iter().find(|s| s.name == name)
}
