//! The fixed catalog of standard theory plots.

/// Speed of light in km/s; converts the stored H(z) into km/s/Mpc
pub const SPEED_OF_LIGHT_KMS: f64 = 2.99792458e5;

/// One matter power source drawn on the matter power plot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSource {
    pub section: &'static str,
    pub power: &'static str,
    pub label: &'static str,
}

/// Power sections overlaid on the matter power plot, in drawing order
pub const POWER_SOURCES: &[PowerSource] = &[
    PowerSource { section: "matter_power_lin", power: "p_k", label: "Linear" },
    PowerSource { section: "matter_power_nl", power: "p_k", label: "Non-Linear" },
    PowerSource { section: "matter_power_gal", power: "p_k", label: "Galaxy" },
    PowerSource { section: "matter_power_no_bao", power: "p_k", label: "No BAO" },
    PowerSource { section: "intrinsic_alignment_parameters", power: "p_ii", label: "Intrinsic-intrinsic" },
    PowerSource { section: "intrinsic_alignment_parameters", power: "p_gi", label: "Shear-intrinsic" },
];

/// The four CMB spectra, in legend order
pub const CMB_SPECTRA: &[&str] = &["tt", "ee", "te", "bb"];

/// A lower-triangular grid of per-bin-pair panels for tomographic data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleSpec {
    /// Section holding `bin_i_j.txt` files; it also decides the bin count
    pub section: &'static str,
    /// Further sections overlaid on the same panels when present
    pub overlays: &'static [&'static str],
    /// Array holding the shared x values (`ell` or `theta`)
    pub x_array: &'static str,
    pub x_range: Option<(f64, f64)>,
    pub y_range: (f64, f64),
    /// Plot ell (ell + 1) C_ell / 2 pi instead of the raw values
    pub ell_weighted: bool,
    /// Negate a bin pair whose values are all non-positive
    pub flip_sign: bool,
    /// Mesh lines and `(i,j)` tags on the primary section's panels
    pub annotate: bool,
}

/// What a plot draws and how
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlotKind {
    /// `distances/z` against a distance array, multiplied by `scaling`
    Distance { array: &'static str, scaling: f64 },
    /// One CMB spectrum against `cmb_cl/ell`, optionally capped in ell
    CmbSpectrum { spectrum: &'static str, ell_max: Option<f64> },
    /// All CMB spectra in magnitude on log-log axes
    GrandCmb,
    /// Every available entry of [`POWER_SOURCES`] on log-log axes
    MatterPower,
    Triangle(TriangleSpec),
    /// `growth_parameters`: d(z) and f(z)
    Growth,
    /// `galaxy_luminosity_function`: alpha(z)
    LuminositySlope,
}

/// A plot known at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotDescriptor {
    /// Base of the output filename
    pub filename: &'static str,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub kind: PlotKind,
}

const REDSHIFT: &str = "Redshift z";
const ELL: &str = "ℓ";

pub static CATALOG: &[PlotDescriptor] = &[
    PlotDescriptor {
        filename: "angular_distance",
        title: "Angular Diameter Distance",
        x_label: REDSHIFT,
        y_label: "Angular Diameter Distance D_A / Mpc",
        kind: PlotKind::Distance { array: "d_a", scaling: 1.0 },
    },
    PlotDescriptor {
        filename: "luminosity_distance",
        title: "Luminosity Distance",
        x_label: REDSHIFT,
        y_label: "Luminosity Distance D_L / Mpc",
        kind: PlotKind::Distance { array: "d_l", scaling: 1.0 },
    },
    PlotDescriptor {
        filename: "comoving_distance",
        title: "Comoving Distance",
        x_label: REDSHIFT,
        y_label: "Comoving Distance D_M / Mpc",
        kind: PlotKind::Distance { array: "d_m", scaling: 1.0 },
    },
    PlotDescriptor {
        filename: "hubble",
        title: "Hubble Parameter",
        x_label: REDSHIFT,
        y_label: "Hubble Parameter H(z) / (km/s/Mpc)",
        kind: PlotKind::Distance { array: "h", scaling: SPEED_OF_LIGHT_KMS },
    },
    PlotDescriptor {
        filename: "distance_modulus",
        title: "Distance Modulus",
        x_label: REDSHIFT,
        y_label: "Distance Modulus μ",
        kind: PlotKind::Distance { array: "mu", scaling: 1.0 },
    },
    PlotDescriptor {
        filename: "tt",
        title: "CMB TT",
        x_label: ELL,
        y_label: "ℓ(ℓ+1) C_ℓ/2π TT / μK²",
        kind: PlotKind::CmbSpectrum { spectrum: "tt", ell_max: None },
    },
    PlotDescriptor {
        filename: "ee",
        title: "CMB EE",
        x_label: ELL,
        y_label: "ℓ(ℓ+1) C_ℓ/2π EE / μK²",
        kind: PlotKind::CmbSpectrum { spectrum: "ee", ell_max: None },
    },
    PlotDescriptor {
        filename: "te",
        title: "CMB TE",
        x_label: ELL,
        y_label: "ℓ(ℓ+1) C_ℓ/2π TE / μK²",
        kind: PlotKind::CmbSpectrum { spectrum: "te", ell_max: None },
    },
    PlotDescriptor {
        filename: "bb",
        title: "CMB BB",
        x_label: ELL,
        y_label: "ℓ(ℓ+1) C_ℓ/2π BB / μK²",
        kind: PlotKind::CmbSpectrum { spectrum: "bb", ell_max: Some(400.0) },
    },
    PlotDescriptor {
        filename: "grand",
        title: "CMB Spectra",
        x_label: ELL,
        y_label: "ℓ(ℓ+1) C_ℓ/2π / μK²",
        kind: PlotKind::GrandCmb,
    },
    PlotDescriptor {
        filename: "matter_power",
        title: "Matter Power Spectrum",
        x_label: "k / (h/Mpc)",
        y_label: "P(k) / (Mpc/h)³",
        kind: PlotKind::MatterPower,
    },
    PlotDescriptor {
        filename: "shear_power",
        title: "Shear Power Spectra",
        x_label: ELL,
        y_label: "ℓ(ℓ+1) C_ℓ / 2π",
        kind: PlotKind::Triangle(TriangleSpec {
            section: "shear_cl",
            overlays: &["shear_cl_gg", "shear_cl_gi", "shear_cl_ii"],
            x_array: "ell",
            x_range: None,
            y_range: (1e-8, 1e-3),
            ell_weighted: true,
            flip_sign: true,
            annotate: true,
        }),
    },
    PlotDescriptor {
        filename: "matter_power_2d",
        title: "2D Matter Power Spectra",
        x_label: ELL,
        y_label: "ℓ(ℓ+1) C_ℓ / 2π",
        kind: PlotKind::Triangle(TriangleSpec {
            section: "matter_cl",
            overlays: &[],
            x_array: "ell",
            x_range: None,
            y_range: (1e-6, 1.0),
            ell_weighted: true,
            flip_sign: true,
            annotate: false,
        }),
    },
    PlotDescriptor {
        filename: "shear_xi_plus",
        title: "Shear Correlation ξ+",
        x_label: "θ",
        y_label: "ξ+(θ)",
        kind: PlotKind::Triangle(TriangleSpec {
            section: "shear_xi_plus",
            overlays: &[],
            x_array: "theta",
            x_range: Some((1e-4, 1e-1)),
            y_range: (2e-7, 1e-3),
            ell_weighted: false,
            flip_sign: false,
            annotate: true,
        }),
    },
    PlotDescriptor {
        filename: "shear_xi_minus",
        title: "Shear Correlation ξ-",
        x_label: "θ",
        y_label: "ξ-(θ)",
        kind: PlotKind::Triangle(TriangleSpec {
            section: "shear_xi_minus",
            overlays: &[],
            x_array: "theta",
            x_range: Some((1e-4, 1e-1)),
            y_range: (2e-7, 1e-3),
            ell_weighted: false,
            flip_sign: false,
            annotate: true,
        }),
    },
    PlotDescriptor {
        filename: "growth",
        title: "Growth",
        x_label: REDSHIFT,
        y_label: "Growth Functions",
        kind: PlotKind::Growth,
    },
    PlotDescriptor {
        filename: "galaxy_luminosity_slope",
        title: "Galaxy Luminosity Function",
        x_label: REDSHIFT,
        y_label: "Luminosity Function Slope α",
        kind: PlotKind::LuminositySlope,
    },
];
