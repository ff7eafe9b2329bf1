//! Filter design data: elliptic low-pass prototypes as pole/residue sets.
//!
//! Each preset describes the continuous-time impulse response of an
//! elliptic anti-aliasing filter as a sum of complex exponentials. Poles
//! are given in Hz-scaled s-plane units (multiply by `2π / sample_rate`
//! to get a per-sample exponent). Complex poles are stored once per
//! conjugate pair; their coefficients already account for the pair, so
//! the real part of the summed modes is the filter output.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Quality / cost tier of the anti-aliasing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    /// 11th order, 6 poles. Widest transition band.
    Fast,
    /// 31st order, 16 poles.
    #[default]
    Median,
    /// 25th order, 13 poles. Narrowest transition band.
    Best,
}

impl Quality {
    pub fn design(self) -> FilterDesign {
        FilterDesign::preset(self)
    }

    pub fn parse(name: &str) -> Option<Quality> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fast" => Some(Quality::Fast),
            "median" | "medium" => Some(Quality::Median),
            "best" => Some(Quality::Best),
            _ => None,
        }
    }
}

/// One exponential mode of the impulse response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pole {
    /// Location in the s-plane (Hz-scaled).
    pub location: Complex64,
    /// Coefficient for direct band-limited synthesis.
    pub coefficient: Complex64,
    /// Coefficient applied when an impulse is injected.
    pub impulse_coefficient: Complex64,
}

/// A complete low-pass prototype, real poles first.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDesign {
    poles: Vec<Pole>,
    real_count: usize,
    passband_edge: f64,
    stopband_edge: f64,
    order: usize,
}

impl FilterDesign {
    pub fn preset(quality: Quality) -> Self {
        let table = match quality {
            Quality::Fast => &FAST,
            Quality::Median => &MEDIAN,
            Quality::Best => &BEST,
        };
        Self::from_table(table)
    }

    /// Normalise a raw table: real poles become complex poles with a zero
    /// imaginary part so every later stage handles a single pole kind.
    fn from_table(table: &PoleTable) -> Self {
        let real = table
            .real_poles
            .iter()
            .zip(table.real_coeffs)
            .map(|(&p, &c)| (Complex64::new(p, 0.0), Complex64::new(c, 0.0)));
        let complex = table
            .complex_poles
            .iter()
            .zip(table.complex_coeffs)
            .map(|(&(pr, pi), &(cr, ci))| (Complex64::new(pr, pi), Complex64::new(cr, ci)));

        let poles = real
            .chain(complex)
            .map(|(location, coefficient)| Pole {
                location,
                coefficient,
                impulse_coefficient: coefficient,
            })
            .collect();

        FilterDesign {
            poles,
            real_count: table.real_poles.len(),
            passband_edge: table.passband_edge,
            stopband_edge: table.stopband_edge,
            order: table.order,
        }
    }

    /// Uniformly scale the design's frequency axis by `ratio`.
    ///
    /// Pole locations and both coefficient sets scale together, which keeps
    /// the DC gain unchanged. Band edges move with the poles.
    pub fn scaled(&self, ratio: f64) -> FilterDesign {
        FilterDesign {
            poles: self
                .poles
                .iter()
                .map(|p| Pole {
                    location: p.location * ratio,
                    coefficient: p.coefficient * ratio,
                    impulse_coefficient: p.impulse_coefficient * ratio,
                })
                .collect(),
            real_count: self.real_count,
            passband_edge: self.passband_edge * ratio,
            stopband_edge: self.stopband_edge * ratio,
            order: self.order,
        }
    }

    pub fn poles(&self) -> &[Pole] {
        &self.poles
    }

    pub fn pole_count(&self) -> usize {
        self.poles.len()
    }

    pub fn real_count(&self) -> usize {
        self.real_count
    }

    pub fn complex_count(&self) -> usize {
        self.poles.len() - self.real_count
    }

    pub fn passband_edge(&self) -> f64 {
        self.passband_edge
    }

    pub fn stopband_edge(&self) -> f64 {
        self.stopband_edge
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Continuous-time DC gain, `Σ Re(-coef / pole)`.
    ///
    /// A correctly conjugate-summing design reports 1.0 here.
    pub fn dc_gain(&self) -> f64 {
        self.poles
            .iter()
            .map(|p| (-p.impulse_coefficient / p.location).re)
            .sum()
    }
}

struct PoleTable {
    order: usize,
    passband_edge: f64,
    stopband_edge: f64,
    real_poles: &'static [f64],
    real_coeffs: &'static [f64],
    complex_poles: &'static [(f64, f64)],
    complex_coeffs: &'static [(f64, f64)],
}

static FAST: PoleTable = PoleTable {
    order: 11,
    passband_edge: 20000.0,
    stopband_edge: 24162.255926,
    real_poles: &[-6297.9970566057245],
    real_coeffs: &[10260.028875848706],
    complex_poles: &[
        (-5561.982558545558, 7721.564144482831),
        (-3936.7227375705806, 13650.197801811304),
        (-2348.139919173165, 17360.271619482097),
        (-1177.5927594523114, 19350.80475283362),
        (-351.83634005467775, 20192.238514865294),
    ],
    complex_coeffs: &[
        (-16437.98665421065, -7224.765894589879),
        (7790.757942544076, 9526.642450543113),
        (-840.5346697125525, -6786.810488747387),
        (-1524.1587677384439, 2562.99591951713),
        (754.6036883901486, -311.82754418710147),
    ],
};

static BEST: PoleTable = PoleTable {
    order: 25,
    passband_edge: 20000.0,
    stopband_edge: 21519.444876,
    real_poles: &[-3220.8580773215253],
    real_coeffs: &[6398.961287622787],
    complex_poles: &[
        (-3107.20033188021, 3937.2767519207428),
        (-2796.8774913957623, 7594.756479446776),
        (-2365.3544452925835, 10768.381294489338),
        (-1897.3856301331662, 13364.957940627544),
        (-1458.0144993104516, 15389.983964901507),
        (-1082.507625108592, 16910.579125449884),
        (-781.1559131200345, 18018.5367689135),
        (-547.7046243450372, 18804.09729515833),
        (-373.4740738743549, 19347.60842644775),
        (-233.77919322514572, 19702.644871990433),
        (-135.28926799549754, 19921.188456038082),
        (-40.438395472254115, 20022.29903816022),
    ],
    complex_coeffs: &[
        (-11919.560816626928, -3187.094087204454),
        (9573.988224127786, 5583.81708412599),
        (-6473.456636950629, -6730.189208126382),
        (3407.4300575641755, 6619.944984894173),
        (-947.4387125888132, -5588.352305214937),
        (-659.5593971973356, 4096.061890356017),
        (1436.828633360112, -2552.3776755275653),
        (-1552.5358812051302, 1240.0339328949058),
        (1236.9831816533112, -299.0830011099097),
        (-725.3145127398764, -185.6291417942369),
        (238.53811357512163, 245.88830839157475),
        (-14.863693809439255, -95.41444051497662),
    ],
};

static MEDIAN: PoleTable = PoleTable {
    order: 31,
    passband_edge: 20000.0,
    stopband_edge: 22860.703061,
    real_poles: &[-1665.6107015924313],
    real_coeffs: &[3701.7745354960616],
    complex_poles: &[
        (-1657.064991727588, 2030.3709936736682),
        (-1631.5155526840529, 4039.9076334216516),
        (-1589.22455609047, 6007.98935371133),
        (-1530.6259676390623, 7914.42098391937),
        (-1456.3210744583446, 9739.639746935942),
        (-1367.072303344283, 11464.918812590095),
        (-1263.7959846637345, 13072.536002741135),
        (-1147.5537515429705, 14546.098345342754),
        (-1019.4902800952609, 15870.05342459448),
        (-881.261296572322, 17032.185897416777),
        (-732.8349611763269, 18017.257290243266),
        (-579.9625583636853, 18821.168970742823),
        (-415.41300947022137, 19427.835254646732),
        (-253.85373389728466, 19837.696087655913),
        (-83.83083222809682, 20043.733916645127),
    ],
    complex_coeffs: &[
        (-7269.7460840146705, -1153.6269644681408),
        (6873.9542615465725, 2249.49832298613),
        (-6233.112927451221, -3231.169694944071),
        (5375.748825117238, 4044.9447064582955),
        (-4342.417812290342, -4641.588122002079),
        (3186.3241606693873, 4978.553313650463),
        (-1973.9766005177996, -5022.861171159246),
        (785.8873993487103, 4756.269778694196),
        (282.71569506386146, -4178.84598080273),
        (-1128.9180148279086, 3326.1903438907666),
        (1631.5917883946736, -2275.2905592146767),
        (-1707.0096964687405, 1163.2285588293264),
        (1328.988643728629, -240.92580418306122),
        (-645.8144945563864, -213.67190644324154),
        (134.01030057976817, 147.25859917059154),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Quality; 3] = [Quality::Fast, Quality::Median, Quality::Best];

    #[test]
    fn pole_counts_match_tables() {
        let fast = FilterDesign::preset(Quality::Fast);
        assert_eq!(fast.real_count(), 1);
        assert_eq!(fast.complex_count(), 5);
        assert_eq!(fast.pole_count(), 6);
        assert_eq!(fast.order(), 11);

        let median = FilterDesign::preset(Quality::Median);
        assert_eq!(median.pole_count(), 16);
        assert_eq!(median.order(), 31);

        let best = FilterDesign::preset(Quality::Best);
        assert_eq!(best.pole_count(), 13);
        assert_eq!(best.order(), 25);
    }

    #[test]
    fn real_poles_come_first_with_zero_imaginary_part() {
        for q in ALL {
            let design = q.design();
            for pole in &design.poles()[..design.real_count()] {
                assert_eq!(pole.location.im, 0.0);
                assert_eq!(pole.coefficient.im, 0.0);
            }
            for pole in &design.poles()[design.real_count()..] {
                assert!(pole.location.im > 0.0, "{q:?}: complex pole stored with im <= 0");
            }
        }
    }

    #[test]
    fn all_poles_are_stable() {
        for q in ALL {
            assert!(q.design().poles().iter().all(|p| p.location.re < 0.0));
        }
    }

    #[test]
    fn presets_have_unit_dc_gain() {
        for q in ALL {
            let gain = q.design().dc_gain();
            assert!((gain - 1.0).abs() < 1e-6, "{q:?} DC gain {gain}");
        }
    }

    #[test]
    fn scaling_preserves_dc_gain_and_moves_edges() {
        let design = Quality::Fast.design();
        let scaled = design.scaled(0.4);
        assert!((scaled.dc_gain() - design.dc_gain()).abs() < 1e-12);
        assert!((scaled.passband_edge() - 8000.0).abs() < 1e-9);
        assert!(scaled.stopband_edge() > scaled.passband_edge());
        assert_eq!(scaled.pole_count(), design.pole_count());
    }

    #[test]
    fn quality_parses_names() {
        assert_eq!(Quality::parse("Fast"), Some(Quality::Fast));
        assert_eq!(Quality::parse(" best "), Some(Quality::Best));
        assert_eq!(Quality::parse("medium"), Some(Quality::Median));
        assert_eq!(Quality::parse("ultra"), None);
    }
}
