//! Code for performing the capacity-sizing optimisation.
//!
//! This sizes the minimum combined solar/wind nameplate capacity which covers an hourly demand
//! series under a balance policy. The problem has exactly two decision variables, so it solves
//! in well under a second even for a full year of hourly constraints.
use crate::demand::DemandSeries;
use crate::units::{Capacity, Dimensionless, Power};
use anyhow::{Result, anyhow, ensure};
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use log::{debug, warn};
use serde::Deserialize;

/// The sizing heuristics, with the source model's values as defaults.
///
/// These materially change sizing outcomes, so they are tunable per model rather than baked-in
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SizingPolicy {
    /// Lower edge of the demand band retained for coverage constraints, as a fraction of mean
    /// demand
    pub band_lower: Dimensionless,
    /// Upper edge of the demand band, as a fraction of mean demand
    pub band_upper: Dimensionless,
    /// Minimum share of mean demand supplied by the technology with the higher CUF
    pub major_share: Dimensionless,
    /// Minimum share of mean demand supplied by the other technology
    pub minor_share: Dimensionless,
    /// Cap on combined generation, as a fraction of mean demand
    pub oversize_limit: Dimensionless,
    /// CUF difference below which the solar-preference tie-break applies
    pub cuf_tie_tolerance: f64,
    /// Objective weight on solar capacity; below 1 this makes solar the preferred technology.
    /// With the historical value of 0.9 the objective is not the plain capacity sum, so any
    /// slack the constraints leave is allocated to solar first. Set to 1.0 for an unweighted
    /// minimum-capacity objective.
    pub solar_cost_preference: f64,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            band_lower: Dimensionless(0.6),
            band_upper: Dimensionless(1.4),
            major_share: Dimensionless(0.8),
            minor_share: Dimensionless(0.2),
            oversize_limit: Dimensionless(1.3),
            cuf_tie_tolerance: 0.01,
            solar_cost_preference: 0.9,
        }
    }
}

/// Estimated generation at the sized capacities for one hour of the input series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyDispatch {
    /// Hour index from the demand series
    pub hour: u32,
    /// Demand for that hour
    pub demand: Power,
    /// Estimated solar generation
    pub solar_generation: Power,
    /// Estimated wind generation
    pub wind_generation: Power,
    /// Combined estimated generation
    pub total_generation: Power,
}

/// The solution to the capacity-sizing problem.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingOutcome {
    /// Sized solar nameplate capacity
    pub solar_capacity: Capacity,
    /// Sized wind nameplate capacity
    pub wind_capacity: Capacity,
    /// The input series annotated with estimated generation at the sized capacities
    pub dispatch: Vec<HourlyDispatch>,
}

/// Size the minimum-cost solar/wind capacity which covers the demand series.
///
/// A CUF of zero excludes that technology; at least one CUF must be positive. The constraint set
/// is restricted to hours within the policy's demand band around the mean, so the plant is sized
/// to a typical operating band rather than to rare extremes; if the band excludes every hour the
/// unfiltered series is used instead.
///
/// An infeasible problem (typically a series too scattered for the over-sizing cap) is an error,
/// not a pair of zero capacities; callers must not treat a failed sizing as a free plant.
pub fn optimise_generation_capacity(
    demand: &DemandSeries,
    solar_cuf: Dimensionless,
    wind_cuf: Dimensionless,
    policy: &SizingPolicy,
) -> Result<SizingOutcome> {
    for (name, cuf) in [("solar", solar_cuf), ("wind", wind_cuf)] {
        ensure!(
            (0.0..=1.0).contains(&cuf.value()),
            "The {name} CUF must be between 0 and 1"
        );
    }
    ensure!(
        solar_cuf > Dimensionless(0.0) || wind_cuf > Dimensionless(0.0),
        "Both CUFs are zero; no technology is available to size"
    );

    let mean = demand.mean();
    let band = (mean * policy.band_lower, mean * policy.band_upper);
    let mut retained: Vec<Power> = demand
        .iter()
        .map(|entry| entry.demand)
        .filter(|&d| d >= band.0 && d <= band.1)
        .collect();
    if retained.is_empty() {
        // Entirely flat or entirely scattered data; size against the unfiltered series
        warn!(
            "No demand falls within {}-{}% of the mean; using the unfiltered series",
            policy.band_lower.value() * 100.0,
            policy.band_upper.value() * 100.0
        );
        retained = demand.iter().map(|entry| entry.demand).collect();
    }
    debug!(
        "Sizing against {} of {} hours (mean demand {})",
        retained.len(),
        demand.len(),
        mean.value()
    );

    // Set up problem. Variable ordering is fixed (solar first) so solver tie-breaking is
    // deterministic for fixed inputs.
    let mut problem = Problem::default();
    let solar = problem.add_column(policy.solar_cost_preference, 0.0..);
    let wind = problem.add_column(1.0, 0.0..);

    // Coverage: generation at the sized capacities must meet every retained hour's demand
    for d in &retained {
        problem.add_row(
            d.value()..,
            [(solar, solar_cuf.value()), (wind, wind_cuf.value())],
        );
    }

    // Minimum-contribution split between the technologies, or full coverage of the mean by the
    // single active technology
    if solar_cuf > Dimensionless(0.0) && wind_cuf > Dimensionless(0.0) {
        let (major, major_cuf, minor, minor_cuf) = if solar_cuf >= wind_cuf {
            (solar, solar_cuf, wind, wind_cuf)
        } else {
            (wind, wind_cuf, solar, solar_cuf)
        };
        problem.add_row(
            (mean * policy.major_share).value()..,
            [(major, major_cuf.value())],
        );
        problem.add_row(
            (mean * policy.minor_share).value()..,
            [(minor, minor_cuf.value())],
        );
    } else if solar_cuf > Dimensionless(0.0) {
        problem.add_row(mean.value().., [(solar, solar_cuf.value())]);
    } else {
        problem.add_row(mean.value().., [(wind, wind_cuf.value())]);
    }

    // Cap combined generation to avoid gross over-sizing
    problem.add_row(
        ..=(mean * policy.oversize_limit).value(),
        [(solar, solar_cuf.value()), (wind, wind_cuf.value())],
    );

    // Deterministic tie resolution: when the CUFs are practically equal, prefer solar
    if solar_cuf > Dimensionless(0.0)
        && wind_cuf > Dimensionless(0.0)
        && (solar_cuf.value() - wind_cuf.value()).abs() < policy.cuf_tie_tolerance
    {
        problem.add_row(0.0.., [(solar, solar_cuf.value()), (wind, -wind_cuf.value())]);
    }

    // Solve problem
    let solution = problem.optimise(Sense::Minimise).solve();
    match solution.status() {
        HighsModelStatus::Optimal => {
            let columns = solution.get_solution().columns().to_vec();
            let solar_capacity = Capacity(columns[0].max(0.0));
            let wind_capacity = Capacity(columns[1].max(0.0));

            let dispatch = demand
                .iter()
                .map(|entry| {
                    let solar_generation = solar_capacity.at_utilisation(solar_cuf);
                    let wind_generation = wind_capacity.at_utilisation(wind_cuf);
                    HourlyDispatch {
                        hour: entry.hour,
                        demand: entry.demand,
                        solar_generation,
                        wind_generation,
                        total_generation: solar_generation + wind_generation,
                    }
                })
                .collect();

            Ok(SizingOutcome {
                solar_capacity,
                wind_capacity,
                dispatch,
            })
        }
        status => Err(anyhow!("Could not size capacity: {status:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::DemandEntry;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn series(demands: &[f64]) -> DemandSeries {
        DemandSeries::new(
            demands
                .iter()
                .enumerate()
                .map(|(hour, &demand)| DemandEntry {
                    hour: hour as u32,
                    demand: Power(demand),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_solar_only_covers_flat_demand() {
        // A flat series survives the band filter in full, so solar alone must cover the mean
        let demand = series(&[100.0; 24]);
        let outcome = optimise_generation_capacity(
            &demand,
            Dimensionless(0.2),
            Dimensionless(0.0),
            &SizingPolicy::default(),
        )
        .unwrap();

        assert_approx_eq!(f64, outcome.solar_capacity.value(), 500.0, epsilon = 1e-6);
        assert_approx_eq!(f64, outcome.wind_capacity.value(), 0.0, epsilon = 1e-6);

        let hour = &outcome.dispatch[0];
        assert_approx_eq!(f64, hour.solar_generation.value(), 100.0, epsilon = 1e-6);
        assert_approx_eq!(f64, hour.total_generation.value(), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_wind_major_when_cuf_higher() {
        // Wind has the higher CUF, so it takes the 80% share and solar the 20% share; both
        // lower bounds are binding at the optimum
        let demand = series(&[100.0; 24]);
        let outcome = optimise_generation_capacity(
            &demand,
            Dimensionless(0.19),
            Dimensionless(0.29),
            &SizingPolicy::default(),
        )
        .unwrap();

        assert_approx_eq!(
            f64,
            outcome.wind_capacity.value(),
            80.0 / 0.29,
            epsilon = 1e-6
        );
        assert_approx_eq!(
            f64,
            outcome.solar_capacity.value(),
            20.0 / 0.19,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_tie_break_prefers_solar() {
        let demand = series(&[100.0; 24]);
        let outcome = optimise_generation_capacity(
            &demand,
            Dimensionless(0.2),
            Dimensionless(0.2),
            &SizingPolicy::default(),
        )
        .unwrap();

        assert!(outcome.solar_capacity >= outcome.wind_capacity);
        assert_approx_eq!(f64, outcome.solar_capacity.value(), 400.0, epsilon = 1e-6);
        assert_approx_eq!(f64, outcome.wind_capacity.value(), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_both_cufs_zero_is_an_error() {
        let demand = series(&[100.0; 24]);
        let result = optimise_generation_capacity(
            &demand,
            Dimensionless(0.0),
            Dimensionless(0.0),
            &SizingPolicy::default(),
        );
        assert!(result.is_err());
    }

    #[rstest]
    #[case(1.5)] // CUF above 1
    #[case(-0.1)] // negative CUF
    fn test_invalid_cuf_is_an_error(#[case] cuf: f64) {
        let demand = series(&[100.0; 24]);
        let result = optimise_generation_capacity(
            &demand,
            Dimensionless(cuf),
            Dimensionless(0.2),
            &SizingPolicy::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_infeasible_series_is_an_error() {
        // The 135 hour sits inside the band, so coverage demands 135% of the mean while the
        // over-sizing cap allows 130%
        let demand = series(&[100.0, 135.0, 65.0]);
        let result = optimise_generation_capacity(
            &demand,
            Dimensionless(0.2),
            Dimensionless(0.3),
            &SizingPolicy::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_scattered_series_falls_back_to_unfiltered() {
        // No hour is within 60-140% of the mean; the fallback uses the whole series, which the
        // over-sizing cap then makes infeasible. This must surface as an error, not a panic.
        let demand = series(&[10.0, 190.0]);
        let result = optimise_generation_capacity(
            &demand,
            Dimensionless(0.2),
            Dimensionless(0.3),
            &SizingPolicy::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let demand = series(&[90.0, 100.0, 110.0, 105.0]);
        let first = optimise_generation_capacity(
            &demand,
            Dimensionless(0.19),
            Dimensionless(0.29),
            &SizingPolicy::default(),
        )
        .unwrap();
        let second = optimise_generation_capacity(
            &demand,
            Dimensionless(0.19),
            Dimensionless(0.29),
            &SizingPolicy::default(),
        )
        .unwrap();
        assert_eq!(first, second);
    }
}
