//! General functions related to finance.
//!
//! Cash flows are given as a series indexed by year, with element 0 being the (undiscounted)
//! year-zero flow.
use crate::units::Dimensionless;

/// Lowest rate considered when searching for an IRR. Rates at or below -100% are meaningless.
const IRR_LOWER_BOUND: f64 = -0.99;

/// Highest rate considered when searching for an IRR
const IRR_UPPER_BOUND: f64 = 100.0;

/// Convergence tolerance on the rate for the IRR search
const IRR_TOLERANCE: f64 = 1e-10;

/// Maximum number of bisection steps for the IRR search
const IRR_MAX_ITERATIONS: u32 = 200;

/// Relative tolerance for break-even when computing simple payback, as a fraction of the largest
/// cash flow
const PAYBACK_TOLERANCE: f64 = 1e-9;

/// Calculates the capital recovery factor (CRF) for a given lifetime and discount rate.
///
/// The CRF is used to annualize capital costs over the lifetime of an asset. It is the reciprocal
/// of the annuity discount factor, i.e. `1 / Σ_{i=1..L} (1 + r)^-i`.
pub fn capital_recovery_factor(lifetime: u32, discount_rate: Dimensionless) -> Dimensionless {
    if lifetime == 0 {
        return Dimensionless(0.0);
    }
    if discount_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(lifetime as f64);
    }
    let factor = (Dimensionless(1.0) + discount_rate).powi(lifetime as i32);
    (discount_rate * factor) / (factor - Dimensionless(1.0))
}

/// Net present value of a cash-flow series at the given discount rate.
///
/// The first element is not discounted.
pub fn npv(discount_rate: Dimensionless, cash_flows: &[f64]) -> f64 {
    let base = 1.0 + discount_rate.0;
    cash_flows
        .iter()
        .zip(0..)
        .map(|(cash_flow, year)| cash_flow / base.powi(year))
        .sum()
}

/// Internal rate of return of a cash-flow series.
///
/// Uses bisection over the rate bracket (-99%, 10000%]. For long series, where NPV at -99%
/// overflows, the lower end of the bracket is moved towards zero until NPV is finite. Returns
/// `None` if NPV does not change sign over the bracket or the search does not converge, in which
/// case the IRR is undefined.
pub fn irr(cash_flows: &[f64]) -> Option<f64> {
    let npv_at = |rate: f64| npv(Dimensionless(rate), cash_flows);

    let mut lo = IRR_LOWER_BOUND;
    let mut hi = IRR_UPPER_BOUND;
    let mut npv_lo = npv_at(lo);
    while !npv_lo.is_finite() && lo < -IRR_TOLERANCE {
        lo *= 0.5;
        npv_lo = npv_at(lo);
    }
    let npv_hi = npv_at(hi);
    if !npv_lo.is_finite() || !npv_hi.is_finite() {
        return None;
    }
    if npv_lo.signum() == npv_hi.signum() {
        return None;
    }

    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let npv_mid = npv_at(mid);
        if npv_mid == 0.0 || (hi - lo) < IRR_TOLERANCE {
            return Some(mid);
        }

        if npv_mid.signum() == npv_lo.signum() {
            lo = mid;
            npv_lo = npv_mid;
        } else {
            hi = mid;
        }
    }

    None
}

/// Simple payback period: the first year in which cumulative undiscounted cash flow is
/// non-negative.
///
/// Break-even is judged against a tolerance relative to the largest cash flow, so rounding in the
/// running sum does not delay payback by a year. Returns `None` if that never happens within the
/// series.
pub fn simple_payback(cash_flows: &[f64]) -> Option<u32> {
    let scale = cash_flows.iter().fold(0.0_f64, |acc, flow| acc.max(flow.abs()));
    let tolerance = PAYBACK_TOLERANCE * scale;

    let mut cumulative = 0.0;
    for (cash_flow, year) in cash_flows.iter().zip(0..) {
        cumulative += cash_flow;
        if cumulative >= -tolerance {
            return Some(year);
        }
    }

    None
}
