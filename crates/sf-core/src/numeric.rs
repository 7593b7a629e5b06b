use crate::SfError;

/// Floating point type used throughout system
pub type Real = f64;

/// Flows smaller than this (flow units) are treated as exactly zero.
pub const FLOW_TOL: Real = 1.0e-5;

/// Magnitude below which a flow is considered absent when forming ratios.
pub const TINY: Real = 1.0e-6;

/// `v` itself when finite.
pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, SfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SfError::NonFinite { what, value: v })
    }
}

/// Snap flow noise below [`FLOW_TOL`] to exactly zero.
#[inline]
pub fn zero_if_below_tol(q: Real) -> Real {
    if q.abs() < FLOW_TOL { 0.0 } else { q }
}

/// Relative change from `old` to `new`.
///
/// Returns `new / old - 1` when `old` is significant, `1` when only `new`
/// is significant, and `0` when both are negligible.
pub fn relative_change(old: Real, new: Real) -> Real {
    if old.abs() > TINY {
        new / old - 1.0
    } else if new.abs() > TINY {
        1.0
    } else {
        0.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn unchanged_flow_has_no_relative_change(q in -1.0e6_f64..1.0e6_f64) {
            prop_assert_eq!(relative_change(q, q), 0.0);
        }

        #[test]
        fn zeroing_never_grows_magnitude(q in -1.0_f64..1.0_f64) {
            prop_assert!(zero_if_below_tol(q).abs() <= q.abs());
        }
    }
}
