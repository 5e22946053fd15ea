//! Bounded settle loop used by device evaluation

use crate::error::DeviceError;

/// Iteration ceiling for one evaluation region
pub const SETTLE_LIMIT: u32 = 100;

/// Run `step` until it reports no further activity.
///
/// `step` returns `true` when it fired something that requires another pass. Returns the
/// number of active passes, or [`DeviceError::Convergence`] once the ceiling is crossed.
pub fn settle<F>(region: &'static str, mut step: F) -> Result<u32, DeviceError>
where
    F: FnMut() -> bool,
{
    let mut iterations = 0u32;
    while step() {
        iterations += 1;
        if iterations > SETTLE_LIMIT {
            tracing::error!(region, iterations, "device evaluation did not converge");
            return Err(DeviceError::Convergence { region, iterations });
        }
    }
    Ok(iterations)
}
