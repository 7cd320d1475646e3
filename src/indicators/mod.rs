use crate::models::TimeSeries;

pub mod registry;
pub mod transforms;

/// A series computed from other indicators instead of fetched.
pub trait CalculatedIndicator {
    /// Names of the indicators this one is computed from, in argument order.
    fn required_inputs(&self) -> Vec<&str>;

    /// Compute the series. `inputs` follows the order of `required_inputs`.
    /// An empty input yields an empty result.
    fn calculate(&self, inputs: &[TimeSeries]) -> TimeSeries;
}
