pub struct Utils;

impl Utils {
    /// Lowercase hex, two digits per byte, no separators.
    pub fn hex(bytes: &[u8]) -> String {
        hex::encode(bytes)
    }

    /// Renders `value` with a fixed number of decimals, the way Home Assistant
    /// sensors are configured to display it.
    pub fn with_precision(value: f64, precision: usize) -> String {
        format!("{:.*}", precision, value)
    }
}
