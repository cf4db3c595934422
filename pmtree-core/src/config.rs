use serde::{Deserialize, Serialize};

/// Fixed generation settings shared by every tree a model produces.
///
/// These are not part of the 19-field parameter vector; they stay constant
/// across a sampling sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of segments each stem is divided into.
    pub curve_res: u32,
    /// Length of the trunk before any scaling.
    pub base_length: f32,
    /// Maximum height of one emitted quad.
    pub slice_height: f32,
    /// Spacing of the grid sample points along a quad.
    pub sample_step: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            curve_res: 10,
            base_length: 10.0,
            slice_height: 0.5,
            sample_step: 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "curve_res": 6 }"#).unwrap();

        assert_eq!(cfg.curve_res, 6);
        assert_eq!(cfg.base_length, Config::default().base_length);
        assert_eq!(cfg.slice_height, 0.5);
    }
}
