//! Output configuration
//!
//! User-specified settings for outputs, matched by output name. Reading
//! them from a file is left to the host.

use crate::compositor::OutputTransform;

/// A requested display mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeConfig {
    pub width: i32,
    pub height: i32,
    /// Refresh rate in Hz
    pub refresh_rate: f32,
}

impl ModeConfig {
    pub fn new(width: i32, height: i32, refresh_rate: f32) -> Self {
        Self {
            width,
            height,
            refresh_rate,
        }
    }

    /// Refresh rate in mHz, the unit outputs report modes in
    pub fn refresh_mhz(&self) -> i32 {
        (self.refresh_rate * 1000.0) as i32
    }
}

/// Settings for one output
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    /// Output name the settings apply to
    pub name: String,
    pub mode: Option<ModeConfig>,
    pub scale: Option<f64>,
    pub transform: Option<OutputTransform>,
    /// Layout position; the output is placed automatically when unset
    pub position: Option<(i32, i32)>,
}

impl OutputConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: None,
            scale: None,
            transform: None,
            position: None,
        }
    }

    pub fn with_mode(mut self, width: i32, height: i32, refresh_rate: f32) -> Self {
        self.mode = Some(ModeConfig::new(width, height, refresh_rate));
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_transform(mut self, transform: OutputTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Some((x, y));
        self
    }
}

/// Compositor configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    outputs: Vec<OutputConfig>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add settings for an output, replacing earlier settings of the same name
    pub fn add_output(&mut self, output: OutputConfig) {
        self.outputs.retain(|o| o.name != output.name);
        self.outputs.push(output);
    }

    /// Builder form of [`Config::add_output`]
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.add_output(output);
        self
    }

    /// Settings for the output called `name`, if any
    pub fn output(&self, name: &str) -> Option<&OutputConfig> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn outputs(&self) -> &[OutputConfig] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_mhz() {
        assert_eq!(ModeConfig::new(1920, 1080, 144.0).refresh_mhz(), 144000);
        assert_eq!(ModeConfig::new(1920, 1080, 59.5).refresh_mhz(), 59500);
    }

    #[test]
    fn test_output_lookup() {
        let config = Config::new()
            .with_output(OutputConfig::new("DP-1").with_scale(2.0))
            .with_output(
                OutputConfig::new("HDMI-A-1")
                    .with_mode(1280, 720, 60.0)
                    .with_position(1920, 0),
            );

        assert_eq!(config.output("DP-1").and_then(|o| o.scale), Some(2.0));
        let hdmi = config.output("HDMI-A-1").unwrap();
        assert_eq!(hdmi.position, Some((1920, 0)));
        assert!(hdmi.transform.is_none());
        assert!(config.output("eDP-1").is_none());
    }

    #[test]
    fn test_add_output_replaces_by_name() {
        let mut config = Config::new();
        config.add_output(OutputConfig::new("DP-1").with_scale(2.0));
        config.add_output(OutputConfig::new("DP-1").with_transform(OutputTransform::Rotate90));

        assert_eq!(config.outputs().len(), 1);
        let output = config.output("DP-1").unwrap();
        assert_eq!(output.scale, None);
        assert_eq!(output.transform, Some(OutputTransform::Rotate90));
    }
}
