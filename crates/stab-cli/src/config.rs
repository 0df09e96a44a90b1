//! CLI configuration.

use std::path::{Path, PathBuf};

use stab_media::{MediaResult, SmoothingMethod, StabilizeConfig};
use stab_models::GapPolicy;

/// Suffix appended to the input file stem for the default output path.
pub const OUTPUT_SUFFIX: &str = "_stabilized";

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Output path, `None` to derive it from the input path
    pub output: Option<PathBuf>,
    /// Pipeline settings
    pub stabilize: StabilizeConfig,
}

impl CliConfig {
    /// Create config from environment variables.
    ///
    /// `VIDEOSTAB_CONFIG` names a JSON file used as the base; the other
    /// `VIDEOSTAB_*` variables override individual fields. Unparseable values
    /// are ignored.
    pub fn from_env() -> MediaResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`CliConfig::from_env`] with an explicit variable lookup.
    pub fn from_vars<F>(var: F) -> MediaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut stabilize = match var("VIDEOSTAB_CONFIG") {
            Some(path) => StabilizeConfig::from_json_file(path)?,
            None => StabilizeConfig::default(),
        };

        if let Some(radius) = var("VIDEOSTAB_RADIUS").and_then(|s| s.parse().ok()) {
            stabilize.smoothing_radius = radius;
        }
        if let Some(method) = var("VIDEOSTAB_SMOOTHING_METHOD").and_then(|s| s.parse::<SmoothingMethod>().ok()) {
            stabilize.smoothing_method = method;
        }
        if let Some(policy) = var("VIDEOSTAB_GAP_POLICY").and_then(|s| s.parse::<GapPolicy>().ok()) {
            stabilize.gap_policy = policy;
        }
        if let Some(corners) = var("VIDEOSTAB_MAX_CORNERS").and_then(|s| s.parse().ok()) {
            stabilize.max_corners = corners;
        }
        if let Some(min) = var("VIDEOSTAB_MIN_TRACKED").and_then(|s| s.parse().ok()) {
            stabilize.min_tracked_points = min;
        }
        if let Some(border) = var("VIDEOSTAB_BORDER_CROP").and_then(|s| s.parse().ok()) {
            stabilize.border_crop = border;
        }
        if let Some(fourcc) = var("VIDEOSTAB_FOURCC") {
            stabilize.output_fourcc = fourcc;
        }
        if let Some(fps) = var("VIDEOSTAB_FPS").and_then(|s| s.parse().ok()) {
            stabilize.output_fps = Some(fps);
        }
        if let Some(side_by_side) = var("VIDEOSTAB_SIDE_BY_SIDE").and_then(|s| parse_bool(&s)) {
            stabilize.side_by_side = side_by_side;
        }
        if let Some(dir) = var("VIDEOSTAB_EXPORT_DIR").filter(|s| !s.is_empty()) {
            stabilize.export_dir = Some(PathBuf::from(dir));
        }

        stabilize.validate()?;

        Ok(Self {
            output: var("VIDEOSTAB_OUTPUT").filter(|s| !s.is_empty()).map(PathBuf::from),
            stabilize,
        })
    }

    /// Where to write the stabilized video for `input`.
    pub fn output_for(&self, input: &Path) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(input))
    }
}

/// `<dir>/<stem>_stabilized.<ext>` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = input
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.{ext}"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_vars() {
        let config = CliConfig::from_vars(lookup(&[])).unwrap();
        assert_eq!(config.output, None);
        assert_eq!(config.stabilize.smoothing_radius, 30);
        assert_eq!(config.stabilize.gap_policy, GapPolicy::ReuseLast);
        assert!(!config.stabilize.side_by_side);
    }

    #[test]
    fn test_overrides() {
        let config = CliConfig::from_vars(lookup(&[
            ("VIDEOSTAB_RADIUS", "12"),
            ("VIDEOSTAB_SMOOTHING_METHOD", "running"),
            ("VIDEOSTAB_GAP_POLICY", "skip"),
            ("VIDEOSTAB_BORDER_CROP", "2"),
            ("VIDEOSTAB_FOURCC", "XVID"),
            ("VIDEOSTAB_FPS", "25"),
            ("VIDEOSTAB_SIDE_BY_SIDE", "yes"),
            ("VIDEOSTAB_EXPORT_DIR", "/tmp/logs"),
            ("VIDEOSTAB_OUTPUT", "/tmp/out.avi"),
        ]))
        .unwrap();

        let s = &config.stabilize;
        assert_eq!(s.smoothing_radius, 12);
        assert_eq!(s.smoothing_method, SmoothingMethod::Running);
        assert_eq!(s.gap_policy, GapPolicy::Skip);
        assert_eq!(s.border_crop, 2);
        assert_eq!(s.output_fourcc, "XVID");
        assert_eq!(s.output_fps, Some(25.0));
        assert!(s.side_by_side);
        assert_eq!(s.export_dir.as_deref(), Some(Path::new("/tmp/logs")));
        assert_eq!(config.output.as_deref(), Some(Path::new("/tmp/out.avi")));
    }

    #[test]
    fn test_unparseable_values_are_ignored() {
        let config = CliConfig::from_vars(lookup(&[
            ("VIDEOSTAB_RADIUS", "lots"),
            ("VIDEOSTAB_GAP_POLICY", "guess"),
            ("VIDEOSTAB_SIDE_BY_SIDE", "maybe"),
        ]))
        .unwrap();
        assert_eq!(config.stabilize.smoothing_radius, 30);
        assert_eq!(config.stabilize.gap_policy, GapPolicy::ReuseLast);
        assert!(!config.stabilize.side_by_side);
    }

    #[test]
    fn test_invalid_value_fails_validation() {
        let result = CliConfig::from_vars(lookup(&[("VIDEOSTAB_FOURCC", "H264X")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_with_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"smoothing_radius": 8, "border_crop": 4}}"#).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = CliConfig::from_vars(lookup(&[
            ("VIDEOSTAB_CONFIG", path.as_str()),
            ("VIDEOSTAB_RADIUS", "16"),
        ]))
        .unwrap();
        assert_eq!(config.stabilize.smoothing_radius, 16);
        assert_eq!(config.stabilize.border_crop, 4);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/videos/walk.mp4")),
            PathBuf::from("/videos/walk_stabilized.mp4")
        );
        assert_eq!(
            default_output_path(Path::new("clip")),
            PathBuf::from("clip_stabilized.mp4")
        );
    }

    #[test]
    fn test_output_for_prefers_explicit_path() {
        let config = CliConfig {
            output: Some(PathBuf::from("/tmp/explicit.avi")),
            ..Default::default()
        };
        assert_eq!(config.output_for(Path::new("in.mp4")), PathBuf::from("/tmp/explicit.avi"));
    }
}
