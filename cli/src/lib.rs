use circles::{CircleError, DetectionParameters, DetectionResult, ExtractedCircle};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    DetectionError(#[from] CircleError),
    #[error("Failed to write image {path}: {source}")]
    ImageWriteError {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Image viewer '{0}' exited with an error")]
    ViewerFailed(String),
}

/// Transform settings that override the defaults from the command line
#[derive(Debug, Clone, Default, clap::Args, PartialEq)]
pub struct ParameterOverrides {
    /// Minimum circle radius in pixels
    #[arg(long)]
    pub min_radius: Option<u32>,
    /// Maximum circle radius in pixels
    #[arg(long)]
    pub max_radius: Option<u32>,
    /// Inverse accumulator resolution ratio
    #[arg(long)]
    pub dp: Option<f64>,
    /// Minimum distance between detected centres
    #[arg(long)]
    pub min_dist: Option<f64>,
    /// Upper Canny threshold
    #[arg(long)]
    pub param1: Option<f64>,
    /// Accumulator threshold for centres
    #[arg(long)]
    pub param2: Option<f64>,
}

impl ParameterOverrides {
    /// Apply the overrides on top of `base`, then validate the result
    pub fn apply(&self, base: DetectionParameters) -> Result<DetectionParameters, CliError> {
        let params = DetectionParameters {
            dp: self.dp.unwrap_or(base.dp),
            min_dist: self.min_dist.unwrap_or(base.min_dist),
            param1: self.param1.unwrap_or(base.param1),
            param2: self.param2.unwrap_or(base.param2),
            ..base
        }
        .with_radius_overrides(self.min_radius, self.max_radius);
        params.validate()?;
        Ok(params)
    }
}

/// Record of one `detect` run, printed with `--json`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DetectionSummary {
    pub image: PathBuf,
    pub output: Option<PathBuf>,
    pub parameters: DetectionParameters,
    pub result: DetectionResult,
    /// Files written by `--extract`
    #[serde(default)]
    pub extracted: Vec<PathBuf>,
}

impl DetectionSummary {
    pub fn new(image: PathBuf, parameters: DetectionParameters, result: DetectionResult) -> Self {
        Self {
            image,
            output: None,
            parameters,
            result,
            extracted: Vec::new(),
        }
    }

    /// Human-readable report lines
    pub fn report(&self) -> Vec<String> {
        let result = &self.result;
        if result.is_empty() {
            return vec!["No circles detected!".to_string()];
        }
        vec![
            format!("Detected {} circles", result.count),
            format!("Average radius: {:.2} pixels", result.average_radius),
            format!("Radius range: {} - {} pixels", result.min_radius, result.max_radius),
        ]
    }

    /// Convert to pretty JSON string
    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save the summary to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// File name used for an extracted circle
pub fn extracted_file_name(id: usize) -> String {
    format!("circle_{id}.png")
}

/// Write each crop to `dir/circle_<id>.png`, creating `dir` if needed
pub fn save_extracted<P: AsRef<Path>>(dir: P, circles: &[ExtractedCircle]) -> Result<Vec<PathBuf>, CliError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    circles
        .iter()
        .map(|extracted| {
            let path = dir.join(extracted_file_name(extracted.id));
            extracted
                .image
                .save(&path)
                .map_err(|source| CliError::ImageWriteError { path: path.clone(), source })?;
            Ok(path)
        })
        .collect()
}

/// Save the annotated image; the format follows the file extension
pub fn save_rendered<P: AsRef<Path>>(path: P, image: &image::RgbImage) -> Result<(), CliError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    image
        .save(path)
        .map_err(|source| CliError::ImageWriteError { path: path.to_path_buf(), source })
}

/// Open an image with the platform's default viewer and wait for the launcher
pub fn open_in_viewer(path: &Path) -> Result<(), CliError> {
    let (program, mut command) = if cfg!(target_os = "macos") {
        ("open", Command::new("open"))
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        ("start", cmd)
    } else {
        ("xdg-open", Command::new("xdg-open"))
    };

    let status = command.arg(path).status()?;
    if !status.success() {
        return Err(CliError::ViewerFailed(program.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use circles::{Circle, CircleExtractor};
    use image::{DynamicImage, Rgb, RgbImage};

    fn sample_result() -> DetectionResult {
        DetectionResult::new(vec![Circle::new(20, 20, 10), Circle::new(60, 20, 14)], 80, 40)
    }

    #[test]
    fn test_overrides_apply_on_defaults() {
        let overrides = ParameterOverrides {
            min_radius: Some(5),
            param2: Some(20.0),
            ..Default::default()
        };
        let params = overrides.apply(DetectionParameters::default()).unwrap();
        assert_eq!(params.min_radius, 5);
        assert_eq!(params.max_radius, 200);
        assert_eq!(params.param2, 20.0);
        assert_eq!(params.dp, 1.2);
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let overrides = ParameterOverrides {
            min_radius: Some(50),
            max_radius: Some(20),
            ..Default::default()
        };
        assert!(matches!(
            overrides.apply(DetectionParameters::default()),
            Err(CliError::DetectionError(CircleError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn test_report_lines() {
        let summary = DetectionSummary::new("coins.png".into(), DetectionParameters::default(), sample_result());
        assert_eq!(
            summary.report(),
            vec![
                "Detected 2 circles".to_string(),
                "Average radius: 12.00 pixels".to_string(),
                "Radius range: 10 - 14 pixels".to_string(),
            ]
        );

        let empty = DetectionSummary::new(
            "blank.png".into(),
            DetectionParameters::default(),
            DetectionResult::new(Vec::new(), 10, 10),
        );
        assert_eq!(empty.report(), vec!["No circles detected!".to_string()]);
    }

    #[test]
    fn test_summary_written_to_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");

        let mut summary = DetectionSummary::new("coins.png".into(), DetectionParameters::default(), sample_result());
        summary.output = Some("coins_detected.png".into());
        summary.to_json_file(&path).unwrap();

        let written: DetectionSummary = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, summary);
        assert_eq!(written.result.count, 2);
    }

    #[test]
    fn test_save_extracted_writes_numbered_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("extracted_circles");
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 40, Rgb([90, 120, 150])));
        let crops = CircleExtractor::default().extract(&image, &sample_result());

        let written = save_extracted(&out, &crops).unwrap();
        assert_eq!(written, vec![out.join("circle_1.png"), out.join("circle_2.png")]);

        let first = image::open(&written[0]).unwrap();
        assert_eq!((first.width(), first.height()), (21, 21));
    }

    #[test]
    fn test_save_rendered_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.png");
        save_rendered(&path, &RgbImage::new(8, 8)).unwrap();
        assert!(path.exists());
    }
}
