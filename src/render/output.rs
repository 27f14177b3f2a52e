//! Persisting and displaying finished figures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Image format of a saved chart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Scalable vector graphics
    Svg,
    /// Raster image
    Png,
}

impl ImageFormat {
    /// File extension, also the name of the per-format subfolder.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Where figures go after drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub plot_folder: PathBuf,
    pub formats: Vec<ImageFormat>,
    pub save: bool,
    pub show: bool,
}

impl From<&crate::config::Config> for OutputSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            plot_folder: PathBuf::from(&config.general.plot_folder),
            formats: config.output.formats.clone(),
            save: config.output.save,
            show: config.output.show,
        }
    }
}

/// `{plot_folder}/{format}/{stem}.{format}`
pub fn artifact_path(plot_folder: &Path, format: ImageFormat, stem: &str) -> PathBuf {
    plot_folder
        .join(format.extension())
        .join(format!("{}.{}", stem, format.extension()))
}

/// Opens a saved figure for the analyst.
pub trait Viewer {
    fn open(&self, path: &Path) -> std::io::Result<()>;
}

/// Hands files to the platform's default image viewer.
///
/// The launcher is waited for, so no child process is left unreaped. The
/// launchers used here hand the file to the desktop and return at once.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemViewer {
    program: String,
    args: Vec<String>,
}

impl SystemViewer {
    /// Uses `program args... <file>` as the launcher.
    pub fn with_command(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl Default for SystemViewer {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::with_command("open", &[])
        } else if cfg!(target_os = "windows") {
            Self::with_command("cmd", &["/C", "start", ""])
        } else {
            Self::with_command("xdg-open", &[])
        }
    }
}

impl Viewer for SystemViewer {
    fn open(&self, path: &Path) -> std::io::Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()?;
        if !status.success() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} exited with {}", self.program, status),
            ));
        }
        debug!("Opened {} with {}", path.display(), self.program);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_path_layout() {
        let path = artifact_path(Path::new("plot"), ImageFormat::Png, "a_over_b");
        assert_eq!(path, PathBuf::from("plot/png/a_over_b.png"));
    }

    #[test]
    fn test_format_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            formats: Vec<ImageFormat>,
        }
        let parsed: Wrapper = toml::from_str("formats = [\"svg\", \"png\"]").unwrap();
        assert_eq!(parsed.formats, vec![ImageFormat::Svg, ImageFormat::Png]);
        assert_eq!(ImageFormat::Svg.to_string(), "svg");
    }

    #[cfg(unix)]
    #[test]
    fn test_viewer_waits_for_launcher() {
        let ok = SystemViewer::with_command("true", &[]);
        assert!(ok.open(Path::new("chart.svg")).is_ok());

        let failing = SystemViewer::with_command("false", &[]);
        let err = failing.open(Path::new("chart.svg")).unwrap_err();
        assert!(err.to_string().contains("false exited"));

        let missing = SystemViewer::with_command("/definitely/not/a/viewer", &[]);
        assert!(missing.open(Path::new("chart.svg")).is_err());
    }
}
