use crate::{
    core::{
        media::{MediaAttributes, MediaProbe},
        model::file::MediaType,
    },
    err,
    error::CumulusError,
    map_err,
};
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Thumbnail dimensions; the source is scaled to cover, then center-cropped.
const THUMB_WIDTH: u32 = 280;
const THUMB_HEIGHT: u32 = 200;

/// Media prober shelling out to ffprobe/ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegProber {
    ffprobe: String,
    ffmpeg: String,
}

impl Default for FfmpegProber {
    fn default() -> Self {
        Self {
            ffprobe: "ffprobe".to_string(),
            ffmpeg: "ffmpeg".to_string(),
        }
    }
}

impl FfmpegProber {
    /// * `ffprobe`: Binary to probe with.
    /// * `ffmpeg`: Binary to render thumbnails with.
    pub fn new(ffprobe: impl Into<String>, ffmpeg: impl Into<String>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    async fn run_ffprobe(&self, path: &Path) -> Result<ProbeOutput, CumulusError> {
        debug!("Probing {}", path.display());

        let output = map_err!(
            Command::new(&self.ffprobe)
                .arg("-v")
                .arg("error")
                .arg("-print_format")
                .arg("json")
                .arg("-show_streams")
                .arg("-show_format")
                .arg(path)
                .output()
                .await
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return err!(MediaProbe, "ffprobe exited with {}; {stderr}", output.status);
        }

        let parsed = map_err!(serde_json::from_slice::<ProbeOutput>(&output.stdout));

        Ok(parsed)
    }

    fn thumbnail_filter() -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
            w = THUMB_WIDTH,
            h = THUMB_HEIGHT
        )
    }
}

#[async_trait::async_trait]
impl MediaProbe for FfmpegProber {
    async fn probe(
        &self,
        path: &Path,
        media_type: MediaType,
    ) -> Result<MediaAttributes, CumulusError> {
        if let MediaType::Other = media_type {
            return err!(UnsupportedMediaType, "cannot probe 'other'");
        }

        let output = self.run_ffprobe(path).await?;

        match media_type {
            MediaType::Video => video_attributes(&output),
            MediaType::Image => image_attributes(&output),
            MediaType::Audio => audio_attributes(&output),
            MediaType::Other => unreachable!(),
        }
    }

    async fn thumbnail(
        &self,
        src: &Path,
        media_type: MediaType,
        dest: &Path,
    ) -> Result<(), CumulusError> {
        debug!("Rendering thumbnail {}", dest.display());

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-v").arg("error");

        // Snapshot videos near the 1 second mark to skip black lead-ins.
        if let MediaType::Video = media_type {
            cmd.arg("-ss").arg("1");
        } else if !matches!(media_type, MediaType::Image) {
            return err!(UnsupportedMediaType, "no thumbnails for {media_type}");
        }

        let output = map_err!(
            cmd.arg("-i")
                .arg(src)
                .arg("-frames:v")
                .arg("1")
                .arg("-vf")
                .arg(Self::thumbnail_filter())
                .arg("-y")
                .arg(dest)
                .output()
                .await
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return err!(MediaProbe, "ffmpeg exited with {}; {stderr}", output.status);
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl ProbeOutput {
    fn stream(&self, codec_type: &str) -> Option<&ProbeStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some(codec_type))
    }

    fn duration_secs(&self) -> Result<Option<f64>, CumulusError> {
        let Some(duration) = self.format.as_ref().and_then(|f| f.duration.as_deref()) else {
            return Ok(None);
        };

        let secs = map_err!(duration.parse::<f64>());

        Ok(Some(secs))
    }
}

fn video_attributes(output: &ProbeOutput) -> Result<MediaAttributes, CumulusError> {
    let Some(stream) = output.stream("video") else {
        return err!(InvalidMetadata, "no video stream");
    };

    let fps = match stream.r_frame_rate.as_deref() {
        Some(rate) => Some(parse_frame_rate(rate)?),
        None => None,
    };

    Ok(MediaAttributes {
        width: stream.width,
        height: stream.height,
        duration_secs: output.duration_secs()?,
        fps,
    })
}

fn image_attributes(output: &ProbeOutput) -> Result<MediaAttributes, CumulusError> {
    let Some(stream) = output.stream("video") else {
        return err!(InvalidMetadata, "no image stream");
    };

    Ok(MediaAttributes {
        width: stream.width,
        height: stream.height,
        ..Default::default()
    })
}

fn audio_attributes(output: &ProbeOutput) -> Result<MediaAttributes, CumulusError> {
    if output.stream("audio").is_none() {
        return err!(InvalidMetadata, "no audio stream");
    }

    Ok(MediaAttributes {
        duration_secs: output.duration_secs()?,
        ..Default::default()
    })
}

/// An ffprobe frame rate is a rational like `30000/1001`.
fn parse_frame_rate(rate: &str) -> Result<f64, CumulusError> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = map_err!(num.trim().parse::<f64>());
            let den = map_err!(den.trim().parse::<f64>());

            if den == 0.0 {
                return err!(InvalidMetadata, "frame rate denominator is zero: {rate}");
            }

            Ok(num / den)
        }
        None => {
            let fps = map_err!(rate.trim().parse::<f64>());
            Ok(fps)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_JSON: &str = r#"{
        "streams": [
            { "codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30000/1001" },
            { "codec_type": "audio" }
        ],
        "format": { "duration": "4.200000" }
    }"#;

    const IMAGE_JSON: &str = r#"{
        "streams": [
            { "codec_type": "video", "width": 640, "height": 480, "r_frame_rate": "25/1" }
        ],
        "format": {}
    }"#;

    const AUDIO_JSON: &str = r#"{
        "streams": [ { "codec_type": "audio" } ],
        "format": { "duration": "2.0" }
    }"#;

    #[test]
    fn frame_rates() {
        assert_eq!(parse_frame_rate("30/1").unwrap(), 30.0);
        assert_eq!(parse_frame_rate("24").unwrap(), 24.0);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_err());
        assert!(parse_frame_rate("abc").is_err());
    }

    #[test]
    fn video_output() {
        let output: ProbeOutput = serde_json::from_str(VIDEO_JSON).unwrap();
        let attrs = video_attributes(&output).unwrap();

        assert_eq!(attrs.width, Some(1920));
        assert_eq!(attrs.height, Some(1080));
        assert_eq!(attrs.duration_secs, Some(4.2));
        assert!((attrs.fps.unwrap() - 29.97).abs() < 0.01);
    }

    #[test]
    fn image_output() {
        let output: ProbeOutput = serde_json::from_str(IMAGE_JSON).unwrap();
        let attrs = image_attributes(&output).unwrap();

        assert_eq!(attrs.width, Some(640));
        assert_eq!(attrs.height, Some(480));
        assert_eq!(attrs.duration_secs, None);
    }

    #[test]
    fn audio_output() {
        let output: ProbeOutput = serde_json::from_str(AUDIO_JSON).unwrap();
        let attrs = audio_attributes(&output).unwrap();

        assert_eq!(attrs.duration_secs, Some(2.0));
        assert_eq!(attrs.width, None);
    }

    #[test]
    fn missing_stream_is_an_error() {
        let output: ProbeOutput = serde_json::from_str(AUDIO_JSON).unwrap();
        assert!(video_attributes(&output).is_err());
    }
}
