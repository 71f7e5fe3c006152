use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Longest accepted frame; one minute.
pub const MAX_FRAME_MS: f64 = 60_000.0;

/// Scripted frame-time trace fed to the host loop in place of real rendering.
#[derive(Debug, Deserialize, Clone)]
pub struct FrameScript {
    #[serde(default)]
    pub name: Option<String>,
    pub segments: Vec<FrameSegment>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FrameSegment {
    pub frame_ms: f64,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl FrameScript {
    pub fn expanded_frame_times(&self) -> Vec<f64> {
        let mut out = Vec::new();
        for segment in &self.segments {
            for _ in 0..segment.repeat.max(1) {
                out.push(segment.frame_ms);
            }
        }
        out
    }

    pub fn total_ms(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.frame_ms * s.repeat.max(1) as f64)
            .sum()
    }
}

pub fn load_frame_script_from_path(path: &Path) -> Result<FrameScript, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let script: FrameScript = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse frame script JSON {}: {e}", path.display()))?;
    validate_frame_script(&script)?;
    Ok(script)
}

fn validate_frame_script(script: &FrameScript) -> Result<(), String> {
    if script.segments.is_empty() {
        return Err("Frame script validation failed: segments list is empty".to_string());
    }
    for (i, segment) in script.segments.iter().enumerate() {
        if !(segment.frame_ms.is_finite() && segment.frame_ms > 0.0) {
            return Err(format!(
                "Frame script validation failed: segment {i} frame_ms must be > 0"
            ));
        }
        if segment.frame_ms > MAX_FRAME_MS {
            return Err(format!(
                "Frame script validation failed: segment {i} frame_ms ({}) exceeds {MAX_FRAME_MS}",
                segment.frame_ms
            ));
        }
    }
    Ok(())
}

const fn default_repeat() -> u32 {
    1
}
