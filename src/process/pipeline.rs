//! Main processing pipeline orchestration

use super::config::ProcessingConfig;
use super::job::{JobReport, JobRequest, JoinMode};
use super::scratch::ScratchSpace;
use super::silence::pad_silence;
use crate::analysis::BeatTracker;
use crate::codec::{self, OutputFormat, WavEncoding};
use crate::error::{Error, JobError, Result, Stage, StageContext};
use crate::loudness::{
    integrated_loudness, LoudnessNormalizer, NormalizationReport, NormalizationStatus,
};
use crate::model::{align_layouts, SplicePoint, Waveform};
use crate::splice::{concatenate, crossfade_join, find_splice_points};
use std::path::Path;

/// Waveform after the loudness stages, with what happened to it
#[derive(Debug, Clone)]
pub struct Processed {
    pub waveform: Waveform,
    pub initial_lufs: f64,
    pub final_lufs: f64,
    pub first_pass: Option<NormalizationReport>,
    pub second_pass: Option<NormalizationReport>,
    pub silence_frames: usize,
    pub warnings: Vec<String>,
}

/// Main processing pipeline
pub struct Pipeline<T: BeatTracker> {
    config: ProcessingConfig,
    scratch: ScratchSpace,
    tracker: T,
}

impl<T: BeatTracker> Pipeline<T> {
    /// Create a pipeline; the configuration is validated here, before any job runs
    pub fn new(config: ProcessingConfig, tracker: T) -> Result<Self> {
        config.validate()?;
        let scratch = ScratchSpace::new(config.scratch_dir.clone());

        Ok(Self {
            config,
            scratch,
            tracker,
        })
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    fn normalizer(&self) -> LoudnessNormalizer {
        LoudnessNormalizer::new(
            self.config.target_loudness,
            self.config.tolerance,
            self.config.max_normalization_iterations,
        )
    }

    /// Run one job end to end
    pub fn process(&self, request: &JobRequest) -> std::result::Result<JobReport, JobError> {
        let job_id = request.job_id.as_str();
        log::info!("[{}] Starting job", job_id);

        // Step 1-2: build the working waveform
        let (working, splice_point) = self.load_working(request)?;

        // Step 3-5: measure, normalize, pad, re-measure, re-normalize
        let processed = self.process_waveform(job_id, working)?;

        // Step 6: write every requested output
        let mut outputs = Vec::with_capacity(request.outputs.len());
        for output in &request.outputs {
            write_output(&processed.waveform, &output.path, output.format)
                .stage(job_id, Stage::Encode)?;
            log::info!("[{}] Wrote {:?}", job_id, output.path);
            outputs.push(output.path.clone());
        }

        // Step 7: diagnostics only
        log::info!("[{}] Final loudness: {:.1} LUFS", job_id, processed.final_lufs);
        for warning in &processed.warnings {
            log::warn!("[{}] {}", job_id, warning);
        }

        let waveform = &processed.waveform;
        Ok(JobReport {
            job_id: request.job_id.clone(),
            outputs,
            splice_point,
            initial_lufs: processed.initial_lufs,
            final_lufs: processed.final_lufs,
            output_frames: waveform.frames(),
            sample_rate: waveform.sample_rate(),
            channels: waveform.channel_count(),
            silence_frames: processed.silence_frames,
            first_pass: processed.first_pass,
            second_pass: processed.second_pass,
            warnings: processed.warnings,
        })
    }

    /// Ranked splice candidates for a pair of files, without processing
    pub fn splice_candidates(&self, first: &Path, second: &Path) -> Result<Vec<SplicePoint>> {
        let a = codec::decode(first)?;
        let b = codec::decode(second)?;
        let (a, b) = align_layouts(a, b)?;
        find_splice_points(&a, &b, &self.tracker, &self.config.splice)
    }

    /// Loudness stages on an in-memory waveform
    pub fn process_waveform(
        &self,
        job_id: &str,
        mut waveform: Waveform,
    ) -> std::result::Result<Processed, JobError> {
        let target = self.config.target_loudness;
        let gate = self.config.strict_gate;
        let normalizer = self.normalizer();
        let mut warnings = Vec::new();

        let initial_lufs = integrated_loudness(&waveform).stage(job_id, Stage::Measure)?;
        log::info!("[{}] Initial loudness: {:.1} LUFS", job_id, initial_lufs);

        let first_pass = if (initial_lufs - target).abs() > gate {
            let report = normalizer
                .normalize(&mut waveform)
                .stage(job_id, Stage::Normalize)?;
            log::info!(
                "[{}] After first adjustment: {:.1} LUFS ({} passes)",
                job_id,
                report.final_lufs,
                report.passes
            );
            collect_warning(&report, target, "first pass", &mut warnings);
            Some(report)
        } else {
            None
        };

        let silence_frames = pad_silence(&mut waveform, self.config.silence_duration)
            .stage(job_id, Stage::Pad)?;

        // Silence changes the gated integral, so measure again
        let padded_lufs = integrated_loudness(&waveform).stage(job_id, Stage::Measure)?;
        let second_pass = if (padded_lufs - target).abs() > gate {
            log::info!("[{}] Loudness after silence: {:.1} LUFS", job_id, padded_lufs);
            let report = normalizer
                .normalize(&mut waveform)
                .stage(job_id, Stage::Normalize)?;
            collect_warning(&report, target, "second pass", &mut warnings);
            Some(report)
        } else {
            None
        };

        if self.config.peak_limit {
            let clamped = waveform.clamp_to_full_scale();
            if clamped > 0 {
                log::info!("[{}] Peak limit clamped {} samples", job_id, clamped);
            }
        } else if waveform.peak() > 1.0 {
            warnings.push(format!(
                "peak {:.2} exceeds full scale after normalization",
                waveform.peak()
            ));
        }

        let final_lufs = integrated_loudness(&waveform).stage(job_id, Stage::Measure)?;

        Ok(Processed {
            waveform,
            initial_lufs,
            final_lufs,
            first_pass,
            second_pass,
            silence_frames,
            warnings,
        })
    }

    /// Decode the input(s); pairs are joined and round-tripped through a
    /// job-unique scratch file that is removed however this returns
    fn load_working(
        &self,
        request: &JobRequest,
    ) -> std::result::Result<(Waveform, Option<SplicePoint>), JobError> {
        let job_id = request.job_id.as_str();

        let Some(second) = &request.secondary else {
            let waveform = codec::decode(&request.primary).stage(job_id, Stage::Decode)?;
            return Ok((waveform, None));
        };

        let a = codec::decode(&request.primary).stage(job_id, Stage::Decode)?;
        let b = codec::decode(second).stage(job_id, Stage::Decode)?;
        let (a, b) = align_layouts(a, b).stage(job_id, Stage::Join)?;

        let (joined, splice_point) = match request.join_mode {
            JoinMode::Splice => {
                let candidates = find_splice_points(&a, &b, &self.tracker, &self.config.splice)
                    .stage(job_id, Stage::Splice)?;
                let best = *candidates
                    .first()
                    .ok_or(Error::NoSplicePointFound)
                    .stage(job_id, Stage::Splice)?;
                log::info!("[{}] Splicing at {}", job_id, best);

                let splice = &self.config.splice;
                let joined = crossfade_join(a, b, &best, splice.crossfade, splice.crossfade_curve)
                    .stage(job_id, Stage::Join)?;
                (joined, Some(best))
            }
            JoinMode::Concatenate => {
                log::info!("[{}] Concatenating without crossfade", job_id);
                (concatenate(a, b).stage(job_id, Stage::Join)?, None)
            }
        };

        let scratch = self.scratch.reserve(job_id, "wav").stage(job_id, Stage::Join)?;
        codec::write_wav(&joined, scratch.path(), WavEncoding::Float32)
            .stage(job_id, Stage::Join)?;
        drop(joined);

        let working = codec::decode(scratch.path()).stage(job_id, Stage::Decode)?;
        Ok((working, splice_point))
    }
}

fn collect_warning(
    report: &NormalizationReport,
    target: f64,
    pass: &str,
    warnings: &mut Vec<String>,
) {
    if let Some(err) = report.warning(target) {
        warnings.push(format!("{}: {}", pass, err));
    } else if report.status == NormalizationStatus::Unmeasurable {
        warnings.push(format!("{}: loudness unmeasurable (silent audio)", pass));
    }
}

fn write_output(waveform: &Waveform, path: &Path, format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    codec::encode(waveform, path, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FixedBeatTracker;

    fn tone(amp: f32, sr: u32, secs: f32) -> Waveform {
        let samples = (0..(sr as f32 * secs) as usize)
            .map(|i| amp * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sr as f32).sin())
            .collect();
        Waveform::mono(samples, sr).unwrap()
    }

    fn pipeline() -> Pipeline<FixedBeatTracker> {
        Pipeline::new(ProcessingConfig::new(), FixedBeatTracker::from_timestamps(vec![])).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = ProcessingConfig::new().with_silence_duration(0.0);
        let result = Pipeline::new(config, FixedBeatTracker::from_timestamps(vec![]));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_process_waveform_hits_target_and_pads() {
        let wf = tone(0.02, 44100, 4.0);
        let frames = wf.frames();
        let out = pipeline().process_waveform("t", wf).unwrap();

        assert!((out.final_lufs + 14.0).abs() < 0.1, "final {}", out.final_lufs);
        assert_eq!(out.silence_frames, 88200);
        assert_eq!(out.waveform.frames(), frames + 88200);
        assert!(out.first_pass.is_some());
    }

    #[test]
    fn test_missing_input_fails_in_decode_stage() {
        let request = JobRequest::single("missing", "/nonexistent/a.wav".into());
        let err = pipeline().process(&request).unwrap_err();
        assert_eq!(err.stage, Stage::Decode);
        assert_eq!(err.job_id, "missing");
    }

    #[test]
    fn test_silent_input_is_reported_not_fatal() {
        let wf = Waveform::mono(vec![0.0; 44100], 44100).unwrap();
        let out = pipeline().process_waveform("quiet", wf).unwrap();
        assert!(out.final_lufs.is_infinite());
        assert!(!out.warnings.is_empty());
    }
}
