//! Direction finding from tracked RSSI readings
//!
//! The operator points the antenna at a dial angle, collects a handful of
//! `DATA:` readings for the tracked network and records their average. Once
//! enough angles are recorded the weighted circular mean of the sweep points
//! at the most likely source.

use crate::config;
use std::{fmt::Write as _, io, path::Path};

/// Averaged readings taken at one dial angle
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: u32,
    /// Degrees clockwise from north, `0.0..360.0`
    pub angle: f64,
    /// Rounded average of `raw_samples`
    pub rssi: i32,
    pub raw_samples: Vec<i32>,
}

/// Where and how long to sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurePlan {
    pub angle: f64,
    pub samples: usize,
}

impl MeasurePlan {
    pub fn new(angle: f64, samples: usize) -> Self {
        Self {
            angle: angle.rem_euclid(360.0),
            samples: samples.max(1),
        }
    }
}

/// Collects readings for one measurement
#[derive(Debug, Clone)]
pub struct Sampler {
    plan: MeasurePlan,
    samples: Vec<i32>,
}

impl Sampler {
    pub fn new(plan: MeasurePlan) -> Self {
        Self {
            plan,
            samples: Vec::with_capacity(plan.samples),
        }
    }

    /// Take one reading; returns true once enough usable readings are in.
    /// Readings at or below the noise floor are skipped.
    pub fn push(&mut self, rssi: i32) -> bool {
        if rssi > config::MIN_USABLE_RSSI && !self.is_complete() {
            self.samples.push(rssi);
        }
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.plan.samples
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.samples.len(), self.plan.samples)
    }
}

/// Every measurement of one sweep, in recording order
#[derive(Debug, Clone, PartialEq)]
pub struct Survey {
    measurements: Vec<Measurement>,
    next_id: u32,
}

impl Default for Survey {
    fn default() -> Self {
        Self {
            measurements: Vec::new(),
            next_id: 1,
        }
    }
}

impl Survey {
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Store a finished sampler. Returns `None` if it never got a reading.
    pub fn record(&mut self, sampler: Sampler) -> Option<&Measurement> {
        let Sampler { plan, samples } = sampler;
        let rssi = average(&samples)?;
        self.push(plan.angle, rssi, samples);
        self.measurements.last()
    }

    fn push(&mut self, angle: f64, rssi: i32, raw_samples: Vec<i32>) {
        self.measurements.push(Measurement {
            id: self.next_id,
            angle,
            rssi,
            raw_samples,
        });
        self.next_id += 1;
    }

    /// Bearing of the source in whole degrees, or `None` with fewer than
    /// three usable points.
    ///
    /// Points are first averaged per angle so that re-measuring one
    /// direction many times does not pull the estimate toward it. Each angle
    /// is then weighted by its linear signal amplitude.
    pub fn estimate_source(&self) -> Option<u32> {
        let usable: Vec<&Measurement> = self
            .measurements
            .iter()
            .filter(|m| m.rssi > config::MIN_USABLE_RSSI)
            .collect();
        if usable.len() < config::MIN_ESTIMATE_POINTS {
            return None;
        }

        let mut by_angle: Vec<(f64, Vec<i32>)> = Vec::new();
        for m in usable {
            match by_angle.iter_mut().find(|(angle, _)| *angle == m.angle) {
                Some((_, rssis)) => rssis.push(m.rssi),
                None => by_angle.push((m.angle, vec![m.rssi])),
            }
        }

        let (mut sum_sin, mut sum_cos) = (0.0_f64, 0.0_f64);
        for (angle, rssis) in &by_angle {
            let avg = rssis.iter().map(|&r| f64::from(r)).sum::<f64>() / rssis.len() as f64;
            let weight = 10f64.powf((avg + 100.0) / 20.0);
            // 0° is north; shift so atan2's zero lines up with it
            let rad = (angle - 90.0).to_radians();
            sum_sin += rad.sin() * weight;
            sum_cos += rad.cos() * weight;
        }

        let deg = round_half_up(sum_sin.atan2(sum_cos).to_degrees() + 90.0);
        Some(deg.rem_euclid(360.0) as u32)
    }

    /// `ID,Angle,AvgRSSI,Count,Raw_Samples` with raw samples `;`-joined
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(config::SURVEY_CSV_HEADER);
        csv.push('\n');
        for m in &self.measurements {
            let raw: Vec<String> = m.raw_samples.iter().map(ToString::to_string).collect();
            let _ = writeln!(
                csv,
                "{},{},{},{},\"{}\"",
                m.id,
                m.angle,
                m.rssi,
                m.raw_samples.len(),
                raw.join(";")
            );
        }
        csv
    }

    /// Read a survey back. Ids are renumbered from 1; rows that do not carry
    /// numeric angle, RSSI and count are skipped.
    pub fn from_csv(text: &str) -> Self {
        let mut survey = Survey::default();
        let mut lines = text.lines().peekable();
        if lines.peek().is_some_and(|first| first.contains("ID")) {
            lines.next();
        }

        for line in lines.map(str::trim).filter(|l| !l.is_empty()) {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() < 4 {
                tracing::warn!(line, "skipping short survey row");
                continue;
            }
            let (Ok(angle), Ok(rssi), Ok(count)) = (
                parts[1].trim().parse::<f64>(),
                parts[2].trim().parse::<i32>(),
                parts[3].trim().parse::<usize>(),
            ) else {
                tracing::warn!(line, "skipping malformed survey row");
                continue;
            };

            let mut raw: Vec<i32> = parts[4..]
                .join(",")
                .replace('"', "")
                .split(';')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if raw.is_empty() {
                raw = vec![rssi; count];
            }
            survey.push(angle.rem_euclid(360.0), rssi, raw);
        }
        survey
    }

    /// Load a survey file; a missing file is an empty survey
    pub async fn load(path: &Path) -> io::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(Self::from_csv(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, path: &Path) -> io::Result<()> {
        tokio::fs::write(path, self.to_csv()).await
    }
}

/// Signal quality in percent, `0.0..=100.0`
pub fn quality(rssi: i32) -> f64 {
    ((f64::from(rssi) + 100.0) * 1.5).clamp(0.0, 100.0)
}

fn average(samples: &[i32]) -> Option<i32> {
    if samples.is_empty() {
        return None;
    }
    let sum: i64 = samples.iter().map(|&s| i64::from(s)).sum();
    Some(round_half_up(sum as f64 / samples.len() as f64) as i32)
}

// Halves go toward +inf, so -60.5 averages to -60
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}
