use crate::models::{ConditionKind, ConditionSummary, PooledSamples};
use crate::processors::message_selector::MessageSelector;
use crate::settings::{MessageBreakpoints, Thresholds};
use crate::utils::constants::{DAYS_PER_MONTH, SECONDS_PER_DAY};
use crate::utils::round1;

pub const UNAVAILABLE_ERROR: &str = "No historical data available";

/// Turns pooled samples into per-condition figures by counting samples
/// past fixed thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbabilityEngine {
    thresholds: Thresholds,
    messages: MessageSelector,
}

/// Count of samples past a threshold, out of the whole series
struct Exceedance {
    count: usize,
    total: usize,
}

impl Exceedance {
    fn of(series: &[f64], exceeds: impl Fn(f64) -> bool) -> Self {
        Self {
            count: series.iter().filter(|v| exceeds(**v)).count(),
            total: series.len(),
        }
    }

    fn probability(&self) -> f64 {
        self.count as f64 / self.total as f64 * 100.0
    }

    /// Expected matching days in a month; the denominator is the configured
    /// window length, not the number of years that produced data
    fn avg_days(&self, years_in_window: usize) -> f64 {
        if years_in_window == 0 {
            return 0.0;
        }
        self.count as f64 / years_in_window as f64 * DAYS_PER_MONTH
    }
}

impl ProbabilityEngine {
    pub fn new(thresholds: Thresholds, breakpoints: MessageBreakpoints) -> Self {
        Self {
            thresholds,
            messages: MessageSelector::new(breakpoints),
        }
    }

    pub fn summarize(
        &self,
        kind: ConditionKind,
        pooled: &PooledSamples,
        years_in_window: usize,
    ) -> ConditionSummary {
        match kind {
            ConditionKind::Rain => self.precipitation(
                kind,
                &pooled.precipitation_flux,
                self.thresholds.rain_mm_per_day,
                years_in_window,
            ),
            ConditionKind::ExtremeRain => self.precipitation(
                kind,
                &pooled.precipitation_flux,
                self.thresholds.extreme_rain_mm_per_day,
                years_in_window,
            ),
            ConditionKind::Temperature => self.temperature(&pooled.temperatures),
            ConditionKind::HeatWave => self.heat_wave(&pooled.temperatures, years_in_window),
            ConditionKind::Cold => self.cold(&pooled.temperatures, years_in_window),
            ConditionKind::Wind => self.wind(&pooled.wind_speeds),
        }
    }

    fn precipitation(
        &self,
        kind: ConditionKind,
        flux: &[f64],
        threshold_mm_per_day: f64,
        years_in_window: usize,
    ) -> ConditionSummary {
        if flux.is_empty() {
            return unavailable(kind);
        }

        let mm_per_day: Vec<f64> = flux.iter().map(|f| f * SECONDS_PER_DAY).collect();
        let wet = Exceedance::of(&mm_per_day, |p| p > threshold_mm_per_day);
        let probability = wet.probability();

        ConditionSummary::Precipitation {
            probability: round1(probability),
            avg_days: round1(wet.avg_days(years_in_window)),
            max_recorded: round1(max(&mm_per_day)),
            message: self.messages.select(kind, probability).to_string(),
        }
    }

    fn temperature(&self, temperatures: &[f64]) -> ConditionSummary {
        if temperatures.is_empty() {
            return unavailable(ConditionKind::Temperature);
        }

        let avg = mean(temperatures);
        ConditionSummary::Temperature {
            avg: round1(avg),
            min: round1(min(temperatures)),
            max: round1(max(temperatures)),
            message: self
                .messages
                .select(ConditionKind::Temperature, avg)
                .to_string(),
        }
    }

    fn heat_wave(&self, temperatures: &[f64], years_in_window: usize) -> ConditionSummary {
        if temperatures.is_empty() {
            return unavailable(ConditionKind::HeatWave);
        }

        let threshold = self.thresholds.heat_wave_celsius;
        let hot = Exceedance::of(temperatures, |t| t > threshold);
        let probability = hot.probability();

        ConditionSummary::HeatWave {
            probability: round1(probability),
            avg_days: round1(hot.avg_days(years_in_window)),
            max_temp: round1(max(temperatures)),
            message: self
                .messages
                .select(ConditionKind::HeatWave, probability)
                .to_string(),
        }
    }

    fn cold(&self, temperatures: &[f64], years_in_window: usize) -> ConditionSummary {
        if temperatures.is_empty() {
            return unavailable(ConditionKind::Cold);
        }

        let threshold = self.thresholds.cold_celsius;
        let cold = Exceedance::of(temperatures, |t| t < threshold);
        let probability = cold.probability();

        ConditionSummary::Cold {
            probability: round1(probability),
            avg_days: round1(cold.avg_days(years_in_window)),
            min_temp: round1(min(temperatures)),
            message: self
                .messages
                .select(ConditionKind::Cold, probability)
                .to_string(),
        }
    }

    fn wind(&self, speeds: &[f64]) -> ConditionSummary {
        if speeds.is_empty() {
            return unavailable(ConditionKind::Wind);
        }

        let threshold = self.thresholds.high_wind_m_per_s;
        let windy = Exceedance::of(speeds, |w| w > threshold);
        let probability = windy.probability();

        ConditionSummary::Wind {
            probability: round1(probability),
            avg_speed: round1(mean(speeds)),
            max_speed: round1(max(speeds)),
            message: self
                .messages
                .select(ConditionKind::Wind, probability)
                .to_string(),
        }
    }

    /// Fixed stand-in figures for a condition with no data, used only when
    /// the empty-series policy asks for them. `month` shifts the baseline
    /// temperature up for September to November.
    pub fn synthetic_defaults(&self, kind: ConditionKind, month: u32) -> ConditionSummary {
        let probability_summary = |probability: f64| self.messages.select(kind, probability);

        match kind {
            ConditionKind::Rain => ConditionSummary::Precipitation {
                probability: 25.0,
                avg_days: round1(25.0 * 0.3),
                max_recorded: 15.0,
                message: probability_summary(25.0).to_string(),
            },
            ConditionKind::ExtremeRain => ConditionSummary::Precipitation {
                probability: 5.0,
                avg_days: round1(5.0 * 0.2),
                max_recorded: 35.0,
                message: probability_summary(5.0).to_string(),
            },
            ConditionKind::Temperature => {
                let base = if (9..=11).contains(&month) { 18.0 } else { 15.0 };
                let avg = base + 1.0;
                ConditionSummary::Temperature {
                    avg: round1(avg),
                    min: round1(avg - 6.5),
                    max: round1(avg + 7.5),
                    message: self.messages.select(kind, avg).to_string(),
                }
            }
            ConditionKind::HeatWave => ConditionSummary::HeatWave {
                probability: 7.5,
                avg_days: round1(7.5 * 0.25),
                max_temp: 31.5,
                message: probability_summary(7.5).to_string(),
            },
            ConditionKind::Wind => ConditionSummary::Wind {
                probability: 17.5,
                avg_speed: 6.0,
                max_speed: 20.0,
                message: probability_summary(17.5).to_string(),
            },
            ConditionKind::Cold => ConditionSummary::Cold {
                probability: 2.5,
                avg_days: round1(2.5 * 0.1),
                min_temp: 2.5,
                message: probability_summary(2.5).to_string(),
            },
        }
    }
}

fn unavailable(kind: ConditionKind) -> ConditionSummary {
    let what = match kind {
        ConditionKind::Rain => "precipitation data",
        ConditionKind::ExtremeRain => "extreme precipitation data",
        ConditionKind::Temperature => "temperature data",
        ConditionKind::HeatWave => "temperature data to estimate heat waves",
        ConditionKind::Cold => "temperature data to estimate extreme cold",
        ConditionKind::Wind => "wind data",
    };

    ConditionSummary::Unavailable {
        error: UNAVAILABLE_ERROR.to_string(),
        message: format!(
            "Could not retrieve {} for this period and location",
            what
        ),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}
