use crate::models::ConditionKind;
use crate::settings::MessageBreakpoints;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Low,
    Medium,
    High,
}

/// Picks a short descriptive line for a condition's headline number.
///
/// Percentages bucket at `low_upper`/`medium_upper`; temperature buckets on
/// the mean in °C at `cold_upper_celsius`/`mild_upper_celsius`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageSelector {
    breakpoints: MessageBreakpoints,
}

impl MessageSelector {
    pub fn new(breakpoints: MessageBreakpoints) -> Self {
        Self { breakpoints }
    }

    pub fn bucket(&self, kind: ConditionKind, value: f64) -> Bucket {
        let (lower, upper) = match kind {
            ConditionKind::Temperature => (
                self.breakpoints.cold_upper_celsius,
                self.breakpoints.mild_upper_celsius,
            ),
            _ => (self.breakpoints.low_upper, self.breakpoints.medium_upper),
        };

        if value < lower {
            Bucket::Low
        } else if value < upper {
            Bucket::Medium
        } else {
            Bucket::High
        }
    }

    pub fn select(&self, kind: ConditionKind, value: f64) -> &'static str {
        message_for(kind, self.bucket(kind, value))
    }
}

fn message_for(kind: ConditionKind, bucket: Bucket) -> &'static str {
    use Bucket::*;
    use ConditionKind::*;

    match (kind, bucket) {
        (Rain, Low) => "Mostly clear skies. Perfect for outdoor plans",
        (Rain, Medium) => "A good chance to enjoy the sound of the rain",
        (Rain, High) => "Great for nature. Ecosystems welcome the water",
        (Temperature, Low) => "Cool weather, ideal for staying active",
        (Temperature, Medium) => "Pleasant temperature for any activity",
        (Temperature, High) => "Warm weather, ideal for enjoying the outdoors",
        (ExtremeRain, Low) => "Very low chance. Enjoy your day with peace of mind",
        (ExtremeRain, Medium) => "Stay informed, but no need to worry",
        (ExtremeRain, High) => "A natural spectacle in the making",
        (HeatWave, Low) => "Pleasant weather without extreme heat",
        (HeatWave, Medium) => "Perfect for those who love the heat",
        (HeatWave, High) => "Ideal for the beach and the pool",
        (Wind, Low) => "Calm and peaceful conditions",
        (Wind, Medium) => "Perfect for flying a kite or windsurfing",
        (Wind, High) => "Wind lovers will enjoy it",
        (Cold, Low) => "Very low chance of extreme cold",
        (Cold, Medium) => "A chance to enjoy warm clothes and hot drinks",
        (Cold, High) => "Possible wintry weather for cold lovers",
    }
}
