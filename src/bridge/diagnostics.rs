use crate::{bridge::outputs::RtkFixStatus, constants::DIFFERENTIAL_AGE_WARNING_S};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    #[default]
    Ok,
    Warn,
}

/// Latest receiver figures: CNO from GPS positions, the rest refreshed
/// by every RTK baseline solution
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Diagnostics {
    /// Mean carrier to noise ratio of the latest GPS position (dB-Hz)
    pub cno_mean: f64,
    pub ar_ratio: f64,
    pub differential_age_s: f64,
    pub heading_base_to_rover_rad: f64,
    pub fix_status: Option<RtkFixStatus>,
}

/// One named status, summarizing [Diagnostics]
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub name: String,
    pub level: DiagnosticLevel,
    pub message: String,
    /// (key, value) pairs
    pub values: Vec<(String, String)>,
}

impl Diagnostics {
    /// Mean carrier to noise ratio, always [DiagnosticLevel::Ok]
    pub fn cno_status(&self) -> StatusReport {
        StatusReport {
            name: "CNO Mean".to_string(),
            level: DiagnosticLevel::Ok,
            message: format!("{:.6}", self.cno_mean),
            values: vec![],
        }
    }

    pub fn rtk_status(&self) -> StatusReport {
        let mut level = DiagnosticLevel::Ok;

        let mut message = match self.fix_status {
            Some(status) => {
                if matches!(status, RtkFixStatus::Fix3D | RtkFixStatus::Single) {
                    level = DiagnosticLevel::Warn;
                }
                format!("{}: {:.3}", status, self.ar_ratio)
            },
            None => format!("Unknown Fix: {:.3}", self.ar_ratio),
        };

        if self.differential_age_s > DIFFERENTIAL_AGE_WARNING_S {
            level = DiagnosticLevel::Warn;
            message.push_str(" Differential Age Large");
        }

        StatusReport {
            name: "RTK".to_string(),
            level,
            message,
            values: vec![
                ("AR Ratio".to_string(), format!("{:.3}", self.ar_ratio)),
                (
                    "Differential Age".to_string(),
                    format!("{:.3}", self.differential_age_s),
                ),
                (
                    "Heading Base to Rover (rad)".to_string(),
                    format!("{:.6}", self.heading_base_to_rover_rad),
                ),
            ],
        }
    }
}
