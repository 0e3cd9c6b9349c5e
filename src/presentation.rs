//! Presentation contract exposed to the toast UI.
//!
//! The widget itself is not part of this crate; this module only shapes
//! a probe report into what the widget consumes: a loading flag, an
//! error message, or counts with a percentage and a color band.

use serde_json::{json, Value};

use seatlens_core_types::{SeatReport, SeatStats};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColorBand {
    Red,
    Amber,
    Green,
}

impl ColorBand {
    /// Band for an availability percentage: under 20 is red, under 50
    /// amber, everything else green.
    pub fn for_percent(percent: u32) -> Self {
        if percent < 20 {
            ColorBand::Red
        } else if percent < 50 {
            ColorBand::Amber
        } else {
            ColorBand::Green
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            ColorBand::Red => "#e74c3c",
            ColorBand::Amber => "#f39c12",
            ColorBand::Green => "#2ecc71",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ColorBand::Red => "red",
            ColorBand::Amber => "amber",
            ColorBand::Green => "green",
        }
    }
}

/// What the toast renders for one probe report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ToastPayload {
    Loading,
    Error {
        msg: String,
    },
    Availability {
        available: u32,
        total: u32,
        percent: u32,
        band: ColorBand,
    },
}

impl ToastPayload {
    /// The contract's wire shapes: `{loading: true}`, `{error, msg}`, or
    /// the counts plus derived percentage and band.
    pub fn to_json(&self) -> Value {
        match self {
            ToastPayload::Loading => json!({ "loading": true }),
            ToastPayload::Error { msg } => json!({ "error": true, "msg": msg }),
            ToastPayload::Availability {
                available,
                total,
                percent,
                band,
            } => json!({
                "available": available,
                "total": total,
                "percent": percent,
                "band": band.name(),
                "color": band.hex(),
            }),
        }
    }
}

impl From<&SeatReport> for ToastPayload {
    fn from(report: &SeatReport) -> Self {
        match report {
            SeatReport::Loading => ToastPayload::Loading,
            SeatReport::Error { reason } => ToastPayload::Error {
                msg: reason.clone(),
            },
            SeatReport::Stats(stats) => {
                let percent = percent_of(stats);
                ToastPayload::Availability {
                    available: stats.available,
                    total: stats.total,
                    percent,
                    band: ColorBand::for_percent(percent),
                }
            }
        }
    }
}

/// `round(available / total * 100)`; an empty chart renders as 0.
pub fn percent_of(stats: &SeatStats) -> u32 {
    if stats.total == 0 {
        return 0;
    }
    (stats.available as f64 / stats.total as f64 * 100.0).round() as u32
}
