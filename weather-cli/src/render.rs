use std::fmt::Write;

use chrono::NaiveDate;
use weather_core::{ForecastDay, StrategyKind, WeatherSnapshot};

/// Human-readable view of a terminal snapshot.
pub fn snapshot(
    snap: &WeatherSnapshot,
    kind: StrategyKind,
    location: &str,
) -> anyhow::Result<String> {
    let mut out = String::new();

    match kind {
        StrategyKind::City => {
            let Some(report) = snap.report() else {
                return Ok(format!("No weather data for {location}\n"));
            };

            writeln!(out, "{} (local time {})", report.location_name, report.local_time)?;
            writeln!(
                out,
                "  Now: {:.1}°C, {}",
                report.current.temperature_celsius, report.current.condition_text
            )?;

            if !report.forecast.is_empty() {
                writeln!(out, "Forecast:")?;
                for day in &report.forecast {
                    writeln!(out, "  {}", forecast_line(day))?;
                }
            }
        }
        StrategyKind::Region => match snap.region(location) {
            Some(body) => {
                writeln!(out, "{location}:")?;
                writeln!(out, "{}", serde_json::to_string_pretty(body)?)?;
            }
            None => writeln!(out, "No weather data for {location}")?,
        },
    }

    Ok(out)
}

fn forecast_line(day: &ForecastDay) -> String {
    let label = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d")
        .map(|d| d.format("%a %Y-%m-%d").to_string())
        .unwrap_or_else(|_| day.date.clone());

    format!(
        "{label}  avg {:.1}°C  min {:.1}°C  max {:.1}°C  {}",
        day.avg_temp_celsius, day.min_temp_celsius, day.max_temp_celsius, day.condition.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weather_core::{Condition, CurrentConditions, Status};

    fn london() -> WeatherSnapshot {
        WeatherSnapshot {
            status: Status::Succeeded,
            current: Some(CurrentConditions {
                temperature_celsius: 21.5,
                condition_text: "Cloudy".into(),
                icon_ref: "//x/cloud.png".into(),
            }),
            local_time: Some("2024-05-01 10:00".into()),
            location_name: Some("London".into()),
            forecast: Some(vec![ForecastDay {
                date: "2024-05-01".into(),
                avg_temp_celsius: 18.2,
                max_temp_celsius: 22.0,
                min_temp_celsius: 14.5,
                condition: Condition {
                    text: "Cloudy".into(),
                    icon_ref: "//x/cloud.png".into(),
                },
            }]),
            ..WeatherSnapshot::default()
        }
    }

    #[test]
    fn renders_city_report() {
        let text = snapshot(&london(), StrategyKind::City, "London").unwrap();
        assert_eq!(
            text,
            "London (local time 2024-05-01 10:00)\n\
             \x20 Now: 21.5°C, Cloudy\n\
             Forecast:\n\
             \x20 Wed 2024-05-01  avg 18.2°C  min 14.5°C  max 22.0°C  Cloudy\n"
        );
    }

    #[test]
    fn renders_region_slot() {
        let mut snap = WeatherSnapshot {
            status: Status::Succeeded,
            ..WeatherSnapshot::default()
        };
        snap.regions.insert("pakistan".into(), json!({ "hourly": {} }));

        let text = snapshot(&snap, StrategyKind::Region, "pakistan").unwrap();
        assert!(text.starts_with("pakistan:\n"));
        assert!(text.contains("\"hourly\""));
    }

    #[test]
    fn missing_data_is_reported() {
        let snap = WeatherSnapshot::default();
        let text = snapshot(&snap, StrategyKind::City, "Paris").unwrap();
        assert_eq!(text, "No weather data for Paris\n");
    }
}
