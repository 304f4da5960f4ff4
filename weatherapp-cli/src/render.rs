use std::fmt::Write;

use weatherapp_core::{
    CurrentWeatherReport, ForecastEntry, ForecastReport, Units,
    format::{
        DATE_PATTERN, DAY_PATTERN, PLACEHOLDER, TIME_PATTERN, compass, format_opt_unix, icon_url,
        or_placeholder, temperature,
    },
};

pub const OFFLINE: &str = "No internet connection";
pub const LOADING_CURRENT: &str = "Loading current weather...";
pub const FAILED_CURRENT: &str = "Failed to load current weather";
pub const LOADING_FORECAST: &str = "Loading forecast...";
pub const FAILED_FORECAST: &str = "Failed to load forecast";

/// Home view: the current conditions.
pub fn current(report: &CurrentWeatherReport, units: Units) -> String {
    let tz = report.timezone;
    let deg = units.temperature_suffix();
    let mut out = String::new();

    let place = match (report.name.as_deref(), report.country()) {
        (Some(name), Some(country)) => format!("{name}, {country}"),
        (Some(name), None) => name.to_string(),
        (None, _) => PLACEHOLDER.to_string(),
    };

    // Writing into a String can't fail.
    let _ = writeln!(out, "{place}");
    let _ = writeln!(out, "{}", format_opt_unix(report.dt, tz, DATE_PATTERN));
    let _ = writeln!(
        out,
        "{}  feels like {}",
        temperature(report.main.temp, deg),
        temperature(report.main.feels_like, deg),
    );

    if let Some(condition) = report.condition() {
        let _ = write!(
            out,
            "{}",
            condition
                .description
                .as_deref()
                .or(condition.main.as_deref())
                .unwrap_or(PLACEHOLDER)
        );
        if let Some(icon) = condition.icon.as_deref() {
            let _ = write!(out, "  ({})", icon_url(icon));
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "Min {}  Max {}",
        temperature(report.main.temp_min, deg),
        temperature(report.main.temp_max, deg),
    );
    let _ = writeln!(
        out,
        "Humidity {}%  Pressure {}hPa  Visibility {}m",
        or_placeholder(report.main.humidity),
        or_placeholder(report.main.pressure),
        or_placeholder(report.visibility),
    );
    let _ = writeln!(
        out,
        "Wind {}  Clouds {}%",
        wind(report.wind.speed, report.wind.deg, units),
        or_placeholder(report.clouds.all),
    );
    let _ = writeln!(
        out,
        "Sunrise {}  Sunset {}",
        format_opt_unix(report.sys.sunrise, tz, TIME_PATTERN),
        format_opt_unix(report.sys.sunset, tz, TIME_PATTERN),
    );

    out
}

/// Forecast view: 3-hour steps grouped under one header per local day.
pub fn forecast(report: &ForecastReport, units: Units) -> String {
    let tz = report.city.timezone;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "5 Day Forecast for {}",
        report.city.name.as_deref().unwrap_or(PLACEHOLDER)
    );

    // The provider lists steps in time order, so a day never comes back.
    let mut day = None;
    for entry in &report.list {
        let header = format_opt_unix(entry.dt, tz, DAY_PATTERN);
        if day.as_ref() != Some(&header) {
            let _ = writeln!(out, "{header}");
            day = Some(header);
        }
        out.push_str(&forecast_line(entry, tz, units));
        out.push('\n');
    }

    out
}

fn forecast_line(entry: &ForecastEntry, tz: Option<i32>, units: Units) -> String {
    let deg = units.temperature_suffix();
    let mut line = format!(
        "  {}  {:>6}",
        format_opt_unix(entry.dt, tz, TIME_PATTERN),
        temperature(entry.main.temp, deg),
    );

    if entry.main.feels_like.is_some() {
        let _ = write!(line, "  feels like {:>5}", temperature(entry.main.feels_like, deg));
    }

    let _ = write!(
        line,
        "  {:<20}",
        entry
            .condition()
            .and_then(|c| c.description.as_deref())
            .unwrap_or(PLACEHOLDER)
    );

    if let Some(pop) = entry.pop {
        let _ = write!(line, "  rain {:.0}%", pop * 100.0);
    }
    if let Some(mm) = entry.rain_volume() {
        let _ = write!(line, " {mm:.1}mm");
    }

    line.trim_end().to_string()
}

fn wind(speed: Option<f64>, deg: Option<u16>, units: Units) -> String {
    match (speed, deg) {
        (Some(speed), Some(deg)) => format!("{speed:.1} {} {}", units.speed_suffix(), compass(deg)),
        (Some(speed), None) => format!("{speed:.1} {}", units.speed_suffix()),
        (None, _) => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT: &str = r#"{
        "weather": [{"main": "Rain", "description": "light rain", "icon": "10d"}],
        "main": {"temp": 14.2, "feels_like": 13.6, "temp_min": 12.9, "temp_max": 15.3,
                 "pressure": 1012, "humidity": 81},
        "visibility": 10000,
        "wind": {"speed": 4.6, "deg": 240},
        "clouds": {"all": 75},
        "dt": 1700000000,
        "sys": {"country": "GB", "sunrise": 1699946000, "sunset": 1699979000},
        "timezone": 0,
        "name": "London"
    }"#;

    #[test]
    fn current_view_shows_all_fields() {
        let report = CurrentWeatherReport::from_json(CURRENT).unwrap();
        let text = current(&report, Units::Metric);

        assert!(text.starts_with("London, GB\nNov 14 2023\n"));
        assert!(text.contains("14°C  feels like 13°C"));
        assert!(text.contains("light rain  (https://openweathermap.org/img/wn/10d@2x.png)"));
        assert!(text.contains("Min 12°C  Max 15°C"));
        assert!(text.contains("Humidity 81%  Pressure 1012hPa  Visibility 10000m"));
        assert!(text.contains("Wind 4.6 m/s SW  Clouds 75%"));
        assert!(text.contains("Sunrise 07:13  Sunset 16:23"));
    }

    #[test]
    fn sparse_current_report_degrades_to_placeholders() {
        let report = CurrentWeatherReport::from_json(r#"{"weather": [{}]}"#).unwrap();
        let text = current(&report, Units::Imperial);

        assert!(text.starts_with("N/A\nN/A\n"));
        assert!(text.contains("N/A  feels like N/A"));
        assert!(text.contains("Humidity N/A%"));
        assert!(text.contains("Wind N/A"));
        assert!(text.contains("Sunrise N/A  Sunset N/A"));
    }

    #[test]
    fn forecast_view_groups_steps_by_local_day() {
        let report = ForecastReport::from_json(
            r#"{
            "city": {"name": "London", "timezone": 3600},
            "list": [
                {"dt": 1700006400, "main": {"temp": 13.1, "feels_like": 12.7},
                 "weather": [{"description": "light rain"}], "pop": 0.64, "rain": {"3h": 0.9}},
                {"dt": 1700017200, "main": {"temp": 12.4},
                 "weather": [{"description": "overcast clouds"}]},
                {"dt": 1700092800, "main": {"temp": -1.8, "feels_like": -4.2},
                 "weather": [{"description": "clear sky"}]}
            ]
        }"#,
        )
        .unwrap();

        let text = forecast(&report, Units::Metric);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "5 Day Forecast for London");
        assert_eq!(lines[1], "Wed, Nov 15");
        assert!(lines[2].starts_with("  01:00"));
        assert!(lines[2].contains("13°C  feels like  12°C  light rain"));
        assert!(lines[2].ends_with("rain 64% 0.9mm"));
        assert!(lines[3].starts_with("  04:00"));
        assert!(!lines[3].contains("feels like"));
        assert!(lines[3].ends_with("overcast clouds"));
        assert_eq!(lines[4], "Thu, Nov 16");
        assert!(lines[5].starts_with("  01:00"));
        assert!(lines[5].contains("-1°C  feels like  -4°C  clear sky"));
    }
}
