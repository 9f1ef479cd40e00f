use chrono::TimeZone;
use std::fmt::{self, Display, Write};

use weatherdash_core::{
    DashboardState, Timestamp,
    present::{CurrentView, chart_points, forecast_cards},
};

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One bar glyph per value, scaled between the series min and max.
pub fn sparkline(values: &[i64]) -> String {
    let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
        return String::new();
    };
    let span = (max - min).max(1) as f64;

    values
        .iter()
        .map(|v| {
            let norm = (v - min) as f64 / span;
            BARS[(norm * (BARS.len() - 1) as f64).round() as usize]
        })
        .collect()
}

/// Writes the full dashboard; `now` decides the date line and day/night background.
pub fn render_dashboard<W, Tz>(
    out: &mut W,
    state: &DashboardState,
    now: Timestamp,
    tz: &Tz,
    icon_base_url: &str,
) -> fmt::Result
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    writeln!(out, "Weather Dashboard")?;

    if let Some(advisory) = &state.advisory {
        writeln!(out, "! {advisory}")?;
    }
    if let Some(error) = &state.error {
        writeln!(out, "x {error}")?;
    }
    if state.loading {
        writeln!(out, "Loading weather data...")?;
    }

    if let (false, Some(snapshot)) = (state.loading, &state.snapshot) {
        let view = CurrentView::derive(snapshot, now, tz, icon_base_url);

        writeln!(out)?;
        writeln!(out, "{}  ({})", view.title, view.date)?;
        writeln!(out, "Background: {} [{}]", view.gradient.name, view.gradient.css())?;
        writeln!(out, "{}  {}", view.temperature, view.description)?;
        writeln!(out, "  Feels Like: {}", view.feels_like)?;
        writeln!(out, "  Wind: {}", view.wind)?;
        writeln!(out, "  Humidity: {}", view.humidity)?;
        writeln!(out, "  Sunrise: {}", view.sunrise)?;
        writeln!(out, "  Sunset: {}", view.sunset)?;
        writeln!(out, "  Icon: {}", view.icon_url)?;

        if !state.forecast.is_empty() {
            write_forecast(out, state, tz, icon_base_url)?;
        } else if state.forecast_loading {
            writeln!(out)?;
            writeln!(out, "Loading forecast...")?;
        }
    }

    writeln!(out)?;
    write!(out, "Powered by OpenWeather API")
}

fn write_forecast<W, Tz>(
    out: &mut W,
    state: &DashboardState,
    tz: &Tz,
    icon_base_url: &str,
) -> fmt::Result
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    writeln!(out)?;
    writeln!(out, "5-Day Forecast")?;
    for card in forecast_cards(&state.forecast, tz, icon_base_url) {
        writeln!(
            out,
            "  {:<12} {:>6}  {:<14} {}",
            card.date, card.temperature, card.condition, card.icon_url
        )?;
    }

    let (points, axis) = chart_points(&state.forecast, tz);
    let temps: Vec<i64> = points.iter().map(|p| p.temperature).collect();
    let feels: Vec<i64> = points.iter().map(|p| p.feels_like).collect();

    writeln!(out)?;
    writeln!(out, "Temperature Trend ({axis})")?;
    writeln!(out, "  Temperature  {}", sparkline(&temps))?;
    writeln!(out, "  Feels Like   {}", sparkline(&feels))?;
    for p in &points {
        writeln!(out, "  {:<4} {:>4} {:>4}", p.label, p.temperature, p.feels_like)?;
    }
    Ok(())
}
