//! HTML rendering for the three pages.

use std::fmt::Write;

use city_weather_core::{GeoCandidate, WeatherView};

use crate::handlers::city_path;

const STYLE: &str = "body{font-family:sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem}\
    .forecast{display:flex;gap:1rem;list-style:none;padding:0}\
    .forecast-day{flex:1;text-align:center;border:1px solid #ddd;border-radius:.5rem;padding:.5rem}\
    .hint{color:#a33}";

/// Escape text for HTML bodies and double-quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    )
}

pub fn index(hint: Option<&str>) -> String {
    let hint = hint
        .map(|h| format!("<p class=\"hint\">{}</p>\n", escape(h)))
        .unwrap_or_default();

    layout(
        "City Weather",
        &format!(
            "<h1>City Weather</h1>\n{hint}\
             <form method=\"post\" action=\"/\">\n\
             <input type=\"text\" name=\"search\" placeholder=\"Where are you headed?\" autofocus>\n\
             <button type=\"submit\">Search</button>\n</form>"
        ),
    )
}

pub fn city(view: &WeatherView) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        "<h1>{}</h1>\n<p class=\"date\">{}</p>\n<p class=\"location\">{}</p>\n",
        escape(&view.city_name),
        escape(&view.current_date),
        escape(&view.location.label()),
    );
    let _ = write!(
        body,
        "<section class=\"current\">\n<p class=\"temp\">{}&deg;C</p>\n<p>{}</p>\n\
         <p>Min {}&deg;C / Max {}&deg;C</p>\n<p>Wind {} m/s</p>\n</section>\n",
        view.current_temp,
        escape(&view.current_weather),
        view.min_temp,
        view.max_temp,
        view.wind_speed,
    );

    body.push_str("<ul class=\"forecast\">\n");
    for day in &view.five_day_forecast {
        let _ = writeln!(
            body,
            "<li class=\"forecast-day\"><strong>{}</strong><br>{}&deg;C<br>{}</li>",
            escape(&day.weekday),
            day.temp,
            escape(&day.condition),
        );
    }
    body.push_str("</ul>\n");

    if !view.alternatives.is_empty() {
        body.push_str("<p>Not the right place? Try:</p>\n<ul class=\"alternatives\">\n");
        for alt in &view.alternatives {
            let _ = writeln!(
                body,
                "<li><a href=\"{}\">{}</a></li>",
                escape(&alternative_href(alt)),
                escape(&alt.label()),
            );
        }
        body.push_str("</ul>\n");
    }

    body.push_str("<p><a href=\"/\">Search again</a></p>");
    layout(&format!("Weather in {}", view.city_name), &body)
}

pub fn error(message: Option<&str>) -> String {
    let message = message.unwrap_or("Sorry, we couldn't find that place.");
    layout(
        "Something went wrong",
        &format!(
            "<h1>Something went wrong</h1>\n<p class=\"message\">{}</p>\n\
             <p><a href=\"/\">Back to search</a></p>",
            escape(message)
        ),
    )
}

fn alternative_href(alt: &GeoCandidate) -> String {
    if alt.country.is_empty() {
        city_path(&alt.name)
    } else {
        format!("{}?country={}", city_path(&alt.name), urlencoding::encode(&alt.country))
    }
}
