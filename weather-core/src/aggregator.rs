//! Geocode → current conditions → forecast, projected into a [`WeatherView`].

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use std::sync::Arc;

use crate::{
    Config, WeatherError,
    model::{ForecastDay, ForecastSample, GeoCandidate, GeoQuery, WeatherView},
    provider::{WeatherProvider, provider_from_config},
};

const FORECAST_DAYS: usize = 5;
const DATE_FORMAT: &str = "%A, %B %d";

#[derive(Debug, Clone)]
pub struct ForecastAggregator {
    provider: Arc<dyn WeatherProvider>,
}

impl ForecastAggregator {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        Ok(Self::new(Arc::from(provider_from_config(config)?)))
    }

    pub async fn aggregate(&self, query: &GeoQuery) -> Result<WeatherView, WeatherError> {
        self.aggregate_at(query, Utc::now()).await
    }

    /// Build the view as of `now`. Upstream calls run one after another; dropping the
    /// returned future cancels whatever is still outstanding.
    pub async fn aggregate_at(
        &self,
        query: &GeoQuery,
        now: DateTime<Utc>,
    ) -> Result<WeatherView, WeatherError> {
        let city_name = normalize_city_name(&query.city);
        if city_name.is_empty() {
            return Err(WeatherError::NotFound(query.city.clone()));
        }

        let geo_query = GeoQuery { city: city_name.clone(), country: query.country.clone() };
        let candidates = self.provider.geocode(&geo_query).await?;

        let (location, alternatives) = choose_candidate(candidates, query.country.as_deref())
            .ok_or_else(|| WeatherError::NotFound(city_name.clone()))?;

        tracing::debug!(
            city = %city_name,
            location = %location.label(),
            alternatives = alternatives.len(),
            "Geocoded city"
        );

        let current = self.provider.current(location.coordinates).await?;
        let samples = self.provider.forecast(location.coordinates).await?;
        let five_day_forecast = noon_forecast(&samples);

        if five_day_forecast.len() < FORECAST_DAYS {
            tracing::info!(
                city = %city_name,
                days = five_day_forecast.len(),
                "Forecast has fewer noon samples than expected"
            );
        }

        Ok(WeatherView {
            city_name,
            current_date: local_date_label(now, current.utc_offset_secs),
            current_temp: current.temp,
            current_weather: current.condition,
            min_temp: current.temp_min,
            max_temp: current.temp_max,
            wind_speed: current.wind_speed_mps,
            five_day_forecast,
            location,
            alternatives,
        })
    }
}

/// `"new  YORK"` → `"New York"`.
pub fn normalize_city_name(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Pick the candidate matching `country`, or else the first one. The rest are returned
/// as alternatives in their original order.
pub fn choose_candidate(
    mut candidates: Vec<GeoCandidate>,
    country: Option<&str>,
) -> Option<(GeoCandidate, Vec<GeoCandidate>)> {
    if candidates.is_empty() {
        return None;
    }

    let index = country
        .and_then(|cc| candidates.iter().position(|c| c.country.eq_ignore_ascii_case(cc)))
        .unwrap_or(0);

    let chosen = candidates.remove(index);
    Some((chosen, candidates))
}

/// The first five samples stamped 12:00:00, each labelled with its own weekday.
pub fn noon_forecast(samples: &[ForecastSample]) -> Vec<ForecastDay> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0);

    samples
        .iter()
        .filter(|s| Some(s.timestamp.time()) == noon)
        .take(FORECAST_DAYS)
        .map(|s| {
            let date = s.timestamp.date();
            ForecastDay {
                weekday: date.format("%A").to_string(),
                date,
                temp: s.temp.round() as i64,
                condition: s.condition.clone(),
            }
        })
        .collect()
}

/// "Weekday, Month Day" at the location's local time.
pub fn local_date_label(now: DateTime<Utc>, utc_offset_secs: i32) -> String {
    match FixedOffset::east_opt(utc_offset_secs) {
        Some(offset) => now.with_timezone(&offset).format(DATE_FORMAT).to_string(),
        None => now.format(DATE_FORMAT).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinates, CurrentConditions};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, TimeZone};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct FakeProvider {
        candidates: Vec<GeoCandidate>,
        samples: Vec<ForecastSample>,
        calls: Mutex<Vec<&'static str>>,
        geocoded: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn geocode(&self, query: &GeoQuery) -> Result<Vec<GeoCandidate>, WeatherError> {
            self.calls.lock().unwrap().push("geocode");
            self.geocoded.lock().unwrap().push(query.as_param());
            Ok(self.candidates.clone())
        }

        async fn current(&self, _at: Coordinates) -> Result<CurrentConditions, WeatherError> {
            self.calls.lock().unwrap().push("current");
            Ok(CurrentConditions {
                temp: 21,
                temp_min: 17,
                temp_max: 24,
                condition: "Clear".into(),
                wind_speed_mps: 3.6,
                utc_offset_secs: 7200,
            })
        }

        async fn forecast(&self, _at: Coordinates) -> Result<Vec<ForecastSample>, WeatherError> {
            self.calls.lock().unwrap().push("forecast");
            Ok(self.samples.clone())
        }
    }

    fn candidate(name: &str, country: &str) -> GeoCandidate {
        GeoCandidate {
            name: name.into(),
            country: country.into(),
            state: None,
            coordinates: Coordinates { lat: 48.85, lon: 2.35 },
        }
    }

    /// A 3-hourly series starting at midnight on `start` for `days` days.
    fn series(start: NaiveDate, days: i64) -> Vec<ForecastSample> {
        let first = start.and_hms_opt(0, 0, 0).unwrap();
        (0..days * 8)
            .map(|i| ForecastSample {
                timestamp: first + Duration::hours(3 * i),
                temp: 10.0 + i as f64 * 0.5,
                condition: if i % 2 == 0 { "Clouds".into() } else { "Rain".into() },
            })
            .collect()
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn monday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 8, 30, 0).unwrap()
    }

    #[test]
    fn normalize_capitalizes_each_word() {
        assert_eq!(normalize_city_name("paris"), "Paris");
        assert_eq!(normalize_city_name("  new   YORK "), "New York");
        assert_eq!(normalize_city_name("saint-étienne"), "Saint-étienne");
        assert_eq!(normalize_city_name("   "), "");
    }

    #[test]
    fn choose_candidate_prefers_country_match() {
        let candidates = vec![candidate("Paris", "FR"), candidate("Paris", "US")];

        let (chosen, rest) = choose_candidate(candidates.clone(), Some("us")).unwrap();
        assert_eq!(chosen.country, "US");
        assert_eq!(rest, vec![candidate("Paris", "FR")]);

        let (chosen, rest) = choose_candidate(candidates, None).unwrap();
        assert_eq!(chosen.country, "FR");
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn choose_candidate_falls_back_to_first_for_unknown_country() {
        let (chosen, _) =
            choose_candidate(vec![candidate("Paris", "FR")], Some("DE")).unwrap();
        assert_eq!(chosen.country, "FR");
        assert!(choose_candidate(Vec::new(), None).is_none());
    }

    #[test]
    fn noon_forecast_takes_five_and_labels_by_sample_date() {
        let days = noon_forecast(&series(monday(), 6));

        let labels: Vec<&str> = days.iter().map(|d| d.weekday.as_str()).collect();
        assert_eq!(labels, ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]);
        assert_eq!(days[0].date, monday());
        // Index 4 in the series is 12:00 on day one: 10.0 + 4 * 0.5.
        assert_eq!(days[0].temp, 12);
        assert_eq!(days[0].condition, "Clouds");
    }

    #[test]
    fn noon_forecast_is_short_when_samples_are_short() {
        // Starts Monday 15:00, so only the Tuesday and Wednesday noons remain.
        let samples: Vec<ForecastSample> = series(monday(), 3).into_iter().skip(5).collect();
        let days = noon_forecast(&samples);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].weekday, "Tuesday");
    }

    #[test]
    fn noon_forecast_ignores_non_noon_samples() {
        let samples = vec![ForecastSample {
            timestamp: monday().and_hms_opt(12, 0, 1).unwrap(),
            temp: 1.0,
            condition: "Clear".into(),
        }];
        assert!(noon_forecast(&samples).is_empty());
    }

    #[test]
    fn date_label_uses_location_offset() {
        let late = Utc.with_ymd_and_hms(2024, 6, 3, 23, 30, 0).unwrap();
        assert_eq!(local_date_label(late, 0), "Monday, June 03");
        assert_eq!(local_date_label(late, 3600), "Tuesday, June 04");
    }

    #[tokio::test]
    async fn aggregate_builds_full_view() {
        let provider = Arc::new(FakeProvider {
            candidates: vec![candidate("Paris", "FR"), candidate("Paris", "US")],
            samples: series(monday(), 5),
            ..FakeProvider::default()
        });
        let aggregator = ForecastAggregator::new(provider.clone());

        let view = aggregator
            .aggregate_at(&GeoQuery::new("paris"), monday_morning())
            .await
            .unwrap();

        assert_eq!(view.city_name, "Paris");
        assert_eq!(view.current_date, "Monday, June 03");
        assert_eq!(view.current_temp, 21);
        assert_eq!(view.min_temp, 17);
        assert_eq!(view.max_temp, 24);
        assert_eq!(view.current_weather, "Clear");
        assert_eq!(view.five_day_forecast.len(), 5);
        assert_eq!(view.location.country, "FR");
        assert_eq!(view.alternatives.len(), 1);
        assert_eq!(provider.calls(), ["geocode", "current", "forecast"]);
        assert_eq!(*provider.geocoded.lock().unwrap(), ["Paris"]);
    }

    #[tokio::test]
    async fn empty_geocode_is_not_found_without_weather_calls() {
        let provider = Arc::new(FakeProvider::default());
        let aggregator = ForecastAggregator::new(provider.clone());

        let err = aggregator
            .aggregate_at(&GeoQuery::new("Qwzxville123"), monday_morning())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(provider.calls(), ["geocode"]);
    }

    #[tokio::test]
    async fn blank_city_is_not_found_without_any_calls() {
        let provider = Arc::new(FakeProvider::default());
        let aggregator = ForecastAggregator::new(provider.clone());

        let err = aggregator.aggregate(&GeoQuery::new("  ")).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(provider.calls().is_empty());
    }
}
