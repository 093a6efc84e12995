//! Normalizes raw `GeoJSON` point features into [`EventRecord`] values.
//!
//! The upstream API has served two property layouts over time: location
//! points keyed by `name`/`count`/`html`, and article points keyed by
//! `title`/`url`/`domain`/`urlpubtimedate`. Both are read into the same
//! [`RawProperties`] and folded into one canonical record.

use gdelt_pulse_event_models::{Category, EventRecord};
use serde_json::{Map, Value};

/// Union of the property names seen across upstream response layouts.
///
/// Fields holding an unexpected JSON type read as absent.
#[derive(Debug, Clone, Default)]
pub struct RawProperties {
    pub name: Option<String>,
    pub title: Option<String>,
    /// Article count. Sometimes serialized as a float.
    pub count: Option<Value>,
    pub html: Option<String>,
    pub shareimage: Option<String>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub urlpubtimedate: Option<String>,
    pub seendate: Option<String>,
}

impl RawProperties {
    /// Reads the known keys of a feature's `properties` value. `null` or a
    /// non-object value yields the default.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(map) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        let text = |key: &str| string_field(map, key);

        Self {
            name: text("name"),
            title: text("title"),
            count: map.get("count").cloned(),
            html: text("html"),
            shareimage: text("shareimage"),
            url: text("url"),
            domain: text("domain"),
            urlpubtimedate: text("urlpubtimedate"),
            seendate: text("seendate"),
        }
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(String::from)
}

/// Normalizes a list of raw `GeoJSON` features for one category.
///
/// A feature is kept exactly when its `geometry.coordinates` is a numeric
/// `[lng, lat]` pair; its properties never cause it to be dropped. The
/// index in each record id counts surviving features only.
#[must_use]
pub fn normalize_features(features: Vec<Value>, category: Category) -> Vec<EventRecord> {
    features
        .into_iter()
        .filter_map(|feature| {
            let (lng, lat) = point(&feature)?;
            Some((lng, lat, RawProperties::from_value(feature.get("properties"))))
        })
        .enumerate()
        .map(|(index, (lng, lat, props))| to_record(index, lng, lat, props, category))
        .collect()
}

/// `GeoJSON` point geometry, `[longitude, latitude]`.
fn point(feature: &Value) -> Option<(f64, f64)> {
    let coordinates = feature.get("geometry")?.get("coordinates")?.as_array()?;
    match coordinates.as_slice() {
        [lng, lat] => Some((lng.as_f64()?, lat.as_f64()?)),
        _ => None,
    }
}

fn to_record(
    index: usize,
    lng: f64,
    lat: f64,
    props: RawProperties,
    category: Category,
) -> EventRecord {
    let title = props.title.or(props.name);
    let domain = props
        .domain
        .or_else(|| props.url.as_deref().and_then(host_of));
    let date = props.urlpubtimedate.or(props.seendate);

    EventRecord {
        id: format!("{category}-{index}-{}", title.as_deref().unwrap_or_default()),
        lat,
        lng,
        category,
        color: category.color().to_string(),
        title,
        count: count_of(props.count.as_ref()),
        html: props.html,
        share_image: props.shareimage,
        url: props.url,
        domain,
        date,
    }
}

/// Missing, zero, negative, or non-numeric counts read as 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_of(value: Option<&Value>) -> u64 {
    let count = value.and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 1.0).map(|f| f.round() as u64))
    });
    count.filter(|c| *c > 0).unwrap_or(1)
}

fn host_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.trim_start_matches("www.").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_features_without_a_coordinate_pair() {
        let features = vec![
            json!({ "geometry": { "coordinates": [10.0, 20.0] }, "properties": { "name": "Kyiv" } }),
            json!({ "geometry": { "coordinates": [10.0] }, "properties": { "name": "short" } }),
            json!({ "geometry": { "coordinates": [1.0, 2.0, 3.0] }, "properties": {} }),
            json!({ "geometry": null, "properties": { "name": "no geometry" } }),
            json!({ "properties": { "name": "missing geometry" } }),
            json!({ "geometry": { "coordinates": ["a", "b"] } }),
            json!({ "geometry": { "coordinates": [-3.5, 40.4] }, "properties": { "name": "Madrid" } }),
        ];

        let records = normalize_features(features, Category::Conflict);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "conflict-0-Kyiv");
        assert_eq!(records[1].id, "conflict-1-Madrid");
        assert!((records[1].lng - -3.5).abs() < f64::EPSILON);
        assert!((records[1].lat - 40.4).abs() < f64::EPSILON);
    }

    #[test]
    fn unexpected_property_types_do_not_drop_features() {
        let features = vec![
            json!({ "geometry": { "coordinates": [10, 20] }, "properties": { "name": 42, "count": 4 } }),
            json!({ "geometry": { "coordinates": [10, 20] }, "properties": null }),
            json!({ "geometry": { "coordinates": [10, 20] }, "properties": "n/a" }),
            json!({ "geometry": { "coordinates": [10, 20] }, "properties": { "title": ["x"], "url": 7, "domain": "example.org" } }),
        ];

        let records = normalize_features(features, Category::Conflict);

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].id, "conflict-0-");
        assert!(records[0].title.is_none());
        assert_eq!(records[0].count, 4);
        assert_eq!(records[1].id, "conflict-1-");
        assert_eq!(records[1].count, 1);
        assert!((records[1].lng - 10.0).abs() < f64::EPSILON);
        assert!((records[1].lat - 20.0).abs() < f64::EPSILON);
        assert_eq!(records[2].id, "conflict-2-");
        assert!(records[3].title.is_none());
        assert!(records[3].url.is_none());
        assert_eq!(records[3].domain.as_deref(), Some("example.org"));
    }

    #[test]
    fn reads_location_point_layout() {
        let features = vec![json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [2.35, 48.85] },
            "properties": {
                "name": "Paris, France",
                "count": 12,
                "html": "<a href=\"https://example.org\">x</a>",
                "shareimage": "https://example.org/img.jpg"
            }
        })];

        let record = &normalize_features(features, Category::Protest)[0];

        assert_eq!(record.title.as_deref(), Some("Paris, France"));
        assert_eq!(record.count, 12);
        assert_eq!(record.color, "#eab308");
        assert_eq!(record.category, Category::Protest);
        assert_eq!(record.share_image.as_deref(), Some("https://example.org/img.jpg"));
        assert!(record.domain.is_none());
        assert!(record.url.is_none());
    }

    #[test]
    fn reads_article_point_layout() {
        let features = vec![json!({
            "geometry": { "coordinates": [139.7, 35.7] },
            "properties": {
                "title": "Summit opens in Tokyo",
                "url": "https://www.news.example.com/story/1",
                "urlpubtimedate": "2024-05-10T11:30:00Z"
            }
        })];

        let record = &normalize_features(features, Category::Diplomacy)[0];

        assert_eq!(record.id, "diplomacy-0-Summit opens in Tokyo");
        assert_eq!(record.domain.as_deref(), Some("news.example.com"));
        assert_eq!(record.date.as_deref(), Some("2024-05-10T11:30:00Z"));
        assert_eq!(record.count, 1);
        assert!(record.html.is_none());
    }

    #[test]
    fn explicit_domain_wins_over_url_host() {
        let features = vec![json!({
            "geometry": { "coordinates": [0.0, 0.0] },
            "properties": { "url": "https://mirror.example.net/a", "domain": "example.com" }
        })];

        let record = &normalize_features(features, Category::Disaster)[0];

        assert_eq!(record.domain.as_deref(), Some("example.com"));
        assert_eq!(record.id, "disaster-0-");
    }

    #[test]
    fn count_defaults() {
        assert_eq!(count_of(None), 1);
        assert_eq!(count_of(Some(&json!(0))), 1);
        assert_eq!(count_of(Some(&json!(-4))), 1);
        assert_eq!(count_of(Some(&json!("7"))), 1);
        assert_eq!(count_of(Some(&json!(7))), 7);
        assert_eq!(count_of(Some(&json!(3.0))), 3);
    }
}
