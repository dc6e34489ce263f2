use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A day recovered from a generator response, possibly assembled from
/// fragments of a truncated document.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RecoveredDay {
    pub day: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub schedules: Vec<RecoveredItem>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RecoveredItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub cost: Option<String>,
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?[ \t]*\r?\n(.*?)(?:\r?\n```|$)").expect("valid fence pattern")
    })
}

fn day_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""day"\s*:\s*(\d+)"#).expect("valid day pattern"))
}

fn legacy_day_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^day_(\d+)$").expect("valid legacy key pattern"))
}

/// Matches one `"field": value` pair for the known generator field set.
fn field_pair_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#""(id|name|time|lat|lng|category|duration|notes|cost|address|day|date|title)"\s*:\s*("(?:[^"\\]|\\.)*"|-?\d+(?:\.\d+)?)"#,
        )
        .expect("valid field pair pattern")
    })
}

/// Best-effort recovery of a day list from a generator response. Four
/// stages, each attempted only when the previous one failed; total for any
/// input, including empty and non-JSON text.
pub fn parse_generated_itinerary(raw: &str) -> Vec<RecoveredDay> {
    let text = strip_code_fence(raw).trim();
    if text.is_empty() {
        return Vec::new();
    }

    // Stage 1: the document is complete.
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return days_from_value(&value).unwrap_or_default();
    }

    // Stage 2: close off the truncation and retry.
    let repaired = repair_truncated_json(text);
    if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
        if let Some(days) = days_from_value(&value) {
            if !days.is_empty() {
                return days;
            }
        }
    }

    // Stages 3 and 4: pull days (and then fields) out of the raw text.
    extract_days_by_pattern(text)
}

/// Strips an optional fenced-code wrapper; the closing fence may itself have
/// been cut off.
pub fn strip_code_fence(raw: &str) -> &str {
    match fence_pattern().captures(raw) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(raw),
        None => raw,
    }
}

/// Structural repair for a document terminated early by a length limit:
/// close an unterminated trailing string, drop a dangling comma, then append
/// exactly the closers still open at the end of the text.
pub fn repair_truncated_json(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escape = false;

    for ch in text.chars() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut repaired = text.to_string();
    if in_string {
        if escape {
            // A lone trailing backslash would swallow the closing quote.
            repaired.pop();
        }
        repaired.push('"');
    }

    let trimmed_len = repaired.trim_end().len();
    repaired.truncate(trimmed_len);
    if repaired.ends_with(',') {
        repaired.pop();
    }

    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }

    repaired
}

/// Extracts the day list from a parsed document: a `days` array (with the
/// `itinerary` alias), or a legacy `day_1, day_2, …` keyed object.
fn days_from_value(value: &Value) -> Option<Vec<RecoveredDay>> {
    let day_array = value
        .get("days")
        .or_else(|| value.get("itinerary"))
        .and_then(Value::as_array);

    if let Some(entries) = day_array {
        return Some(entries.iter().filter_map(day_from_value).collect());
    }

    let obj = value.as_object()?;
    let mut legacy: Vec<(u32, &Value)> = obj
        .iter()
        .filter_map(|(key, v)| {
            let caps = legacy_day_key_pattern().captures(key)?;
            let number: u32 = caps[1].parse().ok()?;
            Some((number, v))
        })
        .collect();

    if legacy.is_empty() {
        return None;
    }
    legacy.sort_by_key(|(number, _)| *number);

    Some(
        legacy
            .into_iter()
            .map(|(number, v)| RecoveredDay {
                day: number,
                title: v.get("title").and_then(Value::as_str).map(str::to_string),
                date: v.get("date").and_then(Value::as_str).map(str::to_string),
                schedules: v
                    .get("schedules")
                    .or_else(|| v.get("places"))
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(item_from_value).collect())
                    .unwrap_or_default(),
            })
            .collect(),
    )
}

/// Days with no `day` number are excluded.
fn day_from_value(value: &Value) -> Option<RecoveredDay> {
    let day = number_like(value.get("day")?)?;
    Some(RecoveredDay {
        day,
        title: value.get("title").and_then(Value::as_str).map(str::to_string),
        date: value.get("date").and_then(Value::as_str).map(str::to_string),
        schedules: value
            .get("schedules")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(item_from_value).collect())
            .unwrap_or_default(),
    })
}

fn number_like(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as u32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_like(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Lenient item conversion: providers and the generator disagree on number
/// vs. string for several fields, so coerce instead of failing the item.
fn item_from_value(value: &Value) -> Option<RecoveredItem> {
    let obj = value.as_object()?;
    let text = |key: &str| obj.get(key).and_then(string_like).unwrap_or_default();

    Some(RecoveredItem {
        id: text("id"),
        name: text("name"),
        time: text("time"),
        address: text("address"),
        category: text("category"),
        duration: text("duration"),
        notes: text("notes"),
        lat: obj.get("lat").and_then(Value::as_f64),
        lng: obj.get("lng").and_then(Value::as_f64),
        cost: obj.get("cost").and_then(string_like),
    })
}

/// Stage 3: scan for `{ "day": N, … "schedules": [ … ] }` shaped objects and
/// parse each one independently. A fragment that is itself unparseable falls
/// through to per-field extraction rather than being dropped.
fn extract_days_by_pattern(text: &str) -> Vec<RecoveredDay> {
    let mut recovered = Vec::new();
    let mut consumed = 0usize;

    for m in day_number_pattern().find_iter(text) {
        if m.start() < consumed {
            continue;
        }
        let Some(obj_start) = text[..m.start()].rfind('{') else {
            continue;
        };
        if obj_start < consumed {
            continue;
        }

        match balanced_object_end(text, obj_start) {
            Some(end) => {
                let fragment = &text[obj_start..=end];
                if !fragment.contains("\"schedules\"") {
                    // A schedule item carrying its own `day` field.
                    continue;
                }
                consumed = end + 1;
                if let Ok(value) = serde_json::from_str::<Value>(fragment) {
                    if let Some(day) = day_from_value(&value) {
                        recovered.push(day);
                        continue;
                    }
                }
                if let Some(day) = extract_day_fields(fragment) {
                    recovered.push(day);
                }
            }
            None => {
                // The truncated tail of the document.
                let fragment = &text[obj_start..];
                if fragment.contains("\"schedules\"") {
                    if let Some(day) = extract_day_fields(fragment) {
                        recovered.push(day);
                    }
                }
                break;
            }
        }
    }

    recovered
}

/// Index of the `}` closing the object opened at `start`, if the text still
/// contains it. String-aware so braces inside values do not count.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Stage 4: assemble a day from whatever `"field": value` pairs survive in a
/// fragment. Complete schedule sub-objects are parsed as usual; the trailing
/// cut-off item is assembled field by field and kept only when at least an
/// id and a name made it in before the truncation point.
fn extract_day_fields(fragment: &str) -> Option<RecoveredDay> {
    let schedules_at = fragment.find("\"schedules\"");
    let header = &fragment[..schedules_at.unwrap_or(fragment.len())];

    let day: u32 = day_number_pattern()
        .captures(header)
        .and_then(|caps| caps[1].parse().ok())?;

    let mut recovered = RecoveredDay {
        day,
        title: header_field(header, "title"),
        date: header_field(header, "date"),
        schedules: Vec::new(),
    };

    if let Some(at) = schedules_at {
        let mut pos = at;
        while let Some(rel) = fragment[pos..].find('{') {
            let item_start = pos + rel;
            match balanced_object_end(fragment, item_start) {
                Some(end) => {
                    let item_text = &fragment[item_start..=end];
                    let item = serde_json::from_str::<Value>(item_text)
                        .ok()
                        .as_ref()
                        .and_then(item_from_value)
                        .or_else(|| extract_item_fields(item_text));
                    if let Some(item) = item {
                        if !item.id.is_empty() && !item.name.is_empty() {
                            recovered.schedules.push(item);
                        }
                    }
                    pos = end + 1;
                }
                None => {
                    // Mid-object truncation: salvage the fields before the cut.
                    if let Some(item) = extract_item_fields(&fragment[item_start..]) {
                        if !item.id.is_empty() && !item.name.is_empty() {
                            recovered.schedules.push(item);
                        }
                    }
                    break;
                }
            }
        }
    }

    Some(recovered)
}

fn header_field(header: &str, name: &str) -> Option<String> {
    for caps in field_pair_pattern().captures_iter(header) {
        if &caps[1] == name {
            return decode_scalar(&caps[2]).and_then(|v| string_like(&v));
        }
    }
    None
}

fn extract_item_fields(fragment: &str) -> Option<RecoveredItem> {
    let mut item = RecoveredItem::default();
    let mut any = false;

    for caps in field_pair_pattern().captures_iter(fragment) {
        let Some(value) = decode_scalar(&caps[2]) else {
            continue;
        };
        any = true;
        match &caps[1] {
            "id" => item.id = string_like(&value).unwrap_or_default(),
            "name" => item.name = string_like(&value).unwrap_or_default(),
            "time" => item.time = string_like(&value).unwrap_or_default(),
            "address" => item.address = string_like(&value).unwrap_or_default(),
            "category" => item.category = string_like(&value).unwrap_or_default(),
            "duration" => item.duration = string_like(&value).unwrap_or_default(),
            "notes" => item.notes = string_like(&value).unwrap_or_default(),
            "cost" => item.cost = string_like(&value),
            "lat" => item.lat = value.as_f64(),
            "lng" => item.lng = value.as_f64(),
            // day/date/title belong to the surrounding day object.
            _ => {}
        }
    }

    any.then_some(item)
}

/// A captured scalar is either a quoted JSON string or a bare number; both
/// parse as standalone JSON values.
fn decode_scalar(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_DOCUMENT: &str = r#"{
        "title": "Tokyo long weekend",
        "days": [
            {
                "day": 1,
                "title": "7/21 Arrival",
                "schedules": [
                    { "id": "1-1", "name": "Senso-ji", "time": "10:00", "address": "2-3-1 Asakusa", "category": "Sights", "duration": "2h", "notes": "go early", "lat": 35.7148, "lng": 139.7967, "cost": "free" }
                ]
            },
            {
                "day": 2,
                "title": "7/22 Museums",
                "schedules": [
                    { "id": "2-1", "name": "National Museum", "time": "09:30", "lat": 35.7188, "lng": 139.7765 },
                    { "id": "2-2", "name": "Ueno Park", "time": "13:00" }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_direct_parse_loses_nothing() {
        let days = parse_generated_itinerary(FULL_DOCUMENT);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, 1);
        assert_eq!(days[0].title.as_deref(), Some("7/21 Arrival"));
        assert_eq!(days[0].schedules.len(), 1);

        let item = &days[0].schedules[0];
        assert_eq!(item.id, "1-1");
        assert_eq!(item.name, "Senso-ji");
        assert_eq!(item.time, "10:00");
        assert_eq!(item.address, "2-3-1 Asakusa");
        assert_eq!(item.category, "Sights");
        assert_eq!(item.duration, "2h");
        assert_eq!(item.notes, "go early");
        assert_eq!(item.lat, Some(35.7148));
        assert_eq!(item.lng, Some(139.7967));
        assert_eq!(item.cost.as_deref(), Some("free"));

        assert_eq!(days[1].schedules.len(), 2);
    }

    #[test]
    fn test_fenced_wrapper_is_stripped() {
        let wrapped = format!("Here is the plan:\n```json\n{}\n```\nEnjoy!", FULL_DOCUMENT);
        let days = parse_generated_itinerary(&wrapped);
        assert_eq!(days.len(), 2);
    }

    #[test]
    fn test_legacy_day_keyed_object() {
        let legacy = r#"{
            "day_2": { "title": "Second", "schedules": [ { "id": "b", "name": "Beach", "time": "11:00" } ] },
            "day_1": { "title": "First", "schedules": [] }
        }"#;
        let days = parse_generated_itinerary(legacy);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day, 1);
        assert_eq!(days[1].day, 2);
        assert_eq!(days[1].schedules[0].name, "Beach");
    }

    #[test]
    fn test_structural_repair_of_dangling_comma_and_closers() {
        // Cut right after a complete item plus comma.
        let cut = FULL_DOCUMENT.find("\"2-2\"").unwrap();
        let truncated = &FULL_DOCUMENT[..FULL_DOCUMENT[..cut].rfind('{').unwrap()];

        let days = parse_generated_itinerary(truncated);
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].schedules.len(), 1);
        assert_eq!(days[1].schedules[0].id, "2-1");
    }

    #[test]
    fn test_truncation_mid_string_keeps_partial_item() {
        // Cut inside the "address" value of the last item of the last day.
        let doc = r#"{
            "title": "Trip",
            "days": [
                { "day": 1, "title": "7/21", "schedules": [ { "id": "1-1", "name": "Harbor walk", "time": "10:00" } ] },
                { "day": 2, "title": "7/22", "schedules": [ { "id": "2-1", "name": "Old town", "time": "09:00", "address": "Piazza del"#;

        let days = parse_generated_itinerary(doc);
        assert_eq!(days.len(), 2);

        // Earlier day intact.
        assert_eq!(days[0].schedules.len(), 1);
        assert_eq!(days[0].schedules[0].name, "Harbor walk");

        // Partial item keeps the fields preceding the truncation point;
        // structural repair even salvages the cut-off string prefix.
        let partial = &days[1].schedules[0];
        assert_eq!(partial.id, "2-1");
        assert_eq!(partial.name, "Old town");
        assert_eq!(partial.time, "09:00");
        assert_eq!(partial.address, "Piazza del");
    }

    #[test]
    fn test_truncation_after_key_falls_through_to_field_extraction() {
        // Cut right after a key and colon: structural repair cannot produce
        // valid JSON here, so recovery goes per-day, then per-field.
        let doc = r#"{
            "title": "Trip",
            "days": [
                { "day": 1, "title": "7/21", "schedules": [ { "id": "1-1", "name": "Harbor walk", "time": "10:00" } ] },
                { "day": 2, "title": "7/22", "schedules": [ { "id": "2-1", "name": "Old town", "time": "09:00", "address":"#;

        let days = parse_generated_itinerary(doc);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].schedules[0].name, "Harbor walk");
        assert_eq!(days[1].title.as_deref(), Some("7/22"));

        let partial = &days[1].schedules[0];
        assert_eq!(partial.id, "2-1");
        assert_eq!(partial.name, "Old town");
        assert_eq!(partial.time, "09:00");
        assert!(partial.address.is_empty());
    }

    #[test]
    fn test_day_without_number_is_excluded() {
        let doc = r#"{ "days": [ { "title": "No number", "schedules": [] }, { "day": 1, "schedules": [] } ] }"#;
        let days = parse_generated_itinerary(doc);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].day, 1);
    }

    #[test]
    fn test_hopeless_input_yields_empty() {
        assert!(parse_generated_itinerary("").is_empty());
        assert!(parse_generated_itinerary("The weather is lovely in July.").is_empty());
        assert!(parse_generated_itinerary("{\"note\": \"no days here\"}").is_empty());
    }

    #[test]
    fn test_parser_is_deterministic() {
        let doc = &FULL_DOCUMENT[..FULL_DOCUMENT.len() - 40];
        let first = parse_generated_itinerary(doc);
        let second = parse_generated_itinerary(doc);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_repair_closes_string_comma_and_brackets() {
        let repaired = repair_truncated_json(r#"{ "days": [ { "day": 1, "title": "half"#);
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["days"][0]["day"], 1);
        assert_eq!(value["days"][0]["title"], "half");

        let repaired = repair_truncated_json(r#"{ "a": 1,"#);
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_the_scan() {
        let doc = r#"{ "days": [ { "day": 1, "title": "brace } in text", "schedules": [ { "id": "x", "name": "y { z" } ] }"#;
        let days = parse_generated_itinerary(doc);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].title.as_deref(), Some("brace } in text"));
        assert_eq!(days[0].schedules[0].name, "y { z");
    }
}
