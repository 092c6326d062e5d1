use serde::Deserialize;
use serde_json::Value;

const ACTION_OPEN: &str = "[ACTION]";
const ACTION_CLOSE: &str = "[/ACTION]";
const BOOKING_OPEN: &str = "[BOOKING_DETAILS]";
const BOOKING_CLOSE: &str = "[/BOOKING_DETAILS]";

/// A model reply split into the text shown to the user and the machine
/// directives it carried.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub display_text: String,
    pub action: Option<Value>,
    pub booking_details: Option<Value>,
}

/// Typed view of a BOOKING_DETAILS payload. `total_price` is the model's own
/// quote; pricing stays server-side.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingDirective {
    pub attraction_name: String,
    pub date: String,
    pub time_slot: String,
    pub number_of_tickets: u32,
    #[serde(default)]
    pub total_price: Option<f64>,
}

impl BookingDirective {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Splits a raw model reply. Tags are case-sensitive; the first occurrence of
/// each tag type supplies the directive and every complete span is removed
/// from the display text. This never fails: worst case the reply passes
/// through untouched with no directives.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let (text, action) = extract_tag(raw, ACTION_OPEN, ACTION_CLOSE);
    let (text, booking_details) = extract_tag(&text, BOOKING_OPEN, BOOKING_CLOSE);

    ParsedReply {
        display_text: text.trim().to_string(),
        action,
        booking_details,
    }
}

/// Removes every complete `open`..`close` span, returning the remaining text
/// and the first span's payload when it parses as JSON. A span whose payload
/// does not parse is still removed; an opening tag with no closing tag fails
/// open and stays in the text, tag and all.
fn extract_tag(text: &str, open: &str, close: &str) -> (String, Option<Value>) {
    let mut remaining = String::with_capacity(text.len());
    let mut rest = text;
    let mut first_payload: Option<Value> = None;
    let mut first_seen = false;

    while let Some(start) = rest.find(open) {
        let after_open = &rest[start + open.len()..];
        let span = match payload_span(after_open, close) {
            Some(span) => span,
            None => break,
        };

        remaining.push_str(&rest[..start]);
        if !first_seen {
            first_seen = true;
            first_payload = serde_json::from_str(span.payload.trim()).ok();
        }
        rest = &after_open[span.end..];
    }

    remaining.push_str(rest);
    (remaining, first_payload)
}

struct Span<'a> {
    payload: &'a str,
    /// Byte offset just past the closing tag, relative to the text after the
    /// opening tag.
    end: usize,
}

/// Locates the payload between an already-consumed opening tag and its
/// closing tag. A balanced JSON-object walk runs first so nested objects,
/// newlines, or a bracket sequence inside a string cannot truncate the
/// payload; when the walk does not apply, the first literal closing tag wins.
fn payload_span<'a>(after_open: &'a str, close: &str) -> Option<Span<'a>> {
    if let Some(object_end) = balanced_object_end(after_open) {
        let tail = &after_open[object_end..];
        let ws = tail.len() - tail.trim_start().len();
        if tail[ws..].starts_with(close) {
            return Some(Span {
                payload: &after_open[..object_end],
                end: object_end + ws + close.len(),
            });
        }
    }

    let close_at = after_open.find(close)?;
    Some(Span {
        payload: &after_open[..close_at],
        end: close_at + close.len(),
    })
}

/// Byte offset just past the first balanced JSON object in `s` (leading
/// whitespace allowed), or None when `s` does not start with one. The walk is
/// string- and escape-aware.
fn balanced_object_end(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'{' {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_passes_through() {
        let parsed = parse_reply("Hello! How can I help you today?");
        assert_eq!(parsed.display_text, "Hello! How can I help you today?");
        assert!(parsed.action.is_none());
        assert!(parsed.booking_details.is_none());
    }

    #[test]
    fn extracts_an_action_and_strips_its_span() {
        let parsed = parse_reply(r#"Sure! [ACTION]{"action": "show_parks"}[/ACTION]"#);
        assert_eq!(parsed.display_text, "Sure!");
        assert_eq!(parsed.action, Some(json!({ "action": "show_parks" })));
        assert!(parsed.booking_details.is_none());
    }

    #[test]
    fn extracts_both_tag_types_from_one_reply() {
        let raw = concat!(
            "Booking you in now.\n",
            r#"[ACTION]{"action": "start_booking", "parkId": "p1"}[/ACTION]"#,
            "\n",
            r#"[BOOKING_DETAILS]{"attraction_name": "Wonderla Chennai", "date": "2025-07-15", "time_slot": "10:00 AM", "number_of_tickets": 3, "total_price": 3000}[/BOOKING_DETAILS]"#,
        );
        let parsed = parse_reply(raw);
        assert_eq!(parsed.display_text, "Booking you in now.");
        assert_eq!(parsed.action.as_ref().unwrap()["parkId"], "p1");
        let directive = BookingDirective::from_value(parsed.booking_details.as_ref().unwrap()).unwrap();
        assert_eq!(directive.attraction_name, "Wonderla Chennai");
        assert_eq!(directive.number_of_tickets, 3);
        assert_eq!(directive.total_price, Some(3000.0));
    }

    #[test]
    fn survives_nested_objects_and_multiline_json() {
        let raw = "Done.\n[ACTION]{\n  \"action\": \"show_time_slots\",\n  \"filters\": {\"parkId\": \"p2\", \"date\": \"2025-07-15\"}\n}[/ACTION]";
        let parsed = parse_reply(raw);
        assert_eq!(parsed.display_text, "Done.");
        assert_eq!(parsed.action.as_ref().unwrap()["filters"]["parkId"], "p2");
    }

    #[test]
    fn survives_a_closing_tag_sequence_inside_a_string() {
        let raw = r#"Odd one. [ACTION]{"action": "note", "text": "beware [/ACTION] inside"}[/ACTION]"#;
        let parsed = parse_reply(raw);
        assert_eq!(parsed.display_text, "Odd one.");
        assert_eq!(parsed.action.as_ref().unwrap()["text"], "beware [/ACTION] inside");
    }

    #[test]
    fn malformed_json_drops_the_directive_but_strips_the_span() {
        let parsed = parse_reply(r#"Here. [ACTION]{"action": show_parks}[/ACTION] Next."#);
        assert_eq!(parsed.display_text, "Here.  Next.");
        assert!(parsed.action.is_none());
    }

    #[test]
    fn unterminated_tag_fails_open() {
        let raw = r#"Half done [ACTION]{"action": "show_parks"}"#;
        let parsed = parse_reply(raw);
        assert_eq!(parsed.display_text, raw);
        assert!(parsed.action.is_none());
    }

    #[test]
    fn only_the_first_occurrence_is_honored_but_all_spans_are_stripped() {
        let raw = concat!(
            r#"[ACTION]{"action": "show_parks"}[/ACTION]"#,
            " and ",
            r#"[ACTION]{"action": "start_booking"}[/ACTION]"#,
        );
        let parsed = parse_reply(raw);
        assert_eq!(parsed.display_text, "and");
        assert_eq!(parsed.action, Some(json!({ "action": "show_parks" })));
    }

    #[test]
    fn first_span_rules_even_when_its_payload_is_broken() {
        let raw = concat!(
            r#"[ACTION]{broken}[/ACTION]"#,
            " mid ",
            r#"[ACTION]{"action": "show_parks"}[/ACTION]"#,
        );
        let parsed = parse_reply(raw);
        assert_eq!(parsed.display_text, "mid");
        assert!(parsed.action.is_none());
    }

    #[test]
    fn tags_are_case_sensitive() {
        let raw = r#"Hi [action]{"action": "show_parks"}[/action]"#;
        let parsed = parse_reply(raw);
        assert_eq!(parsed.display_text, raw);
        assert!(parsed.action.is_none());
    }

    #[test]
    fn directive_schema_rejects_wrong_shapes() {
        assert!(BookingDirective::from_value(&json!({ "attraction_name": "X" })).is_none());
        assert!(BookingDirective::from_value(&json!({
            "attraction_name": "X",
            "date": "2025-07-15",
            "time_slot": "10:00 AM",
            "number_of_tickets": -2,
        }))
        .is_none());
        let ok = BookingDirective::from_value(&json!({
            "attraction_name": "X",
            "date": "2025-07-15",
            "time_slot": "10:00 AM",
            "number_of_tickets": 2,
        }))
        .unwrap();
        assert_eq!(ok.number_of_tickets, 2);
        assert_eq!(ok.total_price, None);
    }
}
