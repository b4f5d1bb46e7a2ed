//! Add-sets directive embedded in a coach reply
//!
//! The model answers in plain text and may include one fenced block
//! tagged `add-sets` holding a JSON array of set records such as
//! `[{"exerciseId": 3, "kg": 80, "reps": 8}, ...]` - one record per set
//! to log, so repeats of the same exercise appear as repeated records.
//!
//! The block is always stripped from the text shown to the user. A
//! malformed payload yields no records; individual records missing a
//! usable `exerciseId` or `reps` are dropped, the rest survive.

use serde_json::Value;

const FENCE_TAG: &str = "```add-sets";
const FENCE: &str = "```";

/// One set the model asked to log
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSet {
    pub exercise_id: i64,
    pub kg: f64,
    pub reps: i64,
}

/// Reply with the directive split out
#[derive(Debug, Clone)]
pub struct ExtractedPlan {
    /// Reply text with the fenced block removed
    pub text: String,
    /// Parsed records, empty when no block was found or it was malformed
    pub sets: Vec<PlannedSet>,
}

/// Split a model reply into user-facing text and the planned sets.
pub fn extract(reply: &str) -> ExtractedPlan {
    let Some(start) = reply.find(FENCE_TAG) else {
        return ExtractedPlan {
            text: reply.trim().to_string(),
            sets: Vec::new(),
        };
    };

    let rest = &reply[start + FENCE_TAG.len()..];
    let (payload, after) = match rest.find(FENCE) {
        Some(end) => (&rest[..end], &rest[end + FENCE.len()..]),
        // Unterminated block: treat everything after the tag as payload
        None => (rest, ""),
    };

    let mut text = reply[..start].trim_end().to_string();
    let after = after.trim_start();
    if !after.is_empty() {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(after);
    }

    ExtractedPlan {
        text: text.trim().to_string(),
        sets: parse_records(payload),
    }
}

fn parse_records(payload: &str) -> Vec<PlannedSet> {
    let Ok(Value::Array(items)) = serde_json::from_str(payload.trim()) else {
        return Vec::new();
    };
    items.iter().filter_map(record_to_set).collect()
}

fn record_to_set(item: &Value) -> Option<PlannedSet> {
    let record = item.as_object()?;
    let exercise_id = record.get("exerciseId")?.as_i64()?;
    let reps = record.get("reps")?.as_i64()?;
    if exercise_id < 1 || reps < 1 {
        return None;
    }
    let kg = match record.get("kg") {
        Some(value) => value.as_f64()?,
        None => 0.0,
    };
    if kg < 0.0 {
        return None;
    }
    Some(PlannedSet {
        exercise_id,
        kg,
        reps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_reply_passes_through() {
        let plan = extract("Nice session! Rest well.");
        assert_eq!(plan.text, "Nice session! Rest well.");
        assert!(plan.sets.is_empty());
    }

    #[test]
    fn test_three_record_block_parses_in_order() {
        let reply = "Logging your plan now.\n\
            ```add-sets\n\
            [{\"exerciseId\": 3, \"kg\": 80, \"reps\": 8},\n\
             {\"exerciseId\": 3, \"kg\": 80, \"reps\": 8},\n\
             {\"exerciseId\": 5, \"kg\": 60, \"reps\": 12}]\n\
            ```\n\
            Tell me how it felt.";
        let plan = extract(reply);

        assert_eq!(plan.sets.len(), 3);
        assert_eq!(
            plan.sets[0],
            PlannedSet {
                exercise_id: 3,
                kg: 80.0,
                reps: 8
            }
        );
        assert_eq!(plan.sets[2].exercise_id, 5);
        assert_eq!(plan.text, "Logging your plan now.\n\nTell me how it felt.");
    }

    #[test]
    fn test_malformed_block_is_stripped_but_swallowed() {
        let reply = "Here you go.\n```add-sets\n[{\"exerciseId\": oops]\n```";
        let plan = extract(reply);
        assert!(plan.sets.is_empty());
        assert_eq!(plan.text, "Here you go.");
    }

    #[test]
    fn test_invalid_records_are_dropped_individually() {
        let reply = "```add-sets\n\
            [{\"exerciseId\": 2, \"kg\": 50, \"reps\": 10},\n\
             {\"kg\": 50, \"reps\": 10},\n\
             {\"exerciseId\": 2, \"kg\": 50},\n\
             {\"exerciseId\": 2, \"kg\": -5, \"reps\": 10},\n\
             {\"exerciseId\": 0, \"kg\": 50, \"reps\": 10}]\n\
            ```";
        let plan = extract(reply);
        assert_eq!(plan.sets.len(), 1);
        assert_eq!(plan.sets[0].exercise_id, 2);
        assert_eq!(plan.text, "");
    }

    #[test]
    fn test_missing_kg_defaults_to_bodyweight() {
        let plan = extract("```add-sets\n[{\"exerciseId\": 4, \"reps\": 15}]\n```");
        assert_eq!(plan.sets.len(), 1);
        assert_eq!(plan.sets[0].kg, 0.0);
    }

    #[test]
    fn test_unterminated_block_is_stripped() {
        let plan = extract("Plan incoming.\n```add-sets\n[{\"exerciseId\": 1,");
        assert!(plan.sets.is_empty());
        assert_eq!(plan.text, "Plan incoming.");
    }
}
