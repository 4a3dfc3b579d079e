//! Client-side gate for the join submission.

use crate::join::models::FieldSchema;
use std::collections::HashMap;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// True iff `code` is non-blank, every schema field has a non-blank value in
/// `values`, and `identifier` is non-blank.
///
/// Pure; recompute it after every edit and use it to disable submission.
pub fn can_submit(
    schema: &FieldSchema,
    values: &HashMap<String, String>,
    identifier: &str,
    code: &str,
) -> bool {
    !is_blank(code)
        && !is_blank(identifier)
        && schema
            .fields
            .iter()
            .all(|field| values.get(field).is_some_and(|value| !is_blank(value)))
}

/// Names of the inputs still blank, in schema order, identifier last.
pub fn missing_inputs(
    schema: &FieldSchema,
    values: &HashMap<String, String>,
    identifier: &str,
) -> Vec<String> {
    let mut missing: Vec<String> = schema
        .fields
        .iter()
        .filter(|field| values.get(*field).is_none_or(|value| is_blank(value)))
        .cloned()
        .collect();
    if is_blank(identifier) {
        missing.push(schema.identifier_label().to_string());
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::seq::SliceRandom;

    fn schema(fields: &[&str], identifier: &str) -> FieldSchema {
        FieldSchema {
            name: None,
            description: None,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            identifier: identifier.to_string(),
        }
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_scenario_all_filled() {
        let s = schema(&["name", "department"], "email");
        let v = values(&[("name", "Jane"), ("department", "Eng")]);
        assert!(can_submit(&s, &v, "jane@x.com", "ABC123"));
        assert!(missing_inputs(&s, &v, "jane@x.com").is_empty());
    }

    #[test]
    fn test_whitespace_counts_as_empty() {
        let s = schema(&["name"], "email");
        assert!(!can_submit(&s, &values(&[("name", "   ")]), "a@b.c", "C"));
        assert!(!can_submit(&s, &values(&[("name", "Jane")]), " \t", "C"));
        assert!(!can_submit(&s, &values(&[("name", "Jane")]), "a@b.c", "  "));
        assert_eq!(
            missing_inputs(&s, &values(&[("name", " ")]), ""),
            vec!["name".to_string(), "email".to_string()]
        );
    }

    #[test]
    fn test_empty_schema_needs_only_identifier() {
        let s = schema(&[], "phone");
        assert!(can_submit(&s, &HashMap::new(), "0800", "XYZ"));
        assert!(!can_submit(&s, &HashMap::new(), "", "XYZ"));
    }

    #[test]
    fn test_missing_key_is_empty() {
        let s = schema(&["name", "team"], "email");
        assert!(!can_submit(&s, &values(&[("name", "Jane")]), "j@x.com", "C"));
        // keys outside the schema do not help
        assert!(!can_submit(
            &s,
            &values(&[("name", "Jane"), ("other", "x")]),
            "j@x.com",
            "C"
        ));
    }

    #[test]
    fn test_can_submit_matches_definition_on_random_inputs() {
        const NAMES: &[&str] = &["name", "department", "matric", "phone", "team", "level"];
        const SAMPLES: &[&str] = &["", " ", "\t", "x", " Jane ", "Eng", "\n"];
        let mut rng = rand::thread_rng();

        for _ in 0..2_000 {
            let mut names = NAMES.to_vec();
            names.shuffle(&mut rng);
            let field_count = rng.gen_range(0..=names.len());
            let fields = &names[..field_count];
            let s = schema(fields, "email");

            let mut v = HashMap::new();
            for name in NAMES {
                if rng.gen_bool(0.8) {
                    let sample = SAMPLES.choose(&mut rng).unwrap();
                    v.insert(name.to_string(), sample.to_string());
                }
            }
            let identifier = *SAMPLES.choose(&mut rng).unwrap();
            let code = *SAMPLES.choose(&mut rng).unwrap();

            let expected = !code.trim().is_empty()
                && fields
                    .iter()
                    .all(|f| v.get(*f).map(|x| !x.trim().is_empty()).unwrap_or(false))
                && !identifier.trim().is_empty();

            assert_eq!(
                can_submit(&s, &v, identifier, code),
                expected,
                "schema={fields:?} values={v:?} identifier={identifier:?} code={code:?}"
            );
            assert_eq!(
                missing_inputs(&s, &v, identifier).is_empty() && !code.trim().is_empty(),
                expected
            );
        }
    }
}
