//! Criteria filter vocabulary shared by entity `exists` predicates and
//! remote searches

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Boolean operator joining the queries of a `multi` or `not` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    #[default]
    And,
    Or,
}

/// A single search filter as understood by the remote store
///
/// Written in documents as a tagged map, e.g.
///
/// ```yaml
/// exists:
///   - type: equals
///     field: technicalName
///     value: my_flow
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Filter {
    Equals {
        field: String,
        value: Value,
    },
    EqualsAny {
        field: String,
        value: Vec<Value>,
    },
    Contains {
        field: String,
        value: String,
    },
    Prefix {
        field: String,
        value: String,
    },
    Suffix {
        field: String,
        value: String,
    },
    Multi {
        #[serde(default)]
        operator: FilterOperator,
        queries: Vec<Filter>,
    },
    Not {
        #[serde(default)]
        operator: FilterOperator,
        queries: Vec<Filter>,
    },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn equals_any(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::EqualsAny {
            field: field.into(),
            value: values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tagged_filters() {
        let filters: Vec<Filter> = serde_yaml::from_str(
            r#"
- type: equals
  field: technicalName
  value: my_flow
- type: multi
  operator: or
  queries:
    - type: prefix
      field: name
      value: Sum
"#,
        )
        .unwrap();

        assert_eq!(filters[0], Filter::equals("technicalName", "my_flow"));
        assert_eq!(
            filters[1],
            Filter::Multi {
                operator: FilterOperator::Or,
                queries: vec![Filter::Prefix {
                    field: "name".to_string(),
                    value: "Sum".to_string(),
                }],
            }
        );
    }

    #[test]
    fn equals_null_is_kept_as_null() {
        let filter: Filter =
            serde_json::from_value(json!({"type": "equals", "field": "salesChannelId", "value": null}))
                .unwrap();
        assert_eq!(filter, Filter::equals("salesChannelId", Value::Null));
    }

    #[test]
    fn unknown_filter_type_is_rejected() {
        let result: Result<Filter, _> =
            serde_json::from_value(json!({"type": "fuzzy", "field": "name", "value": "x"}));
        assert!(result.is_err());
    }
}
