//! In-process remote store
//!
//! Evaluates the criteria vocabulary against records held in memory and
//! records every call, which makes it the store of choice for dry runs and
//! tests. Single-threaded by construction.

use super::{Criteria, Record, RemoteConfigStore, RemoteError};
use serde_json::Value;
use shop_config::{Filter, FilterOperator, new_uuid};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// A call made against a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Search { entity: String },
    Create { entity: String, id: String },
    Update { entity: String, id: String },
    Delete { entity: String, id: String },
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Search { .. })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<BTreeMap<String, Vec<Record>>>,
    calls: RefCell<Vec<StoreCall>>,
    failures: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without logging a call; returns its id
    ///
    /// A record without an `id` field gets a generated one.
    pub fn insert(&self, entity: &str, mut record: Record) -> String {
        let id = match record.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = new_uuid();
                record.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };
        self.records
            .borrow_mut()
            .entry(entity.to_string())
            .or_default()
            .push(record);
        id
    }

    /// Snapshot of all records of `entity`
    pub fn records(&self, entity: &str) -> Vec<Record> {
        self.records
            .borrow()
            .get(entity)
            .cloned()
            .unwrap_or_default()
    }

    /// Find a record by id
    pub fn get(&self, entity: &str, id: &str) -> Option<Record> {
        self.records
            .borrow()
            .get(entity)?
            .iter()
            .find(|r| record_id(r) == Some(id))
            .cloned()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    /// Number of create/update/delete calls made so far
    pub fn write_count(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.is_write()).count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Make every subsequent call for `entity` fail with `message`
    pub fn fail_on(&self, entity: &str, message: &str) {
        self.failures
            .borrow_mut()
            .insert(entity.to_string(), message.to_string());
    }

    fn check_failure(&self, entity: &str) -> Result<(), RemoteError> {
        match self.failures.borrow().get(entity) {
            Some(message) => Err(RemoteError::request(entity, message.clone())),
            None => Ok(()),
        }
    }

    fn log(&self, call: StoreCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl RemoteConfigStore for MemoryStore {
    fn search(&self, entity: &str, criteria: &Criteria) -> Result<Vec<Record>, RemoteError> {
        self.log(StoreCall::Search {
            entity: entity.to_string(),
        });
        self.check_failure(entity)?;

        let records = self.records.borrow();
        let matching = records
            .get(entity)
            .map(|all| {
                all.iter()
                    .filter(|r| criteria.filters.iter().all(|f| matches_filter(f, r)))
                    .take(criteria.limit.unwrap_or(usize::MAX))
                    .map(|r| project(r, &criteria.includes))
                    .collect()
            })
            .unwrap_or_default();

        Ok(matching)
    }

    fn create(&self, entity: &str, payload: &Record) -> Result<(), RemoteError> {
        let mut record = payload.clone();
        let id = match record_id(&record) {
            Some(id) => id.to_string(),
            None => {
                let id = new_uuid();
                record.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };
        self.log(StoreCall::Create {
            entity: entity.to_string(),
            id: id.clone(),
        });
        self.check_failure(entity)?;

        let mut records = self.records.borrow_mut();
        let list = records.entry(entity.to_string()).or_default();
        if list.iter().any(|r| record_id(r) == Some(id.as_str())) {
            return Err(RemoteError::Conflict {
                entity: entity.to_string(),
                id,
            });
        }
        list.push(record);
        Ok(())
    }

    fn update(&self, entity: &str, id: &str, payload: &Record) -> Result<(), RemoteError> {
        self.log(StoreCall::Update {
            entity: entity.to_string(),
            id: id.to_string(),
        });
        self.check_failure(entity)?;

        let mut records = self.records.borrow_mut();
        let record = records
            .get_mut(entity)
            .and_then(|list| list.iter_mut().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| RemoteError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            })?;

        for (key, value) in payload.iter().filter(|(key, _)| key.as_str() != "id") {
            record.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn delete(&self, entity: &str, id: &str) -> Result<(), RemoteError> {
        self.log(StoreCall::Delete {
            entity: entity.to_string(),
            id: id.to_string(),
        });
        self.check_failure(entity)?;

        let mut records = self.records.borrow_mut();
        let list = records.get_mut(entity);
        let position = list
            .as_ref()
            .and_then(|l| l.iter().position(|r| record_id(r) == Some(id)));

        match (list, position) {
            (Some(list), Some(index)) => {
                list.remove(index);
                Ok(())
            }
            _ => Err(RemoteError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn project(record: &Record, includes: &[String]) -> Record {
    if includes.is_empty() {
        return record.clone();
    }
    record
        .iter()
        .filter(|(key, _)| key.as_str() == "id" || includes.iter().any(|i| i == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Evaluate a filter against a record; a missing field reads as null
pub fn matches_filter(filter: &Filter, record: &Record) -> bool {
    match filter {
        Filter::Equals { field, value } => field_value(record, field) == value,
        Filter::EqualsAny { field, value } => {
            let actual = field_value(record, field);
            value.iter().any(|v| v == actual)
        }
        Filter::Contains { field, value } => {
            text_field(record, field).is_some_and(|s| s.contains(value.as_str()))
        }
        Filter::Prefix { field, value } => {
            text_field(record, field).is_some_and(|s| s.starts_with(value.as_str()))
        }
        Filter::Suffix { field, value } => {
            text_field(record, field).is_some_and(|s| s.ends_with(value.as_str()))
        }
        Filter::Multi { operator, queries } => combine(*operator, queries, record),
        Filter::Not { operator, queries } => !combine(*operator, queries, record),
    }
}

fn combine(operator: FilterOperator, queries: &[Filter], record: &Record) -> bool {
    match operator {
        FilterOperator::And => queries.iter().all(|q| matches_filter(q, record)),
        FilterOperator::Or => queries.iter().any(|q| matches_filter(q, record)),
    }
}

fn text_field<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    field_value(record, field).as_str()
}

/// Get a value from a record using a dot-separated path
fn field_value<'a>(record: &'a Record, path: &str) -> &'a Value {
    const NULL: &Value = &Value::Null;

    let mut parts = path.split('.');
    let Some(first) = parts.next() else {
        return NULL;
    };
    let mut current = match record.get(first) {
        Some(value) => value,
        None => return NULL,
    };

    for part in parts {
        let next = match current {
            Value::Object(map) => map.get(part),
            Value::Array(arr) => part.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return NULL,
        }
    }

    current
}
