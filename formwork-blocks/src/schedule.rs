//! Schedules: a block collection of fixed and weekly time windows.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Weekday};
use formwork_schema::{FieldOption, Schema, SchemaEntry, SchemaType, ValidationError};
use formwork_types::DataPath;
use indexmap::IndexMap;
use serde_json::{Value, json};

use crate::collection::BlockCollection;
use crate::error::{BlockError, BlockResult};
use crate::key::BlockKey;

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleKind {
    Fixed,
    Weekly,
}

impl ScheduleKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleKind::Fixed => "fixed",
            ScheduleKind::Weekly => "weekly",
        }
    }
}

/// A validated schedule entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// A single window between two points in time.
    Fixed {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// A daily window repeated on the given weekdays.
    Weekly {
        days: Vec<Weekday>,
        start: NaiveTime,
        end: NaiveTime,
    },
}

impl Schedule {
    /// Checks an entry's value. Paths in the returned errors are relative
    /// to the entry.
    #[must_use]
    pub fn validate(item: &Value) -> Vec<ValidationError> {
        match Self::parse(item) {
            Ok(_) => Vec::new(),
            Err(errors) => errors,
        }
    }

    /// Reads an entry's value.
    pub fn parse(item: &Value) -> Result<Schedule, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let schedule = match item.get("type").and_then(Value::as_str) {
            Some("fixed") => {
                let start = field(item, "start", parse_datetime, &mut errors);
                let end = field(item, "end", parse_datetime, &mut errors);
                start.zip(end).map(|(start, end)| Schedule::Fixed { start, end })
            }
            Some("weekly") => {
                let days = weekdays(item, &mut errors);
                let start = field(item, "start", parse_time, &mut errors);
                let end = field(item, "end", parse_time, &mut errors);
                match (days, start, end) {
                    (Some(days), Some(start), Some(end)) => Some(Schedule::Weekly { days, start, end }),
                    _ => None,
                }
            }
            other => {
                errors.push(ValidationError::invalid(
                    DataPath::parse("type"),
                    format!("unknown schedule type {:?}", other.unwrap_or_default()),
                ));
                None
            }
        };

        match schedule {
            Some(schedule) if errors.is_empty() => {
                if schedule.is_chronological() {
                    Ok(schedule)
                } else {
                    Err(vec![ValidationError::invalid(
                        DataPath::parse("end"),
                        "end must not be before start",
                    )])
                }
            }
            _ => Err(errors),
        }
    }

    fn is_chronological(&self) -> bool {
        match self {
            Schedule::Fixed { start, end } => start <= end,
            Schedule::Weekly { start, end, .. } => start <= end,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ScheduleKind {
        match self {
            Schedule::Fixed { .. } => ScheduleKind::Fixed,
            Schedule::Weekly { .. } => ScheduleKind::Weekly,
        }
    }
}

fn field<T>(
    item: &Value,
    name: &str,
    parse: fn(&str) -> Option<T>,
    errors: &mut Vec<ValidationError>,
) -> Option<T> {
    let path = DataPath::parse(name);
    match item.get(name).and_then(Value::as_str) {
        None | Some("") => {
            errors.push(ValidationError::required(path));
            None
        }
        Some(raw) => {
            let parsed = parse(raw);
            if parsed.is_none() {
                errors.push(ValidationError::invalid(path, format!("cannot read {raw:?}")));
            }
            parsed
        }
    }
}

fn weekdays(item: &Value, errors: &mut Vec<ValidationError>) -> Option<Vec<Weekday>> {
    let path = DataPath::parse("days");
    let raw = item.get("days").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
    if raw.is_empty() {
        errors.push(ValidationError::required(path));
        return None;
    }
    let days: Option<Vec<Weekday>> = raw
        .iter()
        .map(|day| day.as_str().and_then(|day| day.parse::<Weekday>().ok()))
        .collect();
    if days.is_none() {
        errors.push(ValidationError::invalid(path, "unknown weekday"));
    }
    days
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

/// The built-in type forms of a schedules field.
#[must_use]
pub fn schedule_types() -> IndexMap<String, SchemaType> {
    let choices = WEEKDAYS
        .iter()
        .map(|day| FieldOption::value(*day, json!(day)))
        .collect();
    let days = SchemaEntry::new("select")
        .label("Days")
        .required()
        .option(FieldOption::collection("values", choices));

    let fixed = Schema::new()
        .with("start", SchemaEntry::new("datetime").label("Start").required())
        .with("end", SchemaEntry::new("datetime").label("End").required());
    let weekly = Schema::new()
        .with("days", days)
        .with("start", SchemaEntry::new("time").label("Start").required())
        .with("end", SchemaEntry::new("time").label("End").required());

    let mut types = IndexMap::new();
    types.insert(
        ScheduleKind::Fixed.as_str().to_string(),
        SchemaType {
            title: "Fixed".to_string(),
            form: fixed,
        },
    );
    types.insert(
        ScheduleKind::Weekly.as_str().to_string(),
        SchemaType {
            title: "Weekly".to_string(),
            form: weekly,
        },
    );
    types
}

/// A schedules field: a [`BlockCollection`] restricted to the built-in
/// schedule types, whose apply also checks chronology and weekdays.
#[derive(Debug, Clone)]
pub struct Schedules {
    collection: BlockCollection,
    types: IndexMap<String, SchemaType>,
}

impl Schedules {
    pub fn from_value(value: &Value) -> BlockResult<Self> {
        Ok(Self {
            collection: BlockCollection::from_value(None, value)?,
            types: schedule_types(),
        })
    }

    #[must_use]
    pub fn types(&self) -> &IndexMap<String, SchemaType> {
        &self.types
    }

    #[must_use]
    pub fn collection(&self) -> &BlockCollection {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut BlockCollection {
        &mut self.collection
    }

    #[must_use]
    pub fn value(&self) -> Value {
        self.collection.value()
    }

    pub fn add(&mut self, kind: ScheduleKind) -> BlockResult<BlockKey> {
        self.collection.add(kind.as_str(), &self.types)
    }

    pub fn edit(&mut self, key: &BlockKey) -> BlockResult<()> {
        self.collection.edit(key)
    }

    pub fn update_draft(&mut self, key: &BlockKey, path: &str, value: Value) -> BlockResult<()> {
        self.collection.update_draft(key, path, value)
    }

    /// Applies a draft that passes both its form and [`Schedule::validate`].
    pub fn apply(&mut self, key: &BlockKey) -> BlockResult<BlockKey> {
        let types = &self.types;
        self.collection.apply(key, |draft| {
            let mut errors = Vec::new();
            if let Some(variant) = draft
                .get("type")
                .and_then(Value::as_str)
                .and_then(|type_key| types.get(type_key))
            {
                errors = variant.form.validate(draft);
            }
            if errors.is_empty() {
                errors = Schedule::validate(draft);
            }
            errors
        })
    }

    pub fn cancel(&mut self, key: &BlockKey) -> bool {
        self.collection.cancel(key)
    }

    pub fn remove(&mut self, key: &BlockKey) -> BlockResult<Value> {
        self.collection.remove(key)
    }

    pub fn sort(&mut self, old_index: usize, new_index: usize) -> BlockResult<()> {
        self.collection.sort(old_index, new_index)
    }

    /// The committed entries as typed schedules. Fails on the first entry
    /// that does not validate.
    pub fn schedules(&self) -> BlockResult<Vec<Schedule>> {
        self.collection
            .items()
            .map(|(_, item)| Schedule::parse(item).map_err(BlockError::Validation))
            .collect()
    }
}
