use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name carrying a record's type tag.
pub const TYPE_FIELD: &str = "@type";
/// Type tag of party records.
pub const PARTY_TYPE: &str = "party";
/// Type tag of item records.
pub const ITEM_TYPE: &str = "item";
/// Well-known identity of the ordered item list.
pub const ITEM_LIST: &str = "items";

/// Opaque record identity, assigned by whichever replica created the record.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
	#[must_use]
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SubjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SubjectId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

impl From<String> for SubjectId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// A scalar field value.
///
/// Values are totally ordered (text before numbers, numbers by IEEE total
/// order) so that a conflict set has a deterministic representative on every
/// replica. `NaN` must not enter a store; numeric input is validated at the
/// control edge.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
	Text(String),
	Number(f64),
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
			_ => false,
		}
	}
}

impl Eq for Value {}

impl Ord for Value {
	fn cmp(&self, other: &Self) -> core::cmp::Ordering {
		use core::cmp::Ordering;
		match (self, other) {
			(Self::Text(a), Self::Text(b)) => a.cmp(b),
			(Self::Number(a), Self::Number(b)) => a.total_cmp(b),
			(Self::Text(_), Self::Number(_)) => Ordering::Less,
			(Self::Number(_), Self::Text(_)) => Ordering::Greater,
		}
	}
}

impl PartialOrd for Value {
	fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text(text) => f.write_str(text),
			Self::Number(number) => write!(f, "{}", number),
		}
	}
}

/// A record: an identity plus its asserted field values.
///
/// Each field holds a *set* of values. A single-element set is the ordinary
/// case; more than one element means concurrent replicas asserted different
/// values without retracting each other's, i.e. an unresolved conflict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
	pub id: SubjectId,
	pub fields: BTreeMap<String, Vec<Value>>,
}

impl Subject {
	#[must_use]
	pub fn new(id: SubjectId) -> Self {
		Self {
			id,
			fields: BTreeMap::new(),
		}
	}

	/// Asserts `value` for `field`. Values are kept sorted and deduplicated;
	/// re-asserting a present value is a no-op.
	pub fn insert(&mut self, field: impl Into<String>, value: Value) {
		let values = self.fields.entry(field.into()).or_insert_with(Vec::new);
		if let Err(at) = values.binary_search(&value) {
			values.insert(at, value);
		}
	}

	/// Retracts `value` from `field`. Returns whether the value was present.
	pub fn remove(&mut self, field: &str, value: &Value) -> bool {
		let Some(values) = self.fields.get_mut(field) else {
			return false;
		};
		let Ok(at) = values.binary_search(value) else {
			return false;
		};
		values.remove(at);
		if values.is_empty() {
			self.fields.remove(field);
		}
		true
	}

	/// Current values of `field`, in the deterministic order. Empty when unset.
	#[must_use]
	pub fn values(&self, field: &str) -> &[Value] {
		self.fields.get(field).map_or(&[], Vec::as_slice)
	}

	/// The record's type tag, if any.
	#[must_use]
	pub fn type_tag(&self) -> Option<&str> {
		self.values(TYPE_FIELD).iter().find_map(|value| match value {
			Value::Text(text) => Some(text.as_str()),
			Value::Number(_) => None,
		})
	}

	/// A record with no assertions left no longer exists.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	#[must_use]
	pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
		self.insert(field, value);
		self
	}
}
