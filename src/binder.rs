use crate::store::{Assert, Retract, Store, StoreError, Transaction};
use crate::subject::{Subject, SubjectId, Value};
use crate::surface::Surface;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
	Text,
	/// The control's raw text is interpreted as a number before being
	/// written.
	Number,
}

/// Declares how one named field binds to its input control.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
	pub name: &'static str,
	pub kind: FieldKind,
}

impl FieldSpec {
	#[must_use]
	pub const fn text(name: &'static str) -> Self {
		Self {
			name,
			kind: FieldKind::Text,
		}
	}

	#[must_use]
	pub const fn number(name: &'static str) -> Self {
		Self {
			name,
			kind: FieldKind::Number,
		}
	}

	/// Interprets raw control text per the declared kind.
	///
	/// # Errors
	///
	/// [`StoreError::NotANumber`] when a numeric field's text is not a finite
	/// number; nothing is ever written in that case.
	pub fn parse(&self, raw: &str) -> Result<Value, StoreError> {
		match self.kind {
			FieldKind::Text => Ok(Value::Text(raw.to_owned())),
			FieldKind::Number => raw
				.trim()
				.parse::<f64>()
				.ok()
				.filter(|number| number.is_finite())
				.map(Value::Number)
				.ok_or_else(|| StoreError::NotANumber(raw.to_owned())),
		}
	}
}

/// The bound fields of a party record.
pub const PARTY_FIELDS: &[FieldSpec] = &[FieldSpec::text("name")];

/// The bound fields of an item record.
pub const ITEM_FIELDS: &[FieldSpec] = &[
	FieldSpec::text("product"),
	FieldSpec::number("quantity"),
	FieldSpec::number("stock"),
	FieldSpec::number("price"),
];

/// Render direction: writes each bound field of `subject` into `row`.
///
/// A field holding a conflict set renders its least value (deterministic on
/// every replica) and the return value tells the caller to raise the
/// conflict notice. An unset field renders as empty text.
pub fn render<S: Surface>(surface: &mut S, row: &mut S::Row, subject: &Subject, specs: &[FieldSpec]) -> bool {
	let mut conflicted = false;
	for spec in specs {
		let values = subject.values(spec.name);
		if values.len() > 1 {
			trace!(id = %subject.id, field = spec.name, values = values.len(), "conflict set observed");
			conflicted = true;
		}
		let text = values.first().map(ToString::to_string).unwrap_or_default();
		surface.set_field(row, spec.name, &text);
	}
	conflicted
}

/// Write direction: one edit of one control becomes one transaction.
///
/// The field's current values are re-read from the store at commit time; a
/// remote edit may have landed since the last render, and building the
/// delete-set from a rendered value would silently lose it. Every value
/// currently observed is retracted (which also settles a conflict set in the
/// editor's favour); with none, the transaction is a pure insert.
///
/// # Errors
///
/// Parse failures and write rejections; state is untouched on either.
pub fn commit_edit<St: Store>(
	store: &mut St,
	id: &SubjectId,
	spec: &FieldSpec,
	raw: &str,
) -> Result<(), StoreError> {
	let value = spec.parse(raw)?;
	let mut tx = Transaction::default();
	for prior in store.field_values(id, spec.name) {
		tx = tx.retract(Retract::Field {
			subject: id.clone(),
			field: spec.name.to_owned(),
			value: prior,
		});
	}
	tx = tx.assert(Assert::Field {
		subject: id.clone(),
		field: spec.name.to_owned(),
		value,
	});
	store.write(tx)
}
