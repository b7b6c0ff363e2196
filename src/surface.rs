use crate::subject::SubjectId;
use std::collections::BTreeMap;
use tracing::trace;

/// Text of the notice raised when a field is observed as a conflict set.
pub const CONFLICT_NOTICE: &str = "someone else is editing this value";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
	Party,
	Item,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
	/// Soft condition; the session carries on.
	Warning,
	/// Something was refused or lost; state is as of the last success.
	Error,
}

/// A user-visible message. At most one notice is shown at a time; showing a
/// new one replaces the previous.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
	pub severity: Severity,
	pub text: String,
}

impl Notice {
	#[must_use]
	pub fn warning(text: impl Into<String>) -> Self {
		Self {
			severity: Severity::Warning,
			text: text.into(),
		}
	}

	#[must_use]
	pub fn error(text: impl Into<String>) -> Self {
		Self {
			severity: Severity::Error,
			text: text.into(),
		}
	}
}

/// What the session needs from a rendering layer.
///
/// Row handles are created here but owned by the session's projector and
/// party table; the surface touches a row only when handed it back. A real
/// widget toolkit implements this by wrapping its native row/input objects;
/// [`HeadlessSurface`] implements it with plain data for tests and embedders
/// that bring their own presentation.
pub trait Surface {
	type Row;

	/// A new, empty placeholder row for the given record.
	fn create_row(&mut self, id: &SubjectId, kind: RowKind) -> Self::Row;

	/// Writes one field's display text into the row's control.
	fn set_field(&mut self, row: &mut Self::Row, field: &str, text: &str);

	/// Destroys a row that left the authoritative state.
	fn remove_row(&mut self, row: Self::Row);

	fn set_title(&mut self, title: &str);

	/// Input is disabled until the initial state is on screen.
	fn set_ready(&mut self, ready: bool);

	fn show_notice(&mut self, notice: &Notice);

	fn clear_notice(&mut self);
}

/// A [`Surface`] with no rendering at all: rows are plain structs recording
/// what would be on screen.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
	next_serial: u64,
	pub title: String,
	pub ready: bool,
	pub notice: Option<Notice>,
}

/// The headless stand-in for one on-screen row. `serial` is monotone per
/// surface and never reused, so tests can tell a surviving row from a
/// recreated one.
#[derive(Debug)]
pub struct HeadlessRow {
	pub id: SubjectId,
	pub kind: RowKind,
	pub serial: u64,
	pub fields: BTreeMap<String, String>,
}

impl HeadlessSurface {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

impl Surface for HeadlessSurface {
	type Row = HeadlessRow;

	fn create_row(&mut self, id: &SubjectId, kind: RowKind) -> Self::Row {
		self.next_serial += 1;
		trace!(%id, ?kind, serial = self.next_serial, "row created");
		HeadlessRow {
			id: id.clone(),
			kind,
			serial: self.next_serial,
			fields: BTreeMap::new(),
		}
	}

	fn set_field(&mut self, row: &mut Self::Row, field: &str, text: &str) {
		row.fields.insert(field.to_owned(), text.to_owned());
	}

	fn remove_row(&mut self, row: Self::Row) {
		trace!(id = %row.id, serial = row.serial, "row removed");
		drop(row);
	}

	fn set_title(&mut self, title: &str) {
		self.title = title.to_owned();
	}

	fn set_ready(&mut self, ready: bool) {
		self.ready = ready;
	}

	fn show_notice(&mut self, notice: &Notice) {
		self.notice = Some(notice.clone());
	}

	fn clear_notice(&mut self) {
		self.notice = None;
	}
}
