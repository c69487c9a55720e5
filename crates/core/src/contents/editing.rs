//! Editing commands applied to the focused frame.

use tether_protocol::EditCommand;
use tether_runtime::Result;

use super::WebContents;

impl WebContents {
	/// Applies `command` to the focused frame.
	pub fn edit(&self, command: EditCommand) -> Result<()> {
		let native = self.native()?;
		tracing::trace!(id = %self.id(), command = command.name(), "edit");
		native.edit(command);
		Ok(())
	}

	pub fn undo(&self) -> Result<()> {
		self.edit(EditCommand::Undo)
	}

	pub fn redo(&self) -> Result<()> {
		self.edit(EditCommand::Redo)
	}

	pub fn cut(&self) -> Result<()> {
		self.edit(EditCommand::Cut)
	}

	pub fn copy(&self) -> Result<()> {
		self.edit(EditCommand::Copy)
	}

	pub fn paste(&self) -> Result<()> {
		self.edit(EditCommand::Paste)
	}

	pub fn paste_and_match_style(&self) -> Result<()> {
		self.edit(EditCommand::PasteAndMatchStyle)
	}

	pub fn delete(&self) -> Result<()> {
		self.edit(EditCommand::Delete)
	}

	pub fn select_all(&self) -> Result<()> {
		self.edit(EditCommand::SelectAll)
	}

	pub fn unselect(&self) -> Result<()> {
		self.edit(EditCommand::Unselect)
	}

	/// Replaces the selection with `text`.
	pub fn replace(&self, text: impl Into<String>) -> Result<()> {
		self.edit(EditCommand::Replace(text.into()))
	}

	/// Replaces the misspelled word under the caret with `text`.
	pub fn replace_misspelling(&self, text: impl Into<String>) -> Result<()> {
		self.edit(EditCommand::ReplaceMisspelling(text.into()))
	}
}
