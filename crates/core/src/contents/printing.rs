use tether_protocol::{PdfSettings, PrintOptions};
use tether_runtime::{Error, Result};
use tokio::sync::oneshot;

use super::WebContents;

impl WebContents {
	/// Starts a print job. Returns false if the engine refused it.
	pub fn print(&self, options: PrintOptions) -> Result<bool> {
		Ok(self.native()?.print(&options))
	}

	/// Renders the current page to a PDF document.
	///
	/// # Errors
	///
	/// `Unsupported` without a PDF backend, `PrintFailed` when rendering fails.
	pub async fn print_to_pdf(&self, settings: PdfSettings) -> Result<Vec<u8>> {
		let renderer = self
			.native()?
			.pdf_renderer()
			.ok_or_else(|| Error::Unsupported("print to pdf".into()))?;

		let (tx, rx) = oneshot::channel();
		renderer.print_to_pdf(
			&settings,
			Box::new(move |result| {
				let _ = tx.send(result);
			}),
		);

		match rx.await {
			Ok(Ok(document)) => {
				tracing::debug!(id = %self.id(), bytes = document.len(), "pdf rendered");
				Ok(document)
			}
			Ok(Err(reason)) => Err(Error::PrintFailed(reason)),
			Err(_) => Err(Error::ChannelClosed),
		}
	}
}
