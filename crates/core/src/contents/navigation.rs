use tether_protocol::LoadUrlOptions;
use tether_runtime::{Error, LoadFailure, NavigationState, Result};
use url::Url;

use super::WebContents;

impl WebContents {
	/// Starts navigating the main frame to `url`.
	///
	/// Reloading a crashed instance this way restarts its content process.
	///
	/// # Errors
	///
	/// `InstanceDestroyed` for dead instances, `InvalidArgument` for
	/// unparseable URLs.
	pub fn load_url(&self, url: &str, options: LoadUrlOptions) -> Result<()> {
		let instance = self.instance()?;
		let parsed = Url::parse(url).map_err(|e| Error::InvalidArgument(format!("invalid url {url:?}: {e}")))?;

		if let Some(user_agent) = options.user_agent.as_deref() {
			instance.native().set_user_agent(user_agent);
		}
		if instance.navigation().lock().arm_reload() {
			tracing::debug!(id = %self.id(), "loading into crashed instance");
		}
		tracing::debug!(id = %self.id(), %parsed, "load url");
		instance.native().load_url(&parsed, &options);
		Ok(())
	}

	pub fn stop(&self) -> Result<()> {
		self.native()?.stop();
		Ok(())
	}

	pub fn reload(&self) -> Result<()> {
		self.reload_with(false)
	}

	pub fn reload_ignoring_cache(&self) -> Result<()> {
		self.reload_with(true)
	}

	fn reload_with(&self, ignore_cache: bool) -> Result<()> {
		let instance = self.instance()?;
		instance.navigation().lock().arm_reload();
		instance.native().reload(ignore_cache);
		Ok(())
	}

	pub fn go_back(&self) -> Result<()> {
		self.native()?.go_back();
		Ok(())
	}

	pub fn go_forward(&self) -> Result<()> {
		self.native()?.go_forward();
		Ok(())
	}

	/// Moves `offset` entries through session history.
	pub fn go_to_offset(&self, offset: i32) -> Result<()> {
		self.native()?.go_to_offset(offset);
		Ok(())
	}

	pub fn can_go_back(&self) -> Result<bool> {
		Ok(self.native()?.can_go_back())
	}

	pub fn can_go_forward(&self) -> Result<bool> {
		Ok(self.native()?.can_go_forward())
	}

	/// True from `did-start-loading` until `did-stop-loading`.
	pub fn is_loading(&self) -> Result<bool> {
		Ok(self.instance()?.navigation().lock().is_loading())
	}

	/// True until the main-resource response arrives.
	pub fn is_waiting_for_response(&self) -> Result<bool> {
		Ok(self.instance()?.navigation().lock().is_waiting_for_response())
	}

	pub fn is_crashed(&self) -> Result<bool> {
		Ok(self.instance()?.navigation().lock().is_crashed())
	}

	pub fn navigation_state(&self) -> Result<NavigationState> {
		Ok(self.instance()?.navigation().lock().state())
	}

	/// Most recent main-frame failure of the current run, if any.
	pub fn last_load_failure(&self) -> Result<Option<LoadFailure>> {
		Ok(self.instance()?.navigation().lock().last_failure().cloned())
	}
}
