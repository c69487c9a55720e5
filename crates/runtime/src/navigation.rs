//! Per-instance navigation state machine.
//!
//! ```text
//!          DidStartLoading          RequestSent
//!  Idle ───────────────────► Loading ──────────► WaitingForResponse
//!   ▲                          │                        │
//!   └──── DidStopLoading ──────┴────────────────────────┘
//!
//!  any ── ProcessGone ──► Crashed ── arm_reload + DidStartLoading ──► Loading
//! ```
//!
//! Load failures are recorded but never change the state; the engine always
//! follows them with `DidStopLoading`.

use serde::{Deserialize, Serialize};
use tether_protocol::TerminationStatus;

/// Coarse loading state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationState {
	#[default]
	Idle,
	Loading,
	WaitingForResponse,
	Crashed,
}

/// A failed navigation as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailure {
	pub url: String,
	pub code: i32,
	pub description: String,
	/// Failed before the navigation committed.
	pub provisional: bool,
}

/// Engine callbacks that drive the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationSignal {
	DidStartLoading,
	/// The main-resource request left the engine.
	RequestSent,
	DidStopLoading,
	DidFail(LoadFailure),
	ProcessGone(TerminationStatus),
}

/// Outcome of applying a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
	Unchanged,
	Changed { from: NavigationState, to: NavigationState },
}

impl Transition {
	pub fn changed(self) -> bool {
		matches!(self, Transition::Changed { .. })
	}

	/// Returns true when this transition began a loading run.
	pub fn started_run(self) -> bool {
		matches!(
			self,
			Transition::Changed {
				to: NavigationState::Loading,
				from: NavigationState::Idle | NavigationState::Crashed,
			}
		)
	}

	/// Returns true when this transition ended a loading run.
	pub fn stopped_run(self) -> bool {
		matches!(
			self,
			Transition::Changed {
				from: NavigationState::Loading | NavigationState::WaitingForResponse,
				to: NavigationState::Idle,
			}
		)
	}

	/// Returns true when a crash cut a loading run short.
	pub fn interrupted_run(self) -> bool {
		matches!(
			self,
			Transition::Changed {
				from: NavigationState::Loading | NavigationState::WaitingForResponse,
				to: NavigationState::Crashed,
			}
		)
	}

	/// Returns true when this transition left the crashed state.
	pub fn recovered(self) -> bool {
		matches!(
			self,
			Transition::Changed {
				from: NavigationState::Crashed,
				..
			}
		)
	}
}

/// Tracks [`NavigationState`] for one instance.
#[derive(Debug, Default)]
pub struct NavigationTracker {
	state: NavigationState,
	reload_armed: bool,
	last_failure: Option<LoadFailure>,
	termination: Option<TerminationStatus>,
	runs_started: u64,
	runs_stopped: u64,
}

impl NavigationTracker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> NavigationState {
		self.state
	}

	pub fn is_loading(&self) -> bool {
		matches!(self.state, NavigationState::Loading | NavigationState::WaitingForResponse)
	}

	pub fn is_waiting_for_response(&self) -> bool {
		self.state == NavigationState::WaitingForResponse
	}

	pub fn is_crashed(&self) -> bool {
		self.state == NavigationState::Crashed
	}

	/// Failure recorded during the current or most recent run.
	pub fn last_failure(&self) -> Option<&LoadFailure> {
		self.last_failure.as_ref()
	}

	/// How the content process ended, while crashed.
	pub fn termination(&self) -> Option<TerminationStatus> {
		self.termination
	}

	/// Completed `(started, stopped)` run counts.
	pub fn runs(&self) -> (u64, u64) {
		(self.runs_started, self.runs_stopped)
	}

	/// Allows the next `DidStartLoading` to leave the crashed state.
	///
	/// Called for explicit loads and reloads. Returns true if the tracker was
	/// crashed.
	pub fn arm_reload(&mut self) -> bool {
		if self.is_crashed() {
			self.reload_armed = true;
			true
		} else {
			false
		}
	}

	/// Applies an engine signal.
	pub fn apply(&mut self, signal: &NavigationSignal) -> Transition {
		let from = self.state;
		let to = match (from, signal) {
			(NavigationState::Crashed, NavigationSignal::DidStartLoading) if self.reload_armed => {
				self.reload_armed = false;
				self.termination = None;
				NavigationState::Loading
			}
			(NavigationState::Crashed, NavigationSignal::ProcessGone(status)) => {
				self.termination = Some(*status);
				return Transition::Unchanged;
			}
			(NavigationState::Crashed, _) => {
				tracing::debug!(?signal, "ignoring navigation signal while crashed");
				return Transition::Unchanged;
			}
			(_, NavigationSignal::ProcessGone(status)) => {
				self.termination = Some(*status);
				self.reload_armed = false;
				NavigationState::Crashed
			}
			(NavigationState::Idle, NavigationSignal::DidStartLoading) => NavigationState::Loading,
			(NavigationState::Loading, NavigationSignal::RequestSent) => NavigationState::WaitingForResponse,
			(NavigationState::Loading | NavigationState::WaitingForResponse, NavigationSignal::DidStopLoading) => NavigationState::Idle,
			(_, NavigationSignal::DidFail(failure)) => {
				self.last_failure = Some(failure.clone());
				return Transition::Unchanged;
			}
			_ => return Transition::Unchanged,
		};

		self.state = to;
		let transition = Transition::Changed { from, to };
		if transition.started_run() {
			self.runs_started += 1;
			self.last_failure = None;
		}
		if transition.stopped_run() || transition.interrupted_run() {
			self.runs_stopped += 1;
		}
		tracing::trace!(?from, ?to, "navigation transition");
		transition
	}
}
