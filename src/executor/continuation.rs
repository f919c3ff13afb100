// std
use std::ops::ControlFlow;
// self
use crate::{_prelude::*, request::Continuation, response::ApiResponse};

/// Response header announcing whether more pages exist (`Y` / `N`).
pub const CONT_YN: &str = "cont_yn";
/// Response header carrying the key of the next page.
pub const CONT_KEY: &str = "cont_key";

/// Pages accumulated across the round trips of one logical call.
#[derive(Debug)]
pub(crate) struct ContinuationState {
	pages: Vec<JsonValue>,
	cursor: Continuation,
	count: u32,
	max: u32,
}
impl ContinuationState {
	pub(crate) fn new(start: Continuation, max: u32) -> Self {
		Self { pages: Vec::new(), cursor: start, count: 0, max }
	}

	/// Cursor for the next request.
	pub(crate) fn cursor(&self) -> &Continuation {
		&self.cursor
	}

	pub(crate) fn count(&self) -> u32 {
		self.count
	}

	/// Folds in a successful page and decides whether another round trip follows.
	///
	/// Stops when the server reports no more data, sends an empty key, or the continuation
	/// cap is reached; the final page is then returned together with every earlier page.
	pub(crate) fn advance(
		&mut self,
		payload: JsonValue,
		next: Continuation,
	) -> ControlFlow<ApiResponse> {
		if next.has_next() && self.count < self.max {
			self.pages.push(payload);
			self.cursor = next;
			self.count += 1;

			return ControlFlow::Continue(());
		}

		if self.pages.is_empty() {
			ControlFlow::Break(ApiResponse::Single(payload))
		} else {
			let mut pages = std::mem::take(&mut self.pages);

			pages.push(payload);

			ControlFlow::Break(ApiResponse::Pages(pages))
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn single_page_is_unwrapped() {
		let mut state = ContinuationState::new(Continuation::default(), 20);

		assert_eq!(
			state.advance(json!({"page": 1}), Continuation::default()),
			ControlFlow::Break(ApiResponse::Single(json!({"page": 1})))
		);
	}

	#[test]
	fn pages_accumulate_in_order_until_flag_clears() {
		let mut state = ContinuationState::new(Continuation::default(), 20);

		assert_eq!(state.advance(json!(1), Continuation::resume("K1")), ControlFlow::Continue(()));
		assert_eq!(state.cursor().key, "K1");
		assert_eq!(state.advance(json!(2), Continuation::resume("K2")), ControlFlow::Continue(()));
		assert_eq!(state.count(), 2);
		assert_eq!(
			state.advance(json!(3), Continuation { more: false, key: "K3".into() }),
			ControlFlow::Break(ApiResponse::Pages(vec![json!(1), json!(2), json!(3)]))
		);
	}

	#[test]
	fn empty_key_or_cap_stops_the_loop() {
		let mut state = ContinuationState::new(Continuation::default(), 20);

		assert_eq!(
			state.advance(json!(1), Continuation { more: true, key: String::new() }),
			ControlFlow::Break(ApiResponse::Single(json!(1)))
		);

		let mut capped = ContinuationState::new(Continuation::default(), 1);

		assert_eq!(capped.advance(json!(1), Continuation::resume("K1")), ControlFlow::Continue(()));
		assert_eq!(
			capped.advance(json!(2), Continuation::resume("K2")),
			ControlFlow::Break(ApiResponse::Pages(vec![json!(1), json!(2)]))
		);

		let mut disabled = ContinuationState::new(Continuation::default(), 0);

		assert_eq!(
			disabled.advance(json!(1), Continuation::resume("K1")),
			ControlFlow::Break(ApiResponse::Single(json!(1)))
		);
	}
}
