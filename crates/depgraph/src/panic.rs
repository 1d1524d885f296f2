use tokio::task::JoinError;

/// Extracts the panic message carried by a [`JoinError`].
///
/// Returns `None` when the task was cancelled rather than panicking.
pub fn join_error_panic_message(err: JoinError) -> Option<String> {
	if !err.is_panic() {
		return None;
	}
	let payload = err.into_panic();
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		Some((*msg).to_string())
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		Some(msg.clone())
	} else {
		Some("<non-string panic payload>".to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::join_error_panic_message;

	#[tokio::test]
	async fn extracts_static_str_payload() {
		let handle = tokio::spawn(async { panic!("loader-str") });
		let err = handle.await.unwrap_err();
		let msg = join_error_panic_message(err).expect("should be a panic");
		assert!(msg.contains("loader-str"), "expected 'loader-str', got: {msg}");
	}

	#[tokio::test]
	async fn extracts_string_payload_from_blocking_pool() {
		let handle = tokio::task::spawn_blocking(|| panic!("{}", String::from("loader-string")));
		let err = handle.await.unwrap_err();
		let msg = join_error_panic_message(err).expect("should be a panic");
		assert!(msg.contains("loader-string"), "expected 'loader-string', got: {msg}");
	}

	#[tokio::test]
	async fn returns_none_for_cancellation() {
		let handle = tokio::spawn(std::future::pending::<()>());
		handle.abort();
		let err = handle.await.unwrap_err();
		assert!(join_error_panic_message(err).is_none(), "cancelled task should return None");
	}
}
