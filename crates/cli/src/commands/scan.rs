//! Offline join-token extraction, for checking what a printed QR code
//! would submit.

use beanpass_client::scanner::{CameraDevice, DecodeSession};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("The scanned text is empty")]
    EmptyText,
}

/// A camera that delivers no frames; the decode is fed manually.
struct NullCamera;

impl CameraDevice for NullCamera {
    fn start(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Run the text through the decode session and print the join candidate.
#[allow(clippy::print_stdout)]
pub fn extract(text: &str) -> Result<(), ScanError> {
    let mut session = DecodeSession::new(NullCamera);
    session.start();

    let candidate = session.handle_decode(text).ok_or(ScanError::EmptyText)?;
    println!("{candidate}");
    Ok(())
}
