// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff for transient transport errors.

use crate::{Channel, Driver, DriverError, Frame};
use dird_core::consts::{RETRY_ATTEMPTS, RETRY_CAP, RETRY_INITIAL};
use dird_core::Identity;
use std::time::Duration;

/// Delay before the given retry (1-based attempt that just failed):
/// 0.5s, 1s, 2s, 4s, ... capped at 30s.
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    RETRY_INITIAL.saturating_mul(factor).min(RETRY_CAP)
}

/// Send a frame, retrying transient failures with backoff.
///
/// After [`RETRY_ATTEMPTS`] failures the frame is declared
/// undeliverable; the caller records the target as NACKED.
pub async fn send_with_retry(
    driver: &dyn Driver,
    channel: Channel,
    identity: &Identity,
    frame: Frame,
) -> Result<(), DriverError> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match driver.send(channel, identity, frame.clone()).await {
            Ok(()) => return Ok(()),
            Err(e @ (DriverError::Transport(_) | DriverError::Closed)) => {
                if attempt >= RETRY_ATTEMPTS {
                    tracing::warn!(
                        %channel,
                        %identity,
                        attempts = attempt,
                        error = %e,
                        "frame undeliverable"
                    );
                    return Err(DriverError::Undeliverable { attempts: attempt });
                }
                let delay = backoff_delay(attempt);
                tracing::debug!(%channel, %identity, attempt, ?delay, error = %e, "send retry");
                tokio::time::sleep(delay).await;
            }
            Err(other) => return Err(other),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
