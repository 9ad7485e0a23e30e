//! Polling of long-running video jobs.
//!
//! Waits a fixed interval between status checks, gives up after a bounded
//! number of checks, and stops early when the caller cancels. Exactly one
//! download happens once the job reports a result locator.

use super::VideoGenerationService;
use crate::models::{GeneratedVideo, VideoJob};
use crate::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;
use tokio_retry::strategy::FixedInterval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_CHECKS: u32 = 120;

#[derive(Debug, Clone, Copy)]
pub struct JobPoller {
    interval: Duration,
    max_checks: u32,
}

impl Default for JobPoller {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_MAX_CHECKS)
    }
}

impl JobPoller {
    pub fn new(interval: Duration, max_checks: u32) -> Self {
        Self {
            interval,
            max_checks,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check the job until it is done, waiting `interval` before every check.
    pub async fn wait_for_completion<S>(
        &self,
        service: &S,
        mut job: VideoJob,
        cancel: &CancellationToken,
    ) -> Result<VideoJob>
    where
        S: VideoGenerationService + ?Sized,
    {
        let started = Instant::now();
        let mut schedule = FixedInterval::new(self.interval).take(self.max_checks as usize);
        let mut checks: u32 = 0;

        while !job.done {
            let Some(delay) = schedule.next() else {
                warn!(
                    "Video job {} still running after {} checks",
                    job.name, checks
                );
                return Err(Error::Timeout {
                    attempts: checks,
                    elapsed: started.elapsed(),
                });
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            let current = job.clone();
            job = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                refreshed = service.refresh(&current) => refreshed?,
            };
            checks += 1;
            debug!("Video job {} check {}: done={}", job.name, checks, job.done);
        }

        info!(
            "Video job {} finished after {} checks ({:?})",
            job.name,
            checks,
            started.elapsed()
        );
        Ok(job)
    }

    /// Wait for the job, then fetch its result exactly once.
    pub async fn run<S>(
        &self,
        service: &S,
        job: VideoJob,
        cancel: &CancellationToken,
    ) -> Result<GeneratedVideo>
    where
        S: VideoGenerationService + ?Sized,
    {
        let job = self.wait_for_completion(service, job, cancel).await?;
        let uri = job.result_uri.ok_or(Error::MissingResult)?;

        let video = service.download(&uri).await?;
        info!(
            "Downloaded video for job {} ({} bytes)",
            job.name,
            video.bytes.len()
        );
        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockVideoClient;

    const INTERVAL: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_n_pending_checks_then_done_polls_n_plus_one_times() {
        for pending in [0u32, 1, 4] {
            let client = MockVideoClient::new()
                .with_pending_checks(pending)
                .with_result_uri("https://files.example/v.mp4");
            let poller = JobPoller::new(INTERVAL, 100);

            let started = Instant::now();
            let video = poller
                .run(&client, VideoJob::running("op"), &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(client.refresh_count(), pending as usize + 1);
            assert_eq!(client.download_count(), 1);
            assert_eq!(started.elapsed(), INTERVAL * (pending + 1));
            assert_eq!(video.bytes, client.video_bytes());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_checks_are_spaced_by_the_interval() {
        let client = MockVideoClient::new()
            .with_pending_checks(3)
            .with_result_uri("https://files.example/v.mp4");
        let started = Instant::now();

        JobPoller::new(INTERVAL, 100)
            .run(&client, VideoJob::running("op"), &CancellationToken::new())
            .await
            .unwrap();

        let offsets: Vec<Duration> = client
            .refresh_times()
            .into_iter()
            .map(|t| t - started)
            .collect();
        assert_eq!(offsets, vec![INTERVAL, INTERVAL * 2, INTERVAL * 3, INTERVAL * 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_done_job_is_not_polled() {
        let client = MockVideoClient::new();

        JobPoller::new(INTERVAL, 100)
            .run(
                &client,
                VideoJob::finished("op", Some("https://files.example/v.mp4".to_string())),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(client.refresh_count(), 0);
        assert_eq!(client.download_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_without_locator_fails_without_fetch() {
        let client = MockVideoClient::new().with_pending_checks(2);

        let err = JobPoller::new(INTERVAL, 100)
            .run(&client, VideoJob::running("op"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingResult));
        assert_eq!(client.refresh_count(), 3);
        assert_eq!(client.download_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_checks() {
        let client = MockVideoClient::new()
            .with_pending_checks(10)
            .with_result_uri("https://files.example/v.mp4");

        let err = JobPoller::new(INTERVAL, 3)
            .run(&client, VideoJob::running("op"), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::Timeout { attempts, elapsed } => {
                assert_eq!(attempts, 3);
                assert_eq!(elapsed, INTERVAL * 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.refresh_count(), 3);
        assert_eq!(client.download_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_polling() {
        let client = MockVideoClient::new()
            .with_pending_checks(10)
            .with_result_uri("https://files.example/v.mp4");
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let err = JobPoller::new(INTERVAL, 100)
            .run(&client, VideoJob::running("op"), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(client.refresh_count(), 2);
        assert_eq!(client.download_count(), 0);
    }
}
