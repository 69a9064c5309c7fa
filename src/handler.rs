use std::sync::Arc;

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{
    config::Config,
    event::{ObjectLocation, S3Event},
    process::{
        filter::{FilterStats, RowFilter},
        output::DestinationRule,
        transform_csv, TransformOutcome,
    },
    store::ObjectStore,
};

/// What the runtime gets back from a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Result of processing one notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Source had zero bytes; nothing was written.
    Empty,
    Written {
        destination_key: String,
        stats: FilterStats,
    },
}

impl RecordOutcome {
    pub fn summary(&self) -> String {
        match self {
            RecordOutcome::Empty => "Empty file".to_string(),
            RecordOutcome::Written {
                destination_key,
                stats,
            } => format!(
                "Kept {} of {} rows -> {}",
                stats.kept, stats.total, destination_key
            ),
        }
    }
}

/// Runs the retention transform for storage notifications. Owns its store so
/// one client is built at startup and reused for every invocation.
pub struct Handler {
    store: Arc<dyn ObjectStore>,
    config: Config,
    destination: DestinationRule,
}

impl Handler {
    pub fn new(store: Arc<dyn ObjectStore>, config: Config) -> Self {
        let destination = config.destination_rule();
        Self {
            store,
            config,
            destination,
        }
    }

    /// Handle an event with the cutoff taken from the local clock.
    pub async fn handle(&self, event: &S3Event) -> Result<Response> {
        self.handle_at(event, Local::now().naive_local()).await
    }

    /// Handle every record in `event` in order. One cutoff, computed from `now`,
    /// applies to the whole batch. The first fatal error aborts the batch.
    pub async fn handle_at(&self, event: &S3Event, now: NaiveDateTime) -> Result<Response> {
        info!(records = event.records.len(), "triggered by storage event");

        if event.records.is_empty() {
            warn!("event carried no records");
            return Ok(Response {
                status_code: 200,
                body: "No records".to_string(),
            });
        }

        let filter = match RowFilter::with_lookback(
            now,
            self.config.lookback_days,
            self.config.terminal_statuses.as_slice(),
        ) {
            Ok(f) => f,
            Err(e) => {
                error!(error = %e, "could not compute cutoff");
                return Err(e);
            }
        };

        let mut summaries = Vec::with_capacity(event.records.len());
        for (idx, record) in event.records.iter().enumerate() {
            let location = match record.location() {
                Ok(loc) => loc,
                Err(e) => {
                    error!(record = idx, error = %e, "malformed event record");
                    return Err(e);
                }
            };
            info!(
                record = idx,
                event = record.event_name.as_deref().unwrap_or("unknown"),
                size = ?record.s3.object.size,
                "record"
            );
            let outcome = self.process_object(&location, &filter).await?;
            summaries.push(outcome.summary());
        }

        Ok(Response {
            status_code: 200,
            body: summaries.join("\n"),
        })
    }

    /// Fetch → filter → write for one object.
    #[instrument(level = "info", skip(self, filter), fields(source = %location))]
    pub async fn process_object(
        &self,
        location: &ObjectLocation,
        filter: &RowFilter,
    ) -> Result<RecordOutcome> {
        info!("incoming object: {}", location);

        let data = match self.store.get_object(&location.bucket, &location.key).await {
            Ok(d) => d,
            Err(e) => {
                error!(error = %format!("{:#}", e), "error reading object");
                return Err(e);
            }
        };

        let (csv, stats) = match transform_csv(&data, filter) {
            Ok(TransformOutcome::Empty) => {
                info!("empty file; nothing to process");
                return Ok(RecordOutcome::Empty);
            }
            Ok(TransformOutcome::Filtered { csv, stats, .. }) => (csv, stats),
            Err(e) => {
                error!(error = %format!("{:#}", e), "could not process object");
                return Err(e);
            }
        };

        let destination_key = self.destination.destination_key(&location.key);
        if destination_key == location.key {
            warn!(key = %location.key, "destination equals source key; source will be overwritten");
        }

        if let Err(e) = self
            .store
            .put_object(
                &location.bucket,
                &destination_key,
                csv,
                &self.config.content_type,
            )
            .await
        {
            error!(error = %format!("{:#}", e), "error writing processed CSV");
            return Err(e);
        }
        info!(
            "wrote {} rows to s3://{}/{}",
            stats.kept, location.bucket, destination_key
        );

        Ok(RecordOutcome::Written {
            destination_key,
            stats,
        })
    }
}
