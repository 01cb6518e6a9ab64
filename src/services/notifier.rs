use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::core::matcher::DonorMatcher;
use crate::models::{BloodRequest, MatchResult, RequestStatus};
use crate::services::dedupe::NotificationDeduper;
use crate::services::gateway::{Alert, DeliveryGateway};
use crate::services::repository::RequestRepository;

/// Alert text sent to each matched donor
pub fn format_alert_message(request: &BloodRequest, distance_km: f64) -> String {
    format!(
        "URGENT: {} blood needed!\nPatient: {}\nHospital: {}\nUnits: {}\nDistance: ~{:.1} km away.\nPlease accept in app if available.",
        request.blood_group,
        request.requester_name,
        request.hospital_name,
        request.units_required,
        distance_km
    )
}

pub fn build_alert(request: &BloodRequest, matched: &MatchResult) -> Alert {
    Alert {
        request_id: request.id,
        donor_id: matched.donor.id,
        donor_name: matched.donor.full_name.clone(),
        phone: matched.donor.phone.clone(),
        email: matched.donor.email.clone(),
        blood_group: request.blood_group,
        urgency: request.urgency,
        distance_km: matched.distance_km,
        message: format_alert_message(request, matched.distance_km),
    }
}

/// Fire-and-forget alert fan-out
///
/// A failed delivery is logged and skipped; it never aborts the rest of the batch.
pub struct NotificationDispatcher {
    gateway: Arc<dyn DeliveryGateway>,
    deduper: Option<Arc<NotificationDeduper>>,
}

impl NotificationDispatcher {
    pub fn new(gateway: Arc<dyn DeliveryGateway>, deduper: Option<Arc<NotificationDeduper>>) -> Self {
        Self { gateway, deduper }
    }

    /// Alert every matched donor; returns how many alerts were delivered
    pub async fn dispatch(&self, request: &BloodRequest, matches: &[MatchResult]) -> usize {
        let mut sent = 0;
        let mut skipped = 0;
        let mut failed = 0;

        for matched in matches {
            let donor_id = matched.donor.id;

            if let Some(deduper) = &self.deduper {
                if !deduper.claim(donor_id, request.id).await {
                    skipped += 1;
                    continue;
                }
            }

            let alert = build_alert(request, matched);
            match self.gateway.deliver(&alert).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        gateway = self.gateway.name(),
                        request_id = %request.id,
                        donor_id = %donor_id,
                        error = %e,
                        "Alert delivery failed"
                    );
                    if let Some(deduper) = &self.deduper {
                        deduper.release(donor_id, request.id).await;
                    }
                }
            }
        }

        tracing::info!(
            request_id = %request.id,
            gateway = self.gateway.name(),
            sent,
            skipped,
            failed,
            "Dispatched donor alerts"
        );

        sent
    }
}

/// Producer half of the broadcast queue; cheap to clone into handlers
#[derive(Clone)]
pub struct BroadcastQueue {
    sender: mpsc::Sender<BloodRequest>,
}

/// Bounded queue between request intake and the broadcast worker
pub fn broadcast_channel(capacity: usize) -> (BroadcastQueue, mpsc::Receiver<BloodRequest>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (BroadcastQueue { sender }, receiver)
}

impl BroadcastQueue {
    /// Queue a broadcast without waiting; returns false when it was dropped
    pub fn enqueue(&self, request: BloodRequest) -> bool {
        match self.sender.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) => {
                tracing::warn!(request_id = %request.id, "Broadcast queue full, dropping broadcast");
                false
            }
            Err(TrySendError::Closed(request)) => {
                tracing::error!(request_id = %request.id, "Broadcast worker stopped, dropping broadcast");
                false
            }
        }
    }
}

/// Drains the broadcast queue: match, alert, optionally mark matched
pub struct BroadcastWorker {
    receiver: mpsc::Receiver<BloodRequest>,
    matcher: DonorMatcher,
    dispatcher: Arc<NotificationDispatcher>,
    requests: Arc<dyn RequestRepository>,
    radius_km: f64,
    auto_mark_matched: bool,
}

impl BroadcastWorker {
    pub fn new(
        receiver: mpsc::Receiver<BloodRequest>,
        matcher: DonorMatcher,
        dispatcher: Arc<NotificationDispatcher>,
        requests: Arc<dyn RequestRepository>,
        radius_km: f64,
        auto_mark_matched: bool,
    ) -> Self {
        Self {
            receiver,
            matcher,
            dispatcher,
            requests,
            radius_km,
            auto_mark_matched,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        tracing::info!(radius_km = self.radius_km, "Broadcast worker started");

        while let Some(request) = self.receiver.recv().await {
            self.process(&request).await;
        }

        tracing::info!("Broadcast queue closed, worker exiting");
    }

    /// Broadcast one request; `None` when the lookup failed
    ///
    /// The queued snapshot may be stale, so the current status is read back
    /// first and requests completed in the meantime are skipped.
    pub async fn process(&self, queued: &BloodRequest) -> Option<usize> {
        let request = match self.requests.get_request(queued.id).await {
            Ok(current) if current.status.is_open() => current,
            Ok(current) => {
                tracing::info!(
                    request_id = %current.id,
                    status = %current.status,
                    "Request closed before broadcast, skipping"
                );
                return Some(0);
            }
            Err(e) => {
                tracing::error!(request_id = %queued.id, error = %e, "Failed to reload request for broadcast");
                return None;
            }
        };

        let matches = match self.matcher.find_matches(&request, self.radius_km).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(request_id = %request.id, error = %e, "Broadcast matching failed");
                return None;
            }
        };

        let sent = self.dispatcher.dispatch(&request, &matches).await;

        if self.auto_mark_matched && sent > 0 && request.status == RequestStatus::Pending {
            if let Err(e) = self
                .requests
                .update_status(request.id, RequestStatus::Matched)
                .await
            {
                tracing::warn!(request_id = %request.id, error = %e, "Failed to mark request matched");
            }
        }

        Some(sent)
    }
}
