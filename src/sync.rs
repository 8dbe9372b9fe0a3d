//! Keeps the robot registry in sync with the push channel and bulk fetch.
//!
//! One spawned task owns the registry. Push events, the fetch result,
//! readiness transitions and installation changes are all serialized
//! through its select loop, so mutations never race and need no locking.
//! After every processed message the filtered view is recomputed and
//! published on a watch channel for consumers.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::alerts::{AlertSender, AlertSink};
use crate::backend::RobotFetcher;
use crate::channel::{EventLabel, InboundEvent, PushChannel, Subscription};
use crate::error::RegistryError;
use crate::models::{Robot, RobotRef};
use crate::registry::RobotRegistry;

type FetchResult = anyhow::Result<Vec<Robot>>;

/// Read-side handle to the synchronized registry.
///
/// No mutation surface is exposed; all writes flow from the push channel
/// and the one-time fetch.
pub struct RegistryHandle {
    visible: watch::Receiver<Vec<Robot>>,
    task: JoinHandle<()>,
}

impl RegistryHandle {
    /// Snapshot of the current installation-filtered robot list.
    pub fn visible_robots(&self) -> Vec<Robot> {
        self.visible.borrow().clone()
    }

    /// Reactive view. The watch is refreshed after every processed message,
    /// whether or not it changed the list.
    pub fn watch(&self) -> watch::Receiver<Vec<Robot>> {
        self.visible.clone()
    }

    /// Stop the synchronization task and drop its subscriptions.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

/// Spawn the synchronization task.
///
/// `installation_rx` carries the active installation code; changes are
/// picked up live and refilter the view. The fetch is launched once at
/// startup and its result merged record by record, so push events that beat
/// a slow fetch are never wiped.
pub fn spawn<F, S>(
    channel: Arc<dyn PushChannel>,
    fetcher: F,
    alerts: AlertSender<S>,
    installation_rx: watch::Receiver<String>,
) -> RegistryHandle
where
    F: RobotFetcher,
    S: AlertSink,
{
    let (visible_tx, visible_rx) = watch::channel(Vec::new());
    let task = tokio::spawn(run(channel, fetcher, alerts, installation_rx, visible_tx));

    RegistryHandle {
        visible: visible_rx,
        task,
    }
}

async fn run<F, S>(
    channel: Arc<dyn PushChannel>,
    fetcher: F,
    alerts: AlertSender<S>,
    mut installation_rx: watch::Receiver<String>,
    visible_tx: watch::Sender<Vec<Robot>>,
) where
    F: RobotFetcher,
    S: AlertSink,
{
    let mut registry = RobotRegistry::new(installation_rx.borrow().clone());
    let mut ready_rx = channel.readiness();

    // The registry starts empty, so this is the first-activation load.
    let (fetch_tx, fetch_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = fetch_tx.send(fetcher.fetch_all().await);
    });
    let mut fetch_rx = Some(fetch_rx);

    let mut added_sub: Option<Subscription> = None;
    let mut updated_sub: Option<Subscription> = None;
    let mut deleted_sub: Option<Subscription> = None;

    if *ready_rx.borrow() {
        register_subscriptions(
            channel.as_ref(),
            &mut added_sub,
            &mut updated_sub,
            &mut deleted_sub,
        );
    }
    publish(&visible_tx, &registry);

    let mut readiness_live = true;
    let mut installation_live = true;

    loop {
        tokio::select! {
            changed = ready_rx.changed(), if readiness_live => {
                match changed {
                    Ok(()) => {
                        if *ready_rx.borrow() {
                            register_subscriptions(
                                channel.as_ref(),
                                &mut added_sub,
                                &mut updated_sub,
                                &mut deleted_sub,
                            );
                        }
                    }
                    Err(_) => readiness_live = false,
                }
                publish(&visible_tx, &registry);
            }

            changed = installation_rx.changed(), if installation_live => {
                match changed {
                    Ok(()) => {
                        let code = installation_rx.borrow().clone();
                        tracing::debug!(installation = %code, "active installation changed");
                        registry.set_active_installation(code);
                    }
                    Err(_) => installation_live = false,
                }
                publish(&visible_tx, &registry);
            }

            result = recv_fetch(&mut fetch_rx), if fetch_rx.is_some() => {
                fetch_rx = None;
                match result {
                    Ok(Ok(robots)) => {
                        tracing::info!(count = robots.len(), "robot list fetched");
                        registry.merge_fetched(robots);
                    }
                    Ok(Err(error)) => {
                        tracing::warn!(error = %error, "failed to fetch robot list");
                        alerts.request_failure(&error);
                    }
                    Err(_) => {
                        tracing::warn!("fetch task dropped before completing");
                    }
                }
                publish(&visible_tx, &registry);
            }

            event = next_event(&mut added_sub) => {
                apply_event(&mut registry, EventLabel::RobotAdded, &event);
                publish(&visible_tx, &registry);
            }

            event = next_event(&mut updated_sub) => {
                apply_event(&mut registry, EventLabel::RobotUpdated, &event);
                publish(&visible_tx, &registry);
            }

            event = next_event(&mut deleted_sub) => {
                apply_event(&mut registry, EventLabel::RobotDeleted, &event);
                publish(&visible_tx, &registry);
            }
        }
    }
}

/// Drop any stale handles, then register fresh subscriptions for the three
/// lifecycle labels. Unsubscribing first keeps a reconnect from leaving
/// duplicate subscribers behind.
fn register_subscriptions(
    channel: &dyn PushChannel,
    added: &mut Option<Subscription>,
    updated: &mut Option<Subscription>,
    deleted: &mut Option<Subscription>,
) {
    added.take();
    updated.take();
    deleted.take();

    *added = Some(channel.subscribe(EventLabel::RobotAdded));
    *updated = Some(channel.subscribe(EventLabel::RobotUpdated));
    *deleted = Some(channel.subscribe(EventLabel::RobotDeleted));

    tracing::debug!("push channel ready, subscriptions registered");
}

/// Apply one inbound event to the registry. Invalid events are dropped and
/// the prior state retained; nothing here can fail the loop.
fn apply_event(registry: &mut RobotRegistry, label: EventLabel, event: &InboundEvent) {
    match label {
        EventLabel::RobotAdded => match Robot::from_payload(&event.payload) {
            Ok(robot) => {
                tracing::debug!(robot_id = %robot.id, "robot added");
                registry.upsert(robot);
            }
            Err(error) => {
                tracing::warn!(
                    code = error.to_error_code(),
                    event = %label,
                    error = %error,
                    "dropping event with malformed payload"
                );
            }
        },
        EventLabel::RobotUpdated => match Robot::from_payload(&event.payload) {
            Ok(robot) => {
                if robot.model.model_type.is_none() {
                    // Known upstream artifact: partial update payloads
                    // arrive without a model type. Dropped wholesale.
                    let error = RegistryError::IncompleteUpdate(robot.id.clone());
                    tracing::debug!(
                        code = error.to_error_code(),
                        robot_id = %robot.id,
                        "dropping robot update without model type"
                    );
                } else {
                    tracing::debug!(robot_id = %robot.id, "robot updated");
                    registry.upsert(robot);
                }
            }
            Err(error) => {
                tracing::warn!(
                    code = error.to_error_code(),
                    event = %label,
                    error = %error,
                    "dropping event with malformed payload"
                );
            }
        },
        EventLabel::RobotDeleted => match RobotRef::from_payload(&event.payload) {
            Ok(robot_ref) => {
                let removed = registry.remove(&robot_ref.id);
                tracing::debug!(robot_id = %robot_ref.id, removed, "robot delete event");
            }
            Err(error) => {
                tracing::warn!(
                    code = error.to_error_code(),
                    event = %label,
                    error = %error,
                    "dropping event with malformed payload"
                );
            }
        },
    }
}

fn publish(visible_tx: &watch::Sender<Vec<Robot>>, registry: &RobotRegistry) {
    let _ = visible_tx.send(registry.visible());
}

async fn next_event(sub: &mut Option<Subscription>) -> InboundEvent {
    match sub {
        Some(sub) => match sub.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}

async fn recv_fetch(
    fetch_rx: &mut Option<oneshot::Receiver<FetchResult>>,
) -> Result<FetchResult, oneshot::error::RecvError> {
    match fetch_rx {
        Some(rx) => rx.await,
        None => std::future::pending().await,
    }
}
