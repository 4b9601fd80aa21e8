//! Card presence monitor.
//!
//! A blocking thread owns the reader. It waits for a card, reads and reports
//! it, then reads the card UID every poll interval until the read fails.
//! Arrivals and removals travel over a channel to the async side, which
//! publishes them.
//!
//! ```text
//!   connect ──► NoCard ──► wait poll interval ──► connect
//!      │
//!      ├──► other error ──► wait reconnect delay ──► connect
//!      │
//!      └──► card ──► Arrived(report) ──► poll UID ... ──► Removed
//! ```

use crate::config::MonitorSettings;
use crate::publish::{PublishError, StatePublisher, TagPublisher};
use crate::report::TagReport;
use std::future::Future;
use std::time::{Duration, Instant};
use tagbridge_hardware::{HardwareError, TagSession};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Longest uninterrupted sleep, so shutdown requests are noticed quickly.
const SHUTDOWN_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Capacity of the event channel.
const EVENT_CHANNEL_SIZE: usize = 16;

/// Change in the reader field.
#[derive(Debug, Clone)]
pub enum TagEvent {
    /// A card was presented and read.
    Arrived(Box<TagReport>),

    /// The card left the field.
    Removed,
}

/// How a card session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Removed,
    Shutdown,
}

/// Report the card behind `session`, then wait for it to leave.
///
/// Blocks the calling thread.
pub fn watch_session<S: TagSession + ?Sized>(
    session: &mut S,
    poll_interval: Duration,
    events: &mpsc::Sender<TagEvent>,
    shutdown: &watch::Receiver<bool>,
) -> SessionEnd {
    let report = TagReport::read(session);
    if events
        .blocking_send(TagEvent::Arrived(Box::new(report)))
        .is_err()
    {
        return SessionEnd::Shutdown;
    }

    debug!("Waiting for card removal");
    loop {
        if pause(poll_interval, shutdown) {
            return SessionEnd::Shutdown;
        }
        if let Err(e) = session.uid() {
            debug!(error = %e, "Presence check failed");
            info!("Card removed");
            if events.blocking_send(TagEvent::Removed).is_err() {
                return SessionEnd::Shutdown;
            }
            return SessionEnd::Removed;
        }
    }
}

/// Connect to cards until shutdown.
///
/// `connect` is called whenever the field is free. It returns
/// `HardwareError::NoCard` while no card is present; any error other than a
/// missing card is treated as a reader failure and retried after the
/// reconnect delay.
///
/// Blocks the calling thread.
pub fn card_loop<S, F>(
    mut connect: F,
    settings: MonitorSettings,
    events: &mpsc::Sender<TagEvent>,
    shutdown: &watch::Receiver<bool>,
) where
    S: TagSession,
    F: FnMut() -> Result<S, HardwareError>,
{
    while !*shutdown.borrow() {
        match connect() {
            Ok(mut session) => {
                if watch_session(&mut session, settings.poll_interval, events, shutdown)
                    == SessionEnd::Shutdown
                {
                    break;
                }
            }
            Err(e) if e.is_card_gone() => {
                if pause(settings.poll_interval, shutdown) {
                    break;
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    retry_in_ms = settings.reconnect_delay.as_millis() as u64,
                    "Reader unavailable"
                );
                if pause(settings.reconnect_delay, shutdown) {
                    break;
                }
            }
        }
    }
    debug!("Card loop stopped");
}

/// Sleep for `duration`. Returns `true` if shutdown was requested.
fn pause(duration: Duration, shutdown: &watch::Receiver<bool>) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if *shutdown.borrow() {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        std::thread::sleep((deadline - now).min(SHUTDOWN_CHECK_INTERVAL));
    }
}

/// Running card loop.
pub struct Monitor {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Monitor {
    /// Start the card loop on the blocking thread pool.
    ///
    /// Returns the monitor and the receiving end of its event channel.
    pub fn spawn<S, F>(connect: F, settings: MonitorSettings) -> (Self, mpsc::Receiver<TagEvent>)
    where
        S: TagSession,
        F: FnMut() -> Result<S, HardwareError> + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::task::spawn_blocking(move || {
            card_loop(connect, settings, &event_tx, &shutdown_rx);
        });

        (
            Self {
                shutdown: shutdown_tx,
                task,
            },
            event_rx,
        )
    }

    /// Stop the card loop and wait for it to finish.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(true);
        self.task.await?;
        Ok(())
    }
}

/// Publish one event.
pub async fn handle_event<P: StatePublisher>(
    publisher: &mut TagPublisher<P>,
    event: TagEvent,
) -> Result<(), PublishError> {
    match event {
        TagEvent::Arrived(report) => {
            report.log();
            publisher.publish_state(report.identity.tag_id).await
        }
        TagEvent::Removed => publisher.publish_state(None).await,
    }
}

/// Publish events until the channel closes or `shutdown` resolves.
///
/// Each notification on `connections` republishes discovery and the current
/// state, for transports that can lose their session. Events already queued
/// are published before shutdown is honored. Publishing errors are logged and
/// do not stop the loop.
pub async fn forward_events<P, F>(
    events: &mut mpsc::Receiver<TagEvent>,
    publisher: &mut TagPublisher<P>,
    mut connections: Option<&mut mpsc::Receiver<()>>,
    shutdown: F,
) where
    P: StatePublisher,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;

            event = events.recv() => {
                let Some(event) = event else {
                    debug!("Event channel closed");
                    break;
                };
                if let Err(e) = handle_event(publisher, event).await {
                    warn!(error = %e, "Failed to publish tag state");
                }
            }
            () = next_connection(&mut connections) => {
                if let Err(e) = publisher.announce().await {
                    warn!(error = %e, "Failed to announce after connecting");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }
}

/// Resolve on the next connection notification; never once the channel
/// is gone.
async fn next_connection(connections: &mut Option<&mut mpsc::Receiver<()>>) {
    if let Some(rx) = connections {
        if rx.recv().await.is_some() {
            return;
        }
        *connections = None;
    }
    std::future::pending::<()>().await;
}

/// Connector for the first PC/SC reader matching `filter`.
///
/// The reader is reopened after any failure other than an empty field.
#[cfg(feature = "pcsc")]
pub fn pcsc_connector(
    filter: Option<String>,
) -> impl FnMut() -> Result<tagbridge_hardware::pcsc::PcscCard, HardwareError> + Send + 'static {
    use tagbridge_hardware::pcsc::PcscReader;

    let mut reader: Option<PcscReader> = None;
    move || {
        if reader.is_none() {
            let opened = PcscReader::open(filter.as_deref())?;
            info!(reader = %opened.name(), "Connected to reader");
            reader = Some(opened);
        }

        let result = match &reader {
            Some(r) => r.connect(),
            None => Err(HardwareError::NoCard),
        };
        if let Err(e) = &result
            && !e.is_card_gone()
        {
            reader = None;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::publish::MemoryPublisher;
    use serde_json::Value;
    use std::collections::VecDeque;
    use tagbridge_hardware::mock::MockT2Tag;
    use tagbridge_hardware::{PageRead, PageReader};

    const FAST: MonitorSettings = MonitorSettings {
        poll_interval: Duration::from_millis(1),
        reconnect_delay: Duration::from_millis(1),
    };

    fn ha_tag(tag: &str) -> MockT2Tag {
        let suffix = format!("home-assistant.io/tag/{tag}");
        let mut ndef = vec![0xD1, 0x01, (suffix.len() + 1) as u8, b'U', 0x04];
        ndef.extend_from_slice(suffix.as_bytes());
        MockT2Tag::new(&ndef).unwrap()
    }

    /// Session whose presence check fails after a number of successes.
    struct LeavingTag {
        tag: MockT2Tag,
        checks_left: usize,
    }

    impl PageReader for LeavingTag {
        fn read_page(&mut self, page: u16) -> PageRead {
            self.tag.read_page(page)
        }
    }

    impl TagSession for LeavingTag {
        fn atr(&self) -> tagbridge_hardware::Result<Vec<u8>> {
            self.tag.atr()
        }

        fn uid(&mut self) -> tagbridge_hardware::Result<Vec<u8>> {
            if self.checks_left == 0 {
                return Err(HardwareError::NoCard);
            }
            self.checks_left -= 1;
            self.tag.uid()
        }
    }

    fn drain(rx: &mut mpsc::Receiver<TagEvent>) -> Vec<TagEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_watch_session_reports_then_removal() {
        let (tx, mut rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut session = LeavingTag {
            tag: ha_tag("kitchen"),
            checks_left: 3,
        };

        let end = watch_session(&mut session, FAST.poll_interval, &tx, &shutdown_rx);
        assert_eq!(end, SessionEnd::Removed);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        match &events[0] {
            TagEvent::Arrived(report) => {
                assert_eq!(report.identity.tag_id.as_ref().unwrap().as_str(), "kitchen");
            }
            other => panic!("expected arrival, got {other:?}"),
        }
        assert!(matches!(events[1], TagEvent::Removed));
    }

    #[test]
    fn test_watch_session_stops_on_shutdown() {
        let (tx, _rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        let mut tag = ha_tag("x");
        let end = watch_session(&mut tag, FAST.poll_interval, &tx, &shutdown_rx);
        assert_eq!(end, SessionEnd::Shutdown);
    }

    #[test]
    fn test_watch_session_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut tag = ha_tag("x");
        let end = watch_session(&mut tag, FAST.poll_interval, &tx, &shutdown_rx);
        assert_eq!(end, SessionEnd::Shutdown);
    }

    #[test]
    fn test_card_loop_survives_errors_and_empty_field() {
        let (tx, mut rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut script: VecDeque<Result<LeavingTag, HardwareError>> = VecDeque::from([
            Err(HardwareError::NoCard),
            Ok(LeavingTag {
                tag: ha_tag("first"),
                checks_left: 1,
            }),
            Err(HardwareError::disconnected("reader")),
            Err(HardwareError::NoCard),
            Ok(LeavingTag {
                tag: ha_tag("second"),
                checks_left: 0,
            }),
        ]);
        let mut calls = 0;
        let connect = || {
            calls += 1;
            script.pop_front().unwrap_or_else(|| {
                let _ = shutdown_tx.send(true);
                Err(HardwareError::NoCard)
            })
        };

        card_loop(connect, FAST, &tx, &shutdown_rx);
        assert_eq!(calls, 6);

        let ids: Vec<Option<String>> = drain(&mut rx)
            .into_iter()
            .map(|event| match event {
                TagEvent::Arrived(report) => report.identity.tag_id.map(String::from),
                TagEvent::Removed => None,
            })
            .collect();
        assert_eq!(
            ids,
            vec![Some("first".to_string()), None, Some("second".to_string()), None]
        );
    }

    #[test]
    fn test_pause_returns_early_on_shutdown() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        assert!(!pause(Duration::from_millis(1), &shutdown_rx));

        shutdown_tx.send(true).unwrap();
        let start = Instant::now();
        assert!(pause(Duration::from_secs(10), &shutdown_rx));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    fn config() -> ServiceConfig {
        ServiceConfig {
            client_id: "nfc_tag_reader".to_string(),
            reader: None,
            broker: None,
            config_topic: "nfc/config".to_string(),
            state_topic: "nfc/state".to_string(),
            monitor: FAST,
        }
    }

    fn states(publisher: &TagPublisher<MemoryPublisher>) -> Vec<Value> {
        publisher
            .inner()
            .messages
            .iter()
            .filter(|(topic, _, _)| topic == "nfc/state")
            .map(|(_, payload, _)| serde_json::from_str(payload).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_forward_events_publishes_state_changes() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut publisher = TagPublisher::new(MemoryPublisher::default(), &config());

        let report = TagReport::read(&mut ha_tag("garage"));
        tx.send(TagEvent::Arrived(Box::new(report))).await.unwrap();
        tx.send(TagEvent::Removed).await.unwrap();
        drop(tx);

        forward_events(&mut rx, &mut publisher, None, std::future::pending()).await;

        let states = states(&publisher);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0]["tag_id"], "garage");
        assert_eq!(states[0]["present"], true);
        assert_eq!(states[1]["tag_id"], Value::Null);
        assert_eq!(states[1]["present"], false);
    }

    #[tokio::test]
    async fn test_forward_events_stops_on_shutdown() {
        let (_tx, mut rx) = mpsc::channel::<TagEvent>(4);
        let mut publisher = TagPublisher::new(MemoryPublisher::default(), &config());

        forward_events(&mut rx, &mut publisher, None, async {}).await;
        assert!(publisher.inner().messages.is_empty());
    }

    #[tokio::test]
    async fn test_forward_events_drains_queue_before_shutdown() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut publisher = TagPublisher::new(MemoryPublisher::default(), &config());
        tx.send(TagEvent::Removed).await.unwrap();

        forward_events(&mut rx, &mut publisher, None, async {}).await;
        assert_eq!(states(&publisher).len(), 1);
    }

    #[tokio::test]
    async fn test_forward_events_announces_on_each_connection() {
        let (_tx, mut rx) = mpsc::channel::<TagEvent>(4);
        let (conn_tx, mut conn_rx) = mpsc::channel(1);
        let mut publisher = TagPublisher::new(MemoryPublisher::default(), &config());

        conn_tx.send(()).await.unwrap();
        forward_events(&mut rx, &mut publisher, Some(&mut conn_rx), async {}).await;

        let messages = &publisher.inner().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, "nfc/config");
        assert_eq!(messages[1].0, "nfc/state");
    }

    #[tokio::test]
    async fn test_forward_events_ignores_closed_connection_channel() {
        let (_tx, mut rx) = mpsc::channel::<TagEvent>(4);
        let (conn_tx, mut conn_rx) = mpsc::channel::<()>(1);
        drop(conn_tx);
        let mut publisher = TagPublisher::new(MemoryPublisher::default(), &config());

        forward_events(
            &mut rx,
            &mut publisher,
            Some(&mut conn_rx),
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await;

        assert!(publisher.inner().messages.is_empty());
    }

    #[tokio::test]
    async fn test_monitor_with_mock_tag() {
        let tag = ha_tag("hallway");
        let presence = tag.presence();
        let mut handed_out = false;

        let connect = move || {
            if !handed_out && tag.is_present() {
                handed_out = true;
                Ok(tag.clone())
            } else {
                Err(HardwareError::NoCard)
            }
        };

        let (monitor, mut events) = Monitor::spawn(connect, FAST);

        let arrived = events.recv().await.unwrap();
        assert!(matches!(arrived, TagEvent::Arrived(_)));

        presence.remove();
        let removed = events.recv().await.unwrap();
        assert!(matches!(removed, TagEvent::Removed));

        monitor.shutdown().await.unwrap();
    }
}
