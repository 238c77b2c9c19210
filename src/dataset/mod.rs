//! Dataset streaming and the filter/fan-in stage.
//!
//! The dataset is a single JSON array of `{cve_id, urls}` objects. It is
//! decoded element by element so arbitrarily large files never sit in memory
//! as a whole, then replicated across W filter lanes (dropping elements with
//! no URLs) and merged back into one stream for the crawl pipeline.

use std::fmt;
use std::io;
use std::sync::Arc;

use serde::de::{SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::{mpsc, Mutex};

/// One unit of work: a CVE identifier and its candidate URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Element {
    pub cve_id: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Channel depth for dataset decode and filter lanes.
const LANE_BUFFER: usize = 1;

/// Stream a JSON array of [`Element`]s from `reader`.
///
/// Decoding runs on a blocking thread. A malformed top-level structure or a
/// malformed element closes the stream early; elements already emitted
/// remain valid.
pub fn read_dataset<R>(reader: R) -> mpsc::Receiver<Element>
where
    R: io::Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LANE_BUFFER);

    tokio::task::spawn_blocking(move || {
        let mut de = serde_json::Deserializer::from_reader(reader);
        if let Err(e) = de.deserialize_seq(ElementSink { tx }) {
            tracing::error!("dataset decode aborted: {e}");
        }
    });

    rx
}

/// Serde visitor that forwards each array element into a channel instead of
/// collecting the whole array.
struct ElementSink {
    tx: mpsc::Sender<Element>,
}

impl<'de> Visitor<'de> for ElementSink {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON array of dataset elements")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut receiver_gone = false;

        while let Some(element) = seq.next_element::<Element>()? {
            if receiver_gone {
                continue;
            }
            receiver_gone = self.tx.blocking_send(element).is_err();
        }

        Ok(())
    }
}

/// Replicate consumption of `source` across `lanes` concurrent filter lanes.
///
/// Each lane steals elements from the shared source and forwards only those
/// with a non-empty URL list. Interleaving across lanes is nondeterministic.
pub fn spawn_filter_lanes(
    source: mpsc::Receiver<Element>,
    lanes: usize,
) -> Vec<mpsc::Receiver<Element>> {
    let source = Arc::new(Mutex::new(source));

    (0..lanes.max(1))
        .map(|_| {
            let source = source.clone();
            let (tx, rx) = mpsc::channel(LANE_BUFFER);

            tokio::spawn(async move {
                loop {
                    // Hold the lock only for the receive itself.
                    let element = source.lock().await.recv().await;
                    match element {
                        Some(element) if !element.urls.is_empty() => {
                            if tx.send(element).await.is_err() {
                                break;
                            }
                        }
                        Some(_) => continue,
                        None => break,
                    }
                }
            });

            rx
        })
        .collect()
}

/// Merge multiple element streams into one.
///
/// The output closes only once every input stream has been drained; order is
/// unspecified.
pub fn fan_in(receivers: Vec<mpsc::Receiver<Element>>) -> mpsc::Receiver<Element> {
    let (tx, rx) = mpsc::channel(receivers.len().max(1));

    for mut receiver in receivers {
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Some(element) = receiver.recv().await {
                if tx.send(element).await.is_err() {
                    break;
                }
            }
        });
    }

    // The last forwarder dropping its sender clone closes the output.
    rx
}
