//! Subscription helpers for bridging sync channels to iced subscriptions
//!
//! Background workers (the waveform loader, the sidecar watcher) report over
//! plain `std::sync::mpsc` channels. [`mpsc_subscription`] turns a receiver
//! into an iced `Subscription`: a dedicated bridge thread parks in a blocking
//! `recv()` and forwards into the async side, so nothing polls while the
//! channel is quiet.
//!
//! Subscription identity follows the channel's allocation: the stream (and
//! its bridge thread) is created once per receiver and lives for as long as
//! the source does. Swapping in a new channel (new loader, new watched
//! sidecar) tears the old stream down and starts a fresh one.
//!
//! # Usage
//!
//! ```ignore
//! use wavenote_widgets::mpsc_subscription;
//!
//! fn subscription(&self) -> Subscription<Message> {
//!     Subscription::batch([
//!         mpsc_subscription(self.loader.result_receiver()).map(Message::SourceLoaded),
//!         // ... other subscriptions
//!     ])
//! }
//! ```

use std::any::TypeId;
use std::hash::Hash;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use iced::advanced::subscription::{self, EventStream, Hasher, Recipe};
use iced::futures::stream::BoxStream;
use iced::futures::Stream;
use iced::Subscription;

/// Recipe wrapping one bridged channel. Hashes the receiver's pointer so two
/// channels of the same item type stay distinct subscriptions.
struct ChannelBridge<T> {
    id: u64,
    receiver: Arc<Mutex<Receiver<T>>>,
}

impl<T: Send + 'static> Recipe for ChannelBridge<T> {
    type Output = T;

    fn hash(&self, state: &mut Hasher) {
        TypeId::of::<Self>().hash(state);
        self.id.hash(state);
    }

    fn stream(self: Box<Self>, _input: EventStream) -> BoxStream<'static, Self::Output> {
        Box::pin(forward_blocking(self.receiver))
    }
}

/// Forward a sync receiver into an async stream from a dedicated thread.
///
/// The thread sleeps inside `recv()` until a message or channel close wakes
/// it. It exits when the worker drops its sending half, or when the async
/// side is gone and a forward fails.
fn forward_blocking<T: Send + 'static>(receiver: Arc<Mutex<Receiver<T>>>) -> impl Stream<Item = T> {
    let (tx, rx) = iced::futures::channel::mpsc::unbounded();

    std::thread::Builder::new()
        .name("channel-bridge".to_string())
        .spawn(move || loop {
            // The guard is held across recv(): the bridge is the channel's
            // only consumer.
            let Ok(guard) = receiver.lock() else {
                break;
            };
            match guard.recv() {
                Ok(item) => {
                    drop(guard);
                    if tx.unbounded_send(item).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        })
        .expect("Failed to spawn channel bridge thread");

    rx
}

/// Create an iced subscription from a sync mpsc channel receiver.
///
/// Use `.map()` to convert the yielded items into your message type.
pub fn mpsc_subscription<T>(receiver: Arc<Mutex<Receiver<T>>>) -> Subscription<T>
where
    T: Send + 'static,
{
    let id = Arc::as_ptr(&receiver) as u64;

    subscription::from_recipe(ChannelBridge { id, receiver })
}
