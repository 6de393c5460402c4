// SPDX-License-Identifier: Apache-2.0

use flume::{Receiver, Sender};
use std::fmt;

pub struct BoundedSender<T> {
    tx: Sender<T>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SendError {
    Disconnected,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Disconnected => write!(f, "channel disconnected"),
        }
    }
}

impl std::error::Error for SendError {}

impl<T> BoundedSender<T> {
    /// Waits for a free slot, so a full channel pushes back on the caller.
    pub async fn send(&self, item: T) -> Result<(), SendError> {
        match self.tx.send_async(item).await {
            Ok(()) => Ok(()),
            Err(_e) => Err(SendError::Disconnected), // receiver closed
        }
    }

    #[cfg(test)]
    pub fn is_disconnected(&self) -> bool {
        self.tx.is_disconnected()
    }
}

pub struct BoundedReceiver<T> {
    rx: Receiver<T>,
}

impl<T> BoundedReceiver<T> {
    pub async fn next(&mut self) -> Option<T> {
        match self.rx.recv_async().await {
            Ok(item) => Some(item),
            Err(_e) => None, // disconnected
        }
    }

    /// Non-blocking receive - returns immediately.
    /// Returns None if no item is available or channel is disconnected.
    #[cfg(test)]
    pub fn try_recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

pub fn bounded<T>(size: usize) -> (BoundedSender<T>, BoundedReceiver<T>) {
    let (tx, rx) = flume::bounded::<T>(size);

    let sender = BoundedSender { tx };
    let receiver = BoundedReceiver { rx };

    (sender, receiver)
}

#[cfg(test)]
mod tests {
    use super::{SendError, bounded};
    use tokio_test::{assert_ok, assert_pending, assert_ready, task::spawn};

    #[tokio::test]
    async fn basics() {
        let (tx, mut rx) = bounded(3);

        let line = "GET /index.html 200";

        let mut send1 = spawn(async { tx.send(line).await });
        let mut recv1 = spawn(async { rx.next().await });

        assert!(!send1.is_woken());
        assert!(!recv1.is_woken());

        assert_pending!(recv1.poll());

        assert_ok!(assert_ready!(send1.poll()));

        assert!(recv1.is_woken());

        assert_eq!(Some(line), assert_ready!(recv1.poll()));

        drop(send1);
        drop(recv1);

        let mut recv2 = spawn(async { rx.next().await });

        drop(tx);
        // receives None since send channel was closed
        assert_eq!(None, assert_ready!(recv2.poll()));
    }

    #[tokio::test]
    async fn single_slot_holds_one_line() {
        let (tx, mut rx) = bounded(1);

        let mut send1 = spawn(async { tx.send("first").await });
        assert_ok!(assert_ready!(send1.poll()));
        drop(send1);

        // The slot is taken, the second line waits for the consumer
        let mut send2 = spawn(async { tx.send("second").await });
        assert_pending!(send2.poll());
        assert_eq!(1, rx.len());

        let mut recv1 = spawn(async { rx.next().await });
        assert_eq!(Some("first"), assert_ready!(recv1.poll()));
        drop(recv1);

        assert!(send2.is_woken());
        assert_ok!(assert_ready!(send2.poll()));
        assert_eq!(Some("second"), rx.try_recv());
        assert!(rx.is_empty());
    }

    #[tokio::test]
    async fn sender_fails_on_rx_close() {
        let (tx, rx) = bounded(1);

        let mut send1 = spawn(async { tx.send(10).await });

        drop(rx);
        assert!(tx.is_disconnected());
        assert_eq!(Err(SendError::Disconnected), assert_ready!(send1.poll()));
    }
}
